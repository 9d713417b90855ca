//! Motion-aware post-processing: observing speculative motion in the
//! first-pass merge, evaluating it into substitutions and anchored moves, and
//! computing the anchored splices.

pub(crate) mod anchors;
pub(crate) mod evaluator;

use std::collections::{BTreeMap, BTreeSet};

use crate::merge::moves::MergeMove;
use crate::model::matches::{Match, MatchedSections};
use crate::model::section::{Section, Side};

// ---------------------------------------------------------------------------
// Speculative migrations
// ---------------------------------------------------------------------------

/// Which side changed the content at a move's origin.
///
/// A change made by the side that moved the content away is the move itself
/// and never propagates; only the side that stayed behind (or both at once)
/// has something to say about the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MigrationSide {
    Left,
    Right,
    Both,
}

impl MigrationSide {
    /// Does a change by this side propagate to a destination on
    /// `destination_side`?
    pub(crate) fn propagates_to(self, destination_side: Side) -> bool {
        match self {
            Self::Both => true,
            Self::Left => destination_side == Side::Right,
            Self::Right => destination_side == Side::Left,
        }
    }
}

/// What happened to a (matched) base section at its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MigrationChange {
    Deletion,
    /// Replacement sections on the editing side; their content rides to the
    /// move destination, and the sections themselves are suppressed at the
    /// origin once the migration is consumed.
    Edit(Vec<Section>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SpeculativeMigration {
    pub by: MigrationSide,
    pub change: MigrationChange,
}

// ---------------------------------------------------------------------------
// MotionObservations
// ---------------------------------------------------------------------------

/// Everything the first-pass merge walks reveal about motion: migrations at
/// origins, and every matched left/right section seen as a (possibly
/// in-place) move destination.
#[derive(Clone, Debug, Default)]
pub(crate) struct MotionObservations {
    pub migrations: BTreeMap<Section, SpeculativeMigration>,
    pub left_destinations: BTreeSet<Section>,
    pub right_destinations: BTreeSet<Section>,
    pub coincident_destinations: BTreeSet<(Section, Section)>,
}

impl MotionObservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one path's move sequence into the observations.
    pub fn observe(&mut self, moves: &[MergeMove<Section>], matched: &MatchedSections) {
        for m in moves {
            match m {
                MergeMove::Preservation { left, right, .. } => {
                    self.destination(matched, left);
                    self.destination(matched, right);
                }
                MergeMove::CoincidentEdit { base, left, right } => {
                    self.migration(matched, base, MigrationSide::Both, edit(vec![*left]));
                    self.coincident(matched, left, right);
                }
                MergeMove::CoincidentInsertion { left, right } => {
                    self.coincident(matched, left, right);
                }
                MergeMove::LeftEdit {
                    base,
                    right,
                    replacements,
                } => {
                    self.migration(matched, base, MigrationSide::Left, edit(replacements.clone()));
                    self.destination(matched, right);
                    for replacement in replacements {
                        self.destination(matched, replacement);
                    }
                }
                MergeMove::RightEdit {
                    base,
                    left,
                    replacements,
                } => {
                    self.migration(matched, base, MigrationSide::Right, edit(replacements.clone()));
                    self.destination(matched, left);
                    for replacement in replacements {
                        self.destination(matched, replacement);
                    }
                }
                MergeMove::LeftDeletion { base, right } => {
                    self.migration(matched, base, MigrationSide::Left, MigrationChange::Deletion);
                    self.destination(matched, right);
                }
                MergeMove::RightDeletion { base, left } => {
                    self.migration(matched, base, MigrationSide::Right, MigrationChange::Deletion);
                    self.destination(matched, left);
                }
                MergeMove::CoincidentDeletion { base } => {
                    self.migration(matched, base, MigrationSide::Both, MigrationChange::Deletion);
                }
                MergeMove::LeftInsertion { left } => self.destination(matched, left),
                MergeMove::RightInsertion { right } => self.destination(matched, right),
                MergeMove::EditConflict { left, right, .. } => {
                    // Both sides edited; no single migration can be chosen.
                    for section in left.iter().chain(right) {
                        self.destination(matched, section);
                    }
                }
                MergeMove::LeftEditVsRightDeletionConflict { base, left } => {
                    self.migration(matched, base, MigrationSide::Left, edit(left.clone()));
                    for section in left {
                        self.destination(matched, section);
                    }
                }
                MergeMove::RightEditVsLeftDeletionConflict { base, right } => {
                    self.migration(matched, base, MigrationSide::Right, edit(right.clone()));
                    for section in right {
                        self.destination(matched, section);
                    }
                }
            }
        }
    }

    fn migration(
        &mut self,
        matched: &MatchedSections,
        base: &Section,
        by: MigrationSide,
        change: MigrationChange,
    ) {
        // Only matched origins can be move sources.
        if matched.is_matched(base) {
            self.migrations
                .insert(*base, SpeculativeMigration { by, change });
        }
    }

    fn destination(&mut self, matched: &MatchedSections, section: &Section) {
        if !matched.is_matched(section) {
            return;
        }
        match section.side {
            Side::Left => {
                self.left_destinations.insert(*section);
            }
            Side::Right => {
                self.right_destinations.insert(*section);
            }
            Side::Base => unreachable!("destinations live on left or right"),
        }
    }

    /// A coincident pair lands in the coincident set when the two sections
    /// really are matched to each other; otherwise each side is recorded on
    /// its own.
    fn coincident(&mut self, matched: &MatchedSections, left: &Section, right: &Section) {
        let linked = matched
            .matches_for(left)
            .iter()
            .any(|m| matches!(m, Match::LeftAndRight { .. }) && matched.matches_for(right).contains(m));
        if linked {
            self.coincident_destinations.insert((*left, *right));
        } else {
            self.destination(matched, left);
            self.destination(matched, right);
        }
    }
}

fn edit(replacements: Vec<Section>) -> MigrationChange {
    MigrationChange::Edit(replacements)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
