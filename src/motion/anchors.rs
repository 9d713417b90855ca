//! Anchored-insertion migration: content inserted next to a moved anchor
//! rides along to the anchor's destination.
//!
//! For each anchored move, maximal unmatched runs are walked outward from the
//! source (base), the destination, and the opposite-side anchor — a matched
//! section ends a run, since every preservation, anchor, migration source and
//! coincident insertion is matched. The three runs per direction merge
//! through the ordinary algebra with migrated edits suppressed; a clean,
//! non-empty merge becomes a splice keyed by the destination anchor and the
//! anchor's role relative to the splice. Splice computation is cached by the
//! run triple, since dense anchors revisit the same runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AdmissibleFailure;
use crate::merge::result::{fold_moves, MergeResult};
use crate::merge::moves_for;
use crate::model::element::Element;
use crate::model::file::File;
use crate::model::matches::MatchedSections;
use crate::model::section::{PathId, Section, Side};

use super::evaluator::AnchoredMove;

// ---------------------------------------------------------------------------
// AnchorRole / AnchoredSplices
// ---------------------------------------------------------------------------

/// The anchor's position relative to its splice: a `Predecessor` anchor's
/// splice follows it, a `Successor` anchor's splice precedes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnchorRole {
    Predecessor,
    Successor,
}

/// The computed splices and the origin-side sections they consumed.
#[derive(Clone, Debug, Default)]
pub(crate) struct AnchoredSplices {
    pub splices: BTreeMap<(Section, AnchorRole), Vec<Section>>,
    pub suppressions: BTreeSet<Section>,
}

/// The per-side sectionings the runs are walked in.
pub(crate) struct SidedFiles<'a> {
    pub base: &'a BTreeMap<PathId, File>,
    pub left: &'a BTreeMap<PathId, File>,
    pub right: &'a BTreeMap<PathId, File>,
}

impl SidedFiles<'_> {
    fn on(&self, side: Side) -> &BTreeMap<PathId, File> {
        match side {
            Side::Base => self.base,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

// ---------------------------------------------------------------------------
// Run extraction
// ---------------------------------------------------------------------------

/// The maximal unmatched runs just before and just after `anchor` in its
/// file. An anchor missing from the sectioning has empty runs.
fn runs_around(
    files: &SidedFiles<'_>,
    anchor: &Section,
    matched: &MatchedSections,
) -> (Vec<Section>, Vec<Section>) {
    let Some(file) = files.on(anchor.side).get(&anchor.path) else {
        return (Vec::new(), Vec::new());
    };
    let Some(position) = file.position_of(anchor) else {
        return (Vec::new(), Vec::new());
    };
    let sections = file.sections();

    let mut preceding: Vec<Section> = sections[..position]
        .iter()
        .rev()
        .take_while(|&s| !matched.is_matched(s))
        .copied()
        .collect();
    preceding.reverse();

    let succeeding: Vec<Section> = sections[position + 1..]
        .iter()
        .take_while(|&s| !matched.is_matched(s))
        .copied()
        .collect();

    (preceding, succeeding)
}

// ---------------------------------------------------------------------------
// Splice computation
// ---------------------------------------------------------------------------

type RunTriple = (Vec<Section>, Vec<Section>, Vec<Section>);

/// Compute every splice for the anchored moves.
///
/// Distinct splices (after content deduplication) colliding on one
/// `(anchor, role)` key are an [`AdmissibleFailure`].
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_anchored_splices<E: Element>(
    anchored_moves: &[AnchoredMove],
    files: &SidedFiles<'_>,
    matched: &MatchedSections,
    migrated_edit_suppressions: &BTreeSet<Section>,
    eq: &dyn Fn(&Section, &Section) -> bool,
    size: &dyn Fn(&Section) -> usize,
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> Result<AnchoredSplices, AdmissibleFailure> {
    let mut result = AnchoredSplices::default();
    let mut cache: BTreeMap<RunTriple, Option<Vec<Section>>> = BTreeMap::new();

    for mv in anchored_moves {
        let (base_pre, base_succ) = runs_around(files, &mv.source, matched);
        let (dest_pre, dest_succ) = runs_around(files, &mv.destination, matched);
        let (opp_pre, opp_succ) = match &mv.opposite_anchor {
            Some(anchor) => runs_around(files, anchor, matched),
            None => (Vec::new(), Vec::new()),
        };

        // Slot the destination and opposite runs by actual side.
        let directions = [
            // Content preceding the anchors: the anchor is its successor.
            (AnchorRole::Successor, base_pre, dest_pre, opp_pre),
            // Content succeeding the anchors: the anchor is its predecessor.
            (AnchorRole::Predecessor, base_succ, dest_succ, opp_succ),
        ];

        for (role, base_run, dest_run, opp_run) in directions {
            let (left_run, right_run) = match mv.destination.side {
                Side::Left => (dest_run, opp_run),
                Side::Right => (opp_run, dest_run),
                Side::Base => unreachable!("destinations live on left or right"),
            };
            if base_run.is_empty() && left_run.is_empty() && right_run.is_empty() {
                continue;
            }

            let key: RunTriple = (base_run, left_run, right_run);
            let splice = cache
                .entry(key.clone())
                .or_insert_with(|| {
                    let moves = moves_for(&key.0, &key.1, &key.2, eq, size);
                    match fold_moves(&moves, &|section| {
                        migrated_edit_suppressions.contains(section)
                    }) {
                        MergeResult::FullyMerged(sections) if !sections.is_empty() => {
                            Some(sections)
                        }
                        // A conflicted or empty run merge migrates nothing.
                        _ => None,
                    }
                })
                .clone();

            let Some(splice) = splice else { continue };

            let duplicate = match result.splices.get(&(mv.destination, role)) {
                Some(existing) if splices_equal(existing, &splice, content_of) => true,
                Some(_) => {
                    return Err(AdmissibleFailure::ambiguous_propagation(
                        "anchored splices",
                        mv.destination,
                        mv.destination.length,
                        2,
                    ));
                }
                None => false,
            };
            if !duplicate {
                result.splices.insert((mv.destination, role), splice);
            }
            // The run content now lives at the destination; its origin-side
            // sections must not render twice.
            result.suppressions.extend(key.1.iter().copied());
            result.suppressions.extend(key.2.iter().copied());
        }
    }
    Ok(result)
}

/// Content-level splice equality, for deduplicating splices that arrived via
/// different (but equivalent) run triples.
fn splices_equal<E: Element>(
    a: &[Section],
    b: &[Section],
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> bool {
    let flatten = |sections: &[Section]| -> Vec<E> {
        sections.iter().flat_map(|s| content_of(s)).collect()
    };
    flatten(a) == flatten(b)
}

// ---------------------------------------------------------------------------
// Splice insertion
// ---------------------------------------------------------------------------

/// Weave splices into one merged section sequence with the two-slot buffer:
/// a predecessor-anchor's splice is deferred until the next section, so that
/// an anchor pair sharing one splice emits it exactly once between them.
pub(crate) fn apply_splices(
    sections: &[Section],
    splices: &BTreeMap<(Section, AnchorRole), Vec<Section>>,
) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::with_capacity(sections.len());
    let mut deferred: Option<&Vec<Section>> = None;

    for section in sections {
        let preceding = splices.get(&(*section, AnchorRole::Successor));
        match (deferred.take(), preceding) {
            (Some(carried), Some(before)) if carried == before => {
                // Anchor pair sharing the splice between them: one copy.
                out.extend(carried.iter().copied());
            }
            (Some(carried), Some(before)) => {
                out.extend(carried.iter().copied());
                out.extend(before.iter().copied());
            }
            (Some(carried), None) => out.extend(carried.iter().copied()),
            (None, Some(before)) => out.extend(before.iter().copied()),
            (None, None) => {}
        }
        out.push(*section);
        deferred = splices.get(&(*section, AnchorRole::Predecessor));
    }
    if let Some(carried) = deferred {
        out.extend(carried.iter().copied());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
