//! Evaluating speculative motion into hard decisions: the move report,
//! propagated substitutions, migrated-edit suppressions, and anchored moves.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AdmissibleFailure;
use crate::model::element::Element;
use crate::model::matches::MatchedSections;
use crate::model::report::{ContentMigration, MoveDestinationsReport};
use crate::model::section::{Section, Side};

use super::{MigrationChange, MotionObservations};

// ---------------------------------------------------------------------------
// AnchoredMove
// ---------------------------------------------------------------------------

/// A move destination paired with its origin anchor, and — when the opposite
/// side kept the content in place — the opposite-side anchor next to which
/// migrated insertions may be sitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnchoredMove {
    /// The base section the content came from.
    pub source: Section,
    /// The genuine (non-aligned) destination on left or right.
    pub destination: Section,
    /// The in-place destination aligned with the source on the side opposite
    /// the move, if the move's match spans it.
    pub opposite_anchor: Option<Section>,
}

// ---------------------------------------------------------------------------
// EvaluatedMoves
// ---------------------------------------------------------------------------

/// The settled motion decisions for one merge.
#[derive(Clone, Debug)]
pub struct EvaluatedMoves<E> {
    pub report: MoveDestinationsReport,
    /// The fate of each move source, for reporting.
    pub migrations_by_source: BTreeMap<Section, ContentMigration<E>>,
    /// Origin-side replacement sections whose edits migrated; they contribute
    /// no content anywhere at the origin.
    pub migrated_edit_suppressions: BTreeSet<Section>,
    /// Propagated content per destination; an empty sequence is a propagated
    /// deletion.
    pub substitutions_by_destination: BTreeMap<Section, Vec<E>>,
    pub anchored_moves: Vec<AnchoredMove>,
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

/// Interpret the observations against the stabilized match set.
///
/// Divergent moves (genuine destinations on both sides) and degenerate moves
/// (nothing actually moved) propagate neither edits nor deletions, and
/// coincident destinations never receive propagated edits. Two distinct
/// substitution candidates arriving at one destination are an
/// [`AdmissibleFailure`].
pub(crate) fn evaluate<E: Element>(
    matched: &MatchedSections,
    observations: &MotionObservations,
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> Result<EvaluatedMoves<E>, AdmissibleFailure> {
    let report = build_report(matched, observations);

    let mut substitutions_by_destination: BTreeMap<Section, Vec<E>> = BTreeMap::new();
    let mut migrated_edit_suppressions: BTreeSet<Section> = BTreeSet::new();
    let mut anchored_moves: Vec<AnchoredMove> = Vec::new();

    for group in report.moves.values() {
        if group.is_divergent() || group.is_degenerate() || group.sources.is_empty() {
            continue;
        }
        let genuine: Vec<Section> = group
            .genuine_left()
            .chain(group.genuine_right())
            .copied()
            .collect();

        for destination in &genuine {
            // Candidate substitutions from every source whose origin change
            // was made by the side that stayed behind.
            let mut candidates: Vec<(Vec<E>, Option<&Vec<Section>>)> = Vec::new();
            for source in &group.sources {
                let Some(migration) = observations.migrations.get(source) else {
                    continue;
                };
                if !migration.by.propagates_to(destination.side) {
                    continue;
                }
                let (content, replacements) = match &migration.change {
                    MigrationChange::Deletion => (Vec::new(), None),
                    MigrationChange::Edit(replacements) => (
                        replacements
                            .iter()
                            .flat_map(|r| content_of(r))
                            .collect(),
                        Some(replacements),
                    ),
                };
                if !candidates.iter().any(|(existing, _)| *existing == content) {
                    candidates.push((content, replacements));
                }
            }

            match candidates.len() {
                0 => {}
                1 => {
                    let (content, replacements) = candidates.pop().expect("one candidate");
                    if let Some(replacements) = replacements {
                        migrated_edit_suppressions.extend(replacements.iter().copied());
                    }
                    substitutions_by_destination.insert(*destination, content);
                }
                ambiguous => {
                    return Err(AdmissibleFailure::ambiguous_propagation(
                        "propagated changes",
                        destination,
                        destination.length,
                        ambiguous,
                    ));
                }
            }

            for source in &group.sources {
                let opposite_anchor = destination.side.opposite().and_then(|opposite| {
                    let in_place = match opposite {
                        Side::Left => &group.left,
                        Side::Right => &group.right,
                        Side::Base => unreachable!("opposite of a side is never base"),
                    };
                    in_place
                        .iter()
                        .find(|candidate| candidate.is_aligned_with(source))
                        .copied()
                });
                anchored_moves.push(AnchoredMove {
                    source: *source,
                    destination: *destination,
                    opposite_anchor,
                });
            }
        }
    }

    let migrations_by_source = summarize_migrations(observations, content_of);

    Ok(EvaluatedMoves {
        report,
        migrations_by_source,
        migrated_edit_suppressions,
        substitutions_by_destination,
        anchored_moves,
    })
}

/// One observed destination, before grouping.
enum Observed {
    Left(Section),
    Right(Section),
    Coincident(Section, Section),
}

/// Group every observed destination under its dominants key.
fn build_report(
    matched: &MatchedSections,
    observations: &MotionObservations,
) -> MoveDestinationsReport {
    let observed = observations
        .left_destinations
        .iter()
        .map(|s| Observed::Left(*s))
        .chain(
            observations
                .right_destinations
                .iter()
                .map(|s| Observed::Right(*s)),
        )
        .chain(
            observations
                .coincident_destinations
                .iter()
                .map(|(l, r)| Observed::Coincident(*l, *r)),
        );

    let mut report = MoveDestinationsReport::new();
    for destination in observed {
        let keyed = match &destination {
            Observed::Left(s) | Observed::Right(s) | Observed::Coincident(s, _) => *s,
        };
        let matches = matched.matches_for(&keyed);
        let dominants: BTreeSet<Section> =
            matches.iter().map(|m| m.dominant_section()).collect();
        let group = report.moves.entry(dominants).or_default();
        group
            .sources
            .extend(matches.iter().filter_map(|m| m.base_section()));
        match destination {
            Observed::Left(s) => {
                group.left.insert(s);
            }
            Observed::Right(s) => {
                group.right.insert(s);
            }
            Observed::Coincident(l, r) => {
                group.coincident.insert((l, r));
            }
        }
    }
    report
}

/// Public view of every origin's fate.
fn summarize_migrations<E: Element>(
    observations: &MotionObservations,
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> BTreeMap<Section, ContentMigration<E>> {
    observations
        .migrations
        .iter()
        .map(|(source, migration)| {
            let fate = match &migration.change {
                MigrationChange::Deletion => ContentMigration::Deletion,
                MigrationChange::Edit(replacements) => ContentMigration::Edit(
                    replacements.iter().flat_map(|r| content_of(r)).collect(),
                ),
            };
            (*source, fate)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matches::Match;
    use crate::model::section::PathId;
    use crate::motion::{MigrationSide, SpeculativeMigration};

    fn sec(side: Side, path: u32, start: usize, length: usize) -> Section {
        Section::new(side, PathId(path), start, length)
    }

    /// A base-and-right move: content at base path 0 offset 0 reappears at
    /// right path 1 offset 5.
    fn moved_setup() -> (MatchedSections, Section, Section) {
        let mut matched = MatchedSections::new();
        let source = sec(Side::Base, 0, 0, 2);
        let destination = sec(Side::Right, 1, 5, 2);
        matched.add(Match::BaseAndRight {
            base: source,
            right: destination,
        });
        (matched, source, destination)
    }

    fn content_of(section: &Section) -> Vec<i32> {
        // Deterministic fake content keyed by position.
        (0..section.length)
            .map(|i| (section.start + i) as i32 + 100)
            .collect()
    }

    #[test]
    fn an_edit_by_the_staying_side_becomes_a_substitution() {
        let (matched, source, destination) = moved_setup();
        let mut observations = MotionObservations::new();
        observations.right_destinations.insert(destination);
        let replacement = sec(Side::Left, 0, 0, 3);
        observations.migrations.insert(
            source,
            SpeculativeMigration {
                by: MigrationSide::Left,
                change: MigrationChange::Edit(vec![replacement]),
            },
        );

        let evaluated = evaluate(&matched, &observations, &content_of).expect("unambiguous");
        assert_eq!(
            evaluated.substitutions_by_destination[&destination],
            content_of(&replacement),
        );
        assert!(evaluated.migrated_edit_suppressions.contains(&replacement));
        assert_eq!(evaluated.anchored_moves.len(), 1);
        assert_eq!(evaluated.anchored_moves[0].source, source);
        assert_eq!(evaluated.anchored_moves[0].opposite_anchor, None);
    }

    #[test]
    fn a_deletion_by_the_moving_side_is_the_move_itself() {
        let (matched, source, destination) = moved_setup();
        let mut observations = MotionObservations::new();
        observations.right_destinations.insert(destination);
        observations.migrations.insert(
            source,
            SpeculativeMigration {
                by: MigrationSide::Right,
                change: MigrationChange::Deletion,
            },
        );

        let evaluated = evaluate(&matched, &observations, &content_of).expect("unambiguous");
        assert!(
            evaluated.substitutions_by_destination.is_empty(),
            "the moving side's own deletion must not chase the content",
        );
    }

    #[test]
    fn a_deletion_by_the_staying_side_propagates_as_empty_content() {
        let (matched, source, destination) = moved_setup();
        let mut observations = MotionObservations::new();
        observations.right_destinations.insert(destination);
        observations.migrations.insert(
            source,
            SpeculativeMigration {
                by: MigrationSide::Left,
                change: MigrationChange::Deletion,
            },
        );

        let evaluated = evaluate(&matched, &observations, &content_of).expect("unambiguous");
        assert_eq!(
            evaluated.substitutions_by_destination[&destination],
            Vec::<i32>::new()
        );
    }

    #[test]
    fn divergent_moves_propagate_nothing() {
        // One all-sides match whose left and right sections both moved away
        // from the source: a divergent move.
        let source = sec(Side::Base, 0, 0, 2);
        let left_destination = sec(Side::Left, 1, 3, 2);
        let right_destination = sec(Side::Right, 2, 7, 2);
        let mut matched = MatchedSections::new();
        matched.add(Match::AllSides {
            base: source,
            left: left_destination,
            right: right_destination,
        });
        let mut observations = MotionObservations::new();
        observations.left_destinations.insert(left_destination);
        observations.right_destinations.insert(right_destination);
        observations.migrations.insert(
            source,
            SpeculativeMigration {
                by: MigrationSide::Both,
                change: MigrationChange::Deletion,
            },
        );

        let evaluated = evaluate(&matched, &observations, &content_of).expect("no ambiguity");
        assert!(evaluated.substitutions_by_destination.is_empty());
        assert!(evaluated.anchored_moves.is_empty());
        let group = evaluated.report.moves.values().next().unwrap();
        assert!(group.is_divergent());
    }

    #[test]
    fn degenerate_moves_are_inert() {
        let mut matched = MatchedSections::new();
        let source = sec(Side::Base, 0, 4, 2);
        let in_place = sec(Side::Left, 0, 4, 2);
        matched.add(Match::BaseAndLeft {
            base: source,
            left: in_place,
        });
        let mut observations = MotionObservations::new();
        observations.left_destinations.insert(in_place);
        observations.migrations.insert(
            source,
            SpeculativeMigration {
                by: MigrationSide::Right,
                change: MigrationChange::Deletion,
            },
        );

        let evaluated = evaluate(&matched, &observations, &content_of).expect("no ambiguity");
        assert!(evaluated.substitutions_by_destination.is_empty());
        assert!(evaluated.anchored_moves.is_empty());
    }

    #[test]
    fn two_distinct_candidates_are_an_admissible_failure() {
        // Two sources with different edits feed one destination.
        let mut matched = MatchedSections::new();
        let source_a = sec(Side::Base, 0, 0, 2);
        let source_b = sec(Side::Base, 0, 10, 2);
        let destination = sec(Side::Right, 1, 5, 2);
        matched.add(Match::BaseAndRight {
            base: source_a,
            right: destination,
        });
        matched.add(Match::BaseAndRight {
            base: source_b,
            right: destination,
        });

        let mut observations = MotionObservations::new();
        observations.right_destinations.insert(destination);
        for (source, start) in [(source_a, 20), (source_b, 30)] {
            observations.migrations.insert(
                source,
                SpeculativeMigration {
                    by: MigrationSide::Left,
                    change: MigrationChange::Edit(vec![sec(Side::Left, 0, start, 1)]),
                },
            );
        }

        let failure = evaluate(&matched, &observations, &content_of).unwrap_err();
        assert!(failure.message().contains("2 distinct"));
        assert!(failure.message().contains("minimum ambiguous match size"));
    }

    #[test]
    fn equal_candidates_deduplicate_instead_of_failing() {
        let mut matched = MatchedSections::new();
        let source_a = sec(Side::Base, 0, 0, 2);
        let source_b = sec(Side::Base, 0, 10, 2);
        let destination = sec(Side::Right, 1, 5, 2);
        matched.add(Match::BaseAndRight {
            base: source_a,
            right: destination,
        });
        matched.add(Match::BaseAndRight {
            base: source_b,
            right: destination,
        });

        let mut observations = MotionObservations::new();
        observations.right_destinations.insert(destination);
        // Different replacement sections, identical content.
        let shared = sec(Side::Left, 0, 40, 1);
        for source in [source_a, source_b] {
            observations.migrations.insert(
                source,
                SpeculativeMigration {
                    by: MigrationSide::Left,
                    change: MigrationChange::Edit(vec![shared]),
                },
            );
        }

        let evaluated = evaluate(&matched, &observations, &content_of).expect("deduplicated");
        assert_eq!(
            evaluated.substitutions_by_destination[&destination],
            content_of(&shared),
        );
    }

    #[test]
    fn opposite_anchor_is_the_in_place_destination() {
        let mut matched = MatchedSections::new();
        let source = sec(Side::Base, 0, 3, 2);
        let in_place = sec(Side::Left, 0, 3, 2);
        let moved = sec(Side::Right, 1, 8, 2);
        matched.add(Match::AllSides {
            base: source,
            left: in_place,
            right: moved,
        });
        let mut observations = MotionObservations::new();
        observations.left_destinations.insert(in_place);
        observations.right_destinations.insert(moved);

        let evaluated = evaluate(&matched, &observations, &content_of).expect("no ambiguity");
        assert_eq!(evaluated.anchored_moves.len(), 1);
        assert_eq!(evaluated.anchored_moves[0].opposite_anchor, Some(in_place));
        assert_eq!(evaluated.anchored_moves[0].destination, moved);
    }
}
