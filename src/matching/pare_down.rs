//! Pare-down-or-suppress: the admission rules that keep the match set
//! non-overlapping and minimal.
//!
//! Candidates arrive from a window pass and run the gauntlet:
//!
//! 1. a section crossing an existing matched section sinks the whole match;
//! 2. an `AllSides` candidate contained by existing matches on two or more
//!    sides is dropped, on exactly one side it downgrades to the pairwise
//!    match over the remaining sides;
//! 3. a pairwise candidate contained on either side is dropped.
//!
//! After admission, the stabilization loop breaks up pairwise matches that
//! the pass's new `AllSides` matches bite into on both sides, re-admitting
//! the fragments, until nothing changes. Finally, pairwise matches made
//! redundant by an `AllSides` match over the same sections are removed.

use crate::model::matches::{Match, MatchedSections};
use crate::model::section::Section;

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Admit each candidate in order against the evolving match set; returns the
/// matches actually added (after any downgrades).
pub(crate) fn admit_matches(
    matched: &mut MatchedSections,
    candidates: &[Match],
) -> Vec<Match> {
    let mut admitted = Vec::new();
    for candidate in candidates {
        if let Some(added) = admit_one(matched, *candidate) {
            admitted.push(added);
        }
    }
    admitted
}

/// A section crosses (or swallows) an indexed section — partial overlap with
/// no containment either way. Such a section can never be admitted.
fn crosses_existing(matched: &MatchedSections, section: &Section) -> bool {
    let index = matched.index(section.side);
    index.overlaps_excluding_identical(section) && !index.strictly_subsumes(section)
}

/// Does `candidate` sit inside both of pairwise `p`'s sections at the same
/// relative offset? Such a candidate is allowed through admission: the
/// stabilization loop will eat it out of `p` rather than the other way round.
fn bites_pairwise(candidate: &Match, p: &Match) -> bool {
    debug_assert!(p.is_pairwise());
    let sections = p.sections();
    let (p1, p2) = (sections[0], sections[1]);
    match (candidate.section_on(p1.side), candidate.section_on(p2.side)) {
        (Some(c1), Some(c2)) => {
            c1.is_subsumed_by(&p1)
                && c2.is_subsumed_by(&p2)
                && c1.start - p1.start == c2.start - p2.start
        }
        _ => false,
    }
}

/// A side of an `AllSides` candidate counts as contained only when some
/// container is not a pairwise match the candidate bites; bitten pairwise
/// matches are about to be fragmented, so they do not suppress the candidate.
fn contained_for_all_sides(matched: &MatchedSections, candidate: &Match, section: &Section) -> bool {
    matched
        .containers_of(section)
        .iter()
        .any(|container| !(container.is_pairwise() && bites_pairwise(candidate, container)))
}

fn admit_one(matched: &mut MatchedSections, candidate: Match) -> Option<Match> {
    if candidate
        .sections()
        .iter()
        .any(|section| crosses_existing(matched, section))
    {
        return None;
    }

    match candidate {
        Match::AllSides { base, left, right } => {
            let contained: Vec<Section> = [base, left, right]
                .into_iter()
                .filter(|section| contained_for_all_sides(matched, &candidate, section))
                .collect();
            match contained.len() {
                0 => {
                    matched.add(candidate);
                    Some(candidate)
                }
                1 => {
                    let downgraded = if contained[0] == base {
                        Match::LeftAndRight { left, right }
                    } else if contained[0] == left {
                        Match::BaseAndRight { base, right }
                    } else {
                        Match::BaseAndLeft { base, left }
                    };
                    admit_one(matched, downgraded)
                }
                _ => None,
            }
        }
        _ => {
            let contained_anywhere = candidate
                .sections()
                .iter()
                .any(|section| matched.index(section.side).strictly_subsumes(section));
            if contained_anywhere {
                None
            } else {
                matched.add(candidate);
                Some(candidate)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stabilization
// ---------------------------------------------------------------------------

/// Break up pairwise matches bitten on both sides by this pass's new
/// `AllSides` matches, re-admitting the leftover fragments, until quiescent.
pub(crate) fn stabilize(
    matched: &mut MatchedSections,
    new_all_sides: &[Match],
    minimum_match_size: usize,
) {
    if new_all_sides.is_empty() {
        return;
    }
    loop {
        let mut changed = false;
        let pairwise: Vec<Match> = matched
            .all_matches()
            .into_iter()
            .filter(Match::is_pairwise)
            .collect();

        for p in pairwise {
            let sections = p.sections();
            let (first, second) = (sections[0], sections[1]);
            let bites = bites_into(&first, &second, new_all_sides);
            if bites.is_empty() {
                continue;
            }

            matched.remove(&p);
            changed = true;
            for (offset, length) in complement(&bites, first.length) {
                if length < minimum_match_size.max(1) {
                    continue;
                }
                let fragment = offset_pairwise(&p, offset, length);
                let _ = admit_one(matched, fragment);
            }
        }

        if !changed {
            break;
        }
    }
}

/// Relative intervals where an `AllSides` match sits inside both of the
/// pairwise match's sections at the same offset.
fn bites_into(
    first: &Section,
    second: &Section,
    new_all_sides: &[Match],
) -> Vec<(usize, usize)> {
    let mut bites = Vec::new();
    for a in new_all_sides {
        let (Some(in_first), Some(in_second)) =
            (a.section_on(first.side), a.section_on(second.side))
        else {
            continue;
        };
        if in_first.is_subsumed_by(first)
            && in_second.is_subsumed_by(second)
            && in_first.start - first.start == in_second.start - second.start
        {
            let offset = in_first.start - first.start;
            bites.push((offset, offset + in_first.length));
        }
    }
    bites.sort_unstable();
    bites
}

/// Gaps left in `[0, length)` after removing the (sorted) bite intervals.
fn complement(bites: &[(usize, usize)], length: usize) -> Vec<(usize, usize)> {
    let mut gaps = Vec::new();
    let mut cursor = 0;
    for &(start, end) in bites {
        if start > cursor {
            gaps.push((cursor, start - cursor));
        }
        cursor = cursor.max(end);
    }
    if cursor < length {
        gaps.push((cursor, length - cursor));
    }
    gaps
}

/// The same pairwise variant, re-addressed to a sub-range of both sections.
fn offset_pairwise(p: &Match, offset: usize, length: usize) -> Match {
    let shift = |s: Section| Section::new(s.side, s.path, s.start + offset, length);
    match *p {
        Match::BaseAndLeft { base, left } => Match::BaseAndLeft {
            base: shift(base),
            left: shift(left),
        },
        Match::BaseAndRight { base, right } => Match::BaseAndRight {
            base: shift(base),
            right: shift(right),
        },
        Match::LeftAndRight { left, right } => Match::LeftAndRight {
            left: shift(left),
            right: shift(right),
        },
        Match::AllSides { .. } => unreachable!("stabilization only fragments pairwise matches"),
    }
}

// ---------------------------------------------------------------------------
// Redundant-pairwise removal
// ---------------------------------------------------------------------------

/// Drop every pairwise match both of whose sections already belong to some
/// `AllSides` match.
pub(crate) fn remove_redundant_pairwise(matched: &mut MatchedSections) {
    let pairwise: Vec<Match> = matched
        .all_matches()
        .into_iter()
        .filter(Match::is_pairwise)
        .collect();
    for p in pairwise {
        let sections = p.sections();
        let redundant = matched
            .matches_for(&sections[0])
            .iter()
            .any(|m| m.is_all_sides() && matched.matches_for(&sections[1]).contains(m));
        if redundant {
            matched.remove(&p);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
