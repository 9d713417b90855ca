//! One window-size pass: fingerprint every eligible section on every side,
//! synchronize the fingerprints across sides, and emit candidate matches.
//!
//! Synchronization walks the three per-side candidate lists, each sorted by
//! [`PotentialMatchKey`] order (fingerprint, then a bounded content prefix,
//! then full content — a hash collision is only ever broken by real
//! content). Agreement of all three sides yields `AllSides` candidates;
//! agreement of exactly two yields the corresponding pairwise candidates.

use std::cmp::Ordering;

use crate::fingerprint::window_fingerprints;
use crate::model::element::Element;
use crate::model::matches::Match;
use crate::model::section::{Section, Side};

use super::DiscoveryState;

/// Elements of content compared eagerly before falling back to the full
/// slice; fingerprint ties are common only under adversarial inputs.
const KEY_PREFIX_ELEMENTS: usize = 10;

/// A candidate section with its window fingerprint; the content behind the
/// section is the rest of the potential-match key.
#[derive(Clone, Copy, Debug)]
struct PotentialMatchKey {
    fingerprint: u128,
    section: Section,
}

// ---------------------------------------------------------------------------
// Pass entry point
// ---------------------------------------------------------------------------

/// Run one pass at `window_size`, producing candidate matches for admission.
pub(crate) fn matches_for_window_size<E: Element>(
    state: &mut DiscoveryState<'_, E>,
    window_size: usize,
) -> Vec<Match> {
    let base = side_candidates(state, Side::Base, window_size);
    let left = side_candidates(state, Side::Left, window_size);
    let right = side_candidates(state, Side::Right, window_size);
    synchronize(state, window_size, &base, &left, &right)
}

// ---------------------------------------------------------------------------
// Per-side candidate collection
// ---------------------------------------------------------------------------

/// Fingerprint every eligible window on `side`, dropping sections that cross
/// existing matched sections (a crossing section can never be admitted;
/// sections *contained* in existing matches stay, so that admission can
/// downgrade a triple around them).
fn side_candidates<E: Element>(
    state: &mut DiscoveryState<'_, E>,
    side: Side,
    window_size: usize,
) -> Vec<PotentialMatchKey> {
    let mut candidates = Vec::new();
    let paths: Vec<_> = state.sources_on(side).paths().collect();
    for path in paths {
        let file_size = state.sources_on(side).file_size(path);
        if window_size > file_size
            || window_size < state.config.window_size_floor_for(file_size)
        {
            continue;
        }
        let factory = state
            .factories
            .factory_for(window_size, file_size - window_size + 1);
        let hashes = &state.hashes[&(side, path)];
        let fingerprints = window_fingerprints(&factory, hashes);
        for (start, fingerprint) in fingerprints.into_iter().enumerate() {
            let section = Section::new(side, path, start, window_size);
            let index = state.matched.index(side);
            let contained = index.strictly_subsumes(&section);
            if !contained && index.overlaps_excluding_identical(&section) {
                continue;
            }
            candidates.push(PotentialMatchKey {
                fingerprint,
                section,
            });
        }
    }
    candidates.sort_by(|a, b| compare_keys(state, a, b));
    candidates
}

/// Potential-match-key order: fingerprint, bounded content prefix, full
/// content.
fn compare_keys<E: Element>(
    state: &DiscoveryState<'_, E>,
    a: &PotentialMatchKey,
    b: &PotentialMatchKey,
) -> Ordering {
    a.fingerprint.cmp(&b.fingerprint).then_with(|| {
        let content_a = state.content_of(&a.section);
        let content_b = state.content_of(&b.section);
        let prefix = KEY_PREFIX_ELEMENTS.min(content_a.len()).min(content_b.len());
        content_a[..prefix]
            .cmp(&content_b[..prefix])
            .then_with(|| content_a.cmp(content_b))
    })
}

fn keys_equal<E: Element>(
    state: &DiscoveryState<'_, E>,
    a: &PotentialMatchKey,
    b: &PotentialMatchKey,
) -> bool {
    compare_keys(state, a, b) == Ordering::Equal
}

// ---------------------------------------------------------------------------
// Cross-side synchronization
// ---------------------------------------------------------------------------

/// Walk the three sorted candidate lists like a three-way merge, emitting
/// match candidates wherever two or three sides agree on a key.
///
/// At or above the ambiguity threshold every combination for a key is
/// retained; below it only a unique combination survives — an ambiguous key
/// with a small window yields nothing at all.
fn synchronize<E: Element>(
    state: &DiscoveryState<'_, E>,
    window_size: usize,
    base: &[PotentialMatchKey],
    left: &[PotentialMatchKey],
    right: &[PotentialMatchKey],
) -> Vec<Match> {
    let embrace_ambiguity = window_size >= state.config.minimum_ambiguous_match_size;
    let mut matches = Vec::new();
    let (mut ib, mut il, mut ir) = (0, 0, 0);

    while ib < base.len() || il < left.len() || ir < right.len() {
        // The minimal key among the three heads.
        let minimum = [base.get(ib), left.get(il), right.get(ir)]
            .into_iter()
            .flatten()
            .copied()
            .min_by(|a, b| compare_keys(state, a, b))
            .expect("at least one list has a head");

        let base_run = run_length(state, &base[ib..], &minimum);
        let left_run = run_length(state, &left[il..], &minimum);
        let right_run = run_length(state, &right[ir..], &minimum);

        let base_sections = &base[ib..ib + base_run];
        let left_sections = &left[il..il + left_run];
        let right_sections = &right[ir..ir + right_run];

        let sides_agreeing =
            usize::from(base_run > 0) + usize::from(left_run > 0) + usize::from(right_run > 0);
        if sides_agreeing >= 2 {
            let combinations = base_run.max(1) * left_run.max(1) * right_run.max(1);
            if embrace_ambiguity || combinations == 1 {
                emit_combinations(
                    &mut matches,
                    base_sections,
                    left_sections,
                    right_sections,
                );
            }
        }

        ib += base_run;
        il += left_run;
        ir += right_run;
    }
    matches
}

fn run_length<E: Element>(
    state: &DiscoveryState<'_, E>,
    list: &[PotentialMatchKey],
    key: &PotentialMatchKey,
) -> usize {
    list.iter()
        .take_while(|&candidate| keys_equal(state, candidate, key))
        .count()
}

/// Cartesian combinations over the sides that carry the key.
fn emit_combinations(
    matches: &mut Vec<Match>,
    base: &[PotentialMatchKey],
    left: &[PotentialMatchKey],
    right: &[PotentialMatchKey],
) {
    match (base.is_empty(), left.is_empty(), right.is_empty()) {
        (false, false, false) => {
            for b in base {
                for l in left {
                    for r in right {
                        matches.push(Match::AllSides {
                            base: b.section,
                            left: l.section,
                            right: r.section,
                        });
                    }
                }
            }
        }
        (false, false, true) => {
            for b in base {
                for l in left {
                    matches.push(Match::BaseAndLeft {
                        base: b.section,
                        left: l.section,
                    });
                }
            }
        }
        (false, true, false) => {
            for b in base {
                for r in right {
                    matches.push(Match::BaseAndRight {
                        base: b.section,
                        right: r.section,
                    });
                }
            }
        }
        (true, false, false) => {
            for l in left {
                for r in right {
                    matches.push(Match::LeftAndRight {
                        left: l.section,
                        right: r.section,
                    });
                }
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Optimal-size estimation
// ---------------------------------------------------------------------------

/// Coalesce overlapping match sections per side and path; the longest
/// coalesced extent estimates the optimal window size. Adjacent-but-disjoint
/// sections stay separate — only genuine overlap hints at a longer run.
pub(crate) fn coalesced_estimate(matches: &[Match]) -> usize {
    use std::collections::BTreeMap;

    let mut by_location: BTreeMap<(Side, crate::model::section::PathId), Vec<(usize, usize)>> =
        BTreeMap::new();
    for m in matches {
        for section in m.sections() {
            by_location
                .entry((section.side, section.path))
                .or_default()
                .push((section.start, section.end()));
        }
    }

    let mut estimate = 0;
    for intervals in by_location.values_mut() {
        intervals.sort_unstable();
        let mut current: Option<(usize, usize)> = None;
        for &(start, end) in intervals.iter() {
            match current {
                Some((run_start, run_end)) if start < run_end => {
                    current = Some((run_start, run_end.max(end)));
                }
                _ => {
                    if let Some((run_start, run_end)) = current {
                        estimate = estimate.max(run_end - run_start);
                    }
                    current = Some((start, end));
                }
            }
        }
        if let Some((run_start, run_end)) = current {
            estimate = estimate.max(run_end - run_start);
        }
    }
    estimate
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
