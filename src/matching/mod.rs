//! Match discovery: the multi-resolution search for moved content.
//!
//! Discovery runs two phases over a strictly decreasing ladder of window
//! sizes, committing matches atomically per accepted size:
//!
//! - **Sure-fire**: a binary chop over `[minimum sure-fire size,
//!   max possible size]`, where every file passes its fractional threshold.
//!   A pass whose admitted matches coalesce beyond the probed size jumps the
//!   probe to the coalesced estimate; a pass that lands exactly commits and
//!   recurses below; an empty pass shrinks the upper bound.
//! - **Small fry**: a linear descent over the remaining sizes down to the
//!   global floor, where per-file thresholds open and close eligibility gaps
//!   that the descent simply walks through.
//!
//! Trial passes are read-only with respect to the committed match set;
//! admission runs against a scratch copy and only an accepted pass replaces
//! the state.

pub(crate) mod pare_down;
pub(crate) mod window;

use std::collections::BTreeMap;

use crate::config::MatchingConfig;
use crate::fingerprint::{element_hashes, FactoryCache, ELEMENT_HASH_BYTES};
use crate::model::element::Element;
use crate::model::matches::{Match, MatchedSections};
use crate::model::section::{PathId, Section, Side};
use crate::model::sources::Sources;
use crate::progress::ProgressRecorder;

use pare_down::{admit_matches, remove_redundant_pairwise, stabilize};
use window::{coalesced_estimate, matches_for_window_size};

// ---------------------------------------------------------------------------
// DiscoveryState
// ---------------------------------------------------------------------------

/// Everything a window pass needs: the three sides, the per-file element-hash
/// streams (computed once), the rolling-hash factory cache, and the committed
/// match set.
pub(crate) struct DiscoveryState<'a, E: Element> {
    pub base: &'a Sources<E>,
    pub left: &'a Sources<E>,
    pub right: &'a Sources<E>,
    pub config: &'a MatchingConfig,
    pub hashes: BTreeMap<(Side, PathId), Vec<[u8; ELEMENT_HASH_BYTES]>>,
    pub factories: FactoryCache,
    pub matched: MatchedSections,
}

impl<'a, E: Element> DiscoveryState<'a, E> {
    pub fn new(
        base: &'a Sources<E>,
        left: &'a Sources<E>,
        right: &'a Sources<E>,
        config: &'a MatchingConfig,
    ) -> Self {
        let mut hashes = BTreeMap::new();
        for sources in [base, left, right] {
            for path in sources.paths() {
                hashes.insert(
                    (sources.side(), path),
                    element_hashes(sources.file_contents(path)),
                );
            }
        }
        Self {
            base,
            left,
            right,
            config,
            hashes,
            factories: FactoryCache::new(),
            matched: MatchedSections::new(),
        }
    }

    pub fn sources_on(&self, side: Side) -> &'a Sources<E> {
        match side {
            Side::Base => self.base,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn content_of(&self, section: &Section) -> &'a [E] {
        self.sources_on(section.side).contents_of(section)
    }
}

// ---------------------------------------------------------------------------
// Window-size bounds
// ---------------------------------------------------------------------------

/// The global window-size ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bounds {
    /// Smallest window size eligible in at least the smallest file.
    minimum_across_all: usize,
    /// Smallest window size guaranteed eligible in *every* file.
    sure_fire: usize,
    /// Second-largest file size: a match spans at least two sides.
    max_possible: usize,
}

impl Bounds {
    fn compute<E: Element>(state: &DiscoveryState<'_, E>) -> Option<Bounds> {
        let mut sizes: Vec<usize> = [state.base, state.left, state.right]
            .iter()
            .flat_map(|sources| sources.paths().map(|path| sources.file_size(path)))
            .collect();
        if sizes.len() < 2 {
            return None;
        }
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        let max_possible = sizes[1];
        if max_possible == 0 {
            return None;
        }
        let largest_file = sizes[0];
        let smallest_file = *sizes.last().expect("sizes is non-empty");
        Some(Bounds {
            minimum_across_all: state.config.window_size_floor_for(smallest_file),
            sure_fire: state
                .config
                .window_size_floor_for(largest_file)
                .min(max_possible),
            max_possible,
        })
    }
}

// ---------------------------------------------------------------------------
// Trial and commit
// ---------------------------------------------------------------------------

/// One admissible pass at a window size: the match set as it would look after
/// admission, the admitted matches, and their coalesced-size estimate.
struct TrialOutcome {
    matched_after: MatchedSections,
    admitted: Vec<Match>,
    estimate: usize,
}

/// Probe `window_size` without touching committed state. `None` when nothing
/// would be admitted.
fn trial<E: Element>(state: &mut DiscoveryState<'_, E>, window_size: usize) -> Option<TrialOutcome> {
    let candidates = matches_for_window_size(state, window_size);
    if candidates.is_empty() {
        return None;
    }
    let mut matched_after = state.matched.clone();
    let admitted = admit_matches(&mut matched_after, &candidates);
    if admitted.is_empty() {
        return None;
    }

    // The size estimate coalesces the admitted matches together with the
    // candidates they crowded out: overlapping siblings of a fresh run are
    // the very signal that a longer match exists. Candidates covered only by
    // *older* matches stay out, so they cannot fake a longer run.
    let mut relevant = admitted.clone();
    relevant.extend(
        candidates
            .iter()
            .filter(|candidate| !admitted.contains(*candidate))
            .filter(|candidate| {
                candidate.sections().iter().any(|section| {
                    admitted.iter().any(|a| {
                        a.section_on(section.side)
                            .is_some_and(|other| section.overlaps(&other))
                    })
                })
            })
            .copied(),
    );
    let estimate = coalesced_estimate(&relevant);

    Some(TrialOutcome {
        matched_after,
        admitted,
        estimate,
    })
}

/// Accept a trial: install its match set, then stabilize and strip redundant
/// pairwise matches.
fn commit<E: Element>(state: &mut DiscoveryState<'_, E>, window_size: usize, outcome: TrialOutcome) {
    let new_all_sides: Vec<Match> = outcome
        .admitted
        .iter()
        .copied()
        .filter(Match::is_all_sides)
        .collect();
    state.matched = outcome.matched_after;
    stabilize(
        &mut state.matched,
        &new_all_sides,
        state.config.minimum_match_size,
    );
    remove_redundant_pairwise(&mut state.matched);
    tracing::debug!(
        window_size,
        admitted = outcome.admitted.len(),
        all_sides = new_all_sides.len(),
        "committed match pass",
    );
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Binary chop with estimate jumps over `[lowest, max_possible]`.
fn sure_fire_phase<E: Element>(
    state: &mut DiscoveryState<'_, E>,
    lowest: usize,
    max_possible: usize,
    progress: &mut dyn ProgressRecorder,
) {
    let mut lower = lowest;
    let mut upper_exclusive = max_possible + 1;
    let mut jump_target: Option<usize> = None;
    progress.new_session("sure-fire match discovery", upper_exclusive - lowest);

    while lower < upper_exclusive {
        progress.up_to(max_possible + 1 - upper_exclusive);
        let window_size = jump_target
            .take()
            .unwrap_or_else(|| lower + (upper_exclusive - lower) / 2);
        match trial(state, window_size) {
            Some(outcome) => {
                let jump = outcome.estimate.min(upper_exclusive - 1);
                if jump > window_size {
                    // Overlapping matches point at a longer run; probe there.
                    lower = window_size;
                    jump_target = Some(jump);
                } else {
                    commit(state, window_size, outcome);
                    upper_exclusive = window_size;
                    lower = lowest;
                }
            }
            None => upper_exclusive = window_size,
        }
    }
    progress.close();
}

/// Linear descent below the sure-fire bound.
fn small_fry_phase<E: Element>(
    state: &mut DiscoveryState<'_, E>,
    minimum_across_all: usize,
    sure_fire: usize,
    progress: &mut dyn ProgressRecorder,
) {
    if sure_fire <= minimum_across_all {
        return;
    }
    progress.new_session("small-fry match discovery", sure_fire - minimum_across_all);
    for (step, window_size) in (minimum_across_all..sure_fire).rev().enumerate() {
        progress.up_to(step + 1);
        if let Some(outcome) = trial(state, window_size) {
            commit(state, window_size, outcome);
        }
    }
    progress.close();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Discover the stabilized match set across the three sides.
pub fn discover_matches<E: Element>(
    base: &Sources<E>,
    left: &Sources<E>,
    right: &Sources<E>,
    config: &MatchingConfig,
    progress: &mut dyn ProgressRecorder,
) -> MatchedSections {
    let mut state = DiscoveryState::new(base, left, right, config);
    let Some(bounds) = Bounds::compute(&state) else {
        return state.matched;
    };
    tracing::debug!(
        minimum_across_all = bounds.minimum_across_all,
        sure_fire = bounds.sure_fire,
        max_possible = bounds.max_possible,
        "match discovery bounds",
    );
    sure_fire_phase(&mut state, bounds.sure_fire, bounds.max_possible, progress);
    small_fry_phase(
        &mut state,
        bounds.minimum_across_all,
        bounds.sure_fire,
        progress,
    );
    state.matched
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
