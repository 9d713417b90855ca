//! Matches across sides and the section-indexed view over them.
//!
//! A [`Match`] links sections of two or three sides that carry the same
//! content. [`MatchedSections`] is the multi-map from section to the matches
//! it participates in, together with per-side interval indices answering the
//! overlap and subsumption queries match discovery leans on.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::section::{PathId, Section, Side};

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// An equivalence link between sections across two or three sides.
///
/// The variant order doubles as the tie-break priority: an `AllSides` match
/// always sorts before any pairwise match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Match {
    /// Content present on all three sides.
    AllSides {
        base: Section,
        left: Section,
        right: Section,
    },
    /// Content present on base and left only — deleted or moved away on
    /// right.
    BaseAndLeft { base: Section, left: Section },
    /// Content present on base and right only.
    BaseAndRight { base: Section, right: Section },
    /// Coincident insertion: the same content added on left and right.
    LeftAndRight { left: Section, right: Section },
}

/// Discriminant of a [`Match`], used for the kind-consistency invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchKind {
    AllSides,
    BaseAndLeft,
    BaseAndRight,
    LeftAndRight,
}

impl Match {
    #[must_use]
    pub const fn kind(&self) -> MatchKind {
        match self {
            Self::AllSides { .. } => MatchKind::AllSides,
            Self::BaseAndLeft { .. } => MatchKind::BaseAndLeft,
            Self::BaseAndRight { .. } => MatchKind::BaseAndRight,
            Self::LeftAndRight { .. } => MatchKind::LeftAndRight,
        }
    }

    #[must_use]
    pub const fn is_all_sides(&self) -> bool {
        matches!(self, Self::AllSides { .. })
    }

    #[must_use]
    pub const fn is_pairwise(&self) -> bool {
        !self.is_all_sides()
    }

    /// The participating sections, base first where present.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        match *self {
            Self::AllSides { base, left, right } => vec![base, left, right],
            Self::BaseAndLeft { base, left } => vec![base, left],
            Self::BaseAndRight { base, right } => vec![base, right],
            Self::LeftAndRight { left, right } => vec![left, right],
        }
    }

    /// The section this match contributes on `side`, if any.
    #[must_use]
    pub fn section_on(&self, side: Side) -> Option<Section> {
        match (*self, side) {
            (Self::AllSides { base, .. }, Side::Base)
            | (Self::BaseAndLeft { base, .. }, Side::Base)
            | (Self::BaseAndRight { base, .. }, Side::Base) => Some(base),
            (Self::AllSides { left, .. }, Side::Left)
            | (Self::BaseAndLeft { left, .. }, Side::Left)
            | (Self::LeftAndRight { left, .. }, Side::Left) => Some(left),
            (Self::AllSides { right, .. }, Side::Right)
            | (Self::BaseAndRight { right, .. }, Side::Right)
            | (Self::LeftAndRight { right, .. }, Side::Right) => Some(right),
            _ => None,
        }
    }

    /// The base section, absent for coincident insertions.
    #[must_use]
    pub fn base_section(&self) -> Option<Section> {
        self.section_on(Side::Base)
    }

    /// The canonical representative section used for equivalence and for the
    /// move report's grouping key.
    ///
    /// `AllSides` is represented by its base; each pairwise variant by the
    /// side that survives the merge (left for `BaseAndLeft`, right for
    /// `BaseAndRight`), and coincident insertions by left to break symmetry.
    #[must_use]
    pub const fn dominant_section(&self) -> Section {
        match *self {
            Self::AllSides { base, .. } => base,
            Self::BaseAndLeft { left, .. } => left,
            Self::BaseAndRight { right, .. } => right,
            Self::LeftAndRight { left, .. } => left,
        }
    }

    /// Element length of the matched content (identical across the match's
    /// sections by construction).
    #[must_use]
    pub const fn length(&self) -> usize {
        match self {
            Self::AllSides { base, .. } => base.length,
            Self::BaseAndLeft { base, .. } => base.length,
            Self::BaseAndRight { base, .. } => base.length,
            Self::LeftAndRight { left, .. } => left.length,
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSides { base, left, right } => {
                write!(f, "all-sides({base}, {left}, {right})")
            }
            Self::BaseAndLeft { base, left } => write!(f, "base-and-left({base}, {left})"),
            Self::BaseAndRight { base, right } => write!(f, "base-and-right({base}, {right})"),
            Self::LeftAndRight { left, right } => write!(f, "left-and-right({left}, {right})"),
        }
    }
}

// ---------------------------------------------------------------------------
// SectionIndex — per-side interval index
// ---------------------------------------------------------------------------

/// Interval index over one side's matched sections.
///
/// Intervals are reference-counted because ambiguous matches legitimately
/// register the same section several times. Queries are bounded by a per-path
/// maximum-length watermark, so a lookup scans only the intervals that could
/// possibly reach the queried range.
#[derive(Clone, Debug, Default)]
pub struct SectionIndex {
    by_path: BTreeMap<PathId, PathIntervals>,
}

#[derive(Clone, Debug, Default)]
struct PathIntervals {
    /// `(start, end) → reference count`.
    intervals: BTreeMap<(usize, usize), usize>,
    /// Watermark: length of the longest interval ever inserted. Never
    /// shrinks; it only has to stay an upper bound.
    max_length: usize,
}

impl PathIntervals {
    fn candidates(
        &self,
        query_start: usize,
        query_end: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let scan_from = query_start.saturating_sub(self.max_length);
        self.intervals
            .range((scan_from, 0)..(query_end, usize::MAX))
            .map(|(&interval, _)| interval)
    }
}

impl SectionIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: &Section) {
        let entry = self.by_path.entry(section.path).or_default();
        entry.max_length = entry.max_length.max(section.length);
        *entry
            .intervals
            .entry((section.start, section.end()))
            .or_insert(0) += 1;
    }

    pub fn remove(&mut self, section: &Section) {
        if let Some(entry) = self.by_path.get_mut(&section.path) {
            let key = (section.start, section.end());
            if let Some(count) = entry.intervals.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    entry.intervals.remove(&key);
                }
            }
        }
    }

    /// Does any indexed interval overlap `section` without being identical to
    /// it? Identical intervals are the ambiguous-duplicate exemption.
    #[must_use]
    pub fn overlaps_excluding_identical(&self, section: &Section) -> bool {
        let Some(entry) = self.by_path.get(&section.path) else {
            return false;
        };
        entry
            .candidates(section.start, section.end())
            .any(|(start, end)| {
                end > section.start
                    && start < section.end()
                    && (start, end) != (section.start, section.end())
            })
    }

    /// Does any indexed interval strictly contain `section` (container larger
    /// than the section itself)?
    #[must_use]
    pub fn strictly_subsumes(&self, section: &Section) -> bool {
        !self.containing_intervals(section).is_empty()
    }

    /// The intervals strictly containing `section`, as `(start, end)` pairs.
    #[must_use]
    pub fn containing_intervals(&self, section: &Section) -> Vec<(usize, usize)> {
        let Some(entry) = self.by_path.get(&section.path) else {
            return Vec::new();
        };
        entry
            .candidates(section.start, section.start + 1)
            .filter(|&(start, end)| {
                start <= section.start
                    && section.end() <= end
                    && (start, end) != (section.start, section.end())
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MatchedSections
// ---------------------------------------------------------------------------

/// The multi-map from section to its matches, plus the per-side interval
/// indices.
///
/// Built incrementally by match discovery (one owning builder, committed per
/// window-size pass) and then read-only for the rest of the pipeline.
#[derive(Clone, Debug, Default)]
pub struct MatchedSections {
    matches_by_section: BTreeMap<Section, BTreeSet<Match>>,
    base_index: SectionIndex,
    left_index: SectionIndex,
    right_index: SectionIndex,
}

impl MatchedSections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index_mut(&mut self, side: Side) -> &mut SectionIndex {
        match side {
            Side::Base => &mut self.base_index,
            Side::Left => &mut self.left_index,
            Side::Right => &mut self.right_index,
        }
    }

    #[must_use]
    pub fn index(&self, side: Side) -> &SectionIndex {
        match side {
            Side::Base => &self.base_index,
            Side::Left => &self.left_index,
            Side::Right => &self.right_index,
        }
    }

    /// Register a match under each of its sections.
    pub fn add(&mut self, m: Match) {
        for section in m.sections() {
            let inserted = self
                .matches_by_section
                .entry(section)
                .or_default()
                .insert(m);
            if inserted {
                self.index_mut(section.side).insert(&section);
            }
        }
    }

    /// Remove a match from every section that carries it.
    pub fn remove(&mut self, m: &Match) {
        for section in m.sections() {
            let (removed, now_empty) = if let Some(set) = self.matches_by_section.get_mut(&section) {
                (set.remove(m), set.is_empty())
            } else {
                (false, false)
            };
            if removed {
                self.index_mut(section.side).remove(&section);
            }
            if now_empty {
                self.matches_by_section.remove(&section);
            }
        }
    }

    /// The matches `section` participates in; unmatched sections yield an
    /// empty set.
    #[must_use]
    pub fn matches_for(&self, section: &Section) -> &BTreeSet<Match> {
        static EMPTY: BTreeSet<Match> = BTreeSet::new();
        self.matches_by_section.get(section).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn is_matched(&self, section: &Section) -> bool {
        self.matches_by_section.contains_key(section)
    }

    /// Every distinct match in the set.
    #[must_use]
    pub fn all_matches(&self) -> BTreeSet<Match> {
        self.matches_by_section
            .values()
            .flat_map(|set| set.iter().copied())
            .collect()
    }

    /// Every matched section, across all sides, in section order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> + '_ {
        self.matches_by_section.keys()
    }

    /// Matched sections belonging to one side.
    pub fn sections_on(&self, side: Side) -> impl Iterator<Item = &Section> + '_ {
        self.sections().filter(move |s| s.side == side)
    }

    /// Matches owning a section that strictly contains `section` on its own
    /// side.
    #[must_use]
    pub fn containers_of(&self, section: &Section) -> Vec<Match> {
        let mut containers: Vec<Match> = self
            .index(section.side)
            .containing_intervals(section)
            .into_iter()
            .flat_map(|(start, end)| {
                self.matches_for(&Section::new(section.side, section.path, start, end - start))
                    .iter()
                    .copied()
            })
            .collect();
        containers.sort_unstable();
        containers.dedup();
        containers
    }

    /// Do two sections share at least one match?
    #[must_use]
    pub fn share_a_match(&self, a: &Section, b: &Section) -> bool {
        let (smaller, larger) = {
            let ma = self.matches_for(a);
            let mb = self.matches_for(b);
            if ma.len() <= mb.len() {
                (ma, mb)
            } else {
                (mb, ma)
            }
        };
        smaller.iter().any(|m| larger.contains(m))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches_by_section.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(side: Side, start: usize, length: usize) -> Section {
        Section::new(side, PathId(0), start, length)
    }

    fn all_sides(start: usize, length: usize) -> Match {
        Match::AllSides {
            base: sec(Side::Base, start, length),
            left: sec(Side::Left, start, length),
            right: sec(Side::Right, start, length),
        }
    }

    #[test]
    fn dominant_sections_break_symmetry() {
        let base = sec(Side::Base, 0, 2);
        let left = sec(Side::Left, 4, 2);
        let right = sec(Side::Right, 8, 2);
        assert_eq!(
            Match::AllSides { base, left, right }.dominant_section(),
            base,
        );
        assert_eq!(Match::BaseAndLeft { base, left }.dominant_section(), left);
        assert_eq!(
            Match::BaseAndRight { base, right }.dominant_section(),
            right,
        );
        assert_eq!(Match::LeftAndRight { left, right }.dominant_section(), left);
    }

    #[test]
    fn all_sides_sorts_before_pairwise() {
        let base = sec(Side::Base, 0, 2);
        let left = sec(Side::Left, 0, 2);
        let right = sec(Side::Right, 0, 2);
        let mut v = vec![
            Match::LeftAndRight { left, right },
            Match::BaseAndLeft { base, left },
            Match::AllSides { base, left, right },
        ];
        v.sort();
        assert!(v[0].is_all_sides());
    }

    #[test]
    fn section_on_reads_the_right_slot() {
        let m = all_sides(3, 2);
        assert_eq!(m.section_on(Side::Base), Some(sec(Side::Base, 3, 2)));
        assert_eq!(m.section_on(Side::Left), Some(sec(Side::Left, 3, 2)));
        let pairwise = Match::BaseAndLeft {
            base: sec(Side::Base, 0, 1),
            left: sec(Side::Left, 0, 1),
        };
        assert_eq!(pairwise.section_on(Side::Right), None);
    }

    #[test]
    fn index_overlap_ignores_identical_intervals() {
        let mut index = SectionIndex::new();
        let section = sec(Side::Base, 5, 3);
        index.insert(&section);
        assert!(!index.overlaps_excluding_identical(&section));
        assert!(index.overlaps_excluding_identical(&sec(Side::Base, 6, 3)));
        assert!(index.overlaps_excluding_identical(&sec(Side::Base, 4, 2)));
        assert!(!index.overlaps_excluding_identical(&sec(Side::Base, 8, 2)));
        assert!(!index.overlaps_excluding_identical(&sec(Side::Base, 0, 5)));
    }

    #[test]
    fn index_subsumption_is_strict() {
        let mut index = SectionIndex::new();
        index.insert(&sec(Side::Base, 2, 6));
        assert!(index.strictly_subsumes(&sec(Side::Base, 3, 2)));
        assert!(index.strictly_subsumes(&sec(Side::Base, 2, 5)));
        assert!(!index.strictly_subsumes(&sec(Side::Base, 2, 6)), "identical");
        assert!(!index.strictly_subsumes(&sec(Side::Base, 1, 3)));
    }

    #[test]
    fn index_remove_respects_reference_counts() {
        let mut index = SectionIndex::new();
        let section = sec(Side::Base, 0, 4);
        index.insert(&section);
        index.insert(&section);
        index.remove(&section);
        assert!(index.strictly_subsumes(&sec(Side::Base, 1, 2)));
        index.remove(&section);
        assert!(!index.strictly_subsumes(&sec(Side::Base, 1, 2)));
    }

    #[test]
    fn matched_sections_multi_map() {
        let mut matched = MatchedSections::new();
        let m = all_sides(0, 2);
        matched.add(m);
        let base = sec(Side::Base, 0, 2);
        assert!(matched.is_matched(&base));
        assert_eq!(matched.matches_for(&base).len(), 1);
        assert_eq!(matched.all_matches().len(), 1);
        assert_eq!(matched.sections_on(Side::Left).count(), 1);
    }

    #[test]
    fn remove_unregisters_everywhere() {
        let mut matched = MatchedSections::new();
        let m = all_sides(0, 2);
        matched.add(m);
        matched.remove(&m);
        assert!(matched.is_empty());
        assert!(!matched
            .index(Side::Base)
            .overlaps_excluding_identical(&sec(Side::Base, 1, 2)));
    }

    #[test]
    fn share_a_match_requires_a_common_link() {
        let mut matched = MatchedSections::new();
        let m = all_sides(0, 2);
        let other = all_sides(4, 2);
        matched.add(m);
        matched.add(other);
        assert!(matched.share_a_match(&sec(Side::Base, 0, 2), &sec(Side::Left, 0, 2)));
        assert!(!matched.share_a_match(&sec(Side::Base, 0, 2), &sec(Side::Left, 4, 2)));
    }
}
