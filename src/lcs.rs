//! Three-way longest-common-subsequence alignment.
//!
//! Given three sequences and an equivalence, tags every input element with a
//! [`Contribution`]: common to all three sides, common to exactly one pair,
//! or a difference. The tagging maximizes the lexicographic score
//! `(three-side common size, pairwise common size)`, where size sums the
//! caller's element-size function over each class.
//!
//! The dynamic program walks `(i, j, k)` prefix coordinates in *swathes*: the
//! leading swathe holds every cell whose maximum coordinate equals `s`, and
//! only it and the preceding swathe are retained, bounding live cells by
//! `O(n² + m² + p²)`. Cells inside a swathe are evaluated in ascending
//! `i + j + k` order, so every dependency is either in the preceding swathe
//! or earlier in the leading one. Per-cell partial solutions are shared
//! persistent lists, so retained memory stays proportional to live cells.
//!
//! Ties between equal-score sub-solutions prefer the candidate that grew most
//! recently on the left, the same bias the merge resolution uses.

use std::collections::HashMap;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Contribution
// ---------------------------------------------------------------------------

/// The alignment class of one input element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Contribution {
    /// Present on all three sides.
    Common,
    /// Present on base and left only.
    CommonBaseLeft,
    /// Present on base and right only.
    CommonBaseRight,
    /// Present on left and right only.
    CommonLeftRight,
    /// Particular to its own side.
    Difference,
}

/// Per-side contribution tags; each vector is exactly as long as its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    pub base: Vec<Contribution>,
    pub left: Vec<Contribution>,
    pub right: Vec<Contribution>,
}

// ---------------------------------------------------------------------------
// Persistent tag lists
// ---------------------------------------------------------------------------

type TagList = Option<Rc<TagNode>>;

struct TagNode {
    tag: Contribution,
    rest: TagList,
}

fn pushed(list: &TagList, tag: Contribution) -> TagList {
    Some(Rc::new(TagNode {
        tag,
        rest: list.clone(),
    }))
}

fn collect(list: &TagList, length: usize) -> Vec<Contribution> {
    let mut tags = Vec::with_capacity(length);
    let mut cursor = list;
    while let Some(node) = cursor {
        tags.push(node.tag);
        cursor = &node.rest;
    }
    debug_assert_eq!(tags.len(), length, "tag list length drifted");
    tags.reverse();
    tags
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Partial solution for one prefix triple: the score plus the (reversed)
/// tag lists of all three prefixes.
#[derive(Clone, Default)]
struct Cell {
    common_size: usize,
    pairwise_size: usize,
    base: TagList,
    left: TagList,
    right: TagList,
}

impl Cell {
    const fn score(&self) -> (usize, usize) {
        (self.common_size, self.pairwise_size)
    }
}

// ---------------------------------------------------------------------------
// align
// ---------------------------------------------------------------------------

/// Tag the three inputs, maximizing `(common size, pairwise size)`.
///
/// `eq` must behave as an equivalence across sides; `size` gives each
/// element's weight in the score. Empty inputs produce empty tag vectors;
/// there are no failure modes.
pub fn align<T>(
    base: &[T],
    left: &[T],
    right: &[T],
    eq: impl Fn(&T, &T) -> bool,
    size: impl Fn(&T) -> usize,
) -> Alignment {
    let (n, m, p) = (base.len(), left.len(), right.len());
    let final_swathe = n.max(m).max(p);

    let mut preceding: HashMap<(usize, usize, usize), Cell> = HashMap::new();
    let mut leading: HashMap<(usize, usize, usize), Cell> = HashMap::new();

    for s in 0..=final_swathe {
        leading.clear();
        let mut cells = swathe_cells(s, n, m, p);
        // Diagonal order: every dependency decreases i + j + k, so it has
        // already been evaluated, in this swathe or the preceding one.
        cells.sort_by_key(|&(i, j, k)| i + j + k);

        for (i, j, k) in cells {
            let cell = best_cell(
                (i, j, k),
                s,
                base,
                left,
                right,
                &eq,
                &size,
                &leading,
                &preceding,
            );
            leading.insert((i, j, k), cell);
        }
        std::mem::swap(&mut preceding, &mut leading);
    }

    // After the final swap the last swathe lives in `preceding`.
    let solution = preceding
        .get(&(n, m, p))
        .expect("the final cell is always evaluated");
    Alignment {
        base: collect(&solution.base, n),
        left: collect(&solution.left, m),
        right: collect(&solution.right, p),
    }
}

/// Coordinates of every cell whose maximum coordinate equals `s`.
fn swathe_cells(s: usize, n: usize, m: usize, p: usize) -> Vec<(usize, usize, usize)> {
    let mut cells = Vec::new();
    if s <= n {
        for j in 0..=s.min(m) {
            for k in 0..=s.min(p) {
                cells.push((s, j, k));
            }
        }
    }
    if s <= m {
        for i in (0..=s.min(n)).filter(|&i| i != s) {
            for k in 0..=s.min(p) {
                cells.push((i, s, k));
            }
        }
    }
    if s <= p {
        for i in (0..=s.min(n)).filter(|&i| i != s) {
            for j in (0..=s.min(m)).filter(|&j| j != s) {
                cells.push((i, j, s));
            }
        }
    }
    cells
}

/// Evaluate one cell from its up-to-seven predecessors.
///
/// Candidates are tried in a fixed order — all-three common, base–left,
/// left–right, base–right, then left/right/base drops — and only a strictly
/// better score displaces an earlier candidate, which implements the
/// left-most-recent-growth tie-break.
/// Fetch a dependency cell from whichever swathe store holds it.
fn dependency<'c>(
    coords: (usize, usize, usize),
    s: usize,
    leading: &'c HashMap<(usize, usize, usize), Cell>,
    preceding: &'c HashMap<(usize, usize, usize), Cell>,
) -> &'c Cell {
    let swathe_of = coords.0.max(coords.1).max(coords.2);
    let store = if swathe_of == s { leading } else { preceding };
    store
        .get(&coords)
        .expect("dependency precedes its dependent")
}

#[allow(clippy::too_many_arguments)]
fn best_cell<T>(
    (i, j, k): (usize, usize, usize),
    s: usize,
    base: &[T],
    left: &[T],
    right: &[T],
    eq: &impl Fn(&T, &T) -> bool,
    size: &impl Fn(&T) -> usize,
    leading: &HashMap<(usize, usize, usize), Cell>,
    preceding: &HashMap<(usize, usize, usize), Cell>,
) -> Cell {
    let lookup = |coords: (usize, usize, usize)| dependency(coords, s, leading, preceding);

    let mut best: Option<Cell> = None;
    let mut consider = |candidate: Cell| match &best {
        Some(current) if candidate.score() <= current.score() => {}
        _ => best = Some(candidate),
    };

    if i > 0 && j > 0 && k > 0 {
        let (b, l, r) = (&base[i - 1], &left[j - 1], &right[k - 1]);
        if eq(b, l) && eq(b, r) && eq(l, r) {
            let from = lookup((i - 1, j - 1, k - 1));
            consider(Cell {
                common_size: from.common_size + size(b),
                pairwise_size: from.pairwise_size,
                base: pushed(&from.base, Contribution::Common),
                left: pushed(&from.left, Contribution::Common),
                right: pushed(&from.right, Contribution::Common),
            });
        }
    }
    if i > 0 && j > 0 && eq(&base[i - 1], &left[j - 1]) {
        let from = lookup((i - 1, j - 1, k));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size + size(&left[j - 1]),
            base: pushed(&from.base, Contribution::CommonBaseLeft),
            left: pushed(&from.left, Contribution::CommonBaseLeft),
            right: from.right.clone(),
        });
    }
    if j > 0 && k > 0 && eq(&left[j - 1], &right[k - 1]) {
        let from = lookup((i, j - 1, k - 1));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size + size(&left[j - 1]),
            base: from.base.clone(),
            left: pushed(&from.left, Contribution::CommonLeftRight),
            right: pushed(&from.right, Contribution::CommonLeftRight),
        });
    }
    if i > 0 && k > 0 && eq(&base[i - 1], &right[k - 1]) {
        let from = lookup((i - 1, j, k - 1));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size + size(&right[k - 1]),
            base: pushed(&from.base, Contribution::CommonBaseRight),
            left: from.left.clone(),
            right: pushed(&from.right, Contribution::CommonBaseRight),
        });
    }
    if j > 0 {
        let from = lookup((i, j - 1, k));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size,
            base: from.base.clone(),
            left: pushed(&from.left, Contribution::Difference),
            right: from.right.clone(),
        });
    }
    if k > 0 {
        let from = lookup((i, j, k - 1));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size,
            base: from.base.clone(),
            left: from.left.clone(),
            right: pushed(&from.right, Contribution::Difference),
        });
    }
    if i > 0 {
        let from = lookup((i - 1, j, k));
        consider(Cell {
            common_size: from.common_size,
            pairwise_size: from.pairwise_size,
            base: pushed(&from.base, Contribution::Difference),
            left: from.left.clone(),
            right: from.right.clone(),
        });
    }

    // Only the origin cell has no predecessor at all.
    best.unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn align_chars(base: &str, left: &str, right: &str) -> Alignment {
        let b: Vec<char> = base.chars().collect();
        let l: Vec<char> = left.chars().collect();
        let r: Vec<char> = right.chars().collect();
        align(&b, &l, &r, |a, b| a == b, |_| 1)
    }

    fn kept(input: &str, tags: &[Contribution], class: &[Contribution]) -> String {
        input
            .chars()
            .zip(tags)
            .filter(|&(_, tag)| class.contains(tag))
            .map(|(c, _)| c)
            .collect()
    }

    #[test]
    fn empty_inputs_produce_empty_tags() {
        let alignment = align_chars("", "", "");
        assert!(alignment.base.is_empty());
        assert!(alignment.left.is_empty());
        assert!(alignment.right.is_empty());
    }

    #[test]
    fn lengths_are_preserved() {
        let alignment = align_chars("abcde", "axc", "aycez");
        assert_eq!(alignment.base.len(), 5);
        assert_eq!(alignment.left.len(), 3);
        assert_eq!(alignment.right.len(), 5);
    }

    #[test]
    fn identical_inputs_are_fully_common() {
        let alignment = align_chars("abc", "abc", "abc");
        assert!(alignment.base.iter().all(|&t| t == Contribution::Common));
        assert!(alignment.left.iter().all(|&t| t == Contribution::Common));
        assert!(alignment.right.iter().all(|&t| t == Contribution::Common));
    }

    #[test]
    fn common_subsequences_agree_across_sides() {
        let alignment = align_chars("abcd", "abxd", "aybd");
        let base_common = kept("abcd", &alignment.base, &[Contribution::Common]);
        let left_common = kept("abxd", &alignment.left, &[Contribution::Common]);
        let right_common = kept("aybd", &alignment.right, &[Contribution::Common]);
        assert_eq!(base_common, left_common);
        assert_eq!(base_common, right_common);
        assert_eq!(base_common, "abd");
    }

    #[test]
    fn element_deleted_on_both_sides_is_a_difference() {
        let alignment = align_chars("abc", "ac", "ac");
        assert_eq!(
            alignment.base,
            vec![
                Contribution::Common,
                Contribution::Difference,
                Contribution::Common,
            ],
        );
    }

    #[test]
    fn base_left_pair_is_tagged_pairwise() {
        let alignment = align_chars("ab", "ab", "b");
        assert_eq!(
            alignment.base,
            vec![Contribution::CommonBaseLeft, Contribution::Common],
        );
        assert_eq!(
            alignment.left,
            vec![Contribution::CommonBaseLeft, Contribution::Common],
        );
        assert_eq!(alignment.right, vec![Contribution::Common]);
    }

    #[test]
    fn coincident_insertion_is_left_right_pairwise() {
        let alignment = align_chars("a", "xa", "xa");
        assert_eq!(
            alignment.left,
            vec![Contribution::CommonLeftRight, Contribution::Common],
        );
        assert_eq!(
            alignment.right,
            vec![Contribution::CommonLeftRight, Contribution::Common],
        );
        assert_eq!(alignment.base, vec![Contribution::Common]);
    }

    #[test]
    fn three_way_commonality_beats_a_longer_pairwise_match() {
        // A full base-right pairwise "ab" would score (0, 2); taking "a" as
        // three-way common scores (1, 1) and must win lexicographically.
        let alignment = align_chars("ab", "ba", "ab");
        assert!(
            alignment.base.contains(&Contribution::Common),
            "expected a three-way common element, got {:?}",
            alignment.base,
        );
    }

    #[test]
    fn swapping_left_and_right_preserves_the_score() {
        let score = |alignment: &Alignment, base: &str, left: &str| {
            let common = kept(base, &alignment.base, &[Contribution::Common]).len();
            let pairwise = kept(
                base,
                &alignment.base,
                &[Contribution::CommonBaseLeft, Contribution::CommonBaseRight],
            )
            .len()
                + kept(left, &alignment.left, &[Contribution::CommonLeftRight]).len();
            (common, pairwise)
        };
        let forward = align_chars("abcd", "abd", "acd");
        let mirrored = align_chars("abcd", "acd", "abd");
        assert_eq!(score(&forward, "abcd", "abd"), score(&mirrored, "abcd", "acd"));
    }

    #[test]
    fn sizes_weight_the_score() {
        // With width on 'Z', aligning the heavy element pairwise outweighs a
        // longer light alignment.
        let b: Vec<char> = "Zab".chars().collect();
        let l: Vec<char> = "abZ".chars().collect();
        let r: Vec<char> = "Z".chars().collect();
        let alignment = align(&b, &l, &r, |a, c| a == c, |c| if *c == 'Z' { 10 } else { 1 });
        assert_eq!(alignment.right, vec![Contribution::Common]);
        assert_eq!(alignment.base[0], Contribution::Common);
    }

    #[test]
    fn one_empty_side_degrades_to_pairwise() {
        let alignment = align_chars("ab", "ab", "");
        assert!(alignment
            .base
            .iter()
            .all(|&t| t == Contribution::CommonBaseLeft));
        assert!(alignment.right.is_empty());
    }
}
