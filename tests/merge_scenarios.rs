//! End-to-end merge scenarios over integer elements with explicitly given
//! matches, plus a few discovery-driven round trips.

use std::collections::BTreeMap;
use std::path::PathBuf;

use kinetic_merge::{
    CodeMotionAnalysis, Match, MatchingConfig, MergeResult, NoProgress, PathInterner, Section,
    Sources,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn contents(entries: &[(&str, &[i32])]) -> BTreeMap<PathBuf, Vec<i32>> {
    entries
        .iter()
        .map(|(path, elements)| (PathBuf::from(path), elements.to_vec()))
        .collect()
}

fn section(
    interner: &PathInterner,
    sources: &Sources<i32>,
    path: &str,
    start: usize,
    length: usize,
) -> Section {
    let id = interner
        .lookup(std::path::Path::new(path))
        .expect("path is interned");
    sources.section(id, start, length)
}

fn result_at<'a>(results: &'a BTreeMap<PathBuf, MergeResult<i32>>, path: &str) -> &'a MergeResult<i32> {
    &results[&PathBuf::from(path)]
}

// ---------------------------------------------------------------------------
// The literal scenarios
// ---------------------------------------------------------------------------

#[test]
fn pure_edit() {
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("a", &[1])]),
        contents(&[("a", &[2])]),
        contents(&[("a", &[3])]),
        |interner, base, left, _right| {
            vec![Match::BaseAndLeft {
                base: section(interner, base, "a", 0, 1),
                left: section(interner, left, "a", 0, 1),
            }]
        },
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    assert_eq!(result_at(&results, "a"), &MergeResult::FullyMerged(vec![3]));
}

#[test]
fn insertion_opposite_edit() {
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("a", &[1])]),
        contents(&[("a", &[2, 3])]),
        contents(&[("a", &[4])]),
        |interner, base, left, _right| {
            vec![Match::BaseAndLeft {
                base: section(interner, base, "a", 0, 1),
                left: section(interner, left, "a", 0, 1),
            }]
        },
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    assert_eq!(
        result_at(&results, "a"),
        &MergeResult::FullyMerged(vec![4, 3]),
    );
}

#[test]
fn insertion_opposite_deletion() {
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("a", &[1])]),
        contents(&[("a", &[2, 3])]),
        contents(&[("a", &[])]),
        |interner, base, left, _right| {
            vec![Match::BaseAndLeft {
                base: section(interner, base, "a", 0, 1),
                left: section(interner, left, "a", 1, 1),
            }]
        },
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    assert_eq!(result_at(&results, "a"), &MergeResult::FullyMerged(vec![2]));
}

#[test]
fn edit_conflict() {
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("a", &[1, 2])]),
        contents(&[("a", &[3, 4])]),
        contents(&[("a", &[5, 6])]),
        |interner, base, left, right| {
            vec![Match::AllSides {
                base: section(interner, base, "a", 1, 1),
                left: section(interner, left, "a", 1, 1),
                right: section(interner, right, "a", 1, 1),
            }]
        },
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    assert_eq!(
        result_at(&results, "a"),
        &MergeResult::MergedWithConflicts {
            left: vec![3, 4],
            right: vec![5, 4],
        },
    );
}

#[test]
fn coincident_deletion_plus_edit() {
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("a", &[1, 2])]),
        contents(&[("a", &[3])]),
        contents(&[("a", &[4])]),
        |interner, base, left, _right| {
            vec![Match::BaseAndLeft {
                base: section(interner, base, "a", 1, 1),
                left: section(interner, left, "a", 0, 1),
            }]
        },
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    assert_eq!(result_at(&results, "a"), &MergeResult::FullyMerged(vec![4]));
}

#[test]
fn move_with_propagated_edit() {
    // B moves from path q to path r on the right while the left edits it in
    // place; A stays put at p on every side.
    let analysis = CodeMotionAnalysis::with_matches(
        contents(&[("p", &[10]), ("q", &[20, 21])]),
        contents(&[("p", &[10]), ("q", &[30, 31])]),
        contents(&[("p", &[10]), ("r", &[20, 21])]),
        |interner, base, left, right| {
            vec![
                Match::AllSides {
                    base: section(interner, base, "p", 0, 1),
                    left: section(interner, left, "p", 0, 1),
                    right: section(interner, right, "p", 0, 1),
                },
                Match::BaseAndRight {
                    base: section(interner, base, "q", 0, 2),
                    right: section(interner, right, "r", 0, 2),
                },
            ]
        },
    );
    let (results, report) = analysis.merge_quietly().expect("unambiguous");

    assert_eq!(
        result_at(&results, "r"),
        &MergeResult::FullyMerged(vec![30, 31]),
        "the left edit is substituted at the move destination",
    );
    assert_eq!(
        result_at(&results, "q"),
        &MergeResult::FullyMerged(vec![]),
        "the origin loses the moved content",
    );
    assert_eq!(result_at(&results, "p"), &MergeResult::FullyMerged(vec![10]));

    let moved_group = report
        .moves
        .values()
        .find(|group| !group.sources.is_empty() && !group.right.is_empty())
        .expect("the move is reported");
    assert!(!moved_group.is_degenerate());
    assert!(!moved_group.is_divergent());
}

// ---------------------------------------------------------------------------
// Discovery-driven round trips
// ---------------------------------------------------------------------------

#[test]
fn merging_three_identical_trees_is_idempotent() {
    let tree = &[
        ("src/lib", &(0..40).collect::<Vec<i32>>()[..]),
        ("src/util", &(100..130).collect::<Vec<i32>>()[..]),
    ];
    let analysis = CodeMotionAnalysis::of(
        contents(tree),
        contents(tree),
        contents(tree),
        &MatchingConfig::new(4, 0.0, 50).unwrap(),
        &mut NoProgress,
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");
    for (path, expected) in tree {
        assert_eq!(
            result_at(&results, path),
            &MergeResult::FullyMerged(expected.to_vec()),
        );
    }
}

#[test]
fn disjoint_edits_in_one_file_merge_cleanly() {
    let base: Vec<i32> = (0..30).collect();
    let mut left = base.clone();
    left[2] = 90; // near the front
    let mut right = base.clone();
    right[27] = 91; // near the back

    let analysis = CodeMotionAnalysis::of(
        contents(&[("a", &base)]),
        contents(&[("a", &left)]),
        contents(&[("a", &right)]),
        &MatchingConfig::new(3, 0.0, 50).unwrap(),
        &mut NoProgress,
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");

    let mut expected = base;
    expected[2] = 90;
    expected[27] = 91;
    assert_eq!(
        result_at(&results, "a"),
        &MergeResult::FullyMerged(expected),
    );
}

#[test]
fn a_file_split_in_two_keeps_both_halves() {
    // The right splits one base file into two new files; the left leaves it
    // alone. Both halves match and survive at their new homes.
    let front: Vec<i32> = (0..15).collect();
    let back: Vec<i32> = (50..65).collect();
    let mut whole = front.clone();
    whole.extend(back.clone());

    let analysis = CodeMotionAnalysis::of(
        contents(&[("whole", &whole)]),
        contents(&[("whole", &whole)]),
        contents(&[("front", &front), ("back", &back)]),
        &MatchingConfig::new(4, 0.0, 50).unwrap(),
        &mut NoProgress,
    );
    let (results, report) = analysis.merge_quietly().expect("unambiguous");

    assert_eq!(
        result_at(&results, "front"),
        &MergeResult::FullyMerged(front),
    );
    assert_eq!(result_at(&results, "back"), &MergeResult::FullyMerged(back));
    assert_eq!(
        result_at(&results, "whole"),
        &MergeResult::FullyMerged(vec![]),
        "the split leaves nothing at the original path",
    );
    assert!(
        report
            .moves
            .values()
            .filter(|group| !group.right.is_empty() && !group.sources.is_empty())
            .count()
            >= 2,
        "both halves are reported as moves",
    );
}

#[test]
fn deletion_propagates_to_the_move_destination() {
    // Content moves to a new path on the right; the left deletes it at the
    // origin. The deletion chases the content to its destination.
    let moved: Vec<i32> = (100..115).collect();
    let rest: Vec<i32> = (0..15).collect();
    let mut origin = rest.clone();
    origin.extend(moved.clone());

    let analysis = CodeMotionAnalysis::of(
        contents(&[("o", &origin)]),
        contents(&[("o", &rest)]),
        contents(&[("o", &rest), ("d", &moved)]),
        &MatchingConfig::new(4, 0.0, 50).unwrap(),
        &mut NoProgress,
    );
    let (results, _) = analysis.merge_quietly().expect("unambiguous");

    assert_eq!(result_at(&results, "o"), &MergeResult::FullyMerged(rest));
    assert_eq!(
        result_at(&results, "d"),
        &MergeResult::FullyMerged(vec![]),
        "the left deletion follows the moved content",
    );
}
