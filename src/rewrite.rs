//! The result rewriter: suppression, anchored splicing, substitution, and
//! the final explosion of sections into elements.
//!
//! Order matters: suppressed sections disappear first, splices are woven in
//! second, substitutions replace destination content third, and only then do
//! sections explode into their elements. A conflicted result whose two sides
//! explode to the same element sequence collapses to a clean merge — the
//! propagated changes resolved the conflict late.

use std::collections::{BTreeMap, BTreeSet};

use crate::merge::result::MergeResult;
use crate::model::element::Element;
use crate::model::section::Section;
use crate::motion::anchors::{apply_splices, AnchorRole};

// ---------------------------------------------------------------------------
// rewrite_result
// ---------------------------------------------------------------------------

/// Rewrite one path's first-pass merge into its final element sequences.
pub(crate) fn rewrite_result<E: Element>(
    first_pass: &MergeResult<Section>,
    suppressions: &BTreeSet<Section>,
    splices: &BTreeMap<(Section, AnchorRole), Vec<Section>>,
    substitutions: &BTreeMap<Section, Vec<E>>,
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> MergeResult<E> {
    let rewritten = first_pass.map_sequences(|sections| {
        let surviving: Vec<Section> = sections
            .iter()
            .filter(|&section| !suppressions.contains(section))
            .copied()
            .collect();
        let spliced = apply_splices(&surviving, splices);
        explode(&spliced, substitutions, content_of)
    });

    match rewritten {
        MergeResult::MergedWithConflicts { left, right } if left == right => {
            // Late conflict resolution by propagated changes.
            MergeResult::FullyMerged(left)
        }
        other => other,
    }
}

/// Flatten sections to elements, applying substitutions.
///
/// An empty substitution is a propagated deletion; a substitution equal to
/// the destination's own content is a no-op by construction, since it simply
/// reproduces what the explosion would have emitted.
fn explode<E: Element>(
    sections: &[Section],
    substitutions: &BTreeMap<Section, Vec<E>>,
    content_of: &dyn Fn(&Section) -> Vec<E>,
) -> Vec<E> {
    sections
        .iter()
        .flat_map(|section| match substitutions.get(section) {
            Some(replacement) => replacement.clone(),
            None => content_of(section),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::section::{PathId, Side};

    fn sec(side: Side, start: usize, length: usize) -> Section {
        Section::new(side, PathId(0), start, length)
    }

    /// Fake content: each position maps to `position + 10`.
    fn content_of(section: &Section) -> Vec<i32> {
        (section.start..section.end()).map(|i| i as i32 + 10).collect()
    }

    #[test]
    fn plain_explosion_concatenates_content() {
        let result = MergeResult::FullyMerged(vec![sec(Side::Left, 0, 2), sec(Side::Left, 2, 1)]);
        let rewritten = rewrite_result(
            &result,
            &BTreeSet::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![10, 11, 12]));
    }

    #[test]
    fn suppressed_sections_vanish() {
        let kept = sec(Side::Left, 0, 1);
        let gone = sec(Side::Left, 1, 1);
        let result = MergeResult::FullyMerged(vec![kept, gone]);
        let rewritten = rewrite_result(
            &result,
            &[gone].into(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![10]));
    }

    #[test]
    fn substitution_replaces_destination_content() {
        let destination = sec(Side::Right, 0, 2);
        let result = MergeResult::FullyMerged(vec![destination]);
        let substitutions: BTreeMap<_, _> = [(destination, vec![99, 98])].into();
        let rewritten = rewrite_result(
            &result,
            &BTreeSet::new(),
            &BTreeMap::new(),
            &substitutions,
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![99, 98]));
    }

    #[test]
    fn empty_substitution_is_a_propagated_deletion() {
        let destination = sec(Side::Right, 0, 2);
        let result = MergeResult::FullyMerged(vec![destination]);
        let substitutions: BTreeMap<_, _> = [(destination, Vec::<i32>::new())].into();
        let rewritten = rewrite_result(
            &result,
            &BTreeSet::new(),
            &BTreeMap::new(),
            &substitutions,
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![]));
    }

    #[test]
    fn splices_are_woven_in_before_explosion() {
        let anchor = sec(Side::Right, 0, 1);
        let rider = sec(Side::Left, 5, 1);
        let result = MergeResult::FullyMerged(vec![anchor]);
        let splices: BTreeMap<_, _> = [((anchor, AnchorRole::Predecessor), vec![rider])].into();
        let rewritten = rewrite_result(
            &result,
            &BTreeSet::new(),
            &splices,
            &BTreeMap::new(),
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![10, 15]));
    }

    #[test]
    fn equal_conflict_sides_collapse_after_rewriting() {
        let left_only = sec(Side::Left, 3, 1);
        let right_only = sec(Side::Right, 7, 1);
        let result = MergeResult::MergedWithConflicts {
            left: vec![left_only],
            right: vec![right_only],
        };
        // Suppress both sides' content: the exploded sides agree (empty).
        let rewritten = rewrite_result(
            &result,
            &[left_only, right_only].into(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &content_of,
        );
        assert_eq!(rewritten, MergeResult::FullyMerged(vec![]));
    }

    #[test]
    fn unequal_conflict_sides_stay_conflicted() {
        let result = MergeResult::MergedWithConflicts {
            left: vec![sec(Side::Left, 0, 1)],
            right: vec![sec(Side::Right, 4, 1)],
        };
        let rewritten = rewrite_result(
            &result,
            &BTreeSet::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &content_of,
        );
        assert_eq!(
            rewritten,
            MergeResult::MergedWithConflicts {
                left: vec![10],
                right: vec![14],
            },
        );
    }
}
