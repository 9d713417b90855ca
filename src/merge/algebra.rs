//! The tag-walk state machine of the three-way merge.
//!
//! Walks the three contribution-tagged streams left to right, emitting one
//! canonical [`MergeMove`] per step. Two heuristics shape the walk:
//!
//! - **Eager edit**: whenever the heads are ambiguous between
//!   "insertion plus deletion" and "edit", the walk chooses edit. An open
//!   edit keeps absorbing same-side differences until an insertion pending on
//!   the opposite side would be marooned between the edit's base and its
//!   replacement; the edit then closes, the insertion is emitted where it
//!   anchors, and the remaining same-side differences continue as insertions.
//! - **Marooned-edit lookahead**: a base difference followed by a base
//!   element paired with the non-differing side resolves to a coincident
//!   deletion first, so the pending edit on the differing side can pair with
//!   the element it actually edits. The scan is one base element deep.
//!
//! The walk is deterministic given the tags; the left side wins every
//! symmetric tie.

use crate::lcs::{Alignment, Contribution};
use crate::merge::moves::MergeMove;

/// Which side's closed edit is still being continued by trailing
/// differences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditContinuation {
    None,
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// merge_moves
// ---------------------------------------------------------------------------

/// Walk the tagged streams and emit the canonical move sequence.
///
/// # Panics
///
/// Panics when the tags are not a consistent alignment of the inputs — a
/// logic invariant; [`crate::lcs::align`] never produces such tags.
pub(crate) fn merge_moves<T: Copy>(
    base: &[T],
    left: &[T],
    right: &[T],
    alignment: &Alignment,
) -> Vec<MergeMove<T>> {
    assert_eq!(base.len(), alignment.base.len(), "base tags must align");
    assert_eq!(left.len(), alignment.left.len(), "left tags must align");
    assert_eq!(right.len(), alignment.right.len(), "right tags must align");

    let mut walker = Walker {
        base,
        left,
        right,
        base_tags: &alignment.base,
        left_tags: &alignment.left,
        right_tags: &alignment.right,
        ib: 0,
        il: 0,
        ir: 0,
        continuation: EditContinuation::None,
        moves: Vec::new(),
    };
    walker.run();
    walker.moves
}

struct Walker<'a, T: Copy> {
    base: &'a [T],
    left: &'a [T],
    right: &'a [T],
    base_tags: &'a [Contribution],
    left_tags: &'a [Contribution],
    right_tags: &'a [Contribution],
    ib: usize,
    il: usize,
    ir: usize,
    continuation: EditContinuation,
    moves: Vec<MergeMove<T>>,
}

impl<T: Copy> Walker<'_, T> {
    fn base_head(&self) -> Option<Contribution> {
        self.base_tags.get(self.ib).copied()
    }

    fn left_head(&self) -> Option<Contribution> {
        self.left_tags.get(self.il).copied()
    }

    fn right_head(&self) -> Option<Contribution> {
        self.right_tags.get(self.ir).copied()
    }

    /// Consume the maximal run of `Difference` tags on the left.
    fn take_left_differences(&mut self) -> Vec<T> {
        let mut run = Vec::new();
        while self.left_head() == Some(Contribution::Difference) {
            run.push(self.left[self.il]);
            self.il += 1;
        }
        run
    }

    fn take_right_differences(&mut self) -> Vec<T> {
        let mut run = Vec::new();
        while self.right_head() == Some(Contribution::Difference) {
            run.push(self.right[self.ir]);
            self.ir += 1;
        }
        run
    }

    fn run(&mut self) {
        use Contribution::{
            Common, CommonBaseLeft, CommonBaseRight, CommonLeftRight, Difference,
        };
        loop {
            match (self.base_head(), self.left_head(), self.right_head()) {
                (None, None, None) => break,

                // Coincident content at both heads.
                (b, Some(CommonLeftRight), Some(CommonLeftRight)) => {
                    self.continuation = EditContinuation::None;
                    let left = self.left[self.il];
                    let right = self.right[self.ir];
                    self.il += 1;
                    self.ir += 1;
                    if b == Some(Difference) {
                        let base = self.base[self.ib];
                        self.ib += 1;
                        self.moves
                            .push(MergeMove::CoincidentEdit { base, left, right });
                    } else {
                        self.moves.push(MergeMove::CoincidentInsertion { left, right });
                    }
                }

                (Some(Common), Some(Common), Some(Common)) => {
                    self.continuation = EditContinuation::None;
                    let m = MergeMove::Preservation {
                        base: self.base[self.ib],
                        left: self.left[self.il],
                        right: self.right[self.ir],
                    };
                    self.ib += 1;
                    self.il += 1;
                    self.ir += 1;
                    self.moves.push(m);
                }

                // Base and left agree; right either edited or deleted.
                (Some(CommonBaseLeft), Some(CommonBaseLeft), r) => {
                    let base = self.base[self.ib];
                    let left = self.left[self.il];
                    self.ib += 1;
                    self.il += 1;
                    if r == Some(Difference) {
                        self.right_edit(base, left);
                    } else {
                        self.continuation = EditContinuation::None;
                        self.moves.push(MergeMove::RightDeletion { base, left });
                    }
                }

                // Base and right agree; left either edited or deleted.
                (Some(CommonBaseRight), l, Some(CommonBaseRight)) => {
                    let base = self.base[self.ib];
                    let right = self.right[self.ir];
                    self.ib += 1;
                    self.ir += 1;
                    if l == Some(Difference) {
                        self.left_edit(base, right);
                    } else {
                        self.continuation = EditContinuation::None;
                        self.moves.push(MergeMove::LeftDeletion { base, right });
                    }
                }

                // The base element exists nowhere else.
                (Some(Difference), l, r) => {
                    self.continuation = EditContinuation::None;
                    self.base_difference(l == Some(Difference), r == Some(Difference));
                }

                // Simultaneous insertions; an edit continuation resolves the
                // ambiguity, otherwise the sides genuinely collide.
                (_, Some(Difference), Some(Difference)) => match self.continuation {
                    EditContinuation::Right => {
                        let left = self.left[self.il];
                        self.il += 1;
                        self.moves.push(MergeMove::LeftInsertion { left });
                    }
                    EditContinuation::Left => {
                        let right = self.right[self.ir];
                        self.ir += 1;
                        self.moves.push(MergeMove::RightInsertion { right });
                    }
                    EditContinuation::None => {
                        let left = self.take_left_differences();
                        let right = self.take_right_differences();
                        self.moves.push(MergeMove::EditConflict {
                            base: Vec::new(),
                            left,
                            right,
                        });
                    }
                },

                (_, Some(Difference), _) => {
                    let left = self.left[self.il];
                    self.il += 1;
                    self.moves.push(MergeMove::LeftInsertion { left });
                }

                (_, _, Some(Difference)) => {
                    let right = self.right[self.ir];
                    self.ir += 1;
                    self.moves.push(MergeMove::RightInsertion { right });
                }

                (b, l, r) => unreachable!(
                    "inconsistent contribution tags at heads {b:?}/{l:?}/{r:?}",
                ),
            }
        }
    }

    /// An open right edit: absorb right differences until a pending left
    /// insertion would be marooned; the leftovers continue as insertions.
    fn right_edit(&mut self, base: T, left: T) {
        use Contribution::Difference;
        let mut replacements = vec![self.right[self.ir]];
        self.ir += 1;
        self.continuation = EditContinuation::None;
        while self.right_head() == Some(Difference) {
            if self.left_head() == Some(Difference) {
                self.continuation = EditContinuation::Right;
                break;
            }
            replacements.push(self.right[self.ir]);
            self.ir += 1;
        }
        self.moves.push(MergeMove::RightEdit {
            base,
            left,
            replacements,
        });
    }

    fn left_edit(&mut self, base: T, right: T) {
        use Contribution::Difference;
        let mut replacements = vec![self.left[self.il]];
        self.il += 1;
        self.continuation = EditContinuation::None;
        while self.left_head() == Some(Difference) {
            if self.right_head() == Some(Difference) {
                self.continuation = EditContinuation::Left;
                break;
            }
            replacements.push(self.left[self.il]);
            self.il += 1;
        }
        self.moves.push(MergeMove::LeftEdit {
            base,
            right,
            replacements,
        });
    }

    /// Dispositions for a base `Difference` head.
    fn base_difference(&mut self, left_differs: bool, right_differs: bool) {
        use Contribution::{CommonBaseLeft, CommonBaseRight};
        let base = self.base[self.ib];
        match (left_differs, right_differs) {
            (true, true) => {
                self.ib += 1;
                let left = self.take_left_differences();
                let right = self.take_right_differences();
                self.moves.push(MergeMove::EditConflict {
                    base: vec![base],
                    left,
                    right,
                });
            }
            (true, false) => {
                // Lookahead: if the next base element pairs with the right
                // side, the left difference is an edit of *that* element and
                // this one was deleted on both sides.
                if self.base_tags.get(self.ib + 1) == Some(&CommonBaseRight)
                    && self.right_head() == Some(CommonBaseRight)
                {
                    self.ib += 1;
                    self.moves.push(MergeMove::CoincidentDeletion { base });
                } else {
                    self.ib += 1;
                    let left = self.take_left_differences();
                    self.moves
                        .push(MergeMove::LeftEditVsRightDeletionConflict { base, left });
                }
            }
            (false, true) => {
                if self.base_tags.get(self.ib + 1) == Some(&CommonBaseLeft)
                    && self.left_head() == Some(CommonBaseLeft)
                {
                    self.ib += 1;
                    self.moves.push(MergeMove::CoincidentDeletion { base });
                } else {
                    self.ib += 1;
                    let right = self.take_right_differences();
                    self.moves
                        .push(MergeMove::RightEditVsLeftDeletionConflict { base, right });
                }
            }
            (false, false) => {
                self.ib += 1;
                self.moves.push(MergeMove::CoincidentDeletion { base });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
