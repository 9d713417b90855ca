//! Merge results and the fold from canonical moves into one.
//!
//! A result is clean until the first conflict move arrives; from then on the
//! left and right sequences are kept separately, with clean moves appending
//! to both. Resolution of preserved and coincident content always takes the
//! **left** element, breaking the symmetry the same way the alignment's
//! tie-breaking does.

use crate::merge::moves::MergeMove;

// ---------------------------------------------------------------------------
// MergeResult
// ---------------------------------------------------------------------------

/// Outcome of merging one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeResult<T> {
    /// A clean merge.
    FullyMerged(Vec<T>),
    /// A conflicted merge: both sides in full, for conflict markers.
    MergedWithConflicts { left: Vec<T>, right: Vec<T> },
}

impl<T> MergeResult<T> {
    #[must_use]
    pub const fn is_fully_merged(&self) -> bool {
        matches!(self, Self::FullyMerged(_))
    }

    /// The merged sequence of a clean result.
    #[must_use]
    pub fn fully_merged(&self) -> Option<&[T]> {
        match self {
            Self::FullyMerged(elements) => Some(elements),
            Self::MergedWithConflicts { .. } => None,
        }
    }

    /// Map both payloads through `f`, preserving the conflict structure.
    pub fn map_sequences<U>(&self, mut f: impl FnMut(&[T]) -> Vec<U>) -> MergeResult<U> {
        match self {
            Self::FullyMerged(elements) => MergeResult::FullyMerged(f(elements)),
            Self::MergedWithConflicts { left, right } => MergeResult::MergedWithConflicts {
                left: f(left),
                right: f(right),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Folding moves into a result
// ---------------------------------------------------------------------------

/// Accumulator for the fold.
enum Accumulated<T> {
    Clean(Vec<T>),
    Conflicted { left: Vec<T>, right: Vec<T> },
}

impl<T: Copy> Accumulated<T> {
    fn append(&mut self, element: T) {
        match self {
            Self::Clean(elements) => elements.push(element),
            Self::Conflicted { left, right } => {
                left.push(element);
                right.push(element);
            }
        }
    }

    fn extend(&mut self, elements: &[T]) {
        for &element in elements {
            self.append(element);
        }
    }

    /// Transition to (or stay in) the conflicted state, appending each side's
    /// contribution to its own sequence only.
    fn conflict(&mut self, left_part: &[T], right_part: &[T]) {
        if let Self::Clean(elements) = self {
            let shared = std::mem::take(elements);
            *self = Self::Conflicted {
                left: shared.clone(),
                right: shared,
            };
        }
        let Self::Conflicted { left, right } = self else {
            unreachable!("just transitioned to conflicted");
        };
        left.extend_from_slice(left_part);
        right.extend_from_slice(right_part);
    }
}

/// Fold a move sequence into a result.
///
/// `suppressed` filters out elements that must not contribute content to any
/// output — migrated edits whose content rides to a move destination instead.
pub(crate) fn fold_moves<T: Copy>(
    moves: &[MergeMove<T>],
    suppressed: &dyn Fn(&T) -> bool,
) -> MergeResult<T> {
    let keep = |elements: &[T]| -> Vec<T> {
        elements
            .iter()
            .copied()
            .filter(|element| !suppressed(element))
            .collect()
    };

    let mut accumulated = Accumulated::Clean(Vec::new());
    for m in moves {
        match m {
            MergeMove::Preservation { left, .. }
            | MergeMove::CoincidentEdit { left, .. }
            | MergeMove::CoincidentInsertion { left, .. } => {
                if !suppressed(left) {
                    accumulated.append(*left);
                }
            }
            MergeMove::LeftEdit { replacements, .. }
            | MergeMove::RightEdit { replacements, .. } => {
                accumulated.extend(&keep(replacements));
            }
            MergeMove::LeftInsertion { left } => {
                if !suppressed(left) {
                    accumulated.append(*left);
                }
            }
            MergeMove::RightInsertion { right } => {
                if !suppressed(right) {
                    accumulated.append(*right);
                }
            }
            MergeMove::LeftDeletion { .. }
            | MergeMove::RightDeletion { .. }
            | MergeMove::CoincidentDeletion { .. } => {}
            MergeMove::EditConflict { left, right, .. } => {
                accumulated.conflict(&keep(left), &keep(right));
            }
            MergeMove::LeftEditVsRightDeletionConflict { left, .. } => {
                accumulated.conflict(&keep(left), &[]);
            }
            MergeMove::RightEditVsLeftDeletionConflict { right, .. } => {
                accumulated.conflict(&[], &keep(right));
            }
        }
    }

    match accumulated {
        Accumulated::Clean(elements) => MergeResult::FullyMerged(elements),
        Accumulated::Conflicted { left, right } => {
            MergeResult::MergedWithConflicts { left, right }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
