//! The three-way merge algebra: alignment-driven move emission and the fold
//! into clean or conflicted results.
//!
//! The walk itself is generic over the element type — the analysis drives it
//! with sections, the unit tests with plain integers. One move sequence feeds
//! two folds: [`result::fold_moves`] builds the merged output, and the motion
//! observer (in [`crate::motion`]) extracts speculative migrations and move
//! destinations from the very same moves.

pub(crate) mod algebra;
pub mod moves;
pub mod result;

pub use moves::MergeMove;
pub use result::MergeResult;

use crate::lcs;

/// Align three streams and walk them into canonical moves.
pub(crate) fn moves_for<T: Copy>(
    base: &[T],
    left: &[T],
    right: &[T],
    eq: impl Fn(&T, &T) -> bool,
    size: impl Fn(&T) -> usize,
) -> Vec<MergeMove<T>> {
    let alignment = lcs::align(base, left, right, eq, size);
    algebra::merge_moves(base, left, right, &alignment)
}
