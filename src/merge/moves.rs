//! The canonical moves of the three-way merge algebra.
//!
//! Each move records exactly which input elements it consumed, so one walk
//! over the tagged streams can be folded twice: once into the merged result,
//! once into the motion observations.

use std::fmt;

// ---------------------------------------------------------------------------
// MergeMove
// ---------------------------------------------------------------------------

/// One step of the merge walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeMove<T> {
    /// The element survives on all three sides.
    Preservation { base: T, left: T, right: T },
    /// Both sides replaced the base element with the same new content.
    CoincidentEdit { base: T, left: T, right: T },
    /// The same content inserted on both sides.
    CoincidentInsertion { left: T, right: T },
    /// Left replaced the base element; right kept it.
    LeftEdit { base: T, right: T, replacements: Vec<T> },
    /// Right replaced the base element; left kept it.
    RightEdit { base: T, left: T, replacements: Vec<T> },
    /// Left deleted the base element; right kept it.
    LeftDeletion { base: T, right: T },
    /// Right deleted the base element; left kept it.
    RightDeletion { base: T, left: T },
    /// Both sides deleted the base element.
    CoincidentDeletion { base: T },
    /// Content added on the left only.
    LeftInsertion { left: T },
    /// Content added on the right only.
    RightInsertion { right: T },
    /// Both sides changed the same content differently. An empty `base` run
    /// is an insertion-vs-insertion conflict.
    EditConflict {
        base: Vec<T>,
        left: Vec<T>,
        right: Vec<T>,
    },
    /// Left edited what right deleted.
    LeftEditVsRightDeletionConflict { base: T, left: Vec<T> },
    /// Right edited what left deleted.
    RightEditVsLeftDeletionConflict { base: T, right: Vec<T> },
}

impl<T> MergeMove<T> {
    /// Whether this move leaves the result conflicted.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EditConflict { .. }
                | Self::LeftEditVsRightDeletionConflict { .. }
                | Self::RightEditVsLeftDeletionConflict { .. }
        )
    }
}

impl<T> fmt::Display for MergeMove<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preservation { .. } => "preservation",
            Self::CoincidentEdit { .. } => "coincident edit",
            Self::CoincidentInsertion { .. } => "coincident insertion",
            Self::LeftEdit { .. } => "left edit",
            Self::RightEdit { .. } => "right edit",
            Self::LeftDeletion { .. } => "left deletion",
            Self::RightDeletion { .. } => "right deletion",
            Self::CoincidentDeletion { .. } => "coincident deletion",
            Self::LeftInsertion { .. } => "left insertion",
            Self::RightInsertion { .. } => "right insertion",
            Self::EditConflict { .. } => "edit conflict",
            Self::LeftEditVsRightDeletionConflict { .. } => "left edit vs right deletion",
            Self::RightEditVsLeftDeletionConflict { .. } => "right edit vs left deletion",
        };
        write!(f, "{name}")
    }
}
