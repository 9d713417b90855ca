//! The recoverable error surface of the merge core.
//!
//! There is exactly one recoverable condition: an *admissible failure*, where
//! ambiguous matching makes a propagation undecidable. Its message tells the
//! user what to do — raise `minimum_ambiguous_match_size` above the offending
//! section size. Everything else that can go wrong in the core is a logic
//! invariant violation and panics.

use std::fmt;

// ---------------------------------------------------------------------------
// AdmissibleFailure
// ---------------------------------------------------------------------------

/// An ambiguity the configuration allowed but the analysis cannot resolve.
///
/// Raised at the first point of detection, naming the candidates and the
/// section size so the user can re-run with `minimum_ambiguous_match_size`
/// set above it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissibleFailure {
    message: String,
}

impl AdmissibleFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// An ambiguous propagation onto one destination.
    #[must_use]
    pub fn ambiguous_propagation(
        what: &str,
        destination: impl fmt::Display,
        section_size: usize,
        candidate_count: usize,
    ) -> Self {
        Self::new(format!(
            "{candidate_count} distinct {what} target the destination {destination} \
             (section size {section_size}); raise the minimum ambiguous match size \
             above {section_size} to suppress the ambiguous matches",
        ))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AdmissibleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AdmissibleFailure {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
