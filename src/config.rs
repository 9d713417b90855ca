//! Match-discovery configuration.

use std::fmt;

// ---------------------------------------------------------------------------
// MatchingConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for match discovery.
///
/// The three thresholds interact deliberately: small windows admit only
/// unambiguous matches (to keep the search from exploding), while windows at
/// or above `minimum_ambiguous_match_size` embrace ambiguity, since a large
/// ambiguous match is something a user can act on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchingConfig {
    /// Absolute floor on the match window size, in elements.
    pub minimum_match_size: usize,
    /// Per-file fractional floor: a section of length `L` in a file of size
    /// `F` is eligible only when `L ≥ ⌊fraction × F⌋` (and the absolute
    /// floor). Must lie in `[0, 1]`.
    pub threshold_size_fraction_for_matching: f64,
    /// Window size at and above which *all* ambiguous matches for a
    /// fingerprint are retained; below it only unique ones are kept.
    pub minimum_ambiguous_match_size: usize,
}

impl MatchingConfig {
    /// Validated constructor.
    pub fn new(
        minimum_match_size: usize,
        threshold_size_fraction_for_matching: f64,
        minimum_ambiguous_match_size: usize,
    ) -> Result<Self, InvalidConfig> {
        if !(0.0..=1.0).contains(&threshold_size_fraction_for_matching) {
            return Err(InvalidConfig {
                fraction: threshold_size_fraction_for_matching,
            });
        }
        Ok(Self {
            minimum_match_size,
            threshold_size_fraction_for_matching,
            minimum_ambiguous_match_size,
        })
    }

    /// The eligibility floor for a file of `file_size` elements.
    ///
    /// A configured floor of zero still means windows of at least one
    /// element; there is nothing to fingerprint below that.
    #[must_use]
    pub fn window_size_floor_for(&self, file_size: usize) -> usize {
        let fractional = (self.threshold_size_fraction_for_matching * file_size as f64) as usize;
        self.minimum_match_size.max(fractional).max(1)
    }
}

impl Default for MatchingConfig {
    /// Permissive defaults: match anything of at least four elements, keep
    /// every ambiguous match of at least ten.
    fn default() -> Self {
        Self {
            minimum_match_size: 4,
            threshold_size_fraction_for_matching: 0.0,
            minimum_ambiguous_match_size: 10,
        }
    }
}

/// A threshold fraction outside `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvalidConfig {
    pub fraction: f64,
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "threshold size fraction {} lies outside [0, 1]",
            self.fraction,
        )
    }
}

impl std::error::Error for InvalidConfig {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_validated() {
        assert!(MatchingConfig::new(1, 0.5, 10).is_ok());
        assert!(MatchingConfig::new(1, -0.1, 10).is_err());
        assert!(MatchingConfig::new(1, 1.1, 10).is_err());
    }

    #[test]
    fn floor_combines_absolute_and_fractional_thresholds() {
        let config = MatchingConfig::new(4, 0.1, 10).unwrap();
        assert_eq!(config.window_size_floor_for(10), 4, "absolute floor wins");
        assert_eq!(config.window_size_floor_for(100), 10, "fraction wins");
    }

    #[test]
    fn floor_is_never_zero() {
        let config = MatchingConfig::new(0, 0.0, 0).unwrap();
        assert_eq!(config.window_size_floor_for(0), 1);
        assert_eq!(config.window_size_floor_for(50), 1);
    }

    #[test]
    fn fraction_truncates() {
        let config = MatchingConfig::new(0, 0.5, 10).unwrap();
        assert_eq!(config.window_size_floor_for(7), 3);
    }

    #[test]
    fn invalid_config_display_names_the_fraction() {
        let err = MatchingConfig::new(1, 2.0, 10).unwrap_err();
        assert!(err.to_string().contains('2'));
    }
}
