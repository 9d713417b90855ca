//! Kinetic merge: a three-way merge of source trees that tracks code motion.
//!
//! Content that moved, split, duplicated or changed paths between a common
//! base and two divergent sides is discovered by multi-resolution fingerprint
//! matching, merged along a three-way longest-common-subsequence backbone,
//! and post-processed so that edits, deletions and anchored insertions follow
//! the content to wherever it went.
//!
//! The crate is a pure library: no I/O, no VCS plumbing, no tokenization.
//! The embedding tool supplies per-path element sequences (tokens,
//! characters, anything implementing [`Element`]) and receives per-path
//! [`MergeResult`]s plus a [`MoveDestinationsReport`].
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//! use kinetic_merge::{CodeMotionAnalysis, MatchingConfig, MergeResult, NoProgress};
//!
//! let file = |content: &[i32]| {
//!     BTreeMap::from([(PathBuf::from("a"), content.to_vec())])
//! };
//! let analysis = CodeMotionAnalysis::of(
//!     file(&[1, 2, 3, 4, 5, 6]),
//!     file(&[0, 1, 2, 3, 4, 5, 6]),
//!     file(&[1, 2, 3, 4, 5, 6, 7]),
//!     &MatchingConfig::default(),
//!     &mut NoProgress,
//! );
//! let (results, _report) = analysis.merge(&mut NoProgress).expect("unambiguous");
//! assert_eq!(
//!     results[&PathBuf::from("a")],
//!     MergeResult::FullyMerged(vec![0, 1, 2, 3, 4, 5, 6, 7]),
//! );
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod lcs;
pub mod matching;
pub mod merge;
pub mod model;
pub(crate) mod motion;
pub mod progress;
pub(crate) mod rewrite;

pub use analysis::CodeMotionAnalysis;
pub use config::MatchingConfig;
pub use error::AdmissibleFailure;
pub use merge::MergeResult;
pub use model::element::Element;
pub use model::matches::{Match, MatchedSections};
pub use model::report::{ContentMigration, MoveDestinations, MoveDestinationsReport};
pub use model::section::{PathId, PathInterner, Section, Side};
pub use model::sources::Sources;
pub use progress::{NoProgress, ProgressRecorder};
