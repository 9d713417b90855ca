//! The code-motion analysis: discovery, first-pass merging, motion
//! evaluation, anchored migration, and rewriting, over three per-path inputs.
//!
//! The pipeline per [`CodeMotionAnalysis::merge`]:
//!
//! 1. Section every side's files around the matched sections; the base's gap
//!    contents are offered as candidate chunks when sectioning left and
//!    right, so sub-threshold runs can still align.
//! 2. Align and walk each path's three section streams into canonical merge
//!    moves, folding motion observations out of the same walks.
//! 3. Evaluate the observations into the move report, substitutions,
//!    migrated-edit suppressions and anchored moves.
//! 4. Compute anchored splices and their suppressions.
//! 5. Rewrite each path's first-pass result and explode it to elements.
//!
//! Nothing is mutated after construction; `merge` can be called repeatedly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::config::MatchingConfig;
use crate::error::AdmissibleFailure;
use crate::matching::discover_matches;
use crate::merge::result::fold_moves;
use crate::merge::{moves_for, MergeMove, MergeResult};
use crate::model::element::Element;
use crate::model::matches::{Match, MatchedSections};
use crate::model::report::MoveDestinationsReport;
use crate::model::section::{PathId, PathInterner, Section, Side};
use crate::model::sources::Sources;
use crate::motion::anchors::{compute_anchored_splices, SidedFiles};
use crate::motion::evaluator::evaluate;
use crate::motion::MotionObservations;
use crate::progress::{NoProgress, ProgressRecorder};
use crate::rewrite::rewrite_result;

// ---------------------------------------------------------------------------
// CodeMotionAnalysis
// ---------------------------------------------------------------------------

/// The stabilized analysis of three sides.
#[derive(Clone, Debug)]
pub struct CodeMotionAnalysis<E> {
    base: Sources<E>,
    left: Sources<E>,
    right: Sources<E>,
    interner: PathInterner,
    matched: MatchedSections,
}

impl<E: Element> CodeMotionAnalysis<E> {
    /// Run match discovery over the three inputs.
    pub fn of(
        base: BTreeMap<PathBuf, Vec<E>>,
        left: BTreeMap<PathBuf, Vec<E>>,
        right: BTreeMap<PathBuf, Vec<E>>,
        config: &MatchingConfig,
        progress: &mut dyn ProgressRecorder,
    ) -> Self {
        let mut interner = PathInterner::new();
        let base = Sources::new(Side::Base, &mut interner, base);
        let left = Sources::new(Side::Left, &mut interner, left);
        let right = Sources::new(Side::Right, &mut interner, right);
        let matched = discover_matches(&base, &left, &right, config, progress);
        Self {
            base,
            left,
            right,
            interner,
            matched,
        }
    }

    /// Build an analysis with an explicitly given match set instead of
    /// discovery. The closure receives the interner and the three sides so
    /// it can construct validated sections by path.
    pub fn with_matches(
        base: BTreeMap<PathBuf, Vec<E>>,
        left: BTreeMap<PathBuf, Vec<E>>,
        right: BTreeMap<PathBuf, Vec<E>>,
        matches: impl FnOnce(&PathInterner, &Sources<E>, &Sources<E>, &Sources<E>) -> Vec<Match>,
    ) -> Self {
        let mut interner = PathInterner::new();
        let base = Sources::new(Side::Base, &mut interner, base);
        let left = Sources::new(Side::Left, &mut interner, left);
        let right = Sources::new(Side::Right, &mut interner, right);
        let mut matched = MatchedSections::new();
        for m in matches(&interner, &base, &left, &right) {
            matched.add(m);
        }
        Self {
            base,
            left,
            right,
            interner,
            matched,
        }
    }

    #[must_use]
    pub const fn base(&self) -> &Sources<E> {
        &self.base
    }

    #[must_use]
    pub const fn left(&self) -> &Sources<E> {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &Sources<E> {
        &self.right
    }

    #[must_use]
    pub const fn paths(&self) -> &PathInterner {
        &self.interner
    }

    /// The matches a section participates in.
    #[must_use]
    pub fn matches_for(&self, section: &Section) -> &BTreeSet<Match> {
        self.matched.matches_for(section)
    }

    fn sources_on(&self, side: Side) -> &Sources<E> {
        match side {
            Side::Base => &self.base,
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// The elements behind any side's section.
    #[must_use]
    pub fn content_of(&self, section: &Section) -> &[E] {
        self.sources_on(section.side).contents_of(section)
    }

    /// Merge equivalence: a shared match, or unmatched sections with
    /// element-wise equal content.
    fn sections_equivalent(&self, a: &Section, b: &Section) -> bool {
        if self.matched.share_a_match(a, b) {
            return true;
        }
        !self.matched.is_matched(a)
            && !self.matched.is_matched(b)
            && self.content_of(a) == self.content_of(b)
    }

    fn width_of(&self, section: &Section) -> usize {
        self.sources_on(section.side).width_of(section)
    }

    /// Merge all paths, producing per-path results and the move report.
    ///
    /// # Errors
    ///
    /// [`AdmissibleFailure`] when ambiguous matching produces undecidable
    /// propagations; the message advises raising the minimum ambiguous match
    /// size.
    pub fn merge(
        &self,
        progress: &mut dyn ProgressRecorder,
    ) -> Result<(BTreeMap<PathBuf, MergeResult<E>>, MoveDestinationsReport), AdmissibleFailure>
    {
        // Sectioning. Base gap contents become candidate chunks for the
        // other two sides.
        let mandatory: BTreeSet<Section> = self.matched.sections().copied().collect();
        let base_files = self.base.files_by_path_utilising(&mandatory, None);
        let gap_chunks: BTreeMap<PathId, Vec<Vec<E>>> = base_files
            .iter()
            .map(|(path, file)| {
                let chunks: Vec<Vec<E>> = file
                    .sections()
                    .iter()
                    .filter(|&s| !self.matched.is_matched(s) && !s.is_empty())
                    .map(|s| self.base.contents_of(s).to_vec())
                    .collect();
                (*path, chunks)
            })
            .filter(|(_, chunks)| !chunks.is_empty())
            .collect();
        let left_files = self
            .left
            .files_by_path_utilising(&mandatory, Some(&gap_chunks));
        let right_files = self
            .right
            .files_by_path_utilising(&mandatory, Some(&gap_chunks));

        // First-pass merges, one per path, observing motion as we go.
        let all_paths: BTreeSet<PathId> = base_files
            .keys()
            .chain(left_files.keys())
            .chain(right_files.keys())
            .copied()
            .collect();
        let eq = |a: &Section, b: &Section| self.sections_equivalent(a, b);
        let size = |s: &Section| self.width_of(s);

        progress.new_session("merging paths", all_paths.len());
        let mut observations = MotionObservations::new();
        let mut moves_by_path: BTreeMap<PathId, Vec<MergeMove<Section>>> = BTreeMap::new();
        for (index, path) in all_paths.iter().enumerate() {
            let sections_of = |files: &BTreeMap<PathId, crate::model::file::File>| {
                files.get(path).map_or(Vec::new(), |f| f.sections().to_vec())
            };
            let moves = moves_for(
                &sections_of(&base_files),
                &sections_of(&left_files),
                &sections_of(&right_files),
                eq,
                size,
            );
            observations.observe(&moves, &self.matched);
            moves_by_path.insert(*path, moves);
            progress.up_to(index + 1);
        }
        progress.close();

        // Motion evaluation and anchored migration.
        let content_vec = |s: &Section| self.content_of(s).to_vec();
        let evaluated = evaluate::<E>(&self.matched, &observations, &content_vec)?;
        tracing::debug!(
            moves = evaluated.report.moves.len(),
            substitutions = evaluated.substitutions_by_destination.len(),
            anchored = evaluated.anchored_moves.len(),
            "evaluated motion",
        );

        let files = SidedFiles {
            base: &base_files,
            left: &left_files,
            right: &right_files,
        };
        let anchored = compute_anchored_splices::<E>(
            &evaluated.anchored_moves,
            &files,
            &self.matched,
            &evaluated.migrated_edit_suppressions,
            &eq,
            &size,
            &content_vec,
        )?;

        // Rewrite and explode.
        let mut suppressions = evaluated.migrated_edit_suppressions.clone();
        suppressions.extend(anchored.suppressions.iter().copied());
        let mut results = BTreeMap::new();
        for (path, moves) in &moves_by_path {
            let first_pass = fold_moves(moves, &|_| false);
            let rewritten = rewrite_result(
                &first_pass,
                &suppressions,
                &anchored.splices,
                &evaluated.substitutions_by_destination,
                &content_vec,
            );
            results.insert(self.interner.resolve(*path).to_owned(), rewritten);
        }
        Ok((results, evaluated.report))
    }

    /// Merge with no progress reporting.
    ///
    /// # Errors
    ///
    /// As for [`CodeMotionAnalysis::merge`].
    pub fn merge_quietly(
        &self,
    ) -> Result<(BTreeMap<PathBuf, MergeResult<E>>, MoveDestinationsReport), AdmissibleFailure>
    {
        self.merge(&mut NoProgress)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
