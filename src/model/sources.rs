//! One side's input: element sequences keyed by path, and the sectioning
//! operations over them.
//!
//! `Sources` owns the raw content; everything downstream addresses it through
//! [`Section`] values. The interesting operation is
//! [`Sources::files_by_path_utilising`], which turns a set of mandatory
//! (matched) sections into a gap-free [`File`] partition per path, optionally
//! splitting gap filler around a candidate chunk so that sub-threshold runs
//! can still line up during the merge.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::model::element::Element;
use crate::model::file::File;
use crate::model::section::{PathId, PathInterner, Section, Side};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Per-side content store.
#[derive(Clone, Debug)]
pub struct Sources<E> {
    side: Side,
    files: BTreeMap<PathId, Vec<E>>,
}

impl<E: Element> Sources<E> {
    /// Build a side's sources, interning every path into the shared table.
    ///
    /// `contents` is consumed in sorted path order, so interning is
    /// deterministic no matter how the map was assembled.
    #[must_use]
    pub fn new(
        side: Side,
        interner: &mut PathInterner,
        contents: BTreeMap<PathBuf, Vec<E>>,
    ) -> Self {
        let files = contents
            .into_iter()
            .map(|(path, elements)| (interner.intern(&path), elements))
            .collect();
        Self { side, files }
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Paths present on this side, in id order.
    pub fn paths(&self) -> impl Iterator<Item = PathId> + '_ {
        self.files.keys().copied()
    }

    #[must_use]
    pub fn has_path(&self, path: PathId) -> bool {
        self.files.contains_key(&path)
    }

    /// Content of `path`; absent paths read as empty.
    #[must_use]
    pub fn file_contents(&self, path: PathId) -> &[E] {
        self.files.get(&path).map_or(&[], Vec::as_slice)
    }

    /// Element length of `path`; absent paths have size zero.
    #[must_use]
    pub fn file_size(&self, path: PathId) -> usize {
        self.file_contents(path).len()
    }

    /// Construct a section of this side.
    ///
    /// # Panics
    ///
    /// Panics when the range does not lie within the path's content; an
    /// out-of-range section is a logic invariant violation.
    #[must_use]
    pub fn section(&self, path: PathId, start: usize, length: usize) -> Section {
        let size = self.file_size(path);
        assert!(
            start + length <= size,
            "section [{start}..{}) exceeds {} content of length {size}",
            start + length,
            self.side,
        );
        Section::new(self.side, path, start, length)
    }

    /// The path a section of this side addresses.
    ///
    /// # Panics
    ///
    /// Panics when the section belongs to another side.
    #[must_use]
    pub fn path_for(&self, section: &Section) -> PathId {
        assert_eq!(
            section.side, self.side,
            "section {section} does not belong to the {} side",
            self.side,
        );
        section.path
    }

    /// The element slice a section covers.
    ///
    /// # Panics
    ///
    /// Panics when the section belongs to another side or is out of range.
    #[must_use]
    pub fn contents_of(&self, section: &Section) -> &[E] {
        assert_eq!(section.side, self.side, "section {section} is foreign");
        &self.file_contents(section.path)[section.closed_open_interval()]
    }

    /// Total content width of a section (sum of element widths).
    #[must_use]
    pub fn width_of(&self, section: &Section) -> usize {
        self.contents_of(section).iter().map(Element::width).sum()
    }

    /// Trivial sectioning: one filler section per non-empty file.
    #[must_use]
    pub fn files_by_path(&self) -> BTreeMap<PathId, File> {
        self.files_by_path_utilising(&BTreeSet::new(), None)
    }

    /// Section every file so that each mandatory section is kept intact and
    /// the remainder is covered by gap filler.
    ///
    /// When `candidate_gap_chunks` supplies chunks for a path, each gap tries
    /// the chunks in order and splits around the **first occurrence of the
    /// first chunk found** — at most one chunk per gap, never a second
    /// occurrence. This lets a run too small to match still align with a base
    /// gap chunk during the merge.
    ///
    /// Mandatory sections may repeat (ambiguous matches yield identical
    /// duplicates) but must not otherwise overlap.
    #[must_use]
    pub fn files_by_path_utilising(
        &self,
        mandatory_sections: &BTreeSet<Section>,
        candidate_gap_chunks: Option<&BTreeMap<PathId, Vec<Vec<E>>>>,
    ) -> BTreeMap<PathId, File> {
        let mut result = BTreeMap::new();
        for (&path, contents) in &self.files {
            // BTreeSet ordering puts a path's sections in start order, and
            // set identity collapses ambiguous duplicates.
            let mandatory: Vec<Section> = mandatory_sections
                .iter()
                .filter(|s| s.side == self.side && s.path == path)
                .copied()
                .collect();
            let chunks = candidate_gap_chunks
                .and_then(|by_path| by_path.get(&path))
                .map_or(&[][..], Vec::as_slice);

            let mut sections = Vec::with_capacity(mandatory.len() * 2 + 1);
            let mut cursor = 0;
            for section in mandatory {
                assert!(
                    cursor <= section.start,
                    "mandatory sections overlap at {section}",
                );
                if cursor < section.start {
                    self.fill_gap(&mut sections, path, cursor, section.start, chunks);
                }
                sections.push(section);
                cursor = section.end();
            }
            if cursor < contents.len() {
                self.fill_gap(&mut sections, path, cursor, contents.len(), chunks);
            }
            result.insert(path, File::new(sections, contents.len()));
        }
        result
    }

    /// Cover `[start, end)` with filler, splitting around one candidate chunk
    /// when one occurs inside the gap.
    fn fill_gap(
        &self,
        sections: &mut Vec<Section>,
        path: PathId,
        start: usize,
        end: usize,
        chunks: &[Vec<E>],
    ) {
        let gap = &self.file_contents(path)[start..end];
        if let Some((offset, length)) = first_chunk_occurrence(gap, chunks) {
            if offset > 0 {
                sections.push(Section::new(self.side, path, start, offset));
            }
            sections.push(Section::new(self.side, path, start + offset, length));
            let chunk_end = start + offset + length;
            if chunk_end < end {
                sections.push(Section::new(self.side, path, chunk_end, end - chunk_end));
            }
        } else {
            sections.push(Section::new(self.side, path, start, end - start));
        }
    }
}

/// Find the first candidate chunk that occurs in `gap`, returning the offset
/// of its first occurrence and its length. Later chunks and later occurrences
/// are deliberately not tried.
fn first_chunk_occurrence<E: Eq>(gap: &[E], chunks: &[Vec<E>]) -> Option<(usize, usize)> {
    for chunk in chunks {
        if chunk.is_empty() || chunk.len() > gap.len() {
            continue;
        }
        if let Some(offset) = gap.windows(chunk.len()).position(|w| w == chunk.as_slice()) {
            return Some((offset, chunk.len()));
        }
    }
    None
}

/// Convenience for building the content map handed to [`Sources::new`].
#[must_use]
pub fn contents_by_path<E: Element, P: AsRef<Path>>(
    entries: impl IntoIterator<Item = (P, Vec<E>)>,
) -> BTreeMap<PathBuf, Vec<E>> {
    entries
        .into_iter()
        .map(|(path, elements)| (path.as_ref().to_owned(), elements))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
