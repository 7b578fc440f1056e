//! The owning facade over a parsed diff.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use error_set::error_set;
use log::{debug, warn};

use crate::extract::{self, Direction};
use crate::hunk::{FilePair, Hunk, file_pairs};
use crate::mapping::{self, Side};
use crate::parse::parse_hunks;

error_set! {
    /// Errors from loading diff text into a document
    DiffInputError := {
        #[display("Failed to read diff input: {message}")]
        ReadFailed { message: String },
        #[display("Diff input is not valid UTF-8: {message}")]
        InvalidUtf8 { message: String },
    }
}

/// A unified diff plus its parse result.
///
/// The document owns the raw text and a hunk list derived from it; the list is
/// rebuilt in full whenever the text is replaced and is never mutated on its
/// own. All queries are read-only, so a document can be shared freely between
/// readers; replacing the text swaps in a fresh list while a [`snapshot`]
/// taken earlier keeps the old one alive.
///
/// `base_path` and `strip_depth` are opaque here: they travel into every
/// derived document for whoever eventually applies the patch (`-p` strip
/// depth and working directory), but nothing in this crate interprets them.
///
/// [`snapshot`]: DiffDocument::snapshot
#[derive(Debug, Clone, Default)]
pub struct DiffDocument {
    text: String,
    /// Directory the diff is relative to; carried, never interpreted
    pub base_path: PathBuf,
    /// Path-strip depth for patch application; carried, never interpreted
    pub strip_depth: u32,
    hunks: Arc<[Hunk]>,
}

impl DiffDocument {
    /// An empty document. Gains content through [`set_text`](Self::set_text).
    pub fn new() -> Self {
        Self::default()
    }

    /// A document parsed from `text`.
    pub fn from_text(text: String) -> Self {
        let mut doc = Self::new();
        doc.set_text(text);
        doc
    }

    /// Load a document from a reader (a file, a pipe from a VCS tool).
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DiffInputError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| DiffInputError::ReadFailed {
                message: e.to_string(),
            })?;
        let text = String::from_utf8(buf).map_err(|e| DiffInputError::InvalidUtf8 {
            message: e.to_string(),
        })?;
        Ok(Self::from_text(text))
    }

    /// Replace the diff text, synchronously reparsing the hunk list.
    pub fn set_text(&mut self, text: String) {
        self.hunks = parse_hunks(&text).into();
        self.text = text;

        if self.parse_failed() {
            warn!("diff text contains '@@' but no hunks were parsed");
        } else {
            debug!("parsed {} hunks", self.hunks.len());
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// A shareable handle on the current hunk list. Stays valid (and
    /// unchanged) if the document's text is replaced afterwards.
    pub fn snapshot(&self) -> Arc<[Hunk]> {
        Arc::clone(&self.hunks)
    }

    /// True when the document holds no hunks at all.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// True when the text looks like a diff (contains `@@`) but nothing
    /// parsed. A display layer can surface this; it is never an error here.
    pub fn parse_failed(&self) -> bool {
        self.hunks.is_empty() && self.text.contains("@@")
    }

    /// File pairs touched by the diff, deduplicated by consecutive run.
    pub fn file_pairs(&self) -> Vec<FilePair> {
        file_pairs(&self.hunks)
    }

    /// Resolve a diff-text line to a source or target file line.
    pub fn map_line(&self, diff_line_index: usize, side: Side) -> Option<usize> {
        mapping::map_line(&self.hunks, diff_line_index, side)
    }

    /// Extract the changes in `[start_line, end_line]` as a new document.
    pub fn sub_diff(&self, start_line: usize, end_line: usize, direction: Direction) -> Self {
        self.derived(extract::sub_diff(
            &self.hunks,
            start_line,
            end_line,
            direction,
        ))
    }

    /// Extract the whole hunk containing `diff_line_index` as a new document.
    ///
    /// When no hunk contains the index, the derived document is empty of
    /// hunks but keeps the original text's pre-hunk prefix, so a caller can
    /// still show something sensible for "no changes selected".
    pub fn sub_diff_hunk(&self, diff_line_index: usize, direction: Direction) -> Self {
        match extract::sub_diff_hunk(&self.hunks, diff_line_index, direction) {
            Some(text) => self.derived(text),
            None => self.derived(self.prefix_before_hunks()),
        }
    }

    /// The original text up to (excluding) the first hunk header; the whole
    /// text when nothing parsed.
    fn prefix_before_hunks(&self) -> String {
        match self.hunks.first() {
            Some(first) => self
                .text
                .split('\n')
                .take(first.heading_line_index)
                .map(|line| format!("{line}\n"))
                .collect(),
            None => self.text.clone(),
        }
    }

    /// A new document around `text`, carrying this document's metadata.
    fn derived(&self, text: String) -> Self {
        let mut doc = Self::from_text(text);
        doc.base_path = self.base_path.clone();
        doc.strip_depth = self.strip_depth;
        doc
    }
}
