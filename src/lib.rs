//! Unified-diff hunk engine for partial staging.
//!
//! This crate is the core a version-control client needs for "stage this
//! hunk" and "stage these selected lines": it parses unified-diff text into
//! hunks with exact line accounting, maps a position in the diff text back to
//! a line in the source or target file, and extracts standalone,
//! correctly-re-numbered sub-diffs covering an arbitrary line range or a
//! single hunk, forward to stage or inverted to unstage.
//!
//! Producing the diff and applying the result are the caller's business
//! (typically `git diff` in and `git apply --cached` out); this crate never
//! touches a repository or the filesystem.
//!
//! Malformed input is never an error: parsing yields as many hunks as the
//! text supports, lookups return `None`, extractions return empty text.
//!
//! # Example
//!
//! ```
//! use diff_hunks::{DiffDocument, Direction, Side};
//!
//! let diff = "\
//! --- a/config.toml
//! +++ b/config.toml
//! @@ -3,2 +3,3 @@
//!  [server]
//! +port = 8080
//!  workers = 4
//! ";
//! let doc = DiffDocument::from_text(diff.to_string());
//!
//! // Diff line 4 is the added line; it exists only in the target file.
//! assert_eq!(doc.map_line(4, Side::Source), None);
//! assert_eq!(doc.map_line(4, Side::Target), Some(3));
//!
//! // Stage exactly that line.
//! let staged = doc.sub_diff(4, 4, Direction::Forward);
//! assert!(staged.text().contains("+port = 8080"));
//!
//! // The inverse patch unstages it again.
//! let unstage = doc.sub_diff(4, 4, Direction::Reverse);
//! assert!(unstage.text().contains("-port = 8080"));
//! ```

pub mod document;
pub mod extract;
pub mod hunk;
pub mod mapping;
pub mod parse;

pub use document::{DiffDocument, DiffInputError};
pub use extract::{Direction, sub_diff, sub_diff_hunk};
pub use hunk::{FilePair, Hunk, file_pairs};
pub use mapping::{Side, map_line};
pub use parse::parse_hunks;
