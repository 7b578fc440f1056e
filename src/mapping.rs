//! Mapping a line position in the diff text to a line position in the source
//! or target file.

use crate::hunk::Hunk;
use crate::parse::{CONFLICT_END, CONFLICT_MIDDLE, CONFLICT_START, is_conflict_marker};

/// Which file a diff line should be resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The pre-change file (`--- a/...`)
    Source,
    /// The post-change file (`+++ b/...`)
    Target,
}

#[derive(PartialEq, Clone, Copy)]
enum ConflictSection {
    Outside,
    Ours,
    Theirs,
}

/// Resolve `diff_line_index` (0-based, relative to the whole diff text) to a
/// 0-based line index in the source or target file.
///
/// Returns `None` when the index is outside every hunk, on a hunk header, on a
/// conflict marker, or on a change line exclusive to the opposite side (an
/// added line has no source position, a deleted line no target position).
///
/// Lines inside a conflict block resolve on the side the block half belongs
/// to: the "ours" half maps against the source, the "theirs" half against the
/// target.
pub fn map_line(hunks: &[Hunk], diff_line_index: usize, side: Side) -> Option<usize> {
    let hunk = hunks.iter().find(|h| h.contains_line(diff_line_index))?;
    // The header line itself has no counterpart.
    let pos = diff_line_index.checked_sub(hunk.heading_line_index + 1)?;

    let skip_char = match side {
        Side::Source => '+',
        Side::Target => '-',
    };

    let mut skip_count = 0usize;
    let mut section = ConflictSection::Outside;

    for line in &hunk.lines[..pos] {
        if line.starts_with(CONFLICT_START) {
            skip_count += 1;
            section = ConflictSection::Ours;
        } else if section == ConflictSection::Ours && line.starts_with(CONFLICT_MIDDLE) {
            skip_count += 1;
            section = ConflictSection::Theirs;
        } else if section != ConflictSection::Outside && line.starts_with(CONFLICT_END) {
            skip_count += 1;
            section = ConflictSection::Outside;
        } else {
            match section {
                ConflictSection::Ours => {
                    if side == Side::Target {
                        skip_count += 1;
                    }
                }
                ConflictSection::Theirs => {
                    if side == Side::Source {
                        skip_count += 1;
                    }
                }
                ConflictSection::Outside => {
                    if line.starts_with(skip_char) {
                        skip_count += 1;
                    }
                }
            }
        }
    }

    let line = &hunk.lines[pos];
    if is_conflict_marker(line) {
        return None;
    }

    let in_conflict = matches!(
        (section, side),
        (ConflictSection::Ours, Side::Source) | (ConflictSection::Theirs, Side::Target)
    );
    let own_char = match side {
        Side::Source => '-',
        Side::Target => '+',
    };
    let resolvable =
        in_conflict || line.is_empty() || line.starts_with(own_char) || line.starts_with(' ');
    if !resolvable {
        return None;
    }

    let side_start = match side {
        Side::Source => hunk.src_start,
        Side::Target => hunk.tgt_start,
    };
    // 1-based header start to 0-based file index; headers starting at 0 can
    // push this negative, which is "no counterpart" rather than a wrap.
    let mapped = i64::from(side_start) - 1 + pos as i64 - skip_count as i64;
    usize::try_from(mapped).ok()
}
