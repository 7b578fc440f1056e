//! Extraction of standalone, re-numbered sub-diffs from parsed hunks.
//!
//! Given a diff-text line range (or a single hunk), this produces new diff
//! text that is independently valid: file headers, a recomputed `@@` header,
//! and a body filtered down to the selection. Change lines outside the
//! selection are not simply cut: an unselected deletion must survive as a
//! context line so the emitted header counts stay true to the body, while an
//! unselected addition vanishes entirely.
//!
//! [`Direction::Reverse`] inverts the patch during extraction (additions and
//! deletions trade places, as do the two file names and header starts). The
//! result is a forward-appliable patch that undoes the selected change, which
//! is how "unstage" is expressed without a second code path.

use crate::hunk::Hunk;
use log::debug;

/// Whether the extracted text reproduces the change or undoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The change as-is (stage).
    Forward,
    /// The inverse patch (unstage).
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Add,
    Delete,
    Context,
    NoNewline,
}

fn classify(line: &str, direction: Direction) -> LineKind {
    let kind = match line.as_bytes().first() {
        Some(b'+') => LineKind::Add,
        Some(b'-') => LineKind::Delete,
        Some(b'\\') => LineKind::NoNewline,
        // Space-prefixed, empty, and anything else the parser let through.
        _ => LineKind::Context,
    };
    match (direction, kind) {
        (Direction::Reverse, LineKind::Add) => LineKind::Delete,
        (Direction::Reverse, LineKind::Delete) => LineKind::Add,
        (_, kind) => kind,
    }
}

struct FilteredHunk {
    lines: Vec<String>,
    adds: u32,
    dels: u32,
    ctxs: u32,
    start_offset: u32,
}

impl FilteredHunk {
    fn retains_changes(&self) -> bool {
        self.adds > 0 || self.dels > 0
    }
}

/// Body content without its prefix character.
fn unprefixed(line: &str) -> &str {
    line.get(1..).unwrap_or("")
}

fn filter_hunk(
    hunk: &Hunk,
    start_line: usize,
    end_line: usize,
    direction: Direction,
) -> FilteredHunk {
    // Trailing pure-context lines past the selection are pruned; the scan
    // stops at the first change line so demoted deletions keep the body
    // contiguous in source coordinates. No-newline markers follow the fate
    // of the line they annotate, decided in the forward pass.
    let mut pruned = vec![false; hunk.lines.len()];
    for i in (0..hunk.lines.len()).rev() {
        let abs = hunk.heading_line_index + 1 + i;
        if abs <= end_line {
            break;
        }
        match classify(&hunk.lines[i], direction) {
            LineKind::Context => pruned[i] = true,
            LineKind::NoNewline => {}
            LineKind::Add | LineKind::Delete => break,
        }
    }

    let mut filtered = FilteredHunk {
        lines: Vec::new(),
        adds: 0,
        dels: 0,
        ctxs: 0,
        start_offset: 0,
    };
    // True until the first kept source-side line; only additions dropped
    // ahead of that point shift the recomputed starts.
    let mut before_anchor = true;
    let mut prev_dropped = false;

    for (i, line) in hunk.lines.iter().enumerate() {
        let abs = hunk.heading_line_index + 1 + i;
        let in_range = start_line <= abs && abs <= end_line;

        match classify(line, direction) {
            LineKind::Add => {
                if in_range {
                    filtered.lines.push(format!("+{}", unprefixed(line)));
                    filtered.adds += 1;
                    prev_dropped = false;
                } else {
                    if abs < start_line && before_anchor {
                        filtered.start_offset += 1;
                    }
                    prev_dropped = true;
                }
            }
            LineKind::Delete => {
                if in_range {
                    filtered.lines.push(format!("-{}", unprefixed(line)));
                    filtered.dels += 1;
                } else {
                    // Unselected deletion: the line is still present in the
                    // file the patch applies to, so it must stay as context.
                    filtered.lines.push(format!(" {}", unprefixed(line)));
                    filtered.ctxs += 1;
                }
                before_anchor = false;
                prev_dropped = false;
            }
            LineKind::Context => {
                if pruned[i] {
                    prev_dropped = true;
                } else {
                    filtered.lines.push(line.clone());
                    filtered.ctxs += 1;
                    before_anchor = false;
                    prev_dropped = false;
                }
            }
            LineKind::NoNewline => {
                if prev_dropped {
                    if abs < start_line && before_anchor {
                        filtered.start_offset += 1;
                    }
                } else {
                    filtered.lines.push(line.clone());
                }
            }
        }
    }

    filtered
}

/// Extract the changes whose diff-text lines fall inside
/// `[start_line, end_line]` as new, standalone diff text.
///
/// Returns an empty string when nothing in range retains a change. Otherwise
/// the text carries, per retained hunk, its own `--- a/` / `+++ b/` headers
/// and a recomputed `@@` header (counts always explicit), and ends with a
/// newline.
pub fn sub_diff(hunks: &[Hunk], start_line: usize, end_line: usize, direction: Direction) -> String {
    let mut out: Vec<String> = Vec::new();

    for hunk in hunks {
        if hunk.ends_before(start_line) {
            continue;
        }
        if hunk.starts_after(end_line) {
            // Hunks ascend, so nothing further can intersect the range.
            break;
        }

        let filtered = filter_hunk(hunk, start_line, end_line, direction);
        if !filtered.retains_changes() {
            debug!(
                "hunk at diff line {} retains no changes in {start_line}..={end_line}, dropping",
                hunk.heading_line_index
            );
            continue;
        }

        let (source_file, target_file, src_start, tgt_start) = match direction {
            Direction::Forward => (
                &hunk.source_file,
                &hunk.target_file,
                hunk.src_start,
                hunk.tgt_start,
            ),
            Direction::Reverse => (
                &hunk.target_file,
                &hunk.source_file,
                hunk.tgt_start,
                hunk.src_start,
            ),
        };

        out.push(format!("--- a/{source_file}"));
        out.push(format!("+++ b/{target_file}"));
        out.push(format!(
            "@@ -{},{} +{},{} @@{}",
            src_start + filtered.start_offset,
            filtered.ctxs + filtered.dels,
            tgt_start + filtered.start_offset,
            filtered.ctxs + filtered.adds,
            hunk.heading
        ));
        out.extend(filtered.lines);
    }

    if out.len() > 2 {
        out.join("\n") + "\n"
    } else {
        String::new()
    }
}

/// Extract the single hunk containing `diff_line_index`, or `None` when the
/// index falls outside every hunk.
pub fn sub_diff_hunk(
    hunks: &[Hunk],
    diff_line_index: usize,
    direction: Direction,
) -> Option<String> {
    let hunk = hunks.iter().find(|h| h.contains_line(diff_line_index))?;
    Some(sub_diff(
        hunks,
        hunk.heading_line_index,
        hunk.last_line_index(),
        direction,
    ))
}
