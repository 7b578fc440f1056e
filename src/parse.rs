//! Unified-diff parsing into an ordered sequence of [`Hunk`]s.
//!
//! The parser is a single forward scan over the diff text, line by line. File
//! header lines (`--- a/...`, `+++ b/...`) update the file pair that subsequent
//! hunks are attributed to; a line matching the `@@ -range +range @@` grammar
//! opens body collection, which runs until the first metadata line or end of
//! input. Merge-conflict blocks (`<<<<<<<` through `>>>>>>>`) embedded in a hunk
//! body are consumed verbatim, so a diff of a file that still contains conflict
//! markers parses as one hunk rather than shattering at the `=======` line.
//!
//! Parsing is total: malformed input yields fewer hunks, never an error.

use crate::hunk::Hunk;
use log::warn;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{opt, rest},
    sequence::preceded,
};

/// First line of a merge-conflict block ("ours" side follows).
pub(crate) const CONFLICT_START: &str = "<<<<<<<";
/// Separator between the "ours" and "theirs" sides.
pub(crate) const CONFLICT_MIDDLE: &str = "=======";
/// Last line of a merge-conflict block.
pub(crate) const CONFLICT_END: &str = ">>>>>>>";

pub(crate) fn is_conflict_marker(line: &str) -> bool {
    line.starts_with(CONFLICT_START)
        || line.starts_with(CONFLICT_MIDDLE)
        || line.starts_with(CONFLICT_END)
}

/// Parsed fields of a `@@ -start,count +start,count @@heading` line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct HunkHeader {
    pub src_start: u32,
    pub src_count: u32,
    pub tgt_start: u32,
    pub tgt_count: u32,
    pub heading: String,
}

/// `start[,count]`; count defaults to 1 when omitted. Numbers too large for
/// u32 degrade to 0 (start) or 1 (count) rather than failing the line.
fn range(input: &str) -> IResult<&str, (u32, u32)> {
    let (input, start) = digit1(input)?;
    let (input, count) = opt(preceded(char(','), digit1)).parse(input)?;

    let start = start.parse().unwrap_or(0);
    let count = count.map_or(1, |c: &str| c.parse().unwrap_or(1));
    Ok((input, (start, count)))
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader> {
    let (input, _) = tag("@@ -").parse(input)?;
    let (input, (src_start, src_count)) = range(input)?;
    let (input, _) = tag(" +").parse(input)?;
    let (input, (tgt_start, tgt_count)) = range(input)?;
    let (input, heading) = preceded(tag(" @@"), rest).parse(input)?;

    Ok((
        input,
        HunkHeader {
            src_start,
            src_count,
            tgt_start,
            tgt_count,
            heading: heading.to_string(),
        },
    ))
}

/// Parse a hunk-header line, or `None` if the line doesn't match the grammar.
pub(crate) fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    hunk_header(line).ok().map(|(_, header)| header)
}

fn source_header(line: &str) -> Option<&str> {
    line.strip_prefix("--- a/")
}

fn target_header(line: &str) -> Option<&str> {
    line.strip_prefix("+++ b/")
}

fn is_file_header(line: &str) -> bool {
    source_header(line).is_some() || target_header(line).is_some()
}

/// A line that terminates hunk-body collection.
///
/// Defined as the complement of body content: body lines start with `+`, `-`,
/// space, or `\` (the no-newline marker), or are empty. File header lines are
/// metadata even though they start with `-`/`+`.
fn is_metadata_line(line: &str) -> bool {
    if is_file_header(line) {
        return true;
    }
    match line.as_bytes().first() {
        None | Some(b'+') | Some(b'-') | Some(b' ') | Some(b'\\') => false,
        Some(_) => true,
    }
}

/// Parse unified-diff text into hunks, in ascending text order.
///
/// Unrecognized lines are skipped, so full `git diff` output (with `diff --git`,
/// `index`, and mode lines) parses the same as a bare patch. Empty or
/// unparseable input yields an empty vec.
pub fn parse_hunks(text: &str) -> Vec<Hunk> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        // The split leaves a synthetic empty element after a trailing
        // separator; it must never count as hunk content.
        lines.pop();
    }

    let mut hunks = Vec::new();
    let mut source_file = String::new();
    let mut target_file = String::new();

    let mut line_no = 0;
    while line_no < lines.len() {
        let line = lines[line_no];

        if let Some(path) = source_header(line) {
            source_file = path.to_string();
            line_no += 1;
            continue;
        }
        if let Some(path) = target_header(line) {
            target_file = path.to_string();
            line_no += 1;
            continue;
        }

        let Some(header) = parse_hunk_header(line) else {
            line_no += 1;
            continue;
        };

        let heading_line_index = line_no;
        let mut body: Vec<String> = Vec::new();
        line_no += 1;

        while line_no < lines.len() {
            let body_line = lines[line_no];

            if body_line.starts_with(CONFLICT_START) {
                match (line_no + 1..lines.len()).find(|&i| lines[i].starts_with(CONFLICT_END)) {
                    Some(end) => {
                        for i in line_no..=end {
                            body.push(lines[i].to_string());
                        }
                        line_no = end + 1;
                        continue;
                    }
                    None => {
                        warn!(
                            "unterminated conflict block at diff line {line_no}; \
                             truncating hunk started at line {heading_line_index}"
                        );
                        line_no += 1;
                        break;
                    }
                }
            }

            if is_metadata_line(body_line) {
                break;
            }

            body.push(body_line.to_string());
            line_no += 1;
        }

        hunks.push(Hunk {
            src_start: header.src_start,
            src_count: header.src_count,
            tgt_start: header.tgt_start,
            tgt_count: header.tgt_count,
            heading: header.heading,
            heading_line_index,
            source_file: source_file.clone(),
            target_file: target_file.clone(),
            lines: body,
        });
    }

    hunks
}
