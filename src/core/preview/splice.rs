//! Line-local string surgery for the cursor marker
//!
//! Only the cursor's own line is rewritten. Character offsets count Unicode
//! scalar values, matching the parser's columns.

use super::placement::PlacementDecision;
use super::position::LocalPosition;

/// Splice `marker` into `text` according to `decision`.
///
/// `filler` is the neutral character placed inside the wrapping group, next
/// to the braces. Positions past the end of a line are clamped to it; a line
/// index past the end of the snippet leaves the text unchanged.
pub fn apply(text: &str, decision: &PlacementDecision, marker: &str, filler: &str) -> String {
    match *decision {
        PlacementDecision::Suppress => text.to_string(),
        PlacementDecision::InsertAtPoint(pos) => {
            rewrite_line(text, pos.line, |line| insert_at(line, pos.character, marker))
        }
        PlacementDecision::InsertWithBraces { start, cursor, end } => {
            debug_assert!(start <= cursor && cursor <= end, "malformed placement span");
            rewrite_line(text, cursor.line, |line| {
                wrap_in_group(line, project(start, end, cursor, line), marker, filler)
            })
        }
    }
}

fn rewrite_line(text: &str, line: usize, edit: impl FnOnce(&str) -> String) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    match lines.get_mut(line) {
        Some(target) => {
            *target = edit(target);
            lines.join("\n")
        }
        None => text.to_string(),
    }
}

/// Column triple (start, cursor, end) of the span on the cursor's line
fn project(
    start: LocalPosition,
    end: LocalPosition,
    cursor: LocalPosition,
    line: &str,
) -> (usize, usize, usize) {
    let len = line.chars().count();
    let start_col = if start.line < cursor.line {
        0
    } else {
        start.character
    };
    let end_col = if end.line > cursor.line {
        len
    } else {
        end.character
    };
    let end_col = end_col.min(len);
    let cursor_col = cursor.character.min(end_col);
    let start_col = start_col.min(cursor_col);
    (start_col, cursor_col, end_col)
}

fn insert_at(line: &str, character: usize, marker: &str) -> String {
    let split = byte_offset(line, character);
    let mut out = String::with_capacity(line.len() + marker.len());
    out.push_str(&line[..split]);
    out.push_str(marker);
    out.push_str(&line[split..]);
    out
}

/// `prefix {~ head MARKER tail ~} suffix`. Braces right outside the span are
/// reused only as a pair; otherwise both are inserted, so the line's brace
/// balance never changes.
fn wrap_in_group(
    line: &str,
    (start, cursor, end): (usize, usize, usize),
    marker: &str,
    filler: &str,
) -> String {
    let chars: Vec<char> = line.chars().collect();
    let at_start = byte_offset(line, start);
    let at_cursor = byte_offset(line, cursor);
    let at_end = byte_offset(line, end);

    let reuse = start > 0 && chars.get(start - 1) == Some(&'{') && chars.get(end) == Some(&'}');

    let mut out = String::with_capacity(line.len() + marker.len() + 2 * filler.len() + 2);
    out.push_str(&line[..at_start]);
    if !reuse {
        out.push('{');
    }
    out.push_str(filler);
    out.push_str(&line[at_start..at_cursor]);
    out.push_str(marker);
    out.push_str(&line[at_cursor..at_end]);
    out.push_str(filler);
    if !reuse {
        out.push('}');
    }
    out.push_str(&line[at_end..]);
    out
}

fn byte_offset(line: &str, character: usize) -> usize {
    line.char_indices()
        .nth(character)
        .map_or(line.len(), |(i, _)| i)
}
