//! Structural reduction of template text.
//!
//! Both entry points produce a document with the same number of lines as the
//! original, so line numbers reported by the renderer still line up with the
//! source. Line terminators are preserved as found.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::Template;
use crate::parser::is_control_line;
use crate::unit::Unit;

/// Keep exactly the lines of the selected units; every other non-blank line
/// becomes a template comment.
///
/// Control lines are not protected in this mode. Callers pick selections
/// that stay balanced, see [`balanced_prefix`].
pub fn reduce_blocks(template: &Template, selected: impl IntoIterator<Item = usize>) -> String {
    let mut included = BTreeSet::new();
    for idx in selected {
        if let Some(unit) = template.units.get(idx) {
            included.extend(unit.lines());
        }
    }

    let mut out = String::with_capacity(template.source.len());
    for (idx, raw) in template.source.split_inclusive('\n').enumerate() {
        let (text, terminator) = split_terminator(raw);
        if included.contains(&(idx + 1)) || text.trim().is_empty() {
            out.push_str(raw);
        } else {
            out.push_str(&comment_out(text));
            out.push_str(terminator);
        }
    }
    out
}

/// [`reduce_blocks`] over a contiguous range of unit indices.
pub fn reduce_block_range(template: &Template, range: Range<usize>) -> String {
    reduce_blocks(template, range)
}

/// Keep lines `1..=cutoff` verbatim and blank out later content lines.
///
/// Any later line carrying a control or cross-reference action survives
/// unchanged so the construct skeleton stays complete.
pub fn reduce_to_line(template: &Template, cutoff: usize) -> String {
    let mut out = String::with_capacity(template.source.len());
    for (idx, raw) in template.source.split_inclusive('\n').enumerate() {
        let (text, terminator) = split_terminator(raw);
        if idx < cutoff || text.trim().is_empty() || is_control_line(text) {
            out.push_str(raw);
        } else {
            out.push_str(terminator);
        }
    }
    out
}

/// Unit indices `0..=last` plus the `end` units that close every construct
/// still open after `last`.
///
/// Constructs opened after `last` are skipped over together with their own
/// `end`; continuations (`else`, `else if`) are never needed for balance.
pub fn balanced_prefix(units: &[Unit], last: usize) -> Vec<usize> {
    if units.is_empty() {
        return Vec::new();
    }
    let last = last.min(units.len() - 1);

    let mut selected: Vec<usize> = (0..=last).collect();
    let mut unclosed = 0usize;
    for unit in &units[..=last] {
        if unit.kind.is_open() {
            unclosed += 1;
        } else if unit.kind.is_close() {
            unclosed = unclosed.saturating_sub(1);
        }
    }

    let mut nested = 0usize;
    for (idx, unit) in units.iter().enumerate().skip(last + 1) {
        if unclosed == 0 {
            break;
        }
        if unit.kind.is_open() {
            nested += 1;
        } else if unit.kind.is_close() {
            if nested > 0 {
                nested -= 1;
            } else {
                selected.push(idx);
                unclosed -= 1;
            }
        }
    }

    selected
}

/// Wrap a line in a Go template comment. A `*/` inside the text would end
/// the comment early, so it is split apart.
fn comment_out(text: &str) -> String {
    format!("{{{{/* {} */}}}}", text.replace("*/", "* /"))
}

fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(text) = raw.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = raw.strip_suffix('\n') {
        (text, "\n")
    } else {
        (raw, "")
    }
}
