//! Picking one template's manifest out of combined `helm template` output.
//!
//! Helm separates documents with `---` and prefixes each with a
//! `# Source: <chart>/templates/<file>` comment.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::NumberedLine;

/// Lines of rendered output shown before the failure point.
pub const TAIL_LINES: usize = 5;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---[ \t]*\r?$").expect("built-in pattern must compile"));
static SOURCE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*Source:").expect("built-in pattern must compile"));

/// The rendered section produced by the template at `relative_path`
/// (relative to the chart root, e.g. `templates/deployment.yaml`).
///
/// Returns the lines after the `# Source:` header, or the whole trimmed
/// section when nothing follows the header.
pub fn extract_file_section(rendered: &str, relative_path: &Path) -> Option<String> {
    if rendered.is_empty() {
        return None;
    }
    let wanted = relative_path.to_string_lossy().replace('\\', "/");
    let header = Regex::new(&format!(
        r"(?m)^#\s*Source:\s*\S*/{}[ \t]*\r?$",
        regex::escape(&wanted)
    ))
    .ok()?;

    let section = SEPARATOR.split(rendered).find(|s| header.is_match(s))?;

    let mut past_header = false;
    let mut body = Vec::new();
    for line in section.lines() {
        if past_header {
            body.push(line);
        } else if SOURCE_HEADER.is_match(line) {
            past_header = true;
        }
    }

    if body.is_empty() {
        Some(section.trim().to_string())
    } else {
        Some(body.join("\n"))
    }
}

/// Last `count` lines of `text`, numbered from the start of `text`.
pub fn tail(text: &str, count: usize) -> Vec<NumberedLine> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..]
        .iter()
        .enumerate()
        .map(|(i, l)| NumberedLine::new(start + i + 1, *l))
        .collect()
}

/// Tail of the section rendered for `relative_path`, falling back to the
/// tail of the whole output when the section cannot be isolated.
pub fn rendered_tail(rendered: &str, relative_path: &Path, count: usize) -> Vec<NumberedLine> {
    match extract_file_section(rendered, relative_path) {
        Some(section) => tail(&section, count),
        None => tail(rendered, count),
    }
}
