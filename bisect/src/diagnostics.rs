//! Helpers for reading `helm template` stderr.
//!
//! These only look at text; they never influence how a probe is classified.

use std::sync::LazyLock;

use regex::Regex;

/// Markers of a YAML serialization error as opposed to a template error.
const SERIALIZATION_MARKERS: &[&str] = &[
    "yaml parse error",
    "yaml:",
    "error converting yaml to json",
    "did not find expected",
    "mapping values are not allowed",
    "could not find expected",
];

static FAILING_FILE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"YAML parse error on [^/]+/templates/([^:]+)",
        r"template: [^/]+/templates/([^:]+):",
        r"parse error at \([^/]+/templates/([^:)]+)",
        r"templates/([^\s:]+\.(?:yaml|yml|tpl))",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("built-in pattern must compile"))
    .collect()
});

static FAILING_LINE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"yaml: line (\d+)",
        r"\.yaml:(\d+)",
        r"\.yml:(\d+)",
        r"\.tpl:(\d+)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("built-in pattern must compile"))
    .collect()
});

/// The lines of `stderr` that look like error reports, or all of it when
/// none do.
pub fn error_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .trim()
        .lines()
        .filter(|l| l.contains("Error:") || l.contains("error:") || l.contains("template:"))
        .collect();
    if lines.is_empty() {
        stderr.to_string()
    } else {
        lines.join("\n")
    }
}

/// Whether a render failure reads like a YAML serialization problem.
pub fn is_serialization_error(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    SERIALIZATION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Template path (relative to `templates/`) named by a Helm error.
pub fn failing_file(stderr: &str) -> Option<String> {
    FAILING_FILE
        .iter()
        .find_map(|re| re.captures(stderr))
        .map(|caps| caps[1].to_string())
}

/// Line number named by a Helm error. For YAML errors this is a line of the
/// rendered manifest, not of the template source.
pub fn failing_line(stderr: &str) -> Option<usize> {
    FAILING_LINE
        .iter()
        .find_map(|re| re.captures(stderr))
        .and_then(|caps| caps[1].parse().ok())
}
