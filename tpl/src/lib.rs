pub mod chart;
pub mod parser;
pub mod reduce;
pub mod unit;

use std::ops::Range;
use std::path::{Path, PathBuf};

pub use chart::{Chart, ChartError};
pub use unit::{Unit, UnitKind};

/// A parsed Helm template file.
#[derive(Debug, Clone)]
pub struct Template {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Location relative to the chart root, e.g. `templates/deployment.yaml`.
    pub relative_path: PathBuf,
    /// The original, unmodified file text.
    pub source: String,
    /// Units in source order.
    pub units: Vec<Unit>,
}

impl Template {
    pub fn new(path: PathBuf, relative_path: PathBuf, source: String) -> Self {
        let units = parser::Parser::new(&source).parse();
        Template {
            path,
            relative_path,
            source,
            units,
        }
    }

    /// Build a template that is not backed by a chart on disk.
    pub fn from_source(name: impl AsRef<Path>, source: impl Into<String>) -> Self {
        let name = name.as_ref().to_path_buf();
        Template::new(name.clone(), name, source.into())
    }

    /// The bare file name, e.g. `deployment.yaml`.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn total_lines(&self) -> usize {
        self.source.lines().count()
    }

    /// Source text of a 1-based line, without its terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|idx| self.source.lines().nth(idx))
    }

    /// Byte span of a 1-based line (terminator excluded).
    pub fn line_span(&self, line: usize) -> Option<Range<usize>> {
        let mut offset = 0;
        for (idx, raw) in self.source.split_inclusive('\n').enumerate() {
            if idx + 1 == line {
                let text = raw.trim_end_matches('\n').trim_end_matches('\r');
                return Some(offset..offset + text.len());
            }
            offset += raw.len();
        }
        None
    }
}
