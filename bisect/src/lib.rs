pub mod diagnostics;
pub mod error;
pub mod oracle;
pub mod rendered;
pub mod scratch;
pub mod search;
pub mod targets;

pub use error::BisectError;
pub use oracle::{HelmOptions, HelmOracle, Oracle, RenderResult, RenderStatus};
pub use search::{
    BlockSearchResult, Granularity, LineSearchResult, SearchMode, SearchOutcome, SearchResult,
    SearchStep, Searcher, TestedRange,
};
pub use targets::{TargetReason, TargetSelection, select_targets};

/// A source or rendered line paired with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    pub line: usize,
    pub content: String,
}

impl NumberedLine {
    pub fn new(line: usize, content: impl Into<String>) -> Self {
        NumberedLine {
            line,
            content: content.into(),
        }
    }
}
