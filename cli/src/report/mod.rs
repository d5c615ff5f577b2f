pub mod classify;
mod json;
mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

use std::io;

use bisect::rendered::{TAIL_LINES, rendered_tail};
use bisect::{
    Granularity, NumberedLine, RenderResult, SearchMode, SearchOutcome, SearchResult, SearchStep,
    diagnostics,
};
use tpl::{Chart, Template, Unit};

/// Receives the events of a debugging session and presents them.
pub trait Reporter {
    fn chart_info(&mut self, chart: &Chart) -> io::Result<()>;

    fn search_mode(&mut self, mode: SearchMode) -> io::Result<()>;

    fn step(&mut self, step: &SearchStep) -> io::Result<()>;

    /// Outcome of searching one template, suggestions included.
    fn search_result(&mut self, result: &SearchResult<'_>) -> io::Result<()>;

    /// The unmodified chart rendered fine.
    fn no_helm_error(&mut self, result: &RenderResult) -> io::Result<()>;

    /// A setup failure; the session ends after this.
    fn error(&mut self, message: &str) -> io::Result<()>;

    fn warning(&mut self, message: &str) -> io::Result<()>;

    fn info(&mut self, message: &str) -> io::Result<()>;

    /// Flush anything buffered and return the process exit code.
    fn finish(&mut self) -> io::Result<i32>;
}

/// Lines of template source shown on either side of a failure.
const CONTEXT_LINES: usize = 3;

/// What the search pinned down, flattened for presentation.
pub(crate) struct Finding<'r> {
    pub template: &'r Template,
    pub granularity: Granularity,
    pub start_line: usize,
    pub end_line: usize,
    pub failing_lines: Vec<NumberedLine>,
    pub context_before: Vec<NumberedLine>,
    pub context_after: Vec<NumberedLine>,
    /// Error lines of the final diagnostic.
    pub helm_error: String,
    /// The final diagnostic in full.
    pub stderr: &'r str,
    pub rendered_tail: Vec<NumberedLine>,
    /// Line of the rendered manifest Helm complained about, if it said.
    pub rendered_error_line: Option<usize>,
    pub detail: Detail<'r>,
    pub steps: usize,
}

pub(crate) enum Detail<'r> {
    Block {
        unit: &'r Unit,
        index: usize,
        last_successful: Option<usize>,
    },
    Line {
        last_successful: Option<usize>,
    },
}

impl<'r> Finding<'r> {
    pub fn from_result(result: &'r SearchResult<'_>) -> Option<Self> {
        if !result.found() {
            return None;
        }
        let template = result.template();
        let numbered = |n: usize| template.line(n).map(|text| NumberedLine::new(n, text));

        let (start_line, end_line, context_before, context_after, detail) = match result {
            SearchResult::Block(block) => {
                let unit = block.failing_unit?;
                let first = unit.start_line.saturating_sub(CONTEXT_LINES).max(1);
                let last = (unit.end_line + CONTEXT_LINES).min(template.total_lines());
                (
                    unit.start_line,
                    unit.end_line,
                    (first..unit.start_line).filter_map(numbered).collect(),
                    (unit.end_line + 1..=last).filter_map(numbered).collect(),
                    Detail::Block {
                        unit,
                        index: block.failing_index?,
                        last_successful: block.last_successful_index,
                    },
                )
            }
            SearchResult::Line(line) => {
                let failing = line.failing_line?;
                (
                    failing,
                    failing,
                    line.context_before.clone(),
                    line.context_after.clone(),
                    Detail::Line {
                        last_successful: line.last_successful_line,
                    },
                )
            }
        };

        let stderr = result.error_diagnostic().unwrap_or_default();
        let rendered = result
            .last_successful_render()
            .map(|r| r.stdout.as_str())
            .unwrap_or_default();
        let rendered_tail = if rendered.is_empty() {
            Vec::new()
        } else {
            rendered_tail(rendered, &template.relative_path, TAIL_LINES)
        };

        Some(Finding {
            template,
            granularity: result.granularity(),
            start_line,
            end_line,
            failing_lines: (start_line..=end_line).filter_map(numbered).collect(),
            context_before,
            context_after,
            helm_error: diagnostics::error_message(stderr).trim().to_string(),
            stderr,
            rendered_tail,
            rendered_error_line: diagnostics::failing_line(stderr),
            detail,
            steps: result.steps().len(),
        })
    }

    pub fn file_name(&self) -> &str {
        self.template.file_name()
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        classify::suggestions(self.granularity, self.stderr)
    }
}

/// `blocks` or `lines`, for progress output.
pub(crate) fn range_noun(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Block => "blocks",
        Granularity::Line => "lines",
    }
}
