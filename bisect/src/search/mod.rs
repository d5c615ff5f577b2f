//! Locating the first failing unit of a template.
//!
//! Two strategies (bisection, linear scan) run at two granularities (units,
//! lines). Every strategy shares the same preamble: an empty template is
//! reported clean without probing, and so is one whose unmodified render
//! succeeds. Every probe after that is recorded as a [`SearchStep`].

mod block;
mod line;

pub use block::BlockSearchResult;
pub use line::LineSearchResult;

use std::fmt;

use tpl::Template;
use tracing::debug;

use crate::diagnostics;
use crate::oracle::{Oracle, RenderResult};

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Bisect the cut point: logarithmic number of probes.
    #[default]
    Binary,
    /// Move the cut point forward one unit at a time.
    Step,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Binary => "binary",
            SearchMode::Step => "step",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::Binary => "Binary Search",
            SearchMode::Step => "Step-by-Step",
        }
    }
}

/// What a cut point addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Cut points are unit indices, starting at 0.
    Block,
    /// Cut points are line numbers, starting at 1.
    Line,
}

impl Granularity {
    /// Pick a granularity from the diagnostic of the full render.
    ///
    /// YAML errors rarely line up with control constructs, so they get the
    /// line search; template errors usually do, so they get the unit search.
    pub fn for_diagnostic(stderr: &str) -> Self {
        if diagnostics::is_serialization_error(stderr) {
            Granularity::Line
        } else {
            Granularity::Block
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Block => "block",
            Granularity::Line => "line",
        }
    }

    /// Lowest addressable cut point.
    pub fn first(&self) -> usize {
        match self {
            Granularity::Block => 0,
            Granularity::Line => 1,
        }
    }
}

/// Closed interval of units or lines kept by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestedRange {
    pub granularity: Granularity,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for TestedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One oracle probe made during a search.
#[derive(Debug, Clone)]
pub struct SearchStep {
    /// 1-based, sequential within one search.
    pub number: usize,
    pub tested: TestedRange,
    pub result: RenderResult,
}

impl SearchStep {
    pub fn passed(&self) -> bool {
        self.result.success()
    }

    /// The cut point this step probed.
    pub fn cut(&self) -> usize {
        self.tested.end
    }
}

/// What every search result can answer, whatever its granularity.
pub trait SearchOutcome {
    fn found(&self) -> bool;
    fn steps(&self) -> &[SearchStep];
    fn template(&self) -> &Template;
    /// Render result captured at the failing cut point.
    fn error_result(&self) -> Option<&RenderResult>;
    /// Render result of the last passing probe.
    fn last_successful_render(&self) -> Option<&RenderResult>;

    /// Diagnostic text of the final failing render.
    fn error_diagnostic(&self) -> Option<&str> {
        self.error_result().map(|r| r.stderr.as_str())
    }
}

/// Result of searching one template.
#[derive(Debug, Clone)]
pub enum SearchResult<'t> {
    Block(BlockSearchResult<'t>),
    Line(LineSearchResult<'t>),
}

impl SearchResult<'_> {
    pub fn granularity(&self) -> Granularity {
        match self {
            SearchResult::Block(_) => Granularity::Block,
            SearchResult::Line(_) => Granularity::Line,
        }
    }

    fn outcome(&self) -> &dyn SearchOutcome {
        match self {
            SearchResult::Block(r) => r,
            SearchResult::Line(r) => r,
        }
    }
}

impl SearchOutcome for SearchResult<'_> {
    fn found(&self) -> bool {
        self.outcome().found()
    }

    fn steps(&self) -> &[SearchStep] {
        self.outcome().steps()
    }

    fn template(&self) -> &Template {
        self.outcome().template()
    }

    fn error_result(&self) -> Option<&RenderResult> {
        self.outcome().error_result()
    }

    fn last_successful_render(&self) -> Option<&RenderResult> {
        self.outcome().last_successful_render()
    }
}

/// Drives an [`Oracle`] to find the first failing cut point of a template.
///
/// Probes run strictly one after another: each bisection step depends on the
/// outcome of the previous one.
pub struct Searcher<'a, O: Oracle> {
    oracle: &'a mut O,
    progress: Option<Box<dyn FnMut(&SearchStep) + 'a>>,
}

impl<'a, O: Oracle> Searcher<'a, O> {
    pub fn new(oracle: &'a mut O) -> Self {
        Searcher {
            oracle,
            progress: None,
        }
    }

    /// Call `progress` after every recorded step.
    pub fn with_progress(mut self, progress: impl FnMut(&SearchStep) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Run the searcher selected by `granularity` and `mode`.
    pub fn search<'t>(
        &mut self,
        template: &'t Template,
        granularity: Granularity,
        mode: SearchMode,
    ) -> SearchResult<'t> {
        match (granularity, mode) {
            (Granularity::Block, SearchMode::Binary) => {
                SearchResult::Block(self.bisect_blocks(template))
            }
            (Granularity::Block, SearchMode::Step) => {
                SearchResult::Block(self.scan_blocks(template, 0))
            }
            (Granularity::Line, SearchMode::Binary) => {
                SearchResult::Line(self.bisect_lines(template))
            }
            (Granularity::Line, SearchMode::Step) => {
                SearchResult::Line(self.scan_lines(template, 1))
            }
        }
    }

    fn probe(&mut self, template: &Template, content: &str) -> RenderResult {
        self.oracle.render(template, content)
    }

    /// Whether the unmodified template fails. A passing template ends the
    /// search before any step is recorded.
    fn original_fails(&mut self, template: &Template) -> bool {
        let result = self.probe(template, &template.source);
        debug!(
            template = %template.relative_path.display(),
            success = result.success(),
            "probed unmodified template"
        );
        !result.success()
    }

    fn record(&mut self, steps: &mut Vec<SearchStep>, step: SearchStep) {
        debug!(
            step = step.number,
            range = %step.tested,
            passed = step.passed(),
            "search step"
        );
        if let Some(progress) = self.progress.as_mut() {
            progress(&step);
        }
        steps.push(step);
    }

    /// Bisect `[low, high]` for the first cut point whose reduced document
    /// fails. `reduce` builds the document kept by a cut point.
    fn narrow(
        &mut self,
        template: &Template,
        granularity: Granularity,
        (mut low, mut high): (usize, usize),
        reduce: impl Fn(usize) -> String,
        steps: &mut Vec<SearchStep>,
    ) -> Narrowed {
        let mut narrowed = Narrowed::default();

        while low <= high {
            let mid = low + (high - low) / 2;
            let result = self.probe(template, &reduce(mid));
            let passed = result.success();
            if passed {
                narrowed.last_good = Some(mid);
                narrowed.last_good_result = Some(result.clone());
            }

            let step = SearchStep {
                number: steps.len() + 1,
                tested: TestedRange {
                    granularity,
                    start: granularity.first(),
                    end: mid,
                },
                result,
            };
            self.record(steps, step);

            if passed {
                low = mid + 1;
            } else {
                narrowed.failing = Some(mid);
                match mid.checked_sub(1) {
                    Some(next) if next >= low => high = next,
                    _ => break,
                }
            }
        }

        narrowed
    }
}

/// Where bisection converged.
#[derive(Debug, Default)]
struct Narrowed {
    failing: Option<usize>,
    last_good: Option<usize>,
    last_good_result: Option<RenderResult>,
}
