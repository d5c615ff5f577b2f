use tpl::Template;
use tpl::reduce::reduce_to_line;
use tracing::info;

use super::{Granularity, SearchOutcome, SearchStep, Searcher, TestedRange};
use crate::NumberedLine;
use crate::oracle::{Oracle, RenderResult};

/// Lines of source shown on either side of a failing line.
const CONTEXT_LINES: usize = 3;

/// Outcome of a line-granularity search.
#[derive(Debug, Clone)]
pub struct LineSearchResult<'t> {
    pub template: &'t Template,
    pub found_error: bool,
    pub failing_line: Option<usize>,
    pub failing_content: Option<String>,
    pub last_successful_line: Option<usize>,
    pub context_before: Vec<NumberedLine>,
    pub context_after: Vec<NumberedLine>,
    pub steps: Vec<SearchStep>,
    pub error_result: Option<RenderResult>,
    pub last_successful_result: Option<RenderResult>,
}

impl<'t> LineSearchResult<'t> {
    fn clean(template: &'t Template, steps: Vec<SearchStep>) -> Self {
        LineSearchResult {
            template,
            found_error: false,
            failing_line: None,
            failing_content: None,
            last_successful_line: None,
            context_before: Vec::new(),
            context_after: Vec::new(),
            steps,
            error_result: None,
            last_successful_result: None,
        }
    }

    fn located(
        template: &'t Template,
        line: usize,
        last_good: Option<usize>,
        steps: Vec<SearchStep>,
        error_result: RenderResult,
        last_good_result: Option<RenderResult>,
    ) -> Self {
        let numbered = |n: usize| template.line(n).map(|text| NumberedLine::new(n, text));
        let first = line.saturating_sub(CONTEXT_LINES).max(1);
        let last = (line + CONTEXT_LINES).min(template.total_lines());

        LineSearchResult {
            template,
            found_error: true,
            failing_line: Some(line),
            failing_content: template.line(line).map(str::to_string),
            last_successful_line: last_good,
            context_before: (first..line).filter_map(numbered).collect(),
            context_after: (line + 1..=last).filter_map(numbered).collect(),
            steps,
            error_result: Some(error_result),
            last_successful_result: last_good_result,
        }
    }
}

impl SearchOutcome for LineSearchResult<'_> {
    fn found(&self) -> bool {
        self.found_error
    }

    fn steps(&self) -> &[SearchStep] {
        &self.steps
    }

    fn template(&self) -> &Template {
        self.template
    }

    fn error_result(&self) -> Option<&RenderResult> {
        self.error_result.as_ref()
    }

    fn last_successful_render(&self) -> Option<&RenderResult> {
        self.last_successful_result.as_ref()
    }
}

impl<O: Oracle> Searcher<'_, O> {
    /// Bisect over line numbers for the first cutoff that fails to render.
    pub fn bisect_lines<'t>(&mut self, template: &'t Template) -> LineSearchResult<'t> {
        let total = template.total_lines();
        if total == 0 || !self.original_fails(template) {
            return LineSearchResult::clean(template, Vec::new());
        }

        let mut steps = Vec::new();
        let narrowed = self.narrow(
            template,
            Granularity::Line,
            (1, total),
            |mid| reduce_to_line(template, mid),
            &mut steps,
        );

        let Some(failing) = narrowed.failing else {
            info!(
                template = %template.relative_path.display(),
                steps = steps.len(),
                "every line cutoff rendered"
            );
            let mut result = LineSearchResult::clean(template, steps);
            result.last_successful_line = narrowed.last_good;
            result.last_successful_result = narrowed.last_good_result;
            return result;
        };

        let error_result = self.probe(template, &reduce_to_line(template, failing));
        info!(
            template = %template.relative_path.display(),
            line = failing,
            steps = steps.len(),
            "located failing line"
        );
        LineSearchResult::located(
            template,
            failing,
            narrowed.last_good,
            steps,
            error_result,
            narrowed.last_good_result,
        )
    }

    /// Move the cutoff forward one line at a time from line `start` until a
    /// probe fails.
    pub fn scan_lines<'t>(&mut self, template: &'t Template, start: usize) -> LineSearchResult<'t> {
        let total = template.total_lines();
        if total == 0 || !self.original_fails(template) {
            return LineSearchResult::clean(template, Vec::new());
        }

        let start = start.max(1);
        let mut steps = Vec::new();
        let mut last_good = None;
        let mut last_good_result = None;

        for line in start..=total {
            let result = self.probe(template, &reduce_to_line(template, line));
            let passed = result.success();
            let step = SearchStep {
                number: line - start + 1,
                tested: TestedRange {
                    granularity: Granularity::Line,
                    start: 1,
                    end: line,
                },
                result: result.clone(),
            };
            self.record(&mut steps, step);

            if !passed {
                info!(
                    template = %template.relative_path.display(),
                    line,
                    steps = steps.len(),
                    "located failing line"
                );
                return LineSearchResult::located(
                    template,
                    line,
                    last_good,
                    steps,
                    result,
                    last_good_result,
                );
            }
            last_good = Some(line);
            last_good_result = Some(result);
        }

        let mut clean = LineSearchResult::clean(template, steps);
        clean.last_successful_line = last_good;
        clean.last_successful_result = last_good_result;
        clean
    }
}
