use tpl::reduce::{balanced_prefix, reduce_blocks};
use tpl::{Template, Unit};
use tracing::info;

use super::{Granularity, SearchOutcome, SearchStep, Searcher, TestedRange};
use crate::oracle::{Oracle, RenderResult};

/// Outcome of a unit-granularity search.
#[derive(Debug, Clone)]
pub struct BlockSearchResult<'t> {
    pub template: &'t Template,
    pub found_error: bool,
    pub failing_unit: Option<&'t Unit>,
    pub failing_index: Option<usize>,
    pub last_successful_index: Option<usize>,
    pub steps: Vec<SearchStep>,
    pub error_result: Option<RenderResult>,
    pub last_successful_result: Option<RenderResult>,
}

impl<'t> BlockSearchResult<'t> {
    fn clean(template: &'t Template, steps: Vec<SearchStep>) -> Self {
        BlockSearchResult {
            template,
            found_error: false,
            failing_unit: None,
            failing_index: None,
            last_successful_index: None,
            steps,
            error_result: None,
            last_successful_result: None,
        }
    }
}

impl SearchOutcome for BlockSearchResult<'_> {
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

/// Document kept by cutting after unit `last`, closers included.
fn prefix_document(template: &Template, last: usize) -> String {
    reduce_blocks(template, balanced_prefix(&template.units, last))
}

impl<O: Oracle> Searcher<'_, O> {
    /// Bisect over unit indices for the first prefix that fails to render.
    pub fn bisect_blocks<'t>(&mut self, template: &'t Template) -> BlockSearchResult<'t> {
        let units = template.units.len();
        if units == 0 || !self.original_fails(template) {
            return BlockSearchResult::clean(template, Vec::new());
        }

        let mut steps = Vec::new();
        let narrowed = self.narrow(
            template,
            Granularity::Block,
            (0, units - 1),
            |mid| prefix_document(template, mid),
            &mut steps,
        );

        let Some(failing) = narrowed.failing else {
            info!(
                template = %template.relative_path.display(),
                steps = steps.len(),
                "every unit prefix rendered"
            );
            let mut result = BlockSearchResult::clean(template, steps);
            result.last_successful_index = narrowed.last_good;
            result.last_successful_result = narrowed.last_good_result;
            return result;
        };

        let error_result = self.probe(template, &prefix_document(template, failing));
        info!(
            template = %template.relative_path.display(),
            unit = failing,
            steps = steps.len(),
            "located failing unit"
        );

        BlockSearchResult {
            template,
            found_error: true,
            failing_unit: template.units.get(failing),
            failing_index: Some(failing),
            last_successful_index: narrowed.last_good,
            steps,
            error_result: Some(error_result),
            last_successful_result: narrowed.last_good_result,
        }
    }

    /// Grow the prefix one unit at a time from unit `start` until a probe
    /// fails.
    pub fn scan_blocks<'t>(&mut self, template: &'t Template, start: usize) -> BlockSearchResult<'t> {
        let units = template.units.len();
        if units == 0 || !self.original_fails(template) {
            return BlockSearchResult::clean(template, Vec::new());
        }

        let mut steps = Vec::new();
        let mut last_good = None;
        let mut last_good_result = None;

        for idx in start..units {
            let result = self.probe(template, &prefix_document(template, idx));
            let passed = result.success();
            let step = SearchStep {
                number: idx - start + 1,
                tested: TestedRange {
                    granularity: Granularity::Block,
                    start: 0,
                    end: idx,
                },
                result: result.clone(),
            };
            self.record(&mut steps, step);

            if !passed {
                info!(
                    template = %template.relative_path.display(),
                    unit = idx,
                    steps = steps.len(),
                    "located failing unit"
                );
                return BlockSearchResult {
                    template,
                    found_error: true,
                    failing_unit: template.units.get(idx),
                    failing_index: Some(idx),
                    last_successful_index: last_good,
                    steps,
                    error_result: Some(result),
                    last_successful_result: last_good_result,
                };
            }
            last_good = Some(idx);
            last_good_result = Some(result);
        }

        let mut clean = BlockSearchResult::clean(template, steps);
        clean.last_successful_index = last_good;
        clean.last_successful_result = last_good_result;
        clean
    }
}
