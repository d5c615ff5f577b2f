use std::io::{self, Write};

use serde::Serialize;

use bisect::{NumberedLine, RenderResult, SearchMode, SearchResult, SearchStep};
use tpl::Chart;

use super::classify::{self, Category, Risk};
use super::{Detail, Finding, Reporter};

const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Failure,
    Error,
}

impl Status {
    fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Error => 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct Document {
    version: &'static str,
    status: Status,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
    search: SearchInfo,
    error: Option<ErrorReport>,
    suggestions: Vec<&'static str>,
    steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    info: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    chart_path: String,
    template_files: usize,
    total_blocks: usize,
    files: Vec<FileSummary>,
}

#[derive(Debug, Serialize)]
struct FileSummary {
    name: String,
    path: String,
    blocks: usize,
    lines: usize,
}

#[derive(Debug, Default, Serialize)]
struct SearchInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    granularity: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_steps: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    range: String,
    passed: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorReport {
    Setup { message: String },
    Located(Box<LocatedError>),
}

#[derive(Debug, Serialize)]
struct LocatedError {
    file: String,
    path: String,
    line: usize,
    end_line: usize,
    #[serde(flatten)]
    location: Location,
    category: Category,
    risk: Risk,
    helm_error: String,
    failing_lines: Vec<LineReport>,
    context_before: Vec<LineReport>,
    context_after: Vec<LineReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rendered_manifest_tail: Vec<LineReport>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Location {
    Block {
        block_type: &'static str,
        block_index: usize,
        last_successful_block_index: Option<usize>,
    },
    Line {
        last_successful_line: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct LineReport {
    line: usize,
    content: String,
}

fn lines(numbered: &[NumberedLine]) -> Vec<LineReport> {
    numbered
        .iter()
        .map(|l| LineReport {
            line: l.line,
            content: l.content.clone(),
        })
        .collect()
}

/// Collects a whole session into one JSON document, written by
/// [`Reporter::finish`].
pub struct JsonReporter<W: Write> {
    out: W,
    verbose: bool,
    doc: Document,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        JsonReporter {
            out,
            verbose,
            doc: Document {
                version: FORMAT_VERSION,
                status: Status::Success,
                exit_code: 0,
                summary: None,
                search: SearchInfo::default(),
                error: None,
                suggestions: Vec::new(),
                steps: Vec::new(),
                warnings: Vec::new(),
                info: Vec::new(),
            },
        }
    }

    fn set_status(&mut self, status: Status) {
        self.doc.status = status;
        self.doc.exit_code = status.exit_code();
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn chart_info(&mut self, chart: &Chart) -> io::Result<()> {
        self.doc.summary = Some(Summary {
            chart_path: chart.root.display().to_string(),
            template_files: chart.total_files(),
            total_blocks: chart.total_units(),
            files: chart
                .templates
                .iter()
                .map(|t| FileSummary {
                    name: t.file_name().to_string(),
                    path: t.relative_path.display().to_string(),
                    blocks: t.units.len(),
                    lines: t.total_lines(),
                })
                .collect(),
        });
        Ok(())
    }

    fn search_mode(&mut self, mode: SearchMode) -> io::Result<()> {
        self.doc.search.mode = Some(mode.as_str());
        Ok(())
    }

    fn step(&mut self, step: &SearchStep) -> io::Result<()> {
        self.doc.steps.push(StepReport {
            step: step.number,
            kind: step.tested.granularity.as_str(),
            range: step.tested.to_string(),
            passed: step.passed(),
        });
        Ok(())
    }

    fn search_result(&mut self, result: &SearchResult<'_>) -> io::Result<()> {
        self.doc.search.granularity = Some(result.granularity().as_str());
        let Some(finding) = Finding::from_result(result) else {
            self.set_status(Status::Success);
            return Ok(());
        };

        let location = match finding.detail {
            Detail::Block {
                unit,
                index,
                last_successful,
            } => Location::Block {
                block_type: unit.kind.as_str(),
                block_index: index,
                last_successful_block_index: last_successful,
            },
            Detail::Line { last_successful } => Location::Line {
                last_successful_line: last_successful,
            },
        };

        self.set_status(Status::Failure);
        self.doc.search.total_steps = Some(finding.steps);
        self.doc.suggestions = finding.suggestions();
        self.doc.error = Some(ErrorReport::Located(Box::new(LocatedError {
            file: finding.file_name().to_string(),
            path: finding.template.relative_path.display().to_string(),
            line: finding.start_line,
            end_line: finding.end_line,
            location,
            category: classify::category(&finding.helm_error),
            risk: classify::risk(&finding.helm_error),
            helm_error: finding.helm_error.clone(),
            failing_lines: lines(&finding.failing_lines),
            context_before: lines(&finding.context_before),
            context_after: lines(&finding.context_after),
            rendered_manifest_tail: lines(&finding.rendered_tail),
        })));
        Ok(())
    }

    fn no_helm_error(&mut self, _result: &RenderResult) -> io::Result<()> {
        self.set_status(Status::Success);
        Ok(())
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        self.set_status(Status::Error);
        self.doc.error = Some(ErrorReport::Setup {
            message: message.to_string(),
        });
        Ok(())
    }

    fn warning(&mut self, message: &str) -> io::Result<()> {
        self.doc.warnings.push(message.to_string());
        Ok(())
    }

    fn info(&mut self, message: &str) -> io::Result<()> {
        if self.verbose {
            self.doc.info.push(message.to_string());
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<i32> {
        serde_json::to_writer_pretty(&mut self.out, &self.doc)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(self.doc.exit_code)
    }
}
