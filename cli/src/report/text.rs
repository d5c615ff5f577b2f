use std::io;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Color, ColorSpec, WriteColor};

use bisect::{RenderResult, SearchMode, SearchResult, SearchStep};
use tpl::Chart;

use super::{Detail, Finding, Reporter, range_noun};

const RULE: usize = 40;
const BANNER: usize = 55;

fn fg(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

fn bold(color: Option<Color>) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(color).set_bold(true);
    spec
}

fn dim() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_dimmed(true);
    spec
}

/// Human-readable report on a terminal (or any color-capable writer).
///
/// Whether escape codes are emitted is decided by the writer's color
/// choice, which the caller derives from `--no-color` and whether stdout is
/// a terminal.
pub struct TextReporter<W: WriteColor> {
    out: W,
    verbose: bool,
    exit_code: i32,
}

impl<W: WriteColor> TextReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        TextReporter {
            out,
            verbose,
            exit_code: 0,
        }
    }

    fn styled(&mut self, spec: &ColorSpec, text: &str) -> io::Result<()> {
        self.out.set_color(spec)?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }

    fn rule(&mut self, width: usize) -> io::Result<()> {
        self.styled(&dim(), &"-".repeat(width))?;
        writeln!(self.out)
    }

    fn header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.styled(&bold(Some(Color::Cyan)), title)?;
        writeln!(self.out)?;
        self.rule(50)
    }

    fn error_found(&mut self, finding: &Finding<'_>) -> io::Result<()> {
        let banner = bold(Some(Color::Red));
        writeln!(self.out)?;
        self.styled(&banner, &"=".repeat(BANNER))?;
        writeln!(self.out)?;
        self.styled(
            &banner,
            &format!("  ERROR FOUND: {}:{}", finding.file_name(), finding.start_line),
        )?;
        writeln!(self.out)?;
        self.styled(&banner, &"=".repeat(BANNER))?;
        writeln!(self.out)?;

        self.source_context(finding)?;
        self.rendered_context(finding)?;
        self.helm_error(finding)?;

        writeln!(self.out)?;
        match finding.detail {
            Detail::Block {
                unit,
                index,
                last_successful,
            } => {
                self.styled(&bold(None), "Block Details:")?;
                writeln!(self.out)?;
                writeln!(self.out, "  Type:  {}", unit.kind)?;
                writeln!(self.out, "  Index: {index}")?;
                if let Some(last) = last_successful {
                    writeln!(self.out, "  Last successful block: {last}")?;
                }
            }
            Detail::Line { last_successful } => {
                self.styled(&bold(None), "Details:")?;
                writeln!(self.out)?;
                writeln!(self.out, "  Failing line: {}", finding.start_line)?;
                if let Some(last) = last_successful {
                    writeln!(self.out, "  Last successful line: {last}")?;
                }
            }
        }

        if finding.steps > 0 {
            writeln!(self.out)?;
            self.styled(&dim(), &format!("Search completed in {} steps", finding.steps))?;
            writeln!(self.out)?;
        }

        let suggestions = finding.suggestions();
        if !suggestions.is_empty() {
            writeln!(self.out)?;
            self.styled(&bold(None), "Suggestions:")?;
            writeln!(self.out)?;
            for suggestion in suggestions {
                writeln!(self.out, "  - {suggestion}")?;
            }
        }
        Ok(())
    }

    fn source_context(&mut self, finding: &Finding<'_>) -> io::Result<()> {
        writeln!(self.out)?;
        self.rule(RULE)?;
        for line in &finding.context_before {
            write!(self.out, "   ")?;
            self.styled(&dim(), &format!("{:>4}", line.line))?;
            writeln!(self.out, " | {}", line.content)?;
        }
        let red = fg(Color::Red);
        for line in &finding.failing_lines {
            self.styled(&red, ">>")?;
            write!(self.out, " ")?;
            self.styled(&red, &format!("{:>4}", line.line))?;
            write!(self.out, " | ")?;
            self.styled(&red, &line.content)?;
            writeln!(self.out)?;
        }
        for line in &finding.context_after {
            write!(self.out, "   ")?;
            self.styled(&dim(), &format!("{:>4}", line.line))?;
            writeln!(self.out, " | {}", line.content)?;
        }
        self.rule(RULE)
    }

    fn rendered_context(&mut self, finding: &Finding<'_>) -> io::Result<()> {
        if finding.rendered_tail.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        self.styled(&bold(Some(Color::Magenta)), "Rendered Manifest (before failure):")?;
        writeln!(self.out)?;
        self.rule(RULE)?;
        for line in &finding.rendered_tail {
            write!(self.out, "  ")?;
            self.styled(&dim(), &format!("{:>6}", line.line))?;
            writeln!(self.out, " | {}", line.content)?;
        }
        self.rule(RULE)?;
        if let Some(line) = finding.rendered_error_line {
            write!(self.out, "  ")?;
            self.styled(&dim(), &format!("(Helm reports error at rendered line {line})"))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// The Helm diagnostic, anchored on the failing source lines.
    fn helm_error(&mut self, finding: &Finding<'_>) -> io::Result<()> {
        if finding.helm_error.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        self.styled(&bold(None), "Helm Error:")?;
        writeln!(self.out)?;

        let template = finding.template;
        let mut files = SimpleFiles::new();
        let file_id = files.add(
            template.relative_path.display().to_string(),
            template.source.as_str(),
        );

        let mut lines = finding.helm_error.lines();
        let message = lines.next().unwrap_or_default();
        let notes: Vec<String> = lines.map(str::to_string).collect();

        let start = template
            .line_span(finding.start_line)
            .map(|s| s.start)
            .unwrap_or_default();
        let end = template
            .line_span(finding.end_line)
            .map(|s| s.end)
            .unwrap_or(start);
        let label = match finding.detail {
            Detail::Block { unit, .. } => format!("rendering fails once this {} is included", unit.kind),
            Detail::Line { .. } => "rendering fails once this line is included".to_string(),
        };

        let diagnostic = Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(file_id, start..end).with_message(label)])
            .with_notes(notes);
        let config = term::Config::default();
        term::emit_to_write_style(&mut self.out, &config, &files, &diagnostic)
            .map_err(io::Error::other)
    }
}

impl<W: WriteColor> Reporter for TextReporter<W> {
    fn chart_info(&mut self, chart: &Chart) -> io::Result<()> {
        self.header("Chart Analysis")?;
        writeln!(self.out, "  Chart path:     {}", chart.root.display())?;
        writeln!(self.out, "  Template files: {}", chart.total_files())?;
        writeln!(self.out, "  Total blocks:   {}", chart.total_units())?;

        if self.verbose {
            writeln!(self.out)?;
            write!(self.out, "  ")?;
            self.styled(&dim(), "Files:")?;
            writeln!(self.out)?;
            for template in &chart.templates {
                writeln!(
                    self.out,
                    "    - {}: {} blocks",
                    template.relative_path.display(),
                    template.units.len()
                )?;
            }
        }
        Ok(())
    }

    fn search_mode(&mut self, mode: SearchMode) -> io::Result<()> {
        writeln!(self.out)?;
        self.styled(&bold(None), &format!("[{} Mode]", mode.label()))?;
        writeln!(self.out)
    }

    fn step(&mut self, step: &SearchStep) -> io::Result<()> {
        write!(
            self.out,
            "  Testing {} {}... ",
            range_noun(step.tested.granularity),
            step.tested
        )?;
        if step.passed() {
            self.styled(&fg(Color::Green), "OK")?;
        } else {
            self.styled(&fg(Color::Red), "FAIL")?;
        }
        writeln!(self.out)
    }

    fn search_result(&mut self, result: &SearchResult<'_>) -> io::Result<()> {
        match Finding::from_result(result) {
            Some(finding) => self.error_found(&finding),
            None => {
                self.header("Result")?;
                write!(self.out, "  ")?;
                self.styled(&fg(Color::Green), "OK No errors found in template")?;
                writeln!(self.out)
            }
        }
    }

    fn no_helm_error(&mut self, result: &RenderResult) -> io::Result<()> {
        self.header("Result")?;
        write!(self.out, "  ")?;
        self.styled(&fg(Color::Green), "OK Template renders successfully")?;
        writeln!(self.out)?;

        if self.verbose && !result.stdout.is_empty() {
            writeln!(self.out)?;
            self.styled(&dim(), "Rendered output preview (first 20 lines):")?;
            writeln!(self.out)?;
            for line in result.stdout.lines().take(20) {
                writeln!(self.out, "  {line}")?;
            }
        }
        Ok(())
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        self.exit_code = 1;
        // Setup errors go to stderr; the writer only carries the report.
        eprintln!("Error: {message}");
        Ok(())
    }

    fn warning(&mut self, message: &str) -> io::Result<()> {
        self.styled(&fg(Color::Yellow), &format!("Warning: {message}"))?;
        writeln!(self.out)
    }

    fn info(&mut self, message: &str) -> io::Result<()> {
        self.styled(&fg(Color::Cyan), &format!("Info: {message}"))?;
        writeln!(self.out)
    }

    fn finish(&mut self) -> io::Result<i32> {
        self.out.flush()?;
        Ok(self.exit_code)
    }
}
