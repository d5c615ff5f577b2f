mod config;
mod report;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use bisect::{
    Granularity, HelmOracle, SearchOutcome, Searcher, TargetReason, diagnostics, select_targets,
};
use tpl::Chart;

use config::{ModeArg, Overrides, Settings};
use report::{JsonReporter, Reporter, TextReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "helm-bisect",
    version,
    about = "Find the template line that makes `helm template` fail",
    after_help = "Examples:
  helm-bisect ./my-chart
  helm-bisect ./my-chart -f values-prod.yaml
  helm-bisect ./my-chart --mode step
  helm-bisect ./my-chart --set image.tag=v1.0.0
  helm-bisect ./my-chart --file deployment.yaml -o json"
)]
struct Cli {
    /// Path to the Helm chart directory
    chart: PathBuf,

    /// Values file to pass to helm (repeatable)
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    values: Vec<PathBuf>,

    /// Set a value on the command line (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Search strategy [default: binary]
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Only debug the template with this file name (e.g. deployment.yaml)
    #[arg(long = "file", value_name = "FILENAME")]
    file: Option<String>,

    /// Release name passed to helm template [default: debug-release]
    #[arg(short = 'n', long)]
    release_name: Option<String>,

    /// Path to the helm executable (auto-detected if not given)
    #[arg(long)]
    helm_path: Option<PathBuf>,

    /// Seconds before a single helm invocation is killed [default: 60]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Config file (defaults to helm-bisect.toml in the chart directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut reporter: Box<dyn Reporter> = match cli.output {
        OutputFormat::Json => Box::new(JsonReporter::new(io::stdout(), cli.verbose)),
        OutputFormat::Text => {
            let color = !cli.no_color && io::stdout().is_terminal();
            let choice = if color {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            };
            Box::new(TextReporter::new(StandardStream::stdout(choice), cli.verbose))
        }
    };

    let exit_code = run(&cli, reporter.as_mut()).and_then(|()| reporter.finish());
    match exit_code {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: cannot write report: {e}");
            process::exit(1);
        }
    }
}

/// Run one debugging session, reporting as it goes. Setup failures are
/// reported through `reporter` and end the session early.
fn run(cli: &Cli, reporter: &mut dyn Reporter) -> io::Result<()> {
    let file_config = match config::discover(&cli.chart, cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return reporter.error(&e),
    };
    let settings = Settings::merge(
        file_config,
        Overrides {
            release_name: cli.release_name.clone(),
            values: cli.values.clone(),
            set: cli.set.clone(),
            helm_path: cli.helm_path.clone(),
            timeout_secs: cli.timeout,
            mode: cli.mode,
        },
    );
    debug!(?settings, "resolved settings");

    if let Err(e) = tpl::chart::validate_chart_dir(&cli.chart) {
        return reporter.error(&e.to_string());
    }

    let mut oracle = match HelmOracle::discover(
        settings.helm_path.clone(),
        cli.chart.clone(),
        settings.helm.clone(),
    ) {
        Ok(o) => o,
        Err(e) => return reporter.error(&e.to_string()),
    };
    if cli.verbose {
        reporter.info(&format!("Using Helm at: {}", oracle.helm_path().display()))?;
    }

    let chart = match Chart::load(&cli.chart) {
        Ok(c) => c,
        Err(e) => return reporter.error(&format!("Failed to parse chart: {e}")),
    };
    if chart.total_files() == 0 {
        return reporter.warning("No template files found in chart.");
    }
    reporter.chart_info(&chart)?;

    let full = oracle.render_original();
    if full.success() {
        return reporter.no_helm_error(&full);
    }

    if cli.verbose {
        reporter.info(&format!("Initial error: {}", full.error_message()))?;
        if let Some(file) = diagnostics::failing_file(&full.stderr) {
            let line = diagnostics::failing_line(&full.stderr)
                .map(|l| format!(" (line {l})"))
                .unwrap_or_default();
            reporter.info(&format!("Helm reports error in: {file}{line}"))?;
        }
    }

    let selection = match select_targets(&chart, &full.stderr, cli.file.as_deref()) {
        Ok(s) => s,
        Err(e) => return reporter.error(&e.to_string()),
    };
    match &selection.reason {
        TargetReason::Requested(_) => {}
        TargetReason::Diagnostic(file) => {
            reporter.info(&format!("Auto-targeting file: {file}"))?;
        }
        TargetReason::AllTemplates { missing: Some(file) } => {
            reporter.warning(&format!("Could not find template: {file}"))?;
        }
        TargetReason::AllTemplates { missing: None } => {
            if cli.verbose {
                reporter.info("Skipping helper files (_*.tpl) from debugging")?;
            }
        }
    }

    reporter.search_mode(settings.mode)?;
    let granularity = Granularity::for_diagnostic(&full.stderr);
    if granularity == Granularity::Line {
        reporter.info("Detected YAML error - using line-based search")?;
    }

    for template in selection.templates {
        if cli.verbose {
            reporter.info(&format!("Debugging: {}", template.relative_path.display()))?;
        }

        let mut progress_error = None;
        let result = {
            let mut searcher = Searcher::new(&mut oracle).with_progress(|step| {
                if let Err(e) = reporter.step(step) {
                    if progress_error.is_none() {
                        progress_error = Some(e);
                    }
                }
            });
            searcher.search(template, granularity, settings.mode)
        };
        if let Some(e) = progress_error {
            return Err(e);
        }

        reporter.search_result(&result)?;
        if result.found() {
            info!(
                template = %template.relative_path.display(),
                steps = result.steps().len(),
                "error located"
            );
            break;
        }
    }

    Ok(())
}
