use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tpl::Template;
use tracing::debug;

use crate::diagnostics;
use crate::error::BisectError;
use crate::scratch::ScratchChart;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long output is still awaited after the renderer exits.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// How a render attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Success,
    /// The renderer exited non-zero. `None` when it was killed by a signal.
    Failed { exit_code: Option<i32> },
    /// The wall-clock limit expired and the renderer was killed.
    TimedOut { after: Duration },
    /// The renderer could not be run at all, or its scratch chart could not
    /// be prepared.
    InvocationError,
}

/// Result of one render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub status: RenderStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// Program and arguments, for display.
    pub command: Vec<String>,
}

impl RenderResult {
    pub fn success(&self) -> bool {
        self.status == RenderStatus::Success
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.status, RenderStatus::TimedOut { .. })
    }

    /// Process exit code; `-1` stands in for timeouts and invocation errors.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RenderStatus::Success => 0,
            RenderStatus::Failed { exit_code } => exit_code.unwrap_or(-1),
            RenderStatus::TimedOut { .. } | RenderStatus::InvocationError => -1,
        }
    }

    /// The error lines of stderr, or all of it.
    pub fn error_message(&self) -> String {
        diagnostics::error_message(&self.stderr)
    }

    /// A successful render with the given manifest output.
    pub fn rendered(stdout: impl Into<String>) -> Self {
        RenderResult {
            status: RenderStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
            command: Vec::new(),
        }
    }

    /// A non-zero exit with the given diagnostic.
    pub fn failed(stderr: impl Into<String>) -> Self {
        RenderResult {
            status: RenderStatus::Failed { exit_code: Some(1) },
            stdout: String::new(),
            stderr: stderr.into(),
            elapsed: Duration::ZERO,
            command: Vec::new(),
        }
    }

    /// A render killed after `after`.
    pub fn timeout(after: Duration) -> Self {
        RenderResult {
            status: RenderStatus::TimedOut { after },
            stdout: String::new(),
            stderr: format!("Command timed out after {} seconds", after.as_secs()),
            elapsed: after,
            command: Vec::new(),
        }
    }

    fn invocation_error(command: Vec<String>, message: String, elapsed: Duration) -> Self {
        RenderResult {
            status: RenderStatus::InvocationError,
            stdout: String::new(),
            stderr: message,
            elapsed,
            command,
        }
    }
}

/// Renders candidate versions of a template and reports pass or fail.
///
/// Any closure `FnMut(&Template, &str) -> RenderResult` is an oracle, which
/// is how the search engine is exercised without a real renderer.
pub trait Oracle {
    /// Render the chart with `template` replaced by `content`.
    fn render(&mut self, template: &Template, content: &str) -> RenderResult;
}

impl<F> Oracle for F
where
    F: FnMut(&Template, &str) -> RenderResult,
{
    fn render(&mut self, template: &Template, content: &str) -> RenderResult {
        self(template, content)
    }
}

/// Settings passed through to every `helm template` invocation.
#[derive(Debug, Clone)]
pub struct HelmOptions {
    pub release_name: String,
    /// `-f` files.
    pub values_files: Vec<PathBuf>,
    /// `--set key=value` overrides.
    pub set_values: Vec<String>,
    /// Appended verbatim after everything else.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
}

impl Default for HelmOptions {
    fn default() -> Self {
        HelmOptions {
            release_name: "debug-release".to_string(),
            values_files: Vec::new(),
            set_values: Vec::new(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Oracle backed by the `helm template` command.
///
/// Every probe runs against its own scratch copy of the chart, so the
/// original chart on disk is never touched.
#[derive(Debug, Clone)]
pub struct HelmOracle {
    helm: PathBuf,
    chart_root: PathBuf,
    options: HelmOptions,
}

impl HelmOracle {
    pub fn new(helm: PathBuf, chart_root: PathBuf, mut options: HelmOptions) -> Self {
        // Probes run from inside a temporary directory, so relative paths
        // must be pinned to the caller's working directory now.
        let pin = |p: PathBuf| std::path::absolute(&p).unwrap_or(p);
        options.values_files = options.values_files.into_iter().map(pin).collect();
        HelmOracle {
            helm,
            chart_root: pin(chart_root),
            options,
        }
    }

    /// Use `helm_path` when given, otherwise look for helm on the system.
    pub fn discover(
        helm_path: Option<PathBuf>,
        chart_root: PathBuf,
        options: HelmOptions,
    ) -> Result<Self, BisectError> {
        let helm = match helm_path {
            Some(path) if path.exists() => path,
            Some(path) => return Err(BisectError::HelmPathInvalid(path)),
            None => find_helm_executable().ok_or(BisectError::HelmNotFound)?,
        };
        Ok(HelmOracle::new(helm, chart_root, options))
    }

    pub fn helm_path(&self) -> &Path {
        &self.helm
    }

    pub fn options(&self) -> &HelmOptions {
        &self.options
    }

    /// Render the original chart, unmodified and in place.
    pub fn render_original(&self) -> RenderResult {
        self.render_chart(&self.chart_root)
    }

    /// Run `helm template` on the chart at `chart`.
    pub fn render_chart(&self, chart: &Path) -> RenderResult {
        let args = self.arguments(chart);
        let mut command_line = vec![self.helm.display().to_string()];
        command_line.extend(args.iter().cloned());

        let mut cmd = Command::new(&self.helm);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(parent) = chart.parent().filter(|p| !p.as_os_str().is_empty()) {
            cmd.current_dir(parent);
        }

        let start = Instant::now();
        let result = run_with_timeout(cmd, self.options.timeout, command_line.clone());
        let result = result.unwrap_or_else(|e| {
            RenderResult::invocation_error(command_line, e.to_string(), start.elapsed())
        });
        debug!(
            status = ?result.status,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "helm template finished"
        );
        result
    }

    fn arguments(&self, chart: &Path) -> Vec<String> {
        let mut args = vec![
            "template".to_string(),
            self.options.release_name.clone(),
            chart.display().to_string(),
        ];
        for file in &self.options.values_files {
            args.push("-f".to_string());
            args.push(file.display().to_string());
        }
        for set in &self.options.set_values {
            args.push("--set".to_string());
            args.push(set.clone());
        }
        args.extend(self.options.extra_args.iter().cloned());
        args
    }
}

impl Oracle for HelmOracle {
    fn render(&mut self, template: &Template, content: &str) -> RenderResult {
        let start = Instant::now();
        let scratch = match ScratchChart::acquire(&self.chart_root) {
            Ok(scratch) => scratch,
            Err(e) => {
                return RenderResult::invocation_error(
                    Vec::new(),
                    format!("cannot copy chart: {e}"),
                    start.elapsed(),
                );
            }
        };
        if let Err(e) = scratch.overwrite(&template.relative_path, content) {
            return RenderResult::invocation_error(
                Vec::new(),
                format!("cannot write {}: {e}", template.relative_path.display()),
                start.elapsed(),
            );
        }

        let result = self.render_chart(scratch.path());
        if let Err(e) = scratch.release() {
            debug!(error = %e, "scratch chart cleanup failed");
        }
        result
    }
}

/// Spawn `cmd`, drain its output on helper threads and kill it once
/// `timeout` has passed.
///
/// Output is collected until the deadline at most. A descendant that keeps
/// the pipes open past it does not hold up the result; whatever was read
/// by then is kept only for a normal exit.
fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    command_line: Vec<String>,
) -> std::io::Result<RenderResult> {
    let start = Instant::now();
    let deadline = start + timeout;
    let mut child = cmd.spawn()?;

    let stdout_rx = child.stdout.take().map(drain);
    let stderr_rx = child.stderr.take().map(drain);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let Some(status) = status else {
        let mut result = RenderResult::timeout(timeout);
        result.elapsed = start.elapsed();
        result.command = command_line;
        return Ok(result);
    };

    let wait = deadline.saturating_duration_since(Instant::now()).max(DRAIN_GRACE);
    let stdout = collect(stdout_rx, wait);
    let stderr = collect(stderr_rx, wait);

    Ok(RenderResult {
        status: if status.success() {
            RenderStatus::Success
        } else {
            RenderStatus::Failed {
                exit_code: status.code(),
            }
        },
        stdout,
        stderr,
        elapsed: start.elapsed(),
        command: command_line,
    })
}

/// Read `pipe` to the end on a helper thread.
fn drain(mut pipe: impl Read + Send + 'static) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

fn collect(rx: Option<mpsc::Receiver<Vec<u8>>>, wait: Duration) -> String {
    rx.and_then(|rx| rx.recv_timeout(wait).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Look for `helm` on `PATH`, then in a few well-known install locations.
pub fn find_helm_executable() -> Option<PathBuf> {
    let name = if cfg!(windows) { "helm.exe" } else { "helm" };

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    [
        "/usr/local/bin/helm",
        "/usr/bin/helm",
        "C:\\Program Files\\Helm\\helm.exe",
        "C:\\ProgramData\\chocolatey\\bin\\helm.exe",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.is_file())
}
