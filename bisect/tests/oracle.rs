use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bisect::{BisectError, HelmOptions, HelmOracle, Oracle, RenderStatus};
use tpl::Chart;

fn write_chart(root: &Path) {
    fs::write(root.join("Chart.yaml"), "apiVersion: v2\nname: c\nversion: 0.1.0\n").unwrap();
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::write(root.join("templates/a.yaml"), "a: {{ .Values.a }}\n").unwrap();
}

#[cfg(unix)]
fn fake_helm(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    // Arguments: template <release> <chart> ...
    let script = "#!/bin/sh
file=\"$3/templates/a.yaml\"
if grep -q boom \"$file\"; then
  echo 'Error: template: c/templates/a.yaml:1:3: boom' >&2
  exit 1
fi
if grep -q hang \"$file\"; then
  exec sleep 5
fi
if grep -q stall \"$file\"; then
  sleep 6
fi
echo '---'
echo '# Source: c/templates/a.yaml'
cat \"$file\"
";
    let path = dir.join("helm");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn helm_oracle_against_fake_binary() {
    let bin = tempfile::tempdir().unwrap();
    let chart_dir = tempfile::tempdir().unwrap();
    write_chart(chart_dir.path());
    let chart = Chart::load(chart_dir.path()).unwrap();
    let template = &chart.templates[0];

    let options = HelmOptions {
        timeout: Duration::from_secs(1),
        ..HelmOptions::default()
    };
    let mut oracle = HelmOracle::new(fake_helm(bin.path()), chart.root.clone(), options);

    let original = oracle.render_original();
    assert!(original.success());
    assert!(original.stdout.contains("a: {{ .Values.a }}"));
    assert_eq!(original.command[1..3], ["template", "debug-release"]);

    let passed = oracle.render(template, "a: fine\n");
    assert!(passed.success());
    assert!(passed.stdout.contains("a: fine"));

    let failed = oracle.render(template, "a: boom\n");
    assert_eq!(failed.status, RenderStatus::Failed { exit_code: Some(1) });
    assert_eq!(failed.exit_code(), 1);
    assert!(failed.error_message().contains("boom"));

    let hung = oracle.render(template, "a: hang\n");
    assert!(hung.timed_out());
    assert!(!hung.success());
    assert_eq!(hung.stderr, "Command timed out after 1 seconds");
    assert!(hung.elapsed < Duration::from_secs(5));

    // The shell is killed but its `sleep` keeps the pipes open.
    let started = std::time::Instant::now();
    let stalled = oracle.render(template, "a: stall\n");
    assert!(stalled.timed_out());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(stalled.elapsed >= Duration::from_secs(1));
    assert!(stalled.elapsed < Duration::from_secs(4));

    // Probes never touch the chart on disk.
    assert_eq!(
        fs::read_to_string(chart_dir.path().join("templates/a.yaml")).unwrap(),
        "a: {{ .Values.a }}\n"
    );
}

#[test]
fn missing_binary_is_an_invocation_error() {
    let chart_dir = tempfile::tempdir().unwrap();
    write_chart(chart_dir.path());

    let oracle = HelmOracle::new(
        PathBuf::from("/nonexistent/helm"),
        chart_dir.path().to_path_buf(),
        HelmOptions::default(),
    );
    let result = oracle.render_original();
    assert_eq!(result.status, RenderStatus::InvocationError);
    assert_eq!(result.exit_code(), -1);
    assert!(!result.stderr.is_empty());
}

#[test]
fn explicit_helm_path_must_exist() {
    let err = HelmOracle::discover(
        Some(PathBuf::from("/nonexistent/helm")),
        PathBuf::from("."),
        HelmOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BisectError::HelmPathInvalid(_)));
}

#[test]
fn relative_values_files_are_pinned() {
    let options = HelmOptions {
        values_files: vec![PathBuf::from("values-prod.yaml")],
        ..HelmOptions::default()
    };
    let oracle = HelmOracle::new(PathBuf::from("helm"), PathBuf::from("."), options);
    assert!(oracle.options().values_files[0].is_absolute());
    assert!(oracle.options().values_files[0].ends_with("values-prod.yaml"));
}
