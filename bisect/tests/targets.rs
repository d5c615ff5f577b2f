use std::fs;
use std::path::Path;

use bisect::{BisectError, TargetReason, select_targets};
use tpl::Chart;

fn chart() -> (tempfile::TempDir, Chart) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("Chart.yaml"), "apiVersion: v2\nname: c\nversion: 0.1.0\n").unwrap();
    fs::create_dir_all(root.join("templates/sub")).unwrap();
    fs::write(root.join("templates/_helpers.tpl"), "{{- define \"c.name\" -}}c{{- end }}\n").unwrap();
    fs::write(root.join("templates/deployment.yaml"), "kind: Deployment\n").unwrap();
    fs::write(root.join("templates/sub/service.yml"), "kind: Service\n").unwrap();
    let chart = Chart::load(root).unwrap();
    (dir, chart)
}

fn names(templates: &[&tpl::Template]) -> Vec<String> {
    templates
        .iter()
        .map(|t| t.relative_path.display().to_string())
        .collect()
}

#[test]
fn requested_file_wins() {
    let (_dir, chart) = chart();
    let stderr = "Error: template: c/templates/deployment.yaml:1:3: boom";

    let selection = select_targets(&chart, stderr, Some("service.yml")).unwrap();
    assert_eq!(selection.reason, TargetReason::Requested("service.yml".into()));
    assert_eq!(names(&selection.templates), vec!["templates/sub/service.yml"]);
}

#[test]
fn unknown_requested_file() {
    let (_dir, chart) = chart();
    let err = select_targets(&chart, "", Some("ingress.yaml")).unwrap_err();
    assert!(matches!(err, BisectError::TemplateNotFound(ref f) if f == "ingress.yaml"));
    assert_eq!(err.to_string(), "template file not found: ingress.yaml");
}

#[test]
fn diagnostic_names_the_target() {
    let (_dir, chart) = chart();

    let stderr = "Error: template: c/templates/deployment.yaml:1:3: executing \"x\"";
    let selection = select_targets(&chart, stderr, None).unwrap();
    assert_eq!(selection.reason, TargetReason::Diagnostic("deployment.yaml".into()));
    assert_eq!(names(&selection.templates), vec!["templates/deployment.yaml"]);

    let stderr = "Error: template: c/templates/sub/service.yml:1:1: bad";
    let selection = select_targets(&chart, stderr, None).unwrap();
    assert_eq!(names(&selection.templates), vec!["templates/sub/service.yml"]);
}

#[test]
fn falls_back_to_non_helper_templates() {
    let (_dir, chart) = chart();

    let selection = select_targets(&chart, "Error: something odd", None).unwrap();
    assert_eq!(selection.reason, TargetReason::AllTemplates { missing: None });
    assert_eq!(
        names(&selection.templates),
        vec!["templates/deployment.yaml", "templates/sub/service.yml"]
    );

    let stderr = "Error: template: c/templates/ingress.yaml:3:1: gone";
    let selection = select_targets(&chart, stderr, None).unwrap();
    assert_eq!(
        selection.reason,
        TargetReason::AllTemplates {
            missing: Some("ingress.yaml".into())
        }
    );
    assert!(selection.templates.iter().all(|t| t.relative_path != Path::new("templates/_helpers.tpl")));
}
