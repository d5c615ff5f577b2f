use std::path::Path;

use bisect::NumberedLine;
use bisect::rendered::{TAIL_LINES, extract_file_section, rendered_tail, tail};

const OUTPUT: &str = "\
---
# Source: mychart/templates/service.yaml
apiVersion: v1
kind: Service
---
# Source: mychart/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
  template:
---
# Source: mychart/templates/sub/deployment.yaml
apiVersion: apps/v1
kind: Job
";

#[test]
fn section_follows_source_header() {
    let section = extract_file_section(OUTPUT, Path::new("templates/service.yaml"));
    assert_eq!(section.as_deref(), Some("apiVersion: v1\nkind: Service"));
}

#[test]
fn nested_templates_match_by_relative_path() {
    let top = extract_file_section(OUTPUT, Path::new("templates/deployment.yaml")).unwrap();
    assert!(top.contains("kind: Deployment"));
    let nested = extract_file_section(OUTPUT, Path::new("templates/sub/deployment.yaml")).unwrap();
    assert!(nested.contains("kind: Job"));
}

#[test]
fn missing_section() {
    assert_eq!(extract_file_section(OUTPUT, Path::new("templates/ingress.yaml")), None);
    assert_eq!(extract_file_section("", Path::new("templates/service.yaml")), None);
}

#[test]
fn tail_numbers_from_section_start() {
    let lines = rendered_tail(OUTPUT, Path::new("templates/deployment.yaml"), TAIL_LINES);
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], NumberedLine::new(3, "metadata:"));
    assert_eq!(lines[4], NumberedLine::new(7, "  template:"));
}

#[test]
fn tail_falls_back_to_whole_output() {
    let lines = rendered_tail("a\nb\nc\n", Path::new("templates/x.yaml"), TAIL_LINES);
    let numbers: Vec<usize> = lines.iter().map(|l| l.line).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(tail("", 5).is_empty());
}
