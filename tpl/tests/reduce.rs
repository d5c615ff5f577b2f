use tpl::Template;
use tpl::reduce::{balanced_prefix, reduce_block_range, reduce_blocks, reduce_to_line};

const DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{ .Release.Name }}
{{- if .Values.labels }}
  labels:
    app: {{ .Values.labels.app }}
{{- end }}
spec:
  replicas: {{ .Values.replicas }}
";

fn template(source: &str) -> Template {
    Template::from_source("templates/deployment.yaml", source)
}

#[test]
fn full_block_range_is_identity() {
    let t = template(DEPLOYMENT);
    assert_eq!(reduce_block_range(&t, 0..t.units.len()), DEPLOYMENT);
}

#[test]
fn full_line_cutoff_is_identity() {
    let t = template(DEPLOYMENT);
    assert_eq!(reduce_to_line(&t, t.total_lines()), DEPLOYMENT);
    assert_eq!(reduce_to_line(&t, t.total_lines() + 10), DEPLOYMENT);
}

#[test]
fn excluded_blocks_become_comments() {
    let t = template("a: 1\nb: {{ .x }}\n\nc: 3\n");
    let out = reduce_block_range(&t, 0..1);
    assert_eq!(out, "a: 1\n{{/* b: {{ .x }} */}}\n\n{{/* c: 3 */}}\n");
}

#[test]
fn excluded_control_lines_are_commented_in_block_mode() {
    let t = template("{{ if .a }}\nx\n{{ end }}\n");
    let out = reduce_blocks(&t, [1]);
    assert_eq!(out, "{{/* {{ if .a }} */}}\nx\n{{/* {{ end }} */}}\n");
}

#[test]
fn comment_terminator_inside_line_is_defused() {
    let t = template("keep\n{{/* note */}}\n");
    let out = reduce_block_range(&t, 0..1);
    assert_eq!(out, "keep\n{{/* {{/* note * /}} */}}\n");
    assert_eq!(out.matches("*/").count(), 1);
}

#[test]
fn line_count_is_preserved() {
    let t = template(DEPLOYMENT);
    for cutoff in 0..=t.total_lines() {
        assert_eq!(reduce_to_line(&t, cutoff).lines().count(), t.total_lines());
    }
    for last in 0..t.units.len() {
        let out = reduce_blocks(&t, balanced_prefix(&t.units, last));
        assert_eq!(out.lines().count(), t.total_lines());
    }
}

#[test]
fn line_cutoff_blanks_content_but_keeps_control() {
    let t = template(DEPLOYMENT);
    let out = reduce_to_line(&t, 4);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[3], "  name: {{ .Release.Name }}");
    assert_eq!(lines[4], "{{- if .Values.labels }}");
    assert_eq!(lines[5], "");
    assert_eq!(lines[6], "");
    assert_eq!(lines[7], "{{- end }}");
    assert_eq!(lines[8], "");
    assert_eq!(lines[9], "");
}

#[test]
fn unmatched_end_after_cutoff_survives() {
    let mut source = String::new();
    for i in 1..=19 {
        source.push_str(&format!("key{i}: value\n"));
    }
    source.push_str("{{- end }}\n");
    let t = template(&source);

    let out = reduce_to_line(&t, 15);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[14], "key15: value");
    assert_eq!(lines[15], "");
    assert_eq!(lines[19], "{{- end }}");
}

#[test]
fn line_cutoff_keeps_control_skeleton_balanced() {
    let t = template(DEPLOYMENT);
    let opens = |s: &str| tpl::parser::parse(s).iter().filter(|u| u.kind.is_open()).count();
    let ends = |s: &str| tpl::parser::parse(s).iter().filter(|u| u.kind.is_close()).count();
    for cutoff in 0..=t.total_lines() {
        let out = reduce_to_line(&t, cutoff);
        assert_eq!(opens(&out), opens(DEPLOYMENT));
        assert_eq!(ends(&out), ends(DEPLOYMENT));
    }
}

#[test]
fn crlf_terminators_are_preserved() {
    let source = "a: 1\r\nb: 2\r\nc: 3";
    let t = template(source);
    assert_eq!(reduce_to_line(&t, 1), "a: 1\r\n\r\n");
    assert_eq!(reduce_block_range(&t, 0..1), "a: 1\r\n{{/* b: 2 */}}\r\n{{/* c: 3 */}}");
    assert_eq!(reduce_block_range(&t, 0..3), source);
}

#[test]
fn balanced_prefix_adds_closing_ends() {
    let t = template(DEPLOYMENT);
    // units: 0 apiVersion, 1 kind, 2 metadata, 3 name, 4 if, 5 labels,
    //        6 app, 7 end, 8 spec, 9 replicas
    assert_eq!(balanced_prefix(&t.units, 2), vec![0, 1, 2]);
    assert_eq!(balanced_prefix(&t.units, 4), vec![0, 1, 2, 3, 4, 7]);
    assert_eq!(balanced_prefix(&t.units, 5), vec![0, 1, 2, 3, 4, 5, 7]);
    assert_eq!(balanced_prefix(&t.units, 7), (0..=7).collect::<Vec<_>>());
}

#[test]
fn balanced_prefix_skips_nested_constructs() {
    let source = "\
{{ if .a }}
{{ range .b }}
x
{{ end }}
{{ with .c }}
y
{{ end }}
{{ end }}
";
    let t = template(source);
    // After unit 0 only the outer `if` is open; the range/with pairs that
    // follow are skipped and the final `end` closes it.
    assert_eq!(balanced_prefix(&t.units, 0), vec![0, 7]);
    // Inside the range both the range and the if need closing.
    assert_eq!(balanced_prefix(&t.units, 2), vec![0, 1, 2, 3, 7]);

    let out = reduce_blocks(&t, balanced_prefix(&t.units, 0));
    assert_eq!(
        out,
        "{{ if .a }}\n{{/* {{ range .b }} */}}\n{{/* x */}}\n{{/* {{ end }} */}}\n\
         {{/* {{ with .c }} */}}\n{{/* y */}}\n{{/* {{ end }} */}}\n{{ end }}\n"
    );
}

#[test]
fn balanced_prefix_of_empty_template() {
    assert!(balanced_prefix(&[], 3).is_empty());
}
