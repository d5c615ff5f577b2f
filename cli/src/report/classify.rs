//! Turning a Helm diagnostic into hints for the person reading the report.

use serde::Serialize;

use bisect::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    YamlSyntax,
    YamlStructure,
    TemplateSyntax,
    TemplateReference,
    NilReference,
    TypeError,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    High,
    Medium,
    Low,
    None,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn category(message: &str) -> Category {
    if message.is_empty() {
        return Category::Unknown;
    }
    let low = message.to_lowercase();
    if contains_any(&low, &["yaml parse error", "yaml:", "error converting yaml"]) {
        Category::YamlSyntax
    } else if contains_any(&low, &["did not find expected", "mapping values"]) {
        Category::YamlStructure
    } else if low.contains("unexpected") {
        Category::TemplateSyntax
    } else if contains_any(&low, &["undefined", "not defined"]) {
        Category::TemplateReference
    } else if low.contains("nil pointer") {
        Category::NilReference
    } else if low.contains("cannot range") {
        Category::TypeError
    } else {
        Category::Other
    }
}

pub fn risk(message: &str) -> Risk {
    if message.is_empty() {
        return Risk::None;
    }
    let low = message.to_lowercase();
    if contains_any(&low, &["nil pointer", "undefined", "not defined"]) {
        Risk::High
    } else if contains_any(&low, &["yaml", "indentation", "mapping"]) {
        Risk::Medium
    } else {
        Risk::Low
    }
}

/// Fix-it hints for the diagnostic of a located failure.
pub fn suggestions(granularity: Granularity, stderr: &str) -> Vec<&'static str> {
    let low = stderr.to_lowercase();
    let mut out = Vec::new();

    if granularity == Granularity::Line && low.contains("yaml") {
        if low.contains("indent") {
            out.push("Check indentation - YAML requires consistent spacing");
        }
        if low.contains("did not find expected") {
            out.push("Check YAML structure - possibly wrong indentation or missing item");
        }
        if low.contains("mapping") {
            out.push("Check YAML key-value syntax (key: value)");
        }
    }

    if low.contains("unexpected") && low.contains('}') {
        out.push("Check for mismatched or missing braces {{ }}");
    }
    if low.contains("undefined") {
        out.push("Verify the variable exists in values.yaml");
        if granularity == Granularity::Block {
            out.push("Check for typos in variable names");
        }
    }

    if granularity == Granularity::Block {
        if low.contains("not defined") {
            out.push("The referenced template or helper may not exist");
        }
        if low.contains("cannot range over") {
            out.push("Ensure the value is a list or map before ranging");
        }
        if low.contains("nil pointer") {
            out.push("Add a nil check: {{- if .Values.something }}");
        }
    }

    out
}
