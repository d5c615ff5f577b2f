//! Choosing which templates of a chart to search.

use std::path::Path;

use tpl::{Chart, Template};
use tracing::{debug, warn};

use crate::diagnostics;
use crate::error::BisectError;

/// Why a set of templates was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetReason {
    /// The user named the file.
    Requested(String),
    /// Helm's diagnostic named the file.
    Diagnostic(String),
    /// Every non-helper template. `missing` holds the file Helm named when it
    /// is not among the loaded templates.
    AllTemplates { missing: Option<String> },
}

#[derive(Debug, Clone)]
pub struct TargetSelection<'c> {
    pub templates: Vec<&'c Template>,
    pub reason: TargetReason,
}

/// Pick the templates to search, in chart order.
///
/// A file requested by name wins; otherwise the file named by the full
/// render's diagnostic; otherwise every template that is not a helper
/// (helpers are files whose name starts with `_`).
pub fn select_targets<'c>(
    chart: &'c Chart,
    diagnostic: &str,
    requested: Option<&str>,
) -> Result<TargetSelection<'c>, BisectError> {
    if let Some(name) = requested {
        let templates = chart.find_by_name(name);
        if templates.is_empty() {
            return Err(BisectError::TemplateNotFound(name.to_string()));
        }
        return Ok(TargetSelection {
            templates,
            reason: TargetReason::Requested(name.to_string()),
        });
    }

    let named = diagnostics::failing_file(diagnostic);
    if let Some(file) = &named {
        let templates: Vec<&Template> = chart
            .templates
            .iter()
            .filter(|t| names_template(t, file))
            .collect();
        if !templates.is_empty() {
            debug!(file = %file, "targeting file named by helm");
            return Ok(TargetSelection {
                templates,
                reason: TargetReason::Diagnostic(file.clone()),
            });
        }
        warn!(file = %file, "helm named a template that is not in the chart");
    }

    Ok(TargetSelection {
        templates: chart
            .templates
            .iter()
            .filter(|t| !t.file_name().starts_with('_'))
            .collect(),
        reason: TargetReason::AllTemplates { missing: named },
    })
}

/// Whether `file` (as printed by Helm, relative to `templates/`) refers to
/// `template`.
fn names_template(template: &Template, file: &str) -> bool {
    template.file_name() == file || template.relative_path == Path::new("templates").join(file)
}
