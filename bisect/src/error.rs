use tpl::ChartError;

/// Setup failures that stop a debugging session before any search runs.
///
/// Failures of individual renders are not errors: they come back as
/// [`crate::RenderResult`] values and drive the search.
#[derive(Debug, thiserror::Error)]
pub enum BisectError {
    #[error("helm executable not found; install Helm or pass --helm-path")]
    HelmNotFound,

    #[error("helm executable does not exist: {}", .0.display())]
    HelmPathInvalid(std::path::PathBuf),

    #[error("template file not found: {0}")]
    TemplateNotFound(String),

    #[error(transparent)]
    Chart(#[from] ChartError),
}
