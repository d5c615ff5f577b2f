use std::io;
use std::path::PathBuf;

/// Errors raised while locating or loading a chart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("chart path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("chart path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no Chart.yaml found in: {}", .0.display())]
    MissingChartYaml(PathBuf),

    #[error("no templates directory found in: {}", .0.display())]
    MissingTemplates(PathBuf),

    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
