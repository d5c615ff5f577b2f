use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use bisect::{HelmOptions, SearchMode};

/// File looked up in the chart directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "helm-bisect.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    Binary,
    Step,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Binary => SearchMode::Binary,
            ModeArg::Step => SearchMode::Step,
        }
    }
}

/// Settings read from a `helm-bisect.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub release_name: Option<String>,

    /// Values files, relative to the config file.
    #[serde(default)]
    pub values: Vec<PathBuf>,

    /// `key=value` overrides.
    #[serde(default)]
    pub set: Vec<String>,

    #[serde(default)]
    pub helm_path: Option<PathBuf>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub mode: Option<ModeArg>,

    /// Extra arguments appended to every `helm template` call.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Parse a config file. Relative paths inside it are resolved against the
/// file's directory.
pub fn load(path: &Path) -> Result<FileConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
    let mut config: FileConfig = toml::from_str(&content)
        .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;

    let base = path.parent().unwrap_or(Path::new("."));
    config.values = config
        .values
        .into_iter()
        .map(|p| if p.is_relative() { base.join(p) } else { p })
        .collect();
    config.helm_path = config
        .helm_path
        .map(|p| if p.is_relative() { base.join(p) } else { p });
    Ok(config)
}

/// Load the explicit config file, or the one in the chart directory if it
/// exists.
pub fn discover(chart: &Path, explicit: Option<&Path>) -> Result<FileConfig, String> {
    if let Some(path) = explicit {
        return load(path);
    }
    let candidate = chart.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        load(&candidate)
    } else {
        Ok(FileConfig::default())
    }
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub release_name: Option<String>,
    pub values: Vec<PathBuf>,
    pub set: Vec<String>,
    pub helm_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub mode: Option<ModeArg>,
}

/// Everything a debugging session needs, after merging.
#[derive(Debug)]
pub struct Settings {
    pub helm_path: Option<PathBuf>,
    pub mode: SearchMode,
    pub helm: HelmOptions,
}

impl Settings {
    /// Command-line values win over the file; lists are concatenated with
    /// the file's entries first.
    pub fn merge(file: FileConfig, cli: Overrides) -> Self {
        let defaults = HelmOptions::default();

        let mut values_files = file.values;
        values_files.extend(cli.values);
        let mut set_values = file.set;
        set_values.extend(cli.set);

        Settings {
            helm_path: cli.helm_path.or(file.helm_path),
            mode: cli.mode.or(file.mode).map(SearchMode::from).unwrap_or_default(),
            helm: HelmOptions {
                release_name: cli
                    .release_name
                    .or(file.release_name)
                    .unwrap_or(defaults.release_name),
                values_files,
                set_values,
                extra_args: file.extra_args,
                timeout: cli
                    .timeout_secs
                    .or(file.timeout_secs)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
            },
        }
    }
}
