mod error;

pub use error::ChartError;

use std::path::{Path, PathBuf};

use crate::Template;

const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "tpl"];

/// A Helm chart and its parsed templates.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Canonical chart directory.
    pub root: PathBuf,
    /// Templates that produced at least one unit, sorted by path.
    pub templates: Vec<Template>,
}

impl Chart {
    /// Validate `path` as a chart directory and parse every template in it.
    pub fn load(path: &Path) -> Result<Self, ChartError> {
        validate_chart_dir(path)?;
        let root = path.canonicalize().map_err(|source| ChartError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut templates = Vec::new();
        for file in template_files(&root) {
            let source = read_template(&file)?;
            let relative = file
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| file.clone());
            let template = Template::new(file, relative, source);
            if !template.units.is_empty() {
                templates.push(template);
            }
        }

        Ok(Chart { root, templates })
    }

    pub fn total_files(&self) -> usize {
        self.templates.len()
    }

    pub fn total_units(&self) -> usize {
        self.templates.iter().map(|t| t.units.len()).sum()
    }

    /// Templates whose bare file name equals `name`.
    pub fn find_by_name<'a>(&'a self, name: &str) -> Vec<&'a Template> {
        self.templates
            .iter()
            .filter(|t| t.file_name() == name)
            .collect()
    }
}

/// Check that `path` looks like a Helm chart: a directory with a
/// `Chart.yaml` (or `Chart.yml`) and a `templates/` directory.
pub fn validate_chart_dir(path: &Path) -> Result<(), ChartError> {
    if !path.exists() {
        return Err(ChartError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ChartError::NotADirectory(path.to_path_buf()));
    }
    if !path.join("Chart.yaml").exists() && !path.join("Chart.yml").exists() {
        return Err(ChartError::MissingChartYaml(path.to_path_buf()));
    }
    if !path.join("templates").exists() {
        return Err(ChartError::MissingTemplates(path.to_path_buf()));
    }
    Ok(())
}

/// All template files under `<chart>/templates`, recursively, sorted.
pub fn template_files(chart_root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_templates(&chart_root.join("templates"), &mut files);
    files.sort();
    files
}

fn collect_templates(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_templates(&path, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        {
            out.push(path);
        }
    }
}

/// Read a template as UTF-8 (BOM stripped), falling back to Latin-1 for
/// files that are not valid UTF-8.
pub fn read_template(path: &Path) -> Result<String, ChartError> {
    let bytes = std::fs::read(path).map_err(|source| ChartError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        }),
        Err(err) => Ok(err.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}
