use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// A throwaway copy of a chart in a temporary directory.
///
/// The copy is removed when the value is dropped, whichever way the probe
/// that owns it ends.
#[derive(Debug)]
pub struct ScratchChart {
    dir: TempDir,
    chart: PathBuf,
}

impl ScratchChart {
    /// Copy the chart at `original` into a fresh temporary directory.
    pub fn acquire(original: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("helm_debug_").tempdir()?;
        let chart = dir.path().join("chart");
        copy_tree(original, &chart)?;
        Ok(ScratchChart { dir, chart })
    }

    /// Root of the copied chart.
    pub fn path(&self) -> &Path {
        &self.chart
    }

    /// Replace the file at `relative` (relative to the chart root).
    pub fn overwrite(&self, relative: &Path, content: &str) -> io::Result<()> {
        let target = self.chart.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)
    }

    /// Remove the copy now and report any cleanup failure.
    pub fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Copy `from` into `to`, following symlinks. A linked directory that
/// leads back to one of its own ancestors is skipped.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut ancestors = vec![from.canonicalize()?];
    copy_dir(from, to, &mut ancestors)
}

fn copy_dir(from: &Path, to: &Path, ancestors: &mut Vec<PathBuf>) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let source = entry.path();
        let dest = to.join(entry.file_name());

        let file_type = entry.file_type()?;
        let is_dir = if file_type.is_symlink() {
            let Ok(meta) = fs::metadata(&source) else {
                debug!(path = %source.display(), "skipping dangling symlink");
                continue;
            };
            meta.is_dir()
        } else {
            file_type.is_dir()
        };

        if !is_dir {
            fs::copy(&source, &dest)?;
            continue;
        }

        let real = source.canonicalize()?;
        if ancestors.contains(&real) {
            debug!(path = %source.display(), "skipping symlink cycle");
            continue;
        }
        ancestors.push(real);
        let copied = copy_dir(&source, &dest, ancestors);
        ancestors.pop();
        copied?;
    }
    Ok(())
}
