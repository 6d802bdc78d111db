use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use viewstate::{SavedView, StateSnapshot};

/// Reads the session saved by a previous run.
pub fn load(path: &Path) -> Result<SavedView> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file at {}", path.display()))?;
    let snapshot = StateSnapshot::from_toml_str(&contents)
        .with_context(|| format!("failed to parse state file at {}", path.display()))?;
    SavedView::restore(&snapshot)
        .with_context(|| format!("state file at {} holds an invalid view", path.display()))
}

pub fn load_if_present(path: &Path) -> Result<Option<SavedView>> {
    if path.exists() {
        load(path).map(Some)
    } else {
        Ok(None)
    }
}

pub fn render(view: &SavedView) -> Result<String> {
    view.snapshot()
        .to_toml_string()
        .context("failed to serialize state file to TOML")
}

pub fn persist(view: &SavedView, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("state path has no parent: {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "failed to prepare directory for state file at {}",
            dir.display()
        )
    })?;
    fs::write(path, render(view)?)
        .with_context(|| format!("failed to write state file to {}", path.display()))?;
    Ok(())
}

/// Deletes the state file. Returns `false` when there was nothing to delete.
pub fn reset(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove state file at {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use viewstate::{Hue, ViewTransform};

    #[test]
    fn persisted_view_loads_back() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("nested/state.toml");
        let view = SavedView {
            transform: ViewTransform::new(-0.7453, 0.1127, 65_000.0),
            hue: Hue::Ice,
            super_sampling: 1.25,
        };

        persist(&view, &path).unwrap();
        assert_eq!(load(&path).unwrap(), view);
        assert_eq!(load_if_present(&path).unwrap(), Some(view));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("state.toml");
        assert_eq!(load_if_present(&path).unwrap(), None);
        assert!(!reset(&path).unwrap());
    }

    #[test]
    fn reset_removes_the_file() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("state.toml");
        persist(&SavedView::default(), &path).unwrap();
        assert!(reset(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_reports_its_path() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("state.toml");
        fs::write(&path, "theme = \"plasma\"\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("plasma"));
        assert!(err.to_string().contains("state.toml"));
    }
}
