use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use renderer::{DirectoryAssets, GpuPowerPreference, RendererConfig};
use viewstate::{SavedView, ViewTransform, ViewerConfig};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Reads the configuration file. An explicit path must exist; the default
/// location is optional.
pub fn load_config(explicit: Option<&Path>, paths: &AppPaths) -> Result<ViewerConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = paths.config_file();
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(ViewerConfig::default());
            }
            path
        }
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config = ViewerConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config file at {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Where the first frame looks. Command-line flags beat the saved session,
/// which beats the config file.
pub fn initial_view(
    args: &RunArgs,
    config: &ViewerConfig,
    persisted: Option<SavedView>,
) -> SavedView {
    let mut view = persisted.unwrap_or(SavedView {
        transform: ViewTransform::default(),
        hue: config.render.hue,
        super_sampling: config.render.super_sampling,
    });
    if let Some(hue) = args.hue {
        view.hue = hue;
    }
    if let Some(factor) = args.supersample {
        view.super_sampling = factor;
    }
    view
}

pub fn initial_iterations(args: &RunArgs, config: &ViewerConfig) -> u32 {
    args.iterations.unwrap_or(config.render.iterations)
}

pub fn renderer_config(args: &RunArgs, config: &ViewerConfig, paths: &AppPaths) -> RendererConfig {
    let explicit_assets = args.assets.as_deref().or(config.paths.assets.as_deref());
    let assets_dir = paths.resolve_assets(explicit_assets);
    tracing::debug!(assets = %assets_dir.display(), "resolved asset directory");

    let mut renderer = RendererConfig::new(Arc::new(DirectoryAssets::new(assets_dir)));
    renderer.window_size = args
        .size
        .map(|size| (size.width, size.height))
        .unwrap_or((config.window.width, config.window.height));
    renderer.title = config.window.title.clone();
    renderer.density_override = args.density.or(config.render.density);
    renderer.gpu_power = if args.low_power {
        GpuPowerPreference::Low
    } else {
        GpuPowerPreference::High
    };
    renderer.capture_dir = config
        .paths
        .captures
        .clone()
        .unwrap_or_else(|| paths.capture_dir());
    renderer.export = args.export.clone();
    renderer.show_window = !args.hidden;
    renderer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::cli::SurfaceSize;
    use tempfile::TempDir;
    use viewstate::Hue;

    fn temp_paths(root: &TempDir) -> AppPaths {
        AppPaths::from_raw(root.path().join("config"), root.path().join("data"))
    }

    #[test]
    fn missing_default_config_falls_back() {
        let root = TempDir::new().unwrap();
        let config = load_config(None, &temp_paths(&root)).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn explicit_config_must_exist() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope.toml");
        assert!(load_config(Some(&missing), &temp_paths(&root)).is_err());
    }

    #[test]
    fn default_config_location_is_read() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::write(paths.config_file(), "[render]\nhue = \"ash\"\niterations = 80\n").unwrap();

        let config = load_config(None, &paths).unwrap();
        assert_eq!(config.render.hue, Hue::Ash);
        assert_eq!(config.render.iterations, 80);
    }

    #[test]
    fn flags_override_session_and_config() {
        let mut config = ViewerConfig::default();
        config.render.hue = Hue::Ash;
        config.render.super_sampling = 1.0;

        let fresh = initial_view(&RunArgs::default(), &config, None);
        assert_eq!(fresh.hue, Hue::Ash);
        assert_eq!(fresh.super_sampling, 1.0);
        assert_eq!(fresh.transform, ViewTransform::default());

        let session = SavedView {
            transform: ViewTransform::new(-1.25, 0.0, 900.0),
            hue: Hue::Ice,
            super_sampling: 2.5,
        };
        let resumed = initial_view(&RunArgs::default(), &config, Some(session));
        assert_eq!(resumed, session);

        let args = RunArgs {
            hue: Some(Hue::Psychedelic),
            supersample: Some(0.75),
            ..RunArgs::default()
        };
        let overridden = initial_view(&args, &config, Some(session));
        assert_eq!(overridden.hue, Hue::Psychedelic);
        assert_eq!(overridden.super_sampling, 0.75);
        assert_eq!(overridden.transform, session.transform);
    }

    #[test]
    fn iterations_prefer_flag() {
        let mut config = ViewerConfig::default();
        config.render.iterations = 90;
        assert_eq!(initial_iterations(&RunArgs::default(), &config), 90);
        let args = RunArgs {
            iterations: Some(150),
            ..RunArgs::default()
        };
        assert_eq!(initial_iterations(&args, &config), 150);
    }

    #[test]
    fn renderer_config_merges_sources() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        let mut config = ViewerConfig::default();
        config.window.title = "Deep zoom".to_string();
        config.render.density = Some(1.5);
        config.paths.captures = Some(PathBuf::from("/tmp/shots"));

        let args = RunArgs {
            size: Some(SurfaceSize {
                width: 640,
                height: 480,
            }),
            export: Some(PathBuf::from("out.png")),
            hidden: true,
            low_power: true,
            ..RunArgs::default()
        };
        let renderer = renderer_config(&args, &config, &paths);
        assert_eq!(renderer.window_size, (640, 480));
        assert_eq!(renderer.title, "Deep zoom");
        assert_eq!(renderer.density_override, Some(1.5));
        assert_eq!(renderer.gpu_power, GpuPowerPreference::Low);
        assert_eq!(renderer.capture_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(renderer.export, Some(PathBuf::from("out.png")));
        assert!(!renderer.show_window);

        let defaults = renderer_config(&RunArgs::default(), &ViewerConfig::default(), &paths);
        assert_eq!(defaults.window_size, (1280, 800));
        assert_eq!(defaults.capture_dir, paths.capture_dir());
        assert!(defaults.show_window);
    }
}
