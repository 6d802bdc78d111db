use anyhow::{Context, Result};
use renderer::{Renderer, Viewer};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{initial_iterations, initial_view, load_config, renderer_config};
use crate::cli::RunArgs;
use crate::console;
use crate::paths::AppPaths;
use crate::state;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        "resolved mandelgl paths"
    );

    let config = load_config(args.config.as_deref(), &paths)?;
    let state_file = paths.state_file();
    let persisted = if args.fresh {
        None
    } else {
        match state::load_if_present(&state_file) {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable saved state");
                None
            }
        }
    };

    let saved = initial_view(&args, &config, persisted);
    let iterations = initial_iterations(&args, &config);
    tracing::info!(
        x = saved.transform.position_x(),
        y = saved.transform.position_y(),
        scale = saved.transform.scale(),
        hue = %saved.hue,
        iterations,
        super_sampling = saved.super_sampling,
        "starting viewer"
    );

    let viewer = Viewer::new(saved, iterations);
    let renderer_config = renderer_config(&args, &config, &paths);
    let exporting = renderer_config.export.is_some();
    let capture_dir = renderer_config.capture_dir.clone();
    let renderer = Renderer::new(renderer_config, viewer.clone());

    if args.console {
        let console_viewer = viewer.clone();
        renderer.run_with(move |host| {
            if let Err(err) = console::spawn(console_viewer, host, capture_dir) {
                tracing::warn!(error = %err, "failed to start console thread");
            }
        })?;
    } else {
        renderer.run()?;
    }

    if exporting {
        return Ok(());
    }
    state::persist(&viewer.saved_view(), &state_file)
        .context("failed to save the viewing session")?;
    tracing::info!(path = %state_file.display(), "saved viewing session");
    Ok(())
}
