use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::assets::AssetLoader;
use crate::capture::{FileSink, FsSink};

/// Adapter preference passed to wgpu when picking a GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the CLI flags and config file of the viewer binary.
#[derive(Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub window_size: (u32, u32),
    pub title: String,
    /// Replaces the scale factor reported by the window system.
    pub density_override: Option<f64>,
    pub gpu_power: GpuPowerPreference,
    /// Directory that interactive captures are written to.
    pub capture_dir: PathBuf,
    /// When set, render until one frame has been written here, then exit.
    pub export: Option<PathBuf>,
    /// Hidden windows are useful together with `export`.
    pub show_window: bool,
    /// Source of the fractal shaders and palette ramps.
    pub assets: Arc<dyn AssetLoader>,
    pub sink: Arc<dyn FileSink>,
}

impl RendererConfig {
    pub fn new(assets: Arc<dyn AssetLoader>) -> Self {
        Self {
            window_size: (1280, 800),
            title: "MandelGL".to_string(),
            density_override: None,
            gpu_power: GpuPowerPreference::default(),
            capture_dir: PathBuf::from("."),
            export: None,
            show_window: true,
            assets,
            sink: Arc::new(FsSink),
        }
    }
}

impl fmt::Debug for RendererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererConfig")
            .field("window_size", &self.window_size)
            .field("title", &self.title)
            .field("density_override", &self.density_override)
            .field("gpu_power", &self.gpu_power)
            .field("capture_dir", &self.capture_dir)
            .field("export", &self.export)
            .field("show_window", &self.show_window)
            .finish_non_exhaustive()
    }
}
