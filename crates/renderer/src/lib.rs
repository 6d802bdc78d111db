//! Renderer crate for MandelGL, an interactive Mandelbrot viewer.
//!
//! The fractal is drawn by a GLSL fragment shader into an off-screen render
//! target whose resolution is the window's logical size times the
//! super-sampling factor, then stretched onto the window surface:
//!
//! ```text
//!   host (winit loop, console) ──▶ Viewer ──▶ shared atomics + task queue
//!                                                   │
//!   RedrawRequested ──▶ GpuState::draw_frame ◀──────┘
//!        drain tasks ─▶ write FractalParams ─▶ fractal pass ─▶ captures ─▶ present
//! ```
//!
//! [`Viewer`] is the thread-safe handle the rest of the program talks to.
//! Palette switches and captures need the GPU, so they are queued as
//! [`GpuTask`]s and executed by the render thread at the start of the next
//! frame. Frames are only drawn when something asked for one.

use anyhow::Result;

mod assets;
mod capture;
mod compile;
mod error;
mod geometry;
mod gesture;
mod gpu;
mod input;
mod shared;
mod tasks;
mod types;
mod viewer;
mod window;

pub use assets::{
    AssetLoader, DirectoryAssets, MemoryAssets, FRAGMENT_SHADER_ASSET, VERTEX_SHADER_ASSET,
};
pub use capture::{
    encode_capture, encode_png, timestamped_file_name, CaptureOutput, CaptureRequest,
    CaptureResult, CaptureTicket, ChannelOrder, FileSink, FsSink, ReadbackFrame, RowOrder,
};
pub use error::{AssetError, CaptureError, RendererError};
pub use geometry::FrameGeometry;
pub use gesture::{pan, pinch, plane_point, GestureController, GestureEvent};
pub use input::{action_for_key, wheel_zoom_factor, KeyAction};
pub use shared::RedrawRequester;
pub use tasks::{GpuTask, TaskQueue};
pub use types::{GpuPowerPreference, RendererConfig};
pub use viewer::{palette_command, Viewer};
pub use window::{HostCommand, HostHandle};

/// Entry point that owns the window loop until the viewer exits.
pub struct Renderer {
    config: RendererConfig,
    viewer: Viewer,
}

impl Renderer {
    pub fn new(config: RendererConfig, viewer: Viewer) -> Self {
        Self { config, viewer }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Opens the window and blocks until it is closed.
    pub fn run(self) -> Result<()> {
        window::run(self.config, self.viewer, None)
    }

    /// Like [`Renderer::run`], handing `on_start` a [`HostHandle`] once the
    /// window and GPU are up.
    pub fn run_with(self, on_start: impl FnOnce(HostHandle) + 'static) -> Result<()> {
        window::run(self.config, self.viewer, Some(Box::new(on_start)))
    }
}
