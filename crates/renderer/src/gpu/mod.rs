//! GPU side of the viewer.
//!
//! - `context` owns the wgpu instance, device and window surface.
//! - `pipeline` builds the fractal program from its GLSL assets plus the
//!   pass that presents the render target.
//! - `palette` uploads the four colour ramps and tracks the active one.
//! - `uniforms` mirrors the `FractalParams` block.
//! - `target` and `readback` manage the off-screen render target and copy
//!   it back for captures.
//! - `diagnostics` wraps calls in validation error scopes.
//! - `state` ties it together as `GpuState::draw_frame`.

mod context;
pub(crate) mod diagnostics;
mod palette;
mod pipeline;
mod readback;
mod state;
mod target;
mod uniforms;

pub(crate) use state::{GpuState, RendererPhase};
