use std::sync::Arc;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, trace, warn};
use viewstate::Hue;
use winit::dpi::PhysicalSize;

use crate::assets::AssetLoader;
use crate::capture::{encode_capture, CaptureRequest, FileSink};
use crate::error::CaptureError;
use crate::tasks::{GpuTask, TaskQueue};
use crate::types::GpuPowerPreference;
use crate::viewer::Viewer;

use super::context::{AdapterProfile, GpuContext};
use super::diagnostics::FrameScope;
use super::palette::{self, PaletteTextureBank};
use super::pipeline::{FractalProgram, PresentPipeline};
use super::readback;
use super::target::{fit_to_limit, RenderTarget, RENDER_TARGET_FORMAT};
use super::uniforms::{FractalUniforms, QUAD_VERTICES};

/// Lifecycle of the renderer as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RendererPhase {
    /// No GPU context yet.
    Uninitialized,
    /// Shaders compiled and palettes uploaded, but no render target.
    ContextCreated,
    /// A render target matching the current geometry exists.
    Ready,
}

pub(crate) struct GpuState {
    context: GpuContext,
    program: FractalProgram,
    present: PresentPipeline,
    palettes: PaletteTextureBank,
    target: Option<RenderTarget>,
    phase: RendererPhase,
    sink: Arc<dyn FileSink>,
    frame_count: u64,
}

impl GpuState {
    /// Creates the device, compiles the fractal program and uploads every
    /// palette. Shader, binding and palette problems are fatal.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        assets: &dyn AssetLoader,
        initial_hue: Hue,
        gpu_power: GpuPowerPreference,
        sink: Arc<dyn FileSink>,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, gpu_power)?;
        let palette_layout = palette::bind_group_layout(&context.device);
        let program = FractalProgram::new(
            &context.device,
            assets,
            &palette_layout,
            RENDER_TARGET_FORMAT,
        )?;
        let palettes = PaletteTextureBank::load(
            &context.device,
            &context.queue,
            &palette_layout,
            assets,
            context.max_texture_dimension,
            initial_hue,
        )?;
        let present = PresentPipeline::new(&context.device, context.surface_format)?;
        debug!(vertices = QUAD_VERTICES.len(), hue = %initial_hue, "renderer context created");

        Ok(Self {
            context,
            program,
            present,
            palettes,
            target: None,
            phase: RendererPhase::ContextCreated,
            sink,
            frame_count: 0,
        })
    }

    pub(crate) fn phase(&self) -> RendererPhase {
        self.phase
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Resizes the window surface. The render target follows on the next frame.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure_surface(&mut self) {
        self.context.reconfigure();
    }

    /// (Re)creates the render target at render-buffer resolution.
    fn ensure_target(&mut self, requested: (u32, u32)) {
        let size = fit_to_limit(requested, self.context.max_texture_dimension);
        if self.target.as_ref().map(RenderTarget::size) == Some(size) {
            return;
        }
        if size != requested {
            warn!(
                ?requested,
                ?size,
                "render buffer exceeds the GPU texture limit; shrinking"
            );
        }
        let device = &self.context.device;
        let present = &self.present;
        self.target = Some(RenderTarget::new(device, size.0, size.1, |view| {
            present.bind_target(device, view)
        }));
        if self.phase != RendererPhase::Ready {
            debug!("renderer ready");
        }
        self.phase = RendererPhase::Ready;
        debug!(width = size.0, height = size.1, "render target resized");
    }

    /// Draws one frame.
    ///
    /// Order: run queued GPU tasks, match the render target to the current
    /// geometry, draw the fractal, serve captures from the finished draw, then
    /// present.
    pub(crate) fn draw_frame(&mut self, viewer: &Viewer) -> Result<(), wgpu::SurfaceError> {
        let inputs = viewer.begin_frame();
        let palettes = &mut self.palettes;
        let captures = run_tasks(viewer.tasks(), |hue| palettes.bind(hue));

        if inputs.geometry.is_empty() {
            trace!("skipping frame for empty geometry");
            for request in captures {
                request.complete(Err(CaptureError::NotReady));
            }
            return Ok(());
        }
        self.ensure_target(inputs.geometry.render_buffer_size());

        let Some(target) = self.target.as_ref() else {
            debug!(phase = ?self.phase, "draw skipped before the renderer is ready");
            for request in captures {
                request.complete(Err(CaptureError::NotReady));
            }
            return Ok(());
        };

        let device = &self.context.device;
        let queue = &self.context.queue;
        let uniforms = FractalUniforms::new(
            &inputs.view,
            inputs.geometry.logical_size(),
            inputs.iterations,
        );

        let scope = FrameScope::enter(device);
        self.program.write_uniforms(queue, &uniforms);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fractal encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fractal pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.program.pipeline);
            pass.set_bind_group(0, &self.program.uniform_bind_group, &[]);
            pass.set_bind_group(1, self.palettes.active_bind_group(), &[]);
            pass.set_vertex_buffer(0, self.program.vertex_buffer.slice(..));
            pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        scope.check("fractal pass");

        for request in captures {
            let result = readback::read_target(device, queue, target)
                .and_then(|frame| encode_capture(frame, request.destination(), self.sink.as_ref()));
            if let Err(err) = &result {
                warn!(error = %err, "frame capture failed");
            }
            request.complete(result);
        }

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let scope = FrameScope::enter(device);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("present encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.present.pipeline);
            pass.set_bind_group(0, &target.present_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        scope.check("present pass");
        frame.present();

        self.frame_count += 1;
        trace!(
            frame = self.frame_count,
            hue = %self.palettes.active(),
            iterations = inputs.iterations,
            scale = inputs.view.scale(),
            "frame presented"
        );
        Ok(())
    }
}

/// Drains the task queue. Palette binds run immediately in queue order;
/// capture requests are handed back to be served once the frame is drawn.
fn run_tasks(tasks: &TaskQueue, mut bind_palette: impl FnMut(Hue)) -> Vec<CaptureRequest> {
    let mut captures = Vec::new();
    let executed = tasks.drain(|task| match task {
        GpuTask::BindPalette(hue) => bind_palette(hue),
        GpuTask::Capture(request) => captures.push(request),
    });
    if executed > 0 {
        trace!(executed, "ran queued GPU tasks");
    }
    captures
}
