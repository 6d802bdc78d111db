use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};
use viewstate::{ViewTransform, MAX_ITERATIONS};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::capture::{timestamped_file_name, CaptureTicket};
use crate::gesture::GestureEvent;
use crate::gpu::{GpuState, RendererPhase};
use crate::input::{action_for_key, wheel_zoom_factor, DragTracker, KeyAction, TouchTracker};
use crate::types::RendererConfig;
use crate::viewer::Viewer;

/// Commands other threads can send to the window loop.
#[derive(Debug, Clone)]
pub enum HostCommand {
    Quit,
}

/// Handle given to helpers (such as a stdin console) that outlive start-up.
#[derive(Clone)]
pub struct HostHandle {
    proxy: EventLoopProxy<HostCommand>,
}

impl HostHandle {
    /// Asks the window loop to exit. Returns `false` if it already has.
    pub fn quit(&self) -> bool {
        self.proxy.send_event(HostCommand::Quit).is_ok()
    }
}

pub(crate) type StartHook = Box<dyn FnOnce(HostHandle)>;

/// Window-side state: the GPU, pointer trackers and outstanding captures.
struct WindowHost {
    window: Arc<Window>,
    gpu: Option<GpuState>,
    viewer: Viewer,
    drag: DragTracker,
    touches: TouchTracker,
    density_override: Option<f64>,
    capture_dir: PathBuf,
    captures: Vec<CaptureTicket>,
    export: Option<ExportState>,
}

struct ExportState {
    path: PathBuf,
    ticket: Option<CaptureTicket>,
}

enum ExportStatus {
    Pending,
    Done,
    Failed(String),
}

impl WindowHost {
    fn new(window: Arc<Window>, config: &RendererConfig, viewer: Viewer) -> Result<Self> {
        let gpu = GpuState::new(
            window.as_ref(),
            window.inner_size(),
            config.assets.as_ref(),
            viewer.active_hue(),
            config.gpu_power,
            Arc::clone(&config.sink),
        )?;
        let profile = gpu.adapter_profile();
        if profile.is_software() {
            warn!(adapter = %profile.name, "software rasterizer detected; deep zooms will be slow");
        }

        Ok(Self {
            window,
            gpu: Some(gpu),
            viewer,
            drag: DragTracker::default(),
            touches: TouchTracker::default(),
            density_override: config.density_override,
            capture_dir: config.capture_dir.clone(),
            captures: Vec::new(),
            export: config.export.clone().map(|path| ExportState { path, ticket: None }),
        })
    }

    fn phase(&self) -> RendererPhase {
        self.gpu
            .as_ref()
            .map_or(RendererPhase::Uninitialized, GpuState::phase)
    }

    fn density(&self) -> f64 {
        self.viewer.geometry().density()
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(size);
        }
        self.viewer.update_frame_size(size.width, size.height);
        self.viewer.request_render();
    }

    fn gesture(&self, event: GestureEvent) {
        self.viewer.handle_gesture(event);
    }

    fn apply_key(&mut self, action: KeyAction, elwt: &EventLoopWindowTarget<HostCommand>) {
        let viewer = &self.viewer;
        match action {
            KeyAction::SelectHue(hue) => {
                viewer.set_active_hue(hue);
                info!(%hue, "palette selected");
            }
            KeyAction::AdjustIterations(delta) => {
                let next = (i64::from(viewer.iterations()) + i64::from(delta))
                    .clamp(0, i64::from(MAX_ITERATIONS));
                viewer.set_iterations(next as u32);
                info!(iterations = viewer.iterations(), "iterations changed");
            }
            KeyAction::AdjustSuperSampling(delta) => {
                match viewer.set_super_sampling(viewer.super_sampling() + delta) {
                    Ok(factor) => info!(factor, "super-sampling changed"),
                    Err(err) => debug!(error = %err, "super-sampling unchanged"),
                }
            }
            KeyAction::Capture => {
                let path = self
                    .capture_dir
                    .join(timestamped_file_name(chrono::Local::now()));
                info!(path = %path.display(), "capturing next frame");
                self.captures.push(viewer.capture_frame(Some(path)));
            }
            KeyAction::ResetView => viewer.set_view(ViewTransform::default()),
            KeyAction::Quit => {
                elwt.exit();
                return;
            }
        }
        self.viewer.request_render();
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<HostCommand>) -> Option<ExportStatus> {
        let gpu = self.gpu.as_mut()?;
        match gpu.draw_frame(&self.viewer) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure_surface();
                self.viewer.request_render();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting viewer");
                elwt.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                self.viewer.request_render();
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
                self.viewer.request_render();
            }
        }

        self.captures.retain(|ticket| match ticket.try_take() {
            None => true,
            Some(Ok(output)) => {
                if let Some(path) = &output.path {
                    info!(path = %path.display(), width = output.width, height = output.height, "capture saved");
                }
                false
            }
            Some(Err(err)) => {
                error!(error = %err, "capture failed");
                false
            }
        });

        self.poll_export()
    }

    fn poll_export(&mut self) -> Option<ExportStatus> {
        let ready = self.phase() == RendererPhase::Ready;
        let export = self.export.as_mut()?;
        if !ready {
            return Some(ExportStatus::Pending);
        }
        if export.ticket.is_none() {
            export.ticket = Some(self.viewer.capture_frame(Some(export.path.clone())));
            return Some(ExportStatus::Pending);
        }
        let ticket = export.ticket.as_ref()?;
        Some(match ticket.try_take() {
            None => ExportStatus::Pending,
            Some(Ok(_)) => {
                info!(path = %export.path.display(), "still frame exported");
                ExportStatus::Done
            }
            Some(Err(err)) => ExportStatus::Failed(err.to_string()),
        })
    }
}

pub(crate) fn run(config: RendererConfig, viewer: Viewer, on_start: Option<StartHook>) -> Result<()> {
    let event_loop = EventLoopBuilder::<HostCommand>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let window_size = PhysicalSize::new(config.window_size.0, config.window_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .with_visible(config.show_window)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create viewer window: {err}"))?;
    let window = Arc::new(window);

    viewer.set_density(config.density_override.unwrap_or_else(|| window.scale_factor()));
    let size = window.inner_size();
    viewer.update_frame_size(size.width, size.height);

    let mut host = WindowHost::new(Arc::clone(&window), &config, viewer.clone())
        .map_err(|err| anyhow!("failed to initialise renderer: {err:#}"))?;
    debug!(phase = ?host.phase(), "window host created");

    let requester = Arc::clone(&window);
    viewer.set_redraw_requester(Arc::new(move || requester.request_redraw()));
    if let Some(hook) = on_start {
        hook(HostHandle {
            proxy: event_loop.create_proxy(),
        });
    }
    viewer.request_render();

    let failure: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let loop_failure = Rc::clone(&failure);
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(HostCommand::Quit) => elwt.exit(),
        Event::WindowEvent { window_id, event } if window_id == host.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::Resized(new_size) => host.resize(new_size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if host.density_override.is_none() {
                    host.viewer.set_density(scale_factor);
                    host.viewer.request_render();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let Some(action) = action_for_key(&event.logical_key) {
                        host.apply_key(action, elwt);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => host.drag.set_pressed(button_state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                let density = host.density();
                if let Some(pan) = host.drag.cursor_moved((position.x, position.y), density) {
                    host.gesture(pan);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let focus = host.drag.cursor().unwrap_or_else(|| {
                    let size = host.window.inner_size();
                    (f64::from(size.width) * 0.5, f64::from(size.height) * 0.5)
                });
                host.gesture(GestureEvent::PinchUpdate {
                    focus_x: focus.0,
                    focus_y: focus.1,
                    scale_factor: wheel_zoom_factor(delta),
                });
            }
            WindowEvent::TouchpadMagnify { delta, .. } => {
                if let Some((x, y)) = host.drag.cursor() {
                    host.gesture(GestureEvent::PinchUpdate {
                        focus_x: x,
                        focus_y: y,
                        scale_factor: 1.0 + delta,
                    });
                }
            }
            WindowEvent::Touch(touch) => {
                let density = host.density();
                for gesture in host.touches.handle(
                    touch.id,
                    touch.phase,
                    (touch.location.x, touch.location.y),
                    density,
                ) {
                    host.gesture(gesture);
                }
            }
            WindowEvent::RedrawRequested => match host.redraw(elwt) {
                Some(ExportStatus::Done) => elwt.exit(),
                Some(ExportStatus::Failed(message)) => {
                    error!(%message, "still-frame export failed");
                    *loop_failure.borrow_mut() = Some(message);
                    elwt.exit();
                }
                Some(ExportStatus::Pending) | None => {}
            },
            _ => {}
        },
        Event::LoopExiting => {
            // Release the surface before the window goes away.
            host.gpu.take();
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    let message = failure.borrow_mut().take();
    match message {
        Some(message) => Err(anyhow!("failed to export still frame: {message}")),
        None => Ok(()),
    }
}
