//! Thread-safe handle through which hosts drive the renderer.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use viewstate::{clamp_super_sampling, Hue, SavedView, StateError, ViewTransform};

use crate::capture::{CaptureRequest, CaptureTicket};
use crate::geometry::FrameGeometry;
use crate::gesture::{GestureController, GestureEvent};
use crate::shared::{RedrawRequester, RedrawSignal, SharedState};
use crate::tasks::{GpuTask, TaskQueue};

/// Everything the render thread needs to draw one frame, read in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameInputs {
    pub view: ViewTransform,
    pub iterations: u32,
    pub geometry: FrameGeometry,
}

/// Cloneable handle shared by the window loop, the console and the renderer.
///
/// Property writers may run on any thread. Writes to the view are serialised,
/// so a gesture never undoes a concurrent `set_*` or the other way round.
/// Setters only store values; call
/// [`Viewer::request_render`] afterwards to schedule a frame. Changes that
/// need the GPU (palette switches, captures) are queued as [`GpuTask`]s and
/// run on the render thread before the next draw.
#[derive(Clone)]
pub struct Viewer {
    shared: Arc<SharedState>,
    tasks: TaskQueue,
    redraw: Arc<RedrawSignal>,
    gestures: Arc<Mutex<GestureController>>,
}

impl Viewer {
    pub fn new(saved: SavedView, iterations: u32) -> Self {
        let shared = SharedState::new(saved.transform, iterations, saved.hue);
        shared.store_super_sampling(saved.super_sampling);
        Self {
            shared: Arc::new(shared),
            tasks: TaskQueue::new(),
            redraw: Arc::new(RedrawSignal::default()),
            gestures: Arc::new(Mutex::new(GestureController::new())),
        }
    }

    pub fn position_x(&self) -> f64 {
        self.shared.view().position_x()
    }

    pub fn set_position_x(&self, value: f64) {
        self.shared.set_position_x(value);
    }

    pub fn position_y(&self) -> f64 {
        self.shared.view().position_y()
    }

    pub fn set_position_y(&self, value: f64) {
        self.shared.set_position_y(value);
    }

    pub fn scale(&self) -> f64 {
        self.shared.view().scale()
    }

    pub fn set_scale(&self, value: f64) {
        self.shared.set_scale(value);
    }

    pub fn view(&self) -> ViewTransform {
        self.shared.view()
    }

    pub fn set_view(&self, view: ViewTransform) {
        self.shared.store_view(&view);
    }

    pub fn iterations(&self) -> u32 {
        self.shared.iterations()
    }

    pub fn set_iterations(&self, value: u32) {
        self.shared.set_iterations(value);
    }

    pub fn active_hue(&self) -> Hue {
        self.shared.hue()
    }

    /// Records the new palette and queues the texture bind for the render
    /// thread.
    pub fn set_active_hue(&self, hue: Hue) {
        self.shared.set_hue(hue);
        self.tasks.enqueue(palette_command(hue));
    }

    pub fn super_sampling(&self) -> f64 {
        self.shared.geometry().super_sampling()
    }

    /// Changes the render-buffer resolution factor and schedules a frame.
    ///
    /// Factors below 0.5 are raised to 0.5; factors above 3.0 (or NaN) are
    /// rejected and leave the current factor in place.
    pub fn set_super_sampling(&self, value: f64) -> Result<f64, StateError> {
        let accepted =
            clamp_super_sampling(value).ok_or(StateError::SuperSamplingOutOfRange(value))?;
        self.shared.store_super_sampling(accepted);
        tracing::debug!(factor = accepted, "super-sampling changed");
        self.request_render();
        Ok(accepted)
    }

    /// Reports the visible frame size in physical pixels.
    pub fn update_frame_size(&self, width: u32, height: u32) {
        self.shared.set_frame_size(width, height);
    }

    pub fn set_density(&self, density: f64) {
        self.shared.set_density(density);
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.shared.geometry()
    }

    /// Marks the view dirty; at most one frame is pending at a time.
    pub fn request_render(&self) {
        self.redraw.request();
    }

    pub fn enqueue_task(&self, task: GpuTask) {
        self.tasks.enqueue(task);
    }

    /// Queues a capture of the next frame and schedules that frame.
    pub fn capture_frame(&self, destination: Option<PathBuf>) -> CaptureTicket {
        let (request, ticket) = CaptureRequest::new(destination);
        self.tasks.enqueue(GpuTask::Capture(request));
        self.request_render();
        ticket
    }

    /// Applies a gesture and schedules a frame when the view moved.
    pub fn handle_gesture(&self, event: GestureEvent) -> bool {
        let geometry = self.shared.geometry();
        let mut gestures = self
            .gestures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let changed = self.shared.update_view(|view| {
            gestures.apply(view, geometry.logical_size(), geometry.density(), event)
        });
        drop(gestures);
        if changed {
            self.request_render();
        }
        changed
    }

    pub fn saved_view(&self) -> SavedView {
        SavedView {
            transform: self.view(),
            hue: self.active_hue(),
            super_sampling: self.super_sampling(),
        }
    }

    /// Restores a saved session and schedules a frame.
    pub fn restore(&self, saved: &SavedView) {
        self.set_view(saved.transform);
        if self.active_hue() != saved.hue {
            self.set_active_hue(saved.hue);
        }
        if let Some(accepted) = clamp_super_sampling(saved.super_sampling) {
            self.shared.store_super_sampling(accepted);
        }
        self.request_render();
    }

    /// Installs the callback that wakes the render loop.
    pub fn set_redraw_requester(&self, requester: Arc<dyn RedrawRequester>) {
        self.redraw.install(requester);
    }

    pub(crate) fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Clears the pending-frame flag and snapshots the inputs for the frame.
    pub(crate) fn begin_frame(&self) -> FrameInputs {
        self.redraw.take();
        FrameInputs {
            view: self.shared.view(),
            iterations: self.shared.iterations(),
            geometry: self.shared.geometry(),
        }
    }

    #[cfg(test)]
    pub(crate) fn render_pending(&self) -> bool {
        self.redraw.is_pending()
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(SavedView::default(), viewstate::DEFAULT_ITERATIONS)
    }
}

/// The deferred action that switches the active palette texture.
pub fn palette_command(hue: Hue) -> GpuTask {
    GpuTask::BindPalette(hue)
}
