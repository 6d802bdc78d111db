//! State shared between the UI/host thread and the render thread.
//!
//! Each field is its own atomic, so the render thread reads without locking.
//! Writers to the view transform serialise on one writer lock: single-field
//! setters store only their own field, and read-modify-write updates (gestures,
//! whole-view replacement) hold the lock from the read to the store, so a
//! concurrent write is never overwritten with a stale value. Writers raise the
//! redraw flag with release ordering after storing; the render thread clears
//! it with acquire ordering before it snapshots the fields. A frame can still
//! mix fields from two back-to-back writes, but every write is followed by a
//! redraw request, so the last frame always sees the final state.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use viewstate::{
    clamp_iterations, clamp_position, clamp_scale, Hue, ViewTransform, DEFAULT_SUPER_SAMPLING,
};

use crate::geometry::FrameGeometry;

/// `f64` stored as its bit pattern.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub(crate) fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    pub(crate) fn store(&self, value: f64, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

#[derive(Debug)]
pub(crate) struct SharedState {
    position_x: AtomicF64,
    position_y: AtomicF64,
    scale: AtomicF64,
    iterations: AtomicU32,
    hue: AtomicU8,
    super_sampling: AtomicF64,
    frame_width: AtomicU32,
    frame_height: AtomicU32,
    density: AtomicF64,
    view_writer: Mutex<()>,
}

impl SharedState {
    pub(crate) fn new(view: ViewTransform, iterations: u32, hue: Hue) -> Self {
        Self {
            position_x: AtomicF64::new(view.position_x()),
            position_y: AtomicF64::new(view.position_y()),
            scale: AtomicF64::new(view.scale()),
            iterations: AtomicU32::new(clamp_iterations(iterations)),
            hue: AtomicU8::new(hue.index() as u8),
            super_sampling: AtomicF64::new(DEFAULT_SUPER_SAMPLING),
            frame_width: AtomicU32::new(1),
            frame_height: AtomicU32::new(1),
            density: AtomicF64::new(1.0),
            view_writer: Mutex::new(()),
        }
    }

    pub(crate) fn view(&self) -> ViewTransform {
        ViewTransform::new(
            self.position_x.load(Ordering::Relaxed),
            self.position_y.load(Ordering::Relaxed),
            self.scale.load(Ordering::Relaxed),
        )
    }

    fn lock_view(&self) -> MutexGuard<'_, ()> {
        self.view_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_view(&self, view: &ViewTransform) {
        self.position_x
            .store(view.position_x(), Ordering::Relaxed);
        self.position_y
            .store(view.position_y(), Ordering::Relaxed);
        self.scale.store(view.scale(), Ordering::Relaxed);
    }

    pub(crate) fn store_view(&self, view: &ViewTransform) {
        let _writer = self.lock_view();
        self.write_view(view);
    }

    /// Runs a read-modify-write of the whole view under the writer lock.
    pub(crate) fn update_view<R>(&self, update: impl FnOnce(&mut ViewTransform) -> R) -> R {
        let _writer = self.lock_view();
        let mut view = self.view();
        let result = update(&mut view);
        self.write_view(&view);
        result
    }

    pub(crate) fn set_position_x(&self, value: f64) {
        let _writer = self.lock_view();
        self.position_x
            .store(clamp_position(value), Ordering::Relaxed);
    }

    pub(crate) fn set_position_y(&self, value: f64) {
        let _writer = self.lock_view();
        self.position_y
            .store(clamp_position(value), Ordering::Relaxed);
    }

    pub(crate) fn set_scale(&self, value: f64) {
        let _writer = self.lock_view();
        self.scale.store(clamp_scale(value), Ordering::Relaxed);
    }

    pub(crate) fn iterations(&self) -> u32 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub(crate) fn set_iterations(&self, value: u32) {
        self.iterations
            .store(clamp_iterations(value), Ordering::Relaxed);
    }

    pub(crate) fn hue(&self) -> Hue {
        Hue::from_index(usize::from(self.hue.load(Ordering::Relaxed))).unwrap_or_default()
    }

    pub(crate) fn set_hue(&self, hue: Hue) {
        self.hue.store(hue.index() as u8, Ordering::Relaxed);
    }

    /// Stores an already validated super-sampling factor.
    pub(crate) fn store_super_sampling(&self, value: f64) {
        self.super_sampling.store(value, Ordering::Relaxed);
    }

    pub(crate) fn set_frame_size(&self, width: u32, height: u32) {
        self.frame_width.store(width, Ordering::Relaxed);
        self.frame_height.store(height, Ordering::Relaxed);
    }

    pub(crate) fn set_density(&self, density: f64) {
        self.density
            .store(crate::geometry::sanitize_density(density), Ordering::Relaxed);
    }

    pub(crate) fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(
            self.frame_width.load(Ordering::Relaxed),
            self.frame_height.load(Ordering::Relaxed),
            self.density.load(Ordering::Relaxed),
        )
        .with_super_sampling(self.super_sampling.load(Ordering::Relaxed))
    }
}

/// Something that can wake the render loop, usually the window.
pub trait RedrawRequester: Send + Sync {
    fn request_redraw(&self);
}

impl<F> RedrawRequester for F
where
    F: Fn() + Send + Sync,
{
    fn request_redraw(&self) {
        self()
    }
}

/// Render-when-dirty flag. Repeated requests before the next frame collapse
/// into a single wake-up.
#[derive(Default)]
pub(crate) struct RedrawSignal {
    pending: AtomicBool,
    requester: RwLock<Option<Arc<dyn RedrawRequester>>>,
}

impl RedrawSignal {
    pub(crate) fn request(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let requester = self
            .requester
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(requester) = requester.as_ref() {
            requester.request_redraw();
        }
    }

    /// Clears the flag, returning whether a frame had been requested.
    pub(crate) fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn install(&self, requester: Arc<dyn RedrawRequester>) {
        let mut slot = self
            .requester
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.pending.load(Ordering::Acquire) {
            requester.request_redraw();
        }
        *slot = Some(requester);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_signal() -> (RedrawSignal, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let signal = RedrawSignal::default();
        let counter = Arc::clone(&count);
        signal.install(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        (signal, count)
    }

    #[test]
    fn atomic_f64_preserves_bits() {
        let value = AtomicF64::new(-0.743643887037151);
        assert_eq!(value.load(Ordering::Relaxed), -0.743643887037151);
        value.store(f64::MIN_POSITIVE, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), f64::MIN_POSITIVE);
    }

    #[test]
    fn redraw_requests_collapse_until_taken() {
        let (signal, count) = counting_signal();
        signal.request();
        signal.request();
        signal.request();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(signal.take());
        assert!(!signal.take());
        signal.request();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn request_before_install_is_delivered() {
        let signal = RedrawSignal::default();
        signal.request();
        assert!(signal.is_pending());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        signal.install(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_state_clamps_writes() {
        let shared = SharedState::new(ViewTransform::default(), 500, Hue::Ice);
        assert_eq!(shared.iterations(), 200);
        assert_eq!(shared.hue(), Hue::Ice);

        shared.store_view(&ViewTransform::new(5.0, -0.5, 10.0));
        let view = shared.view();
        assert_eq!(view.position_x(), 3.0);
        assert_eq!(view.position_y(), -0.5);
        assert_eq!(view.scale(), 75.0);
    }

    #[test]
    fn single_field_setters_leave_other_fields_alone() {
        let shared = SharedState::new(ViewTransform::new(0.5, -0.5, 300.0), 50, Hue::Fire);
        shared.set_scale(1e9);
        shared.set_position_x(-7.0);
        let view = shared.view();
        assert_eq!(view.position_x(), -3.0);
        assert_eq!(view.position_y(), -0.5);
        assert_eq!(view.scale(), 1e8);
    }

    #[test]
    fn concurrent_updates_do_not_lose_increments() {
        let shared = Arc::new(SharedState::new(
            ViewTransform::new(0.0, 0.0, 100.0),
            50,
            Hue::Fire,
        ));
        let rounds = 2_000;
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..rounds {
                        shared.update_view(|view| view.set_scale(view.scale() + 1.0));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(shared.view().scale(), 100.0 + 4.0 * rounds as f64);
    }

    #[test]
    fn geometry_reflects_frame_density_and_super_sampling() {
        let shared = SharedState::new(ViewTransform::default(), 50, Hue::Fire);
        shared.set_frame_size(1000, 500);
        shared.set_density(2.0);
        shared.store_super_sampling(1.0);
        let geometry = shared.geometry();
        assert_eq!(geometry.logical_size(), (500.0, 250.0));
        assert_eq!(geometry.render_buffer_size(), (500, 250));
    }
}
