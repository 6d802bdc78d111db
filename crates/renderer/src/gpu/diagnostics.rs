//! Error-scope helpers around wgpu calls.
//!
//! Shader and pipeline creation is always checked because a failure there is
//! fatal. Per-frame work is only checked in debug builds, where every draw is
//! wrapped in a validation scope and failures are logged with the name of the
//! call that produced them.

pub(crate) fn install_error_logger(device: &wgpu::Device) {
    device.on_uncaptured_error(Box::new(|error| {
        tracing::error!(%error, "uncaptured GPU error");
    }));
}

/// Runs `f` inside a validation error scope and reports the first error.
pub(crate) fn validated<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> T,
) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let error = pollster::block_on(device.pop_error_scope());
    (value, error)
}

/// Debug-build validation scope for per-frame calls.
pub(crate) struct FrameScope<'a> {
    device: &'a wgpu::Device,
    open: bool,
}

impl<'a> FrameScope<'a> {
    pub(crate) fn enter(device: &'a wgpu::Device) -> Self {
        let open = cfg!(debug_assertions);
        if open {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
        }
        Self { device, open }
    }

    /// Closes the scope, logging any error against `call`.
    pub(crate) fn check(mut self, call: &'static str) {
        if let Some(error) = self.pop() {
            tracing::error!(call, %error, "GPU validation error");
        }
    }

    fn pop(&mut self) -> Option<wgpu::Error> {
        if !self.open {
            return None;
        }
        self.open = false;
        pollster::block_on(self.device.pop_error_scope())
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        if let Some(error) = self.pop() {
            tracing::error!(%error, "GPU validation error in unchecked frame scope");
        }
    }
}
