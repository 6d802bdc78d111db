use viewstate::{clamp_super_sampling, DEFAULT_SUPER_SAMPLING};

/// Size bookkeeping for the visible frame and the off-screen render buffer.
///
/// The window reports its size in physical pixels. Plane mapping and gestures
/// work in logical units (physical / density), and the render buffer is the
/// logical size multiplied by the super-sampling factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    frame_width: u32,
    frame_height: u32,
    density: f64,
    super_sampling: f64,
}

impl FrameGeometry {
    pub fn new(frame_width: u32, frame_height: u32, density: f64) -> Self {
        Self {
            frame_width,
            frame_height,
            density: sanitize_density(density),
            super_sampling: DEFAULT_SUPER_SAMPLING,
        }
    }

    pub fn with_super_sampling(mut self, factor: f64) -> Self {
        if let Some(accepted) = clamp_super_sampling(factor) {
            self.super_sampling = accepted;
        }
        self
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn super_sampling(&self) -> f64 {
        self.super_sampling
    }

    pub fn logical_size(&self) -> (f64, f64) {
        (
            f64::from(self.frame_width) / self.density,
            f64::from(self.frame_height) / self.density,
        )
    }

    /// Render buffer size in texels, never smaller than 1×1.
    pub fn render_buffer_size(&self) -> (u32, u32) {
        let (width, height) = self.logical_size();
        (
            scaled_extent(width, self.super_sampling),
            scaled_extent(height, self.super_sampling),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.frame_width == 0 || self.frame_height == 0
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(1, 1, 1.0)
    }
}

pub(crate) fn sanitize_density(density: f64) -> f64 {
    if density.is_finite() && density > 0.0 {
        density
    } else {
        1.0
    }
}

fn scaled_extent(logical: f64, factor: f64) -> u32 {
    let scaled = (logical * factor).round();
    if scaled < 1.0 {
        1
    } else if scaled > f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_buffer_follows_density_and_super_sampling() {
        let geometry = FrameGeometry::new(1080, 2160, 2.0).with_super_sampling(2.0);
        assert_eq!(geometry.logical_size(), (540.0, 1080.0));
        assert_eq!(geometry.render_buffer_size(), (1080, 2160));

        let geometry = geometry.with_super_sampling(0.5);
        assert_eq!(geometry.render_buffer_size(), (270, 540));
    }

    #[test]
    fn rejected_super_sampling_keeps_previous_factor() {
        let geometry = FrameGeometry::new(800, 600, 1.0).with_super_sampling(1.5);
        let unchanged = geometry.with_super_sampling(4.0);
        assert_eq!(unchanged.super_sampling(), 1.5);
        assert_eq!(geometry.with_super_sampling(0.1).super_sampling(), 0.5);
    }

    #[test]
    fn degenerate_inputs_stay_usable() {
        let geometry = FrameGeometry::new(0, 0, f64::NAN);
        assert!(geometry.is_empty());
        assert_eq!(geometry.density(), 1.0);
        assert_eq!(geometry.render_buffer_size(), (1, 1));
    }
}
