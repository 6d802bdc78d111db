/// Lowest real/imaginary coordinate the viewport centre may reach.
pub const MIN_POSITION: f64 = -3.0;
/// Highest real/imaginary coordinate the viewport centre may reach.
pub const MAX_POSITION: f64 = 3.0;
/// Smallest zoom: render-buffer pixels per unit of the complex plane.
pub const MIN_SCALE: f64 = 75.0;
/// Largest zoom before double precision starts to band visibly.
pub const MAX_SCALE: f64 = 100_000_000.0;

/// Clamps a plane coordinate into `[MIN_POSITION, MAX_POSITION]`.
///
/// NaN collapses to the origin so a bad gesture can never poison the view.
pub fn clamp_position(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(MIN_POSITION, MAX_POSITION)
}

/// Clamps a zoom factor into `[MIN_SCALE, MAX_SCALE]`; NaN resets to `MIN_SCALE`.
pub fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_SCALE;
    }
    value.clamp(MIN_SCALE, MAX_SCALE)
}

/// Centre and zoom of the viewport on the Gaussian plane.
///
/// Every write goes through the clamp functions above, so a `ViewTransform`
/// is always inside its bounds regardless of how it was produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    position_x: f64,
    position_y: f64,
    scale: f64,
}

impl ViewTransform {
    pub fn new(position_x: f64, position_y: f64, scale: f64) -> Self {
        Self {
            position_x: clamp_position(position_x),
            position_y: clamp_position(position_y),
            scale: clamp_scale(scale),
        }
    }

    pub fn position_x(&self) -> f64 {
        self.position_x
    }

    pub fn position_y(&self) -> f64 {
        self.position_y
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_position_x(&mut self, value: f64) {
        self.position_x = clamp_position(value);
    }

    pub fn set_position_y(&mut self, value: f64) {
        self.position_y = clamp_position(value);
    }

    pub fn set_scale(&mut self, value: f64) {
        self.scale = clamp_scale(value);
    }

    /// Half of the visible plane extent for a view of `width`×`height` units.
    pub fn half_frame(&self, width: f64, height: f64) -> (f64, f64) {
        (0.5 * width / self.scale, 0.5 * height / self.scale)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            scale: MIN_SCALE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_clamp_stays_in_range() {
        for value in [-1e12, -3.5, -3.0, -0.25, 0.0, 2.999, 3.0, 7.0, f64::INFINITY] {
            let clamped = clamp_position(value);
            assert!((MIN_POSITION..=MAX_POSITION).contains(&clamped), "{value}");
        }
        assert_eq!(clamp_position(f64::NEG_INFINITY), MIN_POSITION);
        assert_eq!(clamp_position(f64::NAN), 0.0);
    }

    #[test]
    fn position_clamp_is_identity_inside_range() {
        for value in [-3.0, -1.75, -0.0001, 0.0, 0.5, 2.25, 3.0] {
            assert_eq!(clamp_position(value), value);
        }
    }

    #[test]
    fn scale_clamp_stays_in_range() {
        for value in [0.0, -10.0, 74.9, 75.0, 1234.5, 1e8, 1e9, f64::NAN] {
            let clamped = clamp_scale(value);
            assert!((MIN_SCALE..=MAX_SCALE).contains(&clamped), "{value}");
        }
        assert_eq!(clamp_scale(500.0), 500.0);
    }

    #[test]
    fn clamping_is_idempotent() {
        for value in [-8.0, -3.0, 0.3, 4.2] {
            assert_eq!(clamp_position(clamp_position(value)), clamp_position(value));
        }
        for value in [1.0, 80.0, 5e9] {
            assert_eq!(clamp_scale(clamp_scale(value)), clamp_scale(value));
        }
    }

    #[test]
    fn setters_clamp_every_write() {
        let mut view = ViewTransform::default();
        view.set_position_x(10.0);
        view.set_position_y(-10.0);
        view.set_scale(1.0);
        assert_eq!(view.position_x(), MAX_POSITION);
        assert_eq!(view.position_y(), MIN_POSITION);
        assert_eq!(view.scale(), MIN_SCALE);

        let built = ViewTransform::new(-0.75, 0.1, 2e8);
        assert_eq!(built.position_x(), -0.75);
        assert_eq!(built.position_y(), 0.1);
        assert_eq!(built.scale(), MAX_SCALE);
    }

    #[test]
    fn half_frame_shrinks_with_zoom() {
        let view = ViewTransform::new(0.0, 0.0, 100.0);
        assert_eq!(view.half_frame(200.0, 100.0), (1.0, 0.5));
    }
}
