//! Translates pan and pinch gestures into view-transform updates.

use viewstate::ViewTransform;

/// Touch or pointer gesture reported by the host.
///
/// `PanDelta` carries the distance the content was dragged in logical pixels,
/// measured as previous position minus current position. Pinch focus points
/// are in physical pixels; the controller divides them by the pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    PanDelta { dx: f64, dy: f64 },
    PinchBegin,
    PinchUpdate {
        focus_x: f64,
        focus_y: f64,
        scale_factor: f64,
    },
    PinchEnd,
}

#[derive(Debug, Clone, Default)]
pub struct GestureController {
    pinching: bool,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    /// Applies one gesture, returning whether the transform changed.
    ///
    /// `logical_size` is the visible frame in logical pixels and `density` the
    /// physical-to-logical pixel ratio.
    pub fn apply(
        &mut self,
        view: &mut ViewTransform,
        logical_size: (f64, f64),
        density: f64,
        event: GestureEvent,
    ) -> bool {
        match event {
            GestureEvent::PanDelta { dx, dy } => {
                let before = *view;
                pan(view, dx, dy);
                *view != before
            }
            GestureEvent::PinchBegin => {
                self.pinching = true;
                tracing::trace!("pinch started");
                false
            }
            GestureEvent::PinchUpdate {
                focus_x,
                focus_y,
                scale_factor,
            } => {
                if !scale_factor.is_finite() || scale_factor <= 0.0 {
                    tracing::debug!(scale_factor, "ignoring degenerate pinch factor");
                    return false;
                }
                let before = *view;
                let density = crate::geometry::sanitize_density(density);
                pinch(
                    view,
                    logical_size,
                    (focus_x / density, focus_y / density),
                    scale_factor,
                );
                *view != before
            }
            GestureEvent::PinchEnd => {
                self.pinching = false;
                tracing::trace!("pinch finished");
                false
            }
        }
    }
}

/// Drags the view. Screen y grows downwards while the imaginary axis grows
/// upwards, hence the opposite signs.
pub fn pan(view: &mut ViewTransform, dx: f64, dy: f64) {
    let scale = view.scale();
    view.set_position_x(view.position_x() + dx / scale);
    view.set_position_y(view.position_y() - dy / scale);
}

/// Zooms by `factor` around `focus` (logical pixels, origin top-left) so the
/// plane point under the focus stays put, unless a clamp intervenes.
pub fn pinch(view: &mut ViewTransform, logical_size: (f64, f64), focus: (f64, f64), factor: f64) {
    let offset_x = focus.0 - 0.5 * logical_size.0;
    let offset_y = focus.1 - 0.5 * logical_size.1;

    let anchor_x = view.position_x() + offset_x / view.scale();
    let anchor_y = view.position_y() - offset_y / view.scale();

    view.set_scale(view.scale() * factor);

    view.set_position_x(anchor_x - offset_x / view.scale());
    view.set_position_y(anchor_y + offset_y / view.scale());
}

/// Plane point under a logical-pixel screen location.
pub fn plane_point(view: &ViewTransform, logical_size: (f64, f64), point: (f64, f64)) -> (f64, f64) {
    (
        view.position_x() + (point.0 - 0.5 * logical_size.0) / view.scale(),
        view.position_y() - (point.1 - 0.5 * logical_size.1) / view.scale(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewstate::{MAX_POSITION, MAX_SCALE};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn pan_moves_by_screen_distance_over_scale() {
        let mut view = ViewTransform::new(0.0, 0.0, 75.0);
        pan(&mut view, 75.0, 0.0);
        assert!((view.position_x() - 1.0).abs() < EPSILON);
        assert_eq!(view.position_y(), 0.0);

        pan(&mut view, 0.0, 150.0);
        assert!((view.position_y() + 2.0).abs() < EPSILON);
    }

    #[test]
    fn pan_is_clamped_at_the_edge() {
        let mut view = ViewTransform::new(2.9, 0.0, 75.0);
        let mut controller = GestureController::new();
        let changed = controller.apply(
            &mut view,
            (300.0, 200.0),
            1.0,
            GestureEvent::PanDelta { dx: 7500.0, dy: 0.0 },
        );
        assert!(changed);
        assert_eq!(view.position_x(), MAX_POSITION);

        let changed = controller.apply(
            &mut view,
            (300.0, 200.0),
            1.0,
            GestureEvent::PanDelta { dx: 75.0, dy: 0.0 },
        );
        assert!(!changed);
    }

    #[test]
    fn pinch_keeps_focus_point_fixed() {
        let size = (200.0, 200.0);
        let focus = (150.0, 100.0);
        let mut view = ViewTransform::new(0.0, 0.0, 100.0);
        let before = plane_point(&view, size, focus);
        assert_eq!(before, (0.5, 0.0));
        pinch(&mut view, size, focus, 2.0);
        assert_eq!(view.scale(), 200.0);
        assert!((view.position_x() - 0.25).abs() < EPSILON);
        assert!(view.position_y().abs() < EPSILON);
        let after = plane_point(&view, size, focus);
        assert!((before.0 - after.0).abs() < EPSILON);
        assert!((before.1 - after.1).abs() < EPSILON);
    }

    #[test]
    fn pinch_off_centre_keeps_focus_point_fixed() {
        let size = (300.0, 200.0);
        let focus = (40.0, 170.0);
        let mut view = ViewTransform::new(-0.5, 0.25, 300.0);
        let before = plane_point(&view, size, focus);
        pinch(&mut view, size, focus, 3.5);
        let after = plane_point(&view, size, focus);
        assert!((before.0 - after.0).abs() < EPSILON);
        assert!((before.1 - after.1).abs() < EPSILON);

        pinch(&mut view, size, focus, 0.4);
        let again = plane_point(&view, size, focus);
        assert!((before.0 - again.0).abs() < EPSILON);
        assert!((before.1 - again.1).abs() < EPSILON);
    }

    #[test]
    fn pinch_focus_is_converted_by_density() {
        let mut controller = GestureController::new();
        let mut view = ViewTransform::new(0.0, 0.0, 100.0);
        let size = (300.0, 200.0);
        let before = plane_point(&view, size, (50.0, 50.0));

        controller.apply(&mut view, size, 2.0, GestureEvent::PinchBegin);
        assert!(controller.is_pinching());
        let changed = controller.apply(
            &mut view,
            size,
            2.0,
            GestureEvent::PinchUpdate {
                focus_x: 100.0,
                focus_y: 100.0,
                scale_factor: 1.5,
            },
        );
        controller.apply(&mut view, size, 2.0, GestureEvent::PinchEnd);

        assert!(changed);
        assert!(!controller.is_pinching());
        let after = plane_point(&view, size, (50.0, 50.0));
        assert!((before.0 - after.0).abs() < EPSILON);
        assert!((before.1 - after.1).abs() < EPSILON);
    }

    #[test]
    fn pinch_at_scale_limit_leaves_view_alone() {
        let mut controller = GestureController::new();
        let mut view = ViewTransform::new(0.1, 0.1, MAX_SCALE);
        let changed = controller.apply(
            &mut view,
            (300.0, 200.0),
            1.0,
            GestureEvent::PinchUpdate {
                focus_x: 150.0,
                focus_y: 100.0,
                scale_factor: 4.0,
            },
        );
        assert!(!changed);
        assert_eq!(view.scale(), MAX_SCALE);

        let changed = controller.apply(
            &mut view,
            (300.0, 200.0),
            1.0,
            GestureEvent::PinchUpdate {
                focus_x: 150.0,
                focus_y: 100.0,
                scale_factor: f64::NAN,
            },
        );
        assert!(!changed);
    }
}
