//! Maps raw window input to viewer actions and gestures.

use std::collections::BTreeMap;

use viewstate::Hue;
use winit::event::{MouseScrollDelta, TouchPhase};
use winit::keyboard::{Key, NamedKey};

use crate::gesture::GestureEvent;

pub const ITERATION_STEP: i32 = 10;
pub const SUPER_SAMPLING_STEP: f64 = 0.25;
/// Zoom applied per wheel notch.
const WHEEL_ZOOM_STEP: f64 = 1.1;
/// Pixel-precise scrolling: this many pixels count as one notch.
const PIXELS_PER_NOTCH: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    SelectHue(Hue),
    AdjustIterations(i32),
    AdjustSuperSampling(f64),
    Capture,
    ResetView,
    Quit,
}

pub fn action_for_key(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Character(text) => match text.as_str() {
            "1" => Some(KeyAction::SelectHue(Hue::Fire)),
            "2" => Some(KeyAction::SelectHue(Hue::Ice)),
            "3" => Some(KeyAction::SelectHue(Hue::Ash)),
            "4" => Some(KeyAction::SelectHue(Hue::Psychedelic)),
            "+" | "=" => Some(KeyAction::AdjustIterations(ITERATION_STEP)),
            "-" | "_" => Some(KeyAction::AdjustIterations(-ITERATION_STEP)),
            "]" => Some(KeyAction::AdjustSuperSampling(SUPER_SAMPLING_STEP)),
            "[" => Some(KeyAction::AdjustSuperSampling(-SUPER_SAMPLING_STEP)),
            "s" | "S" => Some(KeyAction::Capture),
            "r" | "R" => Some(KeyAction::ResetView),
            "q" | "Q" => Some(KeyAction::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// Scale factor for one wheel event; scrolling up zooms in.
pub fn wheel_zoom_factor(delta: MouseScrollDelta) -> f64 {
    let notches = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_NOTCH,
    };
    WHEEL_ZOOM_STEP.powf(notches)
}

/// Left-button drag state for mouse panning.
#[derive(Debug, Default)]
pub(crate) struct DragTracker {
    cursor: Option<(f64, f64)>,
    dragging: bool,
}

impl DragTracker {
    pub fn cursor(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    /// Records a cursor move in physical pixels, returning a pan while dragging.
    pub fn cursor_moved(&mut self, position: (f64, f64), density: f64) -> Option<GestureEvent> {
        let previous = self.cursor.replace(position);
        if !self.dragging {
            return None;
        }
        let previous = previous?;
        Some(GestureEvent::PanDelta {
            dx: (previous.0 - position.0) / density,
            dy: (previous.1 - position.1) / density,
        })
    }
}

/// Turns touch points into pan (one finger) and pinch (two fingers) gestures.
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    touches: BTreeMap<u64, (f64, f64)>,
    pinch_distance: Option<f64>,
}

impl TouchTracker {
    pub fn handle(
        &mut self,
        id: u64,
        phase: TouchPhase,
        position: (f64, f64),
        density: f64,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, position);
                if self.touches.len() == 2 {
                    self.pinch_distance = self.span().map(|(_, distance)| distance);
                    events.push(GestureEvent::PinchBegin);
                }
            }
            TouchPhase::Moved => {
                let Some(previous) = self.touches.insert(id, position) else {
                    return events;
                };
                if self.touches.len() == 1 {
                    events.push(GestureEvent::PanDelta {
                        dx: (previous.0 - position.0) / density,
                        dy: (previous.1 - position.1) / density,
                    });
                } else if let Some((focus, distance)) = self.span() {
                    if let Some(previous_distance) = self.pinch_distance {
                        if previous_distance > 0.0 && distance > 0.0 {
                            events.push(GestureEvent::PinchUpdate {
                                focus_x: focus.0,
                                focus_y: focus.1,
                                scale_factor: distance / previous_distance,
                            });
                        }
                    }
                    self.pinch_distance = Some(distance);
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let was_pinching = self.touches.len() >= 2;
                self.touches.remove(&id);
                if was_pinching && self.touches.len() < 2 {
                    self.pinch_distance = None;
                    events.push(GestureEvent::PinchEnd);
                }
            }
        }
        events
    }

    /// Midpoint and distance of the two oldest touches.
    fn span(&self) -> Option<((f64, f64), f64)> {
        let mut points = self.touches.values();
        let a = *points.next()?;
        let b = *points.next()?;
        let focus = ((a.0 + b.0) * 0.5, (a.1 + b.1) * 0.5);
        let distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        Some((focus, distance))
    }
}
