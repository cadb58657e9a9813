//! Pointer routing: pen/mouse drive drawing or selection, touch drives the
//! camera, and the active drawing pointer is an exclusive lock.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pointer device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Pen,
    Mouse,
    Touch,
}

/// Event phase, mirroring the host's pointer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer sample in canvas-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub pointer_type: PointerType,
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub timestamp: f64,
}

impl PointerSample {
    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// An ingested pointer event with optional sub-frame samples.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub sample: PointerSample,
    /// Coalesced sub-samples in reported order. Empty when the platform
    /// does not expose them.
    pub coalesced: Vec<PointerSample>,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, sample: PointerSample) -> Self {
        Self {
            phase,
            sample,
            coalesced: Vec::new(),
        }
    }
}

/// Platform capabilities, queried once at construction.
#[derive(Debug, Clone, Copy)]
pub struct PlatformCaps {
    /// Whether coalesced sub-samples are trustworthy on this platform.
    pub coalesced_events: bool,
}

impl Default for PlatformCaps {
    fn default() -> Self {
        Self {
            coalesced_events: true,
        }
    }
}

/// A routed action for the engine to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedAction {
    /// A drawing pointer went down.
    DrawStart(PointerSample),
    /// Drawing pointer samples, coalesced sub-samples already expanded.
    DrawMove(Vec<PointerSample>),
    /// The drawing pointer lifted normally.
    DrawEnd(PointerSample),
    /// The drawing pointer was lost (cancel, lost capture, or replaced by
    /// a newer pointer). The active stroke must still end exactly once.
    DrawAbort,
    /// One-finger pan by a screen-space delta.
    Pan(Vec2),
    /// Two-finger pinch about a screen-space center.
    Pinch { factor: f64, center: Point },
}

/// Routes raw pointer events to drawing or camera actions.
///
/// Only one pen/mouse pointer draws at a time; a second down while one is
/// active force-ends the first (missed pointer-up recovery). Touch never
/// draws, and is ignored entirely while a drawing pointer is active (palm
/// rejection).
#[derive(Debug)]
pub struct InputDispatcher {
    caps: PlatformCaps,
    active_pointer: Option<u32>,
    touch_points: HashMap<u32, Point>,
}

impl InputDispatcher {
    pub fn new(caps: PlatformCaps) -> Self {
        Self {
            caps,
            active_pointer: None,
            touch_points: HashMap::new(),
        }
    }

    /// Whether a drawing pointer currently holds the lock.
    pub fn is_drawing(&self) -> bool {
        self.active_pointer.is_some()
    }

    /// Route one event into zero or more engine actions.
    pub fn handle(&mut self, event: &PointerEvent) -> Vec<RoutedAction> {
        match event.sample.pointer_type {
            PointerType::Touch => self.handle_touch(event),
            PointerType::Pen | PointerType::Mouse => self.handle_draw_pointer(event),
        }
    }

    fn handle_draw_pointer(&mut self, event: &PointerEvent) -> Vec<RoutedAction> {
        let id = event.sample.pointer_id;
        let mut actions = Vec::new();

        match event.phase {
            PointerPhase::Down => {
                if let Some(orphan) = self.active_pointer {
                    tracing::warn!(
                        orphan,
                        new = id,
                        "drawing pointer went down while another was active; ending prior stroke"
                    );
                    actions.push(RoutedAction::DrawAbort);
                }
                self.active_pointer = Some(id);
                actions.push(RoutedAction::DrawStart(event.sample));
            }
            PointerPhase::Move => {
                if self.active_pointer == Some(id) {
                    actions.push(RoutedAction::DrawMove(self.expand(event)));
                }
            }
            PointerPhase::Up => {
                if self.active_pointer == Some(id) {
                    self.active_pointer = None;
                    actions.push(RoutedAction::DrawEnd(event.sample));
                }
            }
            PointerPhase::Cancel => {
                if self.active_pointer == Some(id) {
                    tracing::warn!(id, "drawing pointer cancelled; ending stroke");
                    self.active_pointer = None;
                    actions.push(RoutedAction::DrawAbort);
                }
            }
        }
        actions
    }

    fn handle_touch(&mut self, event: &PointerEvent) -> Vec<RoutedAction> {
        let id = event.sample.pointer_id;
        let pos = event.sample.pos();

        // Palm rejection: while the pen draws, touches neither draw nor
        // steer the camera, but lifted fingers are still forgotten.
        if self.active_pointer.is_some() {
            if matches!(event.phase, PointerPhase::Up | PointerPhase::Cancel) {
                self.touch_points.remove(&id);
            }
            return Vec::new();
        }

        match event.phase {
            PointerPhase::Down => {
                self.touch_points.insert(id, pos);
                Vec::new()
            }
            PointerPhase::Move => {
                let Some(&prev) = self.touch_points.get(&id) else {
                    return Vec::new();
                };
                let action = match self.touch_points.len() {
                    1 => {
                        let delta = Vec2::new(pos.x - prev.x, pos.y - prev.y);
                        Some(RoutedAction::Pan(delta))
                    }
                    2 => self
                        .touch_points
                        .iter()
                        .find(|(&tid, _)| tid != id)
                        .map(|(_, &p)| p)
                        .and_then(|other| {
                            let old_dist = (prev - other).hypot();
                            let new_dist = (pos - other).hypot();
                            (old_dist > f64::EPSILON).then(|| RoutedAction::Pinch {
                                factor: new_dist / old_dist,
                                center: Point::new(
                                    (pos.x + other.x) / 2.0,
                                    (pos.y + other.y) / 2.0,
                                ),
                            })
                        }),
                    _ => None,
                };
                self.touch_points.insert(id, pos);
                action.into_iter().collect()
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                self.touch_points.remove(&id);
                Vec::new()
            }
        }
    }

    /// Expand coalesced sub-samples in reported order, or fall back to the
    /// leaf sample.
    fn expand(&self, event: &PointerEvent) -> Vec<PointerSample> {
        if self.caps.coalesced_events && !event.coalesced.is_empty() {
            event.coalesced.clone()
        } else {
            vec![event.sample]
        }
    }
}
