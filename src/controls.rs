// controls.rs — pointer / touch / wheel -> orientation and FOV
//
// Drag is absolute relative to where it started: every move recomputes the
// orientation from the snapshot taken on pointer-down, so no error accumulates.
// There is no inertia; releasing stops the motion.

use crate::orientation::Orientation;

/// Input normalised from window events (mouse or a single finger).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
    /// Browser-style deltaY: positive zooms out.
    Wheel { delta_y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragControls {
    interacting: bool,
    origin_x: f32,
    origin_y: f32,
    origin: Orientation,
}

impl DragControls {
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn begin(&mut self, x: f32, y: f32, current: Orientation) {
        self.interacting = true;
        self.origin_x = x;
        self.origin_y = y;
        self.origin = current;
    }

    /// Pixel offset of the pointer from the drag origin, or `None` when idle.
    pub fn offset(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        self.interacting
            .then(|| (x - self.origin_x, y - self.origin_y))
    }

    /// Dragging right turns the view left; dragging down tilts it up.
    pub fn orientation_for(&self, dx: f32, dy: f32, sensitivity: f32) -> Orientation {
        Orientation {
            yaw: -dx * sensitivity + self.origin.yaw,
            pitch: dy * sensitivity + self.origin.pitch,
        }
    }

    pub fn end(&mut self) {
        self.interacting = false;
    }
}

pub fn wheel_fov(fov: f32, delta_y: f32, factor: f32, min: f32, max: f32) -> f32 {
    (fov + delta_y * factor).clamp(min, max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Reduces raw multi-touch events to single-finger drag events.
/// A second finger does not pan; it is tracked only so the count is right.
#[derive(Debug, Default)]
pub struct TouchTracker {
    active: Vec<u64>,
}

impl TouchTracker {
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn handle(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> Option<PointerEvent> {
        match phase {
            TouchPhase::Start => {
                if !self.active.contains(&id) {
                    self.active.push(id);
                }
                (self.active.len() == 1).then_some(PointerEvent::Down { x, y })
            }
            TouchPhase::Move => (self.active.len() == 1 && self.active[0] == id)
                .then_some(PointerEvent::Move { x, y }),
            TouchPhase::End | TouchPhase::Cancel => {
                self.active.retain(|t| *t != id);
                Some(PointerEvent::Up)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_sign_convention() {
        let mut c = DragControls::default();
        c.begin(100.0, 100.0, Orientation::new(10.0, 0.0));
        let (dx, dy) = c.offset(150.0, 120.0).unwrap();
        let o = c.orientation_for(dx, dy, 0.1);
        assert!((o.yaw - 5.0).abs() < 1e-5);
        assert!((o.pitch - 2.0).abs() < 1e-5);
    }

    #[test]
    fn idle_has_no_offset() {
        let mut c = DragControls::default();
        assert!(c.offset(1.0, 1.0).is_none());
        c.begin(0.0, 0.0, Orientation::default());
        c.end();
        assert!(c.offset(1.0, 1.0).is_none());
    }

    #[test]
    fn wheel_is_clamped() {
        assert_eq!(wheel_fov(90.0, 1000.0, 0.05, 30.0, 100.0), 100.0);
        assert_eq!(wheel_fov(40.0, -1000.0, 0.05, 30.0, 100.0), 30.0);
        assert!((wheel_fov(75.0, 100.0, 0.05, 30.0, 100.0) - 80.0).abs() < 1e-5);
    }

    #[test]
    fn second_finger_does_not_pan() {
        let mut t = TouchTracker::default();
        assert_eq!(
            t.handle(1, TouchPhase::Start, 5.0, 5.0),
            Some(PointerEvent::Down { x: 5.0, y: 5.0 })
        );
        assert_eq!(t.handle(2, TouchPhase::Start, 9.0, 9.0), None);
        assert_eq!(t.handle(1, TouchPhase::Move, 6.0, 6.0), None);
        assert_eq!(t.handle(2, TouchPhase::End, 9.0, 9.0), Some(PointerEvent::Up));
        assert_eq!(t.active_count(), 1);
        assert_eq!(
            t.handle(1, TouchPhase::Move, 7.0, 7.0),
            Some(PointerEvent::Move { x: 7.0, y: 7.0 })
        );
    }
}
