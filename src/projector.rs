// projector.rs — screen <-> sphere conversions
//
// world -> screen: half-space test against the view direction, then projection
// to pixels, then a margin-expanded bounds test.
// screen -> world: ray from the camera through the pixel, intersected with the
// placement sphere, rounded to whole units.

use glam::{Vec2, Vec3};

use crate::camera::{Camera, Ray};

/// Canvas rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Window coordinates to device space, y up.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        Some(Vec2::new(
            ((x - self.left) / self.width) * 2.0 - 1.0,
            -((y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }

    /// Device space to canvas pixels, y down.
    pub fn to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width,
            (-ndc.y * 0.5 + 0.5) * self.height,
        )
    }

    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.width + margin
            && p.y >= -margin
            && p.y <= self.height + margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Behind the camera, degenerate, or not a finite point.
    Behind,
    /// In front but outside the margin-expanded canvas.
    Offscreen,
    /// Canvas-relative pixel anchor.
    Visible(Vec2),
}

impl Projection {
    pub fn screen(&self) -> Option<Vec2> {
        match self {
            Projection::Visible(p) => Some(*p),
            _ => None,
        }
    }
}

/// Cosine between the view direction and the direction to `point`.
/// `None` when the point coincides with the camera.
pub fn facing(camera: &Camera, point: Vec3) -> Option<f32> {
    let to_point = (point - camera.position).try_normalize()?;
    Some(camera.forward().dot(to_point))
}

pub fn world_to_screen(camera: &Camera, viewport: &Viewport, point: Vec3, margin: f32) -> Projection {
    if !point.is_finite() || viewport.is_empty() {
        return Projection::Behind;
    }
    match facing(camera, point) {
        Some(dot) if dot > 0.0 => {}
        _ => return Projection::Behind,
    }
    let Some(ndc) = camera.project(point) else {
        return Projection::Behind;
    };
    let screen = viewport.to_screen(ndc.truncate());
    if viewport.contains_with_margin(screen, margin) {
        Projection::Visible(screen)
    } else {
        Projection::Offscreen
    }
}

/// Ray under a window-space point.
pub fn screen_ray(camera: &Camera, viewport: &Viewport, x: f32, y: f32) -> Option<Ray> {
    let ndc = viewport.to_ndc(x, y)?;
    Some(camera.ray(ndc.x, ndc.y))
}

/// Point on the placement sphere under a window-space click, rounded to the
/// nearest unit.
pub fn screen_to_sphere(
    camera: &Camera,
    viewport: &Viewport,
    x: f32,
    y: f32,
    radius: f32,
) -> Option<Vec3> {
    let ray = screen_ray(camera, viewport, x, y)?;
    let hit = ray.exit_sphere(radius)?;
    Some(hit.round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        let mut cam = Camera::new(75.0, 800.0 / 600.0, 1.0, 1100.0);
        cam.orbit(&Orientation::new(20.0, 10.0), 100.0);
        cam
    }

    #[test]
    fn ndc_mapping_respects_offset() {
        let vp = Viewport {
            left: 100.0,
            top: 50.0,
            width: 800.0,
            height: 600.0,
        };
        let ndc = vp.to_ndc(500.0, 350.0).unwrap();
        assert_relative_eq!(ndc.x, 0.0);
        assert_relative_eq!(ndc.y, 0.0);
        let ndc = vp.to_ndc(100.0, 50.0).unwrap();
        assert_relative_eq!(ndc.x, -1.0);
        assert_relative_eq!(ndc.y, 1.0);
    }

    #[test]
    fn ahead_is_visible_behind_is_not() {
        let cam = camera();
        let vp = Viewport::new(800.0, 600.0);
        let ahead = cam.forward() * 400.0;
        let behind = cam.position + (-cam.forward()) * 50.0;

        match world_to_screen(&cam, &vp, ahead, 100.0) {
            Projection::Visible(p) => {
                assert_relative_eq!(p.x, 400.0, epsilon = 0.5);
                assert_relative_eq!(p.y, 300.0, epsilon = 0.5);
            }
            other => panic!("expected visible, got {other:?}"),
        }
        assert_eq!(world_to_screen(&cam, &vp, behind, 100.0), Projection::Behind);
    }

    #[test]
    fn point_at_camera_is_hidden() {
        let cam = camera();
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(world_to_screen(&cam, &vp, cam.position, 100.0), Projection::Behind);
        assert_eq!(
            world_to_screen(&cam, &vp, Vec3::new(f32::NAN, 0.0, 0.0), 100.0),
            Projection::Behind
        );
    }

    #[test]
    fn side_point_is_offscreen() {
        // 80 degrees off axis passes the half-space test but not the bounds test.
        let cam = camera();
        let vp = Viewport::new(800.0, 600.0);
        let right = cam.forward().cross(Vec3::Y).normalize();
        let dir = (cam.forward() * 10f32.to_radians().sin() + right * 80f32.to_radians().sin())
            .normalize();
        let p = cam.position + dir * 300.0;
        assert!(facing(&cam, p).unwrap() > 0.0);
        assert_eq!(world_to_screen(&cam, &vp, p, 100.0), Projection::Offscreen);
    }

    #[test]
    fn empty_viewport_never_projects() {
        let cam = camera();
        let vp = Viewport::new(0.0, 0.0);
        assert!(screen_to_sphere(&cam, &vp, 0.0, 0.0, 400.0).is_none());
        assert_eq!(
            world_to_screen(&cam, &vp, cam.forward() * 400.0, 100.0),
            Projection::Behind
        );
    }
}
