// camera.rs — perspective camera orbiting the sphere centre

use glam::{Mat4, Vec3, Vec4};

use crate::orientation::Orientation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Exit point of the ray through a centred sphere it starts inside of.
    ///
    /// `dir` must be unit length. Returns `None` when the origin is outside the
    /// sphere and the ray misses it or points away.
    pub fn exit_sphere(&self, radius: f32) -> Option<Vec3> {
        let b = self.origin.dot(self.dir);
        let c = self.origin.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = -b + disc.sqrt();
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Camera state derived each frame. Only `fov` (and `aspect` on resize) is
/// set directly; `position` always comes from an `Orientation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::X,
            fov,
            aspect,
            near,
            far,
        }
    }

    /// Place the camera on an orbit of `radius` around the origin, looking inward.
    pub fn orbit(&mut self, orientation: &Orientation, radius: f32) {
        let (phi, theta) = orientation.spherical();
        self.position = Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        );
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Unit view direction; the camera always looks at the origin.
    pub fn forward(&self) -> Vec3 {
        (-self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(1e-6), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World point to normalised device coordinates. `None` on the w = 0 plane.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    /// Ray from the camera through a device-space point.
    pub fn ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let inv = self.view_projection().inverse();
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let far = far.truncate() / far.w;
        let dir = (far - self.position)
            .try_normalize()
            .unwrap_or_else(|| self.forward());
        Ray {
            origin: self.position,
            dir,
        }
    }
}
