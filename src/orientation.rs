// orientation.rs — yaw/pitch state of the viewer

/// Viewing angles in degrees. Yaw is unbounded; pitch is clamped once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Seed from a stored initial view, whose angles are kept in radians.
    pub fn from_radians(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw: yaw.to_degrees(),
            pitch: pitch.to_degrees(),
        }
    }

    /// Keep the camera away from the poles so `look_at` never degenerates.
    pub fn clamp_pitch(&mut self, limit: f32) {
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    /// `(phi, theta)` in radians: polar angle from +Y and azimuth around it.
    pub fn spherical(&self) -> (f32, f32) {
        ((90.0 - self.pitch).to_radians(), self.yaw.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_clamps_both_ways() {
        let mut o = Orientation::new(10.0, 400.0);
        o.clamp_pitch(85.0);
        assert_eq!(o.pitch, 85.0);

        o.pitch = -1.0e6;
        o.clamp_pitch(85.0);
        assert_eq!(o.pitch, -85.0);
        assert_eq!(o.yaw, 10.0);
    }

    #[test]
    fn radians_seed() {
        let o = Orientation::from_radians(std::f32::consts::PI, 0.0);
        assert!((o.yaw - 180.0).abs() < 1e-4);
    }
}
