// config.rs — tunables for the viewer/editor and how they are resolved
//
// Resolution order:
// - built-in defaults (ViewerConfig::default)
// - optional JSON file: --config <path> or env PANORAMA_TOUR_CONFIG
// - CLI flags (--tour, --scene, --editor, --lang)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TourError;

/// Every numeric knob the engine reads. All fields are optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Degrees of rotation per pixel of pointer drag.
    pub drag_sensitivity: f32,
    /// Degrees of FOV per unit of wheel deltaY.
    pub wheel_factor: f32,
    pub fov_min: f32,
    pub fov_max: f32,
    pub default_fov: f32,
    pub pitch_limit: f32,
    /// Distance of the camera from the sphere centre.
    pub orbit_radius: f32,
    pub sphere_radius: f32,
    /// Radius on which editor clicks are anchored.
    pub placement_radius: f32,
    pub near: f32,
    pub far: f32,
    pub viewer_margin: f32,
    pub editor_margin: f32,
    pub fade_out_ms: u64,
    pub settle_ms: u64,
    pub fov_report_epsilon: f32,
    pub notification_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.1,
            wheel_factor: 0.05,
            fov_min: 30.0,
            fov_max: 100.0,
            default_fov: 75.0,
            pitch_limit: 85.0,
            orbit_radius: 100.0,
            sphere_radius: 500.0,
            placement_radius: 400.0,
            near: 1.0,
            far: 1100.0,
            viewer_margin: 100.0,
            editor_margin: 50.0,
            fade_out_ms: 400,
            settle_ms: 100,
            fov_report_epsilon: 0.1,
            notification_ms: 3000,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, TourError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn clamp_fov(&self, fov: f32) -> f32 {
        fov.clamp(self.fov_min, self.fov_max)
    }

    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

/// What the process was asked to do on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchOptions {
    pub tour: Option<PathBuf>,
    pub start_scene: Option<String>,
    pub editor: bool,
    pub config: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut opts = LaunchOptions::default();
        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "--tour" => opts.tour = it.next().map(PathBuf::from),
                "--scene" => opts.start_scene = it.next(),
                "--config" => opts.config = it.next().map(PathBuf::from),
                "--editor" => opts.editor = true,
                _ => {}
            }
        }

        if opts.config.is_none() {
            if let Ok(v) = std::env::var("PANORAMA_TOUR_CONFIG") {
                if !v.trim().is_empty() {
                    opts.config = Some(PathBuf::from(v));
                }
            }
        }

        opts
    }

    /// Defaults overlaid with the config file, if one was named. A broken file is
    /// reported and ignored.
    pub fn viewer_config(&self) -> ViewerConfig {
        let Some(path) = &self.config else {
            return ViewerConfig::default();
        };
        match ViewerConfig::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring config {}: {}", path.display(), e);
                ViewerConfig::default()
            }
        }
    }
}
