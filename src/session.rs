// session.rs — one viewer instance: orientation, camera, sphere and hotspots
//
// Data flow per frame: input mutates the orientation; `begin_frame` clamps it
// and derives the camera; the renderer draws; `end_frame` projects hotspots
// with that same camera and coalesces the FOV report.

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::controls::{wheel_fov, DragControls, PointerEvent, TouchPhase, TouchTracker};
use crate::hotspots::HotspotLayout;
use crate::orientation::Orientation;
use crate::projector::{screen_to_sphere, Viewport};
use crate::tour::{Hotspot, Position, Scene};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Material {
    /// Nothing loaded yet; the sphere renders black.
    Blank,
    /// Panorama of the named scene.
    Panorama { scene_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SphereState {
    pub radius: f32,
    pub material: Material,
    /// Set once the current scene's texture settled, successfully or not.
    pub ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// New FOV when it moved more than the report epsilon since the last report.
    pub fov_changed: Option<f32>,
    pub visible_hotspots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOutcome {
    Applied,
    /// Failed load; the previous material stays.
    KeptPrevious,
    /// Result for a scene that is no longer active.
    Stale,
}

pub struct PanoramaSession {
    config: ViewerConfig,
    margin: f32,
    orientation: Orientation,
    camera: Camera,
    viewport: Viewport,
    controls: DragControls,
    touches: TouchTracker,
    sphere: SphereState,
    scene: Option<Scene>,
    layout: HotspotLayout,
    reported_fov: f32,
    input_locked: bool,
}

impl PanoramaSession {
    pub fn new(config: ViewerConfig, viewport: Viewport, margin: f32) -> Self {
        let aspect = if viewport.is_empty() {
            1.0
        } else {
            viewport.width / viewport.height
        };
        let mut camera = Camera::new(config.default_fov, aspect, config.near, config.far);
        let orientation = Orientation::default();
        camera.orbit(&orientation, config.orbit_radius);
        Self {
            margin,
            orientation,
            camera,
            viewport,
            controls: DragControls::default(),
            touches: TouchTracker::default(),
            sphere: SphereState {
                radius: config.sphere_radius,
                material: Material::Blank,
                ready: false,
            },
            scene: None,
            layout: HotspotLayout::default(),
            reported_fov: config.default_fov,
            input_locked: false,
            config,
        }
    }

    pub fn viewer(config: ViewerConfig, viewport: Viewport) -> Self {
        let margin = config.viewer_margin;
        Self::new(config, viewport, margin)
    }

    pub fn editor(config: ViewerConfig, viewport: Viewport) -> Self {
        let margin = config.editor_margin;
        Self::new(config, viewport, margin)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn fov(&self) -> f32 {
        self.camera.fov
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sphere(&self) -> &SphereState {
        &self.sphere
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_id(&self) -> Option<&str> {
        self.scene.as_ref().map(|s| s.id.as_str())
    }

    pub fn layout(&self) -> &HotspotLayout {
        &self.layout
    }

    pub fn is_interacting(&self) -> bool {
        self.controls.is_interacting()
    }

    /// Make `scene` active and re-seed the view from its initial view.
    /// The sphere keeps its current material until the new texture settles.
    pub fn load_scene(&mut self, scene: &Scene) {
        self.sphere.ready = false;
        self.scene = Some(scene.clone());
        self.layout.clear();
        self.reset_view();
    }

    /// Back to the active scene's initial view.
    pub fn reset_view(&mut self) {
        let Some(view) = self.scene.as_ref().map(|s| s.initial_view) else {
            return;
        };
        self.orientation = Orientation::from_radians(view.yaw, view.pitch);
        self.camera.fov = self.config.clamp_fov(view.fov);
        self.controls.end();
    }

    /// Replace the active scene's record (e.g. after an edit) without touching the view.
    pub fn refresh_scene(&mut self, scene: &Scene) {
        if self.scene_id() == Some(scene.id.as_str()) {
            self.scene = Some(scene.clone());
        }
    }

    /// Swap the active scene's hotspot list, e.g. for the editor's local copy.
    pub fn set_hotspots(&mut self, hotspots: &[Hotspot]) {
        if let Some(scene) = &mut self.scene {
            if scene.hotspots != hotspots {
                scene.hotspots = hotspots.to_vec();
            }
        }
    }

    pub fn set_margin(&mut self, margin: f32) {
        self.margin = margin;
    }

    pub fn texture_loaded(&mut self, scene_id: &str) -> TextureOutcome {
        if self.scene_id() != Some(scene_id) {
            return TextureOutcome::Stale;
        }
        self.sphere.material = Material::Panorama {
            scene_id: scene_id.to_string(),
        };
        self.sphere.ready = true;
        TextureOutcome::Applied
    }

    pub fn texture_failed(&mut self, scene_id: &str) -> TextureOutcome {
        if self.scene_id() != Some(scene_id) {
            return TextureOutcome::Stale;
        }
        self.sphere.ready = true;
        TextureOutcome::KeptPrevious
    }

    /// While locked (editor placing or dragging a hotspot) the view does not pan.
    pub fn set_input_locked(&mut self, locked: bool) {
        self.input_locked = locked;
        if locked {
            self.controls.end();
        }
    }

    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if self.input_locked {
            return;
        }
        self.controls.begin(x, y, self.orientation);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some((dx, dy)) = self.controls.offset(x, y) {
            self.apply_pointer_delta(dx, dy);
        }
    }

    pub fn pointer_up(&mut self) {
        self.controls.end();
    }

    /// Pointer offset in pixels from where the current drag started.
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        if !self.controls.is_interacting() {
            return;
        }
        self.orientation = self
            .controls
            .orientation_for(dx, dy, self.config.drag_sensitivity);
    }

    pub fn apply_wheel_delta(&mut self, delta_y: f32) {
        self.camera.fov = wheel_fov(
            self.camera.fov,
            delta_y,
            self.config.wheel_factor,
            self.config.fov_min,
            self.config.fov_max,
        );
    }

    pub fn apply_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => self.pointer_down(x, y),
            PointerEvent::Move { x, y } => self.pointer_move(x, y),
            PointerEvent::Up => self.pointer_up(),
            PointerEvent::Wheel { delta_y } => self.apply_wheel_delta(delta_y),
        }
    }

    pub fn apply_touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) {
        if let Some(event) = self.touches.handle(id, phase, x, y) {
            self.apply_pointer(event);
        }
    }

    /// Idempotent; zero-sized viewports keep the previous aspect.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_viewport(viewport.width, viewport.height);
    }

    /// Clamp pitch and derive this frame's camera.
    pub fn begin_frame(&mut self) {
        self.orientation.clamp_pitch(self.config.pitch_limit);
        self.camera.orbit(&self.orientation, self.config.orbit_radius);
    }

    /// Project hotspots with the camera `begin_frame` produced.
    pub fn end_frame(&mut self) -> FrameReport {
        match &self.scene {
            Some(scene) => {
                self.layout
                    .update(&self.camera, &self.viewport, &scene.hotspots, self.margin)
            }
            None => self.layout.clear(),
        }

        let mut report = FrameReport {
            fov_changed: None,
            visible_hotspots: self.layout.visible().count(),
        };
        if (self.reported_fov - self.camera.fov).abs() > self.config.fov_report_epsilon {
            self.reported_fov = self.camera.fov;
            report.fov_changed = Some(self.camera.fov);
        }
        report
    }

    /// One frame without a renderer.
    pub fn tick(&mut self) -> FrameReport {
        self.begin_frame();
        self.end_frame()
    }

    /// Placement point under a window-space click, on the placement sphere.
    pub fn pick(&self, x: f32, y: f32) -> Option<Position> {
        screen_to_sphere(
            &self.camera,
            &self.viewport,
            x,
            y,
            self.config.placement_radius,
        )
        .map(Position::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::InitialView;

    fn scene(id: &str, fov: f32) -> Scene {
        Scene {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            image_url: format!("{id}.jpg"),
            initial_view: InitialView {
                yaw: 0.5,
                pitch: 0.0,
                fov,
            },
            hotspots: Vec::new(),
        }
    }

    fn session() -> PanoramaSession {
        PanoramaSession::viewer(ViewerConfig::default(), Viewport::new(800.0, 600.0))
    }

    #[test]
    fn fov_report_is_coalesced() {
        let mut s = session();
        assert_eq!(s.tick().fov_changed, None);
        s.apply_wheel_delta(1.0); // +0.05 degrees
        assert_eq!(s.tick().fov_changed, None);
        s.apply_wheel_delta(2.0);
        assert!(s.tick().fov_changed.is_some());
        assert_eq!(s.tick().fov_changed, None);
    }

    #[test]
    fn drag_requires_pointer_down() {
        let mut s = session();
        s.pointer_move(500.0, 500.0);
        assert_eq!(s.orientation(), Orientation::default());

        s.pointer_down(100.0, 100.0);
        s.pointer_move(90.0, 100.0);
        assert!((s.orientation().yaw - 1.0).abs() < 1e-5);
        s.pointer_up();
        s.pointer_move(0.0, 0.0);
        assert!((s.orientation().yaw - 1.0).abs() < 1e-5);
    }

    #[test]
    fn locked_input_does_not_pan() {
        let mut s = session();
        s.set_input_locked(true);
        s.pointer_down(0.0, 0.0);
        s.pointer_move(300.0, 300.0);
        assert_eq!(s.orientation(), Orientation::default());
    }

    #[test]
    fn load_seeds_view_and_clamps_fov() {
        let mut s = session();
        s.load_scene(&scene("a", 140.0));
        assert_eq!(s.fov(), 100.0);
        assert!((s.orientation().yaw - 0.5f32.to_degrees()).abs() < 1e-3);
        assert!(!s.sphere().ready);
    }

    #[test]
    fn stale_texture_is_ignored() {
        let mut s = session();
        s.load_scene(&scene("a", 90.0));
        s.load_scene(&scene("b", 90.0));
        assert_eq!(s.texture_loaded("a"), TextureOutcome::Stale);
        assert_eq!(s.sphere().material, Material::Blank);
        assert_eq!(s.texture_failed("b"), TextureOutcome::KeptPrevious);
        assert!(s.sphere().ready);
        assert_eq!(s.sphere().material, Material::Blank);
    }
}
