// hotspots.rs — per-frame screen anchors for the active scene's hotspots

use glam::Vec2;

use crate::camera::Camera;
use crate::projector::{world_to_screen, Projection, Viewport};
use crate::tour::{Hotspot, HotspotKind};

#[derive(Debug, Clone, PartialEq)]
pub struct HotspotPlacement {
    pub id: String,
    pub kind: HotspotKind,
    pub label: String,
    pub target_scene: Option<String>,
    pub projection: Projection,
}

impl HotspotPlacement {
    pub fn screen(&self) -> Option<Vec2> {
        self.projection.screen()
    }
}

/// Where the presentation layer moves or hides a marker.
pub trait HotspotSink {
    /// Centre the marker on `at` (canvas pixels) and make it interactive.
    fn show(&mut self, id: &str, at: Vec2);
    /// Remove the marker entirely; hidden markers must not receive clicks.
    fn hide(&mut self, id: &str);
}

/// Placements from the most recent frame, in scene order.
#[derive(Debug, Clone, Default)]
pub struct HotspotLayout {
    placements: Vec<HotspotPlacement>,
}

impl HotspotLayout {
    pub fn update(&mut self, camera: &Camera, viewport: &Viewport, hotspots: &[Hotspot], margin: f32) {
        self.placements.clear();
        for h in hotspots {
            self.placements.push(HotspotPlacement {
                id: h.id.clone(),
                kind: h.kind,
                label: h.label.clone(),
                target_scene: h.target_scene.clone(),
                projection: world_to_screen(camera, viewport, h.position.to_vec3(), margin),
            });
        }
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn placements(&self) -> &[HotspotPlacement] {
        &self.placements
    }

    pub fn get(&self, id: &str) -> Option<&HotspotPlacement> {
        self.placements.iter().find(|p| p.id == id)
    }

    pub fn visible(&self) -> impl Iterator<Item = (&HotspotPlacement, Vec2)> {
        self.placements
            .iter()
            .filter_map(|p| p.screen().map(|s| (p, s)))
    }

    pub fn write_to(&self, sink: &mut dyn HotspotSink) {
        for p in &self.placements {
            match p.screen() {
                Some(at) => sink.show(&p.id, at),
                None => sink.hide(&p.id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;
    use crate::tour::Position;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Dom {
        shown: HashMap<String, Vec2>,
        hidden: Vec<String>,
    }

    impl HotspotSink for Dom {
        fn show(&mut self, id: &str, at: Vec2) {
            self.shown.insert(id.to_string(), at);
        }
        fn hide(&mut self, id: &str) {
            self.hidden.push(id.to_string());
        }
    }

    fn hotspot(id: &str, x: f32, y: f32, z: f32) -> Hotspot {
        Hotspot {
            id: id.into(),
            kind: HotspotKind::Click,
            position: Position::new(x, y, z),
            target_scene: Some("next".into()),
            label: String::new(),
            fov_trigger: None,
        }
    }

    #[test]
    fn front_shown_back_hidden() {
        let mut cam = Camera::new(75.0, 1.0, 1.0, 1100.0);
        cam.orbit(&Orientation::default(), 100.0);
        // Camera sits on +X looking at -X.
        let spots = [
            hotspot("front", -400.0, 0.0, 0.0),
            hotspot("back", 400.0, 0.0, 0.0),
            hotspot("broken", f32::NAN, 0.0, 0.0),
        ];
        let mut layout = HotspotLayout::default();
        layout.update(&cam, &Viewport::new(600.0, 600.0), &spots, 100.0);

        let mut dom = Dom::default();
        layout.write_to(&mut dom);
        let at = dom.shown["front"];
        assert!((at.x - 300.0).abs() < 0.5 && (at.y - 300.0).abs() < 0.5);
        assert_eq!(dom.hidden, vec!["back".to_string(), "broken".to_string()]);
        assert_eq!(layout.visible().count(), 1);
    }
}
