// tour.rs — tour / scene / hotspot records as the data service hands them out
//
// Wire format is the tour export: camelCase keys, scenes keyed by id. The
// snake_case names the backend stores are accepted as aliases.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Starting view of a scene. `yaw`/`pitch` are radians, `fov` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotKind {
    /// Navigates when clicked.
    #[default]
    Click,
    /// Carries a `fovTrigger`; displayed but not clickable.
    Zoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: HotspotKind,
    #[serde(default)]
    pub position: Position,
    #[serde(alias = "target_scene", default)]
    pub target_scene: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(alias = "fov_trigger", default, skip_serializing_if = "Option::is_none")]
    pub fov_trigger: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "image", alias = "imageURL", alias = "image_url", alias = "panorama", default)]
    pub image_url: String,
    #[serde(alias = "initial_view", default)]
    pub initial_view: InitialView,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

impl Scene {
    pub fn hotspot(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "entry_scene", default)]
    pub entry_scene: String,
    #[serde(default)]
    pub scenes: HashMap<String, Scene>,
}

impl Tour {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut tour: Tour = serde_json::from_str(text)?;
        tour.normalize();
        Ok(tour)
    }

    /// Scene ids come from the map keys; a record that omits or disagrees is
    /// overwritten. An unknown entry scene falls back to the first id.
    pub fn normalize(&mut self) {
        for (id, scene) in self.scenes.iter_mut() {
            if scene.id != *id {
                scene.id = id.clone();
            }
        }
        if !self.scenes.contains_key(&self.entry_scene) {
            if let Some(first) = self.scene_ids().first() {
                self.entry_scene = first.clone();
            }
        }
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scene_mut(&mut self, id: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    /// Ids in a stable display order.
    pub fn scene_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scenes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Scene that owns a hotspot id.
    pub fn scene_of_hotspot(&self, hotspot_id: &str) -> Option<&Scene> {
        self.scenes
            .values()
            .find(|s| s.hotspots.iter().any(|h| h.id == hotspot_id))
    }

    pub fn hotspot_mut(&mut self, hotspot_id: &str) -> Option<&mut Hotspot> {
        self.scenes
            .values_mut()
            .flat_map(|s| s.hotspots.iter_mut())
            .find(|h| h.id == hotspot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "name": "Demo",
        "entryScene": "lobby",
        "scenes": {
            "lobby": {
                "name": "Lobby",
                "image": "lobby.jpg",
                "initialView": { "yaw": 0, "pitch": 0, "fov": 90 },
                "hotspots": [
                    { "id": "h1", "type": "click", "position": { "x": 400, "y": 0, "z": 0 },
                      "targetScene": "pool", "label": "Pool" }
                ]
            },
            "pool": {
                "id": "pool",
                "name": "Pool",
                "image_url": "pool.jpg",
                "initial_view": { "yaw": 1.0 },
                "hotspots": [
                    { "id": "h2", "type": "zoom", "position": { "x": 0, "y": 0, "z": 400 },
                      "target_scene": "lobby", "fov_trigger": 40 }
                ]
            }
        }
    }"#;

    #[test]
    fn reads_export_and_backend_names() {
        let tour = Tour::from_json(EXPORT).unwrap();
        let lobby = tour.scene("lobby").unwrap();
        assert_eq!(lobby.id, "lobby");
        assert_eq!(lobby.image_url, "lobby.jpg");
        assert_eq!(lobby.initial_view.fov, 90.0);
        assert_eq!(lobby.hotspots[0].target_scene.as_deref(), Some("pool"));

        let pool = tour.scene("pool").unwrap();
        assert_eq!(pool.image_url, "pool.jpg");
        assert_eq!(pool.initial_view.fov, 100.0);
        assert_eq!(pool.hotspots[0].kind, HotspotKind::Zoom);
        assert_eq!(pool.hotspots[0].fov_trigger, Some(40.0));
        assert_eq!(tour.scene_of_hotspot("h2").map(|s| s.id.as_str()), Some("pool"));
    }

    #[test]
    fn bad_entry_falls_back() {
        let mut tour = Tour::from_json(EXPORT).unwrap();
        tour.entry_scene = "nope".into();
        tour.normalize();
        assert_eq!(tour.entry_scene, "lobby");
    }
}
