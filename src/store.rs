// store.rs — the data service boundary
//
// `TourStore` is what the engine needs from the backend. `JsonTourStore`
// keeps the tour export in a JSON file. `StoreWorker` runs requests on a
// background thread so the frame loop never waits on them.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use crate::error::TourError;
use crate::tour::{Hotspot, HotspotKind, InitialView, Position, Scene, Tour};

pub const DEFAULT_FOV_TRIGGER: f32 = 40.0;

/// Editable hotspot fields, as submitted by the editor form.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotDraft {
    pub kind: HotspotKind,
    pub position: Position,
    pub target_scene: Option<String>,
    pub label: String,
    pub fov_trigger: Option<f32>,
}

impl HotspotDraft {
    fn into_hotspot(self, id: String) -> Hotspot {
        let fov_trigger = match self.kind {
            HotspotKind::Zoom => Some(self.fov_trigger.unwrap_or(DEFAULT_FOV_TRIGGER)),
            HotspotKind::Click => None,
        };
        Hotspot {
            id,
            kind: self.kind,
            position: self.position,
            target_scene: self.target_scene.filter(|t| !t.is_empty()),
            label: self.label,
            fov_trigger,
        }
    }
}

pub trait TourStore {
    fn load_tour(&mut self) -> Result<Tour, TourError>;

    fn scene(&self, scene_id: &str) -> Result<Scene, TourError>;

    fn create_hotspot(&mut self, scene_id: &str, draft: HotspotDraft) -> Result<Hotspot, TourError>;

    fn update_hotspot(&mut self, hotspot_id: &str, draft: HotspotDraft) -> Result<Hotspot, TourError>;

    /// Returns `false` when the stored position already matched.
    fn update_hotspot_position(&mut self, hotspot_id: &str, position: Position) -> Result<bool, TourError>;

    fn delete_hotspot(&mut self, hotspot_id: &str) -> Result<(), TourError>;

    fn update_scene_view(&mut self, scene_id: &str, view: InitialView) -> Result<(), TourError>;

    /// Persist the current state. Mutating calls save on their own.
    fn save(&self) -> Result<(), TourError>;
}

pub struct JsonTourStore {
    path: Option<PathBuf>,
    tour: Tour,
    next_id: u64,
}

impl JsonTourStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TourError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        let tour = Tour::from_json(&text)?;
        log::info!("loaded tour {:?} ({} scenes)", tour.name, tour.scenes.len());
        Ok(Self::with_path(Some(path), tour))
    }

    /// Store that never touches the disk.
    pub fn in_memory(mut tour: Tour) -> Self {
        tour.normalize();
        Self::with_path(None, tour)
    }

    fn with_path(path: Option<PathBuf>, tour: Tour) -> Self {
        let next_id = tour
            .scenes
            .values()
            .flat_map(|s| s.hotspots.iter())
            .filter_map(|h| h.id.strip_prefix("hs_")?.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        Self {
            path,
            tour,
            next_id,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    /// Next unused `hs_<n>` id and the counter value that follows it.
    /// The counter only advances once the hotspot is saved.
    fn fresh_id(&self) -> (String, u64) {
        let mut n = self.next_id;
        loop {
            let id = format!("hs_{n}");
            n += 1;
            if self.tour.scene_of_hotspot(&id).is_none() {
                return (id, n);
            }
        }
    }

    /// Write `next` to disk, then adopt it. On failure the store keeps the
    /// state that matches the file.
    fn commit(&mut self, next: Tour) -> Result<(), TourError> {
        write_tour(self.path.as_deref(), &next)?;
        self.tour = next;
        Ok(())
    }

    fn validate(&self, scene_id: &str, draft: &HotspotDraft) -> Result<(), TourError> {
        let Some(target) = draft.target_scene.as_deref().filter(|t| !t.is_empty()) else {
            return Err(TourError::InvalidHotspot("target scene is required".into()));
        };
        if target == scene_id {
            return Err(TourError::InvalidHotspot("hotspot cannot target its own scene".into()));
        }
        if !self.tour.contains(target) {
            return Err(TourError::SceneNotFound(target.to_string()));
        }
        let p = draft.position;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(TourError::InvalidHotspot("position is not finite".into()));
        }
        Ok(())
    }
}

impl TourStore for JsonTourStore {
    fn load_tour(&mut self) -> Result<Tour, TourError> {
        Ok(self.tour.clone())
    }

    fn scene(&self, scene_id: &str) -> Result<Scene, TourError> {
        self.tour
            .scene(scene_id)
            .cloned()
            .ok_or_else(|| TourError::SceneNotFound(scene_id.to_string()))
    }

    fn create_hotspot(&mut self, scene_id: &str, draft: HotspotDraft) -> Result<Hotspot, TourError> {
        if !self.tour.contains(scene_id) {
            return Err(TourError::SceneNotFound(scene_id.to_string()));
        }
        self.validate(scene_id, &draft)?;
        let (id, next_id) = self.fresh_id();
        let hotspot = draft.into_hotspot(id);
        let mut next = self.tour.clone();
        if let Some(scene) = next.scene_mut(scene_id) {
            scene.hotspots.push(hotspot.clone());
        }
        self.commit(next)?;
        self.next_id = next_id;
        log::info!("created hotspot {} in {}", hotspot.id, scene_id);
        Ok(hotspot)
    }

    fn update_hotspot(&mut self, hotspot_id: &str, draft: HotspotDraft) -> Result<Hotspot, TourError> {
        let scene_id = self
            .tour
            .scene_of_hotspot(hotspot_id)
            .map(|s| s.id.clone())
            .ok_or_else(|| TourError::HotspotNotFound(hotspot_id.to_string()))?;
        self.validate(&scene_id, &draft)?;
        let updated = draft.into_hotspot(hotspot_id.to_string());
        let mut next = self.tour.clone();
        if let Some(h) = next.hotspot_mut(hotspot_id) {
            *h = updated.clone();
        }
        self.commit(next)?;
        Ok(updated)
    }

    fn update_hotspot_position(&mut self, hotspot_id: &str, position: Position) -> Result<bool, TourError> {
        let mut next = self.tour.clone();
        let h = next
            .hotspot_mut(hotspot_id)
            .ok_or_else(|| TourError::HotspotNotFound(hotspot_id.to_string()))?;
        if h.position == position {
            return Ok(false);
        }
        h.position = position;
        self.commit(next)?;
        Ok(true)
    }

    fn delete_hotspot(&mut self, hotspot_id: &str) -> Result<(), TourError> {
        let mut next = self.tour.clone();
        let mut found = false;
        for scene in next.scenes.values_mut() {
            let before = scene.hotspots.len();
            scene.hotspots.retain(|h| h.id != hotspot_id);
            found |= scene.hotspots.len() != before;
        }
        if !found {
            return Err(TourError::HotspotNotFound(hotspot_id.to_string()));
        }
        self.commit(next)?;
        log::info!("deleted hotspot {hotspot_id}");
        Ok(())
    }

    fn update_scene_view(&mut self, scene_id: &str, view: InitialView) -> Result<(), TourError> {
        let mut next = self.tour.clone();
        let scene = next
            .scene_mut(scene_id)
            .ok_or_else(|| TourError::SceneNotFound(scene_id.to_string()))?;
        scene.initial_view = view;
        self.commit(next)
    }

    fn save(&self) -> Result<(), TourError> {
        write_tour(self.path.as_deref(), &self.tour)
    }
}

/// Written to a sibling temp file first, then renamed over the tour. A store
/// without a path has nothing to write.
fn write_tour(path: Option<&Path>, tour: &Tour) -> Result<(), TourError> {
    let Some(path) = path else {
        return Ok(());
    };
    let text = serde_json::to_string_pretty(tour)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    Create { scene_id: String, draft: HotspotDraft },
    Update { hotspot_id: String, draft: HotspotDraft },
    UpdatePosition { hotspot_id: String, position: Position },
    Delete { hotspot_id: String },
    SaveView { scene_id: String, view: InitialView },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Update,
    UpdatePosition,
    Delete,
    SaveView,
}

impl StoreRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            StoreRequest::Create { .. } => RequestKind::Create,
            StoreRequest::Update { .. } => RequestKind::Update,
            StoreRequest::UpdatePosition { .. } => RequestKind::UpdatePosition,
            StoreRequest::Delete { .. } => RequestKind::Delete,
            StoreRequest::SaveView { .. } => RequestKind::SaveView,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreResponse {
    /// The request succeeded; `tour` is the store's state afterwards.
    Done { kind: RequestKind, tour: Tour },
    Failed { kind: RequestKind, error: String },
}

pub fn execute(store: &mut dyn TourStore, request: StoreRequest) -> StoreResponse {
    let kind = request.kind();
    let result = match request {
        StoreRequest::Create { scene_id, draft } => store.create_hotspot(&scene_id, draft).map(|_| ()),
        StoreRequest::Update { hotspot_id, draft } => store.update_hotspot(&hotspot_id, draft).map(|_| ()),
        StoreRequest::UpdatePosition {
            hotspot_id,
            position,
        } => store.update_hotspot_position(&hotspot_id, position).map(|_| ()),
        StoreRequest::Delete { hotspot_id } => store.delete_hotspot(&hotspot_id),
        StoreRequest::SaveView { scene_id, view } => store.update_scene_view(&scene_id, view),
    };
    match result.and_then(|_| store.load_tour()) {
        Ok(tour) => StoreResponse::Done { kind, tour },
        Err(e) => {
            log::error!("{kind:?} failed: {e}");
            StoreResponse::Failed {
                kind,
                error: e.to_string(),
            }
        }
    }
}

/// Owns a store on its own thread. Dropping the worker closes the request
/// channel, which ends the thread.
pub struct StoreWorker {
    requests: Sender<StoreRequest>,
    responses: Receiver<StoreResponse>,
}

impl StoreWorker {
    pub fn spawn<S>(mut store: S) -> Self
    where
        S: TourStore + Send + 'static,
    {
        let (req_tx, req_rx) = channel::<StoreRequest>();
        let (resp_tx, resp_rx) = channel::<StoreResponse>();
        thread::spawn(move || {
            while let Ok(request) = req_rx.recv() {
                if resp_tx.send(execute(&mut store, request)).is_err() {
                    break;
                }
            }
        });
        Self {
            requests: req_tx,
            responses: resp_rx,
        }
    }

    pub fn submit(&self, request: StoreRequest) {
        let kind = request.kind();
        if self.requests.send(request).is_err() {
            log::error!("store worker is gone; {kind:?} dropped");
        }
    }

    pub fn try_recv(&self) -> Option<StoreResponse> {
        self.responses.try_recv().ok()
    }

    /// Blocking receive, for callers that must wait (tests, shutdown).
    pub fn recv(&self) -> Option<StoreResponse> {
        self.responses.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tour() -> Tour {
        Tour::from_json(
            r#"{ "entryScene": "a", "scenes": {
                "a": { "name": "A", "hotspots": [
                    { "id": "hs_3", "position": { "x": 1, "y": 2, "z": 3 }, "targetScene": "b" } ] },
                "b": { "name": "B" } } }"#,
        )
        .unwrap()
    }

    fn draft(target: &str) -> HotspotDraft {
        HotspotDraft {
            kind: HotspotKind::Zoom,
            position: Position::new(0.0, 0.0, -400.0),
            target_scene: Some(target.into()),
            label: "Go".into(),
            fov_trigger: None,
        }
    }

    #[test]
    fn create_picks_fresh_id_and_defaults_trigger() {
        let mut s = JsonTourStore::in_memory(tour());
        let h = s.create_hotspot("a", draft("b")).unwrap();
        assert_eq!(h.id, "hs_4");
        assert_eq!(h.fov_trigger, Some(DEFAULT_FOV_TRIGGER));
        assert_eq!(s.tour().scene("a").unwrap().hotspots.len(), 2);
    }

    #[test]
    fn rejects_bad_targets() {
        let mut s = JsonTourStore::in_memory(tour());
        assert!(matches!(
            s.create_hotspot("a", draft("a")),
            Err(TourError::InvalidHotspot(_))
        ));
        assert!(matches!(
            s.create_hotspot("a", draft("zzz")),
            Err(TourError::SceneNotFound(_))
        ));
        assert!(matches!(
            s.create_hotspot("nope", draft("b")),
            Err(TourError::SceneNotFound(_))
        ));
    }

    #[test]
    fn same_position_is_noop() {
        let mut s = JsonTourStore::in_memory(tour());
        let p = Position::new(1.0, 2.0, 3.0);
        assert!(!s.update_hotspot_position("hs_3", p).unwrap());
        assert!(s.update_hotspot_position("hs_3", Position::new(4.0, 2.0, 3.0)).unwrap());
        assert!(!s.update_hotspot_position("hs_3", Position::new(4.0, 2.0, 3.0)).unwrap());
    }

    #[test]
    fn delete_missing_reports() {
        let mut s = JsonTourStore::in_memory(tour());
        s.delete_hotspot("hs_3").unwrap();
        assert!(matches!(s.delete_hotspot("hs_3"), Err(TourError::HotspotNotFound(_))));
    }

    #[test]
    fn worker_round_trip() {
        let worker = StoreWorker::spawn(JsonTourStore::in_memory(tour()));
        worker.submit(StoreRequest::Delete {
            hotspot_id: "hs_3".into(),
        });
        match worker.recv() {
            Some(StoreResponse::Done { kind, tour }) => {
                assert_eq!(kind, RequestKind::Delete);
                assert!(tour.scene("a").unwrap().hotspots.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
        worker.submit(StoreRequest::Delete {
            hotspot_id: "hs_3".into(),
        });
        assert!(matches!(worker.recv(), Some(StoreResponse::Failed { .. })));
    }
}
