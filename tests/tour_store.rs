// File-backed tour store and the editor's round trip through the worker.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use panorama_tour::config::ViewerConfig;
use panorama_tour::editor::{HotspotEditor, UiState};
use panorama_tour::projector::Viewport;
use panorama_tour::session::PanoramaSession;
use panorama_tour::store::{
    HotspotDraft, JsonTourStore, RequestKind, StoreRequest, StoreResponse, StoreWorker, TourStore,
};
use panorama_tour::tour::{HotspotKind, InitialView, Position, Tour};
use panorama_tour::TourError;

const TOUR: &str = r#"{
    "name": "Demo",
    "entryScene": "lobby",
    "scenes": {
        "lobby": {
            "name": "Lobby",
            "image": "lobby.jpg",
            "initialView": { "yaw": 0.0, "pitch": 0.0, "fov": 90 },
            "hotspots": [
                { "id": "hs_1", "type": "click", "position": { "x": -400, "y": 0, "z": 0 }, "targetScene": "pool" }
            ]
        },
        "pool": { "name": "Pool", "image": "pool.jpg" }
    }
}"#;

fn write_tour(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("tour.json");
    fs::write(&path, TOUR).unwrap();
    path
}

fn draft(target: &str) -> HotspotDraft {
    HotspotDraft {
        kind: HotspotKind::Click,
        position: Position::new(0.0, 0.0, -400.0),
        target_scene: Some(target.to_string()),
        label: "To the pool".into(),
        fov_trigger: None,
    }
}

#[test]
fn created_hotspot_is_persisted_with_fresh_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tour(dir.path());

    let mut store = JsonTourStore::open(&path).unwrap();
    let created = store.create_hotspot("lobby", draft("pool")).unwrap();
    assert_eq!(created.id, "hs_2");

    let reopened = JsonTourStore::open(&path).unwrap();
    let lobby = reopened.tour().scene("lobby").unwrap();
    assert_eq!(lobby.hotspots.len(), 2);
    assert_eq!(lobby.hotspot("hs_2").unwrap().label, "To the pool");
}

#[test]
fn invalid_drafts_are_rejected_and_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tour(dir.path());
    let mut store = JsonTourStore::open(&path).unwrap();

    assert!(matches!(
        store.create_hotspot("lobby", draft("lobby")),
        Err(TourError::InvalidHotspot(_))
    ));
    assert!(matches!(
        store.create_hotspot("lobby", draft("attic")),
        Err(TourError::SceneNotFound(_))
    ));
    assert!(matches!(
        store.delete_hotspot("hs_99"),
        Err(TourError::HotspotNotFound(_))
    ));

    let on_disk = JsonTourStore::open(&path).unwrap();
    assert_eq!(on_disk.tour().scene("lobby").unwrap().hotspots.len(), 1);
}

#[test]
fn zoom_hotspot_gets_default_trigger() {
    let mut store = JsonTourStore::in_memory(Tour::from_json(TOUR).unwrap());
    let mut d = draft("pool");
    d.kind = HotspotKind::Zoom;
    let h = store.create_hotspot("lobby", d).unwrap();
    assert_eq!(h.fov_trigger, Some(40.0));
}

#[test]
fn unchanged_position_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tour(dir.path());
    let mut store = JsonTourStore::open(&path).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    assert!(!store
        .update_hotspot_position("hs_1", Position::new(-400.0, 0.0, 0.0))
        .unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);

    assert!(store
        .update_hotspot_position("hs_1", Position::new(-390.0, 20.0, 5.0))
        .unwrap());
    let reopened = JsonTourStore::open(&path).unwrap();
    assert_eq!(
        reopened.tour().scene("lobby").unwrap().hotspot("hs_1").unwrap().position,
        Position::new(-390.0, 20.0, 5.0)
    );
}

#[test]
fn failed_write_leaves_store_matching_the_file() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("tour");
    fs::create_dir(&dir).unwrap();
    let path = write_tour(&dir);
    let mut store = JsonTourStore::open(&path).unwrap();

    fs::remove_dir_all(&dir).unwrap();
    let moved = Position::new(9.0, 9.0, 9.0);
    assert!(matches!(
        store.update_hotspot_position("hs_1", moved),
        Err(TourError::Io(_))
    ));
    assert!(matches!(
        store.create_hotspot("lobby", draft("pool")),
        Err(TourError::Io(_))
    ));
    let lobby = store.tour().scene("lobby").unwrap();
    assert_eq!(lobby.hotspots.len(), 1);
    assert_eq!(lobby.hotspot("hs_1").unwrap().position, Position::new(-400.0, 0.0, 0.0));

    fs::create_dir(&dir).unwrap();
    write_tour(&dir);
    assert!(store.update_hotspot_position("hs_1", moved).unwrap());
    let created = store.create_hotspot("lobby", draft("pool")).unwrap();
    assert_eq!(created.id, "hs_2");

    let reopened = JsonTourStore::open(&path).unwrap();
    let lobby = reopened.tour().scene("lobby").unwrap();
    assert_eq!(lobby.hotspot("hs_1").unwrap().position, moved);
    assert_eq!(lobby.hotspots.len(), 2);
}

#[test]
fn malformed_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(JsonTourStore::open(&path), Err(TourError::Json(_))));
    assert!(matches!(
        JsonTourStore::open(dir.path().join("missing.json")),
        Err(TourError::Io(_))
    ));
}

#[test]
fn editor_round_trip_through_worker() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tour(dir.path());
    let store = JsonTourStore::open(&path).unwrap();
    let tour = store.tour().clone();
    let worker = StoreWorker::spawn(store);

    let mut session = PanoramaSession::editor(ViewerConfig::default(), Viewport::new(800.0, 600.0));
    let lobby = tour.scene("lobby").unwrap();
    session.load_scene(lobby);
    session.tick();

    let mut editor = HotspotEditor::new(lobby, Duration::from_secs(3));
    editor.toggle_adding();
    assert!(editor.camera_locked());
    assert!(editor.canvas_click(&session, 400.0, 300.0));
    assert!(!editor.camera_locked());

    if let UiState::Form(form) = editor.ui_mut() {
        form.target_scene = "pool".into();
        form.label = "Pool".into();
    }
    let request = editor.submit_form().expect("valid form");
    assert_eq!(request.kind(), RequestKind::Create);
    worker.submit(request);

    let response = worker.recv().unwrap();
    let now = Instant::now();
    let updated = editor.apply_response(&response, now).cloned().expect("store accepted the hotspot");
    assert_eq!(editor.ui(), &UiState::None);
    assert_eq!(editor.hotspots().len(), 2);
    assert_eq!(updated.scene("lobby").unwrap().hotspots.len(), 2);
    assert_eq!(
        editor.notification(now).map(|n| n.key),
        Some("editor.notice.created")
    );

    worker.submit(StoreRequest::SaveView {
        scene_id: "lobby".into(),
        view: InitialView {
            yaw: 0.5,
            pitch: -0.1,
            fov: 60.0,
        },
    });
    match worker.recv().unwrap() {
        StoreResponse::Done { kind, tour } => {
            assert_eq!(kind, RequestKind::SaveView);
            assert_eq!(tour.scene("lobby").unwrap().initial_view.fov, 60.0);
        }
        other => panic!("unexpected {other:?}"),
    }

    let on_disk = JsonTourStore::open(&path).unwrap();
    assert_eq!(on_disk.tour().scene("lobby").unwrap().initial_view.yaw, 0.5);
}
