// editor.rs — hotspot placement protocol for the admin editor
//
// Mode:  Idle <-> Adding        (toolbar toggle; a canvas click in Adding opens
//                                the create form and returns to Idle)
// Drag:  none <-> Dragging(id)  (pointer-down on a marker; release commits)
//
// While Adding or Dragging the camera must not pan; the shell asks
// `camera_locked()` and forwards it to the session.
//
// Modal and notification state live in explicit values here, not globals.

use std::time::{Duration, Instant};

use crate::session::PanoramaSession;
use crate::store::{HotspotDraft, RequestKind, StoreRequest, StoreResponse, DEFAULT_FOV_TRIGGER};
use crate::tour::{Hotspot, HotspotKind, InitialView, Position, Scene, Tour};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Idle,
    Adding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub hotspot_id: String,
    pub start: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotspotForm {
    pub mode: FormMode,
    pub kind: HotspotKind,
    pub target_scene: String,
    pub label: String,
    pub fov_trigger: Option<f32>,
    pub position: Position,
    /// i18n key of the last validation problem.
    pub error: Option<&'static str>,
    /// Submitted and waiting on the store.
    pub pending: bool,
}

impl HotspotForm {
    pub fn create(position: Position) -> Self {
        Self {
            mode: FormMode::Create,
            kind: HotspotKind::Click,
            target_scene: String::new(),
            label: String::new(),
            fov_trigger: None,
            position,
            error: None,
            pending: false,
        }
    }

    pub fn edit(h: &Hotspot) -> Self {
        Self {
            mode: FormMode::Edit(h.id.clone()),
            kind: h.kind,
            target_scene: h.target_scene.clone().unwrap_or_default(),
            label: h.label.clone(),
            fov_trigger: h.fov_trigger,
            position: h.position,
            error: None,
            pending: false,
        }
    }

    fn draft(&self) -> HotspotDraft {
        HotspotDraft {
            kind: self.kind,
            position: self.position,
            target_scene: Some(self.target_scene.clone()).filter(|t| !t.is_empty()),
            label: self.label.trim().to_string(),
            fov_trigger: match self.kind {
                HotspotKind::Zoom => Some(self.fov_trigger.unwrap_or(DEFAULT_FOV_TRIGGER)),
                HotspotKind::Click => None,
            },
        }
    }
}

/// What the editor overlay currently shows on top of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum UiState {
    None,
    Form(HotspotForm),
    ConfirmDelete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NoticeLevel,
    /// i18n key.
    pub key: &'static str,
    pub detail: String,
    pub expires: Instant,
}

pub struct HotspotEditor {
    scene_id: String,
    hotspots: Vec<Hotspot>,
    mode: EditorMode,
    drag: Option<DragState>,
    selected: Option<String>,
    ui: UiState,
    notification: Option<Notification>,
    notice_lifetime: Duration,
}

impl HotspotEditor {
    pub fn new(scene: &Scene, notice_lifetime: Duration) -> Self {
        Self {
            scene_id: scene.id.clone(),
            hotspots: scene.hotspots.clone(),
            mode: EditorMode::Idle,
            drag: None,
            selected: None,
            ui: UiState::None,
            notification: None,
            notice_lifetime,
        }
    }

    /// Switch to another scene, dropping every transient state.
    pub fn reset_scene(&mut self, scene: &Scene) {
        self.scene_id = scene.id.clone();
        self.hotspots = scene.hotspots.clone();
        self.mode = EditorMode::Idle;
        self.drag = None;
        self.selected = None;
        self.ui = UiState::None;
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn camera_locked(&self) -> bool {
        self.mode == EditorMode::Adding || self.drag.is_some()
    }

    pub fn toggle_adding(&mut self) {
        self.mode = match self.mode {
            EditorMode::Idle => EditorMode::Adding,
            EditorMode::Adding => EditorMode::Idle,
        };
    }

    /// Escape: leave adding mode, otherwise close the overlay.
    pub fn cancel(&mut self) {
        if self.mode == EditorMode::Adding {
            self.mode = EditorMode::Idle;
        } else {
            self.ui = UiState::None;
        }
    }

    /// A click on the canvas. In adding mode this opens the create form at the
    /// clicked sphere point and returns `true`; otherwise it is left to the camera.
    pub fn canvas_click(&mut self, session: &PanoramaSession, x: f32, y: f32) -> bool {
        if self.mode != EditorMode::Adding {
            return false;
        }
        let Some(position) = session.pick(x, y) else {
            return false;
        };
        self.ui = UiState::Form(HotspotForm::create(position));
        self.mode = EditorMode::Idle;
        true
    }

    pub fn select(&mut self, hotspot_id: &str) {
        if self.mode == EditorMode::Idle && self.drag.is_none() {
            self.selected = Some(hotspot_id.to_string());
        }
    }

    pub fn begin_drag(&mut self, hotspot_id: &str) -> bool {
        if self.mode == EditorMode::Adding {
            return false;
        }
        let Some(h) = self.hotspots.iter().find(|h| h.id == hotspot_id) else {
            return false;
        };
        self.drag = Some(DragState {
            hotspot_id: h.id.clone(),
            start: h.position,
        });
        self.selected = Some(hotspot_id.to_string());
        true
    }

    /// Move the dragged marker (optimistically, in the local list only).
    pub fn drag_to(&mut self, session: &PanoramaSession, x: f32, y: f32) {
        let Some(drag) = &self.drag else {
            return;
        };
        let Some(position) = session.pick(x, y) else {
            return;
        };
        let id = drag.hotspot_id.clone();
        self.set_local_position(&id, position);
    }

    /// Pointer-up or pointer-leave. Emits the position update unless the
    /// marker ended where it started. When the release point cannot be picked
    /// (empty viewport) the last dragged-to position is committed.
    pub fn end_drag(&mut self, session: &PanoramaSession, x: f32, y: f32) -> Option<StoreRequest> {
        let drag = self.drag.take()?;
        let position = match session.pick(x, y) {
            Some(p) => {
                self.set_local_position(&drag.hotspot_id, p);
                p
            }
            None => self.hotspots.iter().find(|h| h.id == drag.hotspot_id)?.position,
        };
        if position == drag.start {
            return None;
        }
        Some(StoreRequest::UpdatePosition {
            hotspot_id: drag.hotspot_id,
            position,
        })
    }

    pub fn open_edit(&mut self, hotspot_id: &str) {
        if let Some(h) = self.hotspots.iter().find(|h| h.id == hotspot_id) {
            self.ui = UiState::Form(HotspotForm::edit(h));
        }
    }

    /// Validate the open form and turn it into a store request. The form stays
    /// open until the store confirms.
    pub fn submit_form(&mut self) -> Option<StoreRequest> {
        let scene_id = self.scene_id.clone();
        let UiState::Form(form) = &mut self.ui else {
            return None;
        };
        if form.pending {
            return None;
        }
        if form.target_scene.is_empty() {
            form.error = Some("editor.error.target_required");
            return None;
        }
        if form.target_scene == scene_id {
            form.error = Some("editor.error.target_self");
            return None;
        }
        form.error = None;
        form.pending = true;
        let draft = form.draft();
        Some(match &form.mode {
            FormMode::Create => StoreRequest::Create { scene_id, draft },
            FormMode::Edit(id) => StoreRequest::Update {
                hotspot_id: id.clone(),
                draft,
            },
        })
    }

    pub fn request_delete(&mut self, hotspot_id: &str) {
        self.ui = UiState::ConfirmDelete(hotspot_id.to_string());
    }

    pub fn confirm_delete(&mut self) -> Option<StoreRequest> {
        if !matches!(self.ui, UiState::ConfirmDelete(_)) {
            return None;
        }
        let UiState::ConfirmDelete(id) = std::mem::replace(&mut self.ui, UiState::None) else {
            return None;
        };
        if self.selected.as_deref() == Some(id.as_str()) {
            self.selected = None;
        }
        Some(StoreRequest::Delete { hotspot_id: id })
    }

    pub fn save_initial_view(&self, session: &PanoramaSession) -> StoreRequest {
        let o = session.orientation();
        StoreRequest::SaveView {
            scene_id: self.scene_id.clone(),
            view: InitialView {
                yaw: o.yaw.to_radians(),
                pitch: o.pitch.to_radians(),
                fov: session.fov(),
            },
        }
    }

    /// Fold a store response back in. Success reloads the list from the store
    /// and closes the form; failure only notifies, so local optimistic state
    /// may stay stale.
    pub fn apply_response<'r>(
        &mut self,
        response: &'r StoreResponse,
        now: Instant,
    ) -> Option<&'r Tour> {
        match response {
            StoreResponse::Done { kind, tour } => {
                if let Some(scene) = tour.scene(&self.scene_id) {
                    self.hotspots = scene.hotspots.clone();
                }
                if matches!(kind, RequestKind::Create | RequestKind::Update) {
                    self.ui = UiState::None;
                }
                if let Some(sel) = &self.selected {
                    if !self.hotspots.iter().any(|h| &h.id == sel) {
                        self.selected = None;
                    }
                }
                self.notify(NoticeLevel::Success, success_key(*kind), String::new(), now);
                Some(tour)
            }
            StoreResponse::Failed { kind, error } => {
                if let UiState::Form(form) = &mut self.ui {
                    form.pending = false;
                }
                self.notify(NoticeLevel::Error, failure_key(*kind), error.clone(), now);
                None
            }
        }
    }

    pub fn notify(&mut self, level: NoticeLevel, key: &'static str, detail: String, now: Instant) {
        self.notification = Some(Notification {
            level,
            key,
            detail,
            expires: now + self.notice_lifetime,
        });
    }

    /// Current notification, dropping it once expired.
    pub fn notification(&mut self, now: Instant) -> Option<&Notification> {
        if self.notification.as_ref().is_some_and(|n| now >= n.expires) {
            self.notification = None;
        }
        self.notification.as_ref()
    }

    fn set_local_position(&mut self, hotspot_id: &str, position: Position) {
        if let Some(h) = self.hotspots.iter_mut().find(|h| h.id == hotspot_id) {
            h.position = position;
        }
    }
}

fn success_key(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Create => "editor.notice.created",
        RequestKind::Update => "editor.notice.updated",
        RequestKind::UpdatePosition => "editor.notice.moved",
        RequestKind::Delete => "editor.notice.deleted",
        RequestKind::SaveView => "editor.notice.view_saved",
    }
}

fn failure_key(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Create => "editor.error.create",
        RequestKind::Update => "editor.error.update",
        RequestKind::UpdatePosition => "editor.error.move",
        RequestKind::Delete => "editor.error.delete",
        RequestKind::SaveView => "editor.error.save_view",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::projector::Viewport;

    fn scene() -> Scene {
        Scene {
            id: "a".into(),
            name: "A".into(),
            description: String::new(),
            image_url: String::new(),
            initial_view: InitialView::default(),
            hotspots: vec![Hotspot {
                id: "h1".into(),
                kind: HotspotKind::Click,
                position: Position::new(-400.0, 0.0, 0.0),
                target_scene: Some("b".into()),
                label: "B".into(),
                fov_trigger: None,
            }],
        }
    }

    fn session() -> PanoramaSession {
        let mut s = PanoramaSession::editor(ViewerConfig::default(), Viewport::new(800.0, 600.0));
        s.load_scene(&scene());
        s.tick();
        s
    }

    #[test]
    fn adding_click_opens_form_and_returns_idle() {
        let s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        assert!(!ed.canvas_click(&s, 400.0, 300.0));

        ed.toggle_adding();
        assert!(ed.camera_locked());
        assert!(ed.canvas_click(&s, 400.0, 300.0));
        assert_eq!(ed.mode(), EditorMode::Idle);
        match ed.ui() {
            UiState::Form(f) => {
                assert_eq!(f.mode, FormMode::Create);
                assert_eq!(f.position, Position::new(-400.0, 0.0, 0.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn form_requires_other_target() {
        let s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        ed.toggle_adding();
        ed.canvas_click(&s, 400.0, 300.0);
        assert!(ed.submit_form().is_none());

        if let UiState::Form(f) = ed.ui_mut() {
            f.target_scene = "a".into();
        }
        assert!(ed.submit_form().is_none());

        if let UiState::Form(f) = ed.ui_mut() {
            f.target_scene = "b".into();
            f.kind = HotspotKind::Zoom;
        }
        match ed.submit_form() {
            Some(StoreRequest::Create { scene_id, draft }) => {
                assert_eq!(scene_id, "a");
                assert_eq!(draft.fov_trigger, Some(DEFAULT_FOV_TRIGGER));
            }
            other => panic!("unexpected {other:?}"),
        }
        // Pending: a second submit is swallowed.
        assert!(ed.submit_form().is_none());
    }

    #[test]
    fn drag_updates_locally_then_commits() {
        let s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        assert!(ed.begin_drag("h1"));
        assert!(ed.camera_locked());
        ed.drag_to(&s, 500.0, 300.0);
        let moved = ed.hotspots()[0].position;
        assert_ne!(moved, Position::new(-400.0, 0.0, 0.0));

        let req = ed.end_drag(&s, 500.0, 300.0);
        assert!(matches!(req, Some(StoreRequest::UpdatePosition { .. })));
        assert!(!ed.camera_locked());
    }

    #[test]
    fn release_over_empty_viewport_commits_last_position() {
        let mut s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        assert!(ed.begin_drag("h1"));
        ed.drag_to(&s, 500.0, 300.0);
        let moved = ed.hotspots()[0].position;

        s.resize(Viewport::new(0.0, 0.0));
        assert_eq!(
            ed.end_drag(&s, 500.0, 300.0),
            Some(StoreRequest::UpdatePosition {
                hotspot_id: "h1".into(),
                position: moved,
            })
        );
        assert!(ed.drag().is_none());
        assert_eq!(ed.hotspots()[0].position, moved);
    }

    #[test]
    fn drag_back_to_start_sends_nothing() {
        let s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        ed.begin_drag("h1");
        ed.drag_to(&s, 100.0, 100.0);
        assert_eq!(ed.end_drag(&s, 400.0, 300.0), None);
        assert_eq!(ed.hotspots()[0].position, Position::new(-400.0, 0.0, 0.0));
    }

    #[test]
    fn failure_keeps_optimistic_state_and_notifies() {
        let s = session();
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        ed.begin_drag("h1");
        ed.end_drag(&s, 600.0, 300.0);
        let local = ed.hotspots()[0].position;

        let t0 = Instant::now();
        let resp = StoreResponse::Failed {
            kind: RequestKind::UpdatePosition,
            error: "disk full".into(),
        };
        assert!(ed.apply_response(&resp, t0).is_none());
        assert_eq!(ed.hotspots()[0].position, local);
        assert_eq!(ed.notification(t0).map(|n| n.level), Some(NoticeLevel::Error));
        assert!(ed.notification(t0 + Duration::from_secs(3)).is_none());
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut ed = HotspotEditor::new(&scene(), Duration::from_secs(3));
        assert!(ed.confirm_delete().is_none());
        ed.select("h1");
        ed.request_delete("h1");
        assert_eq!(
            ed.confirm_delete(),
            Some(StoreRequest::Delete {
                hotspot_id: "h1".into()
            })
        );
        assert_eq!(ed.selected(), None);
        assert_eq!(ed.ui(), &UiState::None);
    }
}
