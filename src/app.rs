// app.rs — shell state: the loaded tour, one session, navigation and editing

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Instant;

use glam::Vec2;
use panorama_tour::config::{LaunchOptions, ViewerConfig};
use panorama_tour::controls::TouchPhase;
use panorama_tour::editor::{HotspotEditor, UiState};
use panorama_tour::i18n;
use panorama_tour::projector::Viewport;
use panorama_tour::session::{PanoramaSession, TextureOutcome};
use panorama_tour::store::{JsonTourStore, StoreRequest, StoreResponse, StoreWorker};
use panorama_tour::texture::{self, TextureEvent};
use panorama_tour::tour::Tour;
use panorama_tour::transition::{NavEvent, SceneNavigator};
use winit::window::{Fullscreen, Window};

use crate::renderer::Renderer;
use crate::ui::{EditorAction, UiAction};

/// Pointer travel, in points, below which a press/release pair counts as a click.
const CLICK_SLOP: f32 = 4.0;

pub struct App {
    pub config: ViewerConfig,
    pub tour_path: Option<PathBuf>,
    pub tour: Option<Tour>,
    /// Fatal load problem; the shell shows an error screen instead of the tour.
    pub load_error: Option<String>,
    pub session: PanoramaSession,
    pub navigator: Option<SceneNavigator>,
    /// Present while editor mode is on.
    pub editor: Option<HotspotEditor>,
    pub texture_pending: bool,
    pub texture_error: Option<String>,
    pub show_fps: bool,
    pub is_fullscreen: bool,
    pub current_lang: String,
    pub exit_requested: bool,

    worker: Option<StoreWorker>,
    texture_tx: Sender<TextureEvent>,
    texture_rx: Receiver<TextureEvent>,
    start_scene: Option<String>,
    want_editor: bool,
    cursor: Option<Vec2>,
    press_at: Option<Vec2>,
}

impl App {
    pub fn new(options: &LaunchOptions, config: ViewerConfig, viewport: Viewport, lang: String) -> Self {
        let (texture_tx, texture_rx) = channel();
        let session = PanoramaSession::viewer(config.clone(), viewport);
        let mut app = Self {
            config,
            tour_path: None,
            tour: None,
            load_error: None,
            session,
            navigator: None,
            editor: None,
            texture_pending: false,
            texture_error: None,
            show_fps: false,
            is_fullscreen: false,
            current_lang: lang,
            exit_requested: false,
            worker: None,
            texture_tx,
            texture_rx,
            start_scene: options.start_scene.clone(),
            want_editor: options.editor,
            cursor: None,
            press_at: None,
        };
        if let Some(path) = &options.tour {
            app.open_tour(path.clone());
        }
        app
    }

    pub fn open_tour(&mut self, path: PathBuf) {
        log::info!(
            "{}",
            i18n::tr_with("log.tour_loading", &[("path", path.display().to_string())])
        );
        self.tour_path = Some(path.clone());
        self.editor = None;
        self.worker = None;
        match JsonTourStore::open(path) {
            Ok(store) => {
                let tour = store.tour().clone();
                self.worker = Some(StoreWorker::spawn(store));
                self.install_tour(tour);
            }
            Err(e) => self.fail(i18n::tr_with("error.tour_load", &[("err", e.to_string())])),
        }
    }

    pub fn reload(&mut self) {
        if let Some(path) = self.tour_path.clone() {
            self.open_tour(path);
        }
    }

    fn fail(&mut self, message: String) {
        log::error!("{message}");
        self.load_error = Some(message);
        self.tour = None;
        self.navigator = None;
        self.editor = None;
    }

    fn install_tour(&mut self, tour: Tour) {
        let entry = self
            .start_scene
            .take()
            .filter(|s| tour.contains(s))
            .unwrap_or_else(|| tour.entry_scene.clone());
        if !tour.contains(&entry) {
            self.fail(i18n::tr("error.tour_empty"));
            return;
        }
        log::info!(
            "{}",
            i18n::tr_with(
                "log.tour_loaded",
                &[
                    ("name", tour.name.clone()),
                    ("scenes", tour.scenes.len().to_string())
                ]
            )
        );
        self.navigator = Some(SceneNavigator::new(
            entry.clone(),
            tour.scene_ids(),
            self.config.fade_out(),
            self.config.settle(),
        ));
        self.tour = Some(tour);
        self.load_error = None;
        self.enter_scene(&entry);
        if std::mem::take(&mut self.want_editor) {
            self.set_editor(true);
        }
    }

    fn enter_scene(&mut self, scene_id: &str) {
        let Some(scene) = self.tour.as_ref().and_then(|t| t.scene(scene_id)).cloned() else {
            self.fail(i18n::tr_with("error.scene_missing", &[("id", scene_id.to_string())]));
            return;
        };
        self.session.load_scene(&scene);
        if let Some(editor) = &mut self.editor {
            editor.reset_scene(&scene);
        }
        self.texture_error = None;

        if scene.image_url.trim().is_empty() {
            self.session.texture_failed(&scene.id);
            self.texture_pending = false;
            self.texture_error = Some(i18n::tr("error.no_image"));
            return;
        }
        let base = self.tour_path.as_deref().and_then(Path::parent);
        let path = texture::resolve_image_path(base, &scene.image_url);
        self.texture_pending = true;
        texture::start_load(scene.id.clone(), path, self.texture_tx.clone());
    }

    /// Drain background results and advance timers. Runs once per frame,
    /// before the frame loop steps.
    pub fn poll(&mut self, now: Instant, renderer: &mut Renderer) {
        while let Ok(event) = self.texture_rx.try_recv() {
            match event {
                TextureEvent::Loaded { scene_id, image } => match self.session.texture_loaded(&scene_id) {
                    TextureOutcome::Applied => {
                        self.texture_pending = false;
                        let image = texture::prepare_equirect(image, renderer.max_texture_dimension());
                        renderer.load_panorama(&scene_id, &image);
                    }
                    _ => log::debug!("dropping stale panorama for {scene_id}"),
                },
                TextureEvent::Failed { scene_id, error } => {
                    if self.session.texture_failed(&scene_id) != TextureOutcome::Stale {
                        self.texture_pending = false;
                        self.texture_error = Some(error);
                    }
                }
            }
        }

        let responses: Vec<StoreResponse> = match &self.worker {
            Some(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
            None => Vec::new(),
        };
        for response in responses {
            self.apply_store_response(response, now);
        }

        let event = self.navigator.as_mut().and_then(|n| n.advance(now));
        if let Some(NavEvent::SceneSwapped(id)) = event {
            self.enter_scene(&id);
        }

        if let Some(editor) = &self.editor {
            self.session.set_hotspots(editor.hotspots());
        }
        let locked = self.editor.as_ref().is_some_and(|e| e.camera_locked());
        if locked != self.session.input_locked() {
            self.session.set_input_locked(locked);
        }
    }

    fn apply_store_response(&mut self, response: StoreResponse, now: Instant) {
        let tour = match &mut self.editor {
            Some(editor) => editor.apply_response(&response, now).cloned(),
            None => match response {
                StoreResponse::Done { tour, .. } => Some(tour),
                StoreResponse::Failed { .. } => None,
            },
        };
        let Some(tour) = tour else {
            return;
        };
        if let Some(nav) = &mut self.navigator {
            nav.set_known_scenes(tour.scene_ids());
        }
        if let Some(scene) = self.session.scene_id().and_then(|id| tour.scene(id)) {
            self.session.refresh_scene(scene);
        }
        self.tour = Some(tour);
    }

    pub fn set_editor(&mut self, on: bool) {
        if on == self.editor.is_some() {
            return;
        }
        if on {
            let Some(scene) = self.session.scene() else {
                return;
            };
            self.editor = Some(HotspotEditor::new(scene, self.config.notification_lifetime()));
            self.session.set_margin(self.config.editor_margin);
        } else {
            self.editor = None;
            self.session.set_margin(self.config.viewer_margin);
            self.session.set_input_locked(false);
            if let Some(scene) = self
                .session
                .scene_id()
                .and_then(|id| self.tour.as_ref()?.scene(id))
                .cloned()
            {
                self.session.set_hotspots(&scene.hotspots);
            }
        }
        log::info!("editor mode {}", if on { "on" } else { "off" });
    }

    pub fn navigate(&mut self, target: &str, now: Instant) {
        if let Some(nav) = &mut self.navigator {
            if !nav.handle_scene_change(target, now) {
                log::debug!("scene change to {target:?} ignored");
            }
        }
    }

    pub fn go_back(&mut self, now: Instant) {
        if let Some(nav) = &mut self.navigator {
            nav.go_back(now);
        }
    }

    /// Escape: editor first, then fullscreen.
    pub fn cancel(&mut self, window: &Window) {
        match &mut self.editor {
            Some(editor) => editor.cancel(),
            None if self.is_fullscreen => self.toggle_fullscreen(window),
            None => {}
        }
    }

    pub fn toggle_fullscreen(&mut self, window: &Window) {
        self.is_fullscreen = !self.is_fullscreen;
        if self.is_fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            window.set_fullscreen(None);
        }
    }

    pub fn set_language(&mut self, lang: String, window: &Window) {
        i18n::init(lang.clone());
        self.current_lang = lang;
        window.set_title(&i18n::tr("app.title"));
    }

    pub fn handle(&mut self, action: UiAction, now: Instant, window: &Window) {
        match action {
            UiAction::OpenTour(path) => self.open_tour(path),
            UiAction::Reload => self.reload(),
            UiAction::Exit => self.exit_requested = true,
            UiAction::Navigate(id) => self.navigate(&id, now),
            UiAction::Back => self.go_back(now),
            UiAction::ResetView => self.session.reset_view(),
            UiAction::SetEditor(on) => self.set_editor(on),
            UiAction::ToggleFullscreen => self.toggle_fullscreen(window),
            UiAction::SetLanguage(lang) => self.set_language(lang, window),
            UiAction::Editor(action) => self.handle_editor(action),
        }
    }

    fn handle_editor(&mut self, action: EditorAction) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let request = match action {
            EditorAction::ToggleAdding => {
                editor.toggle_adding();
                None
            }
            EditorAction::Select(id) => {
                editor.select(&id);
                None
            }
            EditorAction::OpenEdit(id) => {
                editor.open_edit(&id);
                None
            }
            EditorAction::RequestDelete(id) => {
                editor.request_delete(&id);
                None
            }
            EditorAction::ConfirmDelete => editor.confirm_delete(),
            EditorAction::CloseOverlay => {
                *editor.ui_mut() = UiState::None;
                None
            }
            EditorAction::SubmitForm => editor.submit_form(),
            EditorAction::BeginDrag(id) => {
                editor.begin_drag(&id);
                None
            }
            EditorAction::DragTo(p) => {
                editor.drag_to(&self.session, p.x, p.y);
                None
            }
            EditorAction::EndDrag(p) => editor.end_drag(&self.session, p.x, p.y),
            EditorAction::SaveView => Some(editor.save_initial_view(&self.session)),
        };
        if let Some(request) = request {
            self.submit(request);
        }
    }

    fn submit(&self, request: StoreRequest) {
        match &self.worker {
            Some(worker) => worker.submit(request),
            None => log::warn!("no tour store; {:?} dropped", request.kind()),
        }
    }

    // Canvas input. Coordinates are logical points; egui already took what it wanted.

    /// Cursor position, tracked even while egui owns the pointer.
    pub fn track_cursor(&mut self, x: f32, y: f32) {
        self.cursor = Some(Vec2::new(x, y));
    }

    pub fn pointer_pressed(&mut self) {
        let Some(at) = self.cursor else {
            return;
        };
        self.press_at = Some(at);
        self.session.pointer_down(at.x, at.y);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.track_cursor(x, y);
        self.session.pointer_move(x, y);
    }

    pub fn pointer_released(&mut self) {
        self.session.pointer_up();
        let (Some(pressed), Some(at)) = (self.press_at.take(), self.cursor) else {
            return;
        };
        if pressed.distance(at) > CLICK_SLOP {
            return;
        }
        if let Some(editor) = &mut self.editor {
            editor.canvas_click(&self.session, at.x, at.y);
        }
    }

    /// The pointer left the window: end any pan, and commit a marker drag where
    /// the pointer was last seen.
    pub fn pointer_left(&mut self) {
        self.session.pointer_up();
        self.press_at = None;
        let Some(at) = self.cursor.take() else {
            return;
        };
        if self.editor.as_ref().is_some_and(|e| e.drag().is_some()) {
            self.handle_editor(EditorAction::EndDrag(at));
        }
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.session.apply_wheel_delta(delta_y);
    }

    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) {
        self.session.apply_touch(id, phase, x, y);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.session.resize(viewport);
    }
}
