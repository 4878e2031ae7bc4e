// ui.rs — egui chrome: menu, status bar, viewer overlay and hotspot editor
//
// Drawing never mutates the tour directly; anything with side effects comes
// back as a `UiAction` for the shell to apply after the frame.

use std::path::PathBuf;
use std::time::Instant;

use egui::{Align2, Color32, RichText};
use glam::Vec2;
use panorama_tour::editor::{EditorMode, FormMode, HotspotEditor, NoticeLevel, UiState};
use panorama_tour::hotspots::{HotspotLayout, HotspotSink};
use panorama_tour::i18n;
use panorama_tour::store::DEFAULT_FOV_TRIGGER;
use panorama_tour::tour::{HotspotKind, Tour};

use crate::app::App;

const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("vi", "Tiếng Việt")];

pub enum UiAction {
    OpenTour(PathBuf),
    Reload,
    Exit,
    Navigate(String),
    Back,
    ResetView,
    SetEditor(bool),
    ToggleFullscreen,
    SetLanguage(String),
    Editor(EditorAction),
}

pub enum EditorAction {
    ToggleAdding,
    Select(String),
    OpenEdit(String),
    RequestDelete(String),
    ConfirmDelete,
    CloseOverlay,
    SubmitForm,
    BeginDrag(String),
    DragTo(Vec2),
    EndDrag(Vec2),
    SaveView,
}

pub struct FrameInfo {
    pub now: Instant,
    pub fps: f32,
    /// FOV as last reported by the frame loop.
    pub fov: f32,
}

pub fn pick_tour_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&i18n::tr("file.filter.tours"), &["json"])
        .pick_file()
}

pub fn draw(ctx: &egui::Context, app: &mut App, frame: &FrameInfo) -> Vec<UiAction> {
    let mut actions = Vec::new();
    draw_menu(ctx, app, &mut actions);

    if let Some(message) = &app.load_error {
        draw_error_screen(ctx, message, app.tour_path.is_some(), &mut actions);
        return actions;
    }
    if app.tour.is_none() {
        draw_welcome(ctx, &mut actions);
        return actions;
    }

    draw_status_bar(ctx, app, frame);
    if app.editor.is_some() {
        draw_editor(ctx, app, frame.now, &mut actions);
    } else {
        draw_viewer(ctx, app, &mut actions);
    }
    draw_fade(ctx, app, frame.now);
    actions
}

fn scene_name(tour: &Tour, id: &str) -> String {
    tour.scene(id)
        .map(|s| s.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(id)
        .to_string()
}

fn marker_text(tour: &Tour, kind: HotspotKind, label: &str, target: Option<&str>, id: &str) -> String {
    let name = if !label.trim().is_empty() {
        label.trim().to_string()
    } else if let Some(target) = target {
        scene_name(tour, target)
    } else {
        id.to_string()
    };
    match kind {
        HotspotKind::Click => format!("➡ {name}"),
        HotspotKind::Zoom => format!("🔍 {name}"),
    }
}

fn draw_menu(ctx: &egui::Context, app: &mut App, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(i18n::tr("menu.file"), |ui| {
                if ui.button(i18n::tr("menu.open_tour")).clicked() {
                    ui.close_menu();
                    if let Some(path) = pick_tour_file() {
                        actions.push(UiAction::OpenTour(path));
                    }
                }
                if ui
                    .add_enabled(app.tour_path.is_some(), egui::Button::new(i18n::tr("menu.reload")))
                    .clicked()
                {
                    actions.push(UiAction::Reload);
                    ui.close_menu();
                }
                if ui.button(i18n::tr("menu.exit")).clicked() {
                    actions.push(UiAction::Exit);
                }
            });

            ui.menu_button(i18n::tr("menu.view"), |ui| {
                if ui.button(i18n::tr("view.reset")).clicked() {
                    actions.push(UiAction::ResetView);
                    ui.close_menu();
                }
                let fullscreen = if app.is_fullscreen {
                    i18n::tr("view.fullscreen.exit")
                } else {
                    i18n::tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen).clicked() {
                    actions.push(UiAction::ToggleFullscreen);
                    ui.close_menu();
                }
                ui.separator();
                if ui.checkbox(&mut app.show_fps, i18n::tr("view.show_fps")).clicked() {
                    ui.close_menu();
                }
            });

            ui.menu_button(i18n::tr("menu.mode"), |ui| {
                let editing = app.editor.is_some();
                if ui.radio(!editing, i18n::tr("mode.viewer")).clicked() {
                    actions.push(UiAction::SetEditor(false));
                    ui.close_menu();
                }
                if ui
                    .add_enabled(app.tour.is_some(), egui::RadioButton::new(editing, i18n::tr("mode.editor")))
                    .clicked()
                {
                    actions.push(UiAction::SetEditor(true));
                    ui.close_menu();
                }
            });

            ui.menu_button(i18n::tr("menu.language"), |ui| {
                for (code, name) in LANGUAGES {
                    if ui.radio(app.current_lang == code, name).clicked() {
                        actions.push(UiAction::SetLanguage(code.to_string()));
                        ui.close_menu();
                    }
                }
            });
        });
    });
}

fn draw_error_screen(ctx: &egui::Context, message: &str, can_reload: bool, actions: &mut Vec<UiAction>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            ui.heading(RichText::new(i18n::tr("error.tour_title")).color(Color32::LIGHT_RED));
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                if can_reload && ui.button(i18n::tr("action.reload")).clicked() {
                    actions.push(UiAction::Reload);
                }
                if ui.button(i18n::tr("menu.open_tour")).clicked() {
                    if let Some(path) = pick_tour_file() {
                        actions.push(UiAction::OpenTour(path));
                    }
                }
            });
        });
    });
}

fn draw_welcome(ctx: &egui::Context, actions: &mut Vec<UiAction>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.35);
            ui.heading(i18n::tr("app.title"));
            ui.label(i18n::tr("welcome.hint"));
            ui.add_space(12.0);
            if ui.button(i18n::tr("menu.open_tour")).clicked() {
                if let Some(path) = pick_tour_file() {
                    actions.push(UiAction::OpenTour(path));
                }
            }
        });
    });
}

fn draw_status_bar(ctx: &egui::Context, app: &App, frame: &FrameInfo) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if app.texture_pending {
                ui.label(RichText::new(i18n::tr("status.loading_image")).color(Color32::YELLOW));
                ui.label("|");
            }
            if let Some(err) = &app.texture_error {
                ui.label(RichText::new(i18n::tr("status.image_failed")).color(Color32::LIGHT_RED))
                    .on_hover_text(err);
                ui.label("|");
            }
            if let (Some(tour), Some(id)) = (&app.tour, app.session.scene_id()) {
                ui.label(scene_name(tour, id));
                ui.label("|");
            }
            let o = app.session.orientation();
            ui.label(format!("FOV: {:.1}°", frame.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", o.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", o.pitch));
            if app.show_fps {
                ui.label("|");
                ui.label(RichText::new(format!("FPS: {:.1}", frame.fps)).color(Color32::GREEN));
            }
        });
    });
}

/// Viewer markers. Hidden hotspots are simply not drawn, so they cannot be clicked.
struct ViewerMarkers<'a> {
    ctx: &'a egui::Context,
    layout: &'a HotspotLayout,
    tour: &'a Tour,
    clicked: Option<String>,
}

impl HotspotSink for ViewerMarkers<'_> {
    fn show(&mut self, id: &str, at: Vec2) {
        let layout = self.layout;
        let Some(p) = layout.get(id) else {
            return;
        };
        let text = marker_text(self.tour, p.kind, &p.label, p.target_scene.as_deref(), &p.id);
        egui::Area::new(egui::Id::new(("hotspot", id)))
            .fixed_pos(egui::pos2(at.x, at.y))
            .pivot(Align2::CENTER_CENTER)
            .movable(false)
            .show(self.ctx, |ui| match p.kind {
                HotspotKind::Click => {
                    if ui.button(text).clicked() {
                        self.clicked = p.target_scene.clone();
                    }
                }
                HotspotKind::Zoom => {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(text);
                    });
                }
            });
    }

    fn hide(&mut self, _id: &str) {}
}

fn draw_viewer(ctx: &egui::Context, app: &App, actions: &mut Vec<UiAction>) {
    let (Some(tour), Some(nav)) = (&app.tour, &app.navigator) else {
        return;
    };

    let mut markers = ViewerMarkers {
        ctx,
        layout: app.session.layout(),
        tour,
        clicked: None,
    };
    app.session.layout().write_to(&mut markers);
    if let Some(target) = markers.clicked {
        actions.push(UiAction::Navigate(target));
    }

    if let Some(scene) = app.session.scene() {
        egui::Area::new("scene_title")
            .anchor(Align2::LEFT_TOP, [12.0, 36.0])
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.heading(scene_name(tour, &scene.id));
                    if !scene.description.trim().is_empty() {
                        ui.label(&scene.description);
                    }
                });
            });
    }

    egui::Area::new("scene_navigator")
        .anchor(Align2::CENTER_BOTTOM, [0.0, -36.0])
        .movable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if nav.can_go_back() && ui.button(i18n::tr("nav.back")).clicked() {
                        actions.push(UiAction::Back);
                    }
                    for id in tour.scene_ids() {
                        let current = id == nav.current();
                        if ui.selectable_label(current, scene_name(tour, &id)).clicked() && !current {
                            actions.push(UiAction::Navigate(id));
                        }
                    }
                });
            });
        });
}

/// Editor markers: clickable to select, draggable to move.
struct EditorMarkers<'a> {
    ctx: &'a egui::Context,
    layout: &'a HotspotLayout,
    tour: &'a Tour,
    selected: Option<&'a str>,
    actions: Vec<EditorAction>,
}

impl HotspotSink for EditorMarkers<'_> {
    fn show(&mut self, id: &str, at: Vec2) {
        let layout = self.layout;
        let Some(p) = layout.get(id) else {
            return;
        };
        let text = marker_text(self.tour, p.kind, &p.label, p.target_scene.as_deref(), &p.id);
        let selected = self.selected == Some(id);
        let ctx = self.ctx;
        egui::Area::new(egui::Id::new(("editor_hotspot", id)))
            .fixed_pos(egui::pos2(at.x, at.y))
            .pivot(Align2::CENTER_CENTER)
            .movable(false)
            .show(ctx, |ui| {
                let r = ui.add(
                    egui::Button::new(text)
                        .selected(selected)
                        .sense(egui::Sense::click_and_drag()),
                );
                let pointer = ctx.pointer_interact_pos().map(|p| Vec2::new(p.x, p.y));
                if r.drag_started() {
                    self.actions.push(EditorAction::BeginDrag(id.to_string()));
                } else if r.drag_released() {
                    if let Some(p) = pointer {
                        self.actions.push(EditorAction::EndDrag(p));
                    }
                } else if r.dragged() {
                    if let Some(p) = pointer {
                        self.actions.push(EditorAction::DragTo(p));
                    }
                }
                if r.double_clicked() {
                    self.actions.push(EditorAction::OpenEdit(id.to_string()));
                } else if r.clicked() {
                    self.actions.push(EditorAction::Select(id.to_string()));
                }
            });
    }

    fn hide(&mut self, _id: &str) {}
}

fn draw_editor(ctx: &egui::Context, app: &mut App, now: Instant, actions: &mut Vec<UiAction>) {
    let (Some(tour), Some(editor)) = (app.tour.as_ref(), app.editor.as_mut()) else {
        return;
    };
    let (fov_min, fov_max) = (app.config.fov_min, app.config.fov_max);

    egui::TopBottomPanel::top("editor_toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let adding = editor.mode() == EditorMode::Adding;
            let add_label = if adding {
                i18n::tr("editor.cancel_add")
            } else {
                i18n::tr("editor.add")
            };
            if ui.selectable_label(adding, add_label).clicked() {
                actions.push(UiAction::Editor(EditorAction::ToggleAdding));
            }
            if ui.button(i18n::tr("editor.save_view")).clicked() {
                actions.push(UiAction::Editor(EditorAction::SaveView));
            }
            ui.separator();
            let current = editor.scene_id().to_string();
            egui::ComboBox::from_id_source("editor_scene")
                .selected_text(scene_name(tour, &current))
                .show_ui(ui, |ui| {
                    for id in tour.scene_ids() {
                        if ui.selectable_label(id == current, scene_name(tour, &id)).clicked() && id != current {
                            actions.push(UiAction::Navigate(id));
                        }
                    }
                });
            if adding {
                ui.label(RichText::new(i18n::tr("editor.adding_hint")).color(Color32::YELLOW));
            }
        });
    });

    draw_hotspot_list(ctx, tour, editor, actions);

    let mut markers = EditorMarkers {
        ctx,
        layout: app.session.layout(),
        tour,
        selected: editor.selected(),
        actions: Vec::new(),
    };
    app.session.layout().write_to(&mut markers);
    actions.extend(markers.actions.into_iter().map(UiAction::Editor));

    let scene_id = editor.scene_id().to_string();
    match editor.ui_mut() {
        UiState::Form(form) => {
            let title = match form.mode {
                FormMode::Create => i18n::tr("editor.form.create_title"),
                FormMode::Edit(_) => i18n::tr("editor.form.edit_title"),
            };
            egui::Window::new(title)
                .id(egui::Id::new("hotspot_form"))
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.add_enabled_ui(!form.pending, |ui| {
                        egui::Grid::new("hotspot_form_grid")
                            .num_columns(2)
                            .spacing([12.0, 6.0])
                            .show(ui, |ui| {
                                ui.label(i18n::tr("editor.form.kind"));
                                ui.horizontal(|ui| {
                                    ui.radio_value(&mut form.kind, HotspotKind::Click, i18n::tr("hotspot.kind.click"));
                                    ui.radio_value(&mut form.kind, HotspotKind::Zoom, i18n::tr("hotspot.kind.zoom"));
                                });
                                ui.end_row();

                                ui.label(i18n::tr("editor.form.target"));
                                let selected = if form.target_scene.is_empty() {
                                    i18n::tr("editor.form.choose")
                                } else {
                                    scene_name(tour, &form.target_scene)
                                };
                                egui::ComboBox::from_id_source("form_target")
                                    .selected_text(selected)
                                    .show_ui(ui, |ui| {
                                        for id in tour.scene_ids().into_iter().filter(|id| *id != scene_id) {
                                            let name = scene_name(tour, &id);
                                            ui.selectable_value(&mut form.target_scene, id, name);
                                        }
                                    });
                                ui.end_row();

                                ui.label(i18n::tr("editor.form.label"));
                                ui.text_edit_singleline(&mut form.label);
                                ui.end_row();

                                if form.kind == HotspotKind::Zoom {
                                    ui.label(i18n::tr("editor.form.fov_trigger"));
                                    let mut fov = form.fov_trigger.unwrap_or(DEFAULT_FOV_TRIGGER);
                                    if ui
                                        .add(egui::DragValue::new(&mut fov).clamp_range(fov_min..=fov_max).suffix("°"))
                                        .changed()
                                    {
                                        form.fov_trigger = Some(fov);
                                    }
                                    ui.end_row();
                                }

                                ui.label(i18n::tr("editor.form.position"));
                                ui.label(format!(
                                    "({:.0}, {:.0}, {:.0})",
                                    form.position.x, form.position.y, form.position.z
                                ));
                                ui.end_row();
                            });

                        if let Some(key) = form.error {
                            ui.colored_label(Color32::LIGHT_RED, i18n::tr(key));
                        }
                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            if ui.button(i18n::tr("editor.form.save")).clicked() {
                                actions.push(UiAction::Editor(EditorAction::SubmitForm));
                            }
                            if ui.button(i18n::tr("editor.form.cancel")).clicked() {
                                actions.push(UiAction::Editor(EditorAction::CloseOverlay));
                            }
                        });
                    });
                    if form.pending {
                        ui.spinner();
                    }
                });
        }
        UiState::ConfirmDelete(id) => {
            let label = tour
                .scene(&scene_id)
                .and_then(|s| s.hotspot(id))
                .map(|h| marker_text(tour, h.kind, &h.label, h.target_scene.as_deref(), &h.id))
                .unwrap_or_else(|| id.clone());
            egui::Window::new(i18n::tr("editor.delete_title"))
                .id(egui::Id::new("confirm_delete"))
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(i18n::tr_with("editor.confirm_delete", &[("name", label)]));
                    ui.horizontal(|ui| {
                        if ui.button(i18n::tr("action.delete")).clicked() {
                            actions.push(UiAction::Editor(EditorAction::ConfirmDelete));
                        }
                        if ui.button(i18n::tr("editor.form.cancel")).clicked() {
                            actions.push(UiAction::Editor(EditorAction::CloseOverlay));
                        }
                    });
                });
        }
        UiState::None => {}
    }

    if let Some(notice) = editor.notification(now) {
        let color = match notice.level {
            NoticeLevel::Success => Color32::LIGHT_GREEN,
            NoticeLevel::Error => Color32::LIGHT_RED,
        };
        let mut text = i18n::tr(notice.key);
        if !notice.detail.is_empty() {
            text = format!("{text}: {}", notice.detail);
        }
        egui::Area::new("editor_notice")
            .anchor(Align2::CENTER_TOP, [0.0, 72.0])
            .movable(false)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(color, text);
                });
            });
    }
}

fn draw_hotspot_list(ctx: &egui::Context, tour: &Tour, editor: &HotspotEditor, actions: &mut Vec<UiAction>) {
    egui::SidePanel::right("hotspot_list")
        .resizable(false)
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.heading(i18n::tr_with(
                "editor.list_title",
                &[("count", editor.hotspots().len().to_string())],
            ));
            ui.separator();
            if editor.hotspots().is_empty() {
                ui.label(RichText::new(i18n::tr("editor.list_empty")).weak());
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for h in editor.hotspots() {
                    let selected = editor.selected() == Some(h.id.as_str());
                    ui.horizontal(|ui| {
                        let text = marker_text(tour, h.kind, &h.label, h.target_scene.as_deref(), &h.id);
                        let r = ui.selectable_label(selected, text);
                        if r.double_clicked() {
                            actions.push(UiAction::Editor(EditorAction::OpenEdit(h.id.clone())));
                        } else if r.clicked() {
                            actions.push(UiAction::Editor(EditorAction::Select(h.id.clone())));
                        }
                        if ui.small_button("✏").on_hover_text(i18n::tr("action.edit")).clicked() {
                            actions.push(UiAction::Editor(EditorAction::OpenEdit(h.id.clone())));
                        }
                        if ui.small_button("🗑").on_hover_text(i18n::tr("action.delete")).clicked() {
                            actions.push(UiAction::Editor(EditorAction::RequestDelete(h.id.clone())));
                        }
                    });
                    ui.label(
                        RichText::new(format!(
                            "({:.0}, {:.0}, {:.0})",
                            h.position.x, h.position.y, h.position.z
                        ))
                        .small()
                        .weak(),
                    );
                }
            });
        });
}

fn draw_fade(ctx: &egui::Context, app: &App, now: Instant) {
    let alpha = app.navigator.as_ref().map_or(0.0, |n| n.overlay_alpha(now));
    if alpha <= 0.0 {
        return;
    }
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("scene_fade")));
    painter.rect_filled(
        ctx.screen_rect(),
        0.0,
        Color32::from_black_alpha((alpha.clamp(0.0, 1.0) * 255.0) as u8),
    );
}
