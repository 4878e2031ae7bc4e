// main.rs — tour viewer / hotspot editor window

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod renderer;
mod ui;

use app::App;
use renderer::Renderer;

use panorama_tour::config::LaunchOptions;
use panorama_tour::controls::TouchPhase;
use panorama_tour::frame_loop::FrameLoop;
use panorama_tour::i18n;
use panorama_tour::projector::Viewport;

use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use std::time::Instant;

/// Wheel lines are reported like a browser's pixel delta: 100 per notch, down positive.
const LINE_DELTA_PIXELS: f32 = 100.0;

fn logical_viewport(size: PhysicalSize<u32>, scale: f64) -> Viewport {
    let logical = size.to_logical::<f32>(scale);
    Viewport::new(logical.width, logical.height)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let lang = i18n::resolve_lang_from_args();
    i18n::init(lang.clone());

    let options = LaunchOptions::from_args(std::env::args().skip(1));
    let config = options.viewer_config();

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(i18n::tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => w,
        Err(e) => {
            log::error!("cannot create window: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(&window, config.sphere_radius)) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{}", i18n::tr_with("gpu.init_failed", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let viewport = logical_viewport(window.inner_size(), window.scale_factor());
    let mut app = App::new(&options, config, viewport, lang);
    let mut frame_loop = FrameLoop::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                let scale = window.scale_factor();
                if let WindowEvent::CursorMoved { position, .. } = &event {
                    let p = position.to_logical::<f32>(scale);
                    app.track_cursor(p.x, p.y);
                }

                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        frame_loop.stop();
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        app.resize(logical_viewport(new_size, scale));
                    }

                    WindowEvent::ScaleFactorChanged {
                        scale_factor,
                        new_inner_size,
                    } => {
                        renderer.egui_state.set_pixels_per_point(scale_factor as f32);
                        renderer.resize(*new_inner_size);
                        app.resize(logical_viewport(*new_inner_size, scale_factor));
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            let now = Instant::now();
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = ui::pick_tour_file() {
                                        app.open_tour(path);
                                    }
                                }
                                Some(VirtualKeyCode::F11) => app.toggle_fullscreen(&window),
                                Some(VirtualKeyCode::Back) => app.go_back(now),
                                Some(VirtualKeyCode::E) => {
                                    let on = app.editor.is_none();
                                    app.set_editor(on);
                                }
                                Some(VirtualKeyCode::Escape) => app.cancel(&window),
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            match state {
                                ElementState::Pressed => app.pointer_pressed(),
                                ElementState::Released => app.pointer_released(),
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        let p = position.to_logical::<f32>(scale);
                        app.pointer_moved(p.x, p.y);
                    }

                    WindowEvent::CursorLeft { .. } => app.pointer_left(),

                    WindowEvent::MouseWheel { delta, .. } => {
                        let delta_y = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * LINE_DELTA_PIXELS,
                            MouseScrollDelta::PixelDelta(pos) => -pos.to_logical::<f32>(scale).y,
                        };
                        app.wheel(delta_y);
                    }

                    WindowEvent::Touch(touch) => {
                        let phase = match touch.phase {
                            winit::event::TouchPhase::Started => TouchPhase::Start,
                            winit::event::TouchPhase::Moved => TouchPhase::Move,
                            winit::event::TouchPhase::Ended => TouchPhase::End,
                            winit::event::TouchPhase::Cancelled => TouchPhase::Cancel,
                        };
                        let p = touch.location.to_logical::<f32>(scale);
                        app.touch(touch.id, phase, p.x, p.y);
                    }

                    WindowEvent::DroppedFile(path) => app.open_tour(path),

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                app.poll(now, &mut renderer);

                if frame_loop.step(now, &mut app.session, &mut renderer).is_none() {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                let frame = ui::FrameInfo {
                    now,
                    fps: frame_loop.fps(),
                    fov: renderer.reported_fov.unwrap_or_else(|| app.session.fov()),
                };
                let mut actions = Vec::new();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    actions = ui::draw(ctx, &mut app, &frame);
                });

                for action in actions {
                    app.handle(action, now, &window);
                }
                if app.exit_requested {
                    frame_loop.stop();
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("surface out of memory");
                        frame_loop.stop();
                    }
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}
