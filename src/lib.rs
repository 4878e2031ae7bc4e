//! Camera, projection and hotspot engine for 360° panorama tours.
//!
//! The crate is windowing-agnostic: [`session::PanoramaSession`] owns the view
//! state of one panorama, [`frame_loop::FrameLoop`] drives it against a
//! [`frame_loop::FrameSink`], and [`editor::HotspotEditor`] implements the
//! placement protocol on top of a [`store::TourStore`]. The `panorama_tour`
//! binary puts a wgpu/egui window around them.

pub mod camera;
pub mod config;
pub mod controls;
pub mod editor;
pub mod error;
pub mod frame_loop;
pub mod hotspots;
pub mod i18n;
pub mod mesh;
pub mod orientation;
pub mod projector;
pub mod session;
pub mod store;
pub mod texture;
pub mod tour;
pub mod transition;

pub use error::{TextureError, TourError};
