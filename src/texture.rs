// texture.rs — panorama image decoding off the render thread
//
// Images are decoded on a worker thread and handed back over a channel tagged
// with the scene they belong to; the frame loop polls with `try_recv` and keeps
// drawing the previous material meanwhile.

use image::io::Reader as ImageReader;
use image::{GenericImage, GenericImageView, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use crate::error::TextureError;

#[derive(Debug)]
pub enum TextureEvent {
    Loaded { scene_id: String, image: RgbaImage },
    Failed { scene_id: String, error: String },
}

/// Resolve a scene's image reference against the tour file's directory.
/// `file://` prefixes are stripped; absolute paths are kept.
pub fn resolve_image_path(base_dir: Option<&Path>, image_url: &str) -> PathBuf {
    let raw = image_url.strip_prefix("file://").unwrap_or(image_url);
    let p = PathBuf::from(raw);
    match base_dir {
        Some(dir) if p.is_relative() => dir.join(p),
        _ => p,
    }
}

pub fn decode_file(path: &Path) -> Result<RgbaImage, TextureError> {
    let file = File::open(path).map_err(|source| TextureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    reader.no_limits();
    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    log::info!(
        "{}",
        crate::i18n::tr_with(
            "log.image_loaded_size",
            &[("w", w.to_string()), ("h", h.to_string())]
        )
    );
    Ok(img.to_rgba8())
}

pub fn start_load(scene_id: String, path: PathBuf, tx: Sender<TextureEvent>) {
    thread::spawn(move || {
        log::info!(
            "{}",
            crate::i18n::tr_with("log.loading_image_bg", &[("path", path.display().to_string())])
        );
        let event = match decode_file(&path) {
            Ok(image) => TextureEvent::Loaded { scene_id, image },
            Err(e) => {
                log::error!(
                    "{}",
                    crate::i18n::tr_with("error.decode_image", &[("err", e.to_string())])
                );
                TextureEvent::Failed {
                    scene_id,
                    error: e.to_string(),
                }
            }
        };
        if tx.send(event).is_err() {
            log::warn!("{}", crate::i18n::tr("error.send_to_main_failed"));
        }
    });
}

/// Fit the image under the GPU's texture limit and pad it to a 2:1
/// equirectangular canvas. Short images are placed at the bottom with black
/// above them.
pub fn prepare_equirect(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    let img = if src_w > max_dimension || src_h > max_dimension {
        let scale = (max_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
        let new_w = ((src_w as f32 * scale) as u32).max(1);
        let new_h = ((src_h as f32 * scale) as u32).max(1);
        log::warn!(
            "{}",
            crate::i18n::tr_with(
                "gpu.image_too_large_scaled",
                &[
                    ("src_w", src_w.to_string()),
                    ("src_h", src_h.to_string()),
                    ("max", max_dimension.to_string()),
                    ("new_w", new_w.to_string()),
                    ("new_h", new_h.to_string()),
                ]
            )
        );
        image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let (w, h) = img.dimensions();
    let target_h = w / 2;
    if target_h == 0 || h >= target_h {
        return img;
    }
    let mut canvas = RgbaImage::from_pixel(w, target_h, Rgba([0, 0, 0, 255]));
    if canvas.copy_from(&img, 0, target_h - h).is_err() {
        return img;
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_tour() {
        let base = Path::new("/tours/demo");
        assert_eq!(
            resolve_image_path(Some(base), "img/lobby.jpg"),
            PathBuf::from("/tours/demo/img/lobby.jpg")
        );
        assert_eq!(
            resolve_image_path(Some(base), "file:///srv/pool.jpg"),
            PathBuf::from("/srv/pool.jpg")
        );
        assert_eq!(resolve_image_path(None, "a.png"), PathBuf::from("a.png"));
    }

    #[test]
    fn short_image_is_padded_on_top() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([255, 255, 255, 255]));
        let out = prepare_equirect(img, 4096);
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn oversized_image_is_scaled() {
        let img = RgbaImage::new(64, 32);
        let out = prepare_equirect(img, 16);
        assert_eq!(out.dimensions(), (16, 8));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_file(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, TextureError::Io { .. }));
    }

    #[test]
    fn loader_reports_failure_on_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        start_load("a".into(), PathBuf::from("/definitely/not/here.jpg"), tx);
        match rx.recv().unwrap() {
            TextureEvent::Failed { scene_id, .. } => assert_eq!(scene_id, "a"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
