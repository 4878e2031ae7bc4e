use thiserror::Error;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scene not found: {0}")]
    SceneNotFound(String),

    #[error("hotspot not found: {0}")]
    HotspotNotFound(String),

    #[error("invalid hotspot: {0}")]
    InvalidHotspot(String),
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}
