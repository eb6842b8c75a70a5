use crate::env::ScreenDims;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("weight file {} not found", path.display())]
    WeightsNotFound { path: PathBuf },

    #[error("screen dimensions {got}, expected {want}")]
    ScreenDims { got: ScreenDims, want: ScreenDims },

    #[error("malformed background file {}: {reason}", path.display())]
    Background { path: PathBuf, reason: String },

    #[error("unknown feature mode `{0}`")]
    UnknownFeatureMode(String),

    #[error("environment: {0}")]
    Environment(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("weight encode: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("weight decode: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("frame encode: {0}")]
    Image(#[from] image::ImageError),
}
