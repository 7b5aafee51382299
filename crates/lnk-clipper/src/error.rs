use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipperError {
    #[error("clipper initialization failed: {0}")]
    Initialization(String),
}
