use thiserror::Error;

/// The primary error type for the trek-track crate.
#[derive(Error, Debug)]
pub enum TrekError {
    #[error("Metadata extraction could not be set up: {0}")]
    Extraction(#[from] crate::features::error::ExtractionError),

    #[error("GPX export failed: {0}")]
    Export(#[from] crate::features::error::ExportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A trek session must be built inside a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
