use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Exiftool failed to execute or process the file")]
    Exiftool(#[from] exiftool::ExifToolError),

    #[error("I/O error while reading tags: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tag reader worker was aborted")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Tag reader returned no tag dictionary for {0}")]
    NoTags(String),
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Could not read file bytes: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image transcoding failed: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Transcoder worker was aborted")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Unsupported file type for display: {0}")]
    UnsupportedFileType(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Writing the GPX document failed: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("GPX document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Timestamp {0} cannot be represented in the track document")]
    Timestamp(String),

    #[error("I/O error while writing the track file: {0}")]
    Io(#[from] std::io::Error),
}
