use crate::features::error::ExtractionError;
use crate::features::gps::{GpsLocation, location_from_tags};
use crate::features::metadata::{CameraMetadata, camera_from_tags};
use crate::features::tag_reader::TagReader;
use crate::source::RawFile;
use serde_json::Value;
use std::sync::Arc;

/// Pulls location and camera metadata out of raw files.
///
/// Neither operation fails outward: a file whose tags cannot be read simply
/// has no location and empty camera metadata.
#[derive(Clone)]
pub struct MetadataExtractor {
    reader: Arc<dyn TagReader>,
}

impl MetadataExtractor {
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self { reader }
    }

    async fn read_tags(&self, file: &RawFile) -> Result<Value, ExtractionError> {
        let reader = Arc::clone(&self.reader);
        let owned = file.clone();
        let tags = tokio::task::spawn_blocking(move || reader.read_tags(&owned)).await??;
        match tags {
            Value::Object(_) => Ok(tags),
            // exiftool answers with a one-element array when given a single file
            Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
            _ => Err(ExtractionError::NoTags(file.name().to_string())),
        }
    }

    async fn tags_or_nothing(&self, file: &RawFile) -> Option<Value> {
        match self.read_tags(file).await {
            Ok(tags) => Some(tags),
            Err(error) => {
                tracing::warn!(file = file.name(), %error, "could not read metadata, continuing without it");
                None
            }
        }
    }

    /// Reads the tags once and builds both the location and the camera details from them.
    pub async fn extract(&self, file: &RawFile) -> (Option<GpsLocation>, CameraMetadata) {
        let Some(tags) = self.tags_or_nothing(file).await else {
            return (None, CameraMetadata::default());
        };
        let location = location_from_tags(&tags);
        if location.is_none() {
            tracing::debug!(file = file.name(), "no GPS fix");
        }
        (location, camera_from_tags(&tags))
    }

    pub async fn extract_location(&self, file: &RawFile) -> Option<GpsLocation> {
        self.extract(file).await.0
    }

    pub async fn extract_camera(&self, file: &RawFile) -> CameraMetadata {
        self.extract(file).await.1
    }
}
