use crate::features::data_url::AssetNormalizer;
use crate::features::error::NormalizeError;
use crate::features::extractor::MetadataExtractor;
use crate::source::RawFile;
use crate::trek::structs::{PhotoId, TrekPhoto};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

/// A file that did not make it into the trek.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of one ingest call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Ids appended to the collection, in input order.
    pub added: Vec<PhotoId>,
    pub failed: Vec<IngestFailure>,
}

/// Turns raw files into [`TrekPhoto`]s.
#[derive(Clone)]
pub struct IngestPipeline {
    extractor: MetadataExtractor,
    normalizer: AssetNormalizer,
}

impl IngestPipeline {
    pub fn new(extractor: MetadataExtractor, normalizer: AssetNormalizer) -> Self {
        Self {
            extractor,
            normalizer,
        }
    }

    /// Tag extraction and asset work for one file run concurrently.
    pub async fn process_file(&self, file: &RawFile) -> Result<TrekPhoto, NormalizeError> {
        let ((location, camera), asset) = tokio::join!(
            self.extractor.extract(file),
            self.normalizer.normalize(file),
        );
        let asset = asset?;

        Ok(TrekPhoto {
            id: PhotoId::generate(),
            name: file.name().to_string(),
            display_handle: asset.display_handle,
            inline_encoding: asset.inline_encoding,
            location,
            camera: (!camera.is_empty()).then_some(camera),
            mime_type: asset.mime_type,
        })
    }

    /// Processes every file concurrently and waits for all of them.
    ///
    /// Successes keep input order. A failing file never affects its siblings.
    pub async fn process_batch(&self, files: &[RawFile]) -> (Vec<TrekPhoto>, Vec<IngestFailure>) {
        let outcomes = join_all(files.iter().map(|file| self.process_file(file))).await;

        let mut photos = Vec::with_capacity(files.len());
        let mut failed = Vec::new();
        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(photo) => photos.push(photo),
                Err(error) => {
                    tracing::warn!(file = file.name(), %error, "dropping file from batch");
                    failed.push(IngestFailure {
                        name: file.name().to_string(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        (photos, failed)
    }
}
