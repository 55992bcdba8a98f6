use crate::features::display_handle::{DisplayHandle, HandleRegistry};
use crate::features::error::NormalizeError;
use crate::source::RawFile;
use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use std::sync::Arc;

pub const DEFAULT_TRANSCODE_QUALITY: f32 = 0.6;
const HEIC_SUFFIXES: [&str; 2] = [".heic", ".heif"];

/// Output of a [`Transcoder`].
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Converts image bytes into a baseline raster format any surface can render.
///
/// `quality` is a factor in `0.0..=1.0`.
pub trait Transcoder: Send + Sync {
    fn transcode(&self, bytes: &[u8], quality: f32) -> Result<TranscodedImage, NormalizeError>;
}

/// Transcodes through the `image` crate, re-encoding as JPEG.
///
/// Only formats the `image` build can decode are accepted; anything else is
/// reported as an [`NormalizeError::ImageProcessing`] error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTranscoder;

impl Transcoder for ImageTranscoder {
    fn transcode(&self, bytes: &[u8], quality: f32) -> Result<TranscodedImage, NormalizeError> {
        let img = image::load_from_memory(bytes)?;
        let rgb = img.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality_percent(quality)).encode_image(&rgb)?;
        Ok(TranscodedImage {
            bytes: out,
            mime_type: "image/jpeg".to_string(),
        })
    }
}

fn quality_percent(quality: f32) -> u8 {
    (quality.clamp(0.01, 1.0) * 100.0).round() as u8
}

/// True for the HEIC/HEIF family, judged by filename suffix alone.
pub fn is_heic_family(name: &str) -> bool {
    let lower = name.to_lowercase();
    HEIC_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// A file turned into something displayable.
#[derive(Debug)]
pub struct NormalizedAsset {
    pub display_handle: DisplayHandle,
    /// Standard base64 of the displayable bytes, without the `data:` envelope.
    pub inline_encoding: String,
    pub mime_type: String,
}

impl NormalizedAsset {
    pub fn data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.inline_encoding)
    }
}

pub fn to_data_url(mime_type: &str, inline_encoding: &str) -> String {
    format!("data:{mime_type};base64,{inline_encoding}")
}

#[derive(Clone)]
pub struct AssetNormalizer {
    transcoder: Arc<dyn Transcoder>,
    registry: Arc<HandleRegistry>,
    quality: f32,
}

impl AssetNormalizer {
    pub fn new(transcoder: Arc<dyn Transcoder>, registry: Arc<HandleRegistry>, quality: f32) -> Self {
        Self {
            transcoder,
            registry,
            quality,
        }
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Reads the file, transcodes HEIC-family input, and registers a display handle.
    ///
    /// A declared type outside `image/*` is replaced by the format sniffed from
    /// the bytes; files that are not images at all are rejected. The returned
    /// handle is owned by the caller and revoked when released or dropped.
    pub async fn normalize(&self, file: &RawFile) -> Result<NormalizedAsset, NormalizeError> {
        let bytes = file.read().await?;

        let (bytes, mime_type): (Arc<[u8]>, String) = if is_heic_family(file.name()) {
            let transcoder = Arc::clone(&self.transcoder);
            let quality = self.quality;
            let transcoded =
                tokio::task::spawn_blocking(move || transcoder.transcode(&bytes, quality))
                    .await??;
            tracing::debug!(file = file.name(), to = %transcoded.mime_type, "transcoded");
            (transcoded.bytes.into(), transcoded.mime_type)
        } else {
            (bytes, file.declared_mime().to_string())
        };

        let mime_type = if mime_type.starts_with("image/") {
            mime_type
        } else {
            // Declared types from drag-and-drop hosts are often generic; trust the bytes.
            let format = image::guess_format(&bytes)
                .map_err(|_| NormalizeError::UnsupportedFileType(mime_type))?;
            format.to_mime_type().to_string()
        };

        let inline_encoding = general_purpose::STANDARD.encode(&bytes);
        let display_handle = self.registry.register(bytes, mime_type.clone());
        Ok(NormalizedAsset {
            display_handle,
            inline_encoding,
            mime_type,
        })
    }
}
