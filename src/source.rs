use mime_guess::MimeGuess;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a [`RawFile`] live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, read lazily.
    Disk(PathBuf),
    /// Bytes already held in memory, e.g. from a drag-and-drop host.
    Memory(Arc<[u8]>),
}

/// A raw image file handed to the ingestion pipeline.
///
/// Cloning is cheap: in-memory contents are shared.
#[derive(Debug, Clone)]
pub struct RawFile {
    name: String,
    declared_mime: String,
    source: FileSource,
}

impl RawFile {
    /// A file on disk. The name and declared type are taken from the path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let declared_mime = MimeGuess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            declared_mime,
            source: FileSource::Disk(path),
        }
    }

    /// A file whose contents are already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        declared_mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_mime: declared_mime.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Disk(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// The lowercase filename extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Reads the full contents. Disk files are read on every call.
    pub async fn read(&self) -> std::io::Result<Arc<[u8]>> {
        match &self.source {
            FileSource::Disk(path) => Ok(tokio::fs::read(path).await?.into()),
            FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}
