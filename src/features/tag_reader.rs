use crate::features::error::ExtractionError;
use crate::source::{FileSource, RawFile};
use exiftool::ExifTool;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Reads the numeric EXIF tag dictionary of a file.
///
/// Implementations return one flat JSON object keyed by tag name, with numeric
/// values where the tag is numeric (the shape of `exiftool -n -j`).
pub trait TagReader: Send + Sync {
    fn read_tags(&self, file: &RawFile) -> Result<Value, ExtractionError>;
}

impl<F> TagReader for F
where
    F: Fn(&RawFile) -> Result<Value, ExtractionError> + Send + Sync,
{
    fn read_tags(&self, file: &RawFile) -> Result<Value, ExtractionError> {
        self(file)
    }
}

/// [`TagReader`] backed by a long-running `exiftool` process.
pub struct ExifToolReader {
    exiftool: Mutex<ExifTool>,
}

impl ExifToolReader {
    /// Starts `exiftool`, either from `PATH` or from an explicit executable.
    pub fn new(exiftool_path: Option<&Path>) -> Result<Self, ExtractionError> {
        let exiftool = match exiftool_path {
            Some(path) => ExifTool::with_executable(path)?,
            None => ExifTool::new()?,
        };
        Ok(Self {
            exiftool: Mutex::new(exiftool),
        })
    }

    fn read_path(&self, path: &Path) -> Result<Value, ExtractionError> {
        let mut exiftool = self.exiftool.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(exiftool.json(path, &["-n"])?)
    }
}

impl TagReader for ExifToolReader {
    fn read_tags(&self, file: &RawFile) -> Result<Value, ExtractionError> {
        match file.source() {
            FileSource::Disk(path) => self.read_path(path),
            FileSource::Memory(bytes) => {
                // exiftool only reads from disk, so spill to a temp file that
                // keeps the extension; some formats are sniffed by suffix.
                let suffix = file
                    .extension()
                    .map(|ext| format!(".{ext}"))
                    .unwrap_or_default();
                let mut spill = tempfile::Builder::new()
                    .prefix("trektrack-")
                    .suffix(&suffix)
                    .tempfile()?;
                spill.write_all(bytes)?;
                spill.flush()?;
                self.read_path(spill.path())
            }
        }
    }
}
