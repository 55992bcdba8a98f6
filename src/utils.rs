use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Checks if a directory entry is hidden (starts with '.').
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Recursively lists the files under `dir`, sorted by path so a trek ingests
/// in a stable order. Hidden entries are skipped unless asked for; the root
/// itself is always walked.
pub fn list_files(dir: &Path, include_hidden: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// Expands a mix of file and directory arguments into a flat file list.
pub fn expand_inputs(inputs: &[PathBuf], include_hidden: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_files(input, include_hidden)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
