//! Discovery and reading of note files.
//!
//! Paths are collected first and sorted, so notes are processed in a stable
//! order regardless of how the filesystem lists them. Contents are read one
//! file at a time as the caller asks for them.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SummarizerError};
use crate::models::SourceFile;

const NOTE_EXTENSIONS: &[&str] = &["txt", "text"];

pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            NOTE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// List every note file under `directory`, descending into subdirectories
/// when `recursive` is set.
pub async fn discover_notes(directory: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let metadata = tokio::fs::metadata(directory)
        .await
        .map_err(|_| SummarizerError::NotFound(directory.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(SummarizerError::NotADirectory(directory.to_path_buf()));
    }

    let mut pending = vec![directory.to_path_buf()];
    let mut notes = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| SummarizerError::storage(&dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SummarizerError::storage(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| SummarizerError::storage(&path, e))?;

            if file_type.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if is_note_file(&path) {
                notes.push(path);
            }
        }
    }

    notes.sort();
    debug!("Discovered {} note files in {}", notes.len(), directory.display());
    Ok(notes)
}

/// Read one note as UTF-8 text. The name reported for the note is its path
/// relative to `root`.
pub async fn read_note(root: &Path, path: &Path) -> Result<SourceFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SummarizerError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let raw_text = String::from_utf8(bytes).map_err(|e| SummarizerError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(SourceFile {
        file_name: display_name(root, path),
        raw_text: raw_text.trim().to_string(),
    })
}

pub fn display_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
