use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: empty file")]
    Empty { path: PathBuf },
}

pub fn load_json_file(path: &Path) -> Result<Value, IoError> {
    let data = fs::read(path).map_err(|source| IoError::Io { path: path.to_path_buf(), source })?;
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(IoError::Empty { path: path.to_path_buf() });
    }
    serde_json::from_slice(&data).map_err(|source| IoError::Json { path: path.to_path_buf(), source })
}

pub fn write_json_to_file(path: &Path, value: &Value) -> Result<(), IoError> {
    let mut s = serde_json::to_string_pretty(value)
        .map_err(|source| IoError::Json { path: path.to_path_buf(), source })?;
    s.push('\n');
    fs::write(path, s).map_err(|source| IoError::Io { path: path.to_path_buf(), source })
}

// Every *.json file below `dir`, sorted. Unreadable entries are skipped.
pub fn find_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    out.sort();
    out
}
