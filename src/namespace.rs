//! Namespace Module
//!
//! A small file namespace whose mutations are not idempotent: every create
//! allocates a fresh id and every rename is journaled. The server wraps these
//! operations in replay caches.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::replay::{DomainError, RpcFailure};

// == Error Codes ==
pub const FILE_ALREADY_EXISTS: &str = "FileAlreadyExists";
pub const FILE_DOES_NOT_EXIST: &str = "FileDoesNotExist";
pub const INVALID_PATH: &str = "InvalidPath";

/// Maximum allowed path length in bytes
pub const MAX_PATH_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub id: u64,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct NamespaceState {
    files: HashMap<String, FileInfo>,
    next_id: u64,
}

// == Namespace ==
#[derive(Debug, Default)]
pub struct Namespace {
    state: Mutex<NamespaceState>,
    journal: Option<PathBuf>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a namespace that appends every rename to `journal`.
    pub fn with_journal(journal: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::default(),
            journal: Some(journal.into()),
        }
    }

    // == Create ==
    /// Creates `path` with a freshly allocated id.
    pub async fn create_file(&self, path: &str) -> Result<FileInfo, DomainError> {
        validate_path(path)?;

        let mut state = self.state.lock().await;
        if let Some(existing) = state.files.get(path) {
            return Err(
                DomainError::new(FILE_ALREADY_EXISTS, format!("{path} already exists"))
                    .with_cause(format!("held by file {}", existing.id)),
            );
        }

        state.next_id += 1;
        let info = FileInfo {
            id: state.next_id,
            path: path.to_string(),
            created_at: Utc::now(),
        };
        state.files.insert(path.to_string(), info.clone());
        info!(path, id = info.id, "created file");
        Ok(info)
    }

    // == Rename ==
    /// Moves `src` to `dst`, journaling the rename before applying it.
    pub async fn rename_file(&self, src: &str, dst: &str) -> Result<FileInfo, RpcFailure> {
        validate_path(src)?;
        validate_path(dst)?;

        let mut state = self.state.lock().await;
        if !state.files.contains_key(src) {
            return Err(DomainError::new(FILE_DOES_NOT_EXIST, format!("{src} does not exist")).into());
        }
        if state.files.contains_key(dst) {
            return Err(DomainError::new(FILE_ALREADY_EXISTS, format!("{dst} already exists")).into());
        }

        if let Some(journal) = &self.journal {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(journal)
                .await?;
            file.write_all(format!("rename\t{src}\t{dst}\n").as_bytes())
                .await?;
            file.flush().await?;
        }

        let Some(mut info) = state.files.remove(src) else {
            return Err(DomainError::new(FILE_DOES_NOT_EXIST, format!("{src} does not exist")).into());
        };
        info.path = dst.to_string();
        state.files.insert(dst.to_string(), info.clone());
        info!(src, dst, id = info.id, "renamed file");
        Ok(info)
    }

    pub async fn get(&self, path: &str) -> Option<FileInfo> {
        self.state.lock().await.files.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.files.len()
    }
}

fn validate_path(path: &str) -> Result<(), DomainError> {
    if !path.starts_with('/') || path.len() < 2 {
        return Err(DomainError::new(
            INVALID_PATH,
            format!("{path:?} is not an absolute file path"),
        ));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(DomainError::new(
            INVALID_PATH,
            format!("path exceeds maximum length of {MAX_PATH_LENGTH} bytes"),
        ));
    }
    Ok(())
}
