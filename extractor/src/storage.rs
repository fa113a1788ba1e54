//! Content-addressed thumbnail storage

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::*;
use crate::models::SavedThumbnail;
use crate::validator::ImageMeta;

/// Hex digits of the digest kept in the key
const KEY_HASH_LEN: usize = 16;

/// Distinguishes temp files of writers in one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl From<StorageError> for Failure {
    fn from(e: StorageError) -> Self {
        Failure::new(FailureReason::StorageError, e.to_string())
    }
}

/// Storage key: a prefix of the content hash plus the strategy name
///
/// Identical bytes from the same strategy always map to the same key.
pub fn storage_key(bytes: &[u8], strategy: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    format!("{}_{strategy}", &digest[..KEY_HASH_LEN])
}

/// Persistence seam of the orchestrator
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    async fn save(
        &self,
        strategy: &str,
        bytes: &[u8],
        meta: &ImageMeta,
    ) -> std::result::Result<SavedThumbnail, StorageError>;
}

/// Files named `<key>.<ext>` in one directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ThumbnailStore for FsStore {
    async fn save(
        &self,
        strategy: &str,
        bytes: &[u8],
        meta: &ImageMeta,
    ) -> std::result::Result<SavedThumbnail, StorageError> {
        let key = storage_key(bytes, strategy);
        let path = self.root.join(format!("{key}.{}", meta.format.extension()));
        let saved = SavedThumbnail {
            key: key.clone(),
            strategy: strategy.to_string(),
            path: path.clone(),
            size: bytes.len() as u64,
            format: meta.format,
        };

        // same key means same bytes
        if let Ok(existing) = tokio::fs::metadata(&path).await
            && existing.len() == saved.size
        {
            debug!(%key, "thumbnail already stored");
            return Ok(saved);
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        // every writer, in or across processes, gets its own temp file
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .root
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));
        let write = async {
            tokio::fs::write(&temp, bytes).await?;
            tokio::fs::rename(&temp, &path).await
        };
        if let Err(source) = write.await {
            let _ = tokio::fs::remove_file(&temp).await;
            // another writer may have finished the same key first
            if let Ok(existing) = tokio::fs::metadata(&path).await
                && existing.len() == saved.size
            {
                debug!(%key, "thumbnail stored by a concurrent writer");
                return Ok(saved);
            }
            return Err(StorageError::Write { path, source });
        }

        debug!(%key, size = saved.size, "thumbnail stored");
        Ok(saved)
    }
}
