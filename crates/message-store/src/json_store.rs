//! JSON file store: the corpus as one pretty-printed JSON array.
//!
//! Load and save run on tokio's blocking pool. A save that has started runs to completion
//! even if the awaiting future is dropped, and it replaces the file by rename, so the file
//! is never observed half-written.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::{Corpus, MessageStore, StoreError};

/// Corpus persisted as a flat JSON array at `path`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parses the persisted format into a corpus.
fn parse_corpus(bytes: &[u8]) -> Result<Corpus, serde_json::Error> {
    serde_json::from_slice(bytes)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_corpus(path: &Path) -> Result<Corpus, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "corpus file absent, starting empty");
            return Ok(Corpus::new());
        }
        Err(e) => return Err(io_error(path, e)),
    };
    parse_corpus(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    tmp.write_all(bytes).map_err(|e| io_error(tmp.path(), e))?;
    // The temp file is created owner-only; keep the mode of the file being replaced.
    match fs::metadata(path) {
        Ok(meta) => tmp
            .as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| io_error(tmp.path(), e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error(path, e)),
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

fn join_error(path: &Path, err: tokio::task::JoinError) -> StoreError {
    io_error(path, io::Error::new(io::ErrorKind::Other, err))
}

#[async_trait]
impl MessageStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Corpus, StoreError> {
        let path = self.path.clone();
        let corpus = tokio::task::spawn_blocking(move || read_corpus(&path))
            .await
            .map_err(|e| join_error(&self.path, e))?;
        match &corpus {
            Ok(c) => debug!(count = c.len(), "step: store load done"),
            Err(e) => warn!(error = %e, "step: store load failed"),
        }
        corpus
    }

    #[instrument(skip(self, corpus), fields(path = %self.path.display(), count = corpus.len()))]
    async fn save(&self, corpus: &Corpus) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(corpus).map_err(StoreError::Encode)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| join_error(&self.path, e))??;
        info!(count = corpus.len(), "step: store save done");
        Ok(())
    }
}
