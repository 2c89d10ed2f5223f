//! Save and load document indexes.
//!
//! Each index lives in its own directory under the cache root, named after
//! the source file: `<cache_root>/<filename>.faiss/`. The directory
//! holds two JSON files:
//!
//! | File | Contents |
//! |------|----------|
//! | `meta.json` | model identifier, dimensionality, passage count, source digest, save time |
//! | `index.json` | passages with their vectors (base64 of little-endian `f32`) |
//!
//! Keys are derived from the filename only, so two different files with the
//! same name share a slot; the stored `source_digest` lets callers detect
//! that case.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embedding::{decode_vector, encode_vector};
use crate::error::{RagError, Result};
use crate::index::DocumentIndex;
use crate::models::Passage;

const FORMAT_VERSION: u32 = 1;
const META_FILE: &str = "meta.json";
const INDEX_FILE: &str = "index.json";

/// Metadata stored next to a saved index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format_version: u32,
    pub model_identifier: String,
    pub dims: usize,
    pub passage_count: usize,
    #[serde(default)]
    pub source_digest: Option<String>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    passage: Passage,
    vector: String,
}

/// Directory-backed index storage.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

/// Storage key for an uploaded file: `"<file name>.faiss"`.
///
/// Only the final path component is used.
pub fn key_for_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    format!("{}.faiss", name)
}

impl IndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds (or would hold) the index saved under `key`.
    pub fn index_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.index_path(key)
            .map(|p| p.join(META_FILE).is_file() && p.join(INDEX_FILE).is_file())
            .unwrap_or(false)
    }

    /// Write `index` under `key`, replacing anything saved there before.
    pub fn save(&self, index: &DocumentIndex, key: &str) -> Result<PathBuf> {
        let dir = self.index_path(key)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| RagError::io(e, format!("creating {}", dir.display())))?;

        let entries: Vec<StoredEntry> = index
            .entries()
            .iter()
            .map(|e| StoredEntry {
                passage: e.passage.clone(),
                vector: STANDARD.encode(encode_vector(&e.vector)),
            })
            .collect();
        write_json(&dir.join(INDEX_FILE), &entries)?;

        let meta = IndexMeta {
            format_version: FORMAT_VERSION,
            model_identifier: index.model_identifier().to_string(),
            dims: index.dims(),
            passage_count: index.len(),
            source_digest: index.source_digest().map(str::to_string),
            saved_at: Utc::now(),
        };
        write_json(&dir.join(META_FILE), &meta)?;

        tracing::info!(
            path = %dir.display(),
            passages = index.len(),
            model = index.model_identifier(),
            "saved index"
        );
        Ok(dir)
    }

    /// Read only the metadata of a saved index.
    pub fn read_meta(&self, key: &str) -> Result<IndexMeta> {
        let dir = self.index_path(key)?;
        let path = dir.join(META_FILE);
        if !path.is_file() {
            return Err(RagError::NotFound { path: dir });
        }
        let meta: IndexMeta = read_json(&path)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(RagError::Persistence(format!(
                "unsupported format version {} in {}",
                meta.format_version,
                path.display()
            )));
        }
        Ok(meta)
    }

    /// Load the index saved under `key`.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`]: nothing saved under `key`.
    /// - [`RagError::ModelMismatch`]: saved with a different model; its
    ///   vectors are not comparable with `model_identifier` embeddings.
    /// - [`RagError::Persistence`]: files exist but cannot be decoded.
    pub fn load(&self, key: &str, model_identifier: &str) -> Result<DocumentIndex> {
        let meta = self.read_meta(key)?;
        if meta.model_identifier != model_identifier {
            return Err(RagError::ModelMismatch {
                expected: meta.model_identifier,
                actual: model_identifier.to_string(),
            });
        }

        let dir = self.index_path(key)?;
        let index_file = dir.join(INDEX_FILE);
        if !index_file.is_file() {
            return Err(RagError::NotFound { path: dir });
        }
        let stored: Vec<StoredEntry> = read_json(&index_file)?;
        if stored.len() != meta.passage_count {
            return Err(RagError::Persistence(format!(
                "{} lists {} passages but {} were found",
                META_FILE,
                meta.passage_count,
                stored.len()
            )));
        }

        let mut passages = Vec::with_capacity(stored.len());
        let mut vectors = Vec::with_capacity(stored.len());
        for entry in stored {
            let bytes = STANDARD.decode(entry.vector.as_bytes()).map_err(|e| {
                RagError::Persistence(format!(
                    "passage {}: bad vector encoding: {}",
                    entry.passage.sequence_position, e
                ))
            })?;
            passages.push(entry.passage);
            vectors.push(decode_vector(&bytes));
        }

        let mut index = DocumentIndex::build(meta.model_identifier, passages, vectors)
            .map_err(|e| RagError::Persistence(e.to_string()))?;
        if let Some(digest) = meta.source_digest {
            index = index.with_source_digest(digest);
        }

        tracing::info!(path = %dir.display(), passages = index.len(), "loaded index");
        Ok(index)
    }

    /// Load the index under `key` only if it can stand in for a fresh
    /// ingestion of `source_digest` with `model_identifier`.
    ///
    /// Returns `Ok(None)` when nothing is saved, the model differs, the
    /// stored digest belongs to other bytes, or the saved files cannot be
    /// decoded. I/O failures are still errors.
    pub fn load_if_current(
        &self,
        key: &str,
        model_identifier: &str,
        source_digest: &str,
    ) -> Result<Option<DocumentIndex>> {
        let meta = match self.read_meta(key) {
            Ok(meta) => meta,
            Err(RagError::NotFound { .. }) => return Ok(None),
            Err(RagError::Persistence(reason)) => {
                tracing::warn!(key, %reason, "saved index metadata unreadable; ignoring it");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if meta.model_identifier != model_identifier {
            tracing::warn!(
                key,
                saved = %meta.model_identifier,
                requested = model_identifier,
                "saved index uses another model; ignoring it"
            );
            return Ok(None);
        }
        if meta.source_digest.as_deref().is_some_and(|d| d != source_digest) {
            tracing::warn!(key, "saved index was built from a different file; ignoring it");
            return Ok(None);
        }

        match self.load(key, model_identifier) {
            Ok(index) => Ok(Some(index)),
            Err(RagError::NotFound { .. }) => Ok(None),
            Err(RagError::Persistence(reason)) => {
                tracing::warn!(key, %reason, "saved index unreadable; ignoring it");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(()),
        _ => Err(RagError::Persistence(format!(
            "invalid storage key '{}': must be a plain file name",
            key
        ))),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec(value)
        .map_err(|e| RagError::Persistence(format!("encoding {}: {}", path.display(), e)))?;
    std::fs::write(path, json).map_err(|e| RagError::io(e, format!("writing {}", path.display())))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes =
        std::fs::read(path).map_err(|e| RagError::io(e, format!("reading {}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RagError::Persistence(format!("decoding {}: {}", path.display(), e)))
}
