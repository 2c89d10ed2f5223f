//! In-memory similarity index over passage embeddings.
//!
//! A [`DocumentIndex`] belongs to exactly one model identifier; its vectors
//! are never mixed with vectors from another model. Search is brute-force
//! cosine similarity over all entries, which is adequate for the passage
//! counts a single document produces. Once built, an index is read-only.

use crate::embedding::cosine_similarity;
use crate::error::{RagError, Result};
use crate::models::Passage;

/// One passage and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub passage: Passage,
    pub vector: Vec<f32>,
}

/// A passage returned from [`DocumentIndex::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIndex {
    model_identifier: String,
    dims: usize,
    entries: Vec<IndexEntry>,
    source_digest: Option<String>,
}

impl DocumentIndex {
    /// An index with no entries, tagged with `model_identifier`.
    pub fn empty(model_identifier: impl Into<String>) -> Self {
        Self {
            model_identifier: model_identifier.into(),
            dims: 0,
            entries: Vec::new(),
            source_digest: None,
        }
    }

    /// Pair passages with their vectors.
    ///
    /// # Errors
    ///
    /// [`RagError::IndexBuild`] when the counts differ, a vector is empty,
    /// or the vectors disagree on dimensionality.
    pub fn build(
        model_identifier: impl Into<String>,
        passages: Vec<Passage>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if passages.len() != vectors.len() {
            return Err(RagError::IndexBuild(format!(
                "{} passages but {} embeddings",
                passages.len(),
                vectors.len()
            )));
        }

        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dims == 0 {
            return Err(RagError::IndexBuild("embedding vectors are empty".into()));
        }
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dims) {
            return Err(RagError::IndexBuild(format!(
                "embedding {} has {} dimensions, expected {}",
                i,
                v.len(),
                dims
            )));
        }

        let entries = passages
            .into_iter()
            .zip(vectors)
            .map(|(passage, vector)| IndexEntry { passage, vector })
            .collect();

        Ok(Self {
            model_identifier: model_identifier.into(),
            dims,
            entries,
            source_digest: None,
        })
    }

    /// Attach the SHA-256 hex digest of the bytes this index was built from.
    pub fn with_source_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = Some(digest.into());
        self
    }

    pub fn model_identifier(&self) -> &str {
        &self.model_identifier
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn source_digest(&self) -> Option<&str> {
        self.source_digest.as_deref()
    }

    /// The `k` entries most similar to `query`, best first.
    ///
    /// Returns every entry when the index holds fewer than `k`. Ties keep
    /// document order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        if self.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query.len() != self.dims {
            return Err(RagError::ModelMismatch {
                expected: format!("{} ({} dims)", self.model_identifier, self.dims),
                actual: format!("query with {} dims", query.len()),
            });
        }

        let mut scored: Vec<ScoredPassage> = self
            .entries
            .iter()
            .map(|e| ScoredPassage {
                passage: e.passage.clone(),
                score: cosine_similarity(query, &e.vector),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}
