//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow for one document: extraction → size
//! heuristics → passage splitting → embedding → index construction.
//! Ingestion either fully succeeds or fails; there is no partial index.
//! Nothing is written to disk here; saving is an explicit separate step
//! (see [`persist`](crate::persist)).

use sha2::{Digest, Sha256};

use crate::catalog;
use crate::embedding::{embed_in_batches, Embedder};
use crate::error::{RagError, Result};
use crate::extract::{extract_pdf, ExtractedDocument};
use crate::heuristic::{recommend_model, segmentation_for, SegmentationParameters};
use crate::index::DocumentIndex;
use crate::split::split_pages;

/// Output of [`ingest`].
#[derive(Debug, Clone)]
pub struct IngestionResult {
    pub index: DocumentIndex,
    pub page_count: usize,
    pub total_chars: usize,
    pub passage_count: usize,
    /// Catalog identifier suggested for a document of this size.
    pub recommended_model: &'static str,
    pub segmentation: SegmentationParameters,
}

impl IngestionResult {
    pub fn segmentation_description(&self) -> &str {
        &self.segmentation.description
    }
}

/// Ingest raw PDF bytes into a new index for `model_identifier`.
///
/// # Errors
///
/// - [`RagError::UnknownModel`]: identifier not in the catalog.
/// - [`RagError::ModelMismatch`]: `embedder` serves a different model.
/// - [`RagError::Extraction`]: bytes are not a readable PDF.
/// - [`RagError::EmbeddingService`]: embedding backend failed.
/// - [`RagError::IndexBuild`]: embeddings do not line up with passages.
pub async fn ingest(
    document_bytes: &[u8],
    model_identifier: &str,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IngestionResult> {
    check_model(model_identifier, embedder)?;
    let document = extract_pdf(document_bytes)?;
    let digest = sha256_hex(document_bytes);

    let mut result = index_document(&document, model_identifier, embedder, batch_size).await?;
    result.index = result.index.with_source_digest(digest);
    Ok(result)
}

/// Ingest already-extracted page text.
///
/// Same contract as [`ingest`] minus extraction.
pub async fn ingest_document(
    document: &ExtractedDocument,
    model_identifier: &str,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IngestionResult> {
    check_model(model_identifier, embedder)?;
    index_document(document, model_identifier, embedder, batch_size).await
}

async fn index_document(
    document: &ExtractedDocument,
    model_identifier: &str,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<IngestionResult> {
    let page_count = document.page_count();
    let total_chars = document.total_chars();
    let recommended_model = recommend_model(total_chars);
    let segmentation = segmentation_for(total_chars, page_count);

    tracing::info!(
        pages = page_count,
        chars = total_chars,
        segment = segmentation.segment_length,
        overlap = segmentation.overlap_length,
        "ingesting document"
    );

    let passages = split_pages(&document.pages, &segmentation);
    let passage_count = passages.len();

    let index = if passages.is_empty() {
        tracing::warn!("document has no extractable text; index is empty");
        DocumentIndex::empty(model_identifier)
    } else {
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = embed_in_batches(embedder, &texts, batch_size).await?;
        DocumentIndex::build(model_identifier, passages, vectors)?
    };

    if recommended_model != model_identifier {
        tracing::info!(
            selected = model_identifier,
            recommended = recommended_model,
            "a different model is recommended for this document size"
        );
    }

    Ok(IngestionResult {
        index,
        page_count,
        total_chars,
        passage_count,
        recommended_model,
        segmentation,
    })
}

/// Hex SHA-256 of raw document bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn check_model(model_identifier: &str, embedder: &dyn Embedder) -> Result<()> {
    catalog::resolve(model_identifier)?;
    if embedder.model_name() != model_identifier {
        return Err(RagError::ModelMismatch {
            expected: model_identifier.to_string(),
            actual: embedder.model_name().to_string(),
        });
    }
    Ok(())
}
