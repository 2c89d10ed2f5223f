//! Embedding service boundary.
//!
//! Defines the [`Embedder`] trait used by ingestion and retrieval, the
//! [`OllamaEmbedder`] implementation that calls `POST /api/embed`, and
//! vector helpers:
//! - [`cosine_similarity`]: compare two embedding vectors
//! - [`encode_vector`] / [`decode_vector`]: little-endian `f32` byte encoding
//!   used by the persisted index format
//!
//! # Construction
//!
//! Embedders are always built from a catalog identifier via
//! [`catalog::resolve`](crate::catalog::resolve), so an unknown model fails
//! with [`RagError::UnknownModel`] before any request is made.

use async_trait::async_trait;

use crate::catalog;
use crate::config::OllamaConfig;
use crate::error::{RagError, Result};
use crate::ollama::OllamaClient;

/// Maps text to fixed-length vectors.
///
/// All vectors returned by one embedder share the same dimensionality and
/// are only comparable with vectors from an embedder reporting the same
/// [`model_name`](Embedder::model_name).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Catalog identifier of the embedding model.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single query text.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RagError::EmbeddingService("Empty embedding response".to_string()))
}

/// Embed `texts` in batches of `batch_size`, preserving order.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for (n, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        tracing::debug!(batch = n, size = batch.len(), "embedding batch");
        vectors.extend(embedder.embed(batch).await?);
    }
    Ok(vectors)
}

// ============ Ollama ============

/// Embedder backed by an Ollama server's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    model: &'static str,
    client: OllamaClient,
}

impl OllamaEmbedder {
    /// # Errors
    ///
    /// [`RagError::UnknownModel`] if `model_identifier` is not in the catalog.
    pub fn new(model_identifier: &str, config: &OllamaConfig) -> Result<Self> {
        let descriptor = catalog::resolve(model_identifier)?;
        Ok(Self {
            model: descriptor.identifier,
            client: OllamaClient::new(config)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let json = self
            .client
            .post_json("/api/embed", &body)
            .await
            .map_err(RagError::EmbeddingService)?;

        parse_embed_response(&json)
    }
}

fn parse_embed_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            RagError::EmbeddingService(
                "Invalid Ollama response: missing embeddings array".to_string(),
            )
        })?;

    let mut result = Vec::with_capacity(embeddings.len());

    for embedding in embeddings {
        let vec = embedding
            .as_array()
            .ok_or_else(|| {
                RagError::EmbeddingService(
                    "Invalid Ollama response: embedding is not an array".to_string(),
                )
            })?
            .iter()
            .map(|v| {
                v.as_f64().map(|x| x as f32).ok_or_else(|| {
                    RagError::EmbeddingService(format!(
                        "Invalid Ollama response: non-numeric embedding value {}",
                        v
                    ))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        result.push(vec);
    }

    Ok(result)
}

// ============ Vector helpers ============

/// Little-endian `f32` bytes of `vector`, as stored on disk.
///
/// ```rust
/// use pdf_rag::embedding::{decode_vector, encode_vector};
///
/// let bytes = encode_vector(&[0.25, -8.0]);
/// assert_eq!(bytes.len(), 8);
/// assert_eq!(decode_vector(&bytes), vec![0.25, -8.0]);
/// ```
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Inverse of [`encode_vector`]. A trailing partial value is dropped.
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine of the angle between two embeddings, in `[-1.0, 1.0]`.
///
/// Mismatched lengths, empty input, zero-norm and non-finite vectors score
/// `0.0` instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, aa, bb) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, aa, bb), (x, y)| {
            (dot + x * y, aa + x * x, bb + y * y)
        });

    let norm = (aa * bb).sqrt();
    let score = dot / norm;
    if norm <= f32::EPSILON || !score.is_finite() {
        0.0
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CountingEmbedder {
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "nomic-embed-text"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    #[test]
    fn unknown_model_rejected_at_construction() {
        let err = OllamaEmbedder::new("text-embedding-3-small", &OllamaConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, RagError::UnknownModel { .. }));
    }

    #[test]
    fn known_model_constructs() {
        let e = OllamaEmbedder::new("mxbai-embed-large", &OllamaConfig::default()).unwrap();
        assert_eq!(e.model_name(), "mxbai-embed-large");
    }

    #[tokio::test]
    async fn batches_preserve_order() {
        let embedder = CountingEmbedder {
            calls: Mutex::new(Vec::new()),
        };
        let texts: Vec<String> = (0..7).map(|i| "x".repeat(i + 1)).collect();
        let vectors = embed_in_batches(&embedder, &texts, 3).await.unwrap();
        assert_eq!(*embedder.calls.lock().unwrap(), vec![3, 3, 1]);
        let lens: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[tokio::test]
    async fn query_embeds_single_text() {
        let embedder = CountingEmbedder {
            calls: Mutex::new(Vec::new()),
        };
        let v = embed_query(&embedder, "abcd").await.unwrap();
        assert_eq!(v, vec![4.0, 1.0]);
    }

    #[test]
    fn parses_embed_response() {
        let json = serde_json::json!({ "embeddings": [[0.5, 1.0], [2.0, -1.0]] });
        let v = parse_embed_response(&json).unwrap();
        assert_eq!(v, vec![vec![0.5, 1.0], vec![2.0, -1.0]]);
    }

    #[test]
    fn rejects_malformed_response() {
        let json = serde_json::json!({ "embedding": [0.5] });
        assert!(matches!(
            parse_embed_response(&json),
            Err(RagError::EmbeddingService(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_components() {
        for bad in [
            serde_json::json!({ "embeddings": [[0.5, "oops"]] }),
            serde_json::json!({ "embeddings": [[0.5, null, 1.0]] }),
        ] {
            match parse_embed_response(&bad) {
                Err(RagError::EmbeddingService(msg)) => assert!(msg.contains("non-numeric")),
                other => panic!("expected EmbeddingService, got {:?}", other),
            }
        }
    }

    #[test]
    fn stored_bytes_are_little_endian() {
        assert_eq!(encode_vector(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(decode_vector(&[0x00, 0x00, 0x80, 0x3f, 0xff]), vec![1.0]);
    }

    #[test]
    fn cosine_of_parallel_and_opposite_vectors() {
        assert!((cosine_similarity(&[2.0, 4.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-3.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 5.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
    }
}
