//! Question answering over a [`DocumentIndex`].
//!
//! For each question the engine embeds the question, retrieves the `top_k`
//! nearest passages (30 by default; every passage when the index is
//! smaller), renders the grounded prompt and calls the generator. The
//! retrieved passages are returned with the answer so callers can show
//! citations with page numbers.
//!
//! The default `top_k` is large because passages are short: many are needed
//! to rebuild enough surrounding context for the generator.

use crate::embedding::{embed_query, Embedder};
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::DocumentIndex;
use crate::models::Passage;
use crate::prompt;

/// Passages retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 30;

/// A generated answer and the passages it was conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Retrieved passages in similarity order.
    pub cited_passages: Vec<Passage>,
}

pub struct AnswerEngine<'a> {
    embedder: &'a dyn Embedder,
    generator: &'a dyn Generator,
    top_k: usize,
}

impl<'a> AnswerEngine<'a> {
    pub fn new(embedder: &'a dyn Embedder, generator: &'a dyn Generator) -> Self {
        Self {
            embedder,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Catalog identifier of the embedding model used for questions.
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Answer `question` from `index`.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`]: the index has no passages; no backend is called.
    /// - [`RagError::ModelMismatch`]: the embedder serves a different model than the index.
    /// - [`RagError::EmbeddingService`]: the question could not be embedded.
    /// - [`RagError::GenerationService`]: the generator failed.
    pub async fn answer(&self, index: &DocumentIndex, question: &str) -> Result<Answer> {
        if index.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if self.embedder.model_name() != index.model_identifier() {
            return Err(RagError::ModelMismatch {
                expected: index.model_identifier().to_string(),
                actual: self.embedder.model_name().to_string(),
            });
        }

        let query = embed_query(self.embedder, question).await?;
        let hits = index.search(&query, self.top_k)?;
        tracing::debug!(
            retrieved = hits.len(),
            top_score = ?hits.first().map(|h| h.score),
            "retrieved passages"
        );

        let prompt = prompt::render(&hits, question);
        let text = self.generator.generate(&prompt).await?;

        Ok(Answer {
            text: text.trim().to_string(),
            cited_passages: hits.into_iter().map(|h| h.passage).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn model_name(&self) -> &str {
            "gemma2:2b"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("apple") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "gemma2:2b"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(RagError::GenerationService("backend down".into()));
            }
            Ok("  Apples are red.\n".to_string())
        }
    }

    fn passage(text: &str, i: usize) -> Passage {
        Passage {
            text: text.to_string(),
            source_page: i,
            sequence_position: i,
            char_start: 0,
        }
    }

    fn fruit_index() -> DocumentIndex {
        DocumentIndex::build(
            "gemma2:2b",
            vec![passage("bananas are yellow", 0), passage("apple colour is red", 1)],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn answers_with_citations_in_similarity_order() {
        let gen = RecordingGenerator::new();
        let engine = AnswerEngine::new(&AxisEmbedder, &gen);
        let answer = engine
            .answer(&fruit_index(), "what colour is an apple?")
            .await
            .unwrap();
        assert_eq!(answer.text, "Apples are red.");
        assert_eq!(answer.cited_passages.len(), 2);
        assert_eq!(answer.cited_passages[0].text, "apple colour is red");

        let prompts = gen.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: what colour is an apple?"));
        let a = prompts[0].find("apple colour is red").unwrap();
        let b = prompts[0].find("bananas are yellow").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn top_k_limits_citations() {
        let gen = RecordingGenerator::new();
        let engine = AnswerEngine::new(&AxisEmbedder, &gen).with_top_k(1);
        let answer = engine.answer(&fruit_index(), "apple?").await.unwrap();
        assert_eq!(answer.cited_passages.len(), 1);
    }

    #[tokio::test]
    async fn empty_index_never_calls_generator() {
        let gen = RecordingGenerator::new();
        let engine = AnswerEngine::new(&AxisEmbedder, &gen);
        let err = engine
            .answer(&DocumentIndex::empty("gemma2:2b"), "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
        assert!(gen.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn index_from_other_model_rejected() {
        let gen = RecordingGenerator::new();
        let engine = AnswerEngine::new(&AxisEmbedder, &gen);
        let index = DocumentIndex::build(
            "gemma2:9b",
            vec![passage("x", 0)],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();
        let err = engine.answer(&index, "q").await.unwrap_err();
        assert!(matches!(err, RagError::ModelMismatch { .. }));
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let gen = RecordingGenerator {
            fail: true,
            ..RecordingGenerator::new()
        };
        let engine = AnswerEngine::new(&AxisEmbedder, &gen);
        let err = engine.answer(&fruit_index(), "q").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationService(_)));
    }

    #[test]
    fn default_top_k_is_thirty() {
        let gen = RecordingGenerator::new();
        assert_eq!(AnswerEngine::new(&AxisEmbedder, &gen).top_k(), 30);
    }
}
