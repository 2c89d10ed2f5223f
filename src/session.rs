//! Conversation state for one active document.
//!
//! A [`Session`] is an ordinary value owned by the caller. It pairs the
//! selected model with the current document's index and an append-only chat
//! history. Changing the document or the model discards the index and the
//! history; the two are never carried across.

use crate::answer::{Answer, AnswerEngine};
use crate::catalog;
use crate::error::{RagError, Result};
use crate::index::DocumentIndex;
use crate::models::ChatTurn;

#[derive(Debug, Clone)]
pub struct Session {
    model_identifier: String,
    document_name: Option<String>,
    index: Option<DocumentIndex>,
    history: Vec<ChatTurn>,
}

impl Session {
    /// Start an empty session for `model_identifier`.
    pub fn new(model_identifier: &str) -> Result<Self> {
        let descriptor = catalog::resolve(model_identifier)?;
        Ok(Self {
            model_identifier: descriptor.identifier.to_string(),
            document_name: None,
            index: None,
            history: Vec::new(),
        })
    }

    pub fn model_identifier(&self) -> &str {
        &self.model_identifier
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    pub fn index(&self) -> Option<&DocumentIndex> {
        self.index.as_ref()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// True once a document index is attached.
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    /// Switch models. A different model invalidates the attached index,
    /// which must be rebuilt; the history is cleared with it.
    ///
    /// Returns `true` when the model actually changed.
    pub fn set_model(&mut self, model_identifier: &str) -> Result<bool> {
        let descriptor = catalog::resolve(model_identifier)?;
        if descriptor.identifier == self.model_identifier {
            return Ok(false);
        }
        self.model_identifier = descriptor.identifier.to_string();
        self.index = None;
        self.history.clear();
        tracing::info!(model = descriptor.identifier, "model changed; index dropped");
        Ok(true)
    }

    /// Make `index` the active document, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`RagError::ModelMismatch`] if the index was built with another model.
    pub fn attach(&mut self, document_name: impl Into<String>, index: DocumentIndex) -> Result<()> {
        if index.model_identifier() != self.model_identifier {
            return Err(RagError::ModelMismatch {
                expected: self.model_identifier.clone(),
                actual: index.model_identifier().to_string(),
            });
        }
        self.document_name = Some(document_name.into());
        self.index = Some(index);
        self.history.clear();
        Ok(())
    }

    /// Forget the document, its index and the history. The model is kept.
    pub fn reset(&mut self) {
        self.document_name = None;
        self.index = None;
        self.history.clear();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Ask a question about the active document.
    ///
    /// The question is recorded as a user turn. The answer, or the error
    /// message on failure, is recorded as the assistant turn; errors are
    /// still returned to the caller.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyIndex`] when no document is attached, plus anything
    /// [`AnswerEngine::answer`] returns.
    pub async fn ask(&mut self, engine: &AnswerEngine<'_>, question: &str) -> Result<Answer> {
        self.history.push(ChatTurn::user(question));

        let outcome = match &self.index {
            Some(index) => engine.answer(index, question).await,
            None => Err(RagError::EmptyIndex),
        };

        match &outcome {
            Ok(answer) => self.history.push(ChatTurn::assistant(answer.text.clone())),
            Err(e) => self.history.push(ChatTurn::assistant(format!("Error: {}", e))),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::generation::Generator;
    use crate::models::{ChatRole, Passage};
    use async_trait::async_trait;

    struct ConstEmbedder(&'static str);

    #[async_trait]
    impl Embedder for ConstEmbedder {
        fn model_name(&self) -> &str {
            self.0
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn model_name(&self) -> &str {
            "gemma2:2b"
        }
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("forty-two".to_string())
        }
    }

    fn index(model: &str) -> DocumentIndex {
        DocumentIndex::build(
            model,
            vec![Passage {
                text: "the answer is forty-two".into(),
                source_page: 0,
                sequence_position: 0,
                char_start: 0,
            }],
            vec![vec![1.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn unknown_model_rejected() {
        assert!(matches!(
            Session::new("nope"),
            Err(RagError::UnknownModel { .. })
        ));
    }

    #[tokio::test]
    async fn ask_appends_turns() {
        let mut session = Session::new("gemma2:2b").unwrap();
        session.attach("guide.pdf", index("gemma2:2b")).unwrap();
        let embedder = ConstEmbedder("gemma2:2b");
        let engine = AnswerEngine::new(&embedder, &EchoGenerator);

        let answer = session.ask(&engine, "what is the answer?").await.unwrap();
        assert_eq!(answer.text, "forty-two");
        assert_eq!(
            session.history(),
            &[
                ChatTurn::user("what is the answer?"),
                ChatTurn::assistant("forty-two")
            ]
        );
    }

    #[tokio::test]
    async fn ask_without_document_records_error() {
        let mut session = Session::new("gemma2:2b").unwrap();
        let embedder = ConstEmbedder("gemma2:2b");
        let engine = AnswerEngine::new(&embedder, &EchoGenerator);

        let err = session.ask(&engine, "hello?").await.unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, ChatRole::Assistant);
        assert!(session.history()[1].content.starts_with("Error:"));
    }

    #[test]
    fn model_change_drops_index_and_history() {
        let mut session = Session::new("gemma2:2b").unwrap();
        session.attach("a.pdf", index("gemma2:2b")).unwrap();
        session.history.push(ChatTurn::user("q"));

        assert!(!session.set_model("gemma2:2b").unwrap());
        assert!(session.is_ready());

        assert!(session.set_model("gemma2:9b").unwrap());
        assert!(!session.is_ready());
        assert!(session.history().is_empty());
        assert_eq!(session.model_identifier(), "gemma2:9b");
    }

    #[test]
    fn attach_rejects_foreign_index() {
        let mut session = Session::new("gemma2:27b").unwrap();
        assert!(matches!(
            session.attach("a.pdf", index("gemma2:2b")),
            Err(RagError::ModelMismatch { .. })
        ));
        assert!(!session.is_ready());
    }

    #[test]
    fn new_document_clears_history() {
        let mut session = Session::new("gemma2:2b").unwrap();
        session.attach("a.pdf", index("gemma2:2b")).unwrap();
        session.history.push(ChatTurn::user("q"));
        session.attach("b.pdf", index("gemma2:2b")).unwrap();
        assert_eq!(session.document_name(), Some("b.pdf"));
        assert!(session.history().is_empty());

        session.reset();
        assert!(session.document_name().is_none());
        assert!(!session.is_ready());
    }
}
