//! Static registry of selectable models.
//!
//! The same identifier selects both the embedding model and the generation
//! model on the Ollama server. The catalog is fixed at compile time; there
//! is no runtime registration.
//!
//! Two lookups with different failure contracts:
//! - [`describe`] is soft and returns `None` for unknown identifiers. Use it
//!   for display text.
//! - [`resolve`] is hard and fails with [`RagError::UnknownModel`]. Use it
//!   whenever a client is constructed, so a typo in configuration never
//!   reaches a backend as an arbitrary model string.

use crate::error::{RagError, Result};

/// Descriptive metadata for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Stable key, as understood by the Ollama server (e.g. `"gemma2:9b"`).
    pub identifier: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub parameter_count_label: &'static str,
}

impl ModelDescriptor {
    /// Menu label: `"Gemma 2 9B (9B parameters)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.parameter_count_label)
    }
}

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemma2:27b";

/// Catalog entries in display order.
static MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        identifier: "gemma2:27b",
        display_name: "Gemma 2 27B",
        description: "Large model with the highest accuracy, but slower",
        parameter_count_label: "27B parameters",
    },
    ModelDescriptor {
        identifier: "gemma2:9b",
        display_name: "Gemma 2 9B",
        description: "Mid-sized model balancing speed and accuracy",
        parameter_count_label: "9B parameters",
    },
    ModelDescriptor {
        identifier: "gemma2:2b",
        display_name: "Gemma 2 2B",
        description: "Small, very fast model suited to everyday documents",
        parameter_count_label: "2B parameters",
    },
    ModelDescriptor {
        identifier: "nomic-embed-text",
        display_name: "Nomic Embed Text",
        description: "Dedicated high-throughput embedding model",
        parameter_count_label: "137M parameters",
    },
    ModelDescriptor {
        identifier: "mxbai-embed-large",
        display_name: "MixedBread AI Embed Large",
        description: "High-quality multilingual embedding model",
        parameter_count_label: "335M parameters",
    },
];

/// All catalog entries, in display order.
pub fn list_models() -> &'static [ModelDescriptor] {
    MODELS
}

/// Soft lookup for display contexts. Never fails.
pub fn describe(identifier: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.identifier == identifier)
}

/// Hard lookup for client construction.
///
/// # Errors
///
/// [`RagError::UnknownModel`] when `identifier` is not in the catalog.
pub fn resolve(identifier: &str) -> Result<&'static ModelDescriptor> {
    describe(identifier).ok_or_else(|| RagError::UnknownModel {
        identifier: identifier.to_string(),
        available: MODELS
            .iter()
            .map(|m| m.identifier)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
