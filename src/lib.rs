//! # pdf-rag
//!
//! Retrieval-augmented question answering over PDF documents.
//!
//! A document is split into short, heavily overlapping passages whose size
//! depends on the document's length. The passages are embedded by a local
//! Ollama server into an in-memory similarity index, which can be saved to
//! and loaded from a cache directory. Questions are answered by retrieving
//! the nearest passages and asking the model to answer from them alone.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │   PDF   │──▶│   Extract    │──▶│ Split+Embed  │──▶│  Index   │
//! │  bytes  │   │  per page    │   │ (heuristic)  │   │ (cosine) │
//! └─────────┘   └──────────────┘   └──────────────┘   └────┬─────┘
//!                                                          │
//!                      ┌──────────────┬────────────────────┤
//!                      ▼              ▼                    ▼
//!                ┌──────────┐  ┌────────────┐       ┌────────────┐
//!                │ Persist  │  │  Answer    │──────▶│  Ollama    │
//!                │ (cache)  │  │  Engine    │       │  generate  │
//!                └──────────┘  └────────────┘       └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Selectable models; soft `describe`, hard `resolve` |
//! | [`heuristic`] | Size bands, model recommendation, segmentation parameters |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`split`] | Boundary-preferring overlapping passage splitter |
//! | [`embedding`] | Embedder trait, Ollama embedder, vector helpers |
//! | [`index`] | In-memory similarity index |
//! | [`ingest`] | Ingestion pipeline |
//! | [`persist`] | Save/load indexes under a cache root |
//! | [`generation`] | Generator trait and Ollama generator |
//! | [`prompt`] | Grounded question-answering prompt |
//! | [`answer`] | Retrieval + generation |
//! | [`session`] | Per-document chat state |
//! | [`config`] | TOML configuration |
//! | [`error`] | Error taxonomy |

pub mod answer;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod heuristic;
pub mod index;
pub mod ingest;
pub mod models;
pub mod ollama;
pub mod persist;
pub mod prompt;
pub mod session;
pub mod split;

pub use error::{RagError, Result};
