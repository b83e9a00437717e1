//! # corep-rag
//!
//! Retrieval-backed assistant for the PRA COREP own funds template (C 01.00).
//!
//! ```text
//! question → Retriever (EmbeddingProvider + VectorDB) → passages
//!          → Generator (external model) → candidate JSON
//!          → assemble → Validator → ReportOutput with warnings
//! ```
//!
//! The generative model is untrusted: [`assembler::assemble`] never fails on
//! malformed candidates and [`validator`] flags numeric inconsistencies as
//! warnings instead of rejecting output.

pub mod assembler;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod retriever;
pub mod validator;
pub mod vector_db;

pub use assembler::assemble;
pub use config::Config;
pub use corpus::{Corpus, Passage};
pub use embeddings::{EmbeddingProvider, HashingEmbedder};
pub use error::{CorepError, Result};
pub use llm::Generator;
pub use models::{CapitalFigures, Justification, ReportOutput};
pub use pipeline::CorepPipeline;
pub use retriever::Retriever;
pub use validator::{Validator, validate};
pub use vector_db::{RetrievalResult, ScoredPassage, VectorDB};
