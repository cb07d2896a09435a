//! Tripex Core - Annotation model, triplets, and shared traits
//!
//! This crate defines the core abstractions used throughout tripex:
//! - Linguistic annotation model (tokens, POS tags, dependency labels, documents)
//! - Readers for pre-computed annotations (CoNLL-U, token JSON)
//! - The (Subject, Relation, Object) triplet value
//! - Common error types
//! - Collaborator traits (annotator, text source, LLM client)
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod annotation;
pub mod config;
pub mod formats;

pub use annotation::{DepLabel, Document, PosTag, Token};
pub use config::{
    AnnotatorConfig, AppConfig, ConfigError, ExtractionConfig, LlmConfig, LlmProvider,
    LoggingConfig, SourceConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for tripex operations
#[derive(Error, Debug)]
pub enum TripexError {
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Title is ambiguous: {title} ({} candidates)", .options.len())]
    AmbiguousTitle { title: String, options: Vec<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TripexError>;

// ============================================================================
// Triplets
// ============================================================================

/// A (Subject, Relation, Object) triplet extracted from text
///
/// Triplets are plain values: two triplets with the same strings are equal,
/// regardless of which extractor produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triplet {
    /// Create a new triplet
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// True when every field carries text
    pub fn is_complete(&self) -> bool {
        !self.subject.is_empty() && !self.relation.is_empty() && !self.object.is_empty()
    }
}

impl std::fmt::Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

impl From<(&str, &str, &str)> for Triplet {
    fn from((subject, relation, object): (&str, &str, &str)) -> Self {
        Self::new(subject, relation, object)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Turns raw text into a tagged, dependency-linked document.
///
/// Implementations must be deterministic for deterministic input.
#[async_trait::async_trait]
pub trait Annotator: Send + Sync {
    /// Annotate raw text
    async fn annotate(&self, text: &str) -> Result<Document>;

    /// Get annotator name for logging
    fn name(&self) -> &str;
}

/// Retrieves raw document text by title
#[async_trait::async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch the plain text of the document with the given title
    ///
    /// Fails with [`TripexError::NotFound`], [`TripexError::AmbiguousTitle`]
    /// or [`TripexError::Transport`].
    async fn fetch(&self, title: &str) -> Result<String>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for reports
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
