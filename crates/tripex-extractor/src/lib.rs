//! Tripex Extractor - Triplet extraction pipeline
//!
//! Implements (Subject, Relation, Object) extraction over a pre-computed
//! linguistic annotation:
//! - Span scanning: consecutive proper nouns with a verb between them
//! - Dependency patterns: subject/object and subject/prepositional-object
//!   configurations around a root verb
//! - LLM-backed extraction behind the same triplet-list contract
//!
//! Rule-based extraction is a pure function of an immutable [`Document`]:
//! no I/O, no randomness, and safe to run concurrently on the same document.
//!
//! Author: hephaex@gmail.com

use tripex_core::{Document, Triplet};

pub mod assembler;
pub mod dependency;
pub mod llm;
pub mod review;
pub mod span;

pub use dependency::{DependencyMatch, DependencyMatcher, DependencyPattern};
pub use llm::{LlmExtractor, LlmExtractorConfig};
pub use review::{sample, ReviewTally, Verdict};
pub use span::SpanScanner;

/// Trait for rule-based triplet extractors
///
/// Extraction is total: a well-formed document always yields a (possibly
/// empty) sequence, and the same document always yields the same sequence.
pub trait TripletExtractor: Send + Sync {
    /// Extract triplets in document order
    fn extract(&self, document: &Document) -> Vec<Triplet>;

    /// Get extractor name for logging and reports
    fn name(&self) -> &str;
}

/// Extract triplets with the span scanner (POS-based rules)
pub fn extract_pos(document: &Document) -> Vec<Triplet> {
    SpanScanner::new().extract(document)
}

/// Extract triplets with the dependency pattern matcher
pub fn extract_dependency(document: &Document) -> Vec<Triplet> {
    DependencyMatcher::new().extract(document)
}
