//! Span scanning (POS-based extraction)
//!
//! Pairs each proper noun with the next one in the document and reads the
//! relation off the tokens between them: the span must contain a verb and no
//! punctuation, and the relation is its verbs and adpositions in order.
//!
//! Consecutive pairs overlap (the object of one pair is the subject of the
//! next) and the scan is not sentence-aware; punctuation in the span is the
//! only boundary signal.

use tripex_core::{Document, PosTag, Token, Triplet};

use crate::assembler::{assemble, join_texts};
use crate::TripletExtractor;

/// Relation-token limit used by [`SpanScanner::strict`]
pub const STRICT_MAX_RELATION_TOKENS: usize = 3;

/// POS-based span scanner
#[derive(Debug, Clone, Default)]
pub struct SpanScanner {
    /// Reject candidates whose relation has more tokens than this
    max_relation_tokens: Option<usize>,
}

impl SpanScanner {
    /// Create a scanner with no relation length limit
    pub fn new() -> Self {
        Self {
            max_relation_tokens: None,
        }
    }

    /// Create a scanner that rejects relations longer than three tokens
    pub fn strict() -> Self {
        Self::new().with_max_relation_tokens(STRICT_MAX_RELATION_TOKENS)
    }

    /// Set the relation length limit
    pub fn with_max_relation_tokens(mut self, max: usize) -> Self {
        self.max_relation_tokens = Some(max);
        self
    }

    /// Current relation length limit
    pub fn max_relation_tokens(&self) -> Option<usize> {
        self.max_relation_tokens
    }

    /// Relation for one candidate span, if the span qualifies
    fn relation_for(&self, between: &[Token]) -> Option<String> {
        if between.is_empty()
            || !between.iter().any(|t| t.pos == PosTag::Verb)
            || between.iter().any(|t| t.pos == PosTag::Punct)
        {
            return None;
        }

        let relation_tokens: Vec<&Token> = between
            .iter()
            .filter(|t| matches!(t.pos, PosTag::Verb | PosTag::Adp))
            .collect();

        if let Some(max) = self.max_relation_tokens {
            if relation_tokens.len() > max {
                return None;
            }
        }

        Some(join_texts(relation_tokens))
    }
}

impl TripletExtractor for SpanScanner {
    fn extract(&self, document: &Document) -> Vec<Triplet> {
        let proper_nouns: Vec<&Token> = document.proper_nouns().collect();

        let triplets: Vec<Triplet> = proper_nouns
            .windows(2)
            .filter_map(|pair| {
                let (subject, object) = (pair[0], pair[1]);
                let relation = self.relation_for(document.between(subject.index, object.index))?;
                assemble(subject.text.clone(), relation, object.text.clone())
            })
            .collect();

        tracing::debug!(
            proper_nouns = proper_nouns.len(),
            triplets = triplets.len(),
            "span scan complete"
        );
        triplets
    }

    fn name(&self) -> &str {
        if self.max_relation_tokens.is_some() {
            "pos-strict"
        } else {
            "pos"
        }
    }
}
