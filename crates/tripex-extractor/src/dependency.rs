//! Dependency pattern matching (tree-based extraction)
//!
//! Considers every ordered pair of proper-noun phrase heads and tests two
//! configurations around a root verb:
//!
//! - Shared verb root: both heads hang off the same root verb, the first as
//!   `nsubj` and the second as `dobj`. Relation is the verb.
//! - Prepositional object: the first head is the verb's `nsubj`, the second
//!   is the `pobj` of a `prep` attached to that verb. Relation is
//!   "verb preposition".
//!
//! Heads are compared by token index, never by text. Both directions of a
//! pair are visited and nothing is deduplicated.

use serde::Serialize;
use tripex_core::{DepLabel, Document, PosTag, Token, Triplet};

use crate::assembler::{assemble, join_texts, render_phrase};
use crate::TripletExtractor;

/// Syntactic configuration that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyPattern {
    /// `nsubj` and `dobj` of the same root verb
    SharedVerbRoot,
    /// `nsubj` of a root verb and `pobj` of its `prep`
    PrepositionalObject,
}

impl DependencyPattern {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SharedVerbRoot => "shared_verb_root",
            Self::PrepositionalObject => "prepositional_object",
        }
    }
}

impl std::fmt::Display for DependencyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A triplet together with the tokens and pattern behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyMatch {
    pub pattern: DependencyPattern,
    /// Index of the subject phrase head
    pub subject_head: usize,
    /// Index of the object phrase head
    pub object_head: usize,
    pub triplet: Triplet,
}

/// Dependency-tree pattern matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyMatcher;

impl DependencyMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Find all pattern matches, in pair-visit order
    pub fn matches(&self, document: &Document) -> Vec<DependencyMatch> {
        let heads: Vec<&Token> = document
            .tokens()
            .iter()
            .filter(|t| t.is_proper_noun_head())
            .collect();

        // Phrases depend only on the head, so render each once
        let phrases: Vec<String> = heads.iter().map(|h| render_phrase(document, h)).collect();

        let mut found = Vec::new();
        for (i, h1) in heads.iter().enumerate() {
            for (j, h2) in heads.iter().enumerate() {
                if h1.index == h2.index {
                    continue;
                }

                if let Some(relation) = shared_verb_root(document, h1, h2) {
                    push_match(
                        &mut found,
                        DependencyPattern::SharedVerbRoot,
                        (*h1, phrases[i].as_str()),
                        relation,
                        (*h2, phrases[j].as_str()),
                    );
                }

                if let Some(relation) = prepositional_object(document, h1, h2) {
                    push_match(
                        &mut found,
                        DependencyPattern::PrepositionalObject,
                        (*h1, phrases[i].as_str()),
                        relation,
                        (*h2, phrases[j].as_str()),
                    );
                }
            }
        }

        tracing::debug!(heads = heads.len(), matches = found.len(), "dependency match complete");
        found
    }
}

impl TripletExtractor for DependencyMatcher {
    fn extract(&self, document: &Document) -> Vec<Triplet> {
        self.matches(document).into_iter().map(|m| m.triplet).collect()
    }

    fn name(&self) -> &str {
        "dependency"
    }
}

fn push_match(
    found: &mut Vec<DependencyMatch>,
    pattern: DependencyPattern,
    (subject, subject_phrase): (&Token, &str),
    relation: String,
    (object, object_phrase): (&Token, &str),
) {
    if let Some(triplet) = assemble(subject_phrase.to_string(), relation, object_phrase.to_string()) {
        tracing::trace!(%pattern, %triplet, "dependency pattern matched");
        found.push(DependencyMatch {
            pattern,
            subject_head: subject.index,
            object_head: object.index,
            triplet,
        });
    }
}

fn is_root_verb(token: &Token) -> bool {
    token.dep == DepLabel::Root && token.pos == PosTag::Verb
}

/// `h1 <-nsubj- VERB(ROOT) -dobj-> h2`
fn shared_verb_root(document: &Document, h1: &Token, h2: &Token) -> Option<String> {
    if h1.head != h2.head {
        return None;
    }
    let verb = document.head_of(h1);
    if is_root_verb(verb) && h1.dep == DepLabel::Nsubj && h2.dep == DepLabel::Dobj {
        Some(verb.text.clone())
    } else {
        None
    }
}

/// `h1 <-nsubj- VERB(ROOT) -prep-> P -pobj-> h2`
fn prepositional_object(document: &Document, h1: &Token, h2: &Token) -> Option<String> {
    let preposition = document.head_of(h2);
    if h1.head != preposition.head {
        return None;
    }
    let verb = document.head_of(h1);
    if is_root_verb(verb)
        && h1.dep == DepLabel::Nsubj
        && preposition.dep == DepLabel::Prep
        && h2.dep == DepLabel::Pobj
    {
        Some(join_texts([verb, preposition]))
    } else {
        None
    }
}
