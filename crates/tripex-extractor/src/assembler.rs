//! Triplet assembly
//!
//! Rendering rules shared by every rule-based extractor: token texts are
//! joined with a single ASCII space, entity phrases keep document order, and
//! a triplet with an empty field is never produced.

use tripex_core::{DepLabel, Document, Token, Triplet};

const SEPARATOR: &str = " ";

/// Join token texts with single spaces, in the order given
pub fn join_texts<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a Token>,
{
    tokens
        .into_iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Render the entity phrase headed by `head`
///
/// The phrase is the head text plus the texts of its direct `compound`
/// children, as a set: repeated texts appear once. Constituents are ordered
/// by token index, so "New York City" renders as written.
pub fn render_phrase(document: &Document, head: &Token) -> String {
    let mut constituents: Vec<&Token> = document
        .children(head.index)
        .filter(|c| c.dep == DepLabel::Compound)
        .chain(std::iter::once(head))
        .collect();
    constituents.sort_by_key(|t| t.index);

    let mut seen: Vec<&str> = Vec::with_capacity(constituents.len());
    for token in constituents {
        if !seen.contains(&token.text.as_str()) {
            seen.push(token.text.as_str());
        }
    }
    seen.join(SEPARATOR)
}

/// Build a triplet, or nothing when any field is empty
pub fn assemble(subject: String, relation: String, object: String) -> Option<Triplet> {
    let triplet = Triplet {
        subject,
        relation,
        object,
    };
    if triplet.is_complete() {
        Some(triplet)
    } else {
        tracing::trace!(%triplet, "suppressing triplet with an empty field");
        None
    }
}
