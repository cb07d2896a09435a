//! Linguistic annotation model
//!
//! A [`Document`] owns a flat array of [`Token`]s. Dependency links are
//! token indexes into that array, so "same head" is an index comparison
//! and no token owns another.

use serde::{Deserialize, Serialize};

use crate::{Result, TripexError};

// ============================================================================
// Part-of-speech tags
// ============================================================================

/// Universal part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Space,
}

impl PosTag {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::X => "X",
            Self::Space => "SPACE",
        }
    }

    /// Parse a tag, case-insensitively. Unknown tags are opaque and map to `X`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ADJ" => Self::Adj,
            "ADP" => Self::Adp,
            "ADV" => Self::Adv,
            "AUX" => Self::Aux,
            "CCONJ" | "CONJ" => Self::Cconj,
            "DET" => Self::Det,
            "INTJ" => Self::Intj,
            "NOUN" => Self::Noun,
            "NUM" => Self::Num,
            "PART" => Self::Part,
            "PRON" => Self::Pron,
            "PROPN" => Self::Propn,
            "PUNCT" => Self::Punct,
            "SCONJ" => Self::Sconj,
            "SYM" => Self::Sym,
            "VERB" => Self::Verb,
            "SPACE" => Self::Space,
            _ => Self::X,
        }
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for PosTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PosTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

// ============================================================================
// Dependency labels
// ============================================================================

/// Syntactic role of a token relative to its head
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepLabel {
    /// Nominal subject
    Nsubj,
    /// Direct object
    Dobj,
    /// Object of a preposition
    Pobj,
    /// Prepositional modifier
    Prep,
    /// Modifier inside a multi-word name
    Compound,
    /// Sentence root
    Root,
    /// Any other label, kept verbatim
    Other(String),
}

impl DepLabel {
    /// Get the canonical label
    pub fn as_str(&self) -> &str {
        match self {
            Self::Nsubj => "nsubj",
            Self::Dobj => "dobj",
            Self::Pobj => "pobj",
            Self::Prep => "prep",
            Self::Compound => "compound",
            Self::Root => "ROOT",
            Self::Other(label) => label,
        }
    }

    /// Parse a label. `ROOT` matches case-insensitively; everything else is
    /// matched lower-case.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("root") {
            return Self::Root;
        }
        match s {
            "nsubj" => Self::Nsubj,
            "dobj" => Self::Dobj,
            "pobj" => Self::Pobj,
            "prep" => Self::Prep,
            "compound" => Self::Compound,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for DepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for DepLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DepLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// A single annotated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the document (0-based)
    pub index: usize,

    /// Surface text
    pub text: String,

    /// Part-of-speech tag
    pub pos: PosTag,

    /// Dependency label relative to the head
    pub dep: DepLabel,

    /// Index of the head token (self for a root)
    pub head: usize,
}

impl Token {
    /// Create a new token
    pub fn new(index: usize, text: impl Into<String>, pos: PosTag, dep: DepLabel, head: usize) -> Self {
        Self {
            index,
            text: text.into(),
            pos,
            dep,
            head,
        }
    }

    /// True when the token is its own head
    pub fn is_root(&self) -> bool {
        self.head == self.index
    }

    /// True for a proper noun not absorbed as a compound modifier
    pub fn is_proper_noun_head(&self) -> bool {
        self.pos == PosTag::Propn && self.dep != DepLabel::Compound
    }
}

// ============================================================================
// Documents
// ============================================================================

/// An annotated text: one or more sentence trees concatenated in order
///
/// Read-only once built; safe to share across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    tokens: Vec<Token>,
    children: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Unvisited,
    OnPath,
    ReachesRoot,
}

impl Document {
    /// Build a document, validating the dependency structure
    ///
    /// Fails with [`TripexError::InvalidAnnotation`] when a token index does
    /// not match its position, a head is out of range, or a head chain does
    /// not end in a self-looping root.
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        let len = tokens.len();

        for (position, token) in tokens.iter().enumerate() {
            if token.index != position {
                return Err(TripexError::InvalidAnnotation(format!(
                    "token '{}' at position {} has index {}",
                    token.text, position, token.index
                )));
            }
            if token.head >= len {
                return Err(TripexError::InvalidAnnotation(format!(
                    "token {} points to head {} outside document of {} tokens",
                    position, token.head, len
                )));
            }
        }

        // Every chain must reach a root. Tokens proven to do so are marked,
        // so each token is walked at most once.
        let mut state = vec![ChainState::Unvisited; len];
        let mut path = Vec::new();
        for start in 0..len {
            let mut current = start;
            while state[current] == ChainState::Unvisited && tokens[current].head != current {
                state[current] = ChainState::OnPath;
                path.push(current);
                current = tokens[current].head;
            }
            if state[current] == ChainState::OnPath {
                return Err(TripexError::InvalidAnnotation(format!(
                    "head chain from token {start} contains a cycle"
                )));
            }
            state[current] = ChainState::ReachesRoot;
            for token in path.drain(..) {
                state[token] = ChainState::ReachesRoot;
            }
        }

        let mut children = vec![Vec::new(); len];
        for token in &tokens {
            if !token.is_root() {
                children[token.head].push(token.index);
            }
        }

        Ok(Self { tokens, children })
    }

    /// An empty document
    pub fn empty() -> Self {
        Self::default()
    }

    /// All tokens in document order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Get a token by index
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the document has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The head of a token. Heads are validated at construction.
    pub fn head_of(&self, token: &Token) -> &Token {
        &self.tokens[token.head]
    }

    /// Direct children of a token, in document order
    pub fn children(&self, index: usize) -> impl Iterator<Item = &Token> + '_ {
        self.children
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&child| &self.tokens[child])
    }

    /// Tokens strictly between two indexes, in document order
    pub fn between(&self, from: usize, to: usize) -> &[Token] {
        let start = (from + 1).min(self.tokens.len());
        let end = to.min(self.tokens.len());
        if start >= end {
            &[]
        } else {
            &self.tokens[start..end]
        }
    }

    /// Proper-noun tokens, in document order
    pub fn proper_nouns(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| t.pos == PosTag::Propn)
    }

    /// Tokens sitting at the root of a sentence tree
    pub fn roots(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| t.is_root())
    }

    /// Space-joined surface text, for logging and prompts
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// Tests
// ============================================================================
