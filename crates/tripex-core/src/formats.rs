//! Readers for pre-computed annotations
//!
//! Supports:
//! - CoNLL-U (one token per line, blank line between sentences)
//! - Token JSON (`[{"text", "pos", "dep", "head"}]`, absolute 0-based heads),
//!   the shape returned by the HTTP annotation service

use serde::Deserialize;

use crate::annotation::{DepLabel, Document, PosTag, Token};
use crate::{Result, TripexError};

// CoNLL-U column positions
const COL_ID: usize = 0;
const COL_FORM: usize = 1;
const COL_UPOS: usize = 3;
const COL_HEAD: usize = 6;
const COL_DEPREL: usize = 7;
const CONLLU_COLUMNS: usize = 10;

/// Token record in the JSON annotation format
#[derive(Debug, Deserialize)]
struct TokenRecord {
    text: String,
    pos: PosTag,
    dep: DepLabel,
    head: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenPayload {
    Bare(Vec<TokenRecord>),
    Wrapped { tokens: Vec<TokenRecord> },
}

impl Document {
    /// Read a document from token JSON
    ///
    /// Accepts either a bare array or an object with a `tokens` array.
    /// Token indexes are assigned by position.
    pub fn from_token_json(json: &str) -> Result<Self> {
        let payload: TokenPayload = serde_json::from_str(json)
            .map_err(|e| TripexError::InvalidAnnotation(format!("token JSON: {e}")))?;

        let records = match payload {
            TokenPayload::Bare(records) => records,
            TokenPayload::Wrapped { tokens } => tokens,
        };

        let tokens = records
            .into_iter()
            .enumerate()
            .map(|(index, r)| Token::new(index, r.text, r.pos, r.dep, r.head))
            .collect();

        Self::new(tokens)
    }

    /// Read a document from CoNLL-U
    ///
    /// Sentences are concatenated in order. Per-sentence 1-based heads are
    /// rebased to document-wide indexes and `HEAD = 0` becomes a self-loop.
    /// Multiword-token ranges (`1-2`) and empty nodes (`1.1`) are skipped.
    pub fn from_conllu(input: &str) -> Result<Self> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut sentence_start = 0usize;
        // (line number, raw 1-based head) for the open sentence
        let mut pending_heads: Vec<(usize, usize)> = Vec::new();

        for (line_no, line) in input.lines().enumerate() {
            let line = line.trim_end();

            if line.is_empty() {
                close_sentence(&mut tokens[sentence_start..], &mut pending_heads, sentence_start)?;
                sentence_start = tokens.len();
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() != CONLLU_COLUMNS {
                return Err(invalid_line(
                    line_no,
                    format!("expected {CONLLU_COLUMNS} columns, found {}", columns.len()),
                ));
            }

            let id = columns[COL_ID];
            if id.contains('-') || id.contains('.') {
                tracing::trace!(line = line_no + 1, id, "skipping multiword or empty node");
                continue;
            }

            let id: usize = id
                .parse()
                .map_err(|_| invalid_line(line_no, format!("bad token id '{id}'")))?;
            let expected = tokens.len() - sentence_start + 1;
            if id != expected {
                return Err(invalid_line(
                    line_no,
                    format!("token id {id} out of sequence, expected {expected}"),
                ));
            }

            let head: usize = columns[COL_HEAD].parse().map_err(|_| {
                invalid_line(line_no, format!("bad head '{}'", columns[COL_HEAD]))
            })?;

            // Heads may point forward, so they are resolved when the sentence closes
            let index = tokens.len();
            pending_heads.push((line_no, head));
            tokens.push(Token::new(
                index,
                columns[COL_FORM],
                PosTag::parse(columns[COL_UPOS]),
                DepLabel::parse(columns[COL_DEPREL]),
                index,
            ));
        }
        close_sentence(&mut tokens[sentence_start..], &mut pending_heads, sentence_start)?;

        Self::new(tokens)
    }
}

/// Rebase the raw heads of one finished sentence onto document indexes
///
/// A head must stay inside its own sentence; `0` marks the root.
fn close_sentence(
    sentence: &mut [Token],
    pending_heads: &mut Vec<(usize, usize)>,
    sentence_start: usize,
) -> Result<()> {
    let sentence_len = sentence.len();
    for (token, (line_no, head)) in sentence.iter_mut().zip(pending_heads.drain(..)) {
        if head > sentence_len {
            return Err(invalid_line(
                line_no,
                format!("head {head} outside sentence of {sentence_len} tokens"),
            ));
        }
        if head != 0 {
            token.head = sentence_start + head - 1;
        }
    }
    Ok(())
}

fn invalid_line(line_no: usize, message: String) -> TripexError {
    TripexError::InvalidAnnotation(format!("CoNLL-U line {}: {message}", line_no + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_SPOKE_WITH_BOB: &str = "\
# text = Alice spoke with Bob.
1\tAlice\tAlice\tPROPN\tNNP\t_\t2\tnsubj\t_\t_
2\tspoke\tspeak\tVERB\tVBD\t_\t0\tROOT\t_\t_
3\twith\twith\tADP\tIN\t_\t2\tprep\t_\t_
4\tBob\tBob\tPROPN\tNNP\t_\t3\tpobj\t_\t_
5\t.\t.\tPUNCT\t.\t_\t2\tpunct\t_\t_

1\tBob\tBob\tPROPN\tNNP\t_\t2\tnsubj\t_\t_
2\tleft\tleave\tVERB\tVBD\t_\t0\tROOT\t_\t_
";

    #[test]
    fn test_conllu_rebases_heads() {
        let doc = Document::from_conllu(ALICE_SPOKE_WITH_BOB).unwrap();
        assert_eq!(doc.len(), 7);

        let bob = doc.get(3).unwrap();
        assert_eq!(bob.dep, DepLabel::Pobj);
        assert_eq!(doc.head_of(bob).text, "with");

        // second sentence: "Bob" (5) -> "left" (6), "left" is a root
        assert_eq!(doc.get(5).unwrap().head, 6);
        assert!(doc.get(6).unwrap().is_root());
        assert!(doc.get(1).unwrap().is_root());
    }

    #[test]
    fn test_conllu_skips_multiword_ranges() {
        let input = "\
1-2\tdon't\t_\t_\t_\t_\t_\t_\t_\t_
1\tdo\tdo\tAUX\t_\t_\t0\tROOT\t_\t_
2\tn't\tnot\tPART\t_\t_\t1\tneg\t_\t_
";
        let doc = Document::from_conllu(input).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get(1).unwrap().dep, DepLabel::Other("neg".to_string()));
    }

    #[test]
    fn test_conllu_rejects_short_lines() {
        let err = Document::from_conllu("1\tAlice\tPROPN\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_conllu_rejects_dangling_head() {
        let input = "1\tAlice\tAlice\tPROPN\t_\t_\t7\tnsubj\t_\t_\n";
        assert!(matches!(
            Document::from_conllu(input),
            Err(TripexError::InvalidAnnotation(_))
        ));
    }

    #[test]
    fn test_conllu_rejects_head_leaking_into_next_sentence() {
        let input = "\
1\tAlice\tAlice\tPROPN\t_\t_\t0\tROOT\t_\t_
2\tleft\tleave\tVERB\t_\t_\t3\tdep\t_\t_

1\tBob\tBob\tPROPN\t_\t_\t2\tnsubj\t_\t_
2\tstayed\tstay\tVERB\t_\t_\t0\tROOT\t_\t_
";
        match Document::from_conllu(input) {
            Err(TripexError::InvalidAnnotation(message)) => {
                assert!(message.contains("line 2"), "{message}");
                assert!(message.contains("outside sentence"), "{message}");
            }
            other => panic!("expected InvalidAnnotation, got {other:?}"),
        }
    }

    #[test]
    fn test_conllu_resolves_forward_heads() {
        let input = "\
1\tNew\tNew\tPROPN\t_\t_\t2\tcompound\t_\t_
2\tYork\tYork\tPROPN\t_\t_\t0\tROOT\t_\t_

1\tBob\tBob\tPROPN\t_\t_\t2\tnsubj\t_\t_
2\tstayed\tstay\tVERB\t_\t_\t0\tROOT\t_\t_
";
        let doc = Document::from_conllu(input).unwrap();
        let heads: Vec<usize> = doc.tokens().iter().map(|t| t.head).collect();
        assert_eq!(heads, [1, 1, 3, 3]);
    }

    #[test]
    fn test_token_json_bare_and_wrapped() {
        let bare = r#"[
            {"text": "Alice", "pos": "PROPN", "dep": "nsubj", "head": 1},
            {"text": "met", "pos": "VERB", "dep": "ROOT", "head": 1},
            {"text": "Bob", "pos": "PROPN", "dep": "dobj", "head": 1}
        ]"#;
        let wrapped = format!(r#"{{"tokens": {bare}}}"#);

        let a = Document::from_token_json(bare).unwrap();
        let b = Document::from_token_json(&wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(2).unwrap().index, 2);
    }

    #[test]
    fn test_token_json_rejects_garbage() {
        assert!(Document::from_token_json("{\"nope\": 1}").is_err());
    }
}
