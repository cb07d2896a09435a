//! LLM-backed triplet extraction
//!
//! Sends raw text (truncated to a character budget) to a hosted model and
//! parses a JSON list of `{Subject, Relation, Object}` objects out of the
//! reply. Output is best effort: entries are only checked for shape.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use tripex_core::{LlmClient, Result, Triplet, TripexError};

/// Configuration for LLM-based extraction
#[derive(Debug, Clone)]
pub struct LlmExtractorConfig {
    /// Input is cut to this many characters
    pub max_input_chars: usize,
}

impl Default for LlmExtractorConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 5000,
        }
    }
}

/// LLM-based triplet extractor
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
    config: LlmExtractorConfig,
}

impl LlmExtractor {
    /// Create a new LLM extractor with default config
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_config(client, LlmExtractorConfig::default())
    }

    /// Create with custom config
    pub fn with_config(client: Arc<dyn LlmClient>, config: LlmExtractorConfig) -> Self {
        Self { client, config }
    }

    /// Model behind this extractor
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Build the extraction prompt
    pub fn build_prompt(&self, text: &str) -> String {
        let excerpt = truncate_chars(text, self.config.max_input_chars);
        format!(
            "Extract triplets (Subject, Relation, Object) from the following text:\n\
             {excerpt}\n\
             Output the triplets in JSON format, as a list where each triplet is an \
             object with keys: Subject, Relation, and Object. Output only the JSON."
        )
    }

    /// Extract triplets from raw text
    pub async fn extract_text(&self, text: &str) -> Result<Vec<Triplet>> {
        let prompt = self.build_prompt(text);
        let response = self.client.generate(&prompt).await?;
        let triplets = parse_response(&response)?;

        tracing::debug!(
            model = self.client.model(),
            triplets = triplets.len(),
            "llm extraction complete"
        );
        Ok(triplets)
    }
}

/// Cut `text` to at most `max_chars` characters, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Parse a model reply into triplets
///
/// Accepts a bare JSON array, an object wrapping the array under `triplets`,
/// or a single triplet object, optionally inside a Markdown code fence.
/// Keys match case-insensitively; `predicate` is accepted for `relation`.
/// Entries missing a field are dropped.
pub fn parse_response(response: &str) -> Result<Vec<Triplet>> {
    let payload = strip_code_fence(response);

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| TripexError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let wrapped = field(&map, &["triplets"]).and_then(Value::as_array).cloned();
            match wrapped {
                Some(items) => items,
                None => {
                    let single = Value::Object(map);
                    if triplet_from_value(&single).is_none() {
                        return Err(not_a_list());
                    }
                    vec![single]
                }
            }
        }
        _ => return Err(not_a_list()),
    };

    let total = items.len();
    let triplets: Vec<Triplet> = items.iter().filter_map(triplet_from_value).collect();
    if triplets.len() < total {
        tracing::debug!(dropped = total - triplets.len(), "dropped incomplete llm triplets");
    }
    Ok(triplets)
}

fn not_a_list() -> TripexError {
    TripexError::MalformedResponse("expected a list of triplets".to_string())
}

fn strip_code_fence(response: &str) -> &str {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok();
    fence
        .as_ref()
        .and_then(|re| re.captures(response))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| response.trim())
}

fn field<'a>(map: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    map.iter()
        .find(|(key, _)| names.iter().any(|n| key.eq_ignore_ascii_case(n)))
        .map(|(_, value)| value)
}

fn triplet_from_value(value: &Value) -> Option<Triplet> {
    match value {
        Value::Object(map) => {
            let text = |names: &[&str]| {
                field(map, names)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Some(Triplet::new(
                text(&["subject"])?,
                text(&["relation", "predicate"])?,
                text(&["object"])?,
            ))
        }
        Value::Array(parts) if parts.len() == 3 => {
            let text = |i: usize| {
                parts[i]
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Some(Triplet::new(text(0)?, text(1)?, text(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedClient {
        reply: String,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedClient {
        async fn generate(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Subject, Relation, and Object"));
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_prompt_truncates_input() {
        let client = Arc::new(CannedClient { reply: String::new() });
        let extractor =
            LlmExtractor::with_config(client, LlmExtractorConfig { max_input_chars: 5 });
        let prompt = extractor.build_prompt("Alice met Bob");
        assert!(prompt.contains("Alice\n"));
        assert!(!prompt.contains("Bob"));
    }

    #[test]
    fn test_parse_bare_array() {
        let triplets = parse_response(
            r#"[{"Subject": "Alice", "Relation": "met", "Object": "Bob"}]"#,
        )
        .unwrap();
        assert_eq!(triplets, vec![Triplet::new("Alice", "met", "Bob")]);
    }

    #[test]
    fn test_parse_fenced_wrapped_object() {
        let reply = "Here you go:\n```json\n{\"triplets\": [\
            {\"subject\": \"Alice\", \"predicate\": \"met\", \"object\": \"Bob\"},\
            [\"Bob\", \"visited\", \"Paris\"]\
        ]}\n```";
        let triplets = parse_response(reply).unwrap();
        assert_eq!(
            triplets,
            vec![
                Triplet::new("Alice", "met", "Bob"),
                Triplet::new("Bob", "visited", "Paris"),
            ]
        );
    }

    #[test]
    fn test_parse_drops_incomplete_entries() {
        let triplets = parse_response(
            r#"[{"Subject": "Alice", "Relation": "met"}, {"Subject": "A", "Relation": "r", "Object": "B"}]"#,
        )
        .unwrap();
        assert_eq!(triplets.len(), 1);
    }

    #[test]
    fn test_parse_single_object() {
        let triplets =
            parse_response(r#"{"Subject": "Alice", "Relation": "met", "Object": "Bob"}"#).unwrap();
        assert_eq!(triplets.len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        assert!(matches!(
            parse_response("not json at all"),
            Err(TripexError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"answer": 42}"#),
            Err(TripexError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response("42"),
            Err(TripexError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_text_round_trip() {
        let client = Arc::new(CannedClient {
            reply: r#"[{"Subject": "Alice", "Relation": "spoke with", "Object": "Bob"}]"#
                .to_string(),
        });
        let extractor = LlmExtractor::new(client);
        let triplets = extractor.extract_text("Alice spoke with Bob.").await.unwrap();
        assert_eq!(triplets, vec![Triplet::new("Alice", "spoke with", "Bob")]);
        assert_eq!(extractor.model(), "canned");
    }
}
