//! Evaluation report: per-document outcome, counts and samples

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripex_core::Triplet;
use tripex_extractor::ReviewTally;

/// Pipeline stage a document failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Annotate,
    Extract,
    Llm,
}

/// Outcome for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentStatus {
    Ok,
    /// The title did not resolve to a single article
    Skipped { reason: String },
    Failed { stage: Stage, reason: String },
}

impl DocumentStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Output of one extractor on one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorReport {
    pub extractor: String,
    pub count: usize,
    pub samples: Vec<Triplet>,
    /// Full output, kept only for the LLM strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triplets: Option<Vec<Triplet>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub title: String,
    pub status: DocumentStatus,
    pub tokens: usize,
    pub extractors: Vec<ExtractorReport>,
}

impl DocumentReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: DocumentStatus::Ok,
            tokens: 0,
            extractors: Vec::new(),
        }
    }

    pub fn skipped(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: DocumentStatus::Skipped {
                reason: reason.into(),
            },
            ..Self::new(title)
        }
    }

    pub fn failed(title: impl Into<String>, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            status: DocumentStatus::Failed {
                stage,
                reason: reason.into(),
            },
            ..Self::new(title)
        }
    }
}

/// Results of an evaluation batch, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub sample_size: usize,
    pub documents: Vec<DocumentReport>,
    /// Manual review tallies keyed by extractor name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub review: BTreeMap<String, ReviewTally>,
}

impl EvaluationReport {
    pub fn new(sample_size: usize, documents: Vec<DocumentReport>) -> Self {
        Self {
            generated_at: Utc::now(),
            sample_size,
            documents,
            review: BTreeMap::new(),
        }
    }

    /// Total triplet count per extractor over successful documents
    pub fn totals(&self) -> BTreeMap<&str, usize> {
        let mut totals = BTreeMap::new();
        for doc in &self.documents {
            for ext in &doc.extractors {
                *totals.entry(ext.extractor.as_str()).or_insert(0) += ext.count;
            }
        }
        totals
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "wrote evaluation report");
        Ok(())
    }

    /// Human-readable summary
    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        for doc in &self.documents {
            writeln!(out, "== {} ==", doc.title)?;
            match &doc.status {
                DocumentStatus::Skipped { reason } => {
                    writeln!(out, "  skipped: {reason}")?;
                    continue;
                }
                DocumentStatus::Failed { stage, reason } => {
                    writeln!(out, "  failed at {stage:?}: {reason}")?;
                }
                DocumentStatus::Ok => {}
            }
            for ext in &doc.extractors {
                writeln!(out, "  {}: {} triplets", ext.extractor, ext.count)?;
                for triplet in &ext.samples {
                    writeln!(out, "    {triplet}")?;
                }
            }
        }

        if !self.review.is_empty() {
            writeln!(out, "== review ==")?;
            for (extractor, tally) in &self.review {
                match tally.precision() {
                    Some(p) => writeln!(
                        out,
                        "  {extractor}: {}/{} valid (precision {:.2})",
                        tally.valid,
                        tally.judged(),
                        p
                    )?,
                    None => writeln!(out, "  {extractor}: nothing judged")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> EvaluationReport {
        let mut ok = DocumentReport::new("Alice");
        ok.tokens = 4;
        ok.extractors.push(ExtractorReport {
            extractor: "pos".to_string(),
            count: 2,
            samples: vec![Triplet::new("Alice", "met", "Bob")],
            triplets: None,
        });
        EvaluationReport::new(
            5,
            vec![
                ok,
                DocumentReport::skipped("Mercury", "Title is ambiguous"),
                DocumentReport::failed("Bob", Stage::Annotate, "connection refused"),
            ],
        )
    }

    #[test]
    fn test_status_serialization() {
        let report = sample_report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["documents"][0]["status"]["kind"], "ok");
        assert_eq!(json["documents"][1]["status"]["kind"], "skipped");
        assert_eq!(json["documents"][2]["status"]["stage"], "annotate");
        assert!(json["documents"][0]["extractors"][0].get("triplets").is_none());
        assert!(json.get("review").is_none());
    }

    #[test]
    fn test_render_lists_samples_and_failures() {
        let mut out = Vec::new();
        sample_report().render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("pos: 2 triplets"));
        assert!(text.contains("(Alice, met, Bob)"));
        assert!(text.contains("skipped: Title is ambiguous"));
        assert!(text.contains("failed at Annotate"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample_report().write_json(&path).unwrap();

        let loaded: EvaluationReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.documents.len(), 3);
        assert_eq!(loaded.totals()["pos"], 2);
    }
}
