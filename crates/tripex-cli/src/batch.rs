//! Evaluation batch over a list of titles
//!
//! Each document is fetched and annotated once; every rule extractor then
//! runs on its own blocking task against the same shared document, next to
//! the optional LLM request. A failure only affects its own document.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tripex_core::{Annotator, Document, TextSource, Triplet, TripexError};
use tripex_extractor::{sample, LlmExtractor, TripletExtractor};

use crate::report::{DocumentReport, DocumentStatus, EvaluationReport, ExtractorReport, Stage};

/// Titles evaluated when none are given
pub const DEFAULT_TITLES: [&str; 3] = ["Donald Trump", "Ruth Bader Ginsburg", "J. K. Rowling"];

pub struct BatchRunner {
    source: Arc<dyn TextSource>,
    annotator: Arc<dyn Annotator>,
    extractors: Vec<Arc<dyn TripletExtractor>>,
    llm: Option<LlmExtractor>,
    sample_size: usize,
    concurrency: usize,
    seed: Option<u64>,
}

impl BatchRunner {
    pub fn new(
        source: Arc<dyn TextSource>,
        annotator: Arc<dyn Annotator>,
        extractors: Vec<Arc<dyn TripletExtractor>>,
    ) -> Self {
        Self {
            source,
            annotator,
            extractors,
            llm: None,
            sample_size: 5,
            concurrency: 4,
            seed: None,
        }
    }

    pub fn with_llm(mut self, llm: LlmExtractor) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Fix the sampling seed (document `i` samples with `seed + i`)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the batch; the report lists documents in input order
    pub async fn run(&self, titles: &[String]) -> EvaluationReport {
        tracing::info!(
            documents = titles.len(),
            concurrency = self.concurrency,
            "starting evaluation batch"
        );

        let documents: Vec<DocumentReport> = stream::iter(titles.iter().enumerate())
            .map(|(i, title)| self.process(i, title))
            .buffered(self.concurrency)
            .collect()
            .await;

        let ok = documents.iter().filter(|d| d.status.is_ok()).count();
        tracing::info!(ok, total = documents.len(), "evaluation batch finished");

        EvaluationReport::new(self.sample_size, documents)
    }

    async fn process(&self, position: usize, title: &str) -> DocumentReport {
        let text = match self.source.fetch(title).await {
            Ok(text) => text,
            Err(e @ (TripexError::NotFound(_) | TripexError::AmbiguousTitle { .. })) => {
                tracing::warn!(title, error = %e, "skipping document");
                return DocumentReport::skipped(title, e.to_string());
            }
            Err(e) => {
                tracing::warn!(title, error = %e, "fetch failed");
                return DocumentReport::failed(title, Stage::Fetch, e.to_string());
            }
        };

        let doc = match self.annotator.annotate(&text).await {
            Ok(doc) => Arc::new(doc),
            Err(e) => {
                tracing::warn!(title, error = %e, "annotation failed");
                return DocumentReport::failed(title, Stage::Annotate, e.to_string());
            }
        };

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(position as u64)),
            None => StdRng::from_entropy(),
        };

        let rule_runs = futures::future::join_all(
            self.extractors
                .iter()
                .map(|extractor| run_blocking(Arc::clone(extractor), Arc::clone(&doc))),
        );
        let llm_run = async {
            match &self.llm {
                Some(llm) => Some(llm.extract_text(&text).await),
                None => None,
            }
        };
        let (rule_results, llm_result) = tokio::join!(rule_runs, llm_run);

        let mut report = DocumentReport::new(title);
        report.tokens = doc.len();

        for (extractor, result) in self.extractors.iter().zip(rule_results) {
            match result {
                Ok(triplets) => {
                    tracing::debug!(title, extractor = extractor.name(), count = triplets.len());
                    report
                        .extractors
                        .push(self.summarize(extractor.name(), &triplets, false, &mut rng));
                }
                Err(reason) => {
                    tracing::warn!(title, extractor = extractor.name(), %reason, "extractor failed");
                    report.status = DocumentStatus::Failed {
                        stage: Stage::Extract,
                        reason,
                    };
                }
            }
        }

        match (llm_result, &self.llm) {
            (Some(Ok(triplets)), Some(llm)) => {
                let name = format!("llm:{}", llm.model());
                tracing::debug!(title, extractor = %name, count = triplets.len());
                report
                    .extractors
                    .push(self.summarize(&name, &triplets, true, &mut rng));
            }
            (Some(Err(e)), _) => {
                tracing::warn!(title, error = %e, "llm extraction failed");
                if report.status.is_ok() {
                    report.status = DocumentStatus::Failed {
                        stage: Stage::Llm,
                        reason: e.to_string(),
                    };
                }
            }
            _ => {}
        }

        report
    }

    fn summarize(
        &self,
        name: &str,
        triplets: &[Triplet],
        keep_all: bool,
        rng: &mut StdRng,
    ) -> ExtractorReport {
        ExtractorReport {
            extractor: name.to_string(),
            count: triplets.len(),
            samples: sample(triplets, self.sample_size, rng),
            triplets: keep_all.then(|| triplets.to_vec()),
        }
    }
}

async fn run_blocking(
    extractor: Arc<dyn TripletExtractor>,
    doc: Arc<Document>,
) -> Result<Vec<Triplet>, String> {
    tokio::task::spawn_blocking(move || extractor.extract(&doc))
        .await
        .map_err(|e| format!("extractor task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tripex_core::{LlmClient, Result};
    use tripex_extractor::{DependencyMatcher, SpanScanner};

    const ALICE: &str = "\
1\tAlice\tAlice\tPROPN\tNNP\t_\t2\tnsubj\t_\t_
2\tmet\tmeet\tVERB\tVBD\t_\t0\tROOT\t_\t_
3\tBob\tBob\tPROPN\tNNP\t_\t2\tdobj\t_\t_
";

    /// Text source backed by a map; `Mercury` is ambiguous, `Offline` errors
    struct MapSource(HashMap<String, String>);

    #[async_trait]
    impl TextSource for MapSource {
        async fn fetch(&self, title: &str) -> Result<String> {
            match title {
                "Mercury" => Err(TripexError::AmbiguousTitle {
                    title: title.to_string(),
                    options: vec!["Mercury (planet)".to_string()],
                }),
                "Offline" => Err(TripexError::Transport("connection reset".to_string())),
                _ => self
                    .0
                    .get(title)
                    .cloned()
                    .ok_or_else(|| TripexError::NotFound(title.to_string())),
            }
        }

        fn name(&self) -> &str {
            "map"
        }
    }

    /// Treats the fetched text as CoNLL-U
    struct ConlluAnnotator;

    #[async_trait]
    impl Annotator for ConlluAnnotator {
        async fn annotate(&self, text: &str) -> Result<Document> {
            Document::from_conllu(text)
        }

        fn name(&self) -> &str {
            "conllu"
        }
    }

    struct FixedLlm(std::result::Result<String, String>);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.clone().map_err(TripexError::LlmError)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn runner(texts: &[(&str, &str)]) -> BatchRunner {
        let source = MapSource(
            texts
                .iter()
                .map(|(t, x)| (t.to_string(), x.to_string()))
                .collect(),
        );
        let extractors: Vec<Arc<dyn TripletExtractor>> =
            vec![Arc::new(SpanScanner::new()), Arc::new(DependencyMatcher::new())];
        BatchRunner::new(Arc::new(source), Arc::new(ConlluAnnotator), extractors).with_seed(42)
    }

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_continues_past_failures() {
        let runner = runner(&[("Alice", ALICE), ("Broken", "1\tx\tx\tNOUN\t_\t_\t9\tdep\t_\t_")])
            .with_concurrency(3);
        let report = runner
            .run(&titles(&["Alice", "Mercury", "Missing", "Offline", "Broken", "Alice"]))
            .await;

        let statuses: Vec<&DocumentStatus> = report.documents.iter().map(|d| &d.status).collect();
        assert!(statuses[0].is_ok());
        assert!(matches!(statuses[1], DocumentStatus::Skipped { .. }));
        assert!(matches!(statuses[2], DocumentStatus::Skipped { .. }));
        assert!(matches!(
            statuses[3],
            DocumentStatus::Failed { stage: Stage::Fetch, .. }
        ));
        assert!(matches!(
            statuses[4],
            DocumentStatus::Failed { stage: Stage::Annotate, .. }
        ));
        assert!(statuses[5].is_ok());

        let titles: Vec<&str> = report.documents.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Alice", "Mercury", "Missing", "Offline", "Broken", "Alice"]);
    }

    #[tokio::test]
    async fn test_rule_extractors_report_counts_and_samples() {
        let report = runner(&[("Alice", ALICE)]).run(&titles(&["Alice"])).await;
        let doc = &report.documents[0];

        assert_eq!(doc.tokens, 3);
        let names: Vec<&str> = doc.extractors.iter().map(|e| e.extractor.as_str()).collect();
        assert_eq!(names, ["pos", "dependency"]);
        for ext in &doc.extractors {
            assert_eq!(ext.count, 1);
            assert_eq!(ext.samples, vec![Triplet::new("Alice", "met", "Bob")]);
            assert!(ext.triplets.is_none());
        }
    }

    #[tokio::test]
    async fn test_llm_output_is_kept_in_full() {
        let llm = LlmExtractor::new(Arc::new(FixedLlm(Ok(
            r#"[{"Subject": "Alice", "Relation": "met", "Object": "Bob"}]"#.to_string(),
        ))));
        let report = runner(&[("Alice", ALICE)])
            .with_llm(llm)
            .run(&titles(&["Alice"]))
            .await;

        let llm_report = &report.documents[0].extractors[2];
        assert_eq!(llm_report.extractor, "llm:fixed");
        assert_eq!(llm_report.triplets.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_rule_results() {
        let llm = LlmExtractor::new(Arc::new(FixedLlm(Err("quota".to_string()))));
        let report = runner(&[("Alice", ALICE)])
            .with_llm(llm)
            .run(&titles(&["Alice"]))
            .await;

        let doc = &report.documents[0];
        assert!(matches!(
            doc.status,
            DocumentStatus::Failed { stage: Stage::Llm, .. }
        ));
        assert_eq!(doc.extractors.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = runner(&[]).run(&[]).await;
        assert!(report.documents.is_empty());
        assert!(report.totals().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_sampling_is_reproducible() {
        let many: String = (0..12)
            .map(|i| {
                format!(
                    "1\tA{i}\tA\tPROPN\t_\t_\t2\tnsubj\t_\t_\n\
                     2\tmet\tmeet\tVERB\t_\t_\t0\tROOT\t_\t_\n\
                     3\tB{i}\tB\tPROPN\t_\t_\t2\tdobj\t_\t_\n\n"
                )
            })
            .collect();
        let first = runner(&[("Many", many.as_str())]).with_sample_size(3).run(&titles(&["Many"])).await;
        let second = runner(&[("Many", many.as_str())]).with_sample_size(3).run(&titles(&["Many"])).await;

        let dep = |r: &EvaluationReport| r.documents[0].extractors[1].clone();
        assert_eq!(dep(&first).count, 12);
        assert_eq!(dep(&first).samples.len(), 3);
        assert_eq!(dep(&first).samples, dep(&second).samples);
    }
}
