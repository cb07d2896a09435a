//! Interactive Y/N review of sampled triplets

use std::io::{BufRead, Write};

use tripex_extractor::{ReviewTally, Verdict};

use crate::report::EvaluationReport;

/// Ask the reviewer about every sampled triplet and store the tallies
///
/// Stops early (keeping what was judged so far) when input runs out.
pub fn review_report(
    report: &mut EvaluationReport,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<()> {
    let mut line = String::new();

    'documents: for doc in &report.documents {
        for ext in &doc.extractors {
            if ext.samples.is_empty() {
                continue;
            }
            writeln!(output, "\n[{}] {}", doc.title, ext.extractor)?;
            let tally = report.review.entry(ext.extractor.clone()).or_default();

            for triplet in &ext.samples {
                write!(output, "  {triplet}\n  Valid (Y/N)? ")?;
                output.flush()?;

                line.clear();
                if input.read_line(&mut line)? == 0 {
                    break 'documents;
                }
                tally.record(Verdict::from_answer(&line));
            }
        }
    }

    let total = report
        .review
        .values()
        .fold(ReviewTally::default(), |mut acc, t| {
            acc.merge(t);
            acc
        });
    tracing::info!(
        valid = total.valid,
        invalid = total.invalid,
        skipped = total.skipped,
        "review finished"
    );
    Ok(())
}
