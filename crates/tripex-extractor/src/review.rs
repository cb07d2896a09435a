//! Manual review of extracted triplets
//!
//! Draws a uniform random sample from an extractor's output and tallies
//! human verdicts on it. Randomness lives here, never in extraction.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use tripex_core::Triplet;

/// Sample up to `n` triplets uniformly at random, without replacement
pub fn sample<R: Rng + ?Sized>(triplets: &[Triplet], n: usize, rng: &mut R) -> Vec<Triplet> {
    triplets.choose_multiple(rng, n).cloned().collect()
}

/// Human judgement on one triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    Skipped,
}

impl Verdict {
    /// Parse a reviewer answer: `y`/`yes` or `n`/`no`, anything else skips
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Valid,
            "n" | "no" => Self::Invalid,
            _ => Self::Skipped,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Verdict counts for one extractor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTally {
    pub valid: usize,
    pub invalid: usize,
    pub skipped: usize,
}

impl ReviewTally {
    /// Record a verdict
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Valid => self.valid += 1,
            Verdict::Invalid => self.invalid += 1,
            Verdict::Skipped => self.skipped += 1,
        }
    }

    /// Fold another tally into this one
    pub fn merge(&mut self, other: &ReviewTally) {
        self.valid += other.valid;
        self.invalid += other.invalid;
        self.skipped += other.skipped;
    }

    /// Number of judged (non-skipped) triplets
    pub fn judged(&self) -> usize {
        self.valid + self.invalid
    }

    /// Fraction of judged triplets marked valid, if any were judged
    pub fn precision(&self) -> Option<f32> {
        match self.judged() {
            0 => None,
            judged => Some(self.valid as f32 / judged as f32),
        }
    }
}
