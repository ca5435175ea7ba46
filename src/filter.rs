use crate::error::SignalDeckError;
use crate::models::{FundRecord, IntentBucket};

pub const DEFAULT_MIN_SCORE: f64 = 0.45;

/// Active predicate, rebuilt from user input on every interaction. Empty
/// sector/bucket sets mean "no constraint"; the score threshold is always
/// active.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub sectors: Vec<String>,
    pub buckets: Vec<IntentBucket>,
    pub min_score: f64,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            sectors: Vec::new(),
            buckets: Vec::new(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl FilterState {
    fn matches(&self, record: &FundRecord) -> bool {
        if !self.sectors.is_empty() && !self.sectors.iter().any(|s| s == &record.sector) {
            return false;
        }
        if !self.buckets.is_empty() && !self.buckets.contains(&record.intent_bucket) {
            return false;
        }
        record.intent_score >= self.min_score
    }
}

/// Stable conjunction filter. An empty survivor set is terminal for the
/// render cycle.
pub fn apply(
    records: &[FundRecord],
    filter: &FilterState,
) -> Result<Vec<FundRecord>, SignalDeckError> {
    let kept: Vec<FundRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    if kept.is_empty() {
        return Err(SignalDeckError::EmptyResult);
    }
    Ok(kept)
}
