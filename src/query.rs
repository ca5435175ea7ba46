use tracing::debug;

use crate::models::{FundRecord, IntentBucket};
use crate::stats;

const SECTOR_VOCAB: [&str; 6] = ["fintech", "saas", "ai", "crypto", "health", "climate"];
const LARGENESS_VOCAB: [&str; 4] = ["largest", "biggest", "large", "big"];
const SPEED_VOCAB: [&str; 4] = ["fastest", "fast", "quickest", "quick"];
const URGENCY_VOCAB: [&str; 4] = ["email", "this week", "outreach", "reach out"];

const SUGGESTION_LIMIT: usize = 5;

const SIZE_WEIGHT: f64 = 0.45;
const SPEED_WEIGHT: f64 = 0.35;
const INTENT_WEIGHT: f64 = 0.20;

/// One transform of the interpreted query, applied in the order parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStep {
    NarrowSector(&'static str),
    SortBySize,
    SortBySpeed,
    CompositeRank,
    NarrowBucket(IntentBucket),
    TopK(usize),
}

pub struct Interpretation {
    pub records: Vec<FundRecord>,
    /// Cardinality of the final subset; absent for an empty query.
    pub suggested: Option<usize>,
}

struct QueryText {
    text: String,
    tokens: Vec<String>,
}

impl QueryText {
    fn new(query: &str) -> Self {
        let text = query.to_lowercase();
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { text, tokens }
    }

    // Single words match on token boundaries so "email" never reads as the
    // "ai" sector; multi-word phrases match as substrings.
    fn contains(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            self.text.contains(keyword)
        } else {
            self.tokens.iter().any(|t| t == keyword)
        }
    }

    fn contains_any(&self, vocab: &[&str]) -> bool {
        vocab.iter().any(|kw| self.contains(kw))
    }
}

/// Compile the query into an ordered step list. Priority is fixed: sector
/// narrowing, then ordering, then bucket narrowing, then truncation. When
/// both a largeness and a speed keyword appear, the composite rank replaces
/// both single-axis sorts.
pub fn parse(query: &str) -> Vec<QueryStep> {
    let q = QueryText::new(query);
    let mut steps = Vec::new();

    if let Some(sector) = SECTOR_VOCAB.iter().copied().find(|kw| q.contains(kw)) {
        steps.push(QueryStep::NarrowSector(sector));
    }

    let wants_large = q.contains_any(&LARGENESS_VOCAB);
    let wants_fast = q.contains_any(&SPEED_VOCAB);
    match (wants_large, wants_fast) {
        (true, true) => steps.push(QueryStep::CompositeRank),
        (true, false) => steps.push(QueryStep::SortBySize),
        (false, true) => steps.push(QueryStep::SortBySpeed),
        (false, false) => {}
    }

    for bucket in IntentBucket::ALL {
        if q.contains(bucket.keyword()) {
            steps.push(QueryStep::NarrowBucket(bucket));
        }
    }

    if q.contains_any(&URGENCY_VOCAB) {
        steps.push(QueryStep::TopK(SUGGESTION_LIMIT));
    }

    steps
}

/// Interpret a free-text query over an already-filtered dataset. Never
/// mutates the filter state; an empty subset here is a legal outcome, not
/// an error.
pub fn interpret(records: &[FundRecord], query: &str) -> Interpretation {
    if query.trim().is_empty() {
        return Interpretation {
            records: records.to_vec(),
            suggested: None,
        };
    }

    let steps = parse(query);
    debug!(query, plan = ?steps, "interpreted query");

    let mut temp = records.to_vec();
    for step in &steps {
        temp = apply_step(temp, step);
    }
    let suggested = Some(temp.len());
    Interpretation {
        records: temp,
        suggested,
    }
}

fn apply_step(mut temp: Vec<FundRecord>, step: &QueryStep) -> Vec<FundRecord> {
    match step {
        QueryStep::NarrowSector(keyword) => {
            temp.retain(|r| r.sector.to_lowercase().contains(keyword));
            temp
        }
        QueryStep::SortBySize => {
            temp.sort_by(|a, b| b.recent_capital.total_cmp(&a.recent_capital));
            temp
        }
        QueryStep::SortBySpeed => {
            temp.sort_by(|a, b| b.capital_velocity.total_cmp(&a.capital_velocity));
            temp
        }
        QueryStep::CompositeRank => composite_rank(temp),
        QueryStep::NarrowBucket(bucket) => {
            temp.retain(|r| r.intent_bucket == *bucket);
            temp
        }
        QueryStep::TopK(k) => {
            temp.truncate(*k);
            temp
        }
    }
}

/// Weighted percentile-rank blend over the current subset. Ties in the
/// composite break on fund name, so the ordering does not depend on input
/// order.
fn composite_rank(temp: Vec<FundRecord>) -> Vec<FundRecord> {
    let capital: Vec<f64> = temp.iter().map(|r| r.recent_capital).collect();
    let velocity: Vec<f64> = temp.iter().map(|r| r.capital_velocity).collect();
    let intent: Vec<f64> = temp.iter().map(|r| r.intent_score).collect();

    let capital_ranks = stats::percentile_ranks(&capital);
    let velocity_ranks = stats::percentile_ranks(&velocity);
    let intent_ranks = stats::percentile_ranks(&intent);

    let mut scored: Vec<(f64, FundRecord)> = temp
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let score = SIZE_WEIGHT * capital_ranks[i]
                + SPEED_WEIGHT * velocity_ranks[i]
                + INTENT_WEIGHT * intent_ranks[i];
            (score, record)
        })
        .collect();

    scored.sort_by(|(sa, ra), (sb, rb)| {
        sb.total_cmp(sa).then_with(|| ra.fund_name.cmp(&rb.fund_name))
    });
    scored.into_iter().map(|(_, record)| record).collect()
}
