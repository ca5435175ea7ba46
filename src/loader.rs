use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SignalDeckError;
use crate::models::{FundRecord, IntentBucket, State};

const CSV_NAME: &str = "SEC_FORMD_2025_VC_INVESTOR_INTENT_FINAL.csv";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw schema as produced upstream. Columns not listed here are dropped by
/// the CSV deserializer.
#[derive(Debug, Deserialize)]
struct RawRow {
    issuer_name: String,
    issuer_state: String,
    fund_vertical: String,
    intent_bucket: String,
    actively_deploying: String,
    offering_amount_total: f64,
    total_amount_sold: f64,
    decayed_amount_sold: f64,
    sale_velocity: f64,
    sale_acceleration: f64,
    fund_momentum: f64,
    investor_intent_score: f64,
    related_person_name: String,
    number_of_investors: i64,
    why_investor: String,
    days_since_filing: i64,
    filing_date: String,
}

pub fn state_csv_path(data_dir: &Path, state: State) -> PathBuf {
    data_dir.join(state.code()).join(CSV_NAME)
}

pub fn load_state(data_dir: &Path, state: State) -> Result<Vec<FundRecord>, SignalDeckError> {
    let path = state_csv_path(data_dir, state);
    if !path.is_file() {
        return Err(SignalDeckError::MissingData { state, path });
    }
    let reader = csv::Reader::from_path(&path)?;
    parse_records(reader)
}

/// Rows with an unparseable filing date, intent bucket, or deploying flag
/// are dropped with a warning; they never abort the load and are never
/// coerced to a default.
fn parse_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<FundRecord>, SignalDeckError> {
    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<RawRow>().enumerate() {
        let line = idx + 2; // line 1 is the header
        let raw = result?;
        match canonicalize(raw) {
            Ok(record) => records.push(record),
            Err(reason) => warn!(line, reason = %reason, "dropping malformed row"),
        }
    }
    Ok(records)
}

fn canonicalize(raw: RawRow) -> Result<FundRecord, String> {
    let filing_date = NaiveDate::parse_from_str(raw.filing_date.trim(), DATE_FORMAT)
        .map_err(|_| format!("bad filing_date {:?}", raw.filing_date))?;
    let intent_bucket = IntentBucket::parse_label(&raw.intent_bucket)
        .ok_or_else(|| format!("bad intent_bucket {:?}", raw.intent_bucket))?;
    let actively_deploying = parse_flag(&raw.actively_deploying)
        .ok_or_else(|| format!("bad actively_deploying {:?}", raw.actively_deploying))?;

    Ok(FundRecord {
        fund_name: raw.issuer_name,
        state: raw.issuer_state,
        sector: raw.fund_vertical,
        intent_bucket,
        actively_deploying,
        total_fund_size: raw.offering_amount_total,
        lifetime_capital: raw.total_amount_sold,
        recent_capital: raw.decayed_amount_sold,
        capital_velocity: raw.sale_velocity,
        capital_acceleration: raw.sale_acceleration,
        fund_momentum: raw.fund_momentum,
        intent_score: raw.investor_intent_score,
        gp_name: normalize_gp_name(&raw.related_person_name),
        investor_count: raw.number_of_investors,
        why_investor: raw.why_investor,
        days_since_filing: raw.days_since_filing,
        filing_date,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Canonical GP name: split camelCase boundaries, then underscores to
/// spaces, then title-case each token. The case split must run before
/// title-casing, which operates on whitespace-delimited tokens.
pub fn normalize_gp_name(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        spaced.push(c);
        if c.is_ascii_lowercase() {
            if let Some(next) = chars.peek() {
                if next.is_ascii_uppercase() {
                    spaced.push(' ');
                }
            }
        }
    }
    let spaced = spaced.replace('_', " ");

    let mut out = String::with_capacity(spaced.len());
    for token in spaced.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        let mut rest = token.chars();
        if let Some(first) = rest.next() {
            out.extend(first.to_uppercase());
            for c in rest {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

/// Keyed dataset cache: one parsed dataset per state, loaded on first
/// request and reused for the rest of the session. Correctness never
/// depends on a hit; a fresh load produces the same dataset.
pub struct DatasetCache {
    data_dir: PathBuf,
    loaded: HashMap<State, Vec<FundRecord>>,
}

impl DatasetCache {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            loaded: HashMap::new(),
        }
    }

    pub fn get(&mut self, state: State) -> Result<&[FundRecord], SignalDeckError> {
        match self.loaded.entry(state) {
            Entry::Occupied(entry) => {
                debug!(%state, "dataset cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(slot) => {
                let records = load_state(&self.data_dir, state)?;
                info!(%state, rows = records.len(), "dataset loaded");
                Ok(slot.insert(records))
            }
        }
    }
}
