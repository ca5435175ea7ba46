use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
pub enum State {
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "NY")]
    Ny,
    #[serde(rename = "MA")]
    Ma,
    #[serde(rename = "TX")]
    Tx,
}

impl State {
    pub fn code(self) -> &'static str {
        match self {
            State::Ca => "CA",
            State::Ny => "NY",
            State::Ma => "MA",
            State::Tx => "TX",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Founder,
    Institutional,
    Analytics,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Founder => "founder",
            View::Institutional => "institutional",
            View::Analytics => "analytics",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
pub enum IntentBucket {
    #[serde(rename = "🔥 Hot")]
    Hot,
    #[serde(rename = "🟡 Warm")]
    Warm,
    #[serde(rename = "❄️ Cold")]
    Cold,
}

impl IntentBucket {
    pub const ALL: [IntentBucket; 3] = [IntentBucket::Hot, IntentBucket::Warm, IntentBucket::Cold];

    /// Display label as it appears in the source CSV.
    pub fn label(self) -> &'static str {
        match self {
            IntentBucket::Hot => "🔥 Hot",
            IntentBucket::Warm => "🟡 Warm",
            IntentBucket::Cold => "❄️ Cold",
        }
    }

    /// Lowercase keyword used by the query interpreter.
    pub fn keyword(self) -> &'static str {
        match self {
            IntentBucket::Hot => "hot",
            IntentBucket::Warm => "warm",
            IntentBucket::Cold => "cold",
        }
    }

    /// Accepts the glyph form from the CSV as well as a bare bucket name.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        for bucket in Self::ALL {
            if trimmed == bucket.label() {
                return Some(bucket);
            }
        }
        match trimmed.to_lowercase().as_str() {
            "hot" => Some(IntentBucket::Hot),
            "warm" => Some(IntentBucket::Warm),
            "cold" => Some(IntentBucket::Cold),
            _ => None,
        }
    }
}

impl fmt::Display for IntentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fund-filing observation, renamed from the raw CSV schema to the
/// canonical display columns. All scores and capital figures are computed
/// upstream and treated as opaque inputs here.
#[derive(Debug, Clone, Serialize)]
pub struct FundRecord {
    #[serde(rename = "Fund Name")]
    pub fund_name: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Intent Bucket")]
    pub intent_bucket: IntentBucket,
    #[serde(rename = "Actively Deploying")]
    pub actively_deploying: bool,
    #[serde(rename = "Total Fund Size")]
    pub total_fund_size: f64,
    #[serde(rename = "Lifetime Capital Deployed")]
    pub lifetime_capital: f64,
    #[serde(rename = "Recent Capital Deployed")]
    pub recent_capital: f64,
    #[serde(rename = "Capital Velocity")]
    pub capital_velocity: f64,
    #[serde(rename = "Capital Acceleration")]
    pub capital_acceleration: f64,
    #[serde(rename = "Fund Momentum")]
    pub fund_momentum: f64,
    #[serde(rename = "Investor Intent Score")]
    pub intent_score: f64,
    #[serde(rename = "GP Name")]
    pub gp_name: String,
    #[serde(rename = "Investor Count")]
    pub investor_count: i64,
    #[serde(rename = "Why This Investor")]
    pub why_investor: String,
    #[serde(rename = "Days Since Filing")]
    pub days_since_filing: i64,
    #[serde(rename = "Filing Date")]
    pub filing_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpRollup {
    pub gp_name: String,
    pub recent_capital: f64,
    pub mean_intent: f64,
    pub mean_velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: NaiveDate,
    pub recent_capital: f64,
    pub rolling_mean: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetrics {
    pub active_funds: usize,
    pub recent_capital_total: f64,
    pub median_intent_score: f64,
    pub unique_funds: usize,
}
