use serde::Serialize;

use crate::error::SignalDeckError;
use crate::filter::{self, FilterState};
use crate::loader::DatasetCache;
use crate::models::{FundRecord, GpRollup, HeadlineMetrics, MonthlyFlow, State, View};
use crate::query;
use crate::stats;

const SCATTER_POINT_LIMIT: usize = 50;
const TOP_FUNDS_LIMIT: usize = 20;
const TOP_DECILE: f64 = 0.10;
const FAST_MOVER_QUANTILE: f64 = 0.9;

/// Everything one interaction needs: region, view mode, filters, query.
/// The UI layer owns no computation; it builds one of these and renders
/// the returned model.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub state: State,
    pub view: View,
    pub filter: FilterState,
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderModel {
    pub state: State,
    pub headline: HeadlineMetrics,
    #[serde(flatten)]
    pub view: ViewModel,
}

/// Chart-ready series reference: the core names columns, the presentation
/// layer draws them.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterSeries {
    pub x: &'static str,
    pub y: &'static str,
    pub size: &'static str,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ScatterSeries {
    fn deployment(limit: Option<usize>) -> Self {
        Self {
            x: "Capital Velocity",
            y: "Recent Capital Deployed",
            size: "Investor Count",
            color: "Intent Bucket",
            limit,
        }
    }
}

/// Projection of a ranked record onto the founder display columns.
#[derive(Debug, Clone, Serialize)]
pub struct FounderRow {
    #[serde(rename = "Fund Name")]
    pub fund_name: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Investor Intent Score")]
    pub intent_score: f64,
    #[serde(rename = "Recent Capital Deployed")]
    pub recent_capital: f64,
    #[serde(rename = "Why This Investor")]
    pub why_investor: String,
}

impl FounderRow {
    fn from_record(record: &FundRecord) -> Self {
        Self {
            fund_name: record.fund_name.clone(),
            sector: record.sector.clone(),
            intent_score: record.intent_score,
            recent_capital: record.recent_capital,
            why_investor: record.why_investor.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VelocityPoint {
    pub fund_name: String,
    pub filing_date: chrono::NaiveDate,
    pub capital_velocity: f64,
    pub total_fund_size: f64,
    pub intent_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewModel {
    Founder {
        suggested: Option<usize>,
        rows: Vec<FounderRow>,
        deployment: ScatterSeries,
    },
    Institutional {
        deployment: ScatterSeries,
        curve: Vec<f64>,
        top_decile_share: f64,
        gps: Vec<GpRollup>,
    },
    Analytics {
        median_days_since_filing: f64,
        median_momentum: f64,
        monthly: Vec<MonthlyFlow>,
        velocity_timeline: Vec<VelocityPoint>,
        top_decile_share: f64,
        fast_movers: usize,
        anomalies: usize,
    },
}

/// The full pipeline for one interaction: load, filter, branch per view,
/// aggregate. Pure apart from the dataset cache.
pub fn render(
    cache: &mut DatasetCache,
    request: &RenderRequest,
) -> Result<RenderModel, SignalDeckError> {
    let dataset = cache.get(request.state)?;
    let filtered = filter::apply(dataset, &request.filter)?;
    let headline = stats::headline(&filtered);

    let view = match request.view {
        View::Founder => founder_view(&filtered, request.query.as_deref().unwrap_or("")),
        View::Institutional => institutional_view(&filtered),
        View::Analytics => analytics_view(&filtered),
    };

    Ok(RenderModel {
        state: request.state,
        headline,
        view,
    })
}

fn founder_view(records: &[FundRecord], query_text: &str) -> ViewModel {
    let interpretation = query::interpret(records, query_text);
    let rows = interpretation
        .records
        .iter()
        .map(FounderRow::from_record)
        .collect();
    ViewModel::Founder {
        suggested: interpretation.suggested,
        rows,
        deployment: ScatterSeries::deployment(Some(SCATTER_POINT_LIMIT)),
    }
}

fn institutional_view(records: &[FundRecord]) -> ViewModel {
    ViewModel::Institutional {
        deployment: ScatterSeries::deployment(None),
        curve: stats::concentration_curve(records),
        top_decile_share: stats::concentration_ratio(records, TOP_DECILE),
        gps: stats::gp_rollup(records),
    }
}

fn analytics_view(records: &[FundRecord]) -> ViewModel {
    let days: Vec<f64> = records.iter().map(|r| r.days_since_filing as f64).collect();
    let momentum: Vec<f64> = records.iter().map(|r| r.fund_momentum).collect();

    let mut by_intent = records.to_vec();
    by_intent.sort_by(|a, b| b.intent_score.total_cmp(&a.intent_score));
    by_intent.truncate(TOP_FUNDS_LIMIT);
    let velocity_timeline = by_intent
        .iter()
        .map(|r| VelocityPoint {
            fund_name: r.fund_name.clone(),
            filing_date: r.filing_date,
            capital_velocity: r.capital_velocity,
            total_fund_size: r.total_fund_size,
            intent_score: r.intent_score,
        })
        .collect();

    ViewModel::Analytics {
        median_days_since_filing: stats::median(&days),
        median_momentum: stats::median(&momentum),
        monthly: stats::monthly_rolling(records),
        velocity_timeline,
        top_decile_share: stats::concentration_ratio(records, TOP_DECILE),
        fast_movers: stats::fast_mover_count(records, FAST_MOVER_QUANTILE),
        anomalies: stats::anomaly_count(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntentBucket;
    use chrono::NaiveDate;

    fn fund(name: &str, score: f64, capital: f64, date: &str) -> FundRecord {
        FundRecord {
            fund_name: name.to_string(),
            state: "CA".to_string(),
            sector: "SaaS".to_string(),
            intent_bucket: IntentBucket::Hot,
            actively_deploying: true,
            total_fund_size: 25_000_000.0,
            lifetime_capital: 6_000_000.0,
            recent_capital: capital,
            capital_velocity: 2.0,
            capital_acceleration: 0.0,
            fund_momentum: 0.6,
            intent_score: score,
            gp_name: "Kiara Patel".to_string(),
            investor_count: 9,
            why_investor: "Recent momentum".to_string(),
            days_since_filing: 40,
            filing_date: date.parse().unwrap(),
        }
    }

    #[test]
    fn founder_view_projects_ranked_rows() {
        let records = vec![
            fund("A", 0.9, 100.0, "2025-02-01"),
            fund("B", 0.7, 200.0, "2025-03-01"),
        ];
        match founder_view(&records, "") {
            ViewModel::Founder {
                suggested,
                rows,
                deployment,
            } => {
                assert_eq!(suggested, None);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].fund_name, "A");
                assert_eq!(rows[0].why_investor, "Recent momentum");
                assert_eq!(deployment.limit, Some(50));
            }
            other => panic!("expected founder view, got {other:?}"),
        }
    }

    #[test]
    fn institutional_view_carries_curve_and_rollup() {
        let records = vec![
            fund("A", 0.9, 300.0, "2025-02-01"),
            fund("B", 0.7, 100.0, "2025-03-01"),
        ];
        match institutional_view(&records) {
            ViewModel::Institutional {
                curve,
                top_decile_share,
                gps,
                ..
            } => {
                assert_eq!(curve.len(), 2);
                assert!((curve[1] - 1.0).abs() < 1e-9);
                // floor(0.1 * 2) = 0 funds -> share defined as 0.
                assert_eq!(top_decile_share, 0.0);
                assert_eq!(gps.len(), 1);
                assert_eq!(gps[0].recent_capital, 400.0);
            }
            other => panic!("expected institutional view, got {other:?}"),
        }
    }

    #[test]
    fn analytics_view_limits_velocity_timeline() {
        let records: Vec<FundRecord> = (0..25)
            .map(|i| fund(&format!("F{i}"), i as f64 / 25.0, 100.0, "2025-01-15"))
            .collect();
        match analytics_view(&records) {
            ViewModel::Analytics {
                velocity_timeline,
                monthly,
                ..
            } => {
                assert_eq!(velocity_timeline.len(), 20);
                // All filings in one month: a single bucket, no rolling mean.
                assert_eq!(monthly.len(), 1);
                assert_eq!(monthly[0].rolling_mean, None);
                assert_eq!(
                    monthly[0].month,
                    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                );
            }
            other => panic!("expected analytics view, got {other:?}"),
        }
    }
}
