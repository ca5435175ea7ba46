use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::models::{FundRecord, GpRollup, HeadlineMetrics, MonthlyFlow};

/// Strict median: even-count inputs average the two middle values. Empty
/// input yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linear-interpolation quantile over the sorted values.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}

/// Percentile rank of each value over the whole slice, in (0, 1]. Ties get
/// the mean of the 1-based ranks they would occupy.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let mean_rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = mean_rank / n as f64;
        }
        i = j + 1;
    }
    ranks
}

fn by_recent_capital_desc(records: &[FundRecord]) -> Vec<f64> {
    let mut capitals: Vec<f64> = records.iter().map(|r| r.recent_capital).collect();
    capitals.sort_by(|a, b| b.total_cmp(a));
    capitals
}

/// Share of total recent capital held by the top `floor(p * N)` funds.
/// Defined as 0 when the slice or the total is empty, never NaN.
pub fn concentration_ratio(records: &[FundRecord], p: f64) -> f64 {
    let capitals = by_recent_capital_desc(records);
    let total: f64 = capitals.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let take = (p.clamp(0.0, 1.0) * capitals.len() as f64).floor() as usize;
    let top: f64 = capitals.iter().take(take).sum();
    top / total
}

/// Running cumulative capital share over the descending-sorted funds.
/// Non-decreasing; last element is 1.0 when the total is positive.
pub fn concentration_curve(records: &[FundRecord]) -> Vec<f64> {
    let capitals = by_recent_capital_desc(records);
    let total: f64 = capitals.iter().sum();
    if total <= 0.0 {
        return vec![0.0; capitals.len()];
    }
    let mut running = 0.0;
    capitals
        .iter()
        .map(|c| {
            running += c;
            running / total
        })
        .collect()
}

/// Calendar-month capital sums with a trailing 3-bucket simple moving
/// average. Buckets with fewer than 3 buckets available (including
/// themselves) carry no average; months without filings create no bucket.
pub fn monthly_rolling(records: &[FundRecord]) -> Vec<MonthlyFlow> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        let month = record.filing_date.with_day(1).unwrap_or(record.filing_date);
        *buckets.entry(month).or_insert(0.0) += record.recent_capital;
    }

    let totals: Vec<(NaiveDate, f64)> = buckets.into_iter().collect();
    totals
        .iter()
        .enumerate()
        .map(|(i, &(month, recent_capital))| {
            let rolling_mean = if i >= 2 {
                let window: f64 = totals[i - 2..=i].iter().map(|&(_, c)| c).sum();
                Some(window / 3.0)
            } else {
                None
            };
            MonthlyFlow {
                month,
                recent_capital,
                rolling_mean,
            }
        })
        .collect()
}

/// Count of funds at or above the q-th quantile of capital velocity.
pub fn fast_mover_count(records: &[FundRecord], q: f64) -> usize {
    let velocities: Vec<f64> = records.iter().map(|r| r.capital_velocity).collect();
    if velocities.is_empty() {
        return 0;
    }
    let cutoff = quantile(&velocities, q);
    velocities.iter().filter(|&&v| v >= cutoff).count()
}

/// High intent, low recent deployment: score above 0.75 with recent capital
/// strictly below the median.
pub fn anomaly_count(records: &[FundRecord]) -> usize {
    let capitals: Vec<f64> = records.iter().map(|r| r.recent_capital).collect();
    let median_capital = median(&capitals);
    records
        .iter()
        .filter(|r| r.intent_score > 0.75 && r.recent_capital < median_capital)
        .count()
}

/// Group by normalized GP name: capital sum, mean intent, mean velocity.
/// Distinct raw spellings that normalize to one name merge into one group.
pub fn gp_rollup(records: &[FundRecord]) -> Vec<GpRollup> {
    let mut groups: HashMap<&str, (f64, f64, f64, usize)> = HashMap::new();
    for record in records {
        let entry = groups
            .entry(record.gp_name.as_str())
            .or_insert((0.0, 0.0, 0.0, 0));
        entry.0 += record.recent_capital;
        entry.1 += record.intent_score;
        entry.2 += record.capital_velocity;
        entry.3 += 1;
    }

    let mut rollups: Vec<GpRollup> = groups
        .into_iter()
        .map(|(gp_name, (capital, intent, velocity, count))| GpRollup {
            gp_name: gp_name.to_string(),
            recent_capital: capital,
            mean_intent: intent / count as f64,
            mean_velocity: velocity / count as f64,
        })
        .collect();

    rollups.sort_by(|a, b| b.recent_capital.total_cmp(&a.recent_capital));
    rollups
}

pub fn headline(records: &[FundRecord]) -> HeadlineMetrics {
    let scores: Vec<f64> = records.iter().map(|r| r.intent_score).collect();
    let unique: BTreeSet<&str> = records.iter().map(|r| r.fund_name.as_str()).collect();
    HeadlineMetrics {
        active_funds: records.iter().filter(|r| r.actively_deploying).count(),
        recent_capital_total: records.iter().map(|r| r.recent_capital).sum(),
        median_intent_score: median(&scores),
        unique_funds: unique.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntentBucket;

    fn fund(name: &str, capital: f64, velocity: f64, score: f64, date: &str) -> FundRecord {
        FundRecord {
            fund_name: name.to_string(),
            state: "NY".to_string(),
            sector: "Fintech".to_string(),
            intent_bucket: IntentBucket::Warm,
            actively_deploying: true,
            total_fund_size: 20_000_000.0,
            lifetime_capital: 5_000_000.0,
            recent_capital: capital,
            capital_velocity: velocity,
            capital_acceleration: 0.1,
            fund_momentum: 0.4,
            intent_score: score,
            gp_name: "Jane Doe".to_string(),
            investor_count: 8,
            why_investor: String::new(),
            days_since_filing: 20,
            filing_date: date.parse().unwrap(),
        }
    }

    #[test]
    fn median_handles_even_and_odd_counts() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[10.0, 20.0, 30.0, 1000.0]), 25.0);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
        assert_eq!(quantile(&values, 0.5), 2.5);
        assert!((quantile(&values, 0.9) - 3.7).abs() < 1e-9);
    }

    #[test]
    fn percentile_ranks_average_ties() {
        // Values 5,5 occupy ranks 2 and 3 -> both get 2.5/4.
        let ranks = percentile_ranks(&[1.0, 5.0, 5.0, 9.0]);
        assert!((ranks[0] - 0.25).abs() < 1e-9);
        assert!((ranks[1] - 0.625).abs() < 1e-9);
        assert!((ranks[2] - 0.625).abs() < 1e-9);
        assert!((ranks[3] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn concentration_ratio_boundaries() {
        let records = vec![
            fund("A", 100.0, 1.0, 0.5, "2025-01-10"),
            fund("B", 200.0, 1.0, 0.5, "2025-01-11"),
            fund("C", 700.0, 1.0, 0.5, "2025-01-12"),
        ];
        assert_eq!(concentration_ratio(&records, 0.0), 0.0);
        assert!((concentration_ratio(&records, 1.0) - 1.0).abs() < 1e-9);
        // floor(0.5 * 3) = 1 fund, the largest one.
        assert!((concentration_ratio(&records, 0.5) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn concentration_ratio_zero_total_is_zero() {
        let records = vec![
            fund("A", 0.0, 1.0, 0.5, "2025-01-10"),
            fund("B", 0.0, 1.0, 0.5, "2025-01-11"),
        ];
        assert_eq!(concentration_ratio(&records, 1.0), 0.0);
    }

    #[test]
    fn concentration_curve_is_nondecreasing_and_ends_at_one() {
        let records = vec![
            fund("A", 50.0, 1.0, 0.5, "2025-01-10"),
            fund("B", 30.0, 1.0, 0.5, "2025-01-11"),
            fund("C", 20.0, 1.0, 0.5, "2025-01-12"),
        ];
        let curve = concentration_curve(&records);
        assert_eq!(curve.len(), 3);
        assert!(curve.windows(2).all(|w| w[1] >= w[0]));
        assert!((curve[2] - 1.0).abs() < 1e-9);
        assert!((curve[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn monthly_rolling_needs_three_buckets() {
        let records = vec![
            fund("A", 100.0, 1.0, 0.5, "2025-01-05"),
            fund("B", 100.0, 1.0, 0.5, "2025-01-20"),
            fund("C", 400.0, 1.0, 0.5, "2025-02-15"),
            fund("D", 600.0, 1.0, 0.5, "2025-03-01"),
            fund("E", 300.0, 1.0, 0.5, "2025-04-10"),
        ];
        let flows = monthly_rolling(&records);
        assert_eq!(flows.len(), 4);
        assert_eq!(flows[0].recent_capital, 200.0);
        assert_eq!(flows[0].rolling_mean, None);
        assert_eq!(flows[1].rolling_mean, None);
        assert_eq!(flows[2].rolling_mean, Some(400.0));
        assert_eq!(flows[3].rolling_mean, Some((400.0 + 600.0 + 300.0) / 3.0));
    }

    #[test]
    fn monthly_rolling_skips_empty_months() {
        // January and April only: no buckets for February/March.
        let records = vec![
            fund("A", 100.0, 1.0, 0.5, "2025-01-05"),
            fund("B", 200.0, 1.0, 0.5, "2025-04-10"),
        ];
        let flows = monthly_rolling(&records);
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].month, "2025-01-01".parse().unwrap());
        assert_eq!(flows[1].month, "2025-04-01".parse().unwrap());
    }

    #[test]
    fn fast_mover_count_uses_quantile_cutoff() {
        let records: Vec<FundRecord> = (1..=10)
            .map(|i| fund(&format!("F{i}"), 100.0, i as f64, 0.5, "2025-01-10"))
            .collect();
        // 0.9 quantile of 1..=10 is 9.1; only velocity 10 clears it.
        assert_eq!(fast_mover_count(&records, 0.9), 1);
    }

    #[test]
    fn anomaly_count_matches_worked_example() {
        let capitals = [10.0, 20.0, 30.0, 1000.0];
        let scores = [0.8, 0.5, 0.9, 0.76];
        let records: Vec<FundRecord> = capitals
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (&c, s))| fund(&format!("F{i}"), c, 1.0, s, "2025-01-10"))
            .collect();
        // Median capital 25; only the 0.8-score fund at capital 10 qualifies.
        assert_eq!(anomaly_count(&records), 1);
    }

    #[test]
    fn gp_rollup_merges_normalized_names() {
        let mut a = fund("A", 100.0, 2.0, 0.6, "2025-01-10");
        let mut b = fund("B", 300.0, 4.0, 0.8, "2025-01-11");
        let mut c = fund("C", 50.0, 1.0, 0.9, "2025-01-12");
        a.gp_name = "John Smith".to_string();
        b.gp_name = "John Smith".to_string();
        c.gp_name = "Kiara Patel".to_string();

        let rollups = gp_rollup(&[a, b, c]);
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].gp_name, "John Smith");
        assert_eq!(rollups[0].recent_capital, 400.0);
        assert!((rollups[0].mean_intent - 0.7).abs() < 1e-9);
        assert!((rollups[0].mean_velocity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn headline_counts_active_and_unique_funds() {
        let mut a = fund("A", 100.0, 1.0, 0.6, "2025-01-10");
        a.actively_deploying = false;
        let b = fund("B", 200.0, 1.0, 0.8, "2025-01-11");
        let b_again = fund("B", 300.0, 1.0, 0.4, "2025-01-12");

        let metrics = headline(&[a, b, b_again]);
        assert_eq!(metrics.active_funds, 2);
        assert_eq!(metrics.recent_capital_total, 600.0);
        assert_eq!(metrics.unique_funds, 2);
        assert_eq!(metrics.median_intent_score, 0.6);
    }
}
