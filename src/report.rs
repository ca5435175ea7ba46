use std::fmt::Write;

use crate::models::MonthlyFlow;
use crate::view::{RenderModel, RenderRequest, ViewModel};

const LIST_LIMIT: usize = 10;

fn view_title(view: &ViewModel) -> &'static str {
    match view {
        ViewModel::Founder { .. } => "Founder View",
        ViewModel::Institutional { .. } => "Institutional View",
        ViewModel::Analytics { .. } => "Advanced Market Analytics",
    }
}

/// Currency totals are shown with 0 decimals and thousands separators.
fn fmt_currency(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let mut digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped = format!(",{}{}", &digits[split..], grouped);
        digits.truncate(split);
    }
    format!("{}${}{}", if negative { "-" } else { "" }, digits, grouped)
}

fn fmt_pct(share: f64) -> String {
    format!("{:.0}%", share * 100.0)
}

fn headline_lines(output: &mut String, model: &RenderModel) {
    let h = &model.headline;
    let _ = writeln!(output, "- Active Funds: {}", h.active_funds);
    let _ = writeln!(output, "- Recent Capital: {}", fmt_currency(h.recent_capital_total));
    let _ = writeln!(output, "- Median Intent Score: {:.2}", h.median_intent_score);
    let _ = writeln!(output, "- Unique Funds: {}", h.unique_funds);
}

fn view_lines(output: &mut String, view: &ViewModel) {
    match view {
        ViewModel::Founder {
            suggested, rows, ..
        } => {
            if let Some(count) = suggested {
                let _ = writeln!(output, "SignalDeck suggests prioritizing {count} funds.");
            }
            if rows.is_empty() {
                let _ = writeln!(output, "No funds matched this query.");
            }
            for row in rows.iter().take(LIST_LIMIT) {
                let _ = writeln!(
                    output,
                    "- {} ({}) score {:.2}, recent capital {}: {}",
                    row.fund_name,
                    row.sector,
                    row.intent_score,
                    fmt_currency(row.recent_capital),
                    row.why_investor
                );
            }
            if rows.len() > LIST_LIMIT {
                let _ = writeln!(output, "(showing {} of {})", LIST_LIMIT, rows.len());
            }
        }
        ViewModel::Institutional {
            top_decile_share,
            gps,
            ..
        } => {
            let _ = writeln!(
                output,
                "Top 10% of funds account for {} of recent capital deployment.",
                fmt_pct(*top_decile_share)
            );
            let _ = writeln!(output, "Top GPs by recent capital:");
            for gp in gps.iter().take(LIST_LIMIT) {
                let _ = writeln!(
                    output,
                    "- {}: {} (mean intent {:.2}, mean velocity {:.2})",
                    gp.gp_name,
                    fmt_currency(gp.recent_capital),
                    gp.mean_intent,
                    gp.mean_velocity
                );
            }
        }
        ViewModel::Analytics {
            median_days_since_filing,
            median_momentum,
            monthly,
            top_decile_share,
            fast_movers,
            anomalies,
            ..
        } => {
            let _ = writeln!(
                output,
                "Median days since filing: {median_days_since_filing:.2}"
            );
            let _ = writeln!(output, "Median fund momentum: {median_momentum:.2}");
            let _ = writeln!(
                output,
                "Top 10% of funds deploy {} of recent capital.",
                fmt_pct(*top_decile_share)
            );
            let _ = writeln!(
                output,
                "{fast_movers} funds at or above the 90th percentile of capital velocity."
            );
            let _ = writeln!(
                output,
                "{anomalies} funds show high intent with low recent deployment."
            );
            let _ = writeln!(output, "Monthly capital flow:");
            for flow in monthly {
                let _ = writeln!(output, "- {}", monthly_line(flow));
            }
        }
    }
}

fn monthly_line(flow: &MonthlyFlow) -> String {
    match flow.rolling_mean {
        Some(mean) => format!(
            "{}: {} (3-month avg {})",
            flow.month.format("%Y-%m"),
            fmt_currency(flow.recent_capital),
            fmt_currency(mean)
        ),
        None => format!(
            "{}: {}",
            flow.month.format("%Y-%m"),
            fmt_currency(flow.recent_capital)
        ),
    }
}

pub fn render_text(model: &RenderModel) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "SignalDeck {} ({})", model.state, view_title(&model.view));
    let _ = writeln!(output);
    headline_lines(&mut output, model);
    let _ = writeln!(output);
    view_lines(&mut output, &model.view);
    output
}

pub fn render_markdown(model: &RenderModel, request: &RenderRequest) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# SignalDeck Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}, minimum intent score {:.2})",
        request.state,
        view_title(&model.view),
        request.filter.min_score
    );
    if let Some(query) = request.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let _ = writeln!(output, "Query: {query}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    headline_lines(&mut output, model);
    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", view_title(&model.view));
    view_lines(&mut output, &model.view);
    output
}
