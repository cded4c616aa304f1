//! Human-readable rendering of a sampling round.

use crate::models::PairLevels;
use crate::sampler::{Provided, SampleReport, SampleStatistics, Trial};
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{Signed, Zero};
use std::str::FromStr;
use tracing::info;

/// `value` to `digits` significant digits, trailing zeros dropped.
fn sig(value: &BigDecimal, digits: u64) -> String {
    value.with_prec(digits).normalized().to_string()
}

fn signed_sig(value: &BigDecimal, digits: u64) -> String {
    let sign = if value.is_positive() { "+" } else { "" };
    format!("{sign}{}", sig(value, digits))
}

/// Decimal places needed to show `value` to 7 significant digits.
fn display_dp(value: &BigDecimal) -> i64 {
    let (_, scale) = value.with_prec(7).normalized().as_bigint_and_exponent();
    scale.max(0)
}

fn fixed(value: &BigDecimal, dp: i64) -> String {
    value.with_scale_round(dp, RoundingMode::HalfUp).to_string()
}

pub fn summary_lines(stats: &SampleStatistics, entry: &PairLevels) -> Vec<String> {
    let success_rate = format!("{:.2}%", 100.0 * stats.success_rate);
    let bias = stats
        .bias_bps
        .as_ref()
        .map(|b| format!("{} bps", signed_sig(b, 4)))
        .unwrap_or_else(|| "n/a".to_string());
    let std_dev = stats
        .deviation_bps
        .as_ref()
        .map(|d| format!("{} bps", sig(d, 4)))
        .unwrap_or_else(|| "n/a".to_string());

    let level_q = |q: Option<&str>| {
        let q = q.and_then(|q| BigDecimal::from_str(q).ok()).unwrap_or_else(BigDecimal::zero);
        sig(&q, 7)
    };
    let min_level = level_q(entry.levels.first().map(|l| l.q.as_str()));
    let max_level = level_q(entry.levels.last().map(|l| l.q.as_str()));
    let base = &entry.base_token.name;

    vec![
        format!("Success rate: {success_rate}  Avg bias: {bias}  Std deviation: {std_dev}"),
        format!("Min level: {min_level} {base}  Max level: {max_level} {base}"),
    ]
}

pub fn trial_lines(trials: &[Trial], entry: &PairLevels) -> Vec<String> {
    let max_dp = |f: fn(&Trial) -> Option<&BigDecimal>| {
        trials.iter().filter_map(f).map(display_dp).max().unwrap_or(0)
    };
    let base_dp = max_dp(|t| t.base_amount.as_ref());
    let quote_dp = max_dp(|t| t.quote_amount.as_ref());

    let width = |f: fn(&Trial) -> Option<&BigDecimal>, dp: i64| {
        trials
            .iter()
            .filter_map(f)
            .map(|v| fixed(v, dp).len())
            .max()
            .unwrap_or(0)
    };
    let base_w = width(|t| t.base_amount.as_ref(), base_dp);
    let quote_w = width(|t| t.quote_amount.as_ref(), quote_dp);
    let expected_w = base_w.max(quote_w);
    let fees_w = trials
        .iter()
        .filter_map(|t| t.fees_bps.map(|f| f.to_string().len()))
        .max()
        .unwrap_or(0);
    let dev_w = trials
        .iter()
        .filter_map(|t| t.deviation_bps.as_ref().map(|d| signed_sig(d, 3).len()))
        .max()
        .unwrap_or(0);
    let ids_w = trials
        .iter()
        .map(|t| rfq_ids(t).len())
        .max()
        .unwrap_or(0);
    let (base_name, quote_name) = (&entry.base_token.name, &entry.quote_token.name);
    let name_w = base_name.len().max(quote_name.len());

    trials
        .iter()
        .map(|t| {
            let amount = |v: Option<&BigDecimal>, dp: i64, w: usize| {
                format!("{:>w$}", v.map(|v| fixed(v, dp)).unwrap_or_default())
            };
            let base = amount(t.base_amount.as_ref(), base_dp, base_w);
            let quote = amount(t.quote_amount.as_ref(), quote_dp, quote_w);
            let (base_tag, quote_tag, exp_name, exp_dp) = match t.provided {
                Provided::Base => ("[P]", "[M]", quote_name, quote_dp),
                Provided::Quote => ("[M]", "[P]", base_name, base_dp),
            };
            let expected = amount(t.expected_amount.as_ref(), exp_dp, expected_w);
            let deviation = t
                .deviation_bps
                .as_ref()
                .map(|d| signed_sig(d, 3))
                .unwrap_or_default();
            let fees = t.fees_bps.map(|f| f.to_string()).unwrap_or_default();
            let failure = t
                .fail_msg
                .as_ref()
                .map(|m| format!("failed! {m}"))
                .unwrap_or_default();

            format!(
                "[{:02}] {:<ids_w$}  {base_tag} base: {base} {base_name}  {quote_tag} quote: {quote} {quote_name}  expected: {expected} {exp_name:<name_w$}  diff: {deviation:>dev_w$} bps  fees: {fees:>fees_w$} bps  {failure}",
                t.index,
                rfq_ids(t),
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

fn rfq_ids(trial: &Trial) -> String {
    if trial.rfq_ids.is_empty() {
        "[--]".to_string()
    } else {
        serde_json::to_string(&trial.rfq_ids).unwrap_or_default()
    }
}

/// Emits the full report for one maker/pair through `tracing`.
pub fn log_report(maker: &str, entry: &PairLevels, report: &SampleReport) {
    info!("[QA] {maker}: {}", entry.label());
    for line in summary_lines(&report.stats, entry) {
        info!("{line}");
    }
    info!("[P] = Provided in RFQ   [M] = Received from Maker");
    for line in trial_lines(&report.trials, entry) {
        info!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chain, ChainType, RawPriceLevel, Token};

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn entry() -> PairLevels {
        let chain = Chain::new(ChainType::Evm, 1);
        let token = |name: &str, decimals| Token {
            chain,
            name: name.into(),
            address: format!("0x{name}"),
            decimals,
        };
        PairLevels {
            base_token: token("ETH", 18),
            quote_token: token("USDC", 6),
            levels: vec![
                RawPriceLevel { q: "0.5".into(), p: "2500".into() },
                RawPriceLevel { q: "120.123456789".into(), p: "2490".into() },
            ],
        }
    }

    #[test]
    fn summary_formats_rates_and_levels() {
        let stats = SampleStatistics {
            num_trials: 3,
            num_success: 2,
            success_rate: 2.0 / 3.0,
            bias_bps: Some(bd("1.23456")),
            deviation_bps: Some(bd("0.5")),
        };
        let lines = summary_lines(&stats, &entry());
        assert_eq!(
            lines[0],
            "Success rate: 66.67%  Avg bias: +1.235 bps  Std deviation: 0.5 bps"
        );
        assert_eq!(lines[1], "Min level: 0.5 ETH  Max level: 120.1235 ETH");
    }

    #[test]
    fn summary_without_successes() {
        let stats = SampleStatistics {
            num_trials: 1,
            num_success: 0,
            success_rate: 0.0,
            bias_bps: None,
            deviation_bps: None,
        };
        let lines = summary_lines(&stats, &entry());
        assert!(lines[0].contains("Avg bias: n/a"));
        assert!(lines[0].starts_with("Success rate: 0.00%"));
    }

    #[test]
    fn trial_lines_mark_provided_side_and_failures() {
        let ok = Trial {
            base_amount: Some(bd("1.5")),
            quote_amount: Some(bd("3750.25")),
            expected_amount: Some(bd("3751")),
            deviation_bps: Some(bd("2")),
            fees_bps: Some(4),
            rfq_ids: vec!["abc".into()],
            ..Trial::new(0, Provided::Base)
        };
        let failed = Trial {
            base_amount: Some(bd("2")),
            fail_msg: Some("No quote data".into()),
            ..Trial::new(1, Provided::Quote)
        };
        let lines = trial_lines(&[ok, failed], &entry());
        assert!(lines[0].starts_with("[00] [\"abc\"]"));
        assert!(lines[0].contains("[P] base:"));
        assert!(lines[0].contains("[M] quote: 3750.25 USDC"));
        assert!(lines[0].contains("diff: +2 bps"));
        assert!(lines[1].starts_with("[01] [--]"));
        assert!(lines[1].contains("[P] quote:"));
        assert!(lines[1].ends_with("failed! No quote data"));
    }
}
