//! Number, date and summary formatting for reports.
//!
//! Amounts follow Italian conventions: `.` groups thousands and `,`
//! separates decimals.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::SectionResults;

static FILENAME_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid filename regex"));

/// Social platforms whose follower counts add up in the executive summary
const SUMMARY_PLATFORMS: [&str; 3] = ["instagram", "facebook", "linkedin"];

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

/// `€ 1.234,56` for EUR, `1,234.56 USD` for anything else.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, decimals) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    if currency.eq_ignore_ascii_case("EUR") {
        format!("€ {}{},{}", sign, group_thousands(int_part, '.'), decimals)
    } else {
        format!(
            "{}{}.{} {}",
            sign,
            group_thousands(int_part, ','),
            decimals,
            currency
        )
    }
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Compact notation: 1.5K, 2.3M, 1.0B
pub fn format_large_number(number: f64) -> String {
    if number >= 1_000_000_000.0 {
        format!("{:.1}B", number / 1_000_000_000.0)
    } else if number >= 1_000_000.0 {
        format!("{:.1}M", number / 1_000_000.0)
    } else if number >= 1_000.0 {
        format!("{:.1}K", number / 1_000.0)
    } else {
        format!("{}", number)
    }
}

/// Percentage change from `previous` to `current`, 0 when there is no base.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub fn trend_indicator(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return "📊 Nuovo dato".to_string();
    }

    let change = growth_rate(current, previous);
    if change > 10.0 {
        format!("📈 +{:.1}% (Forte crescita)", change)
    } else if change > 0.0 {
        format!("📈 +{:.1}% (Crescita)", change)
    } else if change > -10.0 {
        format!("📉 {:.1}% (Lieve calo)", change)
    } else {
        format!("📉 {:.1}% (Forte calo)", change)
    }
}

/// Human readable span in Italian: "2 anni", "1 mese", "3 giorni", "5 ore"
pub fn format_timespan(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let delta = end - start;
    let days = delta.num_days();

    let (count, singular, plural) = if days > 365 {
        (days / 365, "anno", "anni")
    } else if days > 30 {
        (days / 30, "mese", "mesi")
    } else if days > 0 {
        (days, "giorno", "giorni")
    } else {
        (delta.num_hours().max(0), "ora", "ore")
    };
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

/// `{report_type}_{company}_{YYYYmmdd_HHMM}` with the company name made file-safe
pub fn report_filename(company_name: &str, report_type: &str, at: DateTime<Utc>) -> String {
    let clean = FILENAME_UNSAFE_RE.replace_all(company_name, "");
    let clean = clean.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase();
    format!("{}_{}_{}", report_type, clean, at.format("%Y%m%d_%H%M"))
}

/// Reads a number that the model may have returned as a JSON number or as
/// text such as "8400" or "1.234".
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::validation::extract_numbers(s).into_iter().next(),
        _ => None,
    }
}

/// Key insights bullet list built from whatever sections are available
pub fn executive_summary(sections: &SectionResults) -> String {
    let mut points = Vec::new();

    if let Some(traffic) = sections
        .seo()
        .and_then(|seo| seo.analysis.get("traffico_organico"))
        .and_then(value_as_number)
    {
        points.push(format!(
            "🔍 Traffico organico: {} visite/mese",
            format_large_number(traffic)
        ));
    }

    if let Some(competitors) = sections
        .competitors()
        .and_then(|c| c.competitor_analysis.get("competitors"))
        .and_then(Value::as_array)
    {
        points.push(format!(
            "🏢 {} competitor principali identificati",
            competitors.len()
        ));
    }

    if let Some(social) = sections.social() {
        let total_followers: f64 = SUMMARY_PLATFORMS
            .iter()
            .filter_map(|platform| social.social_analysis.get(*platform))
            .filter_map(|data| data.get("follower_count").and_then(value_as_number))
            .sum();
        if total_followers > 0.0 {
            points.push(format!(
                "📱 {} follower totali sui social",
                format_large_number(total_followers)
            ));
        }
    }

    if let Some((year, revenue)) = sections
        .financial()
        .and_then(|f| f.financial_analysis.get("fatturato_evolution"))
        .and_then(Value::as_object)
        .and_then(|evolution| evolution.iter().max_by(|a, b| a.0.cmp(b.0)))
        .and_then(|(year, amount)| value_as_number(amount).map(|a| (year.clone(), a)))
    {
        points.push(format!(
            "💰 Fatturato {}: {}",
            year,
            format_currency(revenue, "EUR")
        ));
    }

    if points.is_empty() {
        points.push("📊 Analisi completa dei dati aziendali disponibili".to_string());
    }

    let bullets: Vec<String> = points.iter().map(|p| format!("• {}", p)).collect();
    format!("**KEY INSIGHTS:**\n{}", bullets.join("\n"))
}
