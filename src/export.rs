//! JSON and CSV exports of analysis results.

use serde_json::Value;

use crate::error::ClientResult;
use crate::models::AnalysisResults;

/// Serializes the results; `pretty` adds indentation.
pub fn to_json(results: &AnalysisResults, pretty: bool) -> ClientResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    Ok(json)
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// Flat `Metric,Value,Category` table: basic company info, then every key of
/// the SEO analysis.
pub fn to_csv(results: &AnalysisResults) -> ClientResult<String> {
    metrics_csv(
        &results.company_name,
        &results.website,
        results.analysis_results.seo().map(|s| &s.analysis),
    )
}

/// Same table as [`to_csv`], built from results serialized by an earlier run.
pub fn results_json_to_csv(results: &Value) -> ClientResult<String> {
    let text = |key: &str| results.get(key).and_then(Value::as_str).unwrap_or_default();
    metrics_csv(
        text("company_name"),
        text("website"),
        results.pointer("/analysis_results/semrush/analysis"),
    )
}

fn metrics_csv(company_name: &str, website: &str, seo: Option<&Value>) -> ClientResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Metric", "Value", "Category"])?;
    writer.write_record(["Company Name", or_na(company_name), "Basic Info"])?;
    writer.write_record(["Website", or_na(website), "Basic Info"])?;

    if let Some(Value::Object(analysis)) = seo {
        for (key, value) in analysis {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer.write_record([key.as_str(), value.as_str(), "SEO"])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))
        .map_err(csv::Error::from)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
