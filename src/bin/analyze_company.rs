//! Runs the full analysis from the command line, printing progress as the
//! steps complete and writing the Markdown report next to the JSON results.

use anyhow::{Context, Result};
use bi_analyzer::analyzer::{BusinessAnalyzer, ProgressUpdate, Services};
use bi_analyzer::app::init_tracing;
use bi_analyzer::config::Config;
use bi_analyzer::{export, format};
use chrono::Utc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let user_input = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    if user_input.trim().is_empty() {
        anyhow::bail!("usage: analyze-company <company name | website | partita IVA>");
    }

    let config = Config::from_env()?;
    init_tracing(config.effective_log_level());

    let services = Services::from_config(&config)?;
    let analyzer = BusinessAnalyzer::new(&services, config.analysis_timeout());

    let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(16);
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            println!(
                "[{}/{}] {:.0}% {}{}",
                update.current_step,
                update.total_steps,
                update.progress_percent,
                update.description,
                update.eta
            );
        }
    });

    let results = analyzer.analyze(&user_input, Some(tx)).await;
    printer.await.context("progress printer stopped")?;

    if let Some(error) = &results.error {
        eprintln!("⚠️  {}", error);
    }
    if let Some(progress) = &results.progress {
        println!(
            "✅ {}/{} steps in {:.1}s ({} completed)",
            progress.completed_steps,
            progress.total_steps,
            progress.total_time_seconds,
            format::format_percentage(progress.success_rate, 0)
        );
    }

    let stem = format::report_filename(&results.company_name, "business_analysis", Utc::now());
    let json_path = format!("{}.json", stem);
    std::fs::write(&json_path, export::to_json(&results, true)?)?;
    println!("💾 Results: {}", json_path);

    if let Some(report) = &results.final_report {
        let report_path = format!("{}.md", stem);
        std::fs::write(&report_path, report)?;
        println!("📄 Report: {}", report_path);
    }
    Ok(())
}
