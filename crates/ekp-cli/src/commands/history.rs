// ABOUTME: Implementation of 'ekp history' command
// ABOUTME: Lists answered questions or prints one record with its sources

use anyhow::Result;
use colored::Colorize;

use ekp_client::{AppStore, QaRecord};

use super::render::{print_sources, truncate};

pub async fn run(store: &AppStore, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) => show(store, id).await,
        None => list(store).await,
    }
}

async fn list(store: &AppStore) -> Result<()> {
    let records = store.cache().qa_history().await?;

    if records.is_empty() {
        println!("{}", "No questions asked yet".dimmed());
        return Ok(());
    }

    println!("{}", format!("Q&A History ({})", records.len()).bold());
    println!();
    for record in records.iter() {
        println!(
            "{} {} {}",
            format!("#{}", record.id).dimmed(),
            record.question.bold(),
            record.created_at.dimmed()
        );
        println!("    {}", truncate(record.answer.trim(), 100));
    }
    Ok(())
}

async fn show(store: &AppStore, id: i64) -> Result<()> {
    let record = store.api().get_qa_record(id).await?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &QaRecord) {
    println!("{} {}", "Q:".bold(), record.question);
    println!("{} {}", "A:".bold(), record.answer);
    print_sources(&record.sources);
    println!();
    println!("  {}:    {}", "Model".dimmed(), record.model_used);
    println!("  {}:   {}", "Tokens".dimmed(), record.tokens_used);
    println!("  {}:  {} ms", "Latency".dimmed(), record.response_time_ms);
    println!("  {}:    {}", "Asked".dimmed(), record.created_at);
}
