//! Records command - show remembered session keys.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use aily_session::SessionRecords;

use super::{Context, open_record_cache, records_path};

/// Arguments for the records command.
#[derive(Args, Debug)]
pub struct RecordsArgs {}

/// Run the records command.
pub async fn run(_args: RecordsArgs, ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?.config;
    let dim = Style::new().dim();

    let records = match open_record_cache(&config).await? {
        Some(cache) => SessionRecords::new(cache).get().await,
        None => Default::default(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("{}", style("Session records").bold());
    if let Some(path) = records_path(&config) {
        println!("{}", dim.apply_to(path.display().to_string()));
    }
    println!("{}", dim.apply_to("─".repeat(50)));

    if records.is_empty() {
        println!("{}", dim.apply_to("No session records"));
    }
    for (key, id) in &records {
        let id = id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string());
        println!("  {:<24} {}", key, id);
    }

    Ok(())
}
