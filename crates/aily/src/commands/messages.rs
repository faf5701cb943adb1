//! Messages command - list a session's messages page by page.

use anyhow::{Result, bail};
use clap::Args;
use console::{Style, style};

use aily_client::{ListMessagesQuery, Message, RequestOptions, SenderType};

use super::Context;

/// Arguments for the messages command.
#[derive(Args, Debug)]
pub struct MessagesArgs {
    /// Session ID
    pub session_id: String,

    /// Only messages produced by this run
    #[arg(short, long)]
    pub run: Option<String>,

    /// Messages per page
    #[arg(long)]
    pub page_size: Option<u32>,
}

/// Run the messages command.
pub async fn run(args: MessagesArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let dim = Style::new().dim();

    let query = ListMessagesQuery {
        page_size: args.page_size,
        run_id: args.run,
        ..Default::default()
    };
    let mut pages =
        client
            .messages()
            .list_with_iterator(&args.session_id, &query, &RequestOptions::new());

    let mut all = Vec::new();
    let mut failed = false;
    while let Some(page) = pages.next_page().await {
        match page {
            Some(page) => all.extend(page.messages),
            None => failed = true,
        }
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&all)?);
    } else {
        println!("{}", style(format!("Session {}", args.session_id)).bold());
        println!("{}", dim.apply_to("─".repeat(50)));
        if all.is_empty() {
            println!("{}", dim.apply_to("No messages found"));
        }
        for message in &all {
            println!("{} {}", dim.apply_to(format!("[{}]", sender_label(message))), message.content);
        }
    }

    if failed {
        let red = Style::new().red();
        eprintln!(
            "{} listing stopped after {} page(s)",
            red.apply_to("Error:"),
            pages.pages_fetched()
        );
        bail!("failed to list all messages");
    }

    Ok(())
}

fn sender_label(message: &Message) -> &str {
    match message.sender.as_ref().map(|s| &s.sender_type) {
        Some(SenderType::Assistant) => "assistant",
        Some(SenderType::User) => "user",
        Some(SenderType::Other(other)) => other.as_str(),
        None => "unknown",
    }
}
