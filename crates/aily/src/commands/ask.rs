//! Ask command - one-shot question to an assistant app.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use serde_json::json;

use aily_client::{CompletionRequest, ExecStatus, RequestOptions};

use super::Context;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question or prompt to send
    #[arg(required = true)]
    pub prompt: String,

    /// Assistant app to run
    #[arg(short, long, env = "AILY_APP_ID")]
    pub app: String,

    /// Skill within the app
    #[arg(long)]
    pub skill: Option<String>,

    /// Reuse the session remembered under this key (created on first use)
    #[arg(short = 'k', long)]
    pub session_key: Option<String>,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let dim = Style::new().dim();

    if ctx.verbose {
        eprintln!("{}", dim.apply_to(format!("App: {}", args.app)));
        if let Some(ref key) = args.session_key {
            eprintln!("{}", dim.apply_to(format!("Session key: {}", key)));
        }
    }

    let mut request = CompletionRequest::new(args.app, args.prompt);
    if let Some(key) = args.session_key {
        request = request.with_session_key(key);
    }
    if let Some(skill) = args.skill {
        request = request.with_skill(skill);
    }

    let result = client
        .completions()
        .create(request, &RequestOptions::new())
        .await;

    if ctx.json_output {
        let output = json!({
            "status": result.status.as_str(),
            "code": result.status.code(),
            "message": result.message,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(ref reply) = result.message {
        println!("{}", reply.content);
    }

    if result.status != ExecStatus::Success {
        let red = Style::new().red();
        eprintln!("{} run finished with status {}", red.apply_to("Error:"), result.status);
        bail!("completion failed: {}", result.status);
    }

    Ok(())
}
