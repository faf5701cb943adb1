//! Config command - configuration management.

use aily_config::{ClientConfig, ConfigLayer};
use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use serde_json::json;

use super::{Context, completion_settings, records_path};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./aily.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Set one option, e.g. `completions.poll_interval_ms 250`
    Set {
        /// Dotted option name
        key: String,

        /// New value
        value: String,

        /// Write to project-local config (./aily.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

fn target_layer(local: bool) -> ConfigLayer {
    if local { ConfigLayer::Project } else { ConfigLayer::User }
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx).await,
        ConfigCommand::Which => cmd_which(ctx).await,
        ConfigCommand::Init { local } => cmd_init(local).await,
        ConfigCommand::Set { key, value, local } => cmd_set(&key, &value, local).await,
        ConfigCommand::Path => cmd_path().await,
    }
}

async fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = &loaded.config;
    let token = aily_config::resolve_auth_token(config.auth_token.as_deref());
    let settings = completion_settings(config);
    let records = records_path(config);

    if ctx.json_output {
        let output = json!({
            "base_url": config.base_url,
            "auth_token": token.as_ref().map(|t| json!({"set": true, "source": t.source.to_string()})),
            "timeout_secs": config.timeout().as_secs(),
            "completions": {
                "poll_interval_ms": settings.poll_interval.as_millis() as u64,
                "max_poll_attempts": settings.max_poll_attempts,
                "content_type": settings.content_type,
                "reply_page_size": settings.reply_page_size,
            },
            "records_path": records.as_ref().map(|p| p.display().to_string()),
            "sources": loaded.loaded_from().iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "warnings": loaded.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# Aily Configuration\n");

    // Sources
    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Connection:");
    println!(
        "  base_url:   {}",
        config.base_url.as_deref().unwrap_or("(not set)")
    );
    match &token {
        Some(t) => println!("  auth_token: <redacted> (from {})", t.source),
        None => println!("  auth_token: (not set)"),
    }
    println!("  timeout:    {}s", config.timeout().as_secs());
    println!();

    println!("Completions:");
    println!("  poll interval: {}ms", settings.poll_interval.as_millis());
    match settings.max_poll_attempts {
        Some(max) => println!("  max polls:     {}", max),
        None => println!("  max polls:     unbounded"),
    }
    println!("  content type:  {}", settings.content_type);
    println!();

    match records {
        Some(path) => println!("Session records: {}\n", path.display()),
        None => println!("Session records: in memory\n"),
    }

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    Ok(())
}

async fn cmd_which(_ctx: &Context) -> Result<()> {
    let loaded = aily_config::load_config(None)?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} [{}] {}", status, source.layer, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'aily config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

async fn cmd_init(local: bool) -> Result<()> {
    let path = aily_config::layer_path(target_layer(local))
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    let template = r#"# Aily Configuration

# Lark/Feishu Open Platform host
base_url = "https://open.feishu.cn"

# Request timeout in seconds
timeout_secs = 30

# Prefer the AILY_AUTH_TOKEN environment variable over storing a token here
# auth_token = "t-xxx"

[completions]
poll_interval_ms = 500
# max_poll_attempts = 120
content_type = "MDX"

# Where remembered sessions are kept (default: <config dir>/records.json)
# [records]
# path = "~/.config/aily/records.json"
"#;

    std::fs::write(&path, template)?;
    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  export AILY_AUTH_TOKEN=...      # provide a tenant access token");
    println!("  aily config show                # verify configuration");

    Ok(())
}

async fn cmd_set(key: &str, value: &str, local: bool) -> Result<()> {
    let layer = target_layer(local);
    let path = aily_config::layer_path(layer)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;

    let mut config = if path.is_file() {
        aily_config::load_config_file(&path)?
    } else {
        ClientConfig::new()
    };
    config.set_key(key, value)?;
    aily_config::save_config(&config, &path)?;

    println!("✓ Set {} in {} config: {}", key, layer, path.display());
    Ok(())
}

async fn cmd_path() -> Result<()> {
    if let Some(path) = aily_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
