use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

/// Write a default config; `api_url` comes from the global `--api-url` flag
pub fn init(args: InitArgs, cwd: &Path, api_url: Option<String>) -> Result<()> {
    let config_path = Config::path_in(cwd);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = Config {
        timeout_secs: args.timeout,
        ..Config::default()
    };
    if let Some(url) = api_url {
        config.api_base_url = url;
    }

    config.save(cwd)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!("    API: {}", config.api_base_url);
    println!();
    println!("Next steps:");
    println!("  1. Set {} or add authToken to the config", crate::config::AUTH_TOKEN_ENV);
    println!("  2. Run: lexdraft show <document-id>");

    Ok(())
}
