mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    download, edit, init, publish, show, Context, DownloadArgs, EditArgs, InitArgs, PublishArgs,
    ShowArgs,
};
use tracing_subscriber::EnvFilter;

/// lexdraft CLI - edit, save and publish generated documents
#[derive(Parser, Debug)]
#[command(name = "lexdraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Document service URL, overriding the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a lexdraft.config.json
    Init(InitArgs),

    /// Print a document's metadata and text
    Show(ShowArgs),

    /// Change a draft's content or settings and save it
    Edit(EditArgs),

    /// Publish a draft as a new completed document
    Publish(PublishArgs),

    /// Download a rendition of a document
    Download(DownloadArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Init(args) => init(args, &cwd, cli.api_url),
        Command::Show(args) => show(args, &Context::load(cwd, cli.api_url)?).await,
        Command::Edit(args) => edit(args, &Context::load(cwd, cli.api_url)?).await,
        Command::Publish(args) => publish(args, &Context::load(cwd, cli.api_url)?).await,
        Command::Download(args) => download(args, &Context::load(cwd, cli.api_url)?).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
