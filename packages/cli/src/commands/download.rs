use super::{print_header, Context};
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use colored::Colorize;
use lexdraft_editor::{ApiError, DocumentApi, DocumentId, DownloadFormat};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Document id
    pub id: String,

    /// File format (pdf, docx, html)
    #[arg(short, long, default_value = "pdf", value_parser = parse_format)]
    pub format: DownloadFormat,

    /// Output path (defaults to <id>.<format>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_format(value: &str) -> Result<DownloadFormat, String> {
    value.parse()
}

pub async fn download(args: DownloadArgs, ctx: &Context) -> Result<()> {
    print_header("Downloading", &args.id);

    let id = DocumentId::new(args.id);
    let file = match ctx.api()?.download(&id, args.format).await {
        Ok(file) => file,
        Err(ApiError::PaymentRequired {
            message,
            payment_options,
            ..
        }) => {
            println!("  {} {}", "$".yellow().bold(), message);
            for option in &payment_options {
                let price = match (option.price, &option.currency) {
                    (Some(price), Some(currency)) => format!(" {:.2} {}", price, currency),
                    (Some(price), None) => format!(" {:.2}", price),
                    _ => String::new(),
                };
                println!(
                    "    - {}{}",
                    option.label.as_deref().unwrap_or(&option.kind),
                    price
                );
            }
            return Err(anyhow!("Payment required to download {}", id));
        }
        Err(error) => return Err(error.into()),
    };

    let output = args
        .output
        .unwrap_or_else(|| ctx.cwd.join(file.file_name(&id)));
    std::fs::write(&output, &file.bytes)
        .with_context(|| format!("Cannot write {}", output.display()))?;

    println!(
        "  {} Wrote {} ({} bytes)",
        "✓".green(),
        output.display(),
        file.bytes.len()
    );
    Ok(())
}
