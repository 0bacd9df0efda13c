use super::{print_header, Context};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use lexdraft_editor::PublishOutcome;

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Draft document id
    pub id: String,
}

pub async fn publish(args: PublishArgs, ctx: &Context) -> Result<()> {
    print_header("Publishing", &args.id);

    let session = ctx.open(&args.id).await?;
    report_publish(session.publish().await)
}

pub(crate) fn report_publish(outcome: PublishOutcome) -> Result<()> {
    match outcome {
        PublishOutcome::Published(published) => {
            println!(
                "  {} Published as {} ({})",
                "✓".green(),
                published.document_id.to_string().bright_white().bold(),
                published.status
            );
            println!("    Draft {} is unchanged", published.original_document_id);
            Ok(())
        }
        PublishOutcome::Failed(error) => bail!("Publish failed: {}", error),
        other => bail!("Publish did not run: {:?}", other),
    }
}
