use super::publish::report_publish;
use super::{print_header, Context};
use anyhow::{bail, Context as _, Result};
use clap::Args;
use colored::Colorize;
use lexdraft_editor::{watermark_hint, EditorSession, LogoUpload, SaveOutcome};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Document id
    pub id: String,

    /// Replace the document markup with this file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Show a watermark with this text
    #[arg(long, conflicts_with = "no_watermark")]
    pub watermark: Option<String>,

    /// Remove the watermark
    #[arg(long)]
    pub no_watermark: bool,

    /// Add a cover page with this text
    #[arg(long)]
    pub cover_page: Option<String>,

    /// Cover page logo image
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Publish after saving
    #[arg(long)]
    pub publish: bool,
}

pub async fn edit(args: EditArgs, ctx: &Context) -> Result<()> {
    print_header("Editing", &args.id);

    let mut session = ctx.open(&args.id).await?;
    apply_edits(&mut session, &args)?;
    session.flush().await;

    match session.save().await {
        SaveOutcome::Saved => println!("  {} Saved draft", "✓".green()),
        SaveOutcome::Unchanged => println!("  {} No changes to save", "•".dimmed()),
        SaveOutcome::Failed(error) => bail!("Save failed: {}", error),
        other => bail!("Save did not run: {:?}", other),
    }

    if args.publish {
        report_publish(session.publish().await)?;
    }

    Ok(())
}

fn apply_edits(session: &mut EditorSession, args: &EditArgs) -> Result<()> {
    if let Some(path) = &args.file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        session.content_changed(content);
    }

    let panel = session.panel();

    if let Some(text) = &args.watermark {
        if let Some(hint) = watermark_hint(text) {
            println!("  {} {}", "⚠️".yellow(), hint);
        }
        panel.set_watermark(session, true);
        panel.set_watermark_text(session, text.clone());
    } else if args.no_watermark {
        panel.set_watermark(session, false);
    }

    if let Some(text) = &args.cover_page {
        panel.set_cover_page(session, true);
        panel.set_cover_page_text(session, text.clone());
    }

    if let Some(path) = &args.logo {
        let bytes = fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logo".to_string());
        session.upload_logo(LogoUpload::new(name, bytes))?;
    }

    Ok(())
}
