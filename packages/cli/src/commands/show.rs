use super::{print_header, Context};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lexdraft_editor::{Dom, DocumentApi, DocumentId};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document id
    pub id: String,

    /// Print the full markup instead of a text preview
    #[arg(long)]
    pub html: bool,
}

pub async fn show(args: ShowArgs, ctx: &Context) -> Result<()> {
    print_header("Document", &args.id);

    let api = ctx.api()?;
    let id = DocumentId::new(args.id);
    let document = api.fetch_document(&id).await?;
    let content = match document.content.clone() {
        Some(content) => content,
        None => api.fetch_content(&id).await?.content,
    };

    println!("   Type:      {}", document.document_type);
    println!("   Version:   {}", document.version);
    println!("   Status:    {}", status_label(&document.status.to_string()));
    println!("   Generated: {}", document.generated_at.format("%Y-%m-%d %H:%M UTC"));
    println!();

    if args.html {
        println!("{}", content);
    } else {
        println!("{}", text_preview(&content));
    }

    Ok(())
}

fn status_label(status: &str) -> colored::ColoredString {
    match status {
        "COMPLETED" => status.green(),
        "FAILED" => status.red(),
        _ => status.yellow(),
    }
}

/// Body text with whitespace runs collapsed
fn text_preview(content: &str) -> String {
    let dom = Dom::parse(content);
    let Some(body) = dom.body() else {
        return String::new();
    };
    dom.text_nodes(body)
        .into_iter()
        .filter_map(|node| dom.text(node))
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_preview() {
        let content = "<html><head><title>Lease</title><style>p { color: red }</style></head>\
                       <body><h1>LEASE</h1>\n<p>The  tenant\n agrees.</p></body></html>";
        assert_eq!(text_preview(content), "LEASE The tenant agrees.");
    }
}
