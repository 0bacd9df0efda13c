pub mod download;
pub mod edit;
pub mod init;
pub mod publish;
pub mod show;

pub use download::{download, DownloadArgs};
pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use publish::{publish, PublishArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use anyhow::{Context as _, Result};
use colored::Colorize;
use lexdraft_client::HttpDocumentApi;
use lexdraft_editor::{DocumentApi, DocumentId, EditorSession, SessionOptions, TracingNotifier};
use std::path::PathBuf;
use std::sync::Arc;

/// What every remote command needs: resolved config and the API behind it
pub struct Context {
    pub cwd: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(cwd: PathBuf, api_url: Option<String>) -> Result<Self> {
        let mut config = Config::load(&cwd)?;
        if let Some(url) = api_url {
            config.api_base_url = url;
        }
        Ok(Self { cwd, config })
    }

    pub fn api(&self) -> Result<Arc<dyn DocumentApi>> {
        let api = HttpDocumentApi::new(self.config.client_config())
            .with_context(|| format!("Cannot create client for {}", self.config.api_base_url))?;
        Ok(Arc::new(api))
    }

    pub async fn open(&self, id: &str) -> Result<EditorSession> {
        let options = SessionOptions::default()
            .with_config(self.config.editor.clone())
            .with_notifier(Arc::new(TracingNotifier));

        let session = EditorSession::load(self.api()?, &DocumentId::new(id), options).await?;
        Ok(session)
    }
}

pub(crate) fn print_header(action: &str, id: &str) {
    println!("{} {}", action.bright_blue().bold(), id.bright_white());
}
