//! Subcommand implementations

use crate::cli::selected_section;
use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use legally_client::chat::fetch_transcript;
use legally_client::error::ANALYSIS_FAILED_MESSAGE;
use legally_client::{
    cancellable, ApiClient, CancellationToken, ChatMessage, ChatSession, ClientError, DocumentUpload,
    MemoryCredentialStore, PollOutcome, Poller, Session,
};
use legally_content::{AnalysisDocument, AnalysisPipeline, AnalysisView, SectionKey};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Line printed when the history is empty
pub const EMPTY_HISTORY: &str = "История анализов пуста";

/// Line printed when an operation was cancelled
pub const CANCELLED: &str = "Операция отменена";

/// Configured application
#[derive(Debug, Clone)]
pub struct App {
    config: AppConfig,
    pipeline: AnalysisPipeline,
}

impl App {
    /// Create application from configuration
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let pipeline = AnalysisPipeline::new(config.content.clone());
        Self { config, pipeline }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn client(&self) -> Result<ApiClient> {
        ApiClient::new(self.config.client.clone()).context("failed to create backend client")
    }

    /// Dispatch a parsed command line
    pub async fn run<W: Write>(&self, matches: &ArgMatches, out: &mut W) -> Result<()> {
        match matches.subcommand() {
            Some(("render", args)) => {
                let path = required_path(args, "file")?;
                let document_type = args.get_one::<String>("document-type").map(String::as_str);
                self.render_file(&path, document_type, selected_section(args), args.get_flag("json"), out)
            }
            Some(("analyze", args)) => {
                let path = required_path(args, "file")?;
                self.analyze(&path, selected_section(args), args.get_flag("json"), out).await
            }
            Some(("wait", args)) => {
                let task = args.get_one::<String>("task").context("missing task id")?;
                self.wait(task, selected_section(args), args.get_flag("json"), out).await
            }
            Some(("history", args)) => {
                let token = args.get_one::<String>("token").context("missing token")?;
                self.history(token, out).await
            }
            Some(("chat", args)) => {
                let message = args
                    .get_many::<String>("message")
                    .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
                    .unwrap_or_default();
                self.chat(&message, out).await
            }
            Some(("export-chat", args)) => {
                self.export_chat(args.get_one::<PathBuf>("out").map(PathBuf::as_path), out)
                    .await
            }
            Some(("stats", _)) => self.stats(out).await,
            Some((other, _)) => bail!("unknown command: {other}"),
            None => bail!("no command given"),
        }
    }

    /// Render a local markdown file
    pub fn render_file<W: Write>(
        &self,
        path: &Path,
        document_type: Option<&str>,
        section: Option<SectionKey>,
        json: bool,
        out: &mut W,
    ) -> Result<()> {
        let markdown = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document = AnalysisDocument {
            analysis: Some(markdown),
            document_type: document_type.map(str::to_string),
        };
        let view = self.pipeline.render(&document);
        print_view(&view, section, json, out)
    }

    async fn analyze<W: Write>(
        &self,
        path: &Path,
        section: Option<SectionKey>,
        json: bool,
        out: &mut W,
    ) -> Result<()> {
        let upload = DocumentUpload::from_path(path).await?;
        upload.validate()?;
        tracing::info!(file = %upload.file_name, size = %upload.display_size(), "uploading");

        let client = self.client()?;
        let token = ctrl_c_token();
        let document = match cancellable(&token, client.analyze(&upload)).await {
            Ok(document) => document,
            Err(ClientError::Cancelled) => {
                writeln!(out, "{CANCELLED}")?;
                return Ok(());
            }
            Err(e @ ClientError::InvalidInput(_)) => return Err(e.into()),
            Err(e) => return Err(anyhow::Error::new(e).context(ANALYSIS_FAILED_MESSAGE)),
        };

        let view = self.pipeline.render(&document);
        print_view(&view, section, json, out)
    }

    async fn wait<W: Write>(
        &self,
        task_id: &str,
        section: Option<SectionKey>,
        json: bool,
        out: &mut W,
    ) -> Result<()> {
        let client = self.client()?;
        let token = ctrl_c_token();
        let poller = Poller::from_config(client.config());

        let outcome = poller
            .poll(&client, task_id, &token, |status| {
                tracing::info!(task_id, status = ?status.status, progress = ?status.progress, "task update");
            })
            .await
            .with_context(|| format!("failed to poll task {task_id}"))?;

        match outcome {
            PollOutcome::Completed(status) => match status.result {
                Some(document) => print_view(&self.pipeline.render(&document), section, json, out),
                None => {
                    writeln!(out, "Задача {task_id} завершена без результата")?;
                    Ok(())
                }
            },
            PollOutcome::Failed(reason) => bail!("task {task_id} failed: {reason}"),
            PollOutcome::Cancelled => {
                writeln!(out, "{CANCELLED}")?;
                Ok(())
            }
        }
    }

    async fn history<W: Write>(&self, token: &str, out: &mut W) -> Result<()> {
        let client = self.client()?;
        let session = Session::new(MemoryCredentialStore::new());
        session.sign_in(token).context("a bearer token is required")?;

        let token = session
            .ensure_authenticated(&client)
            .await
            .context("sign in again to view history")?;
        let records = session.check(client.history(&token).await)?;

        if records.is_empty() {
            writeln!(out, "{EMPTY_HISTORY}")?;
            return Ok(());
        }
        for record in &records {
            writeln!(
                out,
                "{}  {}  {}",
                record.created_at,
                record.filename,
                record.to_document().document_type_label()
            )?;
        }
        Ok(())
    }

    async fn chat<W: Write>(&self, message: &str, out: &mut W) -> Result<()> {
        let client = self.client()?;
        let mut session = ChatSession::new();

        let sent = session
            .send(&client, message)
            .await
            .map(|reply| reply.is_some());
        if matches!(sent, Ok(false)) {
            bail!("message is empty");
        }

        // reply on success, apology on failure
        if let Some(reply) = session.messages().last() {
            print_reply(reply, out)?;
        }
        sent.map(|_| ()).context("chat request failed")
    }

    async fn export_chat<W: Write>(&self, path: Option<&Path>, out: &mut W) -> Result<()> {
        let client = self.client()?;
        let transcript = fetch_transcript(&client)
            .await
            .context("failed to fetch chat history")?;

        let path = path.map_or_else(
            || PathBuf::from(legally_client::transcript_file_name(chrono::Local::now().date_naive())),
            Path::to_path_buf,
        );
        std::fs::write(&path, transcript)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writeln!(out, "{}", path.display())?;
        Ok(())
    }

    async fn stats<W: Write>(&self, out: &mut W) -> Result<()> {
        let stats = self.client()?.stats().await.context("failed to fetch statistics")?;
        writeln!(out, "{}", stats.summary())?;
        Ok(())
    }
}

fn required_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing <{name}>"))
}

/// Print one section as HTML, or the whole view as JSON
pub fn print_view<W: Write>(
    view: &AnalysisView,
    section: Option<SectionKey>,
    json: bool,
    out: &mut W,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, view)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", view.html(section))?;
    }
    Ok(())
}

/// Print an assistant message with its mode badge and sources
pub fn print_reply<W: Write>(reply: &ChatMessage, out: &mut W) -> Result<()> {
    match reply.mode_badge() {
        Some(badge) => writeln!(out, "[{badge}] {}", reply.content)?,
        None => writeln!(out, "{}", reply.content)?,
    }
    if !reply.sources.is_empty() {
        writeln!(out)?;
        for source in &reply.sources {
            writeln!(out, "• {source}")?;
        }
    }
    Ok(())
}

fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            child.cancel();
        }
    });
    token
}
