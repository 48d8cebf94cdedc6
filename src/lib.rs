pub mod config;
pub mod context;
pub mod diagnostics;
pub mod providers;
pub mod render;
pub mod types;
pub mod vcs;

use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};

use config::HudConfig;
use diagnostics::Diagnostics;
use providers::{
    parse_snapshot, ConfigCountCollector, ExtraCommandCollector, FileSystemConfigCounter,
    FileTranscriptCollector, LocalVcsCollector, OAuthUsageCollector, ShellExtraCommand,
    TranscriptCollector, UsageCollector, VcsCollector,
};
use render::fmt::format_session_duration;
use types::RenderContext;

#[derive(Debug, thiserror::Error)]
pub enum HudError {
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("invalid stdin JSON: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),
    #[error("config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to format config: {0}")]
    ConfigFormat(#[from] toml::ser::Error),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Drives one statusline frame: snapshot in, rendered lines out.
#[derive(Debug)]
pub struct HudRunner<
    T = FileTranscriptCollector,
    C = FileSystemConfigCounter,
    V = LocalVcsCollector,
    U = OAuthUsageCollector,
    X = ShellExtraCommand,
> {
    transcript: T,
    counts: C,
    vcs: V,
    usage: U,
    extra: Option<X>,
    diagnostics: Diagnostics,
}

impl HudRunner {
    /// Runner backed by the real filesystem, VCS binaries and usage API.
    pub fn new(diagnostics: Diagnostics, extra_cmd: Option<String>) -> Self {
        Self {
            transcript: FileTranscriptCollector::new(diagnostics),
            counts: FileSystemConfigCounter::new(diagnostics),
            vcs: LocalVcsCollector::new(diagnostics),
            usage: OAuthUsageCollector::new(diagnostics),
            extra: extra_cmd
                .filter(|cmd| !cmd.trim().is_empty())
                .map(|cmd| ShellExtraCommand::new(cmd, diagnostics)),
            diagnostics,
        }
    }
}

impl<T, C, V, U, X> HudRunner<T, C, V, U, X>
where
    T: TranscriptCollector,
    C: ConfigCountCollector,
    V: VcsCollector,
    U: UsageCollector,
    X: ExtraCommandCollector,
{
    pub fn with_collectors(
        transcript: T,
        counts: C,
        vcs: V,
        usage: U,
        extra: Option<X>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            transcript,
            counts,
            vcs,
            usage,
            extra,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Gather everything the composer needs. `Ok(None)` when the host has not
    /// sent a snapshot yet.
    pub async fn prepare(
        &self,
        input: &str,
        config: HudConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<RenderContext>, HudError> {
        let Some(snapshot) = parse_snapshot(input)? else {
            return Ok(None);
        };

        let transcript = self
            .transcript
            .collect_transcript(snapshot.transcript_path.as_deref());
        let counts = self.counts.collect_counts(snapshot.cwd.as_deref());

        let vcs_status = if config.vcs.enabled {
            self.vcs.collect_vcs(snapshot.cwd.as_deref()).await
        } else {
            None
        };
        let usage = if config.display.show_usage {
            self.usage.collect_usage().await
        } else {
            None
        };
        let extra_label = match self.extra.as_ref() {
            Some(extra) => extra.collect_label().await,
            None => None,
        };

        self.diagnostics.debug(
            "runner",
            format!(
                "tools={} agents={} todos={} vcs={} usage={}",
                transcript.tools.len(),
                transcript.agents.len(),
                transcript.todos.len(),
                vcs_status.as_ref().map(|s| s.label()).unwrap_or("none"),
                usage.is_some()
            ),
        );

        let session_duration = format_session_duration(transcript.session_start, now);
        let mut ctx = RenderContext::new(snapshot, config, now);
        ctx.transcript = transcript;
        ctx.counts = counts;
        ctx.session_duration = session_duration;
        ctx.vcs_status = vcs_status;
        ctx.usage = usage;
        ctx.extra_label = extra_label;
        Ok(Some(ctx))
    }

    /// Full pipeline to terminal-ready lines.
    pub async fn run(
        &self,
        input: &str,
        config: HudConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<String>>, HudError> {
        let ctx = self.prepare(input, config, now).await?;
        Ok(ctx.map(|ctx| render::render_lines(&ctx, &self.diagnostics)))
    }
}
