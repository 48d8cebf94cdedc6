//! Optional user command whose `{"label": "..."}` output is shown in the header.

use std::{process::Stdio, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tokio::{io::AsyncReadExt, process::Command};

use crate::diagnostics::Diagnostics;

pub const EXTRA_CMD_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_OUTPUT_BYTES: usize = 10 * 1024;
const MAX_LABEL_CHARS: usize = 50;

#[allow(async_fn_in_trait)]
pub trait ExtraCommandCollector {
    async fn collect_label(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct ShellExtraCommand {
    command: String,
    timeout: Duration,
    diagnostics: Diagnostics,
}

impl ShellExtraCommand {
    pub fn new(command: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self {
            command: command.into(),
            timeout: EXTRA_CMD_TIMEOUT,
            diagnostics,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn shell(&self) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", &self.command]);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", &self.command]);
            cmd
        }
    }

    async fn run(&self) -> Result<String, String> {
        let mut child = self
            .shell()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("spawn: {e}"))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| "stdout not captured".to_string())?;

        let read = async {
            // One byte past the cap tells an oversized output from an exact fit.
            let mut buffer = Vec::with_capacity(1024);
            (&mut stdout)
                .take(MAX_OUTPUT_BYTES as u64 + 1)
                .read_to_end(&mut buffer)
                .await
                .map_err(|e| format!("read stdout: {e}"))?;
            if buffer.len() > MAX_OUTPUT_BYTES {
                return Err(format!("output exceeds {MAX_OUTPUT_BYTES} bytes"));
            }
            let status = child.wait().await.map_err(|e| format!("wait: {e}"))?;
            if !status.success() {
                return Err(format!("exit code {:?}", status.code()));
            }
            String::from_utf8(buffer).map_err(|e| format!("output encoding: {e}"))
        };

        tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| format!("timed out after {:?}", self.timeout))?
    }
}

impl ExtraCommandCollector for ShellExtraCommand {
    async fn collect_label(&self) -> Option<String> {
        let result = match self.run().await {
            Ok(stdout) => parse_label(&stdout),
            Err(err) => Err(err),
        };
        match result {
            Ok(label) => Some(label),
            Err(err) => {
                self.diagnostics
                    .debug("extra-cmd", format!("`{}`: {err}", self.command));
                None
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct StubExtraCommand {
    pub label: Option<String>,
}

impl ExtraCommandCollector for StubExtraCommand {
    async fn collect_label(&self) -> Option<String> {
        self.label.clone()
    }
}

#[derive(Debug, Deserialize)]
struct LabelOutput {
    label: String,
}

/// Parse `{"label": "..."}`, then sanitize and cap the label.
pub fn parse_label(stdout: &str) -> Result<String, String> {
    let output: LabelOutput =
        serde_json::from_str(stdout.trim()).map_err(|e| format!("invalid JSON output: {e}"))?;
    Ok(truncate_label(&sanitize(&output.label)))
}

/// Remove terminal control sequences and bidi overrides.
pub fn sanitize(input: &str) -> String {
    static CSI_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("valid CSI pattern"));
    static OSC_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").expect("valid OSC pattern"));
    static ESC_FE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\x1b[@-Z\\-_]").expect("valid ESC pattern"));
    static CONTROL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[\x00-\x1f\x7f-\x9f\x{061c}\x{200e}\x{200f}\x{202a}-\x{202e}\x{2066}-\x{206f}]")
            .expect("valid control pattern")
    });

    let text = CSI_RE.replace_all(input, "");
    let text = OSC_RE.replace_all(&text, "");
    let text = ESC_FE_RE.replace_all(&text, "");
    CONTROL_RE.replace_all(&text, "").into_owned()
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    format!("{head}…")
}
