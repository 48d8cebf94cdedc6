//! Subscription quota from the OAuth usage endpoint.
//!
//! Credentials come from the macOS keychain when available, otherwise from
//! `~/.claude/.credentials.json`. The HTTP call goes through `curl` with the
//! bearer header piped on stdin so the token never shows up in `ps`.

use std::{path::PathBuf, process::Stdio, time::Duration};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{diagnostics::Diagnostics, types::UsageData};

const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";
const CURL_MAX_TIME_SECS: u64 = 5;
const FETCH_TIMEOUT: Duration = Duration::from_secs(CURL_MAX_TIME_SECS + 1);
#[cfg(target_os = "macos")]
const KEYCHAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[allow(async_fn_in_trait)]
pub trait UsageCollector {
    async fn collect_usage(&self) -> Option<UsageData>;
}

#[derive(Debug, Clone, Default)]
pub struct OAuthUsageCollector {
    home: Option<PathBuf>,
    diagnostics: Diagnostics,
}

impl OAuthUsageCollector {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            home: dirs::home_dir(),
            diagnostics,
        }
    }

    async fn read_credentials(&self) -> Option<Credentials> {
        #[cfg(target_os = "macos")]
        {
            if let Some(credentials) = self.keychain_credentials().await {
                return Some(credentials);
            }
        }
        self.file_credentials()
    }

    #[cfg(target_os = "macos")]
    async fn keychain_credentials(&self) -> Option<Credentials> {
        let lookup = Command::new("/usr/bin/security")
            .args(["find-generic-password", "-s", "Claude Code-credentials", "-w"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(KEYCHAIN_TIMEOUT, lookup).await.ok()?.ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        serde_json::from_str(text.trim()).ok()
    }

    fn file_credentials(&self) -> Option<Credentials> {
        let path = self.home.as_ref()?.join(".claude").join(".credentials.json");
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                self.diagnostics
                    .debug("usage", format!("parse credentials: {err}"));
                None
            }
        }
    }

    async fn call_usage_api(&self, access_token: &str) -> Result<String, String> {
        let mut child = Command::new("curl")
            .args([
                "-s",
                "--fail",
                "--max-time",
                &CURL_MAX_TIME_SECS.to_string(),
                "-H",
                "anthropic-beta: oauth-2025-04-20",
                "-H",
                "@-", // Authorization header arrives on stdin
                USAGE_URL,
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("spawn curl: {e}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            let header = format!("Authorization: Bearer {access_token}");
            stdin
                .write_all(header.as_bytes())
                .await
                .map_err(|e| format!("write to curl stdin: {e}"))?;
        }

        let output = tokio::time::timeout(FETCH_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| "curl timed out".to_string())?
            .map_err(|e| format!("curl wait: {e}"))?;

        if !output.status.success() {
            return Err(format!("curl exit code: {:?}", output.status.code()));
        }

        String::from_utf8(output.stdout).map_err(|e| format!("curl output encoding: {e}"))
    }
}

impl UsageCollector for OAuthUsageCollector {
    async fn collect_usage(&self) -> Option<UsageData> {
        let credentials = self.read_credentials().await?;
        let oauth = credentials.claude_ai_oauth?;
        let access_token = oauth.access_token?;

        let plan_name = plan_name(oauth.subscription_type.as_deref()?)?;

        if let Some(expires_at) = oauth.expires_at {
            if Utc::now().timestamp_millis() > expires_at {
                self.diagnostics.debug("usage", "access token expired");
                return None;
            }
        }

        let usage = match self.call_usage_api(&access_token).await {
            Ok(body) => usage_from_response(plan_name.clone(), &body),
            Err(err) => Err(err),
        };

        match usage {
            Ok(usage) => Some(usage),
            Err(err) => {
                self.diagnostics.debug("usage", format!("fetch failed: {err}"));
                Some(UsageData {
                    plan_name: Some(plan_name),
                    api_unavailable: true,
                    ..Default::default()
                })
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct StubUsageCollector {
    pub usage: Option<UsageData>,
}

impl UsageCollector for StubUsageCollector {
    async fn collect_usage(&self) -> Option<UsageData> {
        self.usage.clone()
    }
}

// ── Credentials ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct Credentials {
    #[serde(rename = "claudeAiOauth")]
    claude_ai_oauth: Option<OAuthCredentials>,
}

#[derive(Debug, Default, Deserialize)]
struct OAuthCredentials {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    #[serde(rename = "subscriptionType")]
    subscription_type: Option<String>,
    #[serde(rename = "expiresAt")]
    expires_at: Option<i64>,
}

/// Display name for a subscription type. `None` for API-key users.
pub fn plan_name(subscription_type: &str) -> Option<String> {
    let lower = subscription_type.trim().to_ascii_lowercase();
    if lower.is_empty() || lower == "api" {
        return None;
    }
    let name = if lower.contains("max") {
        "Max".to_string()
    } else if lower.contains("pro") {
        "Pro".to_string()
    } else if lower.contains("team") {
        "Team".to_string()
    } else {
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return None,
        }
    };
    Some(name)
}

// ── Response ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UsageApiResponse {
    five_hour: Option<UsagePeriod>,
    seven_day: Option<UsagePeriod>,
}

#[derive(Debug, Deserialize)]
struct UsagePeriod {
    utilization: Option<f64>,
    resets_at: Option<String>,
}

impl UsagePeriod {
    fn percent(&self) -> Option<u8> {
        self.utilization
            .filter(|value| value.is_finite())
            .map(|value| value.round().clamp(0.0, 100.0) as u8)
    }

    fn reset_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.resets_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

/// Build `UsageData` from the endpoint's JSON body.
pub fn usage_from_response(plan_name: String, body: &str) -> Result<UsageData, String> {
    let response: UsageApiResponse =
        serde_json::from_str(body).map_err(|e| format!("parse usage response: {e}"))?;

    let five_hour = response.five_hour.as_ref();
    let seven_day = response.seven_day.as_ref();

    Ok(UsageData {
        plan_name: Some(plan_name),
        five_hour: five_hour.and_then(UsagePeriod::percent),
        seven_day: seven_day.and_then(UsagePeriod::percent),
        five_hour_reset_at: five_hour.and_then(UsagePeriod::reset_at),
        seven_day_reset_at: seven_day.and_then(UsagePeriod::reset_at),
        api_unavailable: false,
    })
}
