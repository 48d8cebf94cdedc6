use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{config::HudConfig, vcs::VcsStatus};

// ── Session snapshot (stdin) ────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionSnapshot {
    pub transcript_path: Option<String>,
    pub cwd: Option<String>,
    pub model: Option<ModelInfo>,
    pub context_window: Option<ContextWindow>,
}

impl SessionSnapshot {
    pub fn model_name(&self) -> String {
        self.model
            .as_ref()
            .and_then(|model| model.display_name.clone().or_else(|| model.id.clone()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn current_usage(&self) -> Option<&CurrentUsage> {
        self.context_window
            .as_ref()
            .and_then(|context| context.current_usage.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelInfo {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContextWindow {
    pub context_window_size: Option<u64>,
    pub current_usage: Option<CurrentUsage>,
    pub used_percentage: Option<f64>,
    pub remaining_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentUsage {
    pub input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

impl CurrentUsage {
    pub fn input(&self) -> u64 {
        self.input_tokens.unwrap_or(0)
    }

    /// Cache creation plus cache read tokens.
    pub fn cache(&self) -> u64 {
        self.cache_creation_input_tokens
            .unwrap_or(0)
            .saturating_add(self.cache_read_input_tokens.unwrap_or(0))
    }

    pub fn total(&self) -> u64 {
        self.input().saturating_add(self.cache())
    }
}

// ── Transcript activity ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    pub id: String,
    pub name: String,
    pub target: Option<String>,
    pub status: ToolStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEntry {
    pub id: String,
    pub agent_type: String,
    pub model: Option<String>,
    pub description: Option<String>,
    pub status: AgentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptActivity {
    pub tools: Vec<ToolEntry>,
    pub agents: Vec<AgentEntry>,
    pub todos: Vec<TodoItem>,
    pub session_start: Option<DateTime<Utc>>,
}

// ── Quota usage ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageData {
    /// `None` for API-key users without a subscription plan.
    pub plan_name: Option<String>,
    pub five_hour: Option<u8>,
    pub seven_day: Option<u8>,
    pub five_hour_reset_at: Option<DateTime<Utc>>,
    pub seven_day_reset_at: Option<DateTime<Utc>>,
    pub api_unavailable: bool,
}

impl UsageData {
    pub fn is_limit_reached(&self) -> bool {
        self.five_hour == Some(100) || self.seven_day == Some(100)
    }
}

// ── Config counts ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigCounts {
    pub claude_md: u32,
    pub rules: u32,
    pub mcps: u32,
    pub hooks: u32,
}

impl ConfigCounts {
    pub fn total(&self) -> u32 {
        self.claude_md + self.rules + self.mcps + self.hooks
    }
}

// ── Render context ──────────────────────────────────────────────────

/// Everything the composer needs for one frame. Built once per run.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub snapshot: SessionSnapshot,
    pub transcript: TranscriptActivity,
    pub counts: ConfigCounts,
    pub session_duration: String,
    pub vcs_status: Option<VcsStatus>,
    pub usage: Option<UsageData>,
    pub extra_label: Option<String>,
    pub config: HudConfig,
    pub now: DateTime<Utc>,
}

impl RenderContext {
    /// A context with no collaborator data, useful as a starting point.
    pub fn new(snapshot: SessionSnapshot, config: HudConfig, now: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            transcript: TranscriptActivity::default(),
            counts: ConfigCounts::default(),
            session_duration: String::new(),
            vcs_status: None,
            usage: None,
            extra_label: None,
            config,
            now,
        }
    }
}
