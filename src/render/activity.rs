use chrono::{DateTime, Utc};

use crate::types::{
    AgentEntry, AgentStatus, TodoItem, TodoStatus, ToolEntry, ToolStatus, TranscriptActivity,
};

use super::{
    color::{colorize, dim, CYAN, GREEN, MAGENTA, YELLOW},
    fmt::{format_elapsed, truncate, truncate_path},
};

const MAX_RUNNING_TOOLS: usize = 2;
const MAX_COMPLETED_TOOLS: usize = 4;
const TOOL_TARGET_MAX: usize = 20;

const MAX_RECENT_COMPLETED_AGENTS: usize = 2;
const MAX_AGENT_LINES: usize = 3;
const AGENT_DESCRIPTION_MAX: usize = 40;

const TODO_CONTENT_MAX: usize = 50;

/// Running tools first, then the most used finished tools.
/// Example: `◐ Edit: .../main.rs | ✓ Read ×12 | ✓ Bash ×3`
pub fn tools_line(activity: &TranscriptActivity) -> Option<String> {
    let mut parts = Vec::new();

    let running: Vec<&ToolEntry> = activity
        .tools
        .iter()
        .filter(|tool| tool.status == ToolStatus::Running)
        .collect();
    for tool in &running[running.len().saturating_sub(MAX_RUNNING_TOOLS)..] {
        let target = tool
            .target
            .as_deref()
            .map(|target| dim(&format!(": {}", truncate_path(target, TOOL_TARGET_MAX))))
            .unwrap_or_default();
        parts.push(format!(
            "{} {}{target}",
            colorize("◐", YELLOW),
            colorize(&tool.name, CYAN)
        ));
    }

    // (name, count) in first-seen order; the stable sort keeps ties that way.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tool in activity
        .tools
        .iter()
        .filter(|tool| tool.status != ToolStatus::Running)
    {
        match counts.iter_mut().find(|(name, _)| *name == tool.name) {
            Some((_, count)) => *count += 1,
            None => counts.push((tool.name.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    for (name, count) in counts.into_iter().take(MAX_COMPLETED_TOOLS) {
        parts.push(format!(
            "{} {name} {}",
            colorize("✓", GREEN),
            dim(&format!("×{count}"))
        ));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// One line per agent: every running agent plus the two latest finished ones,
/// capped to the last three.
pub fn agent_lines(activity: &TranscriptActivity, now: DateTime<Utc>) -> Vec<String> {
    let running = activity
        .agents
        .iter()
        .filter(|agent| agent.status == AgentStatus::Running);
    let completed: Vec<&AgentEntry> = activity
        .agents
        .iter()
        .filter(|agent| agent.status == AgentStatus::Completed)
        .collect();
    let recent_completed =
        &completed[completed.len().saturating_sub(MAX_RECENT_COMPLETED_AGENTS)..];

    let shown: Vec<&AgentEntry> = running.chain(recent_completed.iter().copied()).collect();
    shown[shown.len().saturating_sub(MAX_AGENT_LINES)..]
        .iter()
        .map(|agent| agent_line(agent, now))
        .collect()
}

fn agent_line(agent: &AgentEntry, now: DateTime<Utc>) -> String {
    let icon = match agent.status {
        AgentStatus::Running => colorize("◐", YELLOW),
        AgentStatus::Completed => colorize("✓", GREEN),
    };
    let model = agent
        .model
        .as_deref()
        .map(|model| dim(&format!(" [{model}]")))
        .unwrap_or_default();
    let description = agent
        .description
        .as_deref()
        .map(|desc| dim(&format!(": {}", truncate(desc, AGENT_DESCRIPTION_MAX))))
        .unwrap_or_default();
    let end = agent.end_time.unwrap_or(now);
    let elapsed = dim(&format!("({})", format_elapsed(agent.start_time, end)));

    format!(
        "{icon} {}{model}{description} {elapsed}",
        colorize(&agent.agent_type, MAGENTA)
    )
}

/// Current in-progress todo with overall progress, or a completion banner.
pub fn todos_line(todos: &[TodoItem]) -> Option<String> {
    if todos.is_empty() {
        return None;
    }

    let total = todos.len();
    let completed = todos
        .iter()
        .filter(|todo| todo.status == TodoStatus::Completed)
        .count();
    let progress = dim(&format!("({completed}/{total})"));

    match todos.iter().find(|todo| todo.status == TodoStatus::InProgress) {
        Some(current) => Some(format!(
            "{} {} {progress}",
            colorize("▸", YELLOW),
            truncate(&current.content, TODO_CONTENT_MAX)
        )),
        None if completed == total => Some(format!(
            "{} All todos complete {progress}",
            colorize("✓", GREEN)
        )),
        None => None,
    }
}
