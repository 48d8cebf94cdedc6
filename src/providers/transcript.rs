use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    diagnostics::Diagnostics,
    types::{
        AgentEntry, AgentStatus, TodoItem, TodoStatus, ToolEntry, ToolStatus, TranscriptActivity,
    },
};

const COMMAND_TARGET_MAX: usize = 30;

pub trait TranscriptCollector {
    fn collect_transcript(&self, transcript_path: Option<&str>) -> TranscriptActivity;
}

/// Reads the session's JSONL transcript from disk in a single pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTranscriptCollector {
    diagnostics: Diagnostics,
}

impl FileTranscriptCollector {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }
}

impl TranscriptCollector for FileTranscriptCollector {
    fn collect_transcript(&self, transcript_path: Option<&str>) -> TranscriptActivity {
        let Some(path) = transcript_path.filter(|path| !path.is_empty()) else {
            return TranscriptActivity::default();
        };

        let file = match File::open(Path::new(path)) {
            Ok(file) => file,
            Err(err) => {
                self.diagnostics
                    .debug("transcript", format!("failed to open {path}: {err}"));
                return TranscriptActivity::default();
            }
        };

        let mut parser = TranscriptParser::new(Utc::now());
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => parser.push_line(&line),
                Err(err) => {
                    self.diagnostics
                        .debug("transcript", format!("read error in {path}: {err}"));
                    break;
                }
            }
        }
        parser.finish()
    }
}

#[derive(Debug, Default)]
pub struct StubTranscriptCollector {
    pub activity: TranscriptActivity,
}

impl TranscriptCollector for StubTranscriptCollector {
    fn collect_transcript(&self, _transcript_path: Option<&str>) -> TranscriptActivity {
        self.activity.clone()
    }
}

/// Incremental transcript reducer. Malformed lines are skipped.
#[derive(Debug)]
pub struct TranscriptParser {
    activity: TranscriptActivity,
    fallback_time: DateTime<Utc>,
}

impl TranscriptParser {
    /// `fallback_time` stamps entries whose line has no parseable timestamp.
    pub fn new(fallback_time: DateTime<Utc>) -> Self {
        Self {
            activity: TranscriptActivity::default(),
            fallback_time,
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            return;
        };

        let timestamp = entry
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc));

        if self.activity.session_start.is_none() {
            self.activity.session_start = timestamp;
        }
        let at = timestamp.unwrap_or(self.fallback_time);

        let Some(blocks) = entry
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_array)
        else {
            return;
        };

        for block in blocks {
            match block.get("type").and_then(Value::as_str) {
                Some("tool_use") => self.on_tool_use(block, at),
                Some("tool_result") => self.on_tool_result(block, at),
                _ => {}
            }
        }
    }

    pub fn finish(self) -> TranscriptActivity {
        self.activity
    }

    fn on_tool_use(&mut self, block: &Value, at: DateTime<Utc>) {
        let (Some(id), Some(name)) = (str_field(block, "id"), str_field(block, "name")) else {
            return;
        };
        let input = block.get("input");

        match name.as_str() {
            "Task" => self.activity.agents.push(AgentEntry {
                id,
                agent_type: input
                    .and_then(|input| str_field(input, "subagent_type"))
                    .unwrap_or_else(|| "unknown".to_string()),
                model: input.and_then(|input| str_field(input, "model")),
                description: input.and_then(|input| str_field(input, "description")),
                status: AgentStatus::Running,
                start_time: at,
                end_time: None,
            }),
            "TodoWrite" => {
                if let Some(todos) = input
                    .and_then(|input| input.get("todos"))
                    .and_then(Value::as_array)
                {
                    self.activity.todos = todos.iter().filter_map(todo_item).collect();
                }
            }
            _ => self.activity.tools.push(ToolEntry {
                id,
                target: input.and_then(|input| tool_target(&name, input)),
                name,
                status: ToolStatus::Running,
                start_time: at,
                end_time: None,
            }),
        }
    }

    fn on_tool_result(&mut self, block: &Value, at: DateTime<Utc>) {
        let Some(id) = str_field(block, "tool_use_id") else {
            return;
        };
        let is_error = block
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if let Some(tool) = self.activity.tools.iter_mut().find(|tool| tool.id == id) {
            tool.status = if is_error {
                ToolStatus::Error
            } else {
                ToolStatus::Completed
            };
            tool.end_time = Some(at);
        }

        if let Some(agent) = self.activity.agents.iter_mut().find(|agent| agent.id == id) {
            agent.status = AgentStatus::Completed;
            agent.end_time = Some(at);
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn todo_item(value: &Value) -> Option<TodoItem> {
    let content = str_field(value, "content")?;
    let status = match value.get("status").and_then(Value::as_str) {
        Some("in_progress") => TodoStatus::InProgress,
        Some("completed") => TodoStatus::Completed,
        _ => TodoStatus::Pending,
    };
    Some(TodoItem { content, status })
}

fn tool_target(name: &str, input: &Value) -> Option<String> {
    match name {
        "Read" | "Write" | "Edit" | "MultiEdit" | "NotebookEdit" => {
            str_field(input, "file_path").or_else(|| str_field(input, "path"))
        }
        "Glob" | "Grep" => str_field(input, "pattern"),
        "Bash" => str_field(input, "command").map(|command| {
            if command.chars().count() > COMMAND_TARGET_MAX {
                let head: String = command.chars().take(COMMAND_TARGET_MAX).collect();
                format!("{head}...")
            } else {
                command
            }
        }),
        _ => str_field(input, "file_path")
            .or_else(|| str_field(input, "path"))
            .or_else(|| str_field(input, "pattern")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn parse(lines: &[&str]) -> TranscriptActivity {
        let mut parser = TranscriptParser::new(fallback());
        for line in lines {
            parser.push_line(line);
        }
        parser.finish()
    }

    #[test]
    fn first_timestamp_is_session_start() {
        let activity = parse(&[
            r#"{"timestamp": "2026-01-01T10:00:00Z", "message": {"content": []}}"#,
            r#"{"timestamp": "2026-01-01T10:05:00Z"}"#,
        ]);
        assert_eq!(
            activity.session_start,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn tool_use_then_result_completes_tool() {
        let activity = parse(&[
            r#"{"timestamp": "2026-01-01T10:00:00Z", "message": {"content": [
                {"type": "tool_use", "id": "t1", "name": "Read", "input": {"file_path": "/src/main.rs"}}
            ]}}"#,
            r#"{"timestamp": "2026-01-01T10:00:02Z", "message": {"content": [
                {"type": "tool_result", "tool_use_id": "t1"}
            ]}}"#,
        ]);
        assert_eq!(activity.tools.len(), 1);
        let tool = &activity.tools[0];
        assert_eq!(tool.name, "Read");
        assert_eq!(tool.target.as_deref(), Some("/src/main.rs"));
        assert_eq!(tool.status, ToolStatus::Completed);
        assert!(tool.end_time.is_some());
    }

    #[test]
    fn error_result_marks_tool_error() {
        let activity = parse(&[
            r#"{"message": {"content": [{"type": "tool_use", "id": "t1", "name": "Bash", "input": {"command": "cargo build --release --all-features --workspace"}}]}}"#,
            r#"{"message": {"content": [{"type": "tool_result", "tool_use_id": "t1", "is_error": true}]}}"#,
        ]);
        let tool = &activity.tools[0];
        assert_eq!(tool.status, ToolStatus::Error);
        assert_eq!(
            tool.target.as_deref(),
            Some("cargo build --release --all-fe...")
        );
        assert_eq!(tool.start_time, fallback());
    }

    #[test]
    fn task_creates_agent_and_result_completes_it() {
        let activity = parse(&[
            r#"{"timestamp": "2026-01-01T10:00:00Z", "message": {"content": [
                {"type": "tool_use", "id": "a1", "name": "Task",
                 "input": {"subagent_type": "explore", "model": "haiku", "description": "Find auth code"}}
            ]}}"#,
            r#"{"timestamp": "2026-01-01T10:01:00Z", "message": {"content": [
                {"type": "tool_result", "tool_use_id": "a1"}
            ]}}"#,
        ]);
        assert!(activity.tools.is_empty());
        let agent = &activity.agents[0];
        assert_eq!(agent.agent_type, "explore");
        assert_eq!(agent.model.as_deref(), Some("haiku"));
        assert_eq!(agent.description.as_deref(), Some("Find auth code"));
        assert_eq!(agent.status, AgentStatus::Completed);
    }

    #[test]
    fn todo_write_replaces_list() {
        let activity = parse(&[
            r#"{"message": {"content": [{"type": "tool_use", "id": "x1", "name": "TodoWrite", "input": {"todos": [
                {"content": "old", "status": "pending"}
            ]}}]}}"#,
            r#"{"message": {"content": [{"type": "tool_use", "id": "x2", "name": "TodoWrite", "input": {"todos": [
                {"content": "write tests", "status": "in_progress"},
                {"content": "ship", "status": "completed"}
            ]}}]}}"#,
        ]);
        assert_eq!(activity.todos.len(), 2);
        assert_eq!(activity.todos[0].status, TodoStatus::InProgress);
        assert_eq!(activity.todos[1].status, TodoStatus::Completed);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let activity = parse(&[
            "not json",
            "",
            r#"{"message": {"content": [{"type": "tool_use", "id": "t1", "name": "Grep", "input": {"pattern": "fn main"}}]}}"#,
        ]);
        assert_eq!(activity.tools.len(), 1);
        assert_eq!(activity.tools[0].target.as_deref(), Some("fn main"));
        assert_eq!(activity.tools[0].status, ToolStatus::Running);
    }

    #[test]
    fn missing_file_is_empty_activity() {
        let collector = FileTranscriptCollector::default();
        assert_eq!(
            collector.collect_transcript(Some("/nonexistent/transcript.jsonl")),
            TranscriptActivity::default()
        );
        assert_eq!(collector.collect_transcript(None), TranscriptActivity::default());
    }
}
