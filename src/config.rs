use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::{Table, Value};

use crate::diagnostics::Diagnostics;

// ── Resolved config (what every component reads) ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLayout {
    Compact,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocompactBuffer {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudConfig {
    pub line_layout: LineLayout,
    pub show_separators: bool,
    /// Number of trailing cwd segments to show, always 1..=3.
    pub path_levels: u8,
    pub vcs: VcsDisplayConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VcsDisplayConfig {
    pub enabled: bool,
    pub show_dirty: bool,
    pub show_ahead_behind: bool,
    pub show_file_stats: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayConfig {
    pub show_model: bool,
    pub show_context_bar: bool,
    pub show_config_counts: bool,
    pub show_duration: bool,
    pub show_token_breakdown: bool,
    pub show_usage: bool,
    pub usage_bar_enabled: bool,
    pub show_tools: bool,
    pub show_agents: bool,
    pub show_todos: bool,
    pub autocompact_buffer: AutocompactBuffer,
    pub usage_threshold: u8,
    pub environment_threshold: u8,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            line_layout: LineLayout::Expanded,
            show_separators: false,
            path_levels: 1,
            vcs: VcsDisplayConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for VcsDisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_dirty: true,
            show_ahead_behind: false,
            show_file_stats: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_model: true,
            show_context_bar: true,
            show_config_counts: true,
            show_duration: true,
            show_token_breakdown: true,
            show_usage: true,
            usage_bar_enabled: true,
            show_tools: true,
            show_agents: true,
            show_todos: true,
            autocompact_buffer: AutocompactBuffer::Enabled,
            usage_threshold: 0,
            environment_threshold: 0,
        }
    }
}

// ── Legacy migrations ───────────────────────────────────────────────

/// A pure rewrite of an on-disk table from an older shape to the current one.
pub type Migration = fn(&mut Table);

/// Applied in order before resolution. Append new adapters at the end.
pub const MIGRATIONS: &[Migration] = &[migrate_flat_layout, migrate_git_status_section];

/// `layout = "default" | "separators"` became `line_layout` + `show_separators`.
/// Old configs always rendered the single-line layout.
fn migrate_flat_layout(table: &mut Table) {
    if table.contains_key("line_layout") {
        table.remove("layout");
        return;
    }
    let Some(legacy) = table.remove("layout") else {
        return;
    };
    let separators = legacy.as_str() == Some("separators");
    table.insert("line_layout".into(), Value::String("compact".into()));
    if !table.contains_key("show_separators") {
        table.insert("show_separators".into(), Value::Boolean(separators));
    }
}

/// The VCS section was called `[git_status]` before jj support.
fn migrate_git_status_section(table: &mut Table) {
    if table.contains_key("vcs") {
        return;
    }
    if let Some(section) = table.remove("git_status") {
        table.insert("vcs".into(), section);
    }
}

pub fn apply_migrations(table: &mut Table) {
    for migration in MIGRATIONS {
        migration(table);
    }
}

// ── Resolution ──────────────────────────────────────────────────────

fn bool_or(table: Option<&Table>, key: &str, default: bool) -> bool {
    table
        .and_then(|t| t.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

fn threshold(table: Option<&Table>, key: &str, max: u8) -> u8 {
    let value = table.and_then(|t| t.get(key));
    let number = match value {
        Some(Value::Integer(n)) => *n as f64,
        Some(Value::Float(f)) if f.is_finite() => *f,
        _ => return 0,
    };
    number.clamp(0.0, max as f64).round() as u8
}

/// Turn a migrated table into a fully-populated config. Each field falls back
/// to its default independently.
pub fn resolve(table: &Table) -> HudConfig {
    let defaults = HudConfig::default();
    let root = Some(table);
    let vcs = table.get("vcs").and_then(Value::as_table);
    let display = table.get("display").and_then(Value::as_table);

    let line_layout = match table.get("line_layout").and_then(Value::as_str) {
        Some("compact") => LineLayout::Compact,
        Some("expanded") => LineLayout::Expanded,
        _ => defaults.line_layout,
    };

    let path_levels = match table.get("path_levels").and_then(Value::as_integer) {
        Some(n @ 1..=3) => n as u8,
        _ => defaults.path_levels,
    };

    let autocompact_buffer = match display
        .and_then(|d| d.get("autocompact_buffer"))
        .and_then(Value::as_str)
    {
        Some("enabled") => AutocompactBuffer::Enabled,
        Some("disabled") => AutocompactBuffer::Disabled,
        _ => defaults.display.autocompact_buffer,
    };

    let dv = &defaults.display;
    let gv = &defaults.vcs;

    HudConfig {
        line_layout,
        show_separators: bool_or(root, "show_separators", defaults.show_separators),
        path_levels,
        vcs: VcsDisplayConfig {
            enabled: bool_or(vcs, "enabled", gv.enabled),
            show_dirty: bool_or(vcs, "show_dirty", gv.show_dirty),
            show_ahead_behind: bool_or(vcs, "show_ahead_behind", gv.show_ahead_behind),
            show_file_stats: bool_or(vcs, "show_file_stats", gv.show_file_stats),
        },
        display: DisplayConfig {
            show_model: bool_or(display, "show_model", dv.show_model),
            show_context_bar: bool_or(display, "show_context_bar", dv.show_context_bar),
            show_config_counts: bool_or(display, "show_config_counts", dv.show_config_counts),
            show_duration: bool_or(display, "show_duration", dv.show_duration),
            show_token_breakdown: bool_or(
                display,
                "show_token_breakdown",
                dv.show_token_breakdown,
            ),
            show_usage: bool_or(display, "show_usage", dv.show_usage),
            usage_bar_enabled: bool_or(display, "usage_bar_enabled", dv.usage_bar_enabled),
            show_tools: bool_or(display, "show_tools", dv.show_tools),
            show_agents: bool_or(display, "show_agents", dv.show_agents),
            show_todos: bool_or(display, "show_todos", dv.show_todos),
            autocompact_buffer,
            usage_threshold: threshold(display, "usage_threshold", 100),
            environment_threshold: threshold(display, "environment_threshold", 100),
        },
    }
}

/// Parse, migrate and resolve config text.
pub fn parse_config(contents: &str) -> Result<HudConfig, toml::de::Error> {
    let mut table: Table = toml::from_str(contents)?;
    apply_migrations(&mut table);
    Ok(resolve(&table))
}

// ── Loading ─────────────────────────────────────────────────────────

/// Returns `~/.claude/plugins/cc-hud/config.toml`
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
        .join("plugins")
        .join("cc-hud")
        .join("config.toml")
}

/// Load config from disk, falling back to defaults if the file is missing or invalid.
pub fn load_config(path: &Path, diagnostics: &Diagnostics) -> HudConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return HudConfig::default(),
    };
    parse_config(&contents).unwrap_or_else(|err| {
        diagnostics.debug(
            "config",
            format!("invalid config {}: {err}", path.display()),
        );
        HudConfig::default()
    })
}

/// Generate the default config file content.
pub fn default_config_toml() -> &'static str {
    r#"line_layout = "expanded"     # expanded | compact
show_separators = false      # compact layout only
path_levels = 1              # 1 | 2 | 3

[vcs]
enabled = true
show_dirty = true
show_ahead_behind = false
show_file_stats = false

[display]
show_model = true
show_context_bar = true
show_config_counts = true
show_duration = true
show_token_breakdown = true
show_usage = true
usage_bar_enabled = true
show_tools = true
show_agents = true
show_todos = true
autocompact_buffer = "enabled" # enabled | disabled
usage_threshold = 0            # 0-100, hide quota below this
environment_threshold = 0      # hide config counts when their sum is below this
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        assert_eq!(parse_config("").unwrap(), HudConfig::default());
    }

    #[test]
    fn default_config_toml_round_trips_to_defaults() {
        assert_eq!(
            parse_config(default_config_toml()).unwrap(),
            HudConfig::default()
        );
    }

    #[test]
    fn legacy_separators_layout_migrates() {
        let config = parse_config(r#"layout = "separators""#).unwrap();
        assert_eq!(config.line_layout, LineLayout::Compact);
        assert!(config.show_separators);
    }

    #[test]
    fn legacy_default_layout_migrates_without_separators() {
        let config = parse_config(r#"layout = "default""#).unwrap();
        assert_eq!(config.line_layout, LineLayout::Compact);
        assert!(!config.show_separators);
    }

    #[test]
    fn new_layout_key_wins_over_legacy() {
        let config = parse_config(
            r#"
layout = "separators"
line_layout = "expanded"
"#,
        )
        .unwrap();
        assert_eq!(config.line_layout, LineLayout::Expanded);
        assert!(!config.show_separators);
    }

    #[test]
    fn legacy_git_status_section_migrates() {
        let config = parse_config(
            r#"
[git_status]
show_ahead_behind = true
"#,
        )
        .unwrap();
        assert!(config.vcs.show_ahead_behind);
        assert!(config.vcs.enabled);
    }

    #[test]
    fn invalid_values_fall_back_per_field() {
        let config = parse_config(
            r#"
line_layout = "sideways"
path_levels = 7

[display]
show_model = "yes"
show_tools = false
autocompact_buffer = "sometimes"
"#,
        )
        .unwrap();
        assert_eq!(config.line_layout, LineLayout::Expanded);
        assert_eq!(config.path_levels, 1);
        assert!(config.display.show_model);
        assert!(!config.display.show_tools);
        assert_eq!(config.display.autocompact_buffer, AutocompactBuffer::Enabled);
    }

    #[test]
    fn thresholds_are_clamped() {
        let config = parse_config(
            r#"
[display]
usage_threshold = 150
environment_threshold = -5
"#,
        )
        .unwrap();
        assert_eq!(config.display.usage_threshold, 100);
        assert_eq!(config.display.environment_threshold, 0);
    }

    #[test]
    fn non_numeric_threshold_is_zero() {
        let config = parse_config(
            r#"
[display]
usage_threshold = "high"
"#,
        )
        .unwrap();
        assert_eq!(config.display.usage_threshold, 0);
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut table: Table = toml::from_str(r#"layout = "separators""#).unwrap();
        apply_migrations(&mut table);
        let once = table.clone();
        apply_migrations(&mut table);
        assert_eq!(table, once);
    }
}
