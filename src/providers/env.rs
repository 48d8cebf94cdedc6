use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{diagnostics::Diagnostics, types::ConfigCounts};

pub trait ConfigCountCollector {
    fn collect_counts(&self, cwd: Option<&str>) -> ConfigCounts;
}

/// Counts CLAUDE.md files, rules, MCP servers and hooks in the user scope
/// (`~/.claude`, `~/.claude.json`) and the project scope (`cwd`).
#[derive(Debug, Clone, Default)]
pub struct FileSystemConfigCounter {
    home: Option<PathBuf>,
    diagnostics: Diagnostics,
}

impl FileSystemConfigCounter {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            home: dirs::home_dir(),
            diagnostics,
        }
    }

    /// Use `home` as the user directory instead of the real one.
    pub fn with_home(home: impl Into<PathBuf>, diagnostics: Diagnostics) -> Self {
        Self {
            home: Some(home.into()),
            diagnostics,
        }
    }
}

impl ConfigCountCollector for FileSystemConfigCounter {
    fn collect_counts(&self, cwd: Option<&str>) -> ConfigCounts {
        let mut counts = ConfigCounts::default();
        let mut user_mcps = BTreeSet::new();
        let mut project_mcps = BTreeSet::new();

        if let Some(home) = self.home.as_deref() {
            let claude_dir = home.join(".claude");
            counts.claude_md += count_existing(&[claude_dir.join("CLAUDE.md")]);
            counts.rules += count_md_files_recursive(&claude_dir.join("rules"));

            let user_settings = claude_dir.join("settings.json");
            user_mcps.extend(self.mcp_server_names(&user_settings));
            counts.hooks += self.hook_count(&user_settings);

            let user_claude_json = home.join(".claude.json");
            user_mcps.extend(self.mcp_server_names(&user_claude_json));
            for name in self.disabled_servers(&user_claude_json, "disabledMcpServers") {
                user_mcps.remove(&name);
            }
        }

        if let Some(cwd) = cwd.filter(|cwd| !cwd.is_empty()) {
            let root = Path::new(cwd);
            let project_claude = root.join(".claude");

            counts.claude_md += count_existing(&[
                root.join("CLAUDE.md"),
                root.join("CLAUDE.local.md"),
                project_claude.join("CLAUDE.md"),
                project_claude.join("CLAUDE.local.md"),
            ]);
            counts.rules += count_md_files_recursive(&project_claude.join("rules"));

            let mut mcp_json_servers = self.mcp_server_names(&root.join(".mcp.json"));

            let project_settings = project_claude.join("settings.json");
            project_mcps.extend(self.mcp_server_names(&project_settings));
            counts.hooks += self.hook_count(&project_settings);

            let local_settings = project_claude.join("settings.local.json");
            project_mcps.extend(self.mcp_server_names(&local_settings));
            counts.hooks += self.hook_count(&local_settings);

            for name in self.disabled_servers(&local_settings, "disabledMcpjsonServers") {
                mcp_json_servers.remove(&name);
            }
            project_mcps.extend(mcp_json_servers);
        }

        // Names dedupe within a scope only; the same server in both scopes counts twice.
        counts.mcps = (user_mcps.len() + project_mcps.len()) as u32;
        counts
    }
}

impl FileSystemConfigCounter {
    fn read_json(&self, path: &Path) -> Option<Value> {
        let text = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                self.diagnostics
                    .debug("config", format!("failed to parse {}: {err}", path.display()));
                None
            }
        }
    }

    fn mcp_server_names(&self, path: &Path) -> BTreeSet<String> {
        self.read_json(path)
            .as_ref()
            .and_then(|value| value.get("mcpServers"))
            .and_then(Value::as_object)
            .map(|servers| servers.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn disabled_servers(&self, path: &Path, key: &str) -> Vec<String> {
        let Some(value) = self.read_json(path) else {
            return Vec::new();
        };
        let Some(entries) = value.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };
        let names: Vec<String> = entries
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect();
        if names.len() != entries.len() {
            self.diagnostics.debug(
                "config",
                format!("{key} in {} contains non-string values", path.display()),
            );
        }
        names
    }

    fn hook_count(&self, path: &Path) -> u32 {
        self.read_json(path)
            .as_ref()
            .and_then(|value| value.get("hooks"))
            .and_then(Value::as_object)
            .map(|hooks| hooks.len() as u32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct StubConfigCountCollector {
    pub counts: ConfigCounts,
}

impl ConfigCountCollector for StubConfigCountCollector {
    fn collect_counts(&self, _cwd: Option<&str>) -> ConfigCounts {
        self.counts
    }
}

fn count_existing(paths: &[PathBuf]) -> u32 {
    paths.iter().filter(|path| path.exists()).count() as u32
}

fn count_md_files_recursive(path: &Path) -> u32 {
    if !path.is_dir() {
        return 0;
    }

    let mut count = 0;
    let mut stack = vec![path.to_path_buf()];

    while let Some(current) = stack.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };

        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                stack.push(entry_path);
            } else if entry_path.is_file()
                && entry_path.extension().is_some_and(|ext| ext == "md")
            {
                count += 1;
            }
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn rules_are_counted_recursively_and_only_md() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules");
        write(&rules.join("a.md"), "");
        write(&rules.join("nested/b.md"), "");
        write(&rules.join("nested/notes.txt"), "");
        assert_eq!(count_md_files_recursive(&rules), 2);
        assert_eq!(count_md_files_recursive(&dir.path().join("missing")), 0);
    }

    #[test]
    fn empty_home_and_no_cwd_count_nothing() {
        let home = tempfile::tempdir().unwrap();
        let counter = FileSystemConfigCounter::with_home(home.path(), Diagnostics::disabled());
        assert_eq!(counter.collect_counts(None), ConfigCounts::default());
    }

    #[test]
    fn stub_returns_preset_counts() {
        let stub = StubConfigCountCollector {
            counts: ConfigCounts {
                rules: 3,
                ..Default::default()
            },
        };
        assert_eq!(stub.collect_counts(Some("/any")).rules, 3);
    }
}
