use super::{FileStats, JjStatus};

/// Raw stdout of the three jj probes; `None` means the command failed or timed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JjProbe {
    /// `jj log -r @ --no-graph -T 'self.change_id().shortest()'`
    pub change_id: Option<String>,
    /// Space separated bookmark names on `@`.
    pub bookmarks: Option<String>,
    /// `jj status`
    pub status: Option<String>,
}

impl JjProbe {
    /// jj answered with a change id; secondary probes may still have failed.
    pub fn is_usable(&self) -> bool {
        self.change_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

const CONFLICT_MARKER: &str = "(conflict)";

/// Returns `None` when no change id could be read (jj unusable here).
pub fn normalize_jj(probe: JjProbe) -> Option<JjStatus> {
    let change_id = probe.change_id.as_deref().map(str::trim).unwrap_or("");
    if change_id.is_empty() {
        return None;
    }

    let mut bookmarks: Vec<String> = probe
        .bookmarks
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .map(ToString::to_string)
        .collect();

    let parsed = probe
        .status
        .as_deref()
        .map(parse_status)
        .unwrap_or_default();

    let branch = if bookmarks.is_empty() {
        change_id.to_string()
    } else {
        bookmarks.remove(0)
    };

    Some(JjStatus {
        branch,
        labels: bookmarks,
        is_dirty: parsed.dirty,
        has_conflicts: parsed.conflicts,
        file_stats: parsed.dirty.then_some(parsed.stats),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedJjStatus {
    pub dirty: bool,
    pub conflicts: bool,
    pub stats: FileStats,
}

/// Parse `jj status`. File lines look like `M path`; a `(conflict)` anywhere
/// in the text marks the working copy as conflicted.
pub fn parse_status(output: &str) -> ParsedJjStatus {
    let mut parsed = ParsedJjStatus::default();

    for line in output.lines() {
        if line.contains(CONFLICT_MARKER) {
            parsed.conflicts = true;
        }

        let mut chars = line.chars();
        let (Some(code), Some(next)) = (chars.next(), chars.next()) else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }

        let counter = match code {
            'M' => &mut parsed.stats.modified,
            'A' => &mut parsed.stats.added,
            'D' => &mut parsed.stats.deleted,
            '?' => &mut parsed.stats.untracked,
            _ => continue,
        };
        *counter += 1;
        parsed.dirty = true;
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRTY_STATUS: &str = "\
Working copy changes:
M src/file.rs
A new-file.rs
D deleted.rs
? untracked.rs
Working copy : kxqvrmzt 1a2b3c4d (no description set)
Parent commit: zzzzzzzz 00000000 (empty) (no description set)";

    #[test]
    fn parse_status_counts_codes() {
        let parsed = parse_status(DIRTY_STATUS);
        assert!(parsed.dirty);
        assert!(!parsed.conflicts);
        assert_eq!(
            parsed.stats,
            FileStats {
                modified: 1,
                added: 1,
                deleted: 1,
                untracked: 1
            }
        );
    }

    #[test]
    fn parse_status_detects_conflict_marker() {
        let parsed = parse_status("Working copy : abc123 (conflict)\n");
        assert!(parsed.conflicts);
        assert!(!parsed.dirty);
    }

    #[test]
    fn words_starting_with_code_letters_are_not_files() {
        let parsed = parse_status("Merge in progress\nAdded nothing\n");
        assert!(!parsed.dirty);
    }

    #[test]
    fn first_bookmark_is_branch_rest_are_labels() {
        let status = normalize_jj(JjProbe {
            change_id: Some("kxqv\n".to_string()),
            bookmarks: Some("main feature wip\n".to_string()),
            status: Some(DIRTY_STATUS.to_string()),
        })
        .unwrap();
        assert_eq!(status.branch, "main");
        assert_eq!(status.labels, vec!["feature", "wip"]);
        assert!(status.is_dirty);
        assert!(status.file_stats.is_some());
    }

    #[test]
    fn change_id_is_branch_without_bookmarks() {
        let status = normalize_jj(JjProbe {
            change_id: Some("kxqv".to_string()),
            bookmarks: None,
            status: None,
        })
        .unwrap();
        assert_eq!(status.branch, "kxqv");
        assert!(status.labels.is_empty());
        assert!(!status.is_dirty);
        assert!(status.file_stats.is_none());
    }

    #[test]
    fn missing_change_id_is_unusable() {
        assert!(normalize_jj(JjProbe::default()).is_none());
    }
}
