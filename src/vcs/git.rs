use super::{FileStats, GitStatus};

/// Raw stdout of the three git probes; `None` means the command failed or timed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitProbe {
    /// `git rev-parse --abbrev-ref HEAD`
    pub branch: Option<String>,
    /// `git --no-optional-locks status --porcelain`
    pub status: Option<String>,
    /// `git rev-list --left-right --count @{upstream}...HEAD`
    pub rev_list: Option<String>,
}

/// Returns `None` when there is no usable branch (not a repository).
pub fn normalize_git(probe: GitProbe) -> Option<GitStatus> {
    let branch = probe.branch.as_deref().map(str::trim).unwrap_or("");
    if branch.is_empty() {
        return None;
    }

    let status = probe.status.as_deref().map(str::trim).unwrap_or("");
    let is_dirty = !status.is_empty();
    let file_stats = is_dirty.then(|| parse_porcelain(status));

    let (ahead, behind) = probe
        .rev_list
        .as_deref()
        .map(parse_ahead_behind)
        .unwrap_or((0, 0));

    Some(GitStatus {
        branch: branch.to_string(),
        is_dirty,
        ahead,
        behind,
        file_stats,
    })
}

/// Count `git status --porcelain` (v1) entries by their `XY` code.
/// Each file counts once: untracked, then added, deleted, modified.
pub fn parse_porcelain(output: &str) -> FileStats {
    let mut stats = FileStats::default();

    for line in output.lines().filter(|line| !line.is_empty()) {
        let mut codes = line.chars();
        let (Some(index), Some(worktree)) = (codes.next(), codes.next()) else {
            continue;
        };

        if index == '?' && worktree == '?' {
            stats.untracked += 1;
        } else if index == 'A' {
            stats.added += 1;
        } else if index == 'D' || worktree == 'D' {
            stats.deleted += 1;
        } else if index == 'M' || worktree == 'M' || index == 'R' || index == 'C' {
            stats.modified += 1;
        }
    }

    stats
}

/// `rev-list --left-right --count @{upstream}...HEAD` prints `<behind>\t<ahead>`.
/// Returns `(ahead, behind)`; anything unexpected is `(0, 0)`.
pub fn parse_ahead_behind(output: &str) -> (u32, u32) {
    let parts: Vec<&str> = output.split_whitespace().collect();
    if parts.len() != 2 {
        return (0, 0);
    }
    let behind = parts[0].parse().unwrap_or(0);
    let ahead = parts[1].parse().unwrap_or(0);
    (ahead, behind)
}
