//! One status model for git and jj working copies.
//!
//! Providers run the backend commands and hand the raw stdout here; nothing in
//! this module touches the filesystem or spawns processes.

pub mod git;
pub mod jj;

pub use git::{normalize_git, GitProbe};
pub use jj::{normalize_jj, JjProbe};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    pub modified: u32,
    pub added: u32,
    pub deleted: u32,
    pub untracked: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStatus {
    pub branch: String,
    pub is_dirty: bool,
    pub ahead: u32,
    pub behind: u32,
    pub file_stats: Option<FileStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JjStatus {
    /// First bookmark on `@`, or the short change id when there is none.
    pub branch: String,
    /// Bookmarks after the first one.
    pub labels: Vec<String>,
    pub is_dirty: bool,
    pub has_conflicts: bool,
    pub file_stats: Option<FileStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsStatus {
    Git(GitStatus),
    Jj(JjStatus),
}

impl VcsStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VcsStatus::Git(_) => "git",
            VcsStatus::Jj(_) => "jj",
        }
    }

    pub fn branch(&self) -> &str {
        match self {
            VcsStatus::Git(status) => &status.branch,
            VcsStatus::Jj(status) => &status.branch,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            VcsStatus::Git(status) => status.is_dirty,
            VcsStatus::Jj(status) => status.is_dirty,
        }
    }

    pub fn file_stats(&self) -> Option<&FileStats> {
        match self {
            VcsStatus::Git(status) => status.file_stats.as_ref(),
            VcsStatus::Jj(status) => status.file_stats.as_ref(),
        }
    }
}

/// Pick the backend: jj when its marker exists and its probe is usable,
/// otherwise git, otherwise nothing.
pub fn normalize(
    has_jj_marker: bool,
    jj: Option<JjProbe>,
    git: Option<GitProbe>,
) -> Option<VcsStatus> {
    if has_jj_marker {
        if let Some(status) = jj.and_then(normalize_jj) {
            return Some(VcsStatus::Jj(status));
        }
    }
    git.and_then(normalize_git).map(VcsStatus::Git)
}
