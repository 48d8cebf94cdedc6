use std::{path::Path, process::Stdio, time::Duration};

use tokio::process::Command;

use crate::{
    diagnostics::Diagnostics,
    vcs::{self, GitProbe, JjProbe, VcsStatus},
};

const GIT_TIMEOUT: Duration = Duration::from_secs(1);
const JJ_CHANGE_ID_TIMEOUT: Duration = Duration::from_secs(2);
const JJ_TIMEOUT: Duration = Duration::from_secs(1);

const JJ_BOOKMARKS_TEMPLATE: &str = r#"self.bookmarks().map(|b| b.name()).join(" ")"#;

#[allow(async_fn_in_trait)]
pub trait VcsCollector {
    async fn collect_vcs(&self, cwd: Option<&str>) -> Option<VcsStatus>;
}

/// Runs the real `git` / `jj` binaries in the session's working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalVcsCollector {
    diagnostics: Diagnostics,
}

impl LocalVcsCollector {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    async fn probe_git(&self, dir: &Path) -> GitProbe {
        let branch = self
            .run("git", &["rev-parse", "--abbrev-ref", "HEAD"], dir, GIT_TIMEOUT)
            .await;
        if branch.is_none() {
            return GitProbe::default();
        }

        let status = self
            .run(
                "git",
                &["--no-optional-locks", "status", "--porcelain"],
                dir,
                GIT_TIMEOUT,
            )
            .await;
        let rev_list = self
            .run(
                "git",
                &["rev-list", "--left-right", "--count", "@{upstream}...HEAD"],
                dir,
                GIT_TIMEOUT,
            )
            .await;

        GitProbe {
            branch,
            status,
            rev_list,
        }
    }

    async fn probe_jj(&self, dir: &Path) -> JjProbe {
        let change_id = self
            .run(
                "jj",
                &["log", "-r", "@", "--no-graph", "-T", "self.change_id().shortest()"],
                dir,
                JJ_CHANGE_ID_TIMEOUT,
            )
            .await;
        let probe = JjProbe {
            change_id,
            ..Default::default()
        };
        if !probe.is_usable() {
            return probe;
        }

        let bookmarks = self
            .run(
                "jj",
                &["log", "-r", "@", "--no-graph", "-T", JJ_BOOKMARKS_TEMPLATE],
                dir,
                JJ_TIMEOUT,
            )
            .await;
        let status = self.run("jj", &["status"], dir, JJ_TIMEOUT).await;

        JjProbe {
            bookmarks,
            status,
            ..probe
        }
    }

    /// Stdout of a successful run, `None` on spawn failure, non-zero exit or timeout.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        dir: &Path,
        limit: Duration,
    ) -> Option<String> {
        let child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(limit, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                self.diagnostics
                    .debug("vcs", format!("{program} {}: {err}", args.join(" ")));
                return None;
            }
            Err(_) => {
                self.diagnostics.debug(
                    "vcs",
                    format!("{program} {} timed out after {limit:?}", args.join(" ")),
                );
                return None;
            }
        };

        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VcsCollector for LocalVcsCollector {
    async fn collect_vcs(&self, cwd: Option<&str>) -> Option<VcsStatus> {
        let dir = Path::new(cwd.filter(|cwd| !cwd.is_empty())?);
        let has_jj_marker = dir.join(".jj").exists();

        let jj = if has_jj_marker {
            Some(self.probe_jj(dir).await)
        } else {
            None
        };

        let jj_usable = jj.as_ref().is_some_and(JjProbe::is_usable);
        let git = if jj_usable {
            None
        } else {
            Some(self.probe_git(dir).await)
        };

        let status = vcs::normalize(has_jj_marker, jj, git);
        if let Some(status) = &status {
            self.diagnostics.debug(
                "vcs",
                format!("{} on {}", status.label(), status.branch()),
            );
        }
        status
    }
}

#[derive(Debug, Default)]
pub struct StubVcsCollector {
    pub status: Option<VcsStatus>,
}

impl VcsCollector for StubVcsCollector {
    async fn collect_vcs(&self, _cwd: Option<&str>) -> Option<VcsStatus> {
        self.status.clone()
    }
}
