use std::{fs, path::Path, process::Command};

use cc_hud::{
    providers::{LocalVcsCollector, VcsCollector},
    vcs::VcsStatus,
};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(["-c", "user.name=hud", "-c", "user.email=hud@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn plain_directory_has_no_status() {
    let dir = tempfile::tempdir().unwrap();
    let collector = LocalVcsCollector::default();
    let cwd = dir.path().to_str().unwrap();
    assert!(collector.collect_vcs(Some(cwd)).await.is_none());
}

#[tokio::test]
async fn missing_directory_has_no_status() {
    let collector = LocalVcsCollector::default();
    assert!(collector
        .collect_vcs(Some("/definitely/not/a/real/dir"))
        .await
        .is_none());
}

#[tokio::test]
async fn broken_jj_marker_falls_back_to_nothing_outside_git() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".jj")).unwrap();
    let collector = LocalVcsCollector::default();
    let cwd = dir.path().to_str().unwrap();
    assert!(collector.collect_vcs(Some(cwd)).await.is_none());
}

#[tokio::test]
async fn git_repository_reports_branch_and_untracked_files() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q", "-b", "main"])
        || !git(root, &["commit", "-q", "--allow-empty", "-m", "init"])
    {
        return;
    }
    fs::write(root.join("notes.txt"), "hello").unwrap();

    let status = LocalVcsCollector::default()
        .collect_vcs(Some(root.to_str().unwrap()))
        .await
        .expect("git status");

    let git_status = match status {
        VcsStatus::Git(git_status) => git_status,
        other => panic!("expected git status, got {other:?}"),
    };
    assert_eq!(git_status.branch, "main");
    assert!(git_status.is_dirty);
    assert_eq!(git_status.ahead, 0);
    assert_eq!(git_status.behind, 0);
    assert_eq!(git_status.file_stats.unwrap().untracked, 1);
}

#[tokio::test]
async fn clean_git_repository_is_not_dirty() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q", "-b", "trunk"])
        || !git(root, &["commit", "-q", "--allow-empty", "-m", "init"])
    {
        return;
    }

    let status = LocalVcsCollector::default()
        .collect_vcs(Some(root.to_str().unwrap()))
        .await
        .expect("git status");
    assert_eq!(status.label(), "git");
    assert_eq!(status.branch(), "trunk");
    assert!(!status.is_dirty());
    assert!(status.file_stats().is_none());
}
