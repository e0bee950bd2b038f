pub mod flow;

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::error::GitError;
use crate::repo;
use crate::runner::{CommandRunner, RunOutput, MUTATE_TIMEOUT, NETWORK_TIMEOUT};

/// Outcome of the add-remote-then-track composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSetup {
    Added { message: String },
    /// The remote was added but upstream tracking could not be set.
    /// Not rolled back; the caller reports partial success.
    AddedTrackingFailed { message: String },
}

fn run_checked(
    runner: &dyn CommandRunner,
    path: &Path,
    args: &[&str],
    timeout: Duration,
    failure: &str,
) -> Result<RunOutput, GitError> {
    let out = runner.run(Some(path), args, timeout)?;
    if !out.success() {
        return Err(GitError::tool(format!("{failure}: {}", out.diagnostic())));
    }
    Ok(out)
}

pub fn add_remote(
    runner: &dyn CommandRunner,
    path: &Path,
    name: &str,
    url: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), remote = %name, url = %url, "Adding remote");
    run_checked(
        runner,
        path,
        &["remote", "add", name, url],
        MUTATE_TIMEOUT,
        "Failed to add remote",
    )?;
    Ok("Remote added successfully".to_string())
}

pub fn set_upstream(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: &str,
    branch: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), remote = %remote, branch = %branch, "Setting upstream");
    let target = format!("{remote}/{branch}");
    run_checked(
        runner,
        path,
        &["branch", "--set-upstream-to", &target],
        MUTATE_TIMEOUT,
        "Failed to set upstream",
    )?;
    Ok("Upstream set successfully".to_string())
}

/// Push and set upstream tracking in one network round trip; used when the
/// branch has no upstream yet.
pub fn push_set_upstream(
    runner: &dyn CommandRunner,
    path: &Path,
    remote: &str,
    branch: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), remote = %remote, branch = %branch, "Pushing with upstream set");
    run_checked(
        runner,
        path,
        &["push", "--set-upstream", remote, branch],
        NETWORK_TIMEOUT,
        "Failed to push and set upstream",
    )?;
    Ok("Push successful and upstream set".to_string())
}

/// Commit staged changes, optionally staging everything first.
/// A staging failure aborts before the commit is attempted.
pub fn commit(
    runner: &dyn CommandRunner,
    path: &Path,
    message: &str,
    stage_all: bool,
) -> Result<String, GitError> {
    info!(path = %path.display(), stage_all, "Committing");
    if stage_all {
        run_checked(
            runner,
            path,
            &["add", "-A"],
            MUTATE_TIMEOUT,
            "Failed to stage files",
        )?;
    }
    run_checked(
        runner,
        path,
        &["commit", "-m", message],
        MUTATE_TIMEOUT,
        "Failed to commit",
    )?;
    Ok("Commit successful".to_string())
}

pub fn push(runner: &dyn CommandRunner, path: &Path) -> Result<String, GitError> {
    info!(path = %path.display(), "Pushing");
    run_checked(runner, path, &["push"], NETWORK_TIMEOUT, "Push failed")?;
    Ok("Push successful".to_string())
}

pub fn pull(runner: &dyn CommandRunner, path: &Path) -> Result<String, GitError> {
    info!(path = %path.display(), "Pulling");
    run_checked(runner, path, &["pull"], NETWORK_TIMEOUT, "Pull failed")?;
    Ok("Pull successful".to_string())
}

pub fn checkout_branch(
    runner: &dyn CommandRunner,
    path: &Path,
    branch: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), branch = %branch, "Checking out branch");
    run_checked(
        runner,
        path,
        &["checkout", branch],
        MUTATE_TIMEOUT,
        "Failed to switch branch",
    )?;
    Ok(format!("Switched to branch '{branch}'"))
}

/// Create a branch and switch to it atomically (`checkout -b`).
pub fn create_branch(
    runner: &dyn CommandRunner,
    path: &Path,
    branch: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), branch = %branch, "Creating branch");
    run_checked(
        runner,
        path,
        &["checkout", "-b", branch],
        MUTATE_TIMEOUT,
        "Failed to create branch",
    )?;
    Ok(format!("Created and switched to branch '{branch}'"))
}

/// Rename a branch. When the branch is not currently checked out, switch to
/// it first; a failed switch aborts the rename. Either way the repository
/// ends up checked out on the renamed branch.
pub fn rename_branch(
    runner: &dyn CommandRunner,
    path: &Path,
    old_name: &str,
    new_name: &str,
) -> Result<String, GitError> {
    info!(path = %path.display(), old = %old_name, new = %new_name, "Renaming branch");

    let on_branch = repo::current_branch(runner, path)
        .known()
        .is_some_and(|current| current == old_name);
    if !on_branch {
        run_checked(
            runner,
            path,
            &["checkout", old_name],
            MUTATE_TIMEOUT,
            "Failed to checkout branch",
        )?;
    }

    run_checked(
        runner,
        path,
        &["branch", "-m", new_name],
        MUTATE_TIMEOUT,
        "Failed to rename branch",
    )?;
    Ok(format!("Branch renamed from '{old_name}' to '{new_name}'"))
}

/// Add a remote and optionally point the current branch's upstream at it.
///
/// A tracking failure after a successful add is partial success, not an
/// error: the remote stays. Tracking is skipped when the current branch
/// cannot be determined.
pub fn add_remote_and_track(
    runner: &dyn CommandRunner,
    path: &Path,
    name: &str,
    url: &str,
    track_current: bool,
) -> Result<RemoteSetup, GitError> {
    let added = add_remote(runner, path, name, url)?;

    if track_current {
        if let Some(branch) = repo::current_branch(runner, path).known() {
            if let Err(err) = set_upstream(runner, path, name, &branch) {
                return Ok(RemoteSetup::AddedTrackingFailed {
                    message: format!("Remote added but failed to set upstream: {err}"),
                });
            }
        }
    }

    Ok(RemoteSetup::Added { message: added })
}
