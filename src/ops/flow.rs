//! Commit-then-push sequencing.
//!
//! Drives the Editing → Committing → Committed → Pushing progression for the
//! commit dialog. A failed push after a successful commit is partial
//! success: the commit stays, and the outcome says so explicitly.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::ops;
use crate::repo;
use crate::runner::CommandRunner;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommitPushOutcome {
    /// The commit step failed; nothing was pushed.
    CommitFailed { message: String },
    /// Committed, no push requested.
    Committed { message: String },
    /// Committed, but the requested push failed. The commit is not rolled
    /// back.
    PushFailed { commit: String, push: String },
    /// Committed and pushed.
    Pushed {
        message: String,
        upstream_set: bool,
    },
}

/// Run the commit and, when requested, the follow-up push.
///
/// When the branch has no upstream yet, `confirm_set_upstream` is asked
/// (with the branch name) whether to push with `--set-upstream`; declining
/// falls back to a plain push, matching the commit dialog's choices. The
/// callback is only invoked in that no-upstream case.
pub fn commit_then_push<F>(
    runner: &dyn CommandRunner,
    path: &Path,
    message: &str,
    stage_all: bool,
    push: bool,
    confirm_set_upstream: F,
) -> CommitPushOutcome
where
    F: FnOnce(&str) -> bool,
{
    let committed = match ops::commit(runner, path, message, stage_all) {
        Ok(outcome) => outcome,
        Err(err) => {
            return CommitPushOutcome::CommitFailed {
                message: err.to_string(),
            }
        }
    };

    if !push {
        return CommitPushOutcome::Committed { message: committed };
    }

    if repo::has_upstream(runner, path) {
        return finish(committed, ops::push(runner, path), false);
    }

    match repo::current_branch(runner, path).known() {
        Some(branch) => {
            if confirm_set_upstream(&branch) {
                info!(branch = %branch, "No upstream, pushing with --set-upstream");
                finish(
                    committed,
                    ops::push_set_upstream(runner, path, "origin", &branch),
                    true,
                )
            } else {
                // Declined: attempt a plain push and let git's own
                // diagnostic surface.
                finish(committed, ops::push(runner, path), false)
            }
        }
        None => finish(committed, ops::push(runner, path), false),
    }
}

fn finish(
    committed: String,
    pushed: Result<String, crate::error::GitError>,
    upstream_set: bool,
) -> CommitPushOutcome {
    match pushed {
        Ok(message) => CommitPushOutcome::Pushed {
            message,
            upstream_set,
        },
        Err(err) => CommitPushOutcome::PushFailed {
            commit: committed,
            push: err.to_string(),
        },
    }
}
