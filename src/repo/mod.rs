pub mod types;

use std::path::Path;

use tracing::debug;

use crate::runner::{CommandRunner, QUERY_TIMEOUT};
use types::{AuthIdentity, BranchInfo, Queried, RemoteConfig, RepoStatusSnapshot};

/// Check for the repository marker directory. Nonexistent paths are simply
/// not repositories, never an error.
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// Name of the checked-out branch. `Missing` on detached HEAD (git reports
/// success with empty output), `Unknown` when the query fails.
pub fn current_branch(runner: &dyn CommandRunner, path: &Path) -> Queried<String> {
    match runner.run(Some(path), &["branch", "--show-current"], QUERY_TIMEOUT) {
        Ok(out) if out.success() => {
            let name = out.stdout.trim();
            if name.is_empty() {
                Queried::Missing
            } else {
                Queried::Known(name.to_string())
            }
        }
        Ok(out) => {
            debug!(exit = out.exit_code, "branch --show-current failed");
            Queried::Unknown
        }
        Err(err) => {
            debug!(%err, "branch --show-current failed");
            Queried::Unknown
        }
    }
}

/// Working-tree status counts from `git status --porcelain`.
pub fn repo_status(runner: &dyn CommandRunner, path: &Path) -> Queried<RepoStatusSnapshot> {
    match runner.run(Some(path), &["status", "--porcelain"], QUERY_TIMEOUT) {
        Ok(out) if out.success() => Queried::Known(parse_status(&out.stdout)),
        Ok(out) => {
            debug!(exit = out.exit_code, "status --porcelain failed");
            Queried::Unknown
        }
        Err(err) => {
            debug!(%err, "status --porcelain failed");
            Queried::Unknown
        }
    }
}

/// Count short-status lines by their two-character prefix.
///
/// Renames and copies (`R `, `C `) and staged-plus-dirty combinations
/// (`MM`, …) stay uncategorized: they make the tree dirty but bump no
/// counter.
fn parse_status(stdout: &str) -> RepoStatusSnapshot {
    let mut modified = 0u32;
    let mut added = 0u32;
    let mut deleted = 0u32;
    let mut entries = 0u32;
    let mut uncategorized = 0u32;

    for line in stdout.lines() {
        if line.is_empty() {
            continue;
        }
        entries += 1;
        if line.starts_with(" M") || line.starts_with("M ") {
            modified += 1;
        } else if line.starts_with("A ") || line.starts_with("??") {
            added += 1;
        } else if line.starts_with(" D") || line.starts_with("D ") {
            deleted += 1;
        } else {
            uncategorized += 1;
        }
    }

    if uncategorized > 0 {
        debug!(count = uncategorized, "uncategorized status lines");
    }

    RepoStatusSnapshot {
        modified,
        added,
        deleted,
        clean: entries == 0,
    }
}

/// URL of the named remote. Git exits non-zero for "no such remote", which
/// maps to `Missing`; only launch/timeout failures are `Unknown`.
pub fn remote_url(runner: &dyn CommandRunner, path: &Path, remote: &str) -> Queried<String> {
    match runner.run(Some(path), &["remote", "get-url", remote], QUERY_TIMEOUT) {
        Ok(out) if out.success() => {
            let url = out.stdout.trim();
            if url.is_empty() {
                Queried::Missing
            } else {
                Queried::Known(url.to_string())
            }
        }
        Ok(_) => Queried::Missing,
        Err(err) => {
            debug!(%err, remote, "remote get-url failed");
            Queried::Unknown
        }
    }
}

/// All configured remotes as a name → URL mapping, from the fetch lines of
/// `git remote -v`, first-seen deduplicated.
pub fn remotes(runner: &dyn CommandRunner, path: &Path) -> Vec<RemoteConfig> {
    let out = match runner.run(Some(path), &["remote", "-v"], QUERY_TIMEOUT) {
        Ok(out) if out.success() => out,
        _ => return Vec::new(),
    };

    let mut found: Vec<RemoteConfig> = Vec::new();
    for line in out.stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if found.iter().any(|r| r.name == name) {
            continue;
        }
        found.push(RemoteConfig {
            name: name.to_string(),
            url: url.to_string(),
        });
    }
    found
}

/// True iff the current branch resolves a symbolic upstream reference.
pub fn has_upstream(runner: &dyn CommandRunner, path: &Path) -> bool {
    runner
        .run(
            Some(path),
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            QUERY_TIMEOUT,
        )
        .map(|out| out.success() && !out.stdout.trim().is_empty())
        .unwrap_or(false)
}

/// Local branches plus remote-tracking branches from `git branch -a`.
///
/// `remotes/origin/` prefixes are stripped so the selector shows plain
/// names; `HEAD` pseudo-refs and symref arrows are dropped; duplicates keep
/// their first-seen entry.
pub fn all_branches(runner: &dyn CommandRunner, path: &Path) -> Vec<BranchInfo> {
    let out = match runner.run(Some(path), &["branch", "-a"], QUERY_TIMEOUT) {
        Ok(out) if out.success() => out,
        _ => return Vec::new(),
    };
    parse_branches(&out.stdout)
}

fn parse_branches(stdout: &str) -> Vec<BranchInfo> {
    let mut branches: Vec<BranchInfo> = Vec::new();

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_current = trimmed.starts_with("* ");
        let entry = trimmed.trim_start_matches("* ").trim();

        // "* (HEAD detached at abc1234)" and symrefs like
        // "remotes/origin/HEAD -> origin/main" are not branches.
        if entry.starts_with('(') || entry.contains(" -> ") || entry == "HEAD" {
            continue;
        }
        if entry.starts_with("remotes/") && entry.ends_with("/HEAD") {
            continue;
        }

        let is_remote = entry.starts_with("remotes/");
        let name = entry.strip_prefix("remotes/origin/").unwrap_or(entry);

        if branches.iter().any(|b| b.name == name) {
            continue;
        }
        branches.push(BranchInfo {
            name: name.to_string(),
            is_current,
            is_remote,
        });
    }

    branches
}

/// Global author identity, queried fresh each call.
pub fn auth_identity(runner: &dyn CommandRunner) -> AuthIdentity {
    AuthIdentity {
        user_name: global_config(runner, "user.name"),
        user_email: global_config(runner, "user.email"),
    }
}

fn global_config(runner: &dyn CommandRunner, key: &str) -> Option<String> {
    runner
        .run(None, &["config", "--global", key], QUERY_TIMEOUT)
        .ok()
        .filter(|out| out.success())
        .map(|out| out.stdout.trim().to_string())
        .filter(|value| !value.is_empty())
}
