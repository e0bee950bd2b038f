pub mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::GitError;
use crate::ops;
use crate::ops::flow::{self, CommitPushOutcome};
use crate::ops::RemoteSetup;
use crate::repo;
use crate::repo::types::Queried;
use crate::runner::CommandRunner;
use types::{BranchSelector, EnabledActions, PanelState, RepoFacts, Warning};

/// Gather every inspector fact for a path in one pass. For non-repositories
/// only the process-wide identity is queried.
pub fn gather_facts(runner: &dyn CommandRunner, path: &Path) -> RepoFacts {
    let auth = repo::auth_identity(runner);

    if !repo::is_repository(path) {
        return RepoFacts {
            is_repo: false,
            auth,
            branch: Queried::Missing,
            status: Queried::Missing,
            remote: Queried::Missing,
            has_upstream: false,
            branches: Vec::new(),
        };
    }

    RepoFacts {
        is_repo: true,
        auth,
        branch: repo::current_branch(runner, path),
        status: repo::repo_status(runner, path),
        remote: repo::remote_url(runner, path, "origin"),
        has_upstream: repo::has_upstream(runner, path),
        branches: repo::all_branches(runner, path),
    }
}

/// Pure mapping from inspector facts to UI-facing state.
///
/// Warnings fire only on confirmed absence: an `Unknown` remote (query
/// failure) produces no banner, since "missing" was never established.
pub fn derive_state(facts: &RepoFacts) -> PanelState {
    let mut warnings = Vec::new();
    if !facts.auth.is_configured() {
        warnings.push(Warning::IdentityUnconfigured);
    }

    if !facts.is_repo {
        return PanelState {
            warnings,
            auth: facts.auth.clone(),
            ..PanelState::default()
        };
    }

    if facts.remote.is_missing() {
        warnings.push(Warning::NoRemote);
    } else if facts.remote.is_known() && !facts.has_upstream {
        warnings.push(Warning::NoUpstream);
    }

    let entries: Vec<String> = facts.branches.iter().map(|b| b.name.clone()).collect();
    let selected = facts
        .branch
        .as_known()
        .filter(|name| entries.iter().any(|e| e == *name))
        .cloned();
    let has_branches = !entries.is_empty();
    let selector = BranchSelector {
        entries,
        selected,
        enabled: has_branches,
    };

    PanelState {
        is_repo: true,
        auth: facts.auth.clone(),
        branch: facts.branch.clone(),
        status: facts.status,
        remote: facts.remote.clone(),
        has_upstream: facts.has_upstream,
        selector,
        actions: EnabledActions {
            commit: true,
            push: true,
            pull: true,
            new_branch: has_branches,
            rename_branch: has_branches,
            switch_branch: has_branches,
        },
        warnings,
    }
}

/// What a refresh changed, computed by diff-comparing against the previous
/// state. The UI applies the new state unconditionally but only fires its
/// own notifications for what actually changed; a programmatic refresh that
/// lands on the same selection therefore never re-triggers the
/// branch-switch flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refresh {
    pub changed: bool,
    pub selection_changed: bool,
}

/// Result of the user picking an entry in the branch selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Not a repository (stale UI event); nothing to do.
    Ignored,
    /// The selection already matches the checked-out branch.
    AlreadyCurrent,
    /// A real switch: the UI should confirm before checkout.
    ConfirmSwitch { from: Option<String>, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// User declined; selection was reverted to ground truth.
    Declined,
    Switched { message: String },
    /// Checkout failed; selection was reverted to ground truth.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The current branch could not be determined; nothing was renamed.
    NoCurrentBranch,
    /// New name equals the current name; nothing to do.
    Unchanged,
    Renamed { message: String },
    Failed { message: String },
}

/// Owns the last derived [`PanelState`] and the rule that state is always
/// re-derived wholesale: on navigation and after every mutation attempt,
/// successful or not.
pub struct Presenter {
    runner: Arc<dyn CommandRunner>,
    state: PanelState,
}

impl Presenter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            state: PanelState::default(),
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Re-derive state for `path` from ground truth.
    pub fn refresh(&mut self, path: &Path) -> Refresh {
        let facts = gather_facts(self.runner.as_ref(), path);
        let next = derive_state(&facts);
        let refresh = Refresh {
            changed: next != self.state,
            selection_changed: next.selector.selected != self.state.selector.selected,
        };
        self.state = next;
        refresh
    }

    /// The user picked `name` in the branch selector.
    pub fn select_branch(&self, path: &Path, name: &str) -> SelectionOutcome {
        if name.is_empty() || !repo::is_repository(path) {
            return SelectionOutcome::Ignored;
        }
        let current = repo::current_branch(self.runner.as_ref(), path).known();
        if current.as_deref() == Some(name) {
            return SelectionOutcome::AlreadyCurrent;
        }
        SelectionOutcome::ConfirmSwitch {
            from: current,
            to: name.to_string(),
        }
    }

    /// Complete (or abandon) a confirmed-switch flow. State is re-derived
    /// either way, so a declined or failed switch reverts the selector to
    /// the branch actually checked out.
    pub fn switch_branch(&mut self, path: &Path, branch: &str, confirmed: bool) -> SwitchOutcome {
        if !confirmed {
            info!(branch = %branch, "Branch switch declined");
            self.refresh(path);
            return SwitchOutcome::Declined;
        }

        let result = ops::checkout_branch(self.runner.as_ref(), path, branch);
        self.refresh(path);
        match result {
            Ok(message) => SwitchOutcome::Switched { message },
            Err(err) => SwitchOutcome::Failed {
                message: err.to_string(),
            },
        }
    }

    pub fn create_branch(&mut self, path: &Path, name: &str) -> Result<String, GitError> {
        let result = ops::create_branch(self.runner.as_ref(), path, name);
        self.refresh(path);
        result
    }

    pub fn rename_current_branch(&mut self, path: &Path, new_name: &str) -> RenameOutcome {
        let Some(current) = repo::current_branch(self.runner.as_ref(), path).known() else {
            return RenameOutcome::NoCurrentBranch;
        };
        if current == new_name {
            return RenameOutcome::Unchanged;
        }

        let result = ops::rename_branch(self.runner.as_ref(), path, &current, new_name);
        self.refresh(path);
        match result {
            Ok(message) => RenameOutcome::Renamed { message },
            Err(err) => RenameOutcome::Failed {
                message: err.to_string(),
            },
        }
    }

    pub fn pull(&mut self, path: &Path) -> Result<String, GitError> {
        let result = ops::pull(self.runner.as_ref(), path);
        self.refresh(path);
        result
    }

    pub fn push(&mut self, path: &Path) -> Result<String, GitError> {
        let result = ops::push(self.runner.as_ref(), path);
        self.refresh(path);
        result
    }

    pub fn commit_then_push<F>(
        &mut self,
        path: &Path,
        message: &str,
        stage_all: bool,
        push: bool,
        confirm_set_upstream: F,
    ) -> CommitPushOutcome
    where
        F: FnOnce(&str) -> bool,
    {
        let outcome = flow::commit_then_push(
            self.runner.as_ref(),
            path,
            message,
            stage_all,
            push,
            confirm_set_upstream,
        );
        self.refresh(path);
        outcome
    }

    pub fn add_remote_and_track(
        &mut self,
        path: &Path,
        name: &str,
        url: &str,
        track_current: bool,
    ) -> Result<RemoteSetup, GitError> {
        let result = ops::add_remote_and_track(self.runner.as_ref(), path, name, url, track_current);
        self.refresh(path);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::types::RepoStatusSnapshot;
    use crate::runner::fake::FakeRunner;

    /// Temp directory with a `.git` marker so `is_repository` holds.
    fn repo_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    fn configured_identity(runner: FakeRunner) -> FakeRunner {
        runner
            .ok(&["config", "--global", "user.name"], "Ada\n")
            .ok(&["config", "--global", "user.email"], "ada@example.com\n")
    }

    fn healthy_repo_runner() -> FakeRunner {
        configured_identity(FakeRunner::new())
            .ok(&["branch", "--show-current"], "main\n")
            .ok(&["status", "--porcelain"], " M file.rs\n")
            .ok(&["remote", "get-url", "origin"], "git@host:a/b.git\n")
            .ok(
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
                "origin/main\n",
            )
            .ok(&["branch", "-a"], "* main\n  feature\n  remotes/origin/main\n")
    }

    #[test]
    fn non_repo_disables_everything() {
        let dir = tempfile::tempdir().unwrap();
        let runner = configured_identity(FakeRunner::new());

        let facts = gather_facts(&runner, dir.path());
        assert!(!facts.is_repo);

        let state = derive_state(&facts);
        assert!(!state.is_repo);
        assert_eq!(state.actions, EnabledActions::default());
        assert!(state.selector.entries.is_empty());
        assert!(!state.selector.enabled);
        assert!(state.warnings.is_empty());

        // Only the identity was queried.
        assert!(runner
            .seen()
            .iter()
            .all(|args| args.first().map(String::as_str) == Some("config")));
    }

    #[test]
    fn healthy_repo_enables_actions_and_selects_current() {
        let dir = repo_dir();
        let runner = healthy_repo_runner();

        let state = derive_state(&gather_facts(&runner, dir.path()));
        assert!(state.is_repo);
        assert!(state.actions.commit && state.actions.pull && state.actions.push);
        assert!(state.actions.new_branch && state.actions.rename_branch);
        assert_eq!(state.selector.entries, ["main", "feature"]);
        assert_eq!(state.selector.selected.as_deref(), Some("main"));
        assert!(state.selector.enabled);
        assert_eq!(
            state.status,
            Queried::Known(RepoStatusSnapshot {
                modified: 1,
                added: 0,
                deleted: 0,
                clean: false,
            })
        );
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn missing_remote_warns_but_unknown_does_not() {
        let dir = repo_dir();

        let missing = configured_identity(FakeRunner::new())
            .ok(&["branch", "--show-current"], "main\n")
            .ok(&["status", "--porcelain"], "")
            .fail(&["remote", "get-url", "origin"], 2, "error: No such remote 'origin'")
            .ok(&["branch", "-a"], "* main\n");
        let state = derive_state(&gather_facts(&missing, dir.path()));
        assert!(state.warnings.contains(&Warning::NoRemote));
        assert!(!state.warnings.contains(&Warning::NoUpstream));

        let unknown = configured_identity(FakeRunner::new())
            .ok(&["branch", "--show-current"], "main\n")
            .ok(&["status", "--porcelain"], "")
            .launch_error(&["remote", "get-url", "origin"])
            .ok(&["branch", "-a"], "* main\n");
        let state = derive_state(&gather_facts(&unknown, dir.path()));
        assert!(!state.warnings.contains(&Warning::NoRemote));
    }

    #[test]
    fn remote_without_upstream_warns() {
        let dir = repo_dir();
        let runner = configured_identity(FakeRunner::new())
            .ok(&["branch", "--show-current"], "main\n")
            .ok(&["status", "--porcelain"], "")
            .ok(&["remote", "get-url", "origin"], "git@host:a/b.git\n")
            .fail(
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
                128,
                "fatal: no upstream",
            )
            .ok(&["branch", "-a"], "* main\n");
        let state = derive_state(&gather_facts(&runner, dir.path()));
        assert_eq!(state.warnings, [Warning::NoUpstream]);
    }

    #[test]
    fn unconfigured_identity_warns_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new()
            .fail(&["config", "--global", "user.name"], 1, "")
            .fail(&["config", "--global", "user.email"], 1, "");
        let state = derive_state(&gather_facts(&runner, dir.path()));
        assert_eq!(state.warnings, [Warning::IdentityUnconfigured]);
    }

    #[test]
    fn repeat_refresh_fires_no_notifications() {
        let dir = repo_dir();
        let mut presenter = Presenter::new(Arc::new(healthy_repo_runner()));

        let first = presenter.refresh(dir.path());
        assert!(first.changed);
        assert!(first.selection_changed);

        // Same ground truth: the diff-compare suppresses both notifications.
        let second = presenter.refresh(dir.path());
        assert!(!second.changed);
        assert!(!second.selection_changed);
    }

    #[test]
    fn selecting_current_branch_is_a_no_op() {
        let dir = repo_dir();
        let presenter = Presenter::new(Arc::new(healthy_repo_runner()));
        assert_eq!(
            presenter.select_branch(dir.path(), "main"),
            SelectionOutcome::AlreadyCurrent
        );
        assert_eq!(
            presenter.select_branch(dir.path(), ""),
            SelectionOutcome::Ignored
        );
    }

    #[test]
    fn selecting_other_branch_requests_confirmation() {
        let dir = repo_dir();
        let presenter = Presenter::new(Arc::new(healthy_repo_runner()));
        assert_eq!(
            presenter.select_branch(dir.path(), "feature"),
            SelectionOutcome::ConfirmSwitch {
                from: Some("main".to_string()),
                to: "feature".to_string(),
            }
        );
    }

    #[test]
    fn declined_switch_reverts_selection() {
        let dir = repo_dir();
        let mut presenter = Presenter::new(Arc::new(healthy_repo_runner()));
        presenter.refresh(dir.path());

        let outcome = presenter.switch_branch(dir.path(), "feature", false);
        assert_eq!(outcome, SwitchOutcome::Declined);
        // Ground truth still says main.
        assert_eq!(presenter.state().selector.selected.as_deref(), Some("main"));
    }

    #[test]
    fn failed_switch_reverts_selection_with_diagnostic() {
        let dir = repo_dir();
        let runner = healthy_repo_runner().fail(
            &["checkout", "feature"],
            1,
            "error: Your local changes would be overwritten",
        );
        let mut presenter = Presenter::new(Arc::new(runner));
        presenter.refresh(dir.path());

        let outcome = presenter.switch_branch(dir.path(), "feature", true);
        match outcome {
            SwitchOutcome::Failed { message } => {
                assert!(message.contains("local changes would be overwritten"))
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(presenter.state().selector.selected.as_deref(), Some("main"));
    }

    #[test]
    fn rename_requires_a_known_current_branch() {
        let dir = repo_dir();
        let runner = configured_identity(FakeRunner::new())
            .ok(&["branch", "--show-current"], "")
            .ok(&["status", "--porcelain"], "")
            .ok(&["remote", "get-url", "origin"], "u\n")
            .ok(&["branch", "-a"], "");
        let mut presenter = Presenter::new(Arc::new(runner));
        assert_eq!(
            presenter.rename_current_branch(dir.path(), "trunk"),
            RenameOutcome::NoCurrentBranch
        );
    }

    #[test]
    fn rename_to_same_name_is_unchanged() {
        let dir = repo_dir();
        let mut presenter = Presenter::new(Arc::new(healthy_repo_runner()));
        assert_eq!(
            presenter.rename_current_branch(dir.path(), "main"),
            RenameOutcome::Unchanged
        );
    }

    #[test]
    fn mutations_refresh_even_on_failure() {
        let dir = repo_dir();
        let runner = healthy_repo_runner().fail(&["pull"], 1, "fatal: no tracking information");
        let mut presenter = Presenter::new(Arc::new(runner));

        let err = presenter.pull(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no tracking information"));
        // The failed pull still re-derived state from ground truth.
        assert!(presenter.state().is_repo);
        assert_eq!(presenter.state().selector.selected.as_deref(), Some("main"));
    }

    #[test]
    fn panel_state_serializes_for_the_ui_boundary() {
        let dir = repo_dir();
        let state = derive_state(&gather_facts(&healthy_repo_runner(), dir.path()));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["is_repo"], true);
        assert_eq!(json["selector"]["entries"][0], "main");
        assert_eq!(json["status"]["Known"]["modified"], 1);
    }
}
