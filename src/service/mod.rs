use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::GitError;
use crate::ops;
use crate::ops::flow::CommitPushOutcome;
use crate::presenter::types::{PanelState, RepoFacts};
use crate::presenter::{derive_state, gather_facts};
use crate::runner::CommandRunner;

/// Async facade over the blocking core for UI shells that keep git work off
/// their event loop.
///
/// Calls are serialized per repository: an operation holds that repo's lock
/// until its git process has fully exited, so a status refresh issued after
/// a mutation always observes the mutation's effects. Different
/// repositories proceed independently.
pub struct GitService {
    runner: Arc<dyn CommandRunner>,
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl GitService {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn repo_lock(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn blocking<T, F>(&self, path: PathBuf, job: F) -> Result<T, GitError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CommandRunner, &Path) -> Result<T, GitError> + Send + 'static,
    {
        let lock = self.repo_lock(&path);
        let _guard = lock.lock().await;
        let runner = self.runner.clone();
        tokio::task::spawn_blocking(move || job(runner.as_ref(), &path))
            .await
            .map_err(|e| GitError::tool(e.to_string()))?
    }

    /// Fresh inspector facts for a path, ready for [`derive_state`].
    pub async fn facts(&self, path: PathBuf) -> Result<RepoFacts, GitError> {
        self.blocking(path, |runner, path| Ok(gather_facts(runner, path)))
            .await
    }

    /// Facts and derived UI state in one round trip.
    pub async fn panel_state(&self, path: PathBuf) -> Result<PanelState, GitError> {
        self.blocking(path, |runner, path| {
            Ok(derive_state(&gather_facts(runner, path)))
        })
        .await
    }

    pub async fn commit(
        &self,
        path: PathBuf,
        message: String,
        stage_all: bool,
    ) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::commit(runner, path, &message, stage_all)
        })
        .await
    }

    /// The commit dialog flow. The upstream decision must be made up front
    /// (`set_upstream_if_missing`) since there is no user to ask mid-call;
    /// shells that want to prompt should use the synchronous
    /// [`Presenter`](crate::presenter::Presenter) flow instead.
    pub async fn commit_then_push(
        &self,
        path: PathBuf,
        message: String,
        stage_all: bool,
        push: bool,
        set_upstream_if_missing: bool,
    ) -> Result<CommitPushOutcome, GitError> {
        self.blocking(path, move |runner, path| {
            Ok(ops::flow::commit_then_push(
                runner,
                path,
                &message,
                stage_all,
                push,
                |_| set_upstream_if_missing,
            ))
        })
        .await
    }

    pub async fn push(&self, path: PathBuf) -> Result<String, GitError> {
        self.blocking(path, |runner, path| ops::push(runner, path)).await
    }

    pub async fn pull(&self, path: PathBuf) -> Result<String, GitError> {
        self.blocking(path, |runner, path| ops::pull(runner, path)).await
    }

    pub async fn checkout_branch(&self, path: PathBuf, branch: String) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::checkout_branch(runner, path, &branch)
        })
        .await
    }

    pub async fn create_branch(&self, path: PathBuf, branch: String) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::create_branch(runner, path, &branch)
        })
        .await
    }

    pub async fn rename_branch(
        &self,
        path: PathBuf,
        old_name: String,
        new_name: String,
    ) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::rename_branch(runner, path, &old_name, &new_name)
        })
        .await
    }

    pub async fn add_remote(
        &self,
        path: PathBuf,
        name: String,
        url: String,
    ) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::add_remote(runner, path, &name, &url)
        })
        .await
    }

    pub async fn set_upstream(
        &self,
        path: PathBuf,
        remote: String,
        branch: String,
    ) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::set_upstream(runner, path, &remote, &branch)
        })
        .await
    }

    pub async fn push_set_upstream(
        &self,
        path: PathBuf,
        remote: String,
        branch: String,
    ) -> Result<String, GitError> {
        self.blocking(path, move |runner, path| {
            ops::push_set_upstream(runner, path, &remote, &branch)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::FakeRunner;

    #[tokio::test]
    async fn repo_locks_are_shared_per_path_only() {
        let service = GitService::new(Arc::new(FakeRunner::new()));
        let a1 = service.repo_lock(Path::new("/a"));
        let a2 = service.repo_lock(Path::new("/a"));
        let b = service.repo_lock(Path::new("/b"));
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[tokio::test]
    async fn refresh_after_mutation_observes_its_effects() {
        // The fake flips no real state, but ordering is observable through
        // the call log: the status query must come after the commit's
        // processes have run.
        let runner = Arc::new(
            FakeRunner::new()
                .ok(&["add", "-A"], "")
                .ok(&["commit", "-m", "msg"], "")
                .ok(&["config", "--global", "user.name"], "Ada\n")
                .ok(&["config", "--global", "user.email"], "ada@example.com\n"),
        );
        let service = GitService::new(runner.clone());

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let path = dir.path().to_path_buf();

        service
            .commit(path.clone(), "msg".to_string(), true)
            .await
            .unwrap();
        let facts = service.facts(path).await.unwrap();
        assert!(facts.is_repo);

        let seen = runner.seen();
        let commit_at = seen
            .iter()
            .position(|args| args.first().map(String::as_str) == Some("commit"))
            .unwrap();
        let status_at = seen
            .iter()
            .position(|args| args.first().map(String::as_str) == Some("status"))
            .unwrap();
        assert!(commit_at < status_at);
    }

    #[tokio::test]
    async fn mutation_failures_pass_through() {
        let runner = Arc::new(FakeRunner::new().fail(&["pull"], 1, "fatal: no remote"));
        let service = GitService::new(runner);
        let err = service.pull(PathBuf::from("/repo")).await.unwrap_err();
        assert!(err.to_string().contains("no remote"));
    }
}
