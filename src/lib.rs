//! Git status and branch syncing core for a desktop file explorer.
//!
//! The UI shell owns *when* to refresh (navigation, dialog close); this
//! crate owns *how* repository facts are computed and interpreted. All
//! repository access shells out to the `git` executable — there is no
//! object-model or merge logic here.

pub mod error;
pub mod ops;
pub mod presenter;
pub mod repo;
pub mod runner;
pub mod service;

pub use error::GitError;
pub use ops::flow::CommitPushOutcome;
pub use presenter::types::PanelState;
pub use presenter::Presenter;
pub use repo::types::{AuthIdentity, BranchInfo, Queried, RemoteConfig, RepoStatusSnapshot};
pub use runner::{CommandRunner, GitCli, RunOutput};
pub use service::GitService;

use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber for embedding shells that don't bring their
/// own. No-op when a subscriber is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitpanel=info")),
        )
        .try_init();
}
