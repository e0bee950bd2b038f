use serde::Serialize;

use crate::repo::types::{AuthIdentity, BranchInfo, Queried, RepoStatusSnapshot};

/// Warning banners the UI may surface for the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// No remote configured: pushing is impossible until one is added.
    NoRemote,
    /// A remote exists but the current branch tracks nothing.
    NoUpstream,
    /// git user.name / user.email are not both set.
    IdentityUnconfigured,
}

/// Which git affordances the UI should enable for the current path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnabledActions {
    pub commit: bool,
    pub push: bool,
    pub pull: bool,
    pub new_branch: bool,
    pub rename_branch: bool,
    pub switch_branch: bool,
}

/// Branch drop-down contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchSelector {
    pub entries: Vec<String>,
    /// Ground-truth selection; present only when the current branch appears
    /// in `entries`.
    pub selected: Option<String>,
    pub enabled: bool,
}

/// Raw inspector output for one path, gathered in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFacts {
    pub is_repo: bool,
    pub auth: AuthIdentity,
    pub branch: Queried<String>,
    pub status: Queried<RepoStatusSnapshot>,
    pub remote: Queried<String>,
    pub has_upstream: bool,
    pub branches: Vec<BranchInfo>,
}

/// Everything the UI needs to render git state for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub is_repo: bool,
    pub auth: AuthIdentity,
    pub branch: Queried<String>,
    pub status: Queried<RepoStatusSnapshot>,
    pub remote: Queried<String>,
    pub has_upstream: bool,
    pub selector: BranchSelector,
    pub actions: EnabledActions,
    pub warnings: Vec<Warning>,
}

impl Default for PanelState {
    /// Nothing-loaded-yet state, before the first refresh.
    fn default() -> Self {
        Self {
            is_repo: false,
            auth: AuthIdentity::default(),
            branch: Queried::Missing,
            status: Queried::Missing,
            remote: Queried::Missing,
            has_upstream: false,
            selector: BranchSelector::default(),
            actions: EnabledActions::default(),
            warnings: Vec::new(),
        }
    }
}
