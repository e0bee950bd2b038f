use std::fmt;

use serde::Serialize;

/// Outcome of a read-only repository query.
///
/// `Missing` means the tool confirmed there is no value (detached HEAD, no
/// such remote); `Unknown` means the query itself failed. The UI messages
/// the two differently, so they must not collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Queried<T> {
    Known(T),
    Missing,
    Unknown,
}

impl<T> Queried<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Queried::Known(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Queried::Missing)
    }

    pub fn known(self) -> Option<T> {
        match self {
            Queried::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Queried::Known(value) => Some(value),
            _ => None,
        }
    }
}

/// Working-tree change counts from one short-status pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepoStatusSnapshot {
    pub modified: u32,
    pub added: u32,
    pub deleted: u32,
    /// True only when the status output had no entries at all.
    pub clean: bool,
}

impl fmt::Display for RepoStatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M:{} A:{} D:{}", self.modified, self.added, self.deleted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    pub is_current: bool,
    pub is_remote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteConfig {
    pub name: String,
    pub url: String,
}

/// Global git author identity. Process-wide, re-queried on demand since it
/// can change underneath us via external config edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl AuthIdentity {
    /// Both name and email present and non-empty.
    pub fn is_configured(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.user_name) && filled(&self.user_email)
    }
}
