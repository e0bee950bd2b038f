use std::time::Duration;

use serde::Serialize;

/// Failures from driving the external git executable.
///
/// Launch problems (binary missing, permission denied) and timeouts are kept
/// apart from ordinary non-zero exits so callers can message them differently.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} timed out after {timeout:?}")]
    Timeout { args: String, timeout: Duration },

    /// Non-zero exit. The message carries the tool's diagnostic text verbatim.
    #[error("{message}")]
    Tool { message: String },
}

impl GitError {
    pub fn tool(message: impl Into<String>) -> Self {
        GitError::Tool {
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GitError::Timeout { .. })
    }
}

impl Serialize for GitError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
