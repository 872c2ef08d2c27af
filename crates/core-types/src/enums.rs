use serde::{Deserialize, Serialize};
use std::fmt;

/// The coarse category of a failed operation.
///
/// Store-level errors are mapped onto one of these so the HTTP layer can pick a
/// status code without knowing anything about the database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The caller sent an identifier or body that does not pass validation.
    Invalid,
    /// The addressed row does not exist.
    NotFound,
    /// The statement violated a constraint of the store.
    Conflict,
    /// The store could not be reached in time (unreachable, pool exhausted, deadline hit).
    Unavailable,
    /// Anything else.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Invalid => "invalid",
            FailureKind::NotFound => "not_found",
            FailureKind::Conflict => "conflict",
            FailureKind::Unavailable => "unavailable",
            FailureKind::Internal => "internal",
        }
    }

    /// Returns true for failures that may succeed when retried later.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Unavailable)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
