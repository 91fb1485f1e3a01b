//! Sync error types.

use thiserror::Error;

use crate::models::StudentId;
use crate::remote::RemoteError;

/// Failures surfaced to callers of mutating operations.
///
/// Reads never return these; they degrade to cached or seed data instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Another mutation is still running
    #[error("Another change is still in progress")]
    Busy,

    /// The backend failed and the record is not held locally either
    #[error("Student {id} not found ({cause})")]
    NotFoundLocally {
        id: StudentId,
        #[source]
        cause: RemoteError,
    },
}
