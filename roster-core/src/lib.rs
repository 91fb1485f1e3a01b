//! Roster Core Library
//!
//! Student records, the backend client, the local cache and the
//! offline-first sync controller shared by Roster front ends.

pub mod cache;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;

pub use cache::{CacheError, LocalCache, SnapshotCache};
pub use models::{
    Snapshot, Student, StudentDraft, StudentFilter, StudentId, StudentPatch, StudentStatus,
};
pub use remote::{RemoteConfig, RemoteDataSource, RemoteError, StudentSource, TokenSource};
pub use store::{Action, LoadPhase, StudentState, Store};
pub use sync::{Outcome, QueryOutcome, SyncController, SyncError, SyncOptions};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
