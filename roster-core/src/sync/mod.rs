//! Offline-first orchestration of remote calls, cache and state.

mod controller;
mod error;
pub mod seed;

pub use controller::{
    Outcome, QueryOutcome, SyncController, SyncOptions, CREATED_OFFLINE, DEFAULT_PAGE_SIZE,
    DELETED_OFFLINE, LOCAL_FILTER_ONLY, LOCAL_SEARCH_ONLY, MODIFIED_OFFLINE, NOT_FOUND,
    OFFLINE_CACHED,
};
pub use error::SyncError;
