//! HTTP access to the student backend.
//!
//! The backend speaks the paginated JSON dialect:
//!
//! - `GET /students?page=&size=`, `GET /students?search=&page=&size=` and
//!   `GET /students?filiere=&statut=&page=&size=` return
//!   `{ content, totalElements, totalPages, size, number }`
//! - `GET|PUT|DELETE /students/{id}`, `POST /students`
//! - `GET /actuator/health` for connectivity checks
//!
//! Every call runs under a fixed time budget and never retries.

mod client;
mod error;
mod wire;

use std::future::Future;
use std::time::Duration;

pub use client::RemoteDataSource;
pub use error::RemoteError;

use crate::models::{Snapshot, Student, StudentDraft, StudentFilter, StudentId, StudentPatch};

/// Default backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://localhost:8443/api/v1";
/// Default per-request time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`RemoteDataSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Source of the bearer token attached to outgoing requests.
///
/// Read once per request. `None` means the request goes out unauthenticated.
pub trait TokenSource {
    fn token(&self) -> impl Future<Output = Option<String>>;
}

impl TokenSource for Option<String> {
    async fn token(&self) -> Option<String> {
        self.clone()
    }
}

/// The operations the sync controller needs from a backend.
pub trait StudentSource {
    fn list(&self, page: u32, size: u32) -> impl Future<Output = Result<Snapshot, RemoteError>>;

    fn list_filtered(
        &self,
        filter: &StudentFilter,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Snapshot, RemoteError>>;

    fn get(&self, id: &StudentId) -> impl Future<Output = Result<Student, RemoteError>>;

    fn create(&self, draft: &StudentDraft)
        -> impl Future<Output = Result<Student, RemoteError>>;

    fn update(
        &self,
        id: &StudentId,
        patch: &StudentPatch,
    ) -> impl Future<Output = Result<Student, RemoteError>>;

    fn delete(&self, id: &StudentId) -> impl Future<Output = Result<(), RemoteError>>;

    fn search(
        &self,
        term: &str,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Snapshot, RemoteError>>;

    /// True when the backend answers its health endpoint.
    fn health(&self) -> impl Future<Output = bool>;
}
