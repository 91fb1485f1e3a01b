//! Remote-first operations with local fallback.
//!
//! Every operation tries the backend first. Reads fall back to the cached
//! snapshot, then to the bundled seed data; mutations fall back to an
//! optimistic change of the in-memory state. Offline mutations are never
//! replayed against the backend later.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::error::SyncError;
use super::seed;
use crate::cache::SnapshotCache;
use crate::models::{Snapshot, Student, StudentDraft, StudentFilter, StudentId, StudentPatch};
use crate::remote::{RemoteError, StudentSource};
use crate::store::{Action, QueryGuard, StudentState, Store};

pub const OFFLINE_CACHED: &str = "offline, showing cached data";
pub const LOCAL_SEARCH_ONLY: &str = "local search only";
pub const LOCAL_FILTER_ONLY: &str = "offline, filtering cached data";
pub const CREATED_OFFLINE: &str = "created offline";
pub const MODIFIED_OFFLINE: &str = "modified offline";
pub const DELETED_OFFLINE: &str = "deleted offline";
pub const NOT_FOUND: &str = "student not found";

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub page_size: u32,
    /// Minimum time a load or search keeps the store in a loading phase.
    pub min_loading_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            min_loading_delay: Duration::ZERO,
        }
    }
}

/// How a load, search or filter ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Backend data is now visible
    Fresh,
    /// Cached, seed or locally filtered data is now visible
    Degraded,
    /// A newer query was issued meanwhile; the result was dropped
    Stale,
}

/// Result of an operation that may have completed without the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    /// Set when the backend call failed and a local fallback was used.
    pub remote_error: Option<RemoteError>,
}

impl<T> Outcome<T> {
    fn synced(value: T) -> Self {
        Self {
            value,
            remote_error: None,
        }
    }

    fn offline(value: T, err: RemoteError) -> Self {
        Self {
            value,
            remote_error: Some(err),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.remote_error.is_some()
    }
}

/// Orchestrates the backend, the local cache and the state store.
///
/// Mutations require the store not to be busy; a second mutation issued while
/// one is in flight fails with [`SyncError::Busy`].
pub struct SyncController<R, C> {
    remote: R,
    cache: C,
    store: Arc<Store>,
    options: SyncOptions,
    last_local_id: AtomicI64,
}

impl<R: StudentSource, C: SnapshotCache> SyncController<R, C> {
    pub fn new(remote: R, cache: C, store: Arc<Store>, options: SyncOptions) -> Self {
        Self {
            remote,
            cache,
            store,
            options,
            last_local_id: AtomicI64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn state(&self) -> StudentState {
        self.store.state()
    }

    pub async fn load(&self, page: u32) -> QueryOutcome {
        let query = self.store.start_query();
        let started = Instant::now();

        let (snapshot, notice) = match self.remote.list(page, self.options.page_size).await {
            Ok(snapshot) => {
                if query.is_current() {
                    if let Err(e) = self.cache.write_snapshot(&snapshot).await {
                        tracing::warn!("could not cache snapshot: {}", e);
                    }
                }
                (snapshot, None)
            }
            Err(e) => {
                tracing::warn!("loading page {} failed, using local data: {}", page, e);
                (self.fallback_snapshot().await, Some(OFFLINE_CACHED))
            }
        };

        self.hold_minimum(started).await;
        self.finish_query(query, Action::SetCollection(snapshot), notice)
    }

    /// Searches the backend; an empty term is a plain `load(0)`.
    ///
    /// Offline, the term is matched against the last browsed collection, so
    /// consecutive searches do not narrow each other.
    pub async fn search(&self, term: &str) -> QueryOutcome {
        let term = term.trim();
        if term.is_empty() {
            return self.load(0).await;
        }

        let query = self.store.start_query();
        let started = Instant::now();

        let (snapshot, notice) = match self.remote.search(term, 0, self.options.page_size).await {
            Ok(snapshot) => (snapshot, None),
            Err(e) => {
                tracing::warn!("search for '{}' failed, filtering locally: {}", term, e);
                let current = self.store.state();
                (
                    Snapshot::matching(&current.base, term),
                    Some(LOCAL_SEARCH_ONLY),
                )
            }
        };

        self.hold_minimum(started).await;
        self.finish_query(query, Action::SetMatches(snapshot), notice)
    }

    /// Lists students of one program and/or status; an empty filter is a
    /// plain `load(page)`.
    ///
    /// Offline, the cached snapshot (or the seed data) is filtered locally.
    pub async fn filter(&self, filter: &StudentFilter, page: u32) -> QueryOutcome {
        if filter.is_empty() {
            return self.load(page).await;
        }

        let query = self.store.start_query();
        let started = Instant::now();

        let (snapshot, notice) = match self
            .remote
            .list_filtered(filter, page, self.options.page_size)
            .await
        {
            Ok(snapshot) => (snapshot, None),
            Err(e) => {
                tracing::warn!("filtered listing failed, filtering locally: {}", e);
                let local = self.fallback_snapshot().await;
                (
                    Snapshot::filtered(&local.records, filter),
                    Some(LOCAL_FILTER_ONLY),
                )
            }
        };

        self.hold_minimum(started).await;
        self.finish_query(query, Action::SetMatches(snapshot), notice)
    }

    /// Fetches one student, falling back to the record held in memory.
    ///
    /// Leaves the state untouched.
    pub async fn get(&self, id: &StudentId) -> Result<Outcome<Student>, SyncError> {
        match self.remote.get(id).await {
            Ok(student) => Ok(Outcome::synced(student)),
            Err(e) => match self.store.state().find(id).cloned() {
                Some(student) => Ok(Outcome::offline(student, e)),
                None => Err(SyncError::NotFoundLocally {
                    id: id.clone(),
                    cause: e,
                }),
            },
        }
    }

    /// Creates a student. Offline, the record gets a local id and is never
    /// sent to the backend afterwards.
    pub async fn create(&self, draft: StudentDraft) -> Result<Outcome<Student>, SyncError> {
        let _busy = self.store.try_begin_mutation().ok_or(SyncError::Busy)?;

        match self.remote.create(&draft).await {
            Ok(student) => {
                self.store.dispatch(Action::AddRecord(student.clone()));
                Ok(Outcome::synced(student))
            }
            Err(e) => {
                tracing::warn!("create failed, keeping student locally: {}", e);
                let student =
                    Student::from_draft(self.next_local_id(), draft, Utc::now().date_naive());
                self.store.dispatch_all(vec![
                    Action::AddRecord(student.clone()),
                    Action::SetError(Some(CREATED_OFFLINE.to_string())),
                ]);
                Ok(Outcome::offline(student, e))
            }
        }
    }

    /// Updates a student. Offline, `patch` is merged onto the in-memory record.
    pub async fn update(
        &self,
        id: &StudentId,
        patch: &StudentPatch,
    ) -> Result<Outcome<Student>, SyncError> {
        let _busy = self.store.try_begin_mutation().ok_or(SyncError::Busy)?;

        match self.remote.update(id, patch).await {
            Ok(student) => {
                self.store.dispatch(Action::UpdateRecord(student.clone()));
                Ok(Outcome::synced(student))
            }
            Err(e) => {
                tracing::warn!("update of {} failed, applying locally: {}", id, e);
                let Some(mut student) = self.store.state().find(id).cloned() else {
                    self.store
                        .dispatch(Action::SetError(Some(NOT_FOUND.to_string())));
                    return Err(SyncError::NotFoundLocally {
                        id: id.clone(),
                        cause: e,
                    });
                };
                patch.apply_to(&mut student);
                self.store.dispatch_all(vec![
                    Action::UpdateRecord(student.clone()),
                    Action::SetError(Some(MODIFIED_OFFLINE.to_string())),
                ]);
                Ok(Outcome::offline(student, e))
            }
        }
    }

    /// Removes a student from the visible state whatever the backend says.
    ///
    /// The value is false when `id` was not present, in which case nothing
    /// is sent and nothing changes.
    pub async fn delete(&self, id: &StudentId) -> Result<Outcome<bool>, SyncError> {
        let _busy = self.store.try_begin_mutation().ok_or(SyncError::Busy)?;

        if !self.store.state().contains(id) {
            tracing::debug!("delete of {} skipped, not present", id);
            return Ok(Outcome::synced(false));
        }

        match self.remote.delete(id).await {
            Ok(()) => {
                self.store.dispatch(Action::RemoveRecord(id.clone()));
                Ok(Outcome::synced(true))
            }
            Err(e) => {
                tracing::warn!("delete of {} failed, removing locally: {}", id, e);
                self.store.dispatch_all(vec![
                    Action::RemoveRecord(id.clone()),
                    Action::SetError(Some(DELETED_OFFLINE.to_string())),
                ]);
                Ok(Outcome::offline(true, e))
            }
        }
    }

    pub async fn check_connection(&self) -> bool {
        self.remote.health().await
    }

    /// Cached snapshot, or the seed data when nothing is cached.
    async fn fallback_snapshot(&self) -> Snapshot {
        match self.cache.read_snapshot().await {
            Some(cached) => cached,
            None => {
                tracing::debug!("no cached snapshot, using seed data");
                seed::snapshot()
            }
        }
    }

    fn finish_query(
        &self,
        query: QueryGuard<'_>,
        result: Action,
        notice: Option<&str>,
    ) -> QueryOutcome {
        let mut actions = vec![result];
        if let Some(notice) = notice {
            actions.push(Action::SetError(Some(notice.to_string())));
        }

        if !query.resolve(actions) {
            tracing::debug!("dropping stale query result");
            return QueryOutcome::Stale;
        }

        match notice {
            Some(_) => QueryOutcome::Degraded,
            None => QueryOutcome::Fresh,
        }
    }

    async fn hold_minimum(&self, started: Instant) {
        let remaining = self
            .options
            .min_loading_delay
            .saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }

    /// Timestamp-based id, strictly increasing and unused in the current state.
    fn next_local_id(&self) -> StudentId {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let previous = self
            .last_local_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let mut seq = now.max(previous + 1);

        let state = self.store.state();
        while state.contains(&StudentId::local(seq)) {
            seq += 1;
        }
        self.last_local_id.fetch_max(seq, Ordering::SeqCst);

        StudentId::local(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCache;
    use crate::models::fixtures::{draft, student};
    use crate::models::StudentStatus;
    use crate::remote::{RemoteConfig, RemoteDataSource};
    use crate::store::LoadPhase;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-process backend whose availability can be switched off.
    struct FakeRemote {
        records: Mutex<Vec<Student>>,
        failure: Mutex<Option<RemoteError>>,
        list_delay: Duration,
        next_id: AtomicU64,
        delete_calls: AtomicUsize,
    }

    impl FakeRemote {
        fn with(records: Vec<Student>) -> Self {
            Self {
                records: Mutex::new(records),
                failure: Mutex::new(None),
                list_delay: Duration::ZERO,
                next_id: AtomicU64::new(100),
                delete_calls: AtomicUsize::new(0),
            }
        }

        fn go_offline(&self, err: RemoteError) {
            *self.failure.lock().unwrap() = Some(err);
        }

        fn check(&self) -> Result<(), RemoteError> {
            match self.failure.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn page(&self, records: Vec<Student>, page: u32, size: u32) -> Snapshot {
            let total = records.len() as u64;
            let records = records
                .into_iter()
                .skip((page * size) as usize)
                .take(size as usize)
                .collect();
            Snapshot::new(records, total, page)
        }
    }

    impl StudentSource for FakeRemote {
        async fn list(&self, page: u32, size: u32) -> Result<Snapshot, RemoteError> {
            if !self.list_delay.is_zero() {
                tokio::time::sleep(self.list_delay).await;
            }
            self.check()?;
            let records = self.records.lock().unwrap().clone();
            Ok(self.page(records, page, size))
        }

        async fn list_filtered(
            &self,
            filter: &StudentFilter,
            page: u32,
            size: u32,
        ) -> Result<Snapshot, RemoteError> {
            self.check()?;
            let found: Vec<Student> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|s| filter.accepts(s))
                .cloned()
                .collect();
            Ok(self.page(found, page, size))
        }

        async fn get(&self, id: &StudentId) -> Result<Student, RemoteError> {
            self.check()?;
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == id)
                .cloned()
                .ok_or(RemoteError::HttpStatus {
                    code: 404,
                    message: "HTTP 404".to_string(),
                })
        }

        async fn create(&self, draft: &StudentDraft) -> Result<Student, RemoteError> {
            self.check()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            let created = Student::from_draft(
                StudentId::new(id),
                draft.clone(),
                Utc::now().date_naive(),
            );
            self.records.lock().unwrap().insert(0, created.clone());
            Ok(created)
        }

        async fn update(
            &self,
            id: &StudentId,
            patch: &StudentPatch,
        ) -> Result<Student, RemoteError> {
            self.check()?;
            let mut records = self.records.lock().unwrap();
            let existing = records
                .iter_mut()
                .find(|s| &s.id == id)
                .ok_or(RemoteError::HttpStatus {
                    code: 404,
                    message: "HTTP 404".to_string(),
                })?;
            patch.apply_to(existing);
            Ok(existing.clone())
        }

        async fn delete(&self, id: &StudentId) -> Result<(), RemoteError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.records.lock().unwrap().retain(|s| &s.id != id);
            Ok(())
        }

        async fn search(&self, term: &str, page: u32, size: u32) -> Result<Snapshot, RemoteError> {
            self.check()?;
            let found: Vec<Student> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.matches(term))
                .cloned()
                .collect();
            Ok(self.page(found, page, size))
        }

        async fn health(&self) -> bool {
            self.check().is_ok()
        }
    }

    struct TestContext<R> {
        controller: SyncController<R, LocalCache>,
        cache: LocalCache,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_with<R: StudentSource>(remote: R, options: SyncOptions) -> TestContext<R> {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::open(&temp_dir.path().join("cache.db"))
            .await
            .unwrap();
        let controller =
            SyncController::new(remote, cache.clone(), Arc::new(Store::new()), options);
        TestContext {
            controller,
            cache,
            _temp_dir: temp_dir,
        }
    }

    async fn setup(remote: FakeRemote) -> TestContext<FakeRemote> {
        setup_with(remote, SyncOptions::default()).await
    }

    fn roster() -> Vec<Student> {
        vec![
            student("10", "Aminata", "Sow"),
            student("11", "Fatou", "Diop"),
            student("12", "Ousmane", "Kane"),
        ]
    }

    fn server_error() -> RemoteError {
        RemoteError::HttpStatus {
            code: 500,
            message: "HTTP 500".to_string(),
        }
    }

    fn refused() -> RemoteError {
        RemoteError::Transport("connection refused".to_string())
    }

    #[tokio::test]
    async fn test_load_success_updates_state_and_cache() {
        let ctx = setup(FakeRemote::with(roster())).await;

        let outcome = ctx.controller.load(0).await;

        assert_eq!(outcome, QueryOutcome::Fresh);
        let state = ctx.controller.state();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.records, roster());
        assert_eq!(state.total, 3);
        assert!(state.error.is_none());
        assert_eq!(ctx.cache.read_snapshot().await, Some(state.snapshot()));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let ctx = setup(FakeRemote::with(roster())).await;

        ctx.controller.load(0).await;
        let first = ctx.controller.state().snapshot();
        ctx.controller.load(0).await;
        let second = ctx.controller.state().snapshot();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_load_pages_through_backend() {
        let remote = FakeRemote::with(roster());
        let options = SyncOptions {
            page_size: 2,
            ..SyncOptions::default()
        };
        let ctx = setup_with(remote, options).await;

        ctx.controller.load(1).await;

        let state = ctx.controller.state();
        assert_eq!(state.page, 1);
        assert_eq!(state.total, 3);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].id, StudentId::from("12"));
    }

    #[tokio::test]
    async fn test_load_offline_uses_cached_snapshot_exactly() {
        let ctx = setup(FakeRemote::with(roster())).await;
        let cached = Snapshot::new(vec![student("77", "Khady", "Mbaye")], 54, 2);
        ctx.cache.write_snapshot(&cached).await.unwrap();
        ctx.controller.remote.go_offline(refused());

        let outcome = ctx.controller.load(0).await;

        assert_eq!(outcome, QueryOutcome::Degraded);
        let state = ctx.controller.state();
        assert_eq!(state.snapshot(), cached);
        assert_eq!(state.error.as_deref(), Some(OFFLINE_CACHED));
        assert_eq!(state.phase, LoadPhase::Ready);
    }

    #[tokio::test]
    async fn test_load_offline_without_cache_uses_seed() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.remote.go_offline(server_error());

        let outcome = ctx.controller.load(0).await;

        assert_eq!(outcome, QueryOutcome::Degraded);
        let state = ctx.controller.state();
        assert_eq!(state.snapshot(), seed::snapshot());
        assert_eq!(state.error.as_deref(), Some(OFFLINE_CACHED));
        assert!(ctx.cache.read_snapshot().await.is_none(), "fallback data is not cached");
    }

    #[tokio::test]
    async fn test_load_refresh_after_offline_keeps_list_visible() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        ctx.controller.load(0).await;

        let state = ctx.controller.state();
        assert_eq!(state.records, roster());
        assert_eq!(state.error.as_deref(), Some(OFFLINE_CACHED));
    }

    #[tokio::test]
    async fn test_timed_out_backend_shows_seed_data() {
        use axum::routing::get;
        use axum::Router;

        let router = Router::new().route(
            "/students",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "[]"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let remote = RemoteDataSource::new(
            &RemoteConfig {
                base_url: format!("http://{}", addr),
                timeout: Duration::from_millis(200),
            },
            None::<String>,
        );
        let ctx = setup_with(remote, SyncOptions::default()).await;

        let (outcome, phase_during) = tokio::join!(ctx.controller.load(0), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            ctx.controller.state().phase
        });

        assert_eq!(phase_during, LoadPhase::InitialLoading);
        assert_eq!(outcome, QueryOutcome::Degraded);
        let state = ctx.controller.state();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.records.len(), 3);
        assert_eq!(state.snapshot(), seed::snapshot());
        assert!(state.error.as_deref().unwrap().starts_with("offline"));
    }

    #[tokio::test]
    async fn test_empty_search_equals_first_load() {
        let by_load = setup(FakeRemote::with(roster())).await;
        by_load.controller.load(0).await;

        let by_search = setup(FakeRemote::with(roster())).await;
        by_search.controller.search("   ").await;

        let a = by_load.controller.state();
        let b = by_search.controller.state();
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.error, b.error);
        assert_eq!(a.phase, b.phase);
    }

    #[tokio::test]
    async fn test_empty_search_offline_equals_first_load_offline() {
        let by_load = setup(FakeRemote::with(roster())).await;
        by_load.controller.remote.go_offline(refused());
        by_load.controller.load(0).await;

        let by_search = setup(FakeRemote::with(roster())).await;
        by_search.controller.remote.go_offline(refused());
        by_search.controller.search("").await;

        assert_eq!(
            by_load.controller.state().snapshot(),
            by_search.controller.state().snapshot()
        );
    }

    #[tokio::test]
    async fn test_search_uses_backend() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;

        let outcome = ctx.controller.search("kane").await;

        assert_eq!(outcome, QueryOutcome::Fresh);
        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].last_name, "Kane");
        assert_eq!(state.page, 0);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_search_offline_filters_in_memory() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        let outcome = ctx.controller.search("DIOP").await;

        assert_eq!(outcome, QueryOutcome::Degraded);
        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].first_name, "Fatou");
        assert_eq!(state.total, 1);
        assert_eq!(state.error.as_deref(), Some(LOCAL_SEARCH_ONLY));
    }

    #[tokio::test]
    async fn test_search_does_not_touch_cache() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        let cached = ctx.cache.read_snapshot().await;

        ctx.controller.search("kane").await;

        assert_eq!(ctx.cache.read_snapshot().await, cached);
    }

    #[tokio::test]
    async fn test_consecutive_offline_searches_do_not_narrow() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        ctx.controller.search("sow").await;
        assert_eq!(ctx.controller.state().records.len(), 1);

        ctx.controller.search("diop").await;

        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].last_name, "Diop");
        assert_eq!(state.base.len(), 3);
    }

    #[tokio::test]
    async fn test_offline_search_sees_offline_creations() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        ctx.controller
            .create(draft("AR-2026-003", "Mariama", "Ba"))
            .await
            .unwrap();
        ctx.controller.search("mariama").await;

        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert!(state.records[0].id.is_local());
    }

    fn mixed_roster() -> Vec<Student> {
        let mut architect = student("20", "Fatou", "Diop");
        architect.program = "Architecture".to_string();
        architect.status = StudentStatus::Graduated;
        let mut inactive = student("21", "Ousmane", "Kane");
        inactive.status = StudentStatus::Inactive;
        vec![student("10", "Aminata", "Sow"), architect, inactive]
    }

    #[tokio::test]
    async fn test_filter_uses_backend() {
        let ctx = setup(FakeRemote::with(mixed_roster())).await;

        let outcome = ctx
            .controller
            .filter(&StudentFilter::program("Architecture"), 0)
            .await;

        assert_eq!(outcome, QueryOutcome::Fresh);
        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].last_name, "Diop");
        assert!(state.error.is_none());
        assert!(ctx.cache.read_snapshot().await.is_none(), "filtered pages are not cached");
    }

    #[tokio::test]
    async fn test_empty_filter_equals_load() {
        let by_load = setup(FakeRemote::with(mixed_roster())).await;
        by_load.controller.load(0).await;

        let by_filter = setup(FakeRemote::with(mixed_roster())).await;
        by_filter
            .controller
            .filter(&StudentFilter::default(), 0)
            .await;

        assert_eq!(
            by_load.controller.state().snapshot(),
            by_filter.controller.state().snapshot()
        );
    }

    #[tokio::test]
    async fn test_filter_offline_filters_cached_snapshot() {
        let ctx = setup(FakeRemote::with(mixed_roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        let outcome = ctx
            .controller
            .filter(&StudentFilter::status(StudentStatus::Inactive), 0)
            .await;

        assert_eq!(outcome, QueryOutcome::Degraded);
        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].last_name, "Kane");
        assert_eq!(state.total, 1);
        assert_eq!(state.error.as_deref(), Some(LOCAL_FILTER_ONLY));
    }

    #[tokio::test]
    async fn test_filter_offline_without_cache_filters_seed() {
        let ctx = setup(FakeRemote::with(vec![])).await;
        ctx.controller.remote.go_offline(server_error());

        ctx.controller
            .filter(
                &StudentFilter {
                    program: Some("architecture".to_string()),
                    status: Some(StudentStatus::Graduated),
                },
                0,
            )
            .await;

        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].id, StudentId::from("3"));
        assert_eq!(state.error.as_deref(), Some(LOCAL_FILTER_ONLY));
    }

    #[tokio::test]
    async fn test_abandoned_load_does_not_stay_loading() {
        let mut remote = FakeRemote::with(roster());
        remote.list_delay = Duration::from_millis(200);
        let ctx = setup(remote).await;

        let result =
            tokio::time::timeout(Duration::from_millis(20), ctx.controller.load(0)).await;

        assert!(result.is_err());
        let state = ctx.controller.state();
        assert!(!state.is_loading());
        assert_eq!(state.phase, LoadPhase::Idle);
    }

    #[tokio::test]
    async fn test_stale_load_does_not_overwrite_newer_search() {
        let mut remote = FakeRemote::with(roster());
        remote.list_delay = Duration::from_millis(150);
        let ctx = setup(remote).await;

        let (load, search) = tokio::join!(ctx.controller.load(0), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ctx.controller.search("sow").await
        });

        assert_eq!(search, QueryOutcome::Fresh);
        assert_eq!(load, QueryOutcome::Stale);
        let state = ctx.controller.state();
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].last_name, "Sow");
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_min_loading_delay_is_honored() {
        let options = SyncOptions {
            min_loading_delay: Duration::from_millis(80),
            ..SyncOptions::default()
        };
        let ctx = setup_with(FakeRemote::with(roster()), options).await;

        let started = Instant::now();
        ctx.controller.load(0).await;

        assert!(started.elapsed() >= Duration::from_millis(80));
        assert_eq!(ctx.controller.state().phase, LoadPhase::Ready);
    }

    #[tokio::test]
    async fn test_create_online_uses_server_id() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;

        let outcome = ctx
            .controller
            .create(draft("AR-2026-001", "Ibrahima", "Fall"))
            .await
            .unwrap();

        assert!(!outcome.is_offline());
        assert_eq!(outcome.value.id, StudentId::from("100"));
        let state = ctx.controller.state();
        assert_eq!(state.records[0].id, outcome.value.id);
        assert_eq!(
            state.records.iter().filter(|s| s.id == outcome.value.id).count(),
            1
        );
        assert_eq!(state.total, 4);
        assert!(state.error.is_none());
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_create_offline_synthesizes_local_record() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());
        let before: HashSet<StudentId> =
            ctx.controller.state().records.iter().map(|s| s.id.clone()).collect();

        let outcome = ctx
            .controller
            .create(draft("AR-2026-002", "Mariama", "Ba"))
            .await
            .unwrap();

        assert_eq!(outcome.remote_error, Some(refused()));
        let id = outcome.value.id.clone();
        assert!(id.is_local());
        assert!(!before.contains(&id));

        let state = ctx.controller.state();
        assert_eq!(state.records.len(), before.len() + 1);
        assert_eq!(state.records[0].id, id);
        assert_eq!(state.records[0].registration_code, "AR-2026-002");
        assert_eq!(state.error.as_deref(), Some(CREATED_OFFLINE));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_back_to_back_offline_creates_get_distinct_ids() {
        let ctx = setup(FakeRemote::with(vec![])).await;
        ctx.controller.remote.go_offline(refused());

        let a = ctx.controller.create(draft("X-1", "Awa", "Ba")).await.unwrap();
        let b = ctx.controller.create(draft("X-2", "Awa", "Ba")).await.unwrap();

        assert_ne!(a.value.id, b.value.id);
        assert_eq!(ctx.controller.state().records.len(), 2);
    }

    #[tokio::test]
    async fn test_update_online_replaces_record() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        let id = StudentId::from("11");
        let patch = StudentPatch {
            level: Some("Master 2".to_string()),
            ..Default::default()
        };

        let outcome = ctx.controller.update(&id, &patch).await.unwrap();

        assert!(!outcome.is_offline());
        let state = ctx.controller.state();
        assert_eq!(state.find(&id).unwrap().level, "Master 2");
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_update_offline_merges_patch_onto_seed_record() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.remote.go_offline(server_error());
        ctx.controller.load(0).await;
        let id = StudentId::from("2");
        let before = ctx.controller.state().find(&id).cloned().unwrap();

        let outcome = ctx
            .controller
            .update(&id, &StudentPatch::default().with_status(StudentStatus::Graduated))
            .await
            .unwrap();

        assert_eq!(outcome.remote_error, Some(server_error()));
        let state = ctx.controller.state();
        let after = state.find(&id).unwrap();
        assert_eq!(after.status, StudentStatus::Graduated);
        assert_eq!(
            Student {
                status: before.status,
                ..after.clone()
            },
            before
        );
        assert_eq!(state.error.as_deref(), Some(MODIFIED_OFFLINE));
    }

    #[tokio::test]
    async fn test_update_offline_unknown_id_leaves_collection() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());
        let before = ctx.controller.state().records;

        let err = ctx
            .controller
            .update(
                &StudentId::from("404"),
                &StudentPatch::default().with_status(StudentStatus::Inactive),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NotFoundLocally { .. }));
        let state = ctx.controller.state();
        assert_eq!(state.records, before);
        assert_eq!(state.error.as_deref(), Some(NOT_FOUND));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_delete_online_removes_record() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        let id = StudentId::from("10");

        let outcome = ctx.controller.delete(&id).await.unwrap();

        assert!(outcome.value);
        assert!(!outcome.is_offline());
        let state = ctx.controller.state();
        assert!(!state.contains(&id));
        assert_eq!(state.total, 2);
    }

    #[tokio::test]
    async fn test_delete_offline_still_removes_record() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());
        let id = StudentId::from("12");

        let outcome = ctx.controller.delete(&id).await.unwrap();

        assert!(outcome.value);
        assert!(outcome.is_offline());
        let state = ctx.controller.state();
        assert!(!state.contains(&id));
        assert_eq!(state.error.as_deref(), Some(DELETED_OFFLINE));
    }

    #[tokio::test]
    async fn test_delete_twice_is_noop_second_time() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        let id = StudentId::from("11");

        ctx.controller.delete(&id).await.unwrap();
        let after_first = ctx.controller.state();

        let second = ctx.controller.delete(&id).await.unwrap();

        assert!(!second.value);
        assert_eq!(ctx.controller.state(), after_first);
        assert_eq!(ctx.controller.remote.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mutation_rejected_while_busy() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;

        let guard = ctx.controller.store().try_begin_mutation();
        assert!(guard.is_some());

        let err = ctx
            .controller
            .delete(&StudentId::from("10"))
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::Busy);
        assert!(ctx.controller.state().contains(&StudentId::from("10")));

        drop(guard);
        assert!(ctx.controller.delete(&StudentId::from("10")).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_falls_back_to_memory() {
        let ctx = setup(FakeRemote::with(roster())).await;
        ctx.controller.load(0).await;
        ctx.controller.remote.go_offline(refused());

        let found = ctx.controller.get(&StudentId::from("11")).await.unwrap();
        assert!(found.is_offline());
        assert_eq!(found.value.first_name, "Fatou");

        let missing = ctx.controller.get(&StudentId::from("999")).await;
        assert!(matches!(missing, Err(SyncError::NotFoundLocally { .. })));
    }

    #[tokio::test]
    async fn test_check_connection() {
        let ctx = setup(FakeRemote::with(vec![])).await;
        assert!(ctx.controller.check_connection().await);

        ctx.controller.remote.go_offline(refused());
        assert!(!ctx.controller.check_connection().await);
    }
}
