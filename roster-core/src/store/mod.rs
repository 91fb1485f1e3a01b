//! In-memory state consumed by the presentation layer.
//!
//! State only changes through [`Action`]s applied by the pure
//! [`StudentState::reduce`]. [`Store`] serializes dispatches through a
//! `tokio::sync::watch` channel so readers can either poll [`Store::state`]
//! or await changes on a [`watch::Receiver`].

use tokio::sync::watch;

use crate::models::{Snapshot, Student, StudentId};

/// Where the collection is in its load lifecycle.
///
/// Errors are not a phase: a degraded load still ends in `Ready` with
/// [`StudentState::error`] set, so the list stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    InitialLoading,
    Ready,
    Refreshing,
}

#[derive(Debug, Clone)]
pub enum Action {
    SetLoading(bool),
    SetBusy(bool),
    SetError(Option<String>),
    /// Replaces the browsed collection.
    SetCollection(Snapshot),
    /// Shows a search or filter result; the browsed collection is kept.
    SetMatches(Snapshot),
    AddRecord(Student),
    UpdateRecord(Student),
    RemoveRecord(StudentId),
    SetPage(u32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentState {
    /// Visible records.
    pub records: Vec<Student>,
    /// Last browsed collection, unaffected by searches and filters.
    pub base: Vec<Student>,
    pub total: u64,
    pub page: u32,
    pub phase: LoadPhase,
    /// A mutation is in flight.
    pub busy: bool,
    pub error: Option<String>,
    /// Id of the latest collection query issued.
    query_seq: u64,
}

impl StudentState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::InitialLoading | LoadPhase::Refreshing)
    }

    pub fn find(&self, id: &StudentId) -> Option<&Student> {
        self.records.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &StudentId) -> bool {
        self.find(id).is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.records.clone(), self.total, self.page)
    }

    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SetLoading(true) => {
                self.phase = match self.phase {
                    LoadPhase::Idle | LoadPhase::InitialLoading => LoadPhase::InitialLoading,
                    LoadPhase::Ready | LoadPhase::Refreshing => LoadPhase::Refreshing,
                };
            }
            Action::SetLoading(false) => {
                self.phase = match self.phase {
                    LoadPhase::InitialLoading => LoadPhase::Idle,
                    LoadPhase::Refreshing => LoadPhase::Ready,
                    phase => phase,
                };
            }
            Action::SetBusy(busy) => self.busy = busy,
            Action::SetError(error) => self.error = error,
            Action::SetCollection(snapshot) => {
                self.base = snapshot.records.clone();
                self = self.reduce(Action::SetMatches(snapshot));
            }
            Action::SetMatches(snapshot) => {
                self.records = snapshot.records;
                self.total = snapshot.total;
                self.page = snapshot.page;
                self.phase = LoadPhase::Ready;
                self.error = None;
            }
            Action::AddRecord(student) => {
                if upsert_front(&mut self.records, student.clone()) {
                    self.total += 1;
                }
                upsert_front(&mut self.base, student);
                self.error = None;
            }
            Action::UpdateRecord(student) => {
                replace(&mut self.records, &student);
                replace(&mut self.base, &student);
                self.error = None;
            }
            Action::RemoveRecord(id) => {
                let before = self.records.len();
                self.records.retain(|s| s.id != id);
                if self.records.len() < before {
                    self.total = self.total.saturating_sub(1);
                }
                self.base.retain(|s| s.id != id);
                self.error = None;
            }
            Action::SetPage(page) => self.page = page,
        }
        self
    }
}

/// Replaces the record with the same id, or prepends. True when prepended.
fn upsert_front(records: &mut Vec<Student>, student: Student) -> bool {
    match records.iter_mut().find(|s| s.id == student.id) {
        Some(existing) => {
            *existing = student;
            false
        }
        None => {
            records.insert(0, student);
            true
        }
    }
}

fn replace(records: &mut [Student], student: &Student) {
    if let Some(existing) = records.iter_mut().find(|s| s.id == student.id) {
        *existing = student.clone();
    }
}

/// Tag for one in-flight collection query (load, search or filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

/// Holds the state and is the only place actions are applied.
#[derive(Debug)]
pub struct Store {
    tx: watch::Sender<StudentState>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(StudentState::default())
    }

    pub fn with_state(state: StudentState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Current state, cloned.
    pub fn state(&self) -> StudentState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StudentState> {
        self.tx.subscribe()
    }

    pub fn dispatch(&self, action: Action) {
        self.tx
            .send_modify(|state| *state = std::mem::take(state).reduce(action));
    }

    pub fn dispatch_all(&self, actions: Vec<Action>) {
        self.tx.send_modify(|state| {
            for action in actions {
                *state = std::mem::take(state).reduce(action);
            }
        });
    }

    /// Starts a collection query and marks the store as loading.
    ///
    /// Issuing a new ticket makes every older one stale.
    pub fn begin_query(&self) -> QueryTicket {
        let mut ticket = QueryTicket(0);
        self.tx.send_modify(|state| {
            state.query_seq += 1;
            ticket = QueryTicket(state.query_seq);
            *state = std::mem::take(state).reduce(Action::SetLoading(true));
        });
        ticket
    }

    /// Like [`Store::begin_query`], but ends the loading phase if the query is
    /// dropped before being resolved.
    pub fn start_query(&self) -> QueryGuard<'_> {
        QueryGuard {
            store: self,
            ticket: self.begin_query(),
            settled: false,
        }
    }

    pub fn is_current(&self, ticket: QueryTicket) -> bool {
        self.tx.borrow().query_seq == ticket.0
    }

    /// Applies `actions` if `ticket` is still the latest query.
    ///
    /// Returns false, leaving the state untouched, for a stale ticket.
    pub fn resolve(&self, ticket: QueryTicket, actions: Vec<Action>) -> bool {
        self.tx.send_if_modified(|state| {
            if state.query_seq != ticket.0 {
                return false;
            }
            for action in actions {
                *state = std::mem::take(state).reduce(action);
            }
            true
        })
    }

    /// Marks the store busy, or returns `None` if a mutation is already running.
    pub fn try_begin_mutation(&self) -> Option<BusyGuard<'_>> {
        let acquired = self.tx.send_if_modified(|state| {
            if state.busy {
                return false;
            }
            *state = std::mem::take(state).reduce(Action::SetBusy(true));
            true
        });
        acquired.then_some(BusyGuard { store: self })
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-flight collection query.
#[derive(Debug)]
pub struct QueryGuard<'a> {
    store: &'a Store,
    ticket: QueryTicket,
    settled: bool,
}

impl QueryGuard<'_> {
    pub fn ticket(&self) -> QueryTicket {
        self.ticket
    }

    pub fn is_current(&self) -> bool {
        self.store.is_current(self.ticket)
    }

    /// Applies `actions` unless a newer query was started; see [`Store::resolve`].
    pub fn resolve(mut self, actions: Vec<Action>) -> bool {
        self.settled = true;
        self.store.resolve(self.ticket, actions)
    }
}

impl Drop for QueryGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.store.resolve(self.ticket, vec![Action::SetLoading(false)]) {
            tracing::debug!("collection query abandoned");
        }
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    store: &'a Store,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.dispatch(Action::SetBusy(false));
    }
}
