pub mod catalog;
mod filter;
mod snapshot;
mod status;
mod student;

pub use catalog::{LEVELS, PROGRAMS};
pub use filter::StudentFilter;
pub use snapshot::Snapshot;
pub use status::StudentStatus;
pub use student::{avatar_url, Student, StudentDraft, StudentId, StudentPatch};

#[cfg(test)]
pub(crate) use student::fixtures;
