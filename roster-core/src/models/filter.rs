use serde::{Deserialize, Serialize};

use super::status::StudentStatus;
use super::student::Student;

/// Narrows a listing to one program and/or one status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentFilter {
    pub program: Option<String>,
    pub status: Option<StudentStatus>,
}

impl StudentFilter {
    pub fn program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            status: None,
        }
    }

    pub fn status(status: StudentStatus) -> Self {
        Self {
            program: None,
            status: Some(status),
        }
    }

    /// True when nothing is filtered out.
    pub fn is_empty(&self) -> bool {
        self.program.as_deref().map_or(true, |p| p.trim().is_empty()) && self.status.is_none()
    }

    /// Program compares case-insensitively, status exactly.
    pub fn accepts(&self, student: &Student) -> bool {
        let program_ok = match self.program.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => student.program.to_lowercase() == p.to_lowercase(),
            _ => true,
        };
        let status_ok = self.status.map_or(true, |s| student.status == s);
        program_ok && status_ok
    }
}
