//! JSON shapes exchanged with the backend and their mapping to the models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::RemoteError;
use crate::models::{
    avatar_url, Snapshot, Student, StudentDraft, StudentId, StudentPatch, StudentStatus,
};

/// One page of `GET /students`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PagePayload {
    pub content: Vec<StudentPayload>,
    pub total_elements: u64,
    pub number: Option<u32>,
}

impl PagePayload {
    pub fn into_snapshot(self, requested_page: u32) -> Result<Snapshot, RemoteError> {
        let records = self
            .content
            .into_iter()
            .map(StudentPayload::into_student)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot::new(
            records,
            self.total_elements,
            self.number.unwrap_or(requested_page),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentPayload {
    pub id: StudentId,
    pub registration_code: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: String,
    pub program: String,
    pub level: String,
    pub address: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "photo")]
    pub photo_url: Option<String>,
    pub enrollment_date: Option<String>,
    pub created_at: Option<String>,
}

impl StudentPayload {
    pub fn into_student(self) -> Result<Student, RemoteError> {
        let birth_date = parse_date(&self.birth_date).ok_or_else(|| {
            RemoteError::Decode(format!(
                "student {}: invalid birthDate '{}'",
                self.id, self.birth_date
            ))
        })?;

        let status = match self.status.as_deref() {
            None | Some("") => StudentStatus::Active,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("student {}: unknown status '{}', using active", self.id, raw);
                StudentStatus::Active
            }),
        };

        let enrollment_date = self
            .created_at
            .as_deref()
            .or(self.enrollment_date.as_deref())
            .and_then(parse_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let photo_url = non_empty(self.photo_url)
            .unwrap_or_else(|| avatar_url(&self.first_name, &self.last_name));

        Ok(Student {
            id: self.id,
            registration_code: self.registration_code,
            last_name: self.last_name,
            first_name: self.first_name,
            email: self.email,
            phone: non_empty(self.phone),
            birth_date,
            program: self.program,
            level: self.level,
            address: non_empty(self.address),
            status,
            photo_url,
            enrollment_date,
        })
    }
}

/// Body of `POST /students`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DraftBody<'a> {
    registration_code: &'a str,
    last_name: &'a str,
    first_name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    birth_date: NaiveDate,
    program: &'a str,
    level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    status: &'static str,
}

impl<'a> From<&'a StudentDraft> for DraftBody<'a> {
    fn from(draft: &'a StudentDraft) -> Self {
        Self {
            registration_code: &draft.registration_code,
            last_name: &draft.last_name,
            first_name: &draft.first_name,
            email: &draft.email,
            phone: draft.phone.as_deref(),
            birth_date: draft.birth_date,
            program: &draft.program,
            level: &draft.level,
            address: draft.address.as_deref(),
            status: draft.status.as_backend_str(),
        }
    }
}

/// Body of `PUT /students/{id}`. Status goes out in backend spelling.
#[derive(Debug, Serialize)]
pub(crate) struct PatchBody {
    #[serde(flatten)]
    fields: StudentPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
}

impl From<&StudentPatch> for PatchBody {
    fn from(patch: &StudentPatch) -> Self {
        Self {
            fields: StudentPatch {
                status: None,
                ..patch.clone()
            },
            status: patch.status.map(|s| s.as_backend_str()),
        }
    }
}

/// Optional error body on non-success responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub message: Option<String>,
}

/// Accepts plain dates as well as the timestamps some endpoints return.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
