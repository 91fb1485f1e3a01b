use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::status::StudentStatus;

const LOCAL_ID_PREFIX: &str = "local-";

/// Opaque student identifier.
///
/// The backend hands out numeric ids, records created while offline get a
/// `local-` prefixed id. Both are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a record synthesized on this device.
    pub fn local(seq: i64) -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, seq))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => StudentId(n.to_string()),
            RawId::Str(s) => StudentId(s),
        })
    }
}

/// Generated avatar for students without a photo. Same name, same URL.
pub fn avatar_url(first_name: &str, last_name: &str) -> String {
    let name = urlencoding::encode(&format!("{} {}", first_name, last_name)).into_owned();
    format!(
        "https://ui-avatars.com/api/?name={}&background=1e40af&color=fff&size=200",
        name
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub registration_code: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
    pub program: String,
    pub level: String,
    pub address: Option<String>,
    pub status: StudentStatus,
    pub photo_url: String,
    pub enrollment_date: NaiveDate,
}

impl Student {
    /// Builds a record from a draft, used when the backend could not assign one.
    pub fn from_draft(id: StudentId, draft: StudentDraft, enrollment_date: NaiveDate) -> Self {
        let photo_url = avatar_url(&draft.first_name, &draft.last_name);
        Self {
            id,
            registration_code: draft.registration_code,
            last_name: draft.last_name,
            first_name: draft.first_name,
            email: draft.email,
            phone: draft.phone,
            birth_date: draft.birth_date,
            program: draft.program,
            level: draft.level,
            address: draft.address,
            status: draft.status,
            photo_url,
            enrollment_date,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match over the searchable fields.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        [
            &self.last_name,
            &self.first_name,
            &self.registration_code,
            &self.program,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.full_name();
        writeln!(f, "{}", name)?;
        writeln!(f, "{}", "=".repeat(name.chars().count()))?;
        writeln!(f, "ID:           {}", self.id)?;
        writeln!(f, "Registration: {}", self.registration_code)?;
        writeln!(f, "Email:        {}", self.email)?;
        if let Some(phone) = &self.phone {
            writeln!(f, "Phone:        {}", phone)?;
        }
        writeln!(f, "Born:         {}", self.birth_date)?;
        writeln!(f, "Program:      {} ({})", self.program, self.level)?;
        if let Some(address) = &self.address {
            writeln!(f, "Address:      {}", address)?;
        }
        writeln!(f, "Status:       {}", self.status)?;
        write!(f, "Enrolled:     {}", self.enrollment_date)
    }
}

/// Fields needed to create a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub registration_code: String,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
    pub program: String,
    pub level: String,
    pub address: Option<String>,
    #[serde(default)]
    pub status: StudentStatus,
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

impl StudentPatch {
    pub fn with_status(mut self, status: StudentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == StudentPatch::default()
    }

    /// Field-level merge onto an existing record.
    ///
    /// A generated avatar follows a name change; an uploaded photo is kept.
    pub fn apply_to(&self, student: &mut Student) {
        let generated_avatar =
            student.photo_url == avatar_url(&student.first_name, &student.last_name);

        if let Some(v) = &self.last_name {
            student.last_name = v.clone();
        }
        if let Some(v) = &self.first_name {
            student.first_name = v.clone();
        }
        if let Some(v) = &self.email {
            student.email = v.clone();
        }
        if let Some(v) = &self.phone {
            student.phone = Some(v.clone());
        }
        if let Some(v) = self.birth_date {
            student.birth_date = v;
        }
        if let Some(v) = &self.program {
            student.program = v.clone();
        }
        if let Some(v) = &self.level {
            student.level = v.clone();
        }
        if let Some(v) = &self.address {
            student.address = Some(v.clone());
        }
        if let Some(v) = self.status {
            student.status = v;
        }

        if generated_avatar && (self.first_name.is_some() || self.last_name.is_some()) {
            student.photo_url = avatar_url(&student.first_name, &student.last_name);
        }
    }
}
