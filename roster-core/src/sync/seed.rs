//! Example records shown when neither the backend nor the cache has data.

use chrono::NaiveDate;

use crate::models::{avatar_url, Snapshot, Student, StudentId, StudentStatus};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed_student(
    id: &str,
    code: &str,
    first: &str,
    last: &str,
    program: &str,
    level: &str,
    status: StudentStatus,
    birth: NaiveDate,
) -> Student {
    Student {
        id: StudentId::from(id),
        registration_code: code.to_string(),
        last_name: last.to_string(),
        first_name: first.to_string(),
        email: format!(
            "{}.{}@univ.example.edu",
            first.to_lowercase(),
            last.to_lowercase()
        ),
        phone: Some(format!("+221 77 123 45 0{}", id)),
        birth_date: birth,
        program: program.to_string(),
        level: level.to_string(),
        address: Some("Dakar, Sénégal".to_string()),
        status,
        photo_url: avatar_url(first, last),
        enrollment_date: date(2022, 10, 3),
    }
}

/// The bundled three-record snapshot.
pub fn snapshot() -> Snapshot {
    let records = vec![
        seed_student(
            "1",
            "GI-2022-001",
            "Aminata",
            "Sow",
            "Génie Informatique",
            "Licence 3",
            StudentStatus::Active,
            date(2002, 4, 12),
        ),
        seed_student(
            "2",
            "GC-2022-014",
            "Moussa",
            "Ndiaye",
            "Génie Civil",
            "Master 1",
            StudentStatus::Active,
            date(2000, 11, 3),
        ),
        seed_student(
            "3",
            "AR-2022-007",
            "Fatou",
            "Diop",
            "Architecture",
            "Master 2",
            StudentStatus::Graduated,
            date(1999, 6, 27),
        ),
    ];
    let total = records.len() as u64;
    Snapshot::new(records, total, 0)
}
