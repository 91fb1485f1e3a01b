use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enrollment status of a student.
///
/// Only these three values are ever stored. Legacy spellings coming from the
/// backend (`actif`, `inactif`, `diplome`) are normalized on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 3] = [
        StudentStatus::Active,
        StudentStatus::Inactive,
        StudentStatus::Graduated,
    ];

    /// Spelling expected by the backend.
    pub fn as_backend_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "ACTIVE",
            StudentStatus::Inactive => "INACTIVE",
            StudentStatus::Graduated => "GRADUATED",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "active"),
            StudentStatus::Inactive => write!(f, "inactive"),
            StudentStatus::Graduated => write!(f, "graduated"),
        }
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "actif" => Ok(StudentStatus::Active),
            "inactive" | "inactif" => Ok(StudentStatus::Inactive),
            "graduated" | "diplome" | "diplomé" => Ok(StudentStatus::Graduated),
            _ => Err(format!(
                "Invalid status '{}'. Valid options: active, inactive, graduated",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", StudentStatus::Active), "active");
        assert_eq!(format!("{}", StudentStatus::Inactive), "inactive");
        assert_eq!(format!("{}", StudentStatus::Graduated), "graduated");
    }

    #[test]
    fn test_status_from_str_case_insensitive() {
        assert_eq!(
            StudentStatus::from_str("ACTIVE").unwrap(),
            StudentStatus::Active
        );
        assert_eq!(
            StudentStatus::from_str("Graduated").unwrap(),
            StudentStatus::Graduated
        );
        assert_eq!(
            StudentStatus::from_str(" inactive ").unwrap(),
            StudentStatus::Inactive
        );
    }

    #[test]
    fn test_status_from_legacy_spelling() {
        assert_eq!(
            StudentStatus::from_str("ACTIF").unwrap(),
            StudentStatus::Active
        );
        assert_eq!(
            StudentStatus::from_str("diplome").unwrap(),
            StudentStatus::Graduated
        );
        assert_eq!(
            StudentStatus::from_str("Inactif").unwrap(),
            StudentStatus::Inactive
        );
    }

    #[test]
    fn test_status_from_str_invalid() {
        assert!(StudentStatus::from_str("suspended").is_err());
        assert!(StudentStatus::from_str("").is_err());
    }

    #[test]
    fn test_backend_spelling_is_uppercase() {
        for status in StudentStatus::ALL {
            assert_eq!(
                status.as_backend_str(),
                status.to_string().to_uppercase()
            );
        }
    }

    #[test]
    fn test_status_json_is_lowercase() {
        let json = serde_json::to_string(&StudentStatus::Graduated).unwrap();
        assert_eq!(json, "\"graduated\"");
    }
}
