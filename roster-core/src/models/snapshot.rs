use serde::{Deserialize, Serialize};

use super::filter::StudentFilter;
use super::student::Student;

/// An ordered page of students with pagination metadata.
///
/// This is what the local cache persists and what the state store renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Student>,
    pub total: u64,
    pub page: u32,
}

impl Snapshot {
    pub fn new(records: Vec<Student>, total: u64, page: u32) -> Self {
        Self {
            records,
            total,
            page,
        }
    }

    /// Builds a first-page snapshot from the records matching `term`.
    pub fn matching(records: &[Student], term: &str) -> Self {
        let found: Vec<Student> = records.iter().filter(|s| s.matches(term)).cloned().collect();
        let total = found.len() as u64;
        Self::new(found, total, 0)
    }

    /// Builds a first-page snapshot from the records `filter` accepts.
    pub fn filtered(records: &[Student], filter: &StudentFilter) -> Self {
        let found: Vec<Student> = records.iter().filter(|s| filter.accepts(s)).cloned().collect();
        let total = found.len() as u64;
        Self::new(found, total, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::fixtures::student;

    #[test]
    fn test_matching_keeps_order_and_counts() {
        let records = vec![
            student("1", "Aminata", "Sow"),
            student("2", "Fatou", "Diop"),
            student("3", "Awa", "Sow"),
        ];

        let result = Snapshot::matching(&records, "sow");
        assert_eq!(result.total, 2);
        assert_eq!(result.page, 0);
        assert_eq!(result.records[0].first_name, "Aminata");
        assert_eq!(result.records[1].first_name, "Awa");
    }

    #[test]
    fn test_filtered_by_program() {
        let mut architect = student("2", "Fatou", "Diop");
        architect.program = "Architecture".to_string();
        let records = vec![student("1", "Aminata", "Sow"), architect];

        let result = Snapshot::filtered(&records, &StudentFilter::program("architecture"));
        assert_eq!(result.total, 1);
        assert_eq!(result.records[0].last_name, "Diop");
    }

    #[test]
    fn test_matching_no_hits() {
        let records = vec![student("1", "Aminata", "Sow")];
        let result = Snapshot::matching(&records, "zzz");
        assert!(result.records.is_empty());
        assert_eq!(result.total, 0);
    }
}
