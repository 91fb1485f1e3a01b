//! Fixed catalogs offered when creating or editing a student.

pub const PROGRAMS: [&str; 6] = [
    "Génie Informatique",
    "Génie Civil",
    "Génie Électrique",
    "Génie Mécanique",
    "Génie Industriel",
    "Architecture",
];

pub const LEVELS: [&str; 5] = [
    "Licence 1",
    "Licence 2",
    "Licence 3",
    "Master 1",
    "Master 2",
];

/// Returns the catalog spelling of `program`, ignoring case.
pub fn find_program(program: &str) -> Option<&'static str> {
    PROGRAMS
        .iter()
        .copied()
        .find(|p| p.to_lowercase() == program.trim().to_lowercase())
}

/// Returns the catalog spelling of `level`, ignoring case.
pub fn find_level(level: &str) -> Option<&'static str> {
    LEVELS
        .iter()
        .copied()
        .find(|l| l.to_lowercase() == level.trim().to_lowercase())
}
