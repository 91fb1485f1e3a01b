use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::io::{self, Write};

use roster_core::models::catalog::{find_level, find_program, LEVELS, PROGRAMS};
use roster_core::{
    Action, Student, StudentDraft, StudentFilter, StudentId, StudentPatch, StudentStatus,
};

use super::{print_notice, Controller, OutputFormat};

#[derive(Args)]
pub struct StudentCommand {
    #[command(subcommand)]
    pub command: StudentSubcommand,
}

#[derive(Subcommand)]
pub enum StudentSubcommand {
    /// List students page by page
    List {
        /// Page number (0-based)
        #[arg(long, short, default_value_t = 0)]
        page: u32,

        /// Only students of this program
        #[arg(long, value_parser = parse_program)]
        program: Option<String>,

        /// Only students with this status (active, inactive or graduated)
        #[arg(long)]
        status: Option<StudentStatus>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Search by name, registration code or program
    Search {
        /// Search term (empty lists the first page)
        term: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a student's details
    Show {
        /// Student ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Register a new student
    Create {
        /// Registration code (e.g. GI-2024-001)
        #[arg(long)]
        code: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: NaiveDate,

        #[arg(long, value_parser = parse_program)]
        program: String,

        #[arg(long, value_parser = parse_level)]
        level: String,

        #[arg(long)]
        address: Option<String>,

        /// active, inactive or graduated
        #[arg(long, default_value = "active")]
        status: StudentStatus,
    },

    /// Update an existing student
    Update {
        /// Student ID
        id: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_program)]
        program: Option<String>,

        #[arg(long, value_parser = parse_level)]
        level: Option<String>,

        #[arg(long)]
        address: Option<String>,

        /// active, inactive or graduated
        #[arg(long)]
        status: Option<StudentStatus>,
    },

    /// Delete a student
    Delete {
        /// Student ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl StudentCommand {
    pub async fn run(&self, controller: &Controller) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StudentSubcommand::List {
                page,
                program,
                status,
                format,
            } => {
                let filter = StudentFilter {
                    program: program.clone(),
                    status: *status,
                };
                controller.filter(&filter, *page).await;
                print_page(controller, format)
            }

            StudentSubcommand::Search { term, format } => {
                controller.search(term).await;
                print_page(controller, format)
            }

            StudentSubcommand::Show { id, format } => {
                controller.load(0).await;
                let outcome = controller.get(&StudentId::from(id.as_str())).await?;
                if let Some(e) = &outcome.remote_error {
                    eprintln!("Warning: showing local copy ({})", e);
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&outcome.value)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", outcome.value);
                    }
                }
                Ok(())
            }

            StudentSubcommand::Create {
                code,
                first_name,
                last_name,
                email,
                phone,
                birth_date,
                program,
                level,
                address,
                status,
            } => {
                let draft = StudentDraft {
                    registration_code: non_blank("Registration code", code)?,
                    last_name: non_blank("Last name", last_name)?,
                    first_name: non_blank("First name", first_name)?,
                    email: non_blank("Email", email)?,
                    phone: phone.clone(),
                    birth_date: *birth_date,
                    program: program.clone(),
                    level: level.clone(),
                    address: address.clone(),
                    status: *status,
                };

                controller.load(0).await;
                let outcome = controller.create(draft).await?;
                print_notice(&controller.state());
                println!("Created student:");
                println!("{}", outcome.value);
                Ok(())
            }

            StudentSubcommand::Update {
                id,
                first_name,
                last_name,
                email,
                phone,
                birth_date,
                program,
                level,
                address,
                status,
            } => {
                let patch = StudentPatch {
                    last_name: last_name.clone(),
                    first_name: first_name.clone(),
                    email: email.clone(),
                    phone: phone.clone(),
                    birth_date: *birth_date,
                    program: program.clone(),
                    level: level.clone(),
                    address: address.clone(),
                    status: *status,
                };
                if patch.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let student = focus(controller, id).await?;
                let outcome = controller.update(&student.id, &patch).await?;
                print_notice(&controller.state());
                println!("Updated student:");
                println!("{}", outcome.value);
                Ok(())
            }

            StudentSubcommand::Delete { id, force } => {
                let student = focus(controller, id).await?;

                // Confirm deletion unless --force is used
                if !force {
                    print!(
                        "Delete student '{}' ({})? [y/N] ",
                        student.full_name(),
                        student.registration_code
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                controller.delete(&student.id).await?;
                print_notice(&controller.state());
                println!("Deleted student: {}", student.full_name());
                Ok(())
            }
        }
    }
}

/// Loads the first page, then makes sure `id` is part of the in-memory
/// collection so that mutations can fall back to it.
async fn focus(controller: &Controller, id: &str) -> Result<Student, Box<dyn std::error::Error>> {
    let id = StudentId::from(id);
    controller.load(0).await;

    let student = controller.get(&id).await?.value;
    if !controller.state().contains(&student.id) {
        tracing::debug!("adding {} to the working set", student.id);
        controller
            .store()
            .dispatch(Action::AddRecord(student.clone()));
    }
    Ok(student)
}

fn print_page(
    controller: &Controller,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = controller.state();
    print_notice(&state);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
        }
        OutputFormat::Text => {
            if state.records.is_empty() {
                println!("No students found");
                return Ok(());
            }

            println!(
                "{:<14}  {:<14}  {:<28}  {:<20}  {:<10}  STATUS",
                "ID", "CODE", "NAME", "PROGRAM", "LEVEL"
            );
            println!("{}", "-".repeat(104));
            for student in &state.records {
                println!(
                    "{:<14}  {:<14}  {:<28}  {:<20}  {:<10}  {}",
                    truncate(student.id.as_str(), 14),
                    truncate(&student.registration_code, 14),
                    truncate(&student.full_name(), 28),
                    truncate(&student.program, 20),
                    student.level,
                    student.status
                );
            }
            println!(
                "\nPage {}: {} of {} student(s)",
                state.page,
                state.records.len(),
                state.total
            );
        }
    }
    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let kept: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        value.to_string()
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field).into());
    }
    Ok(trimmed.to_string())
}

fn parse_program(value: &str) -> Result<String, String> {
    find_program(value)
        .map(str::to_string)
        .ok_or_else(|| format!("Unknown program. Valid options: {}", PROGRAMS.join(", ")))
}

fn parse_level(value: &str) -> Result<String, String> {
    find_level(value)
        .map(str::to_string)
        .ok_or_else(|| format!("Unknown level. Valid options: {}", LEVELS.join(", ")))
}
