//! CSV format handling for lending commands, inventory and issue history
//!
//! This module centralizes all CSV format concerns:
//! - `CsvRecord` for deserializing command rows
//! - Conversion from CSV rows to `LendingCommand`
//! - Inventory and issue history serialization
//!
//! Nothing here touches the filesystem.

use crate::types::{Book, BookId, CommandKind, Issue, LendingCommand, MemberId};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use std::io::Write;

/// One row of the command CSV
///
/// Columns: `type, member, book, date, due, copies`. Which of the optional
/// columns are required depends on the command type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub command: String,
    pub member: Option<MemberId>,
    pub book: BookId,
    pub date: Option<String>,
    pub due: Option<String>,
    pub copies: Option<u32>,
}

/// Parse a command type name, ignoring case
pub fn parse_command_kind(name: &str) -> Option<CommandKind> {
    match name.to_lowercase().as_str() {
        "stock" => Some(CommandKind::Stock),
        "issue" => Some(CommandKind::Issue),
        "return" => Some(CommandKind::Return),
        "join" => Some(CommandKind::Join),
        "leave" => Some(CommandKind::Leave),
        _ => None,
    }
}

/// Parse a timestamp given as `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("Invalid date '{}'", value))
}

/// Format a timestamp as RFC 3339 UTC with second precision
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a CsvRecord to a LendingCommand
///
/// Validates that every column the command type needs is present and
/// parses its dates.
///
/// # Returns
///
/// * `Ok(LendingCommand)` - Successfully converted command
/// * `Err(String)` - What was missing or malformed
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LendingCommand, String> {
    let book = csv_record.book;
    let kind = parse_command_kind(&csv_record.command).ok_or_else(|| {
        format!(
            "Invalid command type: '{}' for book {}",
            csv_record.command, book
        )
    })?;

    let member = || {
        csv_record
            .member
            .ok_or_else(|| format!("{:?} command for book {} requires a member", kind, book))
    };
    let date = |field: Option<&String>, column: &str| -> Result<DateTime<Utc>, String> {
        match field.map(|value| value.trim()) {
            Some(value) if !value.is_empty() => parse_date(value)
                .map_err(|e| format!("{} in '{}' of {:?} command for book {}", e, column, kind, book)),
            _ => Err(format!(
                "{:?} command for book {} requires a '{}' column",
                kind, book, column
            )),
        }
    };

    let command = match kind {
        CommandKind::Stock => LendingCommand::Stock {
            book,
            copies: csv_record
                .copies
                .ok_or_else(|| format!("Stock command for book {} requires copies", book))?,
        },
        CommandKind::Issue => LendingCommand::Issue {
            member: member()?,
            book,
            issue_date: date(csv_record.date.as_ref(), "date")?,
            estimated_return_date: date(csv_record.due.as_ref(), "due")?,
        },
        CommandKind::Return => LendingCommand::Return {
            member: member()?,
            book,
            return_date: date(csv_record.date.as_ref(), "date")?,
        },
        CommandKind::Join => LendingCommand::Join {
            member: member()?,
            book,
        },
        CommandKind::Leave => LendingCommand::Leave {
            member: member()?,
            book,
        },
    };

    Ok(command)
}

/// Write book states to CSV format
///
/// Columns: `book, total, available, borrow_count`, sorted by book.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_books_csv(books: &[Book], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["book", "total", "available", "borrow_count"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = books.to_vec();
    sorted.sort_by_key(|book| book.id);

    for book in sorted {
        writer
            .write_record(&[
                book.id.to_string(),
                book.total_copies.to_string(),
                book.available_copies.to_string(),
                book.borrow_count.to_string(),
            ])
            .map_err(|e| format!("Failed to write book record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write issue history to CSV format
///
/// Columns: `member, book, issue_date, estimated_return_date, return_date,
/// status, delayed_fine`, sorted by book, member and issue date. Identifiers
/// are left out because their order depends on scheduling.
pub fn write_issues_csv(issues: &[Issue], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "member",
            "book",
            "issue_date",
            "estimated_return_date",
            "return_date",
            "status",
            "delayed_fine",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = issues.to_vec();
    sorted.sort_by_key(|issue| (issue.book, issue.member, issue.issue_date));

    for issue in sorted {
        writer
            .write_record(&[
                issue.member.to_string(),
                issue.book.to_string(),
                format_date(&issue.issue_date),
                format_date(&issue.estimated_return_date),
                issue.return_date.as_ref().map(format_date).unwrap_or_default(),
                issue.status.as_str().to_string(),
                format!("{:.2}", issue.delayed_fine),
            ])
            .map_err(|e| format!("Failed to write issue record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
