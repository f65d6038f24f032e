//! Output file naming.
//!
//! Per-page export names and archive names follow a fixed convention that
//! downstream tooling depends on: `page-<NNN>-<sanitized source>.<ext>`
//! for entries, and an ISO timestamp with `T`/`:` flattened to `-` as the
//! archive suffix.

use chrono::{DateTime, Utc};

/// Maximum length of a sanitized source name.
const MAX_NAME_LEN: usize = 50;

/// Sanitize a source file name for use inside an output file name.
///
/// The extension is stripped, anything outside `[A-Za-z0-9_-]` becomes an
/// underscore, and the result is truncated to 50 characters.
pub fn sanitize_source_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect()
}

/// Name for one exported page: `page-<NNN>-<sanitized>.<ext>`.
///
/// The page number is the 1-based number within the source file, zero
/// padded to three digits.
pub fn page_file_name(page_number: u32, source_name: &str, extension: &str) -> String {
    format!(
        "page-{:03}-{}.{}",
        page_number,
        sanitize_source_name(source_name),
        extension
    )
}

/// Archive name with a timestamp suffix: `<stem>-<YYYY-MM-DD-HH-MM-SS>.zip`.
pub fn archive_file_name(stem: &str) -> String {
    archive_file_name_at(stem, Utc::now())
}

/// Archive name for an explicit timestamp (kept separate for testing).
pub fn archive_file_name_at(stem: &str, at: DateTime<Utc>) -> String {
    format!("{stem}-{}.zip", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Suggested name for a split export covering `start`-`end`.
pub fn split_file_name(start: u32, end: u32) -> String {
    format!("split_{start}-{end}.pdf")
}

/// Suggested name for the combined export of the selected pages.
pub fn document_file_name() -> String {
    "organized-document.pdf".to_string()
}

/// Suggested name for a full-document export, timestamped like archives.
pub fn full_document_file_name() -> String {
    full_document_file_name_at(Utc::now())
}

/// Full-document name for an explicit timestamp (kept separate for testing).
pub fn full_document_file_name_at(at: DateTime<Utc>) -> String {
    format!("full-document-{}.pdf", at.format("%Y-%m-%d-%H-%M-%S"))
}
