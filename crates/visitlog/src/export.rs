//! CSV export of the displayed records.
//!
//! Exports take the already filtered and sorted projection and never touch
//! the register itself.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::visitor::Visitor;

/// Column titles of the header line.
pub const CSV_HEADER: [&str; 5] = ["Name", "Flat Number", "Purpose", "Mobile", "Date & Time"];

/// A rendered export, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested file name, `visitor_records_<YYYY-MM-DD>.csv`.
    pub file_name: String,
    /// UTF-8 CSV text without a trailing newline.
    pub contents: String,
    /// Number of data lines.
    pub rows: usize,
}

impl CsvExport {
    /// Write the export into `dir`, creating it if needed.
    ///
    /// Returns the full path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        info!(path = %path.display(), rows = self.rows, "Exported visitor records");
        Ok(path)
    }
}

/// File name for an export made on `date`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("visitor_records_{}.csv", date.format("%Y-%m-%d"))
}

/// Render a timestamp for people, e.g. `3/5/2024, 2:30:00 PM`.
#[must_use]
pub fn format_timestamp<Tz>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render `records` as CSV, with times shown in `tz`.
///
/// Returns `None` when there is nothing to export.
#[must_use]
pub fn export_csv<Tz>(records: &[&Visitor], today: NaiveDate, tz: &Tz) -> Option<CsvExport>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if records.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for record in records {
        let when = format_timestamp(record.timestamp(), tz);
        lines.push(
            [
                quote(record.name()),
                quote(record.flat_number()),
                quote(record.purpose().as_str()),
                quote(record.mobile()),
                quote(&when),
            ]
            .join(","),
        );
    }

    Some(CsvExport {
        file_name: export_file_name(today),
        contents: lines.join("\n"),
        rows: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::Purpose;
    use chrono::FixedOffset;

    fn visitor(id: &str, name: &str, flat: &str, hour: u32) -> Visitor {
        Visitor::new(
            id,
            name,
            flat,
            Purpose::Maintenance,
            "9876543210",
            Utc.with_ymd_and_hms(2024, 3, 5, hour, 30, 0).unwrap(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 9).unwrap()
    }

    #[test]
    fn test_empty_export_is_none() {
        assert!(export_csv(&[], today(), &Utc).is_none());
    }

    #[test]
    fn test_export_lines() {
        let a = visitor("1", "Ravi Kumar", "A-101", 14);
        let b = visitor("2", "Asha", "B-2", 9);
        let export = export_csv(&[&a, &b], today(), &Utc).unwrap();

        let lines: Vec<&str> = export.contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(export.rows, 2);
        assert_eq!(lines[0], "Name,Flat Number,Purpose,Mobile,Date & Time");
        assert_eq!(
            lines[1],
            r#""Ravi Kumar","A-101","Maintenance","9876543210","3/5/2024, 2:30:00 PM""#
        );
        assert_eq!(
            lines[2],
            r#""Asha","B-2","Maintenance","9876543210","3/5/2024, 9:30:00 AM""#
        );
        assert!(!export.contents.ends_with('\n'));
    }

    #[test]
    fn test_every_data_field_is_quoted() {
        let a = visitor("1", "Ravi", "A-1", 1);
        let export = export_csv(&[&a], today(), &Utc).unwrap();
        let line = export.contents.lines().nth(1).unwrap();
        // 5 fields, each wrapped in a pair of quotes
        assert_eq!(line.matches('"').count(), 10);
        assert!(line.starts_with('"') && line.ends_with('"'));
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let a = visitor("1", "Ravi \"Ace\" Kumar", "A-1, North", 1);
        let export = export_csv(&[&a], today(), &Utc).unwrap();
        let line = export.contents.lines().nth(1).unwrap();
        assert!(line.starts_with(r#""Ravi ""Ace"" Kumar","A-1, North","#));
    }

    #[test]
    fn test_file_name_uses_export_date() {
        let a = visitor("1", "Ravi", "A-1", 1);
        let export = export_csv(&[&a], today(), &Utc).unwrap();
        assert_eq!(export.file_name, "visitor_records_2024-07-09.csv");
    }

    #[test]
    fn test_format_timestamp_in_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 5).unwrap();
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_timestamp(ts, &ist), "1/1/2025, 1:30:05 AM");
        assert_eq!(format_timestamp(ts, &Utc), "12/31/2024, 8:00:05 PM");
    }

    #[test]
    fn test_write_to_creates_file() {
        let dir = std::env::temp_dir().join(format!("visitlog_export_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let a = visitor("1", "Ravi", "A-1", 1);
        let export = export_csv(&[&a], today(), &Utc).unwrap();
        let path = export.write_to(&dir).unwrap();

        assert_eq!(path, dir.join("visitor_records_2024-07-09.csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), export.contents);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
