//! Status table parsing.
//!
//! The tool prints `status` as a human-readable table: a header line, a
//! separator line, then one pipe-delimited row per matching deployment. Only
//! the first data row is read. This module is the single place coupled to
//! that layout; a machine-readable status mode would replace
//! [`TableParser`] behind [`StatusParser`] and nothing else.

use crate::RuntimeError;
use serde::{Deserialize, Serialize};

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackStatusRecord {
    pub pack_name: String,
    pub registry_name: String,
    pub deployment_name: String,
    pub job_name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    Found(PackStatusRecord),
    /// The tool reported no deployment matching the filters.
    NotFound,
}

impl StatusLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, StatusLookup::Found(_))
    }

    pub fn into_record(self) -> Option<PackStatusRecord> {
        match self {
            StatusLookup::Found(record) => Some(record),
            StatusLookup::NotFound => None,
        }
    }
}

/// Where the data row sits and how its fields are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    /// Zero-based index of the first data row.
    pub data_line: usize,
    pub delimiter: char,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            data_line: 2,
            delimiter: '|',
        }
    }
}

pub trait StatusParser {
    fn parse(&self, raw: &str) -> Result<StatusLookup, RuntimeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableParser {
    format: TableFormat,
}

impl TableParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: TableFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }
}

// Rows with this many fields or fewer mean "no match", not a malformed row.
const NOT_FOUND_MAX_FIELDS: usize = 3;
const RECORD_FIELDS: usize = 5;

impl StatusParser for TableParser {
    fn parse(&self, raw: &str) -> Result<StatusLookup, RuntimeError> {
        let lines: Vec<&str> = raw.split('\n').collect();
        let Some(row) = lines.get(self.format.data_line) else {
            return Err(RuntimeError::UnexpectedOutput(format!(
                "expected at least {} lines, got {}",
                self.format.data_line + 1,
                lines.len()
            )));
        };
        let row = row.strip_suffix('\r').unwrap_or(row);

        let fields: Vec<&str> = row.split(self.format.delimiter).map(str::trim).collect();
        if fields.len() <= NOT_FOUND_MAX_FIELDS {
            return Ok(StatusLookup::NotFound);
        }
        if fields.len() < RECORD_FIELDS {
            return Err(RuntimeError::UnexpectedOutput(format!(
                "status row has {} fields, expected {RECORD_FIELDS}: '{row}'",
                fields.len()
            )));
        }

        Ok(StatusLookup::Found(PackStatusRecord {
            pack_name: fields[0].to_owned(),
            registry_name: fields[1].to_owned(),
            deployment_name: fields[2].to_owned(),
            job_name: fields[3].to_owned(),
            status: fields[4].to_owned(),
        }))
    }
}

/// Parse status output with the tool's default table layout.
pub fn parse_status(raw: &str) -> Result<StatusLookup, RuntimeError> {
    TableParser::new().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_data_row() {
        let lookup = parse_status("H1\nSEP\nA|B|C|D|E\n").unwrap();
        assert_eq!(
            lookup,
            StatusLookup::Found(PackStatusRecord {
                pack_name: "A".to_owned(),
                registry_name: "B".to_owned(),
                deployment_name: "C".to_owned(),
                job_name: "D".to_owned(),
                status: "E".to_owned(),
            })
        );
    }

    #[test]
    fn three_fields_is_not_found() {
        assert_eq!(
            parse_status("H1\nSEP\nA|B|C\n").unwrap(),
            StatusLookup::NotFound
        );
    }

    #[test]
    fn empty_data_row_is_not_found() {
        assert_eq!(parse_status("H1\nSEP\n").unwrap(), StatusLookup::NotFound);
    }

    #[test]
    fn too_few_lines_is_an_error() {
        let err = parse_status("H1\nSEP").unwrap_err();
        assert!(matches!(err, RuntimeError::UnexpectedOutput(_)));
        assert!(parse_status("").is_err());
    }

    #[test]
    fn four_fields_is_an_error_not_a_panic() {
        let err = parse_status("H1\nSEP\nA|B|C|D\n").unwrap_err();
        assert!(err.to_string().contains("4 fields"));
    }

    #[test]
    fn only_first_data_row_is_read() {
        let lookup = parse_status("H\nS\nA|B|C|D|running\nX|Y|Z|W|pending\n").unwrap();
        assert_eq!(lookup.into_record().unwrap().status, "running");
    }

    #[test]
    fn padded_fields_are_trimmed() {
        let raw = "PACK | REGISTRY | DEPLOYMENT | JOB | STATUS\r\n----\r\n redis | r1 | d1 | d1 | running \r\n";
        let record = parse_status(raw).unwrap().into_record().unwrap();
        assert_eq!(record.pack_name, "redis");
        assert_eq!(record.status, "running");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = parse_status("H\nS\nA|B|C|D|E|F\n")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.status, "E");
    }

    #[test]
    fn custom_format() {
        let parser = TableParser::with_format(TableFormat {
            data_line: 0,
            delimiter: ',',
        });
        let lookup = parser.parse("a,b,c,d,e").unwrap();
        assert!(lookup.is_found());
        assert_eq!(parser.format().delimiter, ',');
    }

    #[test]
    fn record_serializes_to_json() {
        let record = parse_status("H\nS\nredis|r1|d1|job|running")
            .unwrap()
            .into_record()
            .unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"job_name\":\"job\""));
    }
}
