use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no ID column in report header {0:?}")]
    IdColumnMissing(String),
}

/// `ID` preceded by start-of-line or a space, followed by its padding. The
/// ID column is expected to be the first column of the report.
fn id_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("( |^)ID +").expect("hardcoded pattern compiles"))
}

/// Locates the ID column of a tabular report from its header line and
/// extracts ids from data rows.
#[derive(Debug, Default)]
pub struct ReportParser {
    /// Byte range `[start, end)` of the ID column in each row.
    columns: Option<(usize, usize)>,
}

impl ReportParser {
    pub fn new() -> Self {
        ReportParser::default()
    }

    /// Derive the column offsets from the report's header line. A header
    /// without an ID column is surfaced, not guessed around.
    pub fn set_header_line(&mut self, header: &str) -> Result<(), ReportError> {
        let m = id_column_re()
            .find(header)
            .ok_or_else(|| ReportError::IdColumnMissing(header.to_owned()))?;
        // the last padding space belongs to the gap, not the column
        self.columns = Some((m.start(), m.end() - 1));
        Ok(())
    }

    /// Width of the ID column in cells; `None` before a header was set.
    pub fn id_column_width(&self) -> Option<usize> {
        self.columns.map(|(start, end)| end - start + 1)
    }

    /// The task id in `line`'s ID column, if it holds a number.
    pub fn task_id(&self, line: &str) -> Option<u32> {
        let (start, end) = self.columns?;
        let slice = line.get(start..end.min(line.len()))?;
        slice.trim().parse().ok()
    }
}
