use std::path::PathBuf;

use crate::report::MonthlyReport;

pub mod csv_file;
pub mod json_file;

pub use csv_file::CsvFileSink;
pub use json_file::JsonFileSink;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Destination for an assembled monthly report.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist `report`, returning where it was written.
    async fn write(&self, report: &MonthlyReport) -> Result<PathBuf, SinkError>;
}

/// `maxmin-2024-03.json` style file name for a report.
pub(crate) fn file_name(report: &MonthlyReport, extension: &str) -> String {
    format!("maxmin-{}-{:02}.{extension}", report.year, report.month)
}
