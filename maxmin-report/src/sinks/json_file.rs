use std::path::PathBuf;

use crate::report::MonthlyReport;

use super::{file_name, ReportSink, SinkError};

/// Writes the report as pretty-printed JSON into `dir`.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ReportSink for JsonFileSink {
    async fn write(&self, report: &MonthlyReport) -> Result<PathBuf, SinkError> {
        let body = serde_json::to_vec_pretty(report).map_err(|e| SinkError::Encode(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name(report, "json"));
        tokio::fs::write(&path, body).await?;

        tracing::info!(path = %path.display(), periods = report.periods.len(), "json report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_named_json_file() {
        let dir = std::env::temp_dir().join("maxmin_report_json_sink_test");
        let _ = std::fs::remove_dir_all(&dir);

        let report = MonthlyReport {
            year: 2024,
            month: 3,
            periods: Vec::new(),
        };
        let path = JsonFileSink::new(&dir).write(&report).await.unwrap();
        assert!(path.ends_with("maxmin-2024-03.json"));

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["year"], 2024);
        assert_eq!(written["month"], 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
