use std::path::PathBuf;

use serde::Serialize;
use time::Date;

use crate::{
    report::{FeederStats, MonthlyReport},
    stats::StatsResult,
};

use super::{file_name, ReportSink, SinkError};

const NO_VALUE: &str = "-";

/// One reported quantity of one feeder in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub period: String,
    pub sl_no: usize,
    pub feeder: String,
    pub metric: &'static str,
    pub value: String,
    pub date: String,
    pub time: String,
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| NO_VALUE.to_string(), |v| format!("{v:.2}"))
}

fn fmt_date(date: Option<Date>) -> String {
    date.map_or_else(String::new, |d| d.to_string())
}

type Metric<'a> = (&'static str, Option<f64>, Option<Date>, Option<&'a str>);

fn metrics_of(stats: &StatsResult) -> Vec<Metric<'_>> {
    match stats {
        StatsResult::Line(s) => vec![
            ("max_amps", s.max_amps, s.max_amps_date, s.max_amps_time.as_deref()),
            ("max_mw", s.max_mw, s.max_mw_date, s.max_mw_time.as_deref()),
            ("max_mvar", s.max_mvar, s.max_mw_date, s.max_mw_time.as_deref()),
            ("min_amps", s.min_amps, s.min_amps_date, s.min_amps_time.as_deref()),
            ("min_mw", s.min_mw, s.min_mw_date, s.min_mw_time.as_deref()),
            ("min_mvar", s.min_mvar, s.min_mw_date, s.min_mw_time.as_deref()),
            ("avg_amps", s.avg_amps, None, None),
            ("avg_mw", s.avg_mw, None, None),
        ],
        StatsResult::Bus(s) => vec![
            ("max_400kv", s.max_400kv, s.max_400kv_date, s.max_400kv_time.as_deref()),
            ("max_220kv", s.max_220kv, s.max_220kv_date, s.max_220kv_time.as_deref()),
            ("min_400kv", s.min_400kv, s.min_400kv_date, s.min_400kv_time.as_deref()),
            ("min_220kv", s.min_220kv, s.min_220kv_date, s.min_220kv_time.as_deref()),
            ("max_load_mw", s.max_load, s.max_load_date, s.max_load_time.as_deref()),
            ("max_load_mvar", s.max_load_mvar, s.max_load_date, s.max_load_time.as_deref()),
        ],
    }
}

fn feeder_rows(period: &str, row: &FeederStats) -> Vec<MetricRow> {
    metrics_of(&row.stats)
        .into_iter()
        .map(|(metric, value, date, time)| MetricRow {
            period: period.to_string(),
            sl_no: row.sl_no,
            feeder: row.feeder_name.clone(),
            metric,
            value: fmt_value(value),
            date: fmt_date(date),
            time: time.unwrap_or_default().to_string(),
        })
        .collect()
}

/// Flatten a report into long-format rows, ICT demand and loading after each period's feeders.
pub fn report_rows(report: &MonthlyReport) -> Vec<MetricRow> {
    let mut rows = Vec::new();
    for period in &report.periods {
        let name = period.period.name.as_str();
        for feeder in &period.feeders {
            rows.extend(feeder_rows(name, feeder));
        }
        for (i, ict) in period.ict_loading.iter().enumerate() {
            for (metric, value) in [("max_demand_mw", ict.max_demand), ("loading_percent", ict.loading_percent)] {
                rows.push(MetricRow {
                    period: name.to_string(),
                    sl_no: i + 1,
                    feeder: ict.feeder_name.clone(),
                    metric,
                    value: fmt_value(value),
                    date: String::new(),
                    time: String::new(),
                });
            }
        }
    }
    rows
}

/// Writes the report as a long-format CSV into `dir`.
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ReportSink for CsvFileSink {
    async fn write(&self, report: &MonthlyReport) -> Result<PathBuf, SinkError> {
        let rows = report_rows(report);

        let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        for row in &rows {
            writer.serialize(row).map_err(|e| SinkError::Encode(e.to_string()))?;
        }
        let body = writer.into_inner().map_err(|e| SinkError::Encode(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name(report, "csv"));
        tokio::fs::write(&path, body).await?;

        tracing::info!(path = %path.display(), rows = rows.len(), "csv report written");
        Ok(path)
    }
}
