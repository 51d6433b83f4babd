use anyhow::{bail, Context, Result};
use maxmin_report::{
    build_monthly_report,
    config::{AppConfig, OutputFormat, SourceKind},
    observability,
    sinks::{CsvFileSink, JsonFileSink, ReportSink},
    store::{PgReadingStore, ReadingStore, SnapshotStore},
};
use sqlx::postgres::PgPoolOptions;

fn parse_args() -> Result<(i32, u8)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [year, month] = args.as_slice() else {
        bail!("usage: maxmin-report <year> <month>");
    };
    let year: i32 = year.parse().with_context(|| format!("invalid year '{year}'"))?;
    let month: u8 = month.parse().with_context(|| format!("invalid month '{month}'"))?;
    Ok((year, month))
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let (year, month) = parse_args()?;
    let cfg = AppConfig::load()?;

    let store: Box<dyn ReadingStore> = match cfg.source.kind {
        SourceKind::Postgres => {
            let db = cfg.database()?;
            let pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .connect(&db.uri)
                .await?;
            Box::new(PgReadingStore::new(pool))
        }
        SourceKind::Snapshot => {
            let path = cfg
                .source
                .snapshot_path
                .as_ref()
                .context("source.snapshot_path is not set")?;
            Box::new(SnapshotStore::load(path).await?)
        }
    };

    let sink: Box<dyn ReportSink> = match cfg.output.format {
        OutputFormat::Json => Box::new(JsonFileSink::new(&cfg.output.dir)),
        OutputFormat::Csv => Box::new(CsvFileSink::new(&cfg.output.dir)),
    };

    let report = build_monthly_report(store.as_ref(), year, month).await?;
    let path = sink.write(&report).await?;

    tracing::info!(year, month, path = %path.display(), "max/min report generated");

    Ok(())
}
