use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use maxmin_report::{config::AppConfig, energy, observability, period::Period};
use meter_client::{
    db::line_loss_queries,
    domain::{LineLossFeeder, RegisterEntry},
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use time::Month;

fn parse_args() -> Result<(i32, Month)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [year, month] = args.as_slice() else {
        bail!("usage: line_losses <year> <month>");
    };
    let year: i32 = year.parse().with_context(|| format!("invalid year '{year}'"))?;
    let month: u8 = month.parse().with_context(|| format!("invalid month '{month}'"))?;
    Ok((year, Month::try_from(month)?))
}

async fn summarize(pool: &PgPool, feeder: &LineLossFeeder, period: &Period) -> Result<energy::MonthlyLineEnergy> {
    // Include the day before the month so its final seeds the first initial.
    let from = period.start.previous_day().unwrap_or(period.start);
    let mut entries = line_loss_queries::fetch_register_entries(pool, &feeder.id, from, period.end).await?;

    let previous: Option<RegisterEntry> = match entries.first() {
        Some(first) if first.date < period.start.to_string() => Some(entries.remove(0)),
        _ => None,
    };

    Ok(energy::month_summary(feeder, previous.as_ref(), &entries))
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let (year, month) = parse_args()?;
    let cfg = AppConfig::load()?;
    let db = cfg.database()?;

    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .connect(&db.uri)
        .await?;

    let period = Period::month(year, month)?;
    let feeders = line_loss_queries::list_line_feeders(&pool).await?;

    let summaries = try_join_all(feeders.iter().map(|f| summarize(&pool, f, &period))).await?;

    for s in &summaries {
        tracing::info!(
            feeder = %s.feeder_name,
            days = s.days.len(),
            import = s.total.total_import(),
            export = s.total.total_export(),
            loss_percent = s.loss_percent,
            "line loss computed"
        );
    }

    tokio::fs::create_dir_all(&cfg.output.dir).await?;
    let path = cfg
        .output
        .dir
        .join(format!("line-losses-{year}-{:02}.json", u8::from(month)));
    tokio::fs::write(&path, serde_json::to_vec_pretty(&summaries)?).await?;

    tracing::info!(lines = summaries.len(), path = %path.display(), "line loss summary written");

    Ok(())
}
