use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use maxmin_report::{config::AppConfig, consumption, observability, period::Period};
use meter_client::{db::energy_queries, domain::EnergySheet};
use sqlx::postgres::{PgPool, PgPoolOptions};
use time::Month;

fn parse_args() -> Result<(i32, Month)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [year, month] = args.as_slice() else {
        bail!("usage: energy_consumption <year> <month>");
    };
    let year: i32 = year.parse().with_context(|| format!("invalid year '{year}'"))?;
    let month: u8 = month.parse().with_context(|| format!("invalid month '{month}'"))?;
    Ok((year, Month::try_from(month)?))
}

async fn summarize(pool: &PgPool, sheet: &EnergySheet, period: &Period) -> Result<consumption::MonthlySheetEnergy> {
    let meters = energy_queries::list_meters(pool, &sheet.id).await?;

    // The day before the month seeds the first day's initials.
    let from = period.start.previous_day().unwrap_or(period.start);
    let rows = energy_queries::fetch_meter_readings(pool, &sheet.id, from, period.end).await?;
    let start = period.start.to_string();
    let (previous, readings): (Vec<_>, Vec<_>) = rows.into_iter().partition(|r| r.date < start);

    Ok(consumption::sheet_summary(sheet, &meters, &previous, &readings))
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
    let sheets = energy_queries::list_sheets(&pool).await?;

    let summaries = try_join_all(sheets.iter().map(|s| summarize(&pool, s, &period))).await?;

    for s in &summaries {
        tracing::info!(
            sheet = %s.sheet_name,
            days = s.days.len(),
            meters = s.meters.len(),
            total_consumption = s.total_consumption,
            "sheet consumption computed"
        );
    }

    tokio::fs::create_dir_all(&cfg.output.dir).await?;
    let path = cfg
        .output
        .dir
        .join(format!("energy-consumption-{year}-{:02}.json", u8::from(month)));
    tokio::fs::write(&path, serde_json::to_vec_pretty(&summaries)?).await?;

    tracing::info!(sheets = summaries.len(), path = %path.display(), "energy consumption summary written");

    Ok(())
}
