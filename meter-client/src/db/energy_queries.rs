use anyhow::Result;
use sqlx::PgPool;
use time::Date;

use crate::domain::{EnergyMeter, EnergySheet, MeterReading};

pub async fn list_sheets(pool: &PgPool) -> Result<Vec<EnergySheet>> {
    let rows = sqlx::query_as::<_, EnergySheet>(
        r#"
        SELECT id, name
        FROM energy_sheets
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn list_meters(pool: &PgPool, sheet_id: &str) -> Result<Vec<EnergyMeter>> {
    let rows = sqlx::query_as::<_, EnergyMeter>(
        r#"
        SELECT id, sheet_id, name, mf, unit
        FROM energy_meters
        WHERE sheet_id = $1
        ORDER BY name
        "#,
    )
    .bind(sheet_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Meter finals logged on one sheet within `[start, end]`, oldest first.
///
/// Rows for meters no longer registered on the sheet are returned as stored.
pub async fn fetch_meter_readings(
    pool: &PgPool,
    sheet_id: &str,
    start: Date,
    end: Date,
) -> Result<Vec<MeterReading>> {
    let rows = sqlx::query_as::<_, MeterReading>(
        r#"
        SELECT
            sheet_id,
            meter_id,
            date,
            final_reading
        FROM energy_readings
        WHERE sheet_id = $1
          AND date >= $2
          AND date <= $3
        ORDER BY date, meter_id
        "#,
    )
    .bind(sheet_id)
    .bind(start.to_string())
    .bind(end.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
