use anyhow::Result;
use sqlx::PgPool;
use time::Date;

use crate::domain::{LineLossFeeder, RegisterEntry};

pub async fn list_line_feeders(pool: &PgPool) -> Result<Vec<LineLossFeeder>> {
    let rows = sqlx::query_as::<_, LineLossFeeder>(
        r#"
        SELECT
            id,
            name,
            end1_name,
            end2_name,
            end1_import_mf,
            end1_export_mf,
            end2_import_mf,
            end2_export_mf
        FROM feeders
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Daily final register values for one line within `[start, end]`, oldest first.
pub async fn fetch_register_entries(
    pool: &PgPool,
    feeder_id: &str,
    start: Date,
    end: Date,
) -> Result<Vec<RegisterEntry>> {
    let rows = sqlx::query_as::<_, RegisterEntry>(
        r#"
        SELECT
            feeder_id,
            date,
            end1_import_final,
            end1_export_final,
            end2_import_final,
            end2_export_final
        FROM entries
        WHERE feeder_id = $1
          AND date >= $2
          AND date <= $3
        ORDER BY date
        "#,
    )
    .bind(feeder_id)
    .bind(start.to_string())
    .bind(end.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
