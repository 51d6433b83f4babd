use anyhow::Result;
use sqlx::PgPool;
use time::Date;

use crate::domain::{Feeder, MaxMinEntry};

/// All max/min feeders in the registry.
pub async fn list_feeders(pool: &PgPool) -> Result<Vec<Feeder>> {
    let rows = sqlx::query_as::<_, Feeder>(
        r#"
        SELECT id, name, type
        FROM max_min_feeders
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Resolve feeder names (as used by the grouping table) into registry rows.
///
/// Matching ignores case and surrounding whitespace. Names that are not
/// registered are silently absent from the result.
pub async fn list_feeders_by_name(pool: &PgPool, names: &[String]) -> Result<Vec<Feeder>> {
    let keys: Vec<String> = names.iter().map(|n| n.trim().to_uppercase()).collect();
    let rows = sqlx::query_as::<_, Feeder>(
        r#"
        SELECT id, name, type
        FROM max_min_feeders
        WHERE upper(trim(name)) = ANY($1)
        ORDER BY name
        "#,
    )
    .bind(&keys)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch every stored max/min entry for the given feeders within `[start, end]`.
///
/// Dates are stored as ISO strings, so the inclusive range is a plain
/// string comparison.
pub async fn fetch_entries(
    pool: &PgPool,
    feeder_ids: &[String],
    start: Date,
    end: Date,
) -> Result<Vec<MaxMinEntry>> {
    let rows = sqlx::query_as::<_, MaxMinEntry>(
        r#"
        SELECT
            id,
            feeder_id,
            date,
            data
        FROM max_min_entries
        WHERE feeder_id = ANY($1)
          AND date >= $2
          AND date <= $3
        ORDER BY feeder_id, date
        "#,
    )
    .bind(feeder_ids)
    .bind(start.to_string())
    .bind(end.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
