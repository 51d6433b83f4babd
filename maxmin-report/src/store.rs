use std::{collections::HashMap, path::Path};

use meter_client::{
    db::max_min_queries,
    domain::{Feeder, FeederType, MaxMinEntry},
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{period::Period, reading::Reading};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Bulk access to the feeder registry and stored daily readings.
///
/// Implementations return fully materialized lists; ordering is not
/// guaranteed and callers sort as needed.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn list_feeders(&self) -> Result<Vec<Feeder>, StoreError>;

    /// Registry rows for the given names. Unknown names are absent from the result.
    async fn list_feeders_by_name(&self, names: &[String]) -> Result<Vec<Feeder>, StoreError>;

    /// Every reading of `feeders` dated within `period`.
    async fn fetch_readings(&self, feeders: &[Feeder], period: &Period) -> Result<Vec<Reading>, StoreError>;
}

/// Convert raw rows into typed readings, dropping rows that cannot be dated.
fn convert_entries(entries: &[MaxMinEntry], feeders: &[Feeder]) -> Vec<Reading> {
    let types: HashMap<&str, FeederType> = feeders
        .iter()
        .map(|f| (f.id.as_str(), f.feeder_type))
        .collect();

    let mut readings = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(kind) = types.get(entry.feeder_id.as_str()) else {
            continue;
        };
        match Reading::from_entry(entry, *kind) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                tracing::warn!(error = %e, entry_id = ?entry.id, "dropping stored reading");
                metrics::counter!("readings_rejected_total").increment(1);
            }
        }
    }
    readings
}

pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReadingStore for PgReadingStore {
    async fn list_feeders(&self) -> Result<Vec<Feeder>, StoreError> {
        max_min_queries::list_feeders(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn list_feeders_by_name(&self, names: &[String]) -> Result<Vec<Feeder>, StoreError> {
        max_min_queries::list_feeders_by_name(&self.pool, names)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn fetch_readings(&self, feeders: &[Feeder], period: &Period) -> Result<Vec<Reading>, StoreError> {
        if feeders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = feeders.iter().map(|f| f.id.clone()).collect();
        let entries = max_min_queries::fetch_entries(&self.pool, &ids, period.start, period.end)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(feeders = ids.len(), entries = entries.len(), period = %period.name, "fetched max/min entries");
        Ok(convert_entries(&entries, feeders))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    pub feeders: Vec<Feeder>,
    #[serde(default)]
    pub entries: Vec<MaxMinEntry>,
}

/// In-memory store over an exported registry and entry dump.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshot: Snapshot,
}

impl SnapshotStore {
    pub fn new(feeders: Vec<Feeder>, entries: Vec<MaxMinEntry>) -> Self {
        Self {
            snapshot: Snapshot { feeders, entries },
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot =
            serde_json::from_str(contents).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        Ok(Self { snapshot })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Snapshot(format!("{}: {e}", path.display())))?;
        let store = Self::from_json_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            feeders = store.snapshot.feeders.len(),
            entries = store.snapshot.entries.len(),
            "loaded reading snapshot"
        );
        Ok(store)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

#[async_trait::async_trait]
impl ReadingStore for SnapshotStore {
    async fn list_feeders(&self) -> Result<Vec<Feeder>, StoreError> {
        let mut feeders = self.snapshot.feeders.clone();
        feeders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(feeders)
    }

    async fn list_feeders_by_name(&self, names: &[String]) -> Result<Vec<Feeder>, StoreError> {
        let wanted: Vec<String> = names.iter().map(|n| name_key(n)).collect();
        let mut feeders: Vec<Feeder> = self
            .snapshot
            .feeders
            .iter()
            .filter(|f| wanted.contains(&name_key(&f.name)))
            .cloned()
            .collect();
        feeders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(feeders)
    }

    async fn fetch_readings(&self, feeders: &[Feeder], period: &Period) -> Result<Vec<Reading>, StoreError> {
        let readings = convert_entries(&self.snapshot.entries, feeders);
        Ok(readings
            .into_iter()
            .filter(|r| period.contains(r.date))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn snapshot() -> SnapshotStore {
        SnapshotStore::from_json_str(
            &json!({
                "feeders": [
                    {"id": "f2", "name": "220KV PARIGI-2", "type": "feeder_220kv"},
                    {"id": "f1", "name": "220KV PARIGI-1", "type": "feeder_220kv"},
                    {"id": "bus", "name": "Bus Voltages & Station Load", "type": "bus_station"}
                ],
                "entries": [
                    {"feeder_id": "f1", "date": "2024-03-01", "data": {"max": {"mw": "120", "time": "19:00"}}},
                    {"feeder_id": "f1", "date": "2024-03-20", "data": {"max": {"mw": 110}}},
                    {"feeder_id": "f1", "date": "01/03/2024", "data": {}},
                    {"feeder_id": "f2", "date": "2024-03-01", "data": {"max": {"mw": 118}}},
                    {"feeder_id": "bus", "date": "2024-03-01", "data": {"max_bus_voltage_400kv": {"value": 412}}}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lookup_by_name_ignores_case() {
        let store = snapshot();
        let found = store
            .list_feeders_by_name(&["220kv parigi-1".to_string(), "UNKNOWN".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "f1");
    }

    #[tokio::test]
    async fn fetch_restricts_to_feeders_and_period_and_drops_bad_dates() {
        let store = snapshot();
        let feeders = store.list_feeders_by_name(&["220KV PARIGI-1".to_string()]).await.unwrap();
        let period = Period::new("1-15", date!(2024 - 03 - 01), date!(2024 - 03 - 15));

        let readings = store.fetch_readings(&feeders, &period).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].feeder_id, "f1");
        assert_eq!(readings[0].as_line().unwrap().max.mw, Some(120.0));
    }

    #[tokio::test]
    async fn payload_shape_follows_feeder_type() {
        let store = snapshot();
        let feeders = store.list_feeders().await.unwrap();
        let period = Period::new("Full Month", date!(2024 - 03 - 01), date!(2024 - 03 - 31));

        let readings = store.fetch_readings(&feeders, &period).await.unwrap();
        let bus = readings.iter().find(|r| r.feeder_id == "bus").unwrap();
        assert_eq!(bus.as_bus().unwrap().max_400kv.value, Some(412.0));
        assert_eq!(readings.len(), 4);
    }

    #[test]
    fn malformed_snapshot_is_reported() {
        let err = SnapshotStore::from_json_str("{\"entries\": []}").unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }
}
