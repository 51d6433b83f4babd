use serde::{Deserialize, Serialize};

/// One stored max/min sheet row: a feeder's readings for one calendar day.
///
/// `data` is kept as loosely-typed JSON here; it is interpreted per feeder
/// type by the report engine.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaxMinEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub feeder_id: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub data: serde_json::Value,
}
