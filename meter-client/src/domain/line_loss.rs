use serde::{Deserialize, Serialize};

/// Two-ended metered line with multiplying factors per register.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LineLossFeeder {
    pub id: String,
    pub name: String,
    pub end1_name: String,
    pub end2_name: String,
    pub end1_import_mf: f64,
    pub end1_export_mf: f64,
    pub end2_import_mf: f64,
    pub end2_export_mf: f64,
}

/// Final register values recorded for one line on one day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegisterEntry {
    pub feeder_id: String,
    pub date: String,
    pub end1_import_final: f64,
    pub end1_export_final: f64,
    pub end2_import_final: f64,
    pub end2_export_final: f64,
}
