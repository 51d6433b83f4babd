use serde::{Deserialize, Serialize};

/// A daily energy log sheet, such as one ICT or the 33KV outgoing feeders.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnergySheet {
    pub id: String,
    pub name: String,
}

/// A cumulative energy meter logged on a sheet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnergyMeter {
    pub id: String,
    pub sheet_id: String,
    pub name: String,
    pub mf: f64,
    /// Register unit, `MWH` or `KWH`.
    pub unit: String,
}

/// Final register value of one meter on one day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeterReading {
    pub sheet_id: String,
    pub meter_id: String,
    pub date: String,
    pub final_reading: f64,
}
