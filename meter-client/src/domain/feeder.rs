use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Kind of monitored point, which also decides the shape of its readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeederType {
    #[serde(rename = "bus_station")]
    BusStation,
    #[serde(rename = "feeder_400kv")]
    Feeder400kv,
    #[serde(rename = "feeder_220kv")]
    Feeder220kv,
    #[serde(rename = "ict_feeder")]
    IctFeeder,
}

impl FeederType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusStation => "bus_station",
            Self::Feeder400kv => "feeder_400kv",
            Self::Feeder220kv => "feeder_220kv",
            Self::IctFeeder => "ict_feeder",
        }
    }

    /// Lines and ICTs carry `{max, min, avg}` payloads.
    pub fn is_line_type(self) -> bool {
        !matches!(self, Self::BusStation)
    }
}

impl fmt::Display for FeederType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown feeder type '{0}'")]
pub struct UnknownFeederType(pub String);

impl FromStr for FeederType {
    type Err = UnknownFeederType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bus_station" => Ok(Self::BusStation),
            "feeder_400kv" => Ok(Self::Feeder400kv),
            "feeder_220kv" => Ok(Self::Feeder220kv),
            "ict_feeder" => Ok(Self::IctFeeder),
            other => Err(UnknownFeederType(other.to_string())),
        }
    }
}

impl TryFrom<String> for FeederType {
    type Error = UnknownFeederType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feeder {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub feeder_type: FeederType,
}
