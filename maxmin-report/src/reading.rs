use meter_client::domain::{FeederType, MaxMinEntry};
use serde_json::Value;
use time::{macros::format_description, Date};

use crate::normalize::{time_of, to_float_or_none};

/// One quantity's extreme (max or min) as recorded for a day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extreme {
    pub amps: Option<f64>,
    pub mw: Option<f64>,
    pub mvar: Option<f64>,
    /// Normalized `HH:MM`.
    pub time: Option<String>,
}

impl Extreme {
    pub fn new(amps: Option<f64>, mw: Option<f64>, time: Option<&str>) -> Self {
        Self {
            amps,
            mw,
            mvar: None,
            time: time.map(crate::normalize::normalize_time).filter(|t| !t.is_empty()),
        }
    }

    pub fn with_mvar(mut self, mvar: f64) -> Self {
        self.mvar = Some(mvar);
        self
    }

    fn from_json(value: Option<&Value>) -> Self {
        Self {
            amps: to_float_or_none(value.and_then(|v| v.get("amps"))),
            mw: to_float_or_none(value.and_then(|v| v.get("mw"))),
            mvar: to_float_or_none(value.and_then(|v| v.get("mvar"))),
            time: time_of(value.and_then(|v| v.get("time"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Average {
    pub amps: Option<f64>,
    pub mw: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineReading {
    pub max: Extreme,
    pub min: Extreme,
    pub avg: Average,
}

impl LineReading {
    fn from_json(data: &Value) -> Self {
        let avg = data.get("avg");
        Self {
            max: Extreme::from_json(data.get("max")),
            min: Extreme::from_json(data.get("min")),
            avg: Average {
                amps: to_float_or_none(avg.and_then(|v| v.get("amps"))),
                mw: to_float_or_none(avg.and_then(|v| v.get("mw"))),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoltageSample {
    pub value: Option<f64>,
    pub time: Option<String>,
}

impl VoltageSample {
    pub fn new(value: f64, time: &str) -> Self {
        Self {
            value: Some(value),
            time: Some(crate::normalize::normalize_time(time)).filter(|t| !t.is_empty()),
        }
    }

    fn from_json(value: Option<&Value>) -> Self {
        Self {
            value: to_float_or_none(value.and_then(|v| v.get("value"))),
            time: time_of(value.and_then(|v| v.get("time"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationLoad {
    pub max_mw: Option<f64>,
    pub mvar: Option<f64>,
    pub time: Option<String>,
}

impl StationLoad {
    fn from_json(value: Option<&Value>) -> Self {
        Self {
            max_mw: to_float_or_none(value.and_then(|v| v.get("max_mw"))),
            mvar: to_float_or_none(value.and_then(|v| v.get("mvar"))),
            time: time_of(value.and_then(|v| v.get("time"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusReading {
    pub max_400kv: VoltageSample,
    pub max_220kv: VoltageSample,
    pub min_400kv: VoltageSample,
    pub min_220kv: VoltageSample,
    pub station_load: StationLoad,
}

impl BusReading {
    fn from_json(data: &Value) -> Self {
        Self {
            max_400kv: VoltageSample::from_json(data.get("max_bus_voltage_400kv")),
            max_220kv: VoltageSample::from_json(data.get("max_bus_voltage_220kv")),
            min_400kv: VoltageSample::from_json(data.get("min_bus_voltage_400kv")),
            min_220kv: VoltageSample::from_json(data.get("min_bus_voltage_220kv")),
            station_load: StationLoad::from_json(data.get("station_load")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Line(LineReading),
    Bus(BusReading),
}

/// A feeder's readings for one calendar day, typed by feeder kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub feeder_id: String,
    pub date: Date,
    pub payload: Payload,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadingError {
    #[error("invalid date '{date}' for feeder {feeder_id}")]
    InvalidDate { feeder_id: String, date: String },
}

pub fn parse_iso_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

impl Reading {
    pub fn line(feeder_id: impl Into<String>, date: Date, line: LineReading) -> Self {
        Self {
            feeder_id: feeder_id.into(),
            date,
            payload: Payload::Line(line),
        }
    }

    pub fn bus(feeder_id: impl Into<String>, date: Date, bus: BusReading) -> Self {
        Self {
            feeder_id: feeder_id.into(),
            date,
            payload: Payload::Bus(bus),
        }
    }

    /// Interpret a stored entry according to its feeder's type.
    ///
    /// Missing or mismatched keys come through as `None` fields; only an
    /// unreadable date rejects the row.
    pub fn from_entry(entry: &MaxMinEntry, kind: FeederType) -> Result<Self, ReadingError> {
        let date = parse_iso_date(&entry.date).ok_or_else(|| ReadingError::InvalidDate {
            feeder_id: entry.feeder_id.clone(),
            date: entry.date.clone(),
        })?;

        let payload = if kind.is_line_type() {
            Payload::Line(LineReading::from_json(&entry.data))
        } else {
            Payload::Bus(BusReading::from_json(&entry.data))
        };

        Ok(Self {
            feeder_id: entry.feeder_id.clone(),
            date,
            payload,
        })
    }

    pub fn as_line(&self) -> Option<&LineReading> {
        match &self.payload {
            Payload::Line(line) => Some(line),
            Payload::Bus(_) => None,
        }
    }

    pub fn as_bus(&self) -> Option<&BusReading> {
        match &self.payload {
            Payload::Bus(bus) => Some(bus),
            Payload::Line(_) => None,
        }
    }
}
