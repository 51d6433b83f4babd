//! Daily energy consumption sheets.
//!
//! A sheet logs the final register of each of its meters once a day. A
//! meter's consumption is the advance since the previous day's final,
//! scaled by its multiplying factor.

use std::collections::{BTreeMap, HashMap};

use meter_client::domain::{EnergyMeter, EnergySheet, MeterReading};
use serde::Serialize;
use time::Date;

use crate::reading::parse_iso_date;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterConsumption {
    pub meter_id: String,
    pub meter_name: String,
    pub initial: f64,
    pub r#final: f64,
    pub mf: f64,
    pub consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySheetEnergy {
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    pub readings: Vec<MeterConsumption>,
    pub total_consumption: f64,
}

/// One sheet day from the day's finals and the previous day's finals.
///
/// A meter absent from `previous` starts from zero. Finals for meters not
/// registered on the sheet are skipped.
pub fn daily_consumption(
    date: Date,
    meters: &[EnergyMeter],
    previous: &HashMap<String, f64>,
    finals: &[(String, f64)],
) -> DailySheetEnergy {
    let mut readings = Vec::with_capacity(finals.len());
    for (meter_id, fin) in finals {
        let Some(meter) = meters.iter().find(|m| &m.id == meter_id) else {
            tracing::debug!(%meter_id, %date, "skipping reading for unregistered meter");
            continue;
        };
        let initial = previous.get(meter_id).copied().unwrap_or(0.0);
        readings.push(MeterConsumption {
            meter_id: meter.id.clone(),
            meter_name: meter.name.clone(),
            initial,
            r#final: *fin,
            mf: meter.mf,
            consumption: (fin - initial) * meter.mf,
        });
    }

    DailySheetEnergy {
        date,
        total_consumption: readings.iter().map(|r| r.consumption).sum(),
        readings,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterTotal {
    pub meter_id: String,
    pub meter_name: String,
    pub unit: String,
    pub consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySheetEnergy {
    pub sheet_id: String,
    pub sheet_name: String,
    pub days: Vec<DailySheetEnergy>,
    pub meters: Vec<MeterTotal>,
    pub total_consumption: f64,
}

type DayFinals = BTreeMap<Date, Vec<(String, f64)>>;

fn by_date(sheet: &EnergySheet, rows: &[MeterReading]) -> DayFinals {
    let mut days = DayFinals::new();
    for row in rows {
        let Some(date) = parse_iso_date(&row.date) else {
            tracing::warn!(sheet = %sheet.name, date = %row.date, "skipping meter reading with invalid date");
            continue;
        };
        days.entry(date)
            .or_default()
            .push((row.meter_id.clone(), row.final_reading));
    }
    days
}

/// Chain a sheet's daily finals into per-day and per-meter consumption.
///
/// `previous` holds the finals logged before the first day, of which only
/// the latest day is used. A day whose predecessor was not logged starts
/// every meter from zero.
pub fn sheet_summary(
    sheet: &EnergySheet,
    meters: &[EnergyMeter],
    previous: &[MeterReading],
    readings: &[MeterReading],
) -> MonthlySheetEnergy {
    let mut last: Option<(Date, HashMap<String, f64>)> = by_date(sheet, previous)
        .into_iter()
        .next_back()
        .map(|(date, finals)| (date, finals.into_iter().collect()));

    let no_finals = HashMap::new();
    let mut days = Vec::new();
    for (date, finals) in by_date(sheet, readings) {
        let prior = match &last {
            Some((d, map)) if d.next_day() == Some(date) => map,
            _ => &no_finals,
        };
        days.push(daily_consumption(date, meters, prior, &finals));
        last = Some((date, finals.into_iter().collect()));
    }

    let meter_totals: Vec<MeterTotal> = meters
        .iter()
        .map(|m| MeterTotal {
            meter_id: m.id.clone(),
            meter_name: m.name.clone(),
            unit: m.unit.clone(),
            consumption: days
                .iter()
                .flat_map(|d| &d.readings)
                .filter(|r| r.meter_id == m.id)
                .map(|r| r.consumption)
                .sum(),
        })
        .collect();

    MonthlySheetEnergy {
        sheet_id: sheet.id.clone(),
        sheet_name: sheet.name.clone(),
        total_consumption: days.iter().map(|d| d.total_consumption).sum(),
        meters: meter_totals,
        days,
    }
}
