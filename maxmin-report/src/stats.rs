//! Single-feeder period statistics.
//!
//! Line and ICT feeders report the day of highest (lowest) MW as one event:
//! the amps, MVAR and time shown next to `max_mw` are read from that same
//! day, never maximized independently. Bus stations track each voltage
//! level on its own and then try to place the 400 kV and 220 kV extremes at
//! one shared instant.

use meter_client::domain::FeederType;
use serde::Serialize;
use time::Date;

use crate::{
    normalize::round2,
    period::{within, Period},
    reading::{BusReading, Extreme, Reading, StationLoad, VoltageSample},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineStats {
    pub max_amps: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub max_amps_date: Option<Date>,
    pub max_amps_time: Option<String>,
    pub min_amps: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub min_amps_date: Option<Date>,
    pub min_amps_time: Option<String>,
    pub max_mw: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub max_mw_date: Option<Date>,
    pub max_mw_time: Option<String>,
    pub min_mw: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub min_mw_date: Option<Date>,
    pub min_mw_time: Option<String>,
    pub max_mvar: Option<f64>,
    pub min_mvar: Option<f64>,
    pub avg_amps: Option<f64>,
    pub avg_mw: Option<f64>,
}

impl LineStats {
    /// Report `side` as the period maximum, stamped at `date`/`time`.
    pub(crate) fn set_max(&mut self, date: Date, time: Option<String>, side: &Extreme) {
        self.max_mw = side.mw;
        self.max_mw_date = Some(date);
        self.max_mw_time = time.clone();
        self.max_amps = side.amps;
        self.max_amps_date = Some(date);
        self.max_amps_time = time;
        self.max_mvar = side.mvar;
    }

    pub(crate) fn set_min(&mut self, date: Date, time: Option<String>, side: &Extreme) {
        self.min_mw = side.mw;
        self.min_mw_date = Some(date);
        self.min_mw_time = time.clone();
        self.min_amps = side.amps;
        self.min_amps_date = Some(date);
        self.min_amps_time = time;
        self.min_mvar = side.mvar;
    }

    pub(crate) fn clear_max(&mut self) {
        self.max_mw = None;
        self.max_mw_date = None;
        self.max_mw_time = None;
        self.max_amps = None;
        self.max_amps_date = None;
        self.max_amps_time = None;
        self.max_mvar = None;
    }

    pub(crate) fn clear_min(&mut self) {
        self.min_mw = None;
        self.min_mw_date = None;
        self.min_mw_time = None;
        self.min_amps = None;
        self.min_amps_date = None;
        self.min_amps_time = None;
        self.min_mvar = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusStats {
    pub max_400kv: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub max_400kv_date: Option<Date>,
    pub max_400kv_time: Option<String>,
    pub max_220kv: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub max_220kv_date: Option<Date>,
    pub max_220kv_time: Option<String>,
    pub min_400kv: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub min_400kv_date: Option<Date>,
    pub min_400kv_time: Option<String>,
    pub min_220kv: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub min_220kv_date: Option<Date>,
    pub min_220kv_time: Option<String>,
    pub max_load: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub max_load_date: Option<Date>,
    pub max_load_time: Option<String>,
    pub max_load_mvar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsResult {
    Line(LineStats),
    Bus(BusStats),
}

impl StatsResult {
    /// A result made entirely of "no value" markers for the given kind.
    pub fn empty(feeder_type: FeederType) -> Self {
        if feeder_type.is_line_type() {
            Self::Line(LineStats::default())
        } else {
            Self::Bus(BusStats::default())
        }
    }

    pub fn as_line(&self) -> Option<&LineStats> {
        match self {
            Self::Line(stats) => Some(stats),
            Self::Bus(_) => None,
        }
    }

    pub fn as_bus(&self) -> Option<&BusStats> {
        match self {
            Self::Bus(stats) => Some(stats),
            Self::Line(_) => None,
        }
    }
}

/// Statistics for one feeder's own readings inside `period`.
pub fn aggregate_standard(readings: &[Reading], feeder_type: FeederType, period: &Period) -> StatsResult {
    let days = within(readings, period);
    if feeder_type.is_line_type() {
        StatsResult::Line(line_stats(&days))
    } else {
        StatsResult::Bus(bus_stats(&days))
    }
}

/// Mean over days that had a usable value.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(self, value: Option<f64>) -> Self {
        match value {
            Some(v) => Self {
                sum: self.sum + v,
                count: self.count + 1,
            },
            None => self,
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.sum / f64::from(self.count)))
    }
}

/// Stored daily average, else the midpoint of the day's max and min.
fn daily_average(stored: Option<f64>, max: Option<f64>, min: Option<f64>) -> Option<f64> {
    stored.or_else(|| Some((max? + min?) / 2.0))
}

#[derive(Default)]
struct LineFold<'a> {
    max: Option<(f64, Date, &'a Extreme)>,
    min: Option<(f64, Date, &'a Extreme)>,
    amps: Mean,
    mw: Mean,
}

impl<'a> LineFold<'a> {
    fn push(mut self, reading: &'a Reading) -> Self {
        let Some(line) = reading.as_line() else {
            return self;
        };

        self.amps = self
            .amps
            .push(daily_average(line.avg.amps, line.max.amps, line.min.amps));
        self.mw = self.mw.push(daily_average(line.avg.mw, line.max.mw, line.min.mw));

        if let Some(mw) = line.max.mw {
            if self.max.map_or(true, |(best, _, _)| mw > best) {
                self.max = Some((mw, reading.date, &line.max));
            }
        }
        if let Some(mw) = line.min.mw {
            if self.min.map_or(true, |(best, _, _)| mw < best) {
                self.min = Some((mw, reading.date, &line.min));
            }
        }

        self
    }

    fn finish(self) -> LineStats {
        let mut stats = LineStats {
            avg_amps: self.amps.value(),
            avg_mw: self.mw.value(),
            ..LineStats::default()
        };
        if let Some((_, date, side)) = self.max {
            stats.set_max(date, side.time.clone(), side);
        }
        if let Some((_, date, side)) = self.min {
            stats.set_min(date, side.time.clone(), side);
        }
        stats
    }
}

/// Line/ICT statistics over days already restricted to a period and date-ordered.
pub(crate) fn line_stats(days: &[&Reading]) -> LineStats {
    days.iter()
        .copied()
        .fold(LineFold::default(), LineFold::push)
        .finish()
}

/// A day/time at which a bus quantity was observed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Stamp {
    date: Date,
    time: Option<String>,
}

type Level = fn(&BusReading) -> &VoltageSample;

fn bus_days<'a>(days: &'a [&'a Reading]) -> impl Iterator<Item = (Date, &'a BusReading)> + 'a {
    days.iter().filter_map(|r| r.as_bus().map(|bus| (r.date, bus)))
}

fn extreme_value(days: &[&Reading], level: Level, prefer: fn(f64, f64) -> bool) -> Option<f64> {
    bus_days(days)
        .filter_map(|(_, bus)| level(bus).value)
        .fold(None, |best, v| match best {
            Some(b) if !prefer(v, b) => Some(b),
            _ => Some(v),
        })
}

/// Every day whose reading for `level` equals `target`, earliest first.
fn candidates(days: &[&Reading], level: Level, target: f64) -> Vec<Stamp> {
    let mut stamps: Vec<Stamp> = bus_days(days)
        .filter(|(_, bus)| level(bus).value == Some(target))
        .map(|(date, bus)| Stamp {
            date,
            time: level(bus).time.clone(),
        })
        .collect();
    stamps.sort();
    stamps
}

/// Pick one stamp per voltage level, preferring an instant both share.
///
/// Without a shared `(date, time)` each level falls back to its earliest
/// candidate, so the two levels may then be reported at different times.
fn resolve_pair(hv: &[Stamp], lv: &[Stamp]) -> (Option<Stamp>, Option<Stamp>) {
    let shared = hv.iter().find(|a| lv.iter().any(|b| *a == b));
    match shared {
        Some(stamp) => (Some(stamp.clone()), Some(stamp.clone())),
        None => (hv.first().cloned(), lv.first().cloned()),
    }
}

fn level_max(days: &[&Reading], level: Level) -> (Option<f64>, Vec<Stamp>) {
    let value = extreme_value(days, level, |v, best| v > best);
    let stamps = value.map(|v| candidates(days, level, v)).unwrap_or_default();
    (value, stamps)
}

fn level_min(days: &[&Reading], level: Level) -> (Option<f64>, Vec<Stamp>) {
    let value = extreme_value(days, level, |v, best| v < best);
    let stamps = value.map(|v| candidates(days, level, v)).unwrap_or_default();
    (value, stamps)
}

fn split(stamp: Option<Stamp>) -> (Option<Date>, Option<String>) {
    match stamp {
        Some(Stamp { date, time }) => (Some(date), time),
        None => (None, None),
    }
}

/// Bus-station statistics over days already restricted to a period and date-ordered.
pub(crate) fn bus_stats(days: &[&Reading]) -> BusStats {
    let (max_400kv, max_400_stamps) = level_max(days, |b| &b.max_400kv);
    let (max_220kv, max_220_stamps) = level_max(days, |b| &b.max_220kv);
    let (min_400kv, min_400_stamps) = level_min(days, |b| &b.min_400kv);
    let (min_220kv, min_220_stamps) = level_min(days, |b| &b.min_220kv);

    let (max_400, max_220) = resolve_pair(&max_400_stamps, &max_220_stamps);
    let (min_400, min_220) = resolve_pair(&min_400_stamps, &min_220_stamps);

    let (max_400kv_date, max_400kv_time) = split(max_400);
    let (max_220kv_date, max_220kv_time) = split(max_220);
    let (min_400kv_date, min_400kv_time) = split(min_400);
    let (min_220kv_date, min_220kv_time) = split(min_220);

    let mut peak_load: Option<(f64, Date, &StationLoad)> = None;
    for (date, bus) in bus_days(days) {
        if let Some(mw) = bus.station_load.max_mw {
            if peak_load.map_or(true, |(best, _, _)| mw > best) {
                peak_load = Some((mw, date, &bus.station_load));
            }
        }
    }

    BusStats {
        max_400kv,
        max_400kv_date,
        max_400kv_time,
        max_220kv,
        max_220kv_date,
        max_220kv_time,
        min_400kv,
        min_400kv_date,
        min_400kv_time,
        min_220kv,
        min_220kv_date,
        min_220kv_time,
        max_load: peak_load.map(|(mw, _, _)| mw),
        max_load_date: peak_load.map(|(_, date, _)| date),
        max_load_time: peak_load.and_then(|(_, _, load)| load.time.clone()),
        max_load_mvar: peak_load.and_then(|(_, _, load)| load.mvar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{Average, LineReading};
    use time::macros::date;

    fn day(date: Date, max: Extreme, min: Extreme) -> Reading {
        Reading::line(
            "f",
            date,
            LineReading {
                max,
                min,
                avg: Average::default(),
            },
        )
    }

    fn two_days() -> Period {
        Period::new("p", date!(2024 - 01 - 01), date!(2024 - 01 - 02))
    }

    #[test]
    fn end_to_end_two_day_line_period() {
        let readings = vec![
            day(
                date!(2024 - 01 - 01),
                Extreme::new(Some(100.0), Some(50.0), Some("10:00")),
                Extreme::new(Some(20.0), Some(10.0), Some("02:00")),
            ),
            day(
                date!(2024 - 01 - 02),
                Extreme::new(Some(120.0), Some(45.0), Some("14:00")),
                Extreme::new(Some(30.0), Some(5.0), Some("03:00")),
            ),
        ];

        let stats = aggregate_standard(&readings, FeederType::Feeder400kv, &two_days());
        let line = stats.as_line().unwrap();

        assert_eq!(line.max_mw, Some(50.0));
        assert_eq!(line.max_mw_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(line.max_amps, Some(100.0));
        assert_eq!(line.max_mw_time.as_deref(), Some("10:00"));
        assert_eq!(line.min_mw, Some(5.0));
        assert_eq!(line.min_mw_date, Some(date!(2024 - 01 - 02)));
        assert_eq!(line.min_amps, Some(30.0));
        assert_eq!(line.min_mw_time.as_deref(), Some("03:00"));
        assert_eq!(line.avg_amps, Some(67.5));
        assert_eq!(line.avg_mw, Some(27.5));
    }

    #[test]
    fn max_amps_comes_from_the_max_mw_day() {
        let readings = vec![
            day(
                date!(2024 - 01 - 01),
                Extreme::new(Some(50.0), Some(100.0), Some("10:00")),
                Extreme::default(),
            ),
            day(
                date!(2024 - 01 - 02),
                Extreme::new(Some(90.0), Some(80.0), Some("11:00")),
                Extreme::default(),
            ),
        ];

        let stats = aggregate_standard(&readings, FeederType::Feeder220kv, &two_days());
        let line = stats.as_line().unwrap();
        assert_eq!(line.max_mw, Some(100.0));
        assert_eq!(line.max_amps, Some(50.0));
        assert_eq!(line.max_amps_time.as_deref(), Some("10:00"));
        assert_eq!(line.max_amps_date, line.max_mw_date);
    }

    #[test]
    fn first_day_wins_exact_ties_regardless_of_input_order() {
        let readings = vec![
            day(
                date!(2024 - 01 - 02),
                Extreme::new(Some(70.0), Some(100.0), Some("18:00")),
                Extreme::new(Some(5.0), Some(1.0), Some("05:00")),
            ),
            day(
                date!(2024 - 01 - 01),
                Extreme::new(Some(60.0), Some(100.0), Some("19:00")),
                Extreme::new(Some(4.0), Some(1.0), Some("04:00")),
            ),
        ];

        let stats = aggregate_standard(&readings, FeederType::IctFeeder, &two_days());
        let line = stats.as_line().unwrap();
        assert_eq!(line.max_mw_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(line.max_amps, Some(60.0));
        assert_eq!(line.min_mw_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(line.min_mw_time.as_deref(), Some("04:00"));
    }

    #[test]
    fn stored_average_takes_precedence_and_gaps_are_skipped() {
        let mut with_avg = day(
            date!(2024 - 01 - 01),
            Extreme::new(Some(100.0), Some(50.0), None),
            Extreme::new(Some(20.0), Some(10.0), None),
        );
        if let crate::reading::Payload::Line(line) = &mut with_avg.payload {
            line.avg = Average {
                amps: Some(40.0),
                mw: None,
            };
        }
        let no_min = day(
            date!(2024 - 01 - 02),
            Extreme::new(Some(200.0), Some(90.0), None),
            Extreme::default(),
        );

        let stats = aggregate_standard(&[with_avg, no_min], FeederType::Feeder400kv, &two_days());
        let line = stats.as_line().unwrap();
        assert_eq!(line.avg_amps, Some(40.0));
        assert_eq!(line.avg_mw, Some(30.0));
    }

    #[test]
    fn no_data_yields_no_value_markers() {
        let readings = vec![day(date!(2024 - 01 - 01), Extreme::default(), Extreme::default())];

        let stats = aggregate_standard(&readings, FeederType::Feeder400kv, &two_days());
        assert_eq!(stats, StatsResult::Line(LineStats::default()));

        let empty = aggregate_standard(&[], FeederType::BusStation, &two_days());
        assert_eq!(empty, StatsResult::Bus(BusStats::default()));
        assert_eq!(empty, StatsResult::empty(FeederType::BusStation));
    }

    #[test]
    fn repeated_aggregation_is_identical() {
        let readings = vec![
            day(
                date!(2024 - 01 - 01),
                Extreme::new(Some(100.0), Some(50.0), Some("10:00")),
                Extreme::new(Some(20.0), Some(10.0), Some("02:00")),
            ),
            day(
                date!(2024 - 01 - 02),
                Extreme::new(Some(33.3), Some(45.1), Some("14:00")),
                Extreme::new(Some(30.7), Some(5.2), Some("03:00")),
            ),
        ];

        let a = aggregate_standard(&readings, FeederType::Feeder220kv, &two_days());
        let b = aggregate_standard(&readings, FeederType::Feeder220kv, &two_days());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn serialized_result_uses_null_for_missing_values() {
        let stats = aggregate_standard(&[], FeederType::Feeder400kv, &two_days());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["max_mw"].is_null());
        assert!(json["max_mw_date"].is_null());
        assert!(json["avg_amps"].is_null());
    }

    fn bus_day(date: Date, build: impl FnOnce(&mut BusReading)) -> Reading {
        let mut bus = BusReading::default();
        build(&mut bus);
        Reading::bus("bus", date, bus)
    }

    fn three_days() -> Period {
        Period::new("p", date!(2024 - 01 - 01), date!(2024 - 01 - 03))
    }

    #[test]
    fn bus_max_prefers_an_instant_shared_by_both_levels() {
        let readings = vec![
            bus_day(date!(2024 - 01 - 01), |b| {
                b.max_400kv = VoltageSample::new(420.0, "08:00");
                b.max_220kv = VoltageSample::new(232.0, "09:00");
            }),
            bus_day(date!(2024 - 01 - 02), |b| {
                b.max_400kv = VoltageSample::new(420.0, "11:00");
                b.max_220kv = VoltageSample::new(232.0, "11:00");
            }),
            bus_day(date!(2024 - 01 - 03), |b| {
                b.max_400kv = VoltageSample::new(415.0, "11:00");
                b.max_220kv = VoltageSample::new(229.0, "11:00");
            }),
        ];

        let stats = aggregate_standard(&readings, FeederType::BusStation, &three_days());
        let bus = stats.as_bus().unwrap();
        assert_eq!(bus.max_400kv, Some(420.0));
        assert_eq!(bus.max_220kv, Some(232.0));
        assert_eq!(bus.max_400kv_date, Some(date!(2024 - 01 - 02)));
        assert_eq!(bus.max_220kv_date, Some(date!(2024 - 01 - 02)));
        assert_eq!(bus.max_400kv_time.as_deref(), Some("11:00"));
        assert_eq!(bus.max_220kv_time.as_deref(), Some("11:00"));
    }

    #[test]
    fn bus_shared_instant_beats_a_higher_mismatched_day() {
        // 220 kV peaks on day 2 at a time the 400 kV bus never matches; the
        // tie on day 1 lines up with the 400 kV peak.
        let readings = vec![
            bus_day(date!(2024 - 01 - 01), |b| {
                b.max_400kv = VoltageSample::new(421.0, "10:00");
                b.max_220kv = VoltageSample::new(233.0, "10:00");
            }),
            bus_day(date!(2024 - 01 - 02), |b| {
                b.max_400kv = VoltageSample::new(418.0, "11:00");
                b.max_220kv = VoltageSample::new(233.0, "11:00");
            }),
        ];

        let stats = aggregate_standard(&readings, FeederType::BusStation, &three_days());
        let bus = stats.as_bus().unwrap();
        assert_eq!(bus.max_220kv_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(bus.max_220kv_time.as_deref(), Some("10:00"));
        assert_eq!(bus.max_400kv_date, Some(date!(2024 - 01 - 01)));
    }

    #[test]
    fn bus_without_shared_instant_falls_back_per_level_to_earliest() {
        let readings = vec![
            bus_day(date!(2024 - 01 - 02), |b| {
                b.min_400kv = VoltageSample::new(395.0, "03:00");
                b.min_220kv = VoltageSample::new(210.0, "02:30");
            }),
            bus_day(date!(2024 - 01 - 01), |b| {
                b.min_400kv = VoltageSample::new(395.0, "05:00");
                b.min_220kv = VoltageSample::new(214.0, "05:00");
            }),
        ];

        let stats = aggregate_standard(&readings, FeederType::BusStation, &three_days());
        let bus = stats.as_bus().unwrap();
        assert_eq!(bus.min_400kv, Some(395.0));
        assert_eq!(bus.min_400kv_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(bus.min_400kv_time.as_deref(), Some("05:00"));
        assert_eq!(bus.min_220kv, Some(210.0));
        assert_eq!(bus.min_220kv_date, Some(date!(2024 - 01 - 02)));
        assert_eq!(bus.min_220kv_time.as_deref(), Some("02:30"));
    }

    #[test]
    fn bus_station_load_reports_its_own_peak_day() {
        let readings = vec![
            bus_day(date!(2024 - 01 - 01), |b| {
                b.station_load = StationLoad {
                    max_mw: Some(600.0),
                    mvar: Some(70.0),
                    time: Some("19:00".to_string()),
                };
            }),
            bus_day(date!(2024 - 01 - 02), |b| {
                b.station_load = StationLoad {
                    max_mw: Some(640.5),
                    mvar: Some(82.0),
                    time: Some("20:00".to_string()),
                };
            }),
        ];

        let stats = aggregate_standard(&readings, FeederType::BusStation, &three_days());
        let bus = stats.as_bus().unwrap();
        assert_eq!(bus.max_load, Some(640.5));
        assert_eq!(bus.max_load_date, Some(date!(2024 - 01 - 02)));
        assert_eq!(bus.max_load_time.as_deref(), Some("20:00"));
        assert_eq!(bus.max_load_mvar, Some(82.0));
        assert_eq!(bus.max_400kv, None);
        assert_eq!(bus.max_400kv_date, None);
    }
}
