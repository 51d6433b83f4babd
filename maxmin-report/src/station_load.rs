use std::collections::BTreeMap;

use time::Date;

use crate::{
    normalize::round2,
    reading::{Payload, Reading, StationLoad},
};

/// Station load for `date` as the sum over the ICT bank.
///
/// MW and MVAR are summed over the ICTs that recorded a `max.mw` that day.
/// The time is taken from the first such ICT (by feeder id) that has one.
/// `None` when no ICT has MW data for the date.
pub fn derive_station_load(icts: &BTreeMap<String, Vec<Reading>>, date: Date) -> Option<StationLoad> {
    let mut total_mw = 0.0;
    let mut total_mvar = 0.0;
    let mut time: Option<String> = None;
    let mut has_data = false;

    for readings in icts.values() {
        let Some(line) = readings
            .iter()
            .find(|r| r.date == date)
            .and_then(|r| r.as_line())
        else {
            continue;
        };

        if let Some(mw) = line.max.mw {
            total_mw += mw;
            has_data = true;
            if time.is_none() {
                time = line.max.time.clone();
            }
        }
        if let Some(mvar) = line.max.mvar {
            total_mvar += mvar;
        }
    }

    has_data.then(|| StationLoad {
        max_mw: Some(round2(total_mw)),
        mvar: Some(round2(total_mvar)),
        time,
    })
}

/// Replace bus-station load with the ICT bank sum wherever the bank reported MW.
///
/// The recorded station load is kept only for days the bank has no MW
/// data. Returns how many days took the derived value.
pub fn fill_station_load(bus_readings: &mut [Reading], icts: &BTreeMap<String, Vec<Reading>>) -> usize {
    let mut filled = 0;
    for reading in bus_readings.iter_mut() {
        let date = reading.date;
        let Payload::Bus(bus) = &mut reading.payload else {
            continue;
        };
        if let Some(load) = derive_station_load(icts, date) {
            bus.station_load = load;
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{Average, BusReading, Extreme, LineReading};
    use time::macros::date;

    fn ict(id: &str, date: Date, mw: Option<f64>, mvar: Option<f64>, time: Option<&str>) -> Reading {
        let mut max = Extreme::new(None, mw, time);
        max.mvar = mvar;
        Reading::line(
            id,
            date,
            LineReading {
                max,
                min: Extreme::default(),
                avg: Average::default(),
            },
        )
    }

    fn bank() -> BTreeMap<String, Vec<Reading>> {
        let d = date!(2024 - 06 - 01);
        BTreeMap::from([
            ("ict-1".to_string(), vec![ict("ict-1", d, Some(150.25), Some(20.0), None)]),
            ("ict-2".to_string(), vec![ict("ict-2", d, Some(149.5), Some(19.5), Some("19:45"))]),
            ("ict-3".to_string(), vec![ict("ict-3", d, None, Some(5.0), Some("18:00"))]),
            ("ict-4".to_string(), vec![ict("ict-4", d, Some(240.0), None, Some("19:45"))]),
        ])
    }

    #[test]
    fn sums_mw_and_mvar_across_the_bank() {
        let load = derive_station_load(&bank(), date!(2024 - 06 - 01)).unwrap();
        assert_eq!(load.max_mw, Some(539.75));
        assert_eq!(load.mvar, Some(44.5));
        assert_eq!(load.time.as_deref(), Some("19:45"));
    }

    #[test]
    fn no_ict_data_means_no_station_load() {
        assert_eq!(derive_station_load(&bank(), date!(2024 - 06 - 02)), None);
    }

    #[test]
    fn bank_sum_overrides_recorded_station_load() {
        let recorded = BusReading {
            station_load: StationLoad {
                max_mw: Some(500.0),
                mvar: Some(12.0),
                time: Some("20:00".to_string()),
            },
            ..BusReading::default()
        };
        let mut days = vec![
            Reading::bus("bus", date!(2024 - 06 - 01), recorded.clone()),
            Reading::bus("bus", date!(2024 - 06 - 01), BusReading::default()),
            Reading::bus("bus", date!(2024 - 06 - 02), recorded.clone()),
        ];

        let filled = fill_station_load(&mut days, &bank());
        assert_eq!(filled, 2);
        let derived = &days[0].as_bus().unwrap().station_load;
        assert_eq!(derived.max_mw, Some(539.75));
        assert_eq!(derived.mvar, Some(44.5));
        assert_eq!(derived.time.as_deref(), Some("19:45"));
        assert_eq!(days[1].as_bus().unwrap().station_load.max_mw, Some(539.75));
        // No bank data on the 2nd: the recorded load stays.
        assert_eq!(days[2].as_bus(), Some(&recorded));
    }
}
