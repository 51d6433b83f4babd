//! Line energy accounting from cumulative meter registers.
//!
//! Each metered line has an import and an export register at both ends.
//! A day's consumption on a register is the advance of its reading since
//! the previous day, scaled by the register's multiplying factor (MF).

use meter_client::domain::{LineLossFeeder, RegisterEntry};
use serde::Serialize;
use time::Date;

use crate::{normalize::round2, reading::parse_iso_date};

/// Values for the four registers of a two-ended line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Registers {
    pub end1_import: f64,
    pub end1_export: f64,
    pub end2_import: f64,
    pub end2_export: f64,
}

impl Registers {
    fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            end1_import: f(self.end1_import, other.end1_import),
            end1_export: f(self.end1_export, other.end1_export),
            end2_import: f(self.end2_import, other.end2_import),
            end2_export: f(self.end2_export, other.end2_export),
        }
    }

    pub fn total_import(&self) -> f64 {
        self.end1_import + self.end2_import
    }

    pub fn total_export(&self) -> f64 {
        self.end1_export + self.end2_export
    }

    /// Share of imported energy not accounted for by exports, in percent.
    ///
    /// Zero when nothing was imported.
    pub fn loss_percent(&self) -> f64 {
        let import = self.total_import();
        if import == 0.0 {
            0.0
        } else {
            (import - self.total_export()) / import * 100.0
        }
    }
}

impl From<&LineLossFeeder> for Registers {
    fn from(f: &LineLossFeeder) -> Self {
        Self {
            end1_import: f.end1_import_mf,
            end1_export: f.end1_export_mf,
            end2_import: f.end2_import_mf,
            end2_export: f.end2_export_mf,
        }
    }
}

impl From<&RegisterEntry> for Registers {
    fn from(e: &RegisterEntry) -> Self {
        Self {
            end1_import: e.end1_import_final,
            end1_export: e.end1_export_final,
            end2_import: e.end2_import_final,
            end2_export: e.end2_export_final,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLineEnergy {
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    pub initial: Registers,
    pub r#final: Registers,
    pub consumption: Registers,
    pub loss_percent: f64,
}

/// Energy for one day given the day's finals and the previous day's finals.
///
/// Without a previous day the registers are taken to start from zero.
pub fn daily_energy(date: Date, previous: Option<Registers>, current: Registers, mf: Registers) -> DailyLineEnergy {
    let initial = previous.unwrap_or_default();
    let consumption = current
        .zip_with(initial, |fin, init| fin - init)
        .zip_with(mf, |delta, factor| delta * factor);

    DailyLineEnergy {
        date,
        initial,
        r#final: current,
        loss_percent: consumption.loss_percent(),
        consumption,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyLineEnergy {
    pub feeder_id: String,
    pub feeder_name: String,
    pub days: Vec<DailyLineEnergy>,
    pub total: Registers,
    pub loss_percent: f64,
}

/// Chain daily entries (oldest first) into per-day and total consumption.
///
/// `previous` is the final reading of the day before the first entry, if
/// one exists. Entries with unreadable dates are skipped. A gap in the
/// dates restarts the chain from zero, matching how a day without a
/// predecessor is booked at entry time.
pub fn month_summary(
    feeder: &LineLossFeeder,
    previous: Option<&RegisterEntry>,
    entries: &[RegisterEntry],
) -> MonthlyLineEnergy {
    let mf = Registers::from(feeder);

    let mut last: Option<(Date, Registers)> =
        previous.and_then(|p| parse_iso_date(&p.date).map(|d| (d, Registers::from(p))));

    let mut days = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(date) = parse_iso_date(&entry.date) else {
            tracing::warn!(feeder_id = %feeder.id, date = %entry.date, "skipping register entry with invalid date");
            continue;
        };

        let prior = last
            .filter(|(d, _)| d.next_day() == Some(date))
            .map(|(_, regs)| regs);
        let current = Registers::from(entry);
        days.push(daily_energy(date, prior, current, mf));
        last = Some((date, current));
    }

    let total = days
        .iter()
        .fold(Registers::default(), |acc, d| acc.zip_with(d.consumption, |a, b| a + b));

    MonthlyLineEnergy {
        feeder_id: feeder.id.clone(),
        feeder_name: feeder.name.clone(),
        loss_percent: round2(total.loss_percent()),
        total,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn feeder() -> LineLossFeeder {
        LineLossFeeder {
            id: "l-1".to_string(),
            name: "220 KV Sadasivapet-1".to_string(),
            end1_name: "Shankarapally".to_string(),
            end2_name: "Sadasivapet".to_string(),
            end1_import_mf: 1.0,
            end1_export_mf: 1.0,
            end2_import_mf: 1.6,
            end2_export_mf: 1.6,
        }
    }

    fn entry(date: &str, e1i: f64, e1e: f64, e2i: f64, e2e: f64) -> RegisterEntry {
        RegisterEntry {
            feeder_id: "l-1".to_string(),
            date: date.to_string(),
            end1_import_final: e1i,
            end1_export_final: e1e,
            end2_import_final: e2i,
            end2_export_final: e2e,
        }
    }

    #[test]
    fn consumption_is_scaled_register_advance() {
        let mf = Registers {
            end1_import: 0.2,
            end1_export: 0.2,
            end2_import: 1.0,
            end2_export: 1.0,
        };
        let previous = Registers {
            end1_import: 1000.0,
            end1_export: 500.0,
            end2_import: 200.0,
            end2_export: 900.0,
        };
        let current = Registers {
            end1_import: 1500.0,
            end1_export: 510.0,
            end2_import: 210.0,
            end2_export: 1000.0,
        };

        let day = daily_energy(date!(2024 - 02 - 02), Some(previous), current, mf);
        assert_eq!(day.consumption.end1_import, 100.0);
        assert_eq!(day.consumption.end1_export, 2.0);
        assert_eq!(day.consumption.end2_import, 10.0);
        assert_eq!(day.consumption.end2_export, 100.0);
        // (110 - 102) / 110
        assert!((day.loss_percent - 7.272727).abs() < 1e-4);
    }

    #[test]
    fn zero_import_means_zero_loss() {
        let day = daily_energy(
            date!(2024 - 02 - 02),
            None,
            Registers::default(),
            Registers::default(),
        );
        assert_eq!(day.loss_percent, 0.0);
    }

    #[test]
    fn month_chains_previous_finals_into_initials() {
        let prev = entry("2024-01-31", 100.0, 10.0, 50.0, 20.0);
        let entries = vec![
            entry("2024-02-01", 110.0, 12.0, 60.0, 25.0),
            entry("2024-02-02", 125.0, 13.0, 70.0, 35.0),
        ];

        let summary = month_summary(&feeder(), Some(&prev), &entries);
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.days[0].initial.end1_import, 100.0);
        assert_eq!(summary.days[1].initial.end1_import, 110.0);
        assert_eq!(summary.total.end1_import, 25.0);
        assert_eq!(summary.total.end2_import, 32.0);
        assert_eq!(summary.total.end1_export, 3.0);
        assert_eq!(summary.total.end2_export, 24.0);
        // (57 - 27) / 57
        assert_eq!(summary.loss_percent, 52.63);
    }

    #[test]
    fn date_gap_restarts_from_zero() {
        let entries = vec![
            entry("2024-02-01", 10.0, 0.0, 0.0, 0.0),
            entry("2024-02-03", 15.0, 0.0, 0.0, 0.0),
            entry("bad-date", 99.0, 0.0, 0.0, 0.0),
        ];

        let summary = month_summary(&feeder(), None, &entries);
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.days[0].initial, Registers::default());
        assert_eq!(summary.days[1].initial, Registers::default());
        assert_eq!(summary.days[1].consumption.end1_import, 15.0);
    }
}
