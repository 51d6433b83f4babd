//! Monthly max/min report assembly.
//!
//! One bulk fetch covers the month; every (feeder, period) cell is then
//! computed in memory. Grouped line feeders get coincident statistics,
//! everything else its standard statistics.

use std::collections::{BTreeMap, HashMap};

use meter_client::domain::{Feeder, FeederType};
use serde::Serialize;
use time::Month;

use crate::{
    coincident::aggregate_coincident,
    grouping::group_of,
    normalize::round2,
    period::Period,
    reading::Reading,
    station_load::fill_station_load,
    stats::{aggregate_standard, StatsResult},
    store::{ReadingStore, StoreError},
};

/// Row order of the substation's monthly sheet. Unlisted feeders follow by name.
pub const FEEDER_ORDER: &[&str] = &[
    "Bus Voltages & Station Load",
    "400KV MAHESHWARAM-2",
    "400KV MAHESHWARAM-1",
    "400KV NARSAPUR-1",
    "400KV NARSAPUR-2",
    "400KV KETHIREDDYPALLY-1",
    "400KV KETHIREDDYPALLY-2",
    "400KV NIZAMABAD-1",
    "400KV NIZAMABAD-2",
    "ICT-1 (315MVA)",
    "ICT-2 (315MVA)",
    "ICT-3 (315MVA)",
    "ICT-4 (500MVA)",
    "220KV PARIGI-1",
    "220KV PARIGI-2",
    "220KV THANDUR",
    "220KV GACHIBOWLI-1",
    "220KV GACHIBOWLI-2",
    "220KV KETHIREDDYPALLY",
    "220KV YEDDUMAILARAM-1",
    "220KV YEDDUMAILARAM-2",
    "220KV SADASIVAPET-1",
    "220KV SADASIVAPET-2",
];

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("invalid report month {year}-{month}")]
    InvalidMonth { year: i32, month: u8 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct FeederStats {
    pub sl_no: usize,
    pub feeder_id: String,
    pub feeder_name: String,
    pub feeder_type: FeederType,
    pub coincident: bool,
    pub stats: StatsResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IctLoading {
    pub feeder_name: String,
    pub capacity_mva: Option<f64>,
    /// Period max MW, taken at the bank's coincident instant when grouped.
    pub max_demand: Option<f64>,
    pub avg_mw: Option<f64>,
    pub loading_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub feeders: Vec<FeederStats>,
    pub ict_loading: Vec<IctLoading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u8,
    pub periods: Vec<PeriodReport>,
}

fn name_key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Sort feeders into sheet order, unlisted ones last by name.
pub fn order_feeders(mut feeders: Vec<Feeder>) -> Vec<Feeder> {
    let rank: HashMap<String, usize> = FEEDER_ORDER
        .iter()
        .enumerate()
        .map(|(i, name)| (name_key(name), i))
        .collect();

    feeders.sort_by(|a, b| {
        let ra = rank.get(&name_key(&a.name)).copied().unwrap_or(usize::MAX);
        let rb = rank.get(&name_key(&b.name)).copied().unwrap_or(usize::MAX);
        ra.cmp(&rb).then_with(|| a.name.cmp(&b.name))
    });
    feeders
}

/// Rated capacity from a name such as `ICT-4 (500MVA)`.
pub fn capacity_mva(name: &str) -> Option<f64> {
    let start = name.find('(')? + 1;
    let rest = &name[start..];
    let end = rest.to_ascii_uppercase().find("MVA")?;
    rest[..end].trim().parse().ok()
}

fn ict_loading(feeder: &Feeder, stats: &StatsResult) -> IctLoading {
    let capacity = capacity_mva(&feeder.name).filter(|c| *c > 0.0);
    let line = stats.as_line();
    let avg_mw = line.and_then(|s| s.avg_mw);
    IctLoading {
        feeder_name: feeder.name.clone(),
        capacity_mva: capacity,
        max_demand: line.and_then(|s| s.max_mw),
        avg_mw,
        loading_percent: avg_mw.zip(capacity).map(|(mw, cap)| round2(mw / cap * 100.0)),
    }
}

/// Resolve each grouped line feeder's group into member readings.
///
/// A feeder is left out, and so falls back to standard statistics, when
/// fewer than two group members are registered or when the registry
/// lookup did not return the feeder itself.
async fn resolve_groups<S: ReadingStore + ?Sized>(
    store: &S,
    feeders: &[Feeder],
    by_feeder: &BTreeMap<String, Vec<Reading>>,
) -> Result<HashMap<String, BTreeMap<String, Vec<Reading>>>, StoreError> {
    let mut resolved: HashMap<&'static str, Vec<Feeder>> = HashMap::new();
    let mut groups = HashMap::new();

    for feeder in feeders.iter().filter(|f| f.feeder_type.is_line_type()) {
        let Some(members) = group_of(&feeder.name) else {
            continue;
        };
        let group_key = members[0];
        if !resolved.contains_key(group_key) {
            let names: Vec<String> = members.iter().map(|m| m.to_string()).collect();
            let found = store.list_feeders_by_name(&names).await?;
            resolved.insert(group_key, found);
        }
        let registered = resolved.get(group_key).map(Vec::as_slice).unwrap_or_default();

        if registered.len() < 2 {
            tracing::warn!(
                feeder = %feeder.name,
                registered = registered.len(),
                "group partners not registered, using standard stats"
            );
            continue;
        }
        if !registered.iter().any(|m| m.id == feeder.id) {
            tracing::warn!(
                feeder = %feeder.name,
                registered = registered.len(),
                "feeder missing from its resolved group, using standard stats"
            );
            continue;
        }

        let member_days: BTreeMap<String, Vec<Reading>> = registered
            .iter()
            .map(|m| (m.id.clone(), by_feeder.get(&m.id).cloned().unwrap_or_default()))
            .collect();
        groups.insert(feeder.id.clone(), member_days);
    }
    Ok(groups)
}

/// Assemble the fortnightly max/min report for `year`-`month`.
pub async fn build_monthly_report<S: ReadingStore + ?Sized>(
    store: &S,
    year: i32,
    month: u8,
) -> Result<MonthlyReport, ReportError> {
    let invalid = || ReportError::InvalidMonth { year, month };
    let calendar_month = Month::try_from(month).map_err(|_| invalid())?;
    let periods = Period::fortnights(year, calendar_month).map_err(|_| invalid())?;
    let [_, _, full_month] = &periods;

    let feeders = order_feeders(store.list_feeders().await?);
    let readings = store.fetch_readings(&feeders, full_month).await?;
    tracing::info!(feeders = feeders.len(), readings = readings.len(), year, month, "loaded month readings");

    let mut by_feeder: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
    for reading in readings {
        by_feeder.entry(reading.feeder_id.clone()).or_default().push(reading);
    }

    let icts: BTreeMap<String, Vec<Reading>> = feeders
        .iter()
        .filter(|f| f.feeder_type == FeederType::IctFeeder)
        .map(|f| (f.id.clone(), by_feeder.get(&f.id).cloned().unwrap_or_default()))
        .collect();
    for bus in feeders.iter().filter(|f| f.feeder_type == FeederType::BusStation) {
        if let Some(days) = by_feeder.get_mut(&bus.id) {
            let filled = fill_station_load(days, &icts);
            if filled > 0 {
                tracing::info!(feeder = %bus.name, days = filled, "derived station load from ICT bank");
            }
        }
    }

    let groups = resolve_groups(store, &feeders, &by_feeder).await?;

    let mut period_reports = Vec::with_capacity(periods.len());
    for period in periods {
        let mut rows = Vec::with_capacity(feeders.len());
        let mut ict_rows = Vec::new();

        for (i, feeder) in feeders.iter().enumerate() {
            let group = groups.get(&feeder.id);
            let stats = match group {
                Some(members) => aggregate_coincident(&feeder.id, members, feeder.feeder_type, &period),
                None => {
                    let own = by_feeder.get(&feeder.id).map(Vec::as_slice).unwrap_or_default();
                    aggregate_standard(own, feeder.feeder_type, &period)
                }
            };

            if feeder.feeder_type == FeederType::IctFeeder {
                ict_rows.push(ict_loading(feeder, &stats));
            }

            rows.push(FeederStats {
                sl_no: i + 1,
                feeder_id: feeder.id.clone(),
                feeder_name: feeder.name.clone(),
                feeder_type: feeder.feeder_type,
                coincident: group.is_some(),
                stats,
            });
        }

        tracing::debug!(period = %period.name, rows = rows.len(), "period assembled");
        period_reports.push(PeriodReport {
            period,
            feeders: rows,
            ict_loading: ict_rows,
        });
    }

    Ok(MonthlyReport {
        year,
        month,
        periods: period_reports,
    })
}
