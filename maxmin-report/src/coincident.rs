use std::collections::BTreeMap;

use meter_client::domain::FeederType;
use time::Date;

use crate::{
    leader::{select_leader, GroupDays},
    period::{within, Period},
    reading::{Extreme, LineReading, Reading},
    stats::{aggregate_standard, line_stats, StatsResult},
};

type Side = fn(&LineReading) -> &Extreme;

/// A candidate instant taken from the leader's readings.
#[derive(Debug, Clone, PartialEq)]
struct Instant {
    mw: f64,
    date: Date,
    time: String,
}

/// Leader instants ordered by MW, descending for max and ascending for min.
///
/// Sorting is stable over date-ordered input, so equal MW keeps the earlier
/// day first. Untimed readings cannot be matched and are skipped.
fn leader_instants(days: &[&Reading], side: Side, descending: bool) -> Vec<Instant> {
    let mut instants: Vec<Instant> = days
        .iter()
        .filter_map(|r| {
            let extreme = side(r.as_line()?);
            Some(Instant {
                mw: extreme.mw?,
                date: r.date,
                time: extreme.time.clone()?,
            })
        })
        .collect();

    instants.sort_by(|a, b| {
        let ord = a.mw.total_cmp(&b.mw);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    instants
}

fn member_reports_at(days: &[&Reading], side: Side, date: Date, time: &str) -> bool {
    days.iter()
        .find(|r| r.date == date)
        .and_then(|r| r.as_line())
        .map_or(false, |line| side(line).time.as_deref() == Some(time))
}

/// First leader instant whose date and time every group member also reports.
fn coincident_instant(candidates: &[Instant], group: &GroupDays<'_>, side: Side) -> Option<(Date, String)> {
    candidates
        .iter()
        .find(|c| {
            group
                .values()
                .all(|days| member_reports_at(days, side, c.date, &c.time))
        })
        .map(|c| (c.date, c.time.clone()))
}

fn own_side<'a>(days: &[&'a Reading], side: Side, date: Date) -> Option<&'a Extreme> {
    days.iter()
        .find(|r| r.date == date)
        .and_then(|r| r.as_line())
        .map(side)
}

/// Max/min statistics for `feeder_id` attributed to instants shared by its whole group.
///
/// Averages are the feeder's own. The max (min) fields carry this feeder's
/// values at the first of the leader's highest (lowest) instants that every
/// member reports at the same normalized time. When no such instant
/// exists, or this feeder has no reading that day, all max (min) fields are
/// "no value": a standalone figure would not be comparable across the
/// group.
///
/// Bus stations are never grouped and get their standard statistics.
pub fn aggregate_coincident(
    feeder_id: &str,
    group: &BTreeMap<String, Vec<Reading>>,
    feeder_type: FeederType,
    period: &Period,
) -> StatsResult {
    if !feeder_type.is_line_type() {
        let own = group.get(feeder_id).map(Vec::as_slice).unwrap_or_default();
        return aggregate_standard(own, feeder_type, period);
    }

    let days: GroupDays<'_> = group
        .iter()
        .map(|(id, readings)| (id.clone(), within(readings, period)))
        .collect();
    let own_days: &[&Reading] = days.get(feeder_id).map(Vec::as_slice).unwrap_or_default();

    let mut stats = line_stats(own_days);
    stats.clear_max();
    stats.clear_min();

    let Some(leader) = select_leader(&days) else {
        return StatsResult::Line(stats);
    };
    let leader_days = days.get(leader).map(Vec::as_slice).unwrap_or_default();

    let max_side: Side = |line| &line.max;
    let min_side: Side = |line| &line.min;

    let max_at = coincident_instant(&leader_instants(leader_days, max_side, true), &days, max_side);
    let min_at = coincident_instant(&leader_instants(leader_days, min_side, false), &days, min_side);

    match &max_at {
        Some((date, time)) => {
            if let Some(extreme) = own_side(own_days, max_side, *date) {
                stats.set_max(*date, Some(time.clone()), extreme);
            }
        }
        None => {
            metrics::counter!("coincident_no_common_timestamp_total", "side" => "max").increment(1);
        }
    }
    match &min_at {
        Some((date, time)) => {
            if let Some(extreme) = own_side(own_days, min_side, *date) {
                stats.set_min(*date, Some(time.clone()), extreme);
            }
        }
        None => {
            metrics::counter!("coincident_no_common_timestamp_total", "side" => "min").increment(1);
        }
    }

    tracing::debug!(
        feeder_id,
        leader,
        period = %period.name,
        max_found = max_at.is_some(),
        min_found = min_at.is_some(),
        "coincident stats computed"
    );

    StatsResult::Line(stats)
}
