use std::collections::BTreeMap;

use time::Date;

use crate::reading::{LineReading, Reading};

/// Period readings per group member, keyed by feeder id.
///
/// Each list is expected to be restricted to the period and date-ordered
/// (see [`crate::period::within`]).
pub type GroupDays<'a> = BTreeMap<String, Vec<&'a Reading>>;

#[derive(Debug, Clone, Copy)]
struct Peak<'a> {
    mw: f64,
    date: Date,
    line: &'a LineReading,
}

/// Highest `max.mw` of one member; the earliest day wins exact ties.
fn member_peak<'a>(days: &[&'a Reading]) -> Option<Peak<'a>> {
    let mut best: Option<Peak<'a>> = None;
    for reading in days {
        let Some(line) = reading.as_line() else {
            continue;
        };
        if let Some(mw) = line.max.mw {
            if best.map_or(true, |b| mw > b.mw) {
                best = Some(Peak {
                    mw,
                    date: reading.date,
                    line,
                });
            }
        }
    }
    best
}

/// Sum of every member's `max.mw` on `date`, provided every member has a
/// reading that day with its max at `time`. `None` when any member is
/// missing, untimed, or off by even a minute.
fn aligned_group_sum(group: &GroupDays<'_>, date: Date, time: &str) -> Option<f64> {
    group.values().try_fold(0.0, |sum, days| {
        let line = days.iter().find(|r| r.date == date)?.as_line()?;
        if line.max.time.as_deref() != Some(time) {
            return None;
        }
        Some(sum + line.max.mw?)
    })
}

/// Pick the member whose peak day anchors the group's coincident timestamp.
///
/// The member with the single highest `max.mw` leads. On a tie each tied
/// member (in feeder-id order) is scored by the whole group's MW on its
/// peak date and time, counted only when every member reports that exact
/// instant; the best score leads, and with no valid score the smallest id
/// does. A group without any MW data falls back to its first member.
pub fn select_leader<'g>(group: &'g GroupDays<'_>) -> Option<&'g str> {
    let peaks: Vec<(&'g str, Peak<'_>)> = group
        .iter()
        .filter_map(|(id, days)| member_peak(days).map(|peak| (id.as_str(), peak)))
        .collect();

    let Some(group_max) = peaks.iter().map(|(_, p)| p.mw).reduce(f64::max) else {
        tracing::debug!(members = group.len(), "no MW data in group, defaulting leader");
        return group.keys().next().map(String::as_str);
    };

    let tied: Vec<&(&'g str, Peak<'_>)> = peaks.iter().filter(|(_, p)| p.mw == group_max).collect();
    if let [(only, _)] = tied.as_slice() {
        return Some(*only);
    }

    metrics::counter!("leader_tie_breaks_total").increment(1);

    let mut best: Option<(&'g str, f64)> = None;
    for (id, peak) in &tied {
        let Some(time) = peak.line.max.time.as_deref() else {
            continue;
        };
        if let Some(sum) = aligned_group_sum(group, peak.date, time) {
            if best.map_or(true, |(_, s)| sum > s) {
                best = Some((*id, sum));
            }
        }
    }

    match best {
        Some((id, sum)) => {
            tracing::debug!(leader = id, group_mw = sum, "leader chosen by aligned group sum");
            Some(id)
        }
        None => {
            tracing::debug!(candidates = tied.len(), "no aligned group sum, using first tied member");
            tied.first().map(|(id, _)| *id)
        }
    }
}
