use serde::Serialize;
use time::{error::ComponentRange, util::days_in_year_month, Date, Month};

use crate::reading::Reading;

/// Named inclusive date window a report aggregates over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub name: String,
    #[serde(with = "crate::iso_date")]
    pub start: Date,
    #[serde(with = "crate::iso_date")]
    pub end: Date,
}

impl Period {
    pub fn new(name: impl Into<String>, start: Date, end: Date) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn month(year: i32, month: Month) -> Result<Self, ComponentRange> {
        let last = days_in_year_month(year, month);
        Ok(Self::new(
            "Full Month",
            Date::from_calendar_date(year, month, 1)?,
            Date::from_calendar_date(year, month, last)?,
        ))
    }

    /// The three windows of a fortnightly report: `1-15`, `16-End`, and the full month.
    pub fn fortnights(year: i32, month: Month) -> Result<[Self; 3], ComponentRange> {
        let full = Self::month(year, month)?;
        let fifteenth = Date::from_calendar_date(year, month, 15)?;
        let sixteenth = Date::from_calendar_date(year, month, 16)?;

        Ok([
            Self::new("1-15", full.start, fifteenth),
            Self::new("16-End", sixteenth, full.end),
            full,
        ])
    }
}

/// Readings inside `period`, oldest first.
///
/// The sort is stable so callers relying on "first day wins" see a
/// deterministic order regardless of how the store returned rows.
pub fn within<'a, I>(readings: I, period: &Period) -> Vec<&'a Reading>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut selected: Vec<&Reading> = readings
        .into_iter()
        .filter(|r| period.contains(r.date))
        .collect();
    selected.sort_by_key(|r| r.date);
    selected
}
