pub mod coincident;
pub mod config;
pub mod consumption;
pub mod energy;
pub mod grouping;
pub mod leader;
pub mod normalize;
pub mod observability;
pub mod period;
pub mod reading;
pub mod report;
pub mod sinks;
pub mod station_load;
pub mod stats;
pub mod store;

use time::Date;

// ISO `YYYY-MM-DD` (de)serialization for `Date` fields.
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub use coincident::aggregate_coincident;
pub use period::Period;
pub use reading::Reading;
pub use report::{build_monthly_report, MonthlyReport};
pub use stats::{aggregate_standard, StatsResult};
pub use store::{PgReadingStore, ReadingStore, SnapshotStore};
