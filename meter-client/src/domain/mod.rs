mod energy_sheet;
mod feeder;
mod line_loss;
mod max_min_entry;

pub use energy_sheet::{EnergyMeter, EnergySheet, MeterReading};
pub use feeder::{Feeder, FeederType, UnknownFeederType};
pub use line_loss::{LineLossFeeder, RegisterEntry};
pub use max_min_entry::MaxMinEntry;
