//! Tiered rate tables: GSV, SSV, and mortality

mod table;
mod ssv;
mod mortality;
pub mod loader;

pub use table::{RateRow, RateTable, TierOverflow};
pub use ssv::{SsvRow, SsvTable, SsvTier};
pub use mortality::MortalityTable;
pub use loader::{load_rate_table, load_ssv_table, load_mortality_table};
