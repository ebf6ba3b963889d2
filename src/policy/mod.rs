//! Policy definitions, holder records, and their loaders

mod data;
pub mod loader;

pub use data::{Policy, PolicyType, PolicyStatus, PolicyHolder, RiderCover, elapsed_years};
pub use loader::{load_policies, load_policies_from_reader, load_holders, load_holders_from_reader};
