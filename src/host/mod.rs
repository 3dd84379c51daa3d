//! Per-host state: clonal parasite populations, drugs in blood, and the
//! immune system (§3 "ClonalParasitePopulation" .. "ImmuneSystem", §4.4-4.5).
pub mod clone;
pub mod density_update;
pub mod drug_action;
pub mod drugs_in_blood;
pub mod immune_system;
pub mod shcpp;

pub use clone::{ClonalParasitePopulation, LOG_ZERO};
pub use density_update::DensityUpdateFunction;
pub use drugs_in_blood::DrugsInBlood;
pub use immune_system::ImmuneSystem;
pub use shcpp::SingleHostClonalParasitePopulations;
