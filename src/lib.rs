//! Individual-based simulator of *Plasmodium falciparum* transmission and
//! antimalarial-drug resistance evolution. This crate is the per-day
//! simulation engine; loading configuration from disk and writing reports
//! are the CLI binary's job ([`crate::config`] only models the schema).
pub mod config;
pub mod drug;
pub mod error;
pub mod genotype;
pub mod host;
pub mod location;
pub mod mdc;
pub mod model;
pub mod mosquito;
pub mod person;
pub mod population;
pub mod population_events;
pub mod random;
pub mod scheduler;
pub mod strategy;
pub mod therapy;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::MalasimError;
    pub use crate::model::Model;
    pub use crate::random::Random;
}
