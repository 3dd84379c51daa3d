//! A simulated location (§3 "Location").
use crate::config::LocationConfig;

#[derive(Debug, Clone)]
pub struct Location {
    pub id: usize,
    pub population_size: u64,
    pub beta: f64,
    pub p_treatment_under_5: f64,
    pub p_treatment_over_5: f64,
    pub prmc_size: usize,
    pub interrupted_feeding_rate: f64,
    pub movement_weights: Vec<f64>,
}

impl Location {
    pub fn new(
        id: usize,
        population_size: u64,
        beta: f64,
        p_treatment_under_5: f64,
        p_treatment_over_5: f64,
        prmc_size: usize,
        interrupted_feeding_rate: f64,
    ) -> Self {
        Self {
            id,
            population_size,
            beta,
            p_treatment_under_5,
            p_treatment_over_5,
            prmc_size,
            interrupted_feeding_rate,
            movement_weights: Vec::new(),
        }
    }
}

impl From<&LocationConfig> for Location {
    fn from(c: &LocationConfig) -> Self {
        Self {
            id: c.id,
            population_size: c.population_size,
            beta: c.beta,
            p_treatment_under_5: c.p_treatment_under_5,
            p_treatment_over_5: c.p_treatment_over_5,
            prmc_size: c.prmc_size,
            interrupted_feeding_rate: c.interrupted_feeding_rate,
            movement_weights: c.movement_weights.clone(),
        }
    }
}
