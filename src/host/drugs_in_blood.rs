//! Mapping drug_id -> owned [`Drug`] course (§3 "DrugsInBlood").
use crate::drug::{Drug, DrugDb, DrugType};
use crate::random::Random;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DrugsInBlood {
    drugs: HashMap<usize, Drug>,
}

impl DrugsInBlood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &Drug)> {
        self.drugs.iter()
    }

    pub fn get(&self, drug_id: usize) -> Option<&Drug> {
        self.drugs.get(&drug_id)
    }

    /// Re-adding replaces in place. If a course is already running for this
    /// drug_id, the new course's starting residual concentration combines
    /// with (rather than discards) what remains of the old one.
    pub fn add(&mut self, drug_id: usize, dosing_days: u32, current_time: i64, starting_value: f64) {
        let combined_starting_value = if let Some(existing) = self.drugs.get(&drug_id) {
            (existing.starting_value + starting_value).min(1.0)
        } else {
            starting_value
        };
        self.drugs
            .insert(drug_id, Drug::new(drug_id, dosing_days, current_time, combined_starting_value));
    }

    pub fn remove_expired(&mut self, current_time: i64) {
        self.drugs.retain(|_, d| current_time <= d.end_time + 30);
    }

    /// Evaluates the concentration of every drug currently in blood.
    pub fn concentrations(
        &self,
        current_time: i64,
        drug_db: &DrugDb,
        rng: &mut Random,
    ) -> Vec<(usize, f64)> {
        self.drugs
            .values()
            .map(|d| {
                let dt: &DrugType = drug_db.at(d.drug_id);
                (d.drug_id, crate::drug::pk::concentration(d, current_time, dt, rng))
            })
            .collect()
    }
}
