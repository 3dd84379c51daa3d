//! Per-drug pharmacokinetics and the drug database (§3 "DrugType", §4.3).
pub mod pk;

use crate::config::{DrugParameters, DrugTypeConfig, ResistantAaLocation};

/// Owned by [`DrugDb`]; immutable after construction (§5 shared-resource
/// policy).
#[derive(Debug, Clone)]
pub struct DrugType {
    pub id: usize,
    pub name: String,
    pub drug_half_life: f64,
    pub k_max: f64,
    pub n: f64,
    pub k: f64,
    pub base_ec50: f64,
    pub dosing_days: u32,
    pub mean_drug_absorption: f64,
    pub sd_drug_absorption: f64,
    pub resistant_aa_locations: Vec<ResistantAaLocation>,
}

impl From<&DrugTypeConfig> for DrugType {
    fn from(c: &DrugTypeConfig) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            drug_half_life: c.drug_half_life,
            k_max: c.k_max,
            n: c.n,
            k: c.k,
            base_ec50: c.base_ec50,
            dosing_days: c.dosing_days,
            mean_drug_absorption: c.mean_drug_absorption,
            sd_drug_absorption: c.sd_drug_absorption,
            resistant_aa_locations: c.resistant_aa_locations.clone(),
        }
    }
}

/// Process-wide, immutable drug catalogue, indexed by `id` (§5).
pub struct DrugDb {
    drugs: Vec<DrugType>,
}

impl DrugDb {
    pub fn from_config(params: &DrugParameters) -> Self {
        let mut drugs: Vec<DrugType> = params.drug_db.iter().map(DrugType::from).collect();
        drugs.sort_by_key(|d| d.id);
        Self { drugs }
    }

    pub fn at(&self, id: usize) -> &DrugType {
        &self.drugs[id]
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugType> {
        self.drugs.iter()
    }
}

/// A per-person instance of a drug course (§3 "Drug (in blood)").
#[derive(Debug, Clone)]
pub struct Drug {
    pub drug_id: usize,
    pub dosing_days: u32,
    pub start_time: i64,
    pub end_time: i64,
    pub starting_value: f64,
}

impl Drug {
    pub fn new(drug_id: usize, dosing_days: u32, start_time: i64, starting_value: f64) -> Self {
        Self {
            drug_id,
            dosing_days,
            start_time,
            end_time: start_time + dosing_days as i64,
            starting_value: starting_value.clamp(0.0, 1.0),
        }
    }
}
