//! Owns a host's clones in a dense, swap-remove vector (§3 "SingleHostClonalParasitePopulations").
use crate::genotype::GenotypeId;
use crate::host::clone::ClonalParasitePopulation;

#[derive(Debug, Clone, Default)]
pub struct SingleHostClonalParasitePopulations {
    parasites: Vec<ClonalParasitePopulation>,
    pub latest_update_time: i64,
    next_token: u64,
}

impl SingleHostClonalParasitePopulations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parasites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parasites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClonalParasitePopulation> {
        self.parasites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClonalParasitePopulation> {
        self.parasites.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&ClonalParasitePopulation> {
        self.parasites.get(index)
    }

    pub fn contains_genotype(&self, genotype_id: GenotypeId) -> bool {
        self.parasites.iter().any(|p| p.genotype_id == genotype_id)
    }

    pub fn find_by_token(&self, token: u64) -> Option<&ClonalParasitePopulation> {
        self.parasites.iter().find(|p| p.token == token)
    }

    /// O(1) add: pushes to the back, index is the new length - 1. Returns
    /// the new clone's stable token (not its index, which can move).
    pub fn add(&mut self, genotype_id: GenotypeId, first_date_in_blood: i64) -> u64 {
        let index = self.parasites.len();
        let token = self.next_token;
        self.next_token += 1;
        self.parasites
            .push(ClonalParasitePopulation::new(index, token, genotype_id, first_date_in_blood));
        token
    }

    /// O(1) swap-with-back removal. Out-of-bound index is a programmer error
    /// and throws (§7 "Out-of-bound index in SHCPP removal").
    pub fn remove(&mut self, index: usize) {
        assert!(index < self.parasites.len(), "SHCPP remove: index out of bounds");
        self.parasites.swap_remove(index);
        if let Some(moved) = self.parasites.get_mut(index) {
            moved.set_index(index);
        }
    }

    pub fn clear(&mut self) {
        self.parasites.clear();
    }

    pub fn remove_by_token(&mut self, token: u64) {
        if let Some(index) = self.parasites.iter().position(|p| p.token == token) {
            self.remove(index);
        }
    }

    /// Removes every clone whose density has decayed to the cured
    /// threshold, scanning back-to-front so swap-removal never skips an entry.
    pub fn clear_cured_parasites(&mut self, cured_threshold: f64) {
        let mut i = self.parasites.len();
        while i > 0 {
            i -= 1;
            if self.parasites[i].is_cured(cured_threshold) {
                self.remove(i);
            }
        }
    }

    /// `log10(sum(10^(density_i + log10(gametocyte_i))))`, the reservoir
    /// infectiousness used by `update_current_foi` (§4.8.d).
    pub fn log10_total_infectious_density(&self) -> f64 {
        let total: f64 = self
            .parasites
            .iter()
            .filter(|p| p.gametocyte_level > 0.0)
            .map(|p| 10f64.powf(p.last_update_log10_parasite_density) * p.gametocyte_level)
            .sum();
        if total <= 0.0 {
            crate::host::clone::LOG_ZERO
        } else {
            total.log10()
        }
    }

    /// Debug-only consistency check: every clone's stored index matches its
    /// position in the vector.
    pub fn check_index_invariant(&self) -> bool {
        self.parasites
            .iter()
            .enumerate()
            .all(|(i, p)| p.get_index() == i)
    }
}
