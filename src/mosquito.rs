//! Pool of recently infected mosquitoes (§3 "Mosquito PRMC", §4.8.g). A
//! ring-buffered set of sampled infectious genotypes per location, recombined
//! fresh every day from the human population's current infectious reservoir.
use crate::genotype::{recombination, GenotypeDb, GenotypeId};
use crate::random::Random;

/// `genotypes_table[day_index][location][slot]`: `None` is the "no mosquito
/// infected here today" slot value.
pub struct Prmc {
    genotypes_table: Vec<Vec<Vec<Option<GenotypeId>>>>,
    tracking_days: usize,
    mosquito_size: usize,
}

impl Prmc {
    pub fn new(tracking_days: usize, num_locations: usize, mosquito_size: usize) -> Self {
        Self {
            genotypes_table: vec![vec![vec![None; mosquito_size]; num_locations]; tracking_days],
            tracking_days,
            mosquito_size,
        }
    }

    fn tracking_index(&self, current_time: i64) -> usize {
        (current_time.rem_euclid(self.tracking_days as i64)) as usize
    }

    /// Uniform sample of one genotype from today's (tracking-index-offset)
    /// slot at `location`, used when a mosquito bites a susceptible host.
    pub fn sample_infecting_genotype(
        &self,
        location: usize,
        tracking_index: usize,
        rng: &mut Random,
    ) -> Option<GenotypeId> {
        let slots = &self.genotypes_table[tracking_index][location];
        let candidates: Vec<GenotypeId> = slots.iter().filter_map(|s| *s).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.uniform_usize(candidates.len())])
    }

    /// Repopulates the current day's slot for every location from the
    /// host population's infectious reservoir (§4.8.g).
    ///
    /// `first_mate_pool`/`second_mate_pool` are per-location lists of
    /// `(genotype_id, weight)` representing the candidate first-bite and
    /// second-bite hosts respectively, already filtered to infectious
    /// individuals by the caller.
    pub fn infect_new_cohort(
        &mut self,
        current_time: i64,
        current_foi: &[f64],
        first_mate_pool: &[Vec<(GenotypeId, f64)>],
        second_mate_pool: &[Vec<(GenotypeId, f64)>],
        within_chromosome_recombination_rate: f64,
        interrupted_feeding_rate: f64,
        genotype_db: &mut GenotypeDb,
        drug_db: &crate::drug::DrugDb,
        rng: &mut Random,
    ) {
        let idx = self.tracking_index(current_time);
        let num_locations = self.genotypes_table[idx].len();
        for location in 0..num_locations {
            if current_foi.get(location).copied().unwrap_or(0.0) <= 0.0 {
                self.genotypes_table[idx][location].iter_mut().for_each(|s| *s = None);
                continue;
            }
            let firsts = &first_mate_pool[location];
            let seconds = &second_mate_pool[location];
            if firsts.is_empty() {
                self.genotypes_table[idx][location].iter_mut().for_each(|s| *s = None);
                continue;
            }
            let first_weights: Vec<f64> = firsts.iter().map(|(_, w)| *w).collect();
            let first_picks = rng
                .roulette_sampling(self.mosquito_size, &first_weights, firsts, false)
                .map(|v| v.into_iter().map(|(g, _)| *g).collect::<Vec<_>>())
                .unwrap_or_default();

            let second_picks: Vec<GenotypeId> = if seconds.is_empty() {
                Vec::new()
            } else {
                let second_weights: Vec<f64> = seconds.iter().map(|(_, w)| *w).collect();
                rng.roulette_sampling(self.mosquito_size, &second_weights, seconds, true)
                    .map(|v| v.into_iter().map(|(g, _)| *g).collect::<Vec<_>>())
                    .unwrap_or_default()
            };

            for slot in 0..self.mosquito_size {
                let father = first_picks.get(slot).copied();
                let father = match father {
                    Some(f) => f,
                    None => {
                        self.genotypes_table[idx][location][slot] = None;
                        continue;
                    }
                };
                let interrupted = rng.uniform_01() < interrupted_feeding_rate;
                let mother = if interrupted && !second_picks.is_empty() {
                    let mut attempts = 0;
                    let mut candidate = second_picks[rng.uniform_usize(second_picks.len())];
                    while candidate == father && attempts < 10 && second_picks.len() > 1 {
                        candidate = second_picks[rng.uniform_usize(second_picks.len())];
                        attempts += 1;
                    }
                    Some(candidate)
                } else {
                    None
                };

                let child = match mother {
                    Some(mother) => {
                        let father_g = genotype_db.at(father).clone();
                        let mother_g = genotype_db.at(mother).clone();
                        match recombination::free_recombination(
                            &father_g,
                            &mother_g,
                            within_chromosome_recombination_rate,
                            rng,
                        )
                        .and_then(|seq| genotype_db.get(&seq, drug_db))
                        {
                            Ok(id) => id,
                            Err(_) => father,
                        }
                    }
                    None => father,
                };
                self.genotypes_table[idx][location][slot] = Some(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::{sample_drug_db, sample_genotype_parameters};

    #[test]
    fn zero_foi_location_is_nulled_out() {
        let mut prmc = Prmc::new(14, 1, 4);
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        let mut rng = Random::new(1);
        prmc.infect_new_cohort(0, &[0.0], &[vec![]], &[vec![]], 0.0, 0.1, &mut db, &drugs, &mut rng);
        assert!(prmc.sample_infecting_genotype(0, 0, &mut rng).is_none());
    }

    #[test]
    fn no_mixing_without_interrupted_feeding_and_recombination() {
        let mut prmc = Prmc::new(14, 1, 8);
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        let mut rng = Random::new(5);
        let a = db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let b = db.get("C1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let firsts = vec![vec![(a, 1.0), (b, 1.0)]];
        let seconds = vec![vec![(a, 1.0), (b, 1.0)]];
        prmc.infect_new_cohort(0, &[1.0], &firsts, &seconds, 0.0, 0.0, &mut db, &drugs, &mut rng);
        for slot in 0..8 {
            let sampled = prmc.genotypes_table[0][0][slot];
            assert!(sampled == Some(a) || sampled == Some(b));
        }
    }
}
