//! Scheduled population-wide perturbations (§4.10): importation, allele
//! introduction, and coverage/strategy switches. Dispatched the same way as
//! [`crate::person::event::PersonEvent`] — one closed enum, one free
//! `execute` function — but against the whole [`crate::population::Population`]
//! rather than a single host.
use crate::config::genotype_matches_allele;
use crate::person::HostState;
use crate::population::Population;
use crate::random::Random;
use crate::scheduler::Scheduler;
use log::warn;

#[derive(Debug, Clone)]
pub enum PopulationEvent {
    ImportationPeriodically {
        location: usize,
        end_day: i64,
        daily_rate: f64,
        aa_sequence: String,
    },
    ImportationPeriodicallyV2 {
        location: usize,
        end_day: i64,
        number_of_cases: u64,
        aa_sequence: String,
    },
    ImportationPeriodicallyRandom {
        location: usize,
        end_day: i64,
        daily_rate: f64,
    },
    IntroduceMutant {
        location: usize,
        allele_pattern: String,
        mutant_pattern: String,
        target_fraction: f64,
    },
    TreatmentCoverageChange {
        location: usize,
        new_p_treatment_under_5: f64,
        new_p_treatment_over_5: f64,
    },
    StrategyChange {
        new_strategy_id: usize,
    },
}

impl From<&crate::config::PopulationEventConfig> for (i64, PopulationEvent) {
    fn from(c: &crate::config::PopulationEventConfig) -> Self {
        use crate::config::PopulationEventConfig as C;
        match c.clone() {
            C::ImportationPeriodically {
                start_day,
                location,
                duration_days,
                daily_rate,
                aa_sequence,
            } => (
                start_day,
                PopulationEvent::ImportationPeriodically {
                    location,
                    end_day: start_day + duration_days,
                    daily_rate,
                    aa_sequence,
                },
            ),
            C::ImportationPeriodicallyV2 {
                start_day,
                location,
                duration_days,
                number_of_cases,
                aa_sequence,
            } => (
                start_day,
                PopulationEvent::ImportationPeriodicallyV2 {
                    location,
                    end_day: start_day + duration_days,
                    number_of_cases,
                    aa_sequence,
                },
            ),
            C::ImportationPeriodicallyRandom {
                start_day,
                location,
                duration_days,
                daily_rate,
            } => (
                start_day,
                PopulationEvent::ImportationPeriodicallyRandom {
                    location,
                    end_day: start_day + duration_days,
                    daily_rate,
                },
            ),
            C::IntroduceMutant {
                start_day,
                location,
                allele_pattern,
                mutant_pattern,
                target_fraction,
            } => (
                start_day,
                PopulationEvent::IntroduceMutant {
                    location,
                    allele_pattern,
                    mutant_pattern,
                    target_fraction,
                },
            ),
            C::TreatmentCoverageChange {
                start_day,
                location,
                new_p_treatment_under_5,
                new_p_treatment_over_5,
            } => (
                start_day,
                PopulationEvent::TreatmentCoverageChange {
                    location,
                    new_p_treatment_under_5,
                    new_p_treatment_over_5,
                },
            ),
            C::StrategyChange { start_day, new_strategy_id } => {
                (start_day, PopulationEvent::StrategyChange { new_strategy_id })
            }
        }
    }
}

fn liver_infect(population: &mut Population, location: usize, aa_sequence: &str, n: u64, current_day: i64, liver_delay: i64, rng: &mut Random) {
    let genotype_id = population.genotype_db.get(aa_sequence, &population.drug_db);
    let genotype_id = match genotype_id {
        Ok(id) => id,
        Err(e) => {
            warn!("importation event: malformed genotype {aa_sequence}: {e}");
            return;
        }
    };
    let candidate_ids: Vec<u64> = population
        .persons()
        .iter()
        .filter(|p| p.is_alive() && p.location == location)
        .map(|p| p.id)
        .collect();
    if candidate_ids.is_empty() {
        warn!("importation event: no hosts at location {location}");
        return;
    }
    for _ in 0..n {
        let pick = candidate_ids[rng.uniform_usize(candidate_ids.len())];
        if let Some(person) = population.persons_mut().iter_mut().find(|p| p.id == pick) {
            person.infect_by(genotype_id, current_day, liver_delay);
        }
    }
}

/// Executes every event due at `scheduler.current_time`, rescheduling
/// periodic importation events that have not yet reached their end day.
pub fn execute_due(population: &mut Population, scheduler: &mut Scheduler, liver_delay: i64, rng: &mut Random) {
    let due = scheduler.pop_due_population_events();
    let current_day = scheduler.current_time;
    for event in due {
        match &event {
            PopulationEvent::ImportationPeriodically {
                location,
                end_day,
                daily_rate,
                aa_sequence,
            } => {
                let n = rng.poisson(*daily_rate).unwrap_or(0);
                liver_infect(population, *location, aa_sequence, n, current_day, liver_delay, rng);
                if current_day < *end_day {
                    scheduler.schedule_population_event(current_day + 1, event.clone());
                }
            }
            PopulationEvent::ImportationPeriodicallyV2 {
                location,
                end_day,
                number_of_cases,
                aa_sequence,
            } => {
                liver_infect(population, *location, aa_sequence, *number_of_cases, current_day, liver_delay, rng);
                if current_day < *end_day {
                    scheduler.schedule_population_event(current_day + 1, event.clone());
                }
            }
            PopulationEvent::ImportationPeriodicallyRandom {
                location,
                end_day,
                daily_rate,
            } => {
                let n = rng.poisson(*daily_rate).unwrap_or(0);
                let random_sequence = "A1|A|A|A|A|A|A|A|A|A|A|A|A|A";
                liver_infect(population, *location, random_sequence, n, current_day, liver_delay, rng);
                if current_day < *end_day {
                    scheduler.schedule_population_event(current_day + 1, event.clone());
                }
            }
            PopulationEvent::IntroduceMutant {
                location,
                allele_pattern,
                mutant_pattern,
                target_fraction,
            } => {
                introduce_mutant(population, *location, allele_pattern, mutant_pattern, *target_fraction, rng);
            }
            PopulationEvent::TreatmentCoverageChange {
                location,
                new_p_treatment_under_5,
                new_p_treatment_over_5,
            } => {
                if let Some(loc) = population.locations.get_mut(*location) {
                    loc.p_treatment_under_5 = *new_p_treatment_under_5;
                    loc.p_treatment_over_5 = *new_p_treatment_over_5;
                } else {
                    warn!("coverage change event: unknown location {location}");
                }
            }
            PopulationEvent::StrategyChange { new_strategy_id } => {
                population.current_strategy_id = *new_strategy_id;
                population.strategy_db.adjust_started_time_point(*new_strategy_id, current_day);
            }
        }
    }
}

/// Draws the number of currently-wild-type hosts to convert so the target
/// allele reaches `target_fraction` prevalence among asymptomatic+clinical
/// hosts at `location`, then rewrites one clone per selected host.
fn introduce_mutant(
    population: &mut Population,
    location: usize,
    allele_pattern: &str,
    mutant_pattern: &str,
    target_fraction: f64,
    rng: &mut Random,
) {
    let infected_ids: Vec<u64> = population
        .persons()
        .iter()
        .filter(|p| {
            p.location == location
                && matches!(p.host_state, HostState::Asymptomatic | HostState::Clinical)
                && !p.shcpp.is_empty()
        })
        .map(|p| p.id)
        .collect();
    if infected_ids.is_empty() {
        warn!("introduce-mutant event: no infected hosts at location {location}");
        return;
    }
    let already_mutant = infected_ids
        .iter()
        .filter(|id| {
            population
                .persons()
                .iter()
                .find(|p| p.id == **id)
                .map(|p| {
                    p.shcpp
                        .iter()
                        .any(|c| genotype_matches_allele(population.genotype_db.at(c.genotype_id), mutant_pattern))
                })
                .unwrap_or(false)
        })
        .count();
    let current_fraction = already_mutant as f64 / infected_ids.len() as f64;
    if current_fraction >= target_fraction {
        return;
    }
    let deficit_fraction = target_fraction - current_fraction;
    let expected_conversions = deficit_fraction * infected_ids.len() as f64;
    let n = rng.poisson(expected_conversions).unwrap_or(0).min(infected_ids.len() as u64);

    let candidates: Vec<u64> = infected_ids
        .iter()
        .copied()
        .filter(|id| {
            population
                .persons()
                .iter()
                .find(|p| p.id == *id)
                .map(|p| {
                    p.shcpp
                        .iter()
                        .any(|c| genotype_matches_allele(population.genotype_db.at(c.genotype_id), allele_pattern))
                })
                .unwrap_or(false)
        })
        .collect();
    if candidates.is_empty() {
        return;
    }
    let mutant_id = population.genotype_db.get(mutant_pattern, &population.drug_db);
    let mutant_id = match mutant_id {
        Ok(id) => id,
        Err(e) => {
            warn!("introduce-mutant event: malformed mutant pattern {mutant_pattern}: {e}");
            return;
        }
    };
    for _ in 0..n {
        let pick = candidates[rng.uniform_usize(candidates.len())];
        if let Some(person) = population.persons_mut().iter_mut().find(|p| p.id == pick) {
            if let Some(clone) = person.shcpp.iter_mut().next() {
                clone.genotype_id = mutant_id;
            }
        }
    }
}
