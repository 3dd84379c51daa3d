//! The host population and the per-day protocol that drives it (§3
//! "Population", §4.8). Owns every [`Person`] in a flat `Vec`, the way
//! [`SingleHostClonalParasitePopulations`](crate::host::shcpp) owns its
//! clones, with secondary indexes layered on top for the hot per-day queries.
pub mod indexes;

use crate::config::{Config, GenotypeParameters, TherapyConfig};
use crate::drug::DrugDb;
use crate::genotype::GenotypeDb;
use crate::host::density_update::DensityUpdateFunction;
use crate::host::drug_action;
use crate::location::Location;
use crate::mdc::ModelDataCollector;
use crate::mosquito::Prmc;
use crate::person::event::EventContext;
use crate::person::{HostState, Person};
use crate::random::Random;
use crate::strategy::coverage::CoverageModel;
use crate::strategy::StrategyDb;
use indexes::ByLocationStateAgeClass;
use std::collections::VecDeque;

fn state_code(state: HostState) -> u8 {
    match state {
        HostState::Susceptible => 0,
        HostState::Exposed => 1,
        HostState::Asymptomatic => 2,
        HostState::Clinical => 3,
        HostState::Dead => 4,
    }
}

/// Buckets age into `num_classes` equal-width bins spanning 0..100 years,
/// the span `death_rate_by_age_class` and `age_structure` are defined over.
fn age_class_for(age_years: f64, num_classes: usize) -> usize {
    let num_classes = num_classes.max(1);
    let width = 100.0 / num_classes as f64;
    ((age_years / width) as usize).min(num_classes - 1)
}

pub struct Population {
    persons: Vec<Person>,
    by_location_state: ByLocationStateAgeClass,
    next_person_id: u64,
    pub locations: Vec<Location>,
    pub genotype_db: GenotypeDb,
    pub drug_db: DrugDb,
    pub therapy_db: Vec<TherapyConfig>,
    pub strategy_db: StrategyDb,
    pub current_strategy_id: usize,
    pub coverage_model: CoverageModel,
    pub mdc: ModelDataCollector,
    pub prmc: Prmc,
    current_force_of_infection: Vec<f64>,
    relative_biting_sum: Vec<f64>,
    force_of_infection_history: VecDeque<Vec<f64>>,
    tracking_days: usize,
    number_of_age_classes: usize,
    death_rate_by_age_class: Vec<f64>,
}

impl Population {
    pub fn new(config: &Config, genotype_db: GenotypeDb, drug_db: DrugDb) -> Self {
        let locations: Vec<Location> = match &config.spatial_settings {
            crate::config::SpatialSettings::LocationBased { location_db } => {
                location_db.iter().map(Location::from).collect()
            }
            crate::config::SpatialSettings::GridBased { .. } => Vec::new(),
        };
        let tracking_days = config.epidemiological_parameters.number_of_tracking_days;
        let num_locations = locations.len().max(1);
        Self {
            persons: Vec::new(),
            by_location_state: ByLocationStateAgeClass::new(),
            next_person_id: 0,
            strategy_db: StrategyDb::from_config(&config.strategy_parameters.strategy_db),
            current_strategy_id: config.strategy_parameters.initial_strategy_id,
            coverage_model: CoverageModel::from(&config.treatment_coverage_settings),
            therapy_db: config.therapy_parameters.therapy_db.clone(),
            mdc: ModelDataCollector::new(config.epidemiological_parameters.tf_window_size),
            prmc: Prmc::new(tracking_days, num_locations, config.mosquito_parameters.mosquito_size),
            current_force_of_infection: vec![0.0; num_locations],
            relative_biting_sum: vec![0.0; num_locations],
            force_of_infection_history: VecDeque::from(vec![vec![0.0; num_locations]; tracking_days]),
            tracking_days,
            number_of_age_classes: config.population_demographic.number_of_age_classes,
            death_rate_by_age_class: config.population_demographic.death_rate_by_age_class.clone(),
            locations,
            genotype_db,
            drug_db,
        }
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.persons.iter().filter(|p| p.is_alive()).count()
    }

    /// Adds a newly-created person and registers it in every index.
    pub fn add_person(&mut self, mut person: Person) -> u64 {
        let id = self.next_person_id;
        self.next_person_id += 1;
        person.id = id;
        self.by_location_state
            .insert(id, person.location, state_code(person.host_state), person.age_class);
        self.persons.push(person);
        id
    }

    fn find_index(&self, id: u64) -> Option<usize> {
        self.persons.iter().position(|p| p.id == id)
    }

    /// Step 2.a: fires every due event for each alive person, then advances
    /// their per-person state (immunity decay, clone density updates,
    /// clearing cured clones).
    pub fn update_all_individuals(
        &mut self,
        current_day: i64,
        epi: &crate::config::EpidemiologicalParameters,
        immune_params: &crate::config::ImmuneSystemParameters,
        density_levels: &crate::config::ParasiteDensityLevels,
        genotype_params: &GenotypeParameters,
        rng: &mut Random,
    ) {
        for i in 0..self.persons.len() {
            if !self.persons[i].is_alive() {
                continue;
            }
            self.persons[i].age_days = current_day - self.persons[i].birthday;
            let old_state = state_code(self.persons[i].host_state);
            let old_location = self.persons[i].location;
            let old_age_class = self.persons[i].age_class;
            {
                let mut ctx = EventContext {
                    genotype_db: &mut self.genotype_db,
                    drug_db: &self.drug_db,
                    therapy_db: &self.therapy_db,
                    strategy_db: &self.strategy_db,
                    coverage_model: &self.coverage_model,
                    locations: &self.locations,
                    immune_params,
                    density_levels,
                    epi_params: epi,
                    mdc: &mut self.mdc,
                    rng,
                    current_day,
                    current_strategy_id: self.current_strategy_id,
                };
                self.persons[i].process_due_events(current_day, &mut ctx);
            }
            let person = &mut self.persons[i];
            let theta = person
                .immune_system
                .get_current_value(current_day, person.age_years(), immune_params);
            person.immune_system.update(current_day, person.age_years(), immune_params);
            let duration = current_day - person.latest_update_time;
            let fitness = person
                .shcpp
                .iter()
                .next()
                .map(|c| self.genotype_db.at(c.genotype_id).daily_fitness_multiple_infection)
                .unwrap_or(1.0);
            let concentrations = person.drugs_in_blood.concentrations(current_day, &self.drug_db, rng);
            for clone in person.shcpp.iter_mut() {
                let genotype = self.genotype_db.at(clone.genotype_id).clone();
                let kill_rates = concentrations.iter().map(|&(drug_id, c)| {
                    crate::drug::pk::killing_rate(c, self.drug_db.at(drug_id), genotype.ec50_power_n[drug_id])
                });
                let combined_kill_rate = drug_action::combine_kill_rates(kill_rates);

                clone.update_function = if combined_kill_rate > 0.0 {
                    DensityUpdateFunction::HavingDrug
                } else if matches!(person.host_state, HostState::Asymptomatic | HostState::Clinical) {
                    DensityUpdateFunction::ImmuneClearance
                } else {
                    DensityUpdateFunction::None
                };
                let update_fn = clone.update_function;
                update_fn.apply(
                    clone,
                    duration,
                    fitness,
                    &person.immune_system,
                    theta,
                    immune_params,
                    density_levels,
                    combined_kill_rate,
                    rng,
                );

                for &(drug_id, concentration) in concentrations.iter() {
                    if concentration <= 0.0 {
                        continue;
                    }
                    let drug_type = self.drug_db.at(drug_id);
                    let mutation_p = crate::drug::pk::mutation_probability_per_locus(
                        concentration,
                        drug_type.k,
                        genotype_params.mutation_probability_per_locus,
                    );
                    if mutation_p <= 0.0 {
                        continue;
                    }
                    let mutated = crate::genotype::mutation::try_mutate_under_drug(
                        &mut self.genotype_db,
                        genotype_params,
                        clone.genotype_id,
                        drug_id,
                        &self.drug_db,
                        mutation_p,
                        rng,
                    );
                    if let Ok(Some(new_genotype_id)) = mutated {
                        clone.genotype_id = new_genotype_id;
                        self.mdc.record_1_mutation(person.location, new_genotype_id);
                        self.mdc.record_1_mutation_by_drug(drug_id);
                    }
                }
            }
            person.shcpp.clear_cured_parasites(density_levels.log_parasite_density_cured);
            person.drugs_in_blood.remove_expired(current_day);
            person.latest_update_time = current_day;
            person.age_class = age_class_for(person.age_years(), self.number_of_age_classes);

            let new_state = state_code(person.host_state);
            let new_location = person.location;
            let new_age_class = person.age_class;
            if new_state != old_state || new_location != old_location || new_age_class != old_age_class {
                self.by_location_state
                    .notify_change(person.id, new_location, new_state, new_age_class);
            }
        }
    }

    /// Step 2.b: draws a daily natural-death Bernoulli per alive person
    /// using `death_rate_by_age_class`, then removes every dead person
    /// (natural or malaria-caused) from every index and deletes them.
    pub fn perform_death_event(&mut self, rng: &mut Random) {
        for person in self.persons.iter_mut() {
            if !person.is_alive() {
                continue;
            }
            let age_class = age_class_for(person.age_years(), self.number_of_age_classes);
            let rate = self.death_rate_by_age_class.get(age_class).copied().unwrap_or(0.0);
            if rate > 0.0 && rng.uniform_01() < rate {
                person.die_of_natural_causes();
            }
        }
        let dead_ids: Vec<u64> = self
            .persons
            .iter()
            .filter(|p| p.host_state == HostState::Dead)
            .map(|p| p.id)
            .collect();
        for id in &dead_ids {
            self.by_location_state.remove(*id);
        }
        self.persons.retain(|p| p.host_state != HostState::Dead);
    }

    /// Step 2.c: Poisson-draws new births per location using `birth_rate *
    /// population_size`, placing each newborn in S at age 0.
    pub fn perform_birth_event(&mut self, current_day: i64, birth_rate: f64, immune_params: &crate::config::ImmuneSystemParameters, rng: &mut Random) {
        for location_idx in 0..self.locations.len() {
            let population_size = self.locations[location_idx].population_size as f64;
            let expected = birth_rate * population_size;
            let births = rng.poisson(expected).unwrap_or(0);
            for _ in 0..births {
                let biting_rate = rng.gamma(1.0, 1.0).unwrap_or(1.0);
                let mut person = Person::new_at_birth(0, location_idx, current_day, biting_rate);
                let immune_seed = rng.beta(immune_params.alpha_immune, immune_params.beta_immune).unwrap_or(0.0);
                person.immune_system.latest_value = immune_seed;
                self.add_person(person);
            }
        }
    }

    /// Step 2.d: recomputes per-person relative biting rate and each
    /// location's current force of infection from the reservoir
    /// infectiousness of every host's clone population.
    pub fn update_current_foi(&mut self, infectivity_scale: f64) {
        self.current_force_of_infection.iter_mut().for_each(|v| *v = 0.0);
        self.relative_biting_sum.iter_mut().for_each(|v| *v = 0.0);
        for person in self.persons.iter_mut() {
            if !person.is_alive() {
                continue;
            }
            let log_infectious = person.shcpp.log10_total_infectious_density();
            let infectiousness = 10f64.powf(log_infectious);
            person.current_relative_biting_rate = person.innate_relative_biting_rate;
            let individual_foi =
                person.current_relative_biting_rate * (1.0 - (-infectivity_scale * infectiousness).exp());
            if let Some(sum) = self.current_force_of_infection.get_mut(person.location) {
                *sum += individual_foi;
            }
            if let Some(sum) = self.relative_biting_sum.get_mut(person.location) {
                *sum += person.current_relative_biting_rate;
            }
        }
    }

    /// Step 2.e: Poisson-draws infectious bites per location, then for each
    /// bite selects a susceptible weighted by biting rate and infects it
    /// with a genotype sampled from the PRMC.
    pub fn perform_infection_event(
        &mut self,
        current_day: i64,
        tracking_index: usize,
        liver_stage_delay_days: i64,
        rng: &mut Random,
    ) {
        for location_idx in 0..self.locations.len() {
            let location = &self.locations[location_idx];
            let expected_bites = location.beta * location.population_size as f64;
            let bites = rng.poisson(expected_bites).unwrap_or(0);
            let susceptible_ids = self.by_location_state.by_location_state(location_idx, state_code(HostState::Susceptible));
            if susceptible_ids.is_empty() {
                continue;
            }
            let weights: Vec<f64> = susceptible_ids
                .iter()
                .filter_map(|id| self.find_index(*id))
                .map(|i| self.persons[i].current_relative_biting_rate.max(1e-9))
                .collect();
            if weights.is_empty() {
                continue;
            }
            for _ in 0..bites {
                let picks = rng.roulette_sampling(1, &weights, &susceptible_ids, true).unwrap_or_default();
                let Some(&&picked_id) = picks.first() else { continue };
                let Some(genotype_id) = self.prmc.sample_infecting_genotype(location_idx, tracking_index, rng) else {
                    continue;
                };
                if let Some(idx) = self.find_index(picked_id) {
                    self.persons[idx].infect_by(genotype_id, current_day, liver_stage_delay_days);
                }
            }
        }
    }

    /// Step 2.f: residents at their home location may begin a trip to
    /// another location weighted by `movement_weights`, scheduled to arrive
    /// tomorrow and return after a gamma-distributed length of stay.
    pub fn perform_circulation(
        &mut self,
        current_day: i64,
        circulation_info: &crate::config::CirculationInfo,
        rng: &mut Random,
    ) {
        if self.locations.len() < 2 {
            return;
        }
        let base_weights: Vec<f64> = self
            .locations
            .iter()
            .map(|l| l.movement_weights.first().copied().unwrap_or(1.0).max(1e-9))
            .collect();
        let location_ids: Vec<usize> = (0..self.locations.len()).collect();
        for person in self.persons.iter_mut() {
            if !person.is_alive() || person.location != person.residence_location {
                continue;
            }
            let moving_levels = circulation_info.number_of_moving_levels.max(1) as f64;
            let travel_probability = 0.01 * (person.moving_level as f64 + 1.0) / moving_levels;
            if rng.uniform_01() >= travel_probability {
                continue;
            }
            let mut candidate_weights = base_weights.clone();
            candidate_weights[person.location] = 0.0;
            if candidate_weights.iter().all(|&w| w <= 0.0) {
                continue;
            }
            let Ok(picks) = rng.roulette_sampling(1, &candidate_weights, &location_ids, true) else {
                continue;
            };
            let Some(&&target_location) = picks.first() else {
                continue;
            };
            let stay_days = rng
                .gamma(circulation_info.length_of_stay_k, circulation_info.length_of_stay_theta)
                .map(|days| days.round().max(1.0) as i64)
                .unwrap_or(1);
            person.events.schedule(
                current_day + 1,
                current_day,
                crate::person::event::PersonEvent::CirculateToTargetLocation { target_location },
            );
            person.events.schedule(
                current_day + 1 + stay_days,
                current_day,
                crate::person::event::PersonEvent::ReturnToResidence,
            );
        }
    }

    /// Step 2.h: snapshots today's force of infection into the ring buffer
    /// so it informs the PRMC draw N days from now.
    pub fn persist_current_foi(&mut self) {
        self.force_of_infection_history.pop_front();
        self.force_of_infection_history.push_back(self.current_force_of_infection.clone());
    }

    /// Step 2.g: repopulates every location's PRMC slot from the current
    /// infectious reservoir (first-mate pool weighted by individual FOI,
    /// second-mate pool weighted by relative biting rate).
    pub fn infect_new_cohort_in_prmc(
        &mut self,
        current_day: i64,
        within_chromosome_recombination_rate: f64,
        mosquito_ifr: f64,
        rng: &mut Random,
    ) {
        let num_locations = self.locations.len();
        let mut first_pool = vec![Vec::new(); num_locations];
        let mut second_pool = vec![Vec::new(); num_locations];
        for person in self.persons.iter() {
            if !person.is_alive() || person.shcpp.is_empty() {
                continue;
            }
            if let Some(clone) = person.shcpp.iter().next() {
                let individual_foi = person.current_relative_biting_rate
                    * (1.0 - (-person.shcpp.log10_total_infectious_density().max(0.0)).exp());
                first_pool[person.location].push((clone.genotype_id, individual_foi.max(1e-9)));
                second_pool[person.location].push((clone.genotype_id, person.current_relative_biting_rate.max(1e-9)));
            }
        }
        self.prmc.infect_new_cohort(
            current_day,
            &self.current_force_of_infection,
            &first_pool,
            &second_pool,
            within_chromosome_recombination_rate,
            mosquito_ifr,
            &mut self.genotype_db,
            &self.drug_db,
            rng,
        );
    }

    pub fn tracking_index(&self, current_day: i64) -> usize {
        (current_day.rem_euclid(self.tracking_days as i64)) as usize
    }

    pub fn force_of_infection_n_days_ago(&self) -> &[f64] {
        self.force_of_infection_history.front().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn persons_mut(&mut self) -> &mut [Person] {
        &mut self.persons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::sample_drug_db;

    fn empty_config() -> Config {
        use crate::config::*;
        Config {
            model_settings: ModelSettings {
                initial_seed_number: 1,
                days_between_stdout_output: 100,
                record_genome_db: false,
            },
            simulation_timeframe: SimulationTimeframe {
                starting_date: "2000-01-01".into(),
                ending_date: "2000-01-02".into(),
                start_collect_data_day: 0,
                start_of_comparison_period: 0,
                total_time: 1,
            },
            transmission_settings: TransmissionSettings::default(),
            population_demographic: PopulationDemographic {
                age_structure: vec![1.0],
                number_of_age_classes: 1,
                birth_rate: 0.0001,
                death_rate_by_age_class: vec![0.0],
            },
            spatial_settings: SpatialSettings::LocationBased {
                location_db: vec![LocationConfig {
                    id: 0,
                    population_size: 100,
                    beta: 0.01,
                    p_treatment_under_5: 0.5,
                    p_treatment_over_5: 0.5,
                    prmc_size: 10,
                    interrupted_feeding_rate: 0.1,
                    movement_weights: vec![1.0],
                }],
            },
            seasonality_settings: SeasonalitySettings::default(),
            movement_settings: MovementSettings {
                spatial_model: "uniform".into(),
                circulation_info: CirculationInfo {
                    number_of_moving_levels: 1,
                    length_of_stay_theta: 1.0,
                    length_of_stay_k: 1.0,
                },
            },
            parasite_parameters: ParasiteParameters {
                parasite_density_levels: ParasiteDensityLevels {
                    log_parasite_density_cured: -2.0,
                    log_parasite_density_asymptomatic: 3.0,
                    log_parasite_density_clinical_from: 4.0,
                    log_parasite_density_clinical_to: 5.0,
                    log_parasite_density_detectable: 1.0,
                    log_parasite_density_detectable_pfpr: 1.0,
                    log_parasite_density_from_liver: 0.0,
                },
                recombination_parameters: RecombinationParameters {
                    within_chromosome_recombination_rate: 0.0,
                },
            },
            immune_system_parameters: ImmuneSystemParameters {
                alpha_immune: 2.0,
                beta_immune: 5.0,
                acquire_rate: 0.02,
                acquire_rate_by_age: vec![],
                decay_rate: 0.001,
                duration_for_fully_immune: 1000.0,
                min_clinical_probability: 0.05,
                max_clinical_probability: 0.9,
                immune_effect_on_progression_to_clinical: 0.5,
                infant_immune_decay_rate: 0.01,
                infant_age_threshold_days: 182,
            },
            genotype_parameters: crate::config::test_fixtures::sample_genotype_parameters(),
            drug_parameters: DrugParameters { drug_db: vec![] },
            therapy_parameters: TherapyParameters {
                therapy_db: vec![],
                recurrence_therapy_id: 0,
                tf_testing_day: 28,
                tf_rate: 0.1,
            },
            strategy_parameters: StrategyParameters {
                initial_strategy_id: 0,
                strategy_db: vec![],
            },
            epidemiological_parameters: EpidemiologicalParameters {
                number_of_tracking_days: 14,
                tf_window_size: 60,
                days_to_clinical_under_five: 10,
                days_to_clinical_over_five: 7,
                gametocyte_level_full: 1.0,
                inflation_factor: 1.0,
                allow_new_coinfection_to_cause_symptoms: false,
            },
            mosquito_parameters: MosquitoParameters {
                mosquito_size: 10,
                mosquito_ifr: 0.1,
                record_recombination_events: false,
                within_host_induced_free_recombination: false,
            },
            population_events: PopulationEventsConfig::default(),
            treatment_coverage_settings: TreatmentCoverageConfig::default(),
        }
    }

    #[test]
    fn birth_event_adds_susceptible_persons() {
        let config = empty_config();
        let db = crate::genotype::GenotypeDb::new(config.genotype_parameters.clone());
        let drugs = sample_drug_db();
        let mut population = Population::new(&config, db, drugs);
        let mut rng = Random::new(1);
        population.perform_birth_event(0, 10.0, &config.immune_system_parameters, &mut rng);
        assert!(!population.is_empty());
        assert!(population.persons().iter().all(|p| p.host_state == HostState::Susceptible));
    }

    /// §8 scenario 2: a clone exposed to a strongly-killing drug should have
    /// its density driven down by `update_all_individuals`, with
    /// `update_function` actually wired to `HavingDrug` rather than left at
    /// its `None` default.
    #[test]
    fn drug_in_blood_drives_clone_density_toward_cured() {
        let config = empty_config();
        let drugs = sample_drug_db();
        let mut genotype_db = GenotypeDb::new(config.genotype_parameters.clone());
        let genotype_id = genotype_db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let mut population = Population::new(&config, genotype_db, drugs);

        let mut person = Person::new_at_birth(0, 0, 0, 1.0);
        person.host_state = HostState::Asymptomatic;
        let token = person.shcpp.add(genotype_id, 0);
        let starting_density = 5.0;
        for clone in person.shcpp.iter_mut() {
            if clone.token == token {
                clone.last_update_log10_parasite_density = starting_density;
            }
        }
        person.drugs_in_blood.add(0, 3, 0, 1.0);
        population.add_person(person);

        let mut rng = Random::new(7);
        population.update_all_individuals(
            1,
            &config.epidemiological_parameters,
            &config.immune_system_parameters,
            &config.parasite_parameters.parasite_density_levels,
            &config.genotype_parameters,
            &mut rng,
        );

        let updated = &population.persons()[0];
        let clone = updated.shcpp.iter().next().expect("clone survives one day of killing");
        assert!(matches!(clone.update_function, crate::host::density_update::DensityUpdateFunction::HavingDrug));
        assert!(clone.last_update_log10_parasite_density < starting_density);
    }

    #[test]
    fn death_event_removes_dead_from_index() {
        let config = empty_config();
        let db = crate::genotype::GenotypeDb::new(config.genotype_parameters.clone());
        let drugs = sample_drug_db();
        let mut population = Population::new(&config, db, drugs);
        let mut person = Person::new_at_birth(0, 0, 0, 1.0);
        person.host_state = HostState::Dead;
        population.add_person(person);
        let mut rng = Random::new(1);
        population.perform_death_event(&mut rng);
        assert!(population.is_empty());
        assert!(population.by_location_state.check_invariant());
    }
}
