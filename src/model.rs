//! Composition root (§M "Model facade"). Owns the [`Scheduler`] and
//! [`Population`] and runs the per-day protocol described in §4.8.
use crate::config::Config;
use crate::drug::DrugDb;
use crate::error::MalasimError;
use crate::genotype::GenotypeDb;
use crate::population::Population;
use crate::population_events::PopulationEvent;
use crate::random::Random;
use crate::scheduler::Scheduler;
use log::{debug, info};

/// Days between liver infection and the parasite's emergence into blood.
/// Not separately configurable in the schema; §4.6 treats it as a fixed
/// biological delay.
const LIVER_STAGE_DELAY_DAYS: i64 = 14;

pub struct Model {
    pub scheduler: Scheduler,
    pub population: Population,
    pub rng: Random,
    config: Config,
}

impl Model {
    /// Builds every shared collaborator from `config` and seeds the initial
    /// population. Startup errors (malformed genotype schema, bad drug
    /// parameters) propagate here; nothing past this point fails the run.
    pub fn initialize(config: Config) -> Result<Self, MalasimError> {
        let drug_db = DrugDb::from_config(&config.drug_parameters);
        let mut genotype_db = GenotypeDb::new(config.genotype_parameters.clone());

        for seed in &config.genotype_parameters.initial_parasite_info {
            genotype_db.get(&seed.aa_sequence, &drug_db).map_err(MalasimError::Domain)?;
        }

        let rng = Random::new(config.model_settings.initial_seed_number);
        let mut population = Population::new(&config, genotype_db, drug_db);

        let mut scheduler = Scheduler::new(config.simulation_timeframe.total_time);
        for event_config in &config.population_events.events {
            let (day, event): (i64, PopulationEvent) = event_config.into();
            scheduler.schedule_population_event(day, event);
        }

        Self::seed_initial_population(&mut population, &config);

        Ok(Self {
            scheduler,
            population,
            rng,
            config,
        })
    }

    fn seed_initial_population(population: &mut Population, config: &Config) {
        for location in &population.locations.clone() {
            let mut rng = Random::new(config.model_settings.initial_seed_number.wrapping_add(location.id as u64 + 1));
            for _ in 0..location.population_size {
                let biting_rate = rng.gamma(1.0, 1.0).unwrap_or(1.0);
                let age_days = (rng.uniform(0.0, 60.0 * 365.0).unwrap_or(0.0)) as i64;
                let mut person = crate::person::Person::new_at_birth(0, location.id, -age_days, biting_rate);
                person.age_days = age_days;
                population.add_person(person);
            }
        }
    }

    /// Runs every day from `0` through `total_time` following the §4.8
    /// protocol, returning once the scheduler reports it should stop.
    pub fn run(&mut self) -> Result<(), MalasimError> {
        info!("starting run: total_time={}", self.config.simulation_timeframe.total_time);
        while self.scheduler.should_continue() {
            self.begin_time_step();
            self.daily_update();
            self.end_time_step();
            self.scheduler.advance_day();
        }
        info!("run complete at day {}", self.scheduler.current_time);
        Ok(())
    }

    fn begin_time_step(&mut self) {
        self.population.mdc.begin_time_step();
    }

    fn daily_update(&mut self) {
        let current_day = self.scheduler.current_time;
        let epi = self.config.epidemiological_parameters.clone();
        let immune_params = self.config.immune_system_parameters.clone();
        let density_levels = self.config.parasite_parameters.parasite_density_levels.clone();
        let genotype_params = self.config.genotype_parameters.clone();
        let liver_delay = LIVER_STAGE_DELAY_DAYS;

        self.population
            .update_all_individuals(current_day, &epi, &immune_params, &density_levels, &genotype_params, &mut self.rng);
        self.population.perform_death_event(&mut self.rng);
        self.population
            .perform_birth_event(current_day, self.config.population_demographic.birth_rate, &immune_params, &mut self.rng);
        self.population.update_current_foi(self.config.transmission_settings.transmission_rate);

        let tracking_index = self.population.tracking_index(current_day);
        self.population
            .perform_infection_event(current_day, tracking_index, liver_delay.max(1), &mut self.rng);

        self.population.perform_circulation(
            current_day,
            &self.config.movement_settings.circulation_info,
            &mut self.rng,
        );

        self.population.infect_new_cohort_in_prmc(
            current_day,
            self.config.parasite_parameters.recombination_parameters.within_chromosome_recombination_rate,
            self.config.mosquito_parameters.mosquito_ifr,
            &mut self.rng,
        );
        self.population.persist_current_foi();

        crate::population_events::execute_due(&mut self.population, &mut self.scheduler, liver_delay.max(1), &mut self.rng);

        if self.scheduler.is_month_boundary() {
            self.population.mdc.reset_monthly_new_infections();
            self.population.strategy_db.monthly_update(current_day);
        }
        if self.scheduler.is_year_boundary() {
            debug!("year boundary at day {current_day}");
        }
        self.population.strategy_db.update_end_of_time_step(&self.population.mdc);
    }

    fn end_time_step(&mut self) {
        self.population.mdc.end_time_step();
    }

    /// Releases owned resources and returns the final data collector for
    /// reporters to read. The core never performs I/O itself (§5); writing
    /// a report is the CLI's job.
    pub fn release(self) -> crate::mdc::ModelDataCollector {
        self.population.mdc
    }
}
