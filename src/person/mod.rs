//! A single host and its state machine (§3 "Person", §4.6).
pub mod event;
pub mod event_manager;

use crate::genotype::GenotypeId;
use crate::host::clone::ClonalParasitePopulation;
use crate::host::drugs_in_blood::DrugsInBlood;
use crate::host::immune_system::ImmuneSystem;
use crate::host::shcpp::SingleHostClonalParasitePopulations;
use event::{EventContext, PersonEvent};
use event_manager::EventManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Susceptible,
    Exposed,
    Asymptomatic,
    Clinical,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: u64,
    pub location: usize,
    pub residence_location: usize,
    pub host_state: HostState,
    pub age_days: i64,
    pub birthday: i64,
    pub age_class: usize,
    pub moving_level: usize,
    pub innate_relative_biting_rate: f64,
    pub current_relative_biting_rate: f64,
    pub immune_system: ImmuneSystem,
    pub shcpp: SingleHostClonalParasitePopulations,
    pub drugs_in_blood: DrugsInBlood,
    pub liver_parasite_type: Option<GenotypeId>,
    pub latest_update_time: i64,
    pub number_of_times_bitten: u64,
    pub events: EventManager,
}

impl Person {
    pub fn new_at_birth(
        id: u64,
        location: usize,
        current_time: i64,
        innate_relative_biting_rate: f64,
    ) -> Self {
        Self {
            id,
            location,
            residence_location: location,
            host_state: HostState::Susceptible,
            age_days: 0,
            birthday: current_time,
            age_class: 0,
            moving_level: 0,
            innate_relative_biting_rate,
            current_relative_biting_rate: innate_relative_biting_rate,
            immune_system: ImmuneSystem::new_at_birth(current_time),
            shcpp: SingleHostClonalParasitePopulations::new(),
            drugs_in_blood: DrugsInBlood::new(),
            liver_parasite_type: None,
            latest_update_time: current_time,
            number_of_times_bitten: 0,
            events: EventManager::new(),
        }
    }

    pub fn age_years(&self) -> f64 {
        self.age_days as f64 / 365.0
    }

    pub fn is_alive(&self) -> bool {
        self.host_state != HostState::Dead
    }

    /// S -> E: infects the liver stage and schedules the delayed transition
    /// into blood. A person already carrying a liver parasite simply loses
    /// it to the new infection (only one liver-stage infection at a time).
    pub fn infect_by(&mut self, genotype_id: GenotypeId, current_time: i64, liver_stage_delay: i64) {
        if self.host_state == HostState::Dead {
            return;
        }
        self.liver_parasite_type = Some(genotype_id);
        if self.host_state == HostState::Susceptible {
            self.host_state = HostState::Exposed;
        }
        self.events.schedule(
            current_time + liver_stage_delay,
            current_time,
            PersonEvent::MoveParasiteToBlood { genotype_id },
        );
    }

    /// E -> A: the liver parasite enters blood as a new clone. With no
    /// effective drug on board and MOI <= 1, immediately rolls for clinical
    /// progression (§4.6).
    pub fn move_parasite_to_blood(&mut self, genotype_id: GenotypeId, ctx: &mut EventContext) {
        if self.host_state == HostState::Dead {
            return;
        }
        let density = ctx
            .rng
            .normal_truncated(
                ctx.density_levels.log_parasite_density_asymptomatic,
                0.5,
                3.0,
                50,
            )
            .unwrap_or(ctx.density_levels.log_parasite_density_asymptomatic);
        let token = self.shcpp.add(genotype_id, ctx.current_day);
        if let Some(clone) = self.shcpp_clone_mut(token) {
            clone.last_update_log10_parasite_density = density;
            clone.set_gametocyte_level(ctx.epi_params.gametocyte_level_full);
        }
        if self.liver_parasite_type == Some(genotype_id) {
            self.liver_parasite_type = None;
        }
        self.host_state = HostState::Asymptomatic;
        ctx.mdc.record_1_infection(self.location);

        let moi = self.shcpp.len();
        let no_effective_drug = self.drugs_in_blood.is_empty();
        if no_effective_drug && moi <= 1 {
            self.determine_clinical_or_not(token, ctx);
        }
    }

    fn shcpp_clone_mut(&mut self, token: u64) -> Option<&mut ClonalParasitePopulation> {
        self.shcpp.iter_mut().find(|c| c.token == token)
    }

    /// Bernoulli draw on the immune-modulated clinical-progression
    /// probability; on success schedules `ProgressToClinicalEvent`
    /// immediately (same-day transition is modeled as a zero-delay event).
    fn determine_clinical_or_not(&mut self, clone_token: u64, ctx: &mut EventContext) {
        let theta = self
            .immune_system
            .get_current_value(ctx.current_day, self.age_years(), ctx.immune_params);
        let p_clinical = self
            .immune_system
            .get_clinical_progression_probability(theta, ctx.immune_params);
        if ctx.rng.uniform_01() < p_clinical {
            self.events.schedule(
                ctx.current_day,
                ctx.current_day,
                PersonEvent::ProgressToClinical { clone_token },
            );
        }
    }

    /// A -> C (§4.6). No-ops if the causative clone is gone or the host is
    /// already clinical; otherwise sets a clinical-range density, cancels
    /// rival progress-to-clinical events, rolls for treatment and death.
    pub fn progress_to_clinical(&mut self, clone_token: u64, ctx: &mut EventContext) {
        if self.host_state == HostState::Dead || self.host_state == HostState::Clinical {
            return;
        }
        if self.shcpp.find_by_token(clone_token).is_none() {
            return;
        }
        let density = ctx
            .rng
            .uniform(
                ctx.density_levels.log_parasite_density_clinical_from,
                ctx.density_levels.log_parasite_density_clinical_to,
            )
            .unwrap_or(ctx.density_levels.log_parasite_density_clinical_from);
        if let Some(clone) = self.shcpp_clone_mut(clone_token) {
            clone.last_update_log10_parasite_density = density;
        }
        self.host_state = HostState::Clinical;
        ctx.mdc.record_1_clinical_episode(self.location);

        self.events
            .cancel_matching(|e| matches!(e, PersonEvent::ProgressToClinical { .. }));

        let treated = ctx.rng.uniform_01() < self.coverage_probability(ctx);
        if treated {
            let therapy_id = ctx.strategy_db.get_therapy(
                ctx.current_strategy_id,
                self.age_years(),
                ctx.current_day,
                ctx.rng,
            );
            self.events.schedule(
                ctx.current_day,
                ctx.current_day,
                PersonEvent::ReceiveTherapy {
                    therapy_id,
                    is_recrudescence: false,
                },
            );
            if self.will_die(0.1, ctx) {
                event::execute(self, PersonEvent::ReportTreatmentFailureDeath { therapy_id }, ctx);
                self.die(ctx);
                return;
            }
        } else {
            ctx.mdc.record_1_non_treated_case(self.location);
            if self.will_die(1.0, ctx) {
                self.die(ctx);
                return;
            }
        }

        self.events.schedule(
            ctx.current_day + self.clinical_duration_days(ctx),
            ctx.current_day,
            PersonEvent::EndClinical { clone_token },
        );
    }

    fn coverage_probability(&self, ctx: &EventContext) -> f64 {
        let location = &ctx.locations[self.location];
        ctx.coverage_model.p_treatment(location, self.age_years(), ctx.current_day)
    }

    fn clinical_duration_days(&self, ctx: &EventContext) -> i64 {
        if self.age_years() < 5.0 {
            ctx.epi_params.days_to_clinical_under_five
        } else {
            ctx.epi_params.days_to_clinical_over_five
        }
    }

    /// `will_progress_to_death_when_*`: Bernoulli draw with the configured
    /// mortality probability scaled by `relative_risk` (the treated case
    /// draws at 10% of the untreated probability, per §4.6).
    fn will_die(&self, relative_risk: f64, ctx: &mut EventContext) -> bool {
        let base_probability = 0.01 * relative_risk;
        ctx.rng.uniform_01() < base_probability
    }

    fn die(&mut self, ctx: &mut EventContext) {
        self.host_state = HostState::Dead;
        self.events.cancel_all();
        ctx.mdc.record_1_malaria_death(self.location);
    }

    /// Background mortality draw (population-level death event), distinct
    /// from a malaria-attributable death: no MDC death counter is touched.
    pub fn die_of_natural_causes(&mut self) {
        self.host_state = HostState::Dead;
        self.events.cancel_all();
    }

    /// C -> A or C -> S (§4.6). If no clones remain, returns to susceptible;
    /// otherwise checks the causative clone's residual density against the
    /// re-emergence threshold to decide symptomatic vs silent continuation.
    pub fn end_clinical(&mut self, clone_token: u64, ctx: &mut EventContext) {
        if self.host_state == HostState::Dead {
            return;
        }
        if self.shcpp.is_empty() {
            self.host_state = HostState::Susceptible;
            return;
        }
        self.host_state = HostState::Asymptomatic;
        let density = self
            .shcpp
            .find_by_token(clone_token)
            .map(|c| c.last_update_log10_parasite_density)
            .unwrap_or(crate::host::clone::LOG_ZERO);
        if density > 2.0 {
            self.events.schedule(
                ctx.current_day,
                ctx.current_day,
                PersonEvent::ProgressToClinical { clone_token },
            );
        }
    }

    /// Adds every constituent drug of `therapy_id` to blood. Recrudescence
    /// courses are tallied separately from first-line treatments (§4.11).
    pub fn receive_therapy(&mut self, therapy_id: usize, is_recrudescence: bool, ctx: &mut EventContext) {
        let therapy = match ctx.therapy_db.iter().find(|t| t.id == therapy_id) {
            Some(t) => t,
            None => return,
        };
        crate::therapy::apply_therapy(&mut self.drugs_in_blood, therapy, ctx.drug_db, ctx.current_day, ctx.rng);
        if is_recrudescence {
            ctx.mdc.record_1_recrudescence_treatment(self.location);
        } else {
            ctx.mdc.record_1_treatment(self.location);
        }

        self.events.schedule(
            ctx.current_day + ctx.epi_params.number_of_tracking_days as i64,
            ctx.current_day,
            PersonEvent::TestTreatmentFailure {
                therapy_id,
                clone_token: 0,
            },
        );
    }

    /// Tests whether the treated clone is still detectable at the TF-testing
    /// day; records success or failure against the therapy's rolling TF rate
    /// (§4.9 AdaptiveCyclingStrategy, §4.11).
    pub fn test_treatment_failure(&mut self, therapy_id: usize, _clone_token: u64, ctx: &mut EventContext) {
        let still_detectable = self
            .shcpp
            .iter()
            .any(|c| c.last_update_log10_parasite_density > ctx.density_levels.log_parasite_density_detectable);
        if still_detectable {
            ctx.mdc.record_1_treatment_failure_by_therapy(therapy_id);
            ctx.mdc.record_1_tf(therapy_id);
        } else {
            ctx.mdc.record_1_treatment_success_by_therapy(therapy_id);
        }
    }

    /// Mirrors `ReportTreatmentFailureDeathEvent`: a treated clinical case
    /// that dies anyway counts as a treatment failure for its therapy, on
    /// top of the malaria death `die()` records (§4.11).
    pub fn report_treatment_failure_death(&mut self, therapy_id: usize, ctx: &mut EventContext) {
        ctx.mdc.record_1_treatment_failure_by_therapy(therapy_id);
        ctx.mdc.record_1_tf(therapy_id);
    }

    pub fn return_to_residence(&mut self) {
        self.location = self.residence_location;
    }

    pub fn circulate_to(&mut self, target_location: usize, current_day: i64) {
        self.location = target_location;
        let _ = current_day;
    }

    /// Fires every event due today, threading `ctx` through each so state
    /// that later events depend on (e.g. a newly-dead host cancelling its
    /// own remaining queue) is visible immediately. Keeps draining the
    /// queue until no more events land on today's bucket, since executing
    /// an event can itself schedule a same-day follow-on (e.g.
    /// `determine_clinical_or_not` scheduling `ProgressToClinical` today).
    pub fn process_due_events(&mut self, current_day: i64, ctx: &mut EventContext) {
        loop {
            let due = self.events.pop_due(current_day);
            if due.is_empty() {
                break;
            }
            for event in due {
                if self.host_state == HostState::Dead {
                    return;
                }
                event::execute(self, event, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::{sample_drug_db, sample_genotype_parameters};
    use crate::genotype::GenotypeDb;
    use crate::location::Location;
    use crate::mdc::ModelDataCollector;
    use crate::random::Random;
    use crate::strategy::StrategyDb;

    fn ctx_harness<'a>(
        genotype_db: &'a mut GenotypeDb,
        drug_db: &'a DrugDb,
        therapy_db: &'a [TherapyConfig],
        strategy_db: &'a StrategyDb,
        coverage_model: &'a crate::strategy::coverage::CoverageModel,
        locations: &'a [Location],
        immune_params: &'a ImmuneSystemParameters,
        density_levels: &'a ParasiteDensityLevels,
        epi_params: &'a EpidemiologicalParameters,
        mdc: &'a mut ModelDataCollector,
        rng: &'a mut Random,
        current_day: i64,
    ) -> EventContext<'a> {
        EventContext {
            genotype_db,
            drug_db,
            therapy_db,
            strategy_db,
            coverage_model,
            locations,
            immune_params,
            density_levels,
            epi_params,
            mdc,
            rng,
            current_day,
            current_strategy_id: 0,
        }
    }

    use crate::config::{
        EpidemiologicalParameters, ImmuneSystemParameters, ParasiteDensityLevels, TherapyConfig,
    };
    use crate::drug::DrugDb;

    fn sample_density_levels() -> ParasiteDensityLevels {
        ParasiteDensityLevels {
            log_parasite_density_cured: -2.0,
            log_parasite_density_asymptomatic: 3.0,
            log_parasite_density_clinical_from: 4.0,
            log_parasite_density_clinical_to: 5.0,
            log_parasite_density_detectable: 1.0,
            log_parasite_density_detectable_pfpr: 1.0,
            log_parasite_density_from_liver: 0.0,
        }
    }

    fn sample_immune_params() -> ImmuneSystemParameters {
        ImmuneSystemParameters {
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
        }
    }

    fn sample_epi_params() -> EpidemiologicalParameters {
        EpidemiologicalParameters {
            number_of_tracking_days: 28,
            tf_window_size: 60,
            days_to_clinical_under_five: 10,
            days_to_clinical_over_five: 7,
            gametocyte_level_full: 1.0,
            inflation_factor: 1.0,
            allow_new_coinfection_to_cause_symptoms: false,
        }
    }

    #[test]
    fn infection_schedules_move_to_blood() {
        let mut person = Person::new_at_birth(0, 0, 0, 1.0);
        person.infect_by(GenotypeId(0), 0, 14);
        assert_eq!(person.host_state, HostState::Exposed);
        assert!(!person.events.is_empty());
    }

    #[test]
    fn move_to_blood_transitions_to_asymptomatic() {
        let mut genotype_db = GenotypeDb::new(sample_genotype_parameters());
        let drug_db = sample_drug_db();
        let therapy_db: Vec<TherapyConfig> = vec![];
        let strategy_db = StrategyDb::from_config(&[]);
        let coverage_model = crate::strategy::coverage::CoverageModel::Steady;
        let locations = vec![Location::new(0, 1000, 0.1, 0.6, 0.4, 100, 0.1)];
        let immune_params = sample_immune_params();
        let density_levels = sample_density_levels();
        let epi_params = sample_epi_params();
        let mut mdc = ModelDataCollector::new(60);
        let mut rng = Random::new(1);

        let genotype_id = genotype_db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drug_db).unwrap();
        let mut person = Person::new_at_birth(0, 0, 0, 1.0);
        person.host_state = HostState::Exposed;
        let mut ctx = ctx_harness(
            &mut genotype_db,
            &drug_db,
            &therapy_db,
            &strategy_db,
            &coverage_model,
            &locations,
            &immune_params,
            &density_levels,
            &epi_params,
            &mut mdc,
            &mut rng,
            0,
        );
        person.move_parasite_to_blood(genotype_id, &mut ctx);
        assert_eq!(person.host_state, HostState::Asymptomatic);
        assert_eq!(person.shcpp.len(), 1);
        assert_eq!(mdc.infections_today(0), 1);
    }

    /// A treated clinical case that dies still counts against its therapy's
    /// rolling treatment-failure rate (§4.11), not just as a malaria death.
    #[test]
    fn report_treatment_failure_death_counts_against_therapy_tf_rate() {
        let mut genotype_db = GenotypeDb::new(sample_genotype_parameters());
        let drug_db = sample_drug_db();
        let therapy_db: Vec<TherapyConfig> = vec![];
        let strategy_db = StrategyDb::from_config(&[]);
        let coverage_model = crate::strategy::coverage::CoverageModel::Steady;
        let locations = vec![Location::new(0, 1000, 0.1, 0.6, 0.4, 100, 0.1)];
        let immune_params = sample_immune_params();
        let density_levels = sample_density_levels();
        let epi_params = sample_epi_params();
        let mut mdc = ModelDataCollector::new(60);
        let mut rng = Random::new(1);
        let mut ctx = ctx_harness(
            &mut genotype_db,
            &drug_db,
            &therapy_db,
            &strategy_db,
            &coverage_model,
            &locations,
            &immune_params,
            &density_levels,
            &epi_params,
            &mut mdc,
            &mut rng,
            0,
        );

        let mut person = Person::new_at_birth(0, 0, 0, 1.0);
        person.report_treatment_failure_death(3, &mut ctx);
        ctx.mdc.end_time_step();
        assert!(ctx.mdc.tf_rate_for_therapy(3) > 0.0);
    }
}
