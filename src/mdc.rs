//! Pure write-side accumulator (§3 "ModelDataCollector", §4.11). The core
//! only ever writes to this through the `record_*` hooks; reporters read it
//! back through the accessors. No side effects beyond bookkeeping live here.
use crate::genotype::GenotypeId;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
struct PerLocationDailyCounters {
    infections: u64,
    clinical_episodes: u64,
    treatments: u64,
    recrudescence_treatments: u64,
    non_treated_cases: u64,
    malaria_deaths: u64,
    mutations: u64,
    new_infections_this_month: u64,
}

#[derive(Debug, Clone, Default)]
struct TfWindow {
    /// Rolling window of per-day (treatment_failures, treatment_successes)
    /// used for the 60-day TF rate (§4.9 AdaptiveCyclingStrategy,
    /// §4.11 "60-day rolling TF window").
    window: VecDeque<(u64, u64)>,
    window_size: usize,
}

impl TfWindow {
    fn new(window_size: usize) -> Self {
        Self {
            window: VecDeque::new(),
            window_size,
        }
    }
    fn push_day(&mut self, failures: u64, successes: u64) {
        self.window.push_back((failures, successes));
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
    }
    fn rate(&self) -> f64 {
        let (f, s) = self
            .window
            .iter()
            .fold((0u64, 0u64), |(af, as_), (f, s)| (af + f, as_ + s));
        let total = f + s;
        if total == 0 {
            0.0
        } else {
            f as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct ModelDataCollector {
    per_location: FxHashMap<usize, PerLocationDailyCounters>,
    per_location_monthly_new_infections: FxHashMap<usize, u64>,
    tf_by_therapy: FxHashMap<usize, TfWindow>,
    treatment_success_by_therapy: FxHashMap<usize, u64>,
    treatment_failure_by_therapy: FxHashMap<usize, u64>,
    mutation_by_drug: FxHashMap<usize, u64>,
    genotype_tally: FxHashMap<GenotypeId, u64>,
    cumulative_mutants_by_location: FxHashMap<usize, u64>,
    tf_window_size: usize,
}

impl ModelDataCollector {
    pub fn new(tf_window_size: usize) -> Self {
        Self {
            tf_window_size,
            ..Default::default()
        }
    }

    /// Zeroes per-day counters; called at the top of every tick.
    pub fn begin_time_step(&mut self) {
        for counters in self.per_location.values_mut() {
            *counters = PerLocationDailyCounters::default();
        }
    }

    pub fn end_time_step(&mut self) {
        for (therapy_id, failures) in self.treatment_failure_by_therapy.clone() {
            let successes = *self.treatment_success_by_therapy.get(&therapy_id).unwrap_or(&0);
            self.tf_by_therapy
                .entry(therapy_id)
                .or_insert_with(|| TfWindow::new(self.tf_window_size))
                .push_day(failures, successes);
        }
        self.treatment_failure_by_therapy.clear();
        self.treatment_success_by_therapy.clear();
    }

    fn loc(&mut self, location: usize) -> &mut PerLocationDailyCounters {
        self.per_location.entry(location).or_default()
    }

    pub fn record_1_infection(&mut self, location: usize) {
        self.loc(location).infections += 1;
        *self.per_location_monthly_new_infections.entry(location).or_insert(0) += 1;
    }

    pub fn record_1_clinical_episode(&mut self, location: usize) {
        self.loc(location).clinical_episodes += 1;
    }

    pub fn record_1_treatment(&mut self, location: usize) {
        self.loc(location).treatments += 1;
    }

    pub fn record_1_recrudescence_treatment(&mut self, location: usize) {
        self.loc(location).recrudescence_treatments += 1;
    }

    pub fn record_1_non_treated_case(&mut self, location: usize) {
        self.loc(location).non_treated_cases += 1;
    }

    pub fn record_1_tf(&mut self, therapy_id: usize) {
        *self.treatment_failure_by_therapy.entry(therapy_id).or_insert(0) += 1;
    }

    pub fn record_1_treatment_failure_by_therapy(&mut self, therapy_id: usize) {
        *self.treatment_failure_by_therapy.entry(therapy_id).or_insert(0) += 1;
    }

    pub fn record_1_treatment_success_by_therapy(&mut self, therapy_id: usize) {
        *self.treatment_success_by_therapy.entry(therapy_id).or_insert(0) += 1;
    }

    pub fn record_1_malaria_death(&mut self, location: usize) {
        self.loc(location).malaria_deaths += 1;
    }

    pub fn record_1_mutation(&mut self, location: usize, genotype_id: GenotypeId) {
        self.loc(location).mutations += 1;
        *self.genotype_tally.entry(genotype_id).or_insert(0) += 1;
        *self.cumulative_mutants_by_location.entry(location).or_insert(0) += 1;
    }

    pub fn record_1_mutation_by_drug(&mut self, drug_id: usize) {
        *self.mutation_by_drug.entry(drug_id).or_insert(0) += 1;
    }

    pub fn tf_rate_for_therapy(&self, therapy_id: usize) -> f64 {
        self.tf_by_therapy.get(&therapy_id).map(TfWindow::rate).unwrap_or(0.0)
    }

    pub fn infections_today(&self, location: usize) -> u64 {
        self.per_location.get(&location).map(|c| c.infections).unwrap_or(0)
    }

    pub fn mutations_today(&self, location: usize) -> u64 {
        self.per_location.get(&location).map(|c| c.mutations).unwrap_or(0)
    }

    pub fn cumulative_mutants(&self, location: usize) -> u64 {
        *self.cumulative_mutants_by_location.get(&location).unwrap_or(&0)
    }

    pub fn genotype_tally(&self) -> &FxHashMap<GenotypeId, u64> {
        &self.genotype_tally
    }

    /// Snapshot of new infections this month, reset at month boundaries by
    /// the caller via [`ModelDataCollector::reset_monthly_new_infections`].
    pub fn monthly_new_infections(&self, location: usize) -> u64 {
        *self.per_location_monthly_new_infections.get(&location).unwrap_or(&0)
    }

    pub fn reset_monthly_new_infections(&mut self) {
        self.per_location_monthly_new_infections.clear();
    }

    /// Blood-slide prevalence by location: fraction of alive, non-susceptible
    /// hosts detectable at the configured threshold. The core only
    /// aggregates; the per-person detectability test lives in the caller.
    pub fn blood_slide_prevalence(&self, detectable_count: u64, alive_count: u64) -> f64 {
        if alive_count == 0 {
            0.0
        } else {
            detectable_count as f64 / alive_count as f64
        }
    }
}
