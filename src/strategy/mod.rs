//! Treatment strategy (§4.9). Strategies are kept in a flat `StrategyDb` and
//! addressed by id so `NestedMft` can hold child ids without a recursive
//! ownership graph. One closed enum dispatched by a big match, holding
//! mutable per-strategy state (cycling phase, adaptive thresholds, evolving
//! nested distributions) rather than reaching for dynamic dispatch.
pub mod coverage;

use crate::config::StrategyConfig;
use crate::mdc::ModelDataCollector;
use crate::random::Random;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Strategy {
    Sft {
        therapy_id: usize,
    },
    Mft {
        therapy_ids: Vec<usize>,
        distribution: Vec<f64>,
    },
    MftAgeBased {
        therapy_ids: Vec<usize>,
        age_boundaries: Vec<f64>,
    },
    Cycling {
        therapy_ids: Vec<usize>,
        cycle_period_days: i64,
        started_time: i64,
    },
    AdaptiveCycling {
        therapy_ids: Vec<usize>,
        tf_threshold: f64,
        active_index: usize,
    },
    NestedMft {
        child_strategy_ids: Vec<usize>,
        start_distribution: Vec<f64>,
        peak_distribution: Vec<f64>,
        peak_after_days: i64,
        started_time: i64,
    },
}

impl From<&StrategyConfig> for Strategy {
    fn from(c: &StrategyConfig) -> Self {
        match c {
            StrategyConfig::Sft { therapy_id, .. } => Strategy::Sft {
                therapy_id: *therapy_id,
            },
            StrategyConfig::Mft {
                therapy_ids,
                distribution,
                ..
            } => Strategy::Mft {
                therapy_ids: therapy_ids.clone(),
                distribution: distribution.clone(),
            },
            StrategyConfig::MftAgeBased {
                therapy_ids,
                age_boundaries,
                ..
            } => Strategy::MftAgeBased {
                therapy_ids: therapy_ids.clone(),
                age_boundaries: age_boundaries.clone(),
            },
            StrategyConfig::Cycling {
                therapy_ids,
                cycle_period_days,
                ..
            } => Strategy::Cycling {
                therapy_ids: therapy_ids.clone(),
                cycle_period_days: *cycle_period_days,
                started_time: 0,
            },
            StrategyConfig::AdaptiveCycling {
                therapy_ids, tf_threshold, ..
            } => Strategy::AdaptiveCycling {
                therapy_ids: therapy_ids.clone(),
                tf_threshold: *tf_threshold,
                active_index: 0,
            },
            StrategyConfig::NestedMft {
                child_strategy_ids,
                start_distribution,
                peak_distribution,
                peak_after_days,
                ..
            } => Strategy::NestedMft {
                child_strategy_ids: child_strategy_ids.clone(),
                start_distribution: start_distribution.clone(),
                peak_distribution: peak_distribution.clone(),
                peak_after_days: *peak_after_days,
                started_time: 0,
            },
        }
    }
}

/// `upper_bound(boundaries, age)`: the index of the first boundary strictly
/// greater than `age`; a person exactly at a boundary falls in the upper
/// bucket.
fn upper_bound_index(boundaries: &[f64], age: f64) -> usize {
    boundaries.iter().position(|&b| age < b).unwrap_or(boundaries.len())
}

pub struct StrategyDb {
    by_id: HashMap<usize, Strategy>,
}

impl StrategyDb {
    pub fn from_config(configs: &[StrategyConfig]) -> Self {
        let mut by_id = HashMap::new();
        for c in configs {
            let id = match c {
                StrategyConfig::Sft { id, .. }
                | StrategyConfig::Mft { id, .. }
                | StrategyConfig::MftAgeBased { id, .. }
                | StrategyConfig::Cycling { id, .. }
                | StrategyConfig::AdaptiveCycling { id, .. }
                | StrategyConfig::NestedMft { id, .. } => *id,
            };
            by_id.insert(id, Strategy::from(c));
        }
        Self { by_id }
    }

    pub fn get(&self, id: usize) -> &Strategy {
        self.by_id.get(&id).expect("unknown strategy id")
    }

    /// Always returns a `therapy_id` present in `therapy_db` as long as
    /// the config is internally consistent; callers validate that at load time.
    pub fn get_therapy(&self, strategy_id: usize, age_years: f64, current_day: i64, rng: &mut Random) -> usize {
        match self.get(strategy_id) {
            Strategy::Sft { therapy_id } => *therapy_id,
            Strategy::Mft {
                therapy_ids,
                distribution,
            } => {
                let draw = rng.uniform_01();
                let mut cumulative = 0.0;
                for (id, p) in therapy_ids.iter().zip(distribution.iter()) {
                    cumulative += p;
                    if draw < cumulative {
                        return *id;
                    }
                }
                *therapy_ids.last().expect("non-empty MFT therapy list")
            }
            Strategy::MftAgeBased {
                therapy_ids,
                age_boundaries,
            } => {
                let idx = upper_bound_index(age_boundaries, age_years).min(therapy_ids.len() - 1);
                therapy_ids[idx]
            }
            Strategy::Cycling {
                therapy_ids,
                cycle_period_days,
                started_time,
            } => {
                let elapsed = current_day - started_time;
                let period_index = (elapsed / cycle_period_days.max(&1)) as usize % therapy_ids.len();
                therapy_ids[period_index]
            }
            Strategy::AdaptiveCycling {
                therapy_ids,
                active_index,
                ..
            } => therapy_ids[*active_index % therapy_ids.len()],
            Strategy::NestedMft {
                child_strategy_ids,
                start_distribution,
                peak_distribution,
                peak_after_days,
                started_time,
            } => {
                let distribution =
                    interpolate_distribution(start_distribution, peak_distribution, current_day - started_time, *peak_after_days);
                let draw = rng.uniform_01();
                let mut cumulative = 0.0;
                let mut chosen_child = *child_strategy_ids.last().expect("non-empty nested MFT");
                for (id, p) in child_strategy_ids.iter().zip(distribution.iter()) {
                    cumulative += p;
                    if draw < cumulative {
                        chosen_child = *id;
                        break;
                    }
                }
                self.get_therapy(chosen_child, age_years, current_day, rng)
            }
        }
    }

    /// Rotates an `AdaptiveCyclingStrategy` when the active therapy's
    /// rolling TF rate exceeds its configured threshold.
    pub fn update_end_of_time_step(&mut self, mdc: &ModelDataCollector) {
        for strategy in self.by_id.values_mut() {
            if let Strategy::AdaptiveCycling {
                therapy_ids,
                tf_threshold,
                active_index,
            } = strategy
            {
                let active_therapy = therapy_ids[*active_index % therapy_ids.len()];
                if mdc.tf_rate_for_therapy(active_therapy) > *tf_threshold {
                    *active_index = (*active_index + 1) % therapy_ids.len();
                }
            }
        }
    }

    /// Monthly compounding inflation of the nested strategy's first entry,
    /// renormalized so the distribution still sums to one (§4.9).
    pub fn monthly_update(&mut self, _current_day: i64) {
        for strategy in self.by_id.values_mut() {
            if let Strategy::NestedMft { start_distribution, .. } = strategy {
                if !start_distribution.is_empty() {
                    start_distribution[0] = (start_distribution[0] * 1.01).min(1.0);
                    let total: f64 = start_distribution.iter().sum();
                    if total > 0.0 {
                        start_distribution.iter_mut().for_each(|p| *p /= total);
                    }
                }
            }
        }
    }

    pub fn adjust_started_time_point(&mut self, strategy_id: usize, t: i64) {
        if let Some(strategy) = self.by_id.get_mut(&strategy_id) {
            match strategy {
                Strategy::Cycling { started_time, .. } => *started_time = t,
                Strategy::NestedMft { started_time, .. } => *started_time = t,
                _ => {}
            }
        }
    }
}

fn interpolate_distribution(start: &[f64], peak: &[f64], elapsed: i64, peak_after: i64) -> Vec<f64> {
    if peak_after <= 0 || elapsed >= peak_after {
        return peak.to_vec();
    }
    let t = elapsed.max(0) as f64 / peak_after as f64;
    start
        .iter()
        .zip(peak.iter())
        .map(|(s, p)| s + t * (p - s))
        .collect()
}
