//! Host immunity (§3 "ImmuneSystem", §4.4). Holds one of two age-gated
//! components: `Infant` (pure exponential decay) before 6 months, `Adult`
//! (age-modulated saturating acquire/decay) afterwards.
use crate::config::ImmuneSystemParameters;
use crate::random::Random;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentKind {
    Infant,
    Adult,
}

#[derive(Debug, Clone)]
pub struct ImmuneSystem {
    kind: ComponentKind,
    pub latest_value: f64,
    pub latest_update_time: i64,
    pub increase: bool,
}

impl ImmuneSystem {
    pub fn new_at_birth(current_time: i64) -> Self {
        Self {
            kind: ComponentKind::Infant,
            latest_value: 0.0,
            latest_update_time: current_time,
            increase: true,
        }
    }

    /// Switches the active component when the host crosses the infant/adult
    /// age threshold (§3: "Infant before 6 months, Adult afterwards").
    pub fn update_component_for_age(&mut self, age_in_days: i64, threshold_days: i64) {
        self.kind = if age_in_days < threshold_days {
            ComponentKind::Infant
        } else {
            ComponentKind::Adult
        };
    }

    fn acquire_rate(&self, age_years: f64, params: &ImmuneSystemParameters) -> f64 {
        let mut best = params.acquire_rate;
        for &(age_boundary, rate) in &params.acquire_rate_by_age {
            if age_years >= age_boundary {
                best = rate;
            }
        }
        best
    }

    /// `theta_t` at `current_time`, from `latest_value` and
    /// `duration = current_time - latest_update_time` (§4.4).
    pub fn get_current_value(
        &self,
        current_time: i64,
        age_years: f64,
        params: &ImmuneSystemParameters,
    ) -> f64 {
        let duration = (current_time - self.latest_update_time) as f64;
        if duration <= 0.0 {
            return self.latest_value;
        }
        match self.kind {
            ComponentKind::Adult => {
                if self.increase {
                    let rate = self.acquire_rate(age_years, params);
                    1.0 - (1.0 - self.latest_value) * (-rate * duration).exp()
                } else {
                    let theta = self.latest_value * (-params.decay_rate * duration).exp();
                    if theta < 1e-5 {
                        0.0
                    } else {
                        theta
                    }
                }
            }
            ComponentKind::Infant => {
                let theta = self.latest_value * (-params.infant_immune_decay_rate * duration).exp();
                if theta < 1e-5 {
                    0.0
                } else {
                    theta
                }
            }
        }
    }

    pub fn update(&mut self, current_time: i64, age_years: f64, params: &ImmuneSystemParameters) {
        self.latest_value = self.get_current_value(current_time, age_years, params);
        self.latest_update_time = current_time;
    }

    pub fn draw_random_immune(&self, params: &ImmuneSystemParameters, rng: &mut Random) -> f64 {
        rng.beta(params.alpha_immune, params.beta_immune).unwrap_or(0.0)
    }

    /// `f(theta)` is a calibrated sigmoid in theta (a standard logistic
    /// rescaled so it saturates to `1` at `theta=0` and decays towards the
    /// configured floor as immunity approaches 1).
    fn immunity_density_factor(theta: f64, params: &ImmuneSystemParameters) -> f64 {
        let k = params.immune_effect_on_progression_to_clinical.max(1e-6);
        1.0 / (1.0 + (theta / k).exp() - 1.0).max(1e-6)
    }

    /// `log10(10^size_0 * fitness^duration * f(theta))`.
    pub fn get_parasite_size_after_t_days(
        &self,
        duration: f64,
        size_0: f64,
        fitness: f64,
        theta: f64,
        params: &ImmuneSystemParameters,
    ) -> f64 {
        let f_theta = Self::immunity_density_factor(theta, params);
        size_0 + duration * fitness.max(1e-9).log10() + f_theta.max(1e-12).log10()
    }

    /// Sigmoidal clinical-progression probability in `theta`, clamped to
    /// `[min_clinical_probability, max_clinical_probability]`.
    pub fn get_clinical_progression_probability(
        &self,
        theta: f64,
        params: &ImmuneSystemParameters,
    ) -> f64 {
        let raw = params.max_clinical_probability * (1.0 - theta);
        raw.clamp(params.min_clinical_probability, params.max_clinical_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> ImmuneSystemParameters {
        ImmuneSystemParameters {
            alpha_immune: 2.0,
            beta_immune: 5.0,
            acquire_rate: 0.02,
            acquire_rate_by_age: vec![(5.0, 0.03), (15.0, 0.015)],
            decay_rate: 0.001,
            duration_for_fully_immune: 1000.0,
            min_clinical_probability: 0.05,
            max_clinical_probability: 0.9,
            immune_effect_on_progression_to_clinical: 0.5,
            infant_immune_decay_rate: 0.01,
            infant_age_threshold_days: 182,
        }
    }

    #[test]
    fn decaying_value_never_goes_negative_or_below_floor() {
        let params = sample_params();
        let mut sys = ImmuneSystem::new_at_birth(0);
        sys.latest_value = 0.5;
        sys.increase = false;
        sys.update_component_for_age(1000, params.infant_age_threshold_days);
        let v = sys.get_current_value(100_000, 10.0, &params);
        assert!(v >= 0.0);
    }

    #[test]
    fn clinical_probability_is_clamped() {
        let params = sample_params();
        let sys = ImmuneSystem::new_at_birth(0);
        let p_low_theta = sys.get_clinical_progression_probability(0.0, &params);
        let p_high_theta = sys.get_clinical_progression_probability(1.0, &params);
        assert!(p_low_theta <= params.max_clinical_probability);
        assert!(p_high_theta >= params.min_clinical_probability);
    }
}
