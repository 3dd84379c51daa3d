//! Treatment-coverage model (§4.9 "Treatment-coverage model is distinct from
//! strategy"): `p_treatment(location, age)` given today's calendar day,
//! independent of which therapy ends up selected.
use crate::config::TreatmentCoverageConfig;
use crate::location::Location;

#[derive(Debug, Clone)]
pub enum CoverageModel {
    Steady,
    Inflated {
        start_day: i64,
        monthly_inflation_factor: f64,
    },
    Linear {
        start_day: i64,
        end_day: i64,
        start_value_under_5: f64,
        start_value_over_5: f64,
        end_value_under_5: f64,
        end_value_over_5: f64,
    },
}

impl From<&TreatmentCoverageConfig> for CoverageModel {
    fn from(c: &TreatmentCoverageConfig) -> Self {
        match c {
            TreatmentCoverageConfig::Steady => CoverageModel::Steady,
            TreatmentCoverageConfig::Inflated {
                start_day,
                monthly_inflation_factor,
            } => CoverageModel::Inflated {
                start_day: *start_day,
                monthly_inflation_factor: *monthly_inflation_factor,
            },
            TreatmentCoverageConfig::Linear {
                start_day,
                end_day,
                start_value_under_5,
                start_value_over_5,
                end_value_under_5,
                end_value_over_5,
            } => CoverageModel::Linear {
                start_day: *start_day,
                end_day: *end_day,
                start_value_under_5: *start_value_under_5,
                start_value_over_5: *start_value_over_5,
                end_value_under_5: *end_value_under_5,
                end_value_over_5: *end_value_over_5,
            },
        }
    }
}

impl CoverageModel {
    pub fn p_treatment(&self, location: &Location, age_years: f64, current_day: i64) -> f64 {
        let base = if age_years < 5.0 {
            location.p_treatment_under_5
        } else {
            location.p_treatment_over_5
        };
        match self {
            CoverageModel::Steady => base,
            CoverageModel::Inflated {
                start_day,
                monthly_inflation_factor,
            } => {
                let months_elapsed = ((current_day - start_day).max(0) as f64) / 30.0;
                (base * (1.0 + monthly_inflation_factor).powf(months_elapsed)).min(1.0)
            }
            CoverageModel::Linear {
                start_day,
                end_day,
                start_value_under_5,
                start_value_over_5,
                end_value_under_5,
                end_value_over_5,
            } => {
                let (start_value, end_value) = if age_years < 5.0 {
                    (*start_value_under_5, *end_value_under_5)
                } else {
                    (*start_value_over_5, *end_value_over_5)
                };
                if current_day <= *start_day {
                    start_value
                } else if current_day >= *end_day {
                    end_value
                } else {
                    let t = (current_day - start_day) as f64 / (end_day - start_day) as f64;
                    start_value + t * (end_value - start_value)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new(0, 1000, 0.1, 0.6, 0.4, 100, 0.1)
    }

    #[test]
    fn steady_is_constant() {
        let model = CoverageModel::Steady;
        assert_eq!(model.p_treatment(&loc(), 3.0, 10), 0.6);
        assert_eq!(model.p_treatment(&loc(), 30.0, 10), 0.4);
    }

    #[test]
    fn linear_interpolates_between_endpoints() {
        let model = CoverageModel::Linear {
            start_day: 0,
            end_day: 100,
            start_value_under_5: 0.0,
            start_value_over_5: 0.0,
            end_value_under_5: 1.0,
            end_value_over_5: 1.0,
        };
        assert_eq!(model.p_treatment(&loc(), 3.0, 50), 0.5);
        assert_eq!(model.p_treatment(&loc(), 3.0, -10), 0.0);
        assert_eq!(model.p_treatment(&loc(), 3.0, 1000), 1.0);
    }
}
