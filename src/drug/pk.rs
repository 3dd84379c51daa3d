//! Concentration-kill curve and mutation-probability pharmacology (§4.3).
use super::{Drug, DrugType};
use crate::random::Random;

/// `days <= dosing_days`: `starting_value + wobble`. Drug 0 (artemisinin)
/// draws `wobble ~ U(-0.2, 0.2)` every query; other drugs bump
/// `starting_value` by `U(0, 0.1)` once `days >= 1`. After dosing ends the
/// concentration decays exponentially with `half_life`, floored to 0 below
/// 0.1 (§9 flags the per-query wobble as a calibration-sensitive choice;
/// this implementation follows that reading).
pub fn concentration(drug: &Drug, current_time: i64, drug_type: &DrugType, rng: &mut Random) -> f64 {
    let days = current_time - drug.start_time;
    if days < 0 {
        return 0.0;
    }
    if days <= drug.dosing_days as i64 {
        if drug_type.id == 0 {
            let wobble = rng.uniform(-0.2, 0.2).unwrap_or(0.0);
            (drug.starting_value + wobble).clamp(0.0, 1.0)
        } else if days >= 1 {
            let bump = rng.uniform(0.0, 0.1).unwrap_or(0.0);
            (drug.starting_value + bump).clamp(0.0, 1.0)
        } else {
            drug.starting_value
        }
    } else {
        let decay_days = (days - drug.dosing_days as i64) as f64;
        let c = drug.starting_value * (-decay_days * std::f64::consts::LN_2 / drug_type.drug_half_life).exp();
        if c < 0.1 {
            0.0
        } else {
            c
        }
    }
}

/// `k = k_max * c^n / (c^n + e)`, clamped to `[0,1]`.
pub fn killing_rate(concentration: f64, drug_type: &DrugType, ec50_power_n: f64) -> f64 {
    if concentration <= 0.0 {
        return 0.0;
    }
    let c_n = concentration.powf(drug_type.n);
    (drug_type.k_max * c_n / (c_n + ec50_power_n)).clamp(0.0, 1.0)
}

/// Piecewise-in-concentration mutation probability per locus per day (§4.3).
pub fn mutation_probability_per_locus(concentration: f64, k: f64, p0: f64) -> f64 {
    if concentration <= 0.0 {
        0.0
    } else if concentration < 0.5 {
        2.0 * p0 * k * concentration
    } else if concentration < 1.0 {
        p0 * (2.0 * (1.0 - k) * concentration + 2.0 * k - 1.0)
    } else {
        p0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::sample_drug_db;

    #[test]
    fn killing_rate_clamped_to_unit_interval() {
        let drugs = sample_drug_db();
        let dt = drugs.at(0);
        let k = killing_rate(10.0, dt, 0.01);
        assert!((0.0..=1.0).contains(&k));
    }

    #[test]
    fn zero_concentration_has_zero_kill_and_zero_mutation() {
        let drugs = sample_drug_db();
        let dt = drugs.at(0);
        assert_eq!(killing_rate(0.0, dt, 1.0), 0.0);
        assert_eq!(mutation_probability_per_locus(0.0, dt.k, 1e-3), 0.0);
    }

    #[test]
    fn concentration_decays_and_floors_to_zero() {
        let drugs = sample_drug_db();
        let dt = drugs.at(0);
        let drug = Drug::new(0, 3, 0, 1.0);
        let mut rng = Random::new(1);
        // far past dosing + several half lives, decayed concentration should floor at 0
        let c = concentration(&drug, 50, dt, &mut rng);
        assert_eq!(c, 0.0);
    }
}
