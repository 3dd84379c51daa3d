//! Per-day drug-driven density decay, applied to every clone against the
//! combined kill rate of all drugs currently in its host's blood (§4.6).
//!
//! `perform_drug_action(k, theta)` interpolates the clone's density a
//! fraction `k` of the way toward the floor `theta`: `k=0` leaves the
//! density unchanged, `k>=1` snaps it to `theta`.
pub fn perform_drug_action(current_density: f64, combined_kill_rate: f64, floor: f64) -> f64 {
    let k = combined_kill_rate.clamp(0.0, 1.0);
    current_density * (1.0 - k) + k * floor
}

/// Combines several independent per-drug kill rates into one daily kill
/// fraction: `1 - product(1 - k_i)`.
pub fn combine_kill_rates(rates: impl Iterator<Item = f64>) -> f64 {
    1.0 - rates.fold(1.0, |acc, k| acc * (1.0 - k.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_kill_rate_leaves_density_unchanged() {
        assert!((perform_drug_action(5.0, 0.0, -1000.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn full_kill_rate_sets_density_to_floor() {
        assert!((perform_drug_action(5.0, 1.0, -1000.0) - (-1000.0)).abs() < 1e-9);
    }

    #[test]
    fn combined_kill_rate_is_not_a_simple_sum() {
        let combined = combine_kill_rates([0.5, 0.5].into_iter());
        assert!((combined - 0.75).abs() < 1e-9);
    }
}
