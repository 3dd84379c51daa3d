//! Reproducible pseudo-random source (§4.1). A single [`Random`] instance is
//! the authoritative stream for a simulation run (§5: "Random's
//! determinism") — every other component borrows it rather than creating its
//! own generator.
use crate::error::DomainError;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta as BetaDist, Binomial as BinomialDist, Distribution, Gamma, Normal, Poisson};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wraps a seedable PRNG and exposes the distributions the core needs.
/// `initial_seed_number == 0` means "seed from wall-clock", matching
/// `model_settings.initial_seed_number` in §6.
pub struct Random {
    rng: SmallRng,
    seed: u64,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        let effective_seed = if seed == 0 {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0xDEAD_BEEF)
        } else {
            seed
        };
        Self {
            rng: SmallRng::seed_from_u64(effective_seed),
            seed: effective_seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn uniform_01(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// `U[0, upper)`.
    pub fn uniform_upper(&mut self, upper: f64) -> Result<f64, DomainError> {
        self.uniform(0.0, upper)
    }

    /// `U[from, to)`. Panics when `from >= to`.
    pub fn uniform(&mut self, from: f64, to: f64) -> Result<f64, DomainError> {
        if from >= to {
            return Err(DomainError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(self.rng.gen_range(from..to))
    }

    /// Alias for `uniform` under the name used elsewhere in this codebase.
    pub fn flat(&mut self, a: f64, b: f64) -> Result<f64, DomainError> {
        self.uniform(a, b)
    }

    pub fn uniform_usize(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    pub fn normal(&mut self, mean: f64, sigma: f64) -> Result<f64, DomainError> {
        if sigma < 0.0 {
            return Err(DomainError::NegativeVariance(sigma.to_string()));
        }
        if sigma == 0.0 {
            return Ok(mean);
        }
        let dist = Normal::new(mean, sigma).expect("validated sigma > 0");
        Ok(dist.sample(&mut self.rng))
    }

    /// Rejects draws outside `mean +/- k_sigma * sigma`; fails after
    /// `max_attempts` rejections.
    pub fn normal_truncated(
        &mut self,
        mean: f64,
        sigma: f64,
        k_sigma: f64,
        max_attempts: u32,
    ) -> Result<f64, DomainError> {
        if sigma < 0.0 {
            return Err(DomainError::NegativeVariance(sigma.to_string()));
        }
        let lower = mean - k_sigma * sigma;
        let upper = mean + k_sigma * sigma;
        for _ in 0..max_attempts {
            let value = self.normal(mean, sigma)?;
            if value >= lower && value <= upper {
                return Ok(value);
            }
        }
        Err(DomainError::TruncatedNormalExhausted { max_attempts })
    }

    pub fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64, DomainError> {
        if shape <= 0.0 || scale <= 0.0 {
            return Err(DomainError::NegativeVariance(format!(
                "shape={shape}, scale={scale}"
            )));
        }
        let dist = Gamma::new(shape, scale).expect("validated shape/scale > 0");
        Ok(dist.sample(&mut self.rng))
    }

    /// `Beta(alpha, beta)`; returns `alpha` when `beta == 0` per §4.1.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> Result<f64, DomainError> {
        if beta == 0.0 {
            return Ok(alpha);
        }
        if alpha <= 0.0 || beta < 0.0 {
            return Err(DomainError::NegativeVariance(format!(
                "alpha={alpha}, beta={beta}"
            )));
        }
        let dist = BetaDist::new(alpha, beta).expect("validated alpha,beta > 0");
        Ok(dist.sample(&mut self.rng))
    }

    pub fn binomial(&mut self, p: f64, n: u64) -> Result<u64, DomainError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(DomainError::ProbabilityOutOfRange(p.to_string()));
        }
        let dist = BinomialDist::new(n, p).expect("validated p in [0,1]");
        Ok(dist.sample(&mut self.rng))
    }

    pub fn poisson(&mut self, lambda: f64) -> Result<u64, DomainError> {
        if lambda < 0.0 {
            return Err(DomainError::NegativeVariance(lambda.to_string()));
        }
        if lambda == 0.0 {
            return Ok(0);
        }
        let dist = Poisson::new(lambda).expect("validated lambda >= 0");
        Ok(dist.sample(&mut self.rng) as u64)
    }

    /// Draws `N` counts over `K` categories with probabilities `p`, writing
    /// into `out` (which must already be sized `K`). Categories with `p=0`
    /// get `0`; the counts always sum to `N`.
    pub fn multinomial(&mut self, p: &[f64], n: u64, out: &mut [u64]) -> Result<(), DomainError> {
        if p.is_empty() {
            return Err(DomainError::EmptyCollection("multinomial"));
        }
        if out.len() != p.len() {
            return Err(DomainError::EmptyCollection("multinomial:out"));
        }
        out.iter_mut().for_each(|c| *c = 0);
        let total: f64 = p.iter().sum();
        if total <= 0.0 {
            return Ok(());
        }
        let mut remaining_p = total;
        let mut remaining_n = n;
        for i in 0..p.len() {
            if p[i] <= 0.0 || remaining_n == 0 {
                continue;
            }
            let local_p = (p[i] / remaining_p).clamp(0.0, 1.0);
            let drawn = self.binomial(local_p, remaining_n)?;
            out[i] = drawn;
            remaining_n -= drawn;
            remaining_p -= p[i];
        }
        Ok(())
    }

    /// Fisher-Yates shuffle, preserves multiset equality.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Weighted sampling of `k` items from `items` (parallel to `weights`),
    /// with or without replacement.
    pub fn roulette_sampling<'a, T>(
        &mut self,
        k: usize,
        weights: &[f64],
        items: &'a [T],
        replacement: bool,
    ) -> Result<Vec<&'a T>, DomainError> {
        Ok(self
            .roulette_sampling_tuple(k, weights, items, replacement)?
            .into_iter()
            .map(|(item, _)| item)
            .collect())
    }

    /// As [`Random::roulette_sampling`] but also returns the sampled weight.
    pub fn roulette_sampling_tuple<'a, T>(
        &mut self,
        k: usize,
        weights: &[f64],
        items: &'a [T],
        replacement: bool,
    ) -> Result<Vec<(&'a T, f64)>, DomainError> {
        if items.is_empty() || weights.is_empty() {
            return Err(DomainError::EmptyCollection("roulette_sampling"));
        }
        if items.len() != weights.len() {
            return Err(DomainError::EmptyCollection("roulette_sampling:mismatch"));
        }
        let mut pool: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
        let mut result = Vec::with_capacity(k);
        for _ in 0..k {
            let total: f64 = pool.iter().map(|(_, w)| *w).sum();
            if total <= 0.0 || pool.is_empty() {
                break;
            }
            let draw = self.uniform(0.0, total)?;
            let mut cumulative = 0.0;
            let mut chosen_pos = pool.len() - 1;
            for (pos, (_, w)) in pool.iter().enumerate() {
                cumulative += w;
                if draw < cumulative {
                    chosen_pos = pos;
                    break;
                }
            }
            let (idx, w) = pool[chosen_pos];
            result.push((&items[idx], w));
            if !replacement {
                pool.remove(chosen_pos);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_respects_bounds() {
        let mut r = Random::new(42);
        for _ in 0..1000 {
            let v = r.uniform(1.0, 2.0).unwrap();
            assert!(v >= 1.0 && v < 2.0);
        }
    }

    #[test]
    fn uniform_rejects_inverted_range() {
        let mut r = Random::new(42);
        assert!(r.uniform(2.0, 1.0).is_err());
    }

    #[test]
    fn normal_truncated_exhausts_attempts_on_impossible_bound() {
        let mut r = Random::new(1);
        let result = r.normal_truncated(0.0, 1.0, 0.0, 5);
        assert!(result.is_err());
    }

    #[test]
    fn shuffle_preserves_multiset() {
        let mut r = Random::new(7);
        let mut v: Vec<i32> = (0..50).collect();
        let original: std::collections::BTreeMap<i32, usize> =
            v.iter().fold(std::collections::BTreeMap::new(), |mut m, x| {
                *m.entry(*x).or_insert(0) += 1;
                m
            });
        r.shuffle(&mut v);
        let after: std::collections::BTreeMap<i32, usize> =
            v.iter().fold(std::collections::BTreeMap::new(), |mut m, x| {
                *m.entry(*x).or_insert(0) += 1;
                m
            });
        assert_eq!(original, after);
    }

    #[test]
    fn multinomial_sums_to_n() {
        let mut r = Random::new(3);
        let p = [0.5, 0.0, 0.3, 0.2];
        let mut out = [0u64; 4];
        r.multinomial(&p, 1000, &mut out).unwrap();
        assert_eq!(out.iter().sum::<u64>(), 1000);
        assert_eq!(out[1], 0);
    }

    #[test]
    fn determinism_same_seed_same_stream() {
        let mut a = Random::new(123);
        let mut b = Random::new(123);
        let sa: Vec<f64> = (0..20).map(|_| a.uniform_01()).collect();
        let sb: Vec<f64> = (0..20).map(|_| b.uniform_01()).collect();
        assert_eq!(sa, sb);
    }
}
