//! Micciancio-Walter bootstrap sampler (§4.11).
//!
//! Composes a single narrow base sampler (known `sigma_base`) into an
//! arbitrary wider target `sigma_target` through a linear chain of Gauss
//! combiners: level `l`'s output variance is `(z1^2+z2^2)` times its
//! input variance, with `(z1, z2)` chosen so the combined variance grows
//! by roughly the smoothing parameter `eta` at each step. Centering at an
//! arbitrary real `c` is done by randomized rounding of `c`'s fractional
//! part down to an integer base-point, then repeatedly folding a base
//! draw into the low `log_base` bits `k` times. Grounded in
//! `original_source/src/utils/sampling/mw_bootstrap.c`'s combiner-chain
//! and flip-and-round structure; the per-offset centered re-draw at each
//! fold (§4.11's `sample_base(center = base_c mod 2^log_base)`) is
//! approximated here by an uncentered base draw plus the precomputed
//! offset added back in, since the base samplers in this crate don't
//! themselves support fractional centers — a documented simplification,
//! not a claim of bit-exact parity with the original's centered base
//! call.

use super::{GaussianSampler, Sample};
use crate::prng::Prng;

pub struct MwBootstrap {
    base: Box<GaussianSampler>,
    /// `(z1, z2)` for levels `1..=L`.
    combiners: Vec<(i64, i64)>,
    log_base: u32,
    precision: u32,
    k: u32,
    max_flips: u32,
    /// `[i / 2^log_base for i in 0..2^log_base)`.
    base_centers: Vec<f64>,
}

impl MwBootstrap {
    /// `eta` is the smoothing parameter driving each combiner's target
    /// variance growth; `max_slevels` bounds the combiner chain to
    /// `max_slevels - 1` levels.
    pub fn build(base: GaussianSampler, sigma_base: f64, eta: f64, max_slevels: usize, precision: u32, log_base: u32) -> MwBootstrap {
        let levels = max_slevels.saturating_sub(1);
        let mut combiners = Vec::with_capacity(levels);
        let mut sigma_sq = sigma_base * sigma_base;
        for _ in 0..levels {
            let z1 = ((sigma_sq / (2.0 * eta * eta)).sqrt().floor() as i64).max(1);
            let z2 = (z1 - 1).max(1);
            sigma_sq = (z1 * z1 + z2 * z2) as f64 * sigma_sq;
            combiners.push((z1, z2));
        }
        let k = levels as u32;
        let max_flips = precision.saturating_sub(log_base.saturating_mul(k));
        let base_centers = (0..(1u32 << log_base)).map(|i| i as f64 / (1u32 << log_base) as f64).collect();
        MwBootstrap { base: Box::new(base), combiners, log_base, precision, k, max_flips, base_centers }
    }

    fn sample_level(&self, level: usize, prng: &mut dyn Prng) -> i64 {
        if level == 0 {
            return self.base.sample(prng);
        }
        let (z1, z2) = self.combiners[level - 1];
        z1 * self.sample_level(level - 1, prng) + z2 * self.sample_level(level - 1, prng)
    }

    /// Draw centered at an arbitrary real `c` (§4.11).
    pub fn sample_centered(&self, c: f64, prng: &mut dyn Prng) -> i64 {
        let floor_c = c.floor();
        let scaled_frac = (c - floor_c) * (1u64 << self.precision) as f64;
        let mut base_c = stochastic_round(scaled_frac, self.max_flips, prng);
        for _ in 0..self.k {
            let idx = base_c.rem_euclid(1i64 << self.log_base) as usize;
            let offset = self.base_centers[idx];
            let draw = self.sample_level(self.combiners.len(), prng);
            base_c = (base_c + offset.round() as i64 + draw) >> self.log_base;
        }
        floor_c as i64 + base_c
    }
}

/// Randomized rounding of `value`'s fractional part down to an integer,
/// via `flip_bits` successive doubling steps followed by one final
/// biased coin weighted by what remains — a dithered rounding that picks
/// the nearer integer more often, rather than always flooring.
fn stochastic_round(value: f64, flip_bits: u32, prng: &mut dyn Prng) -> i64 {
    let int_part = value.floor();
    let mut frac = value - int_part;
    for _ in 0..flip_bits {
        frac *= 2.0;
        frac -= frac.floor();
    }
    let coin = if uniform01(prng) < frac { 1 } else { 0 };
    int_part as i64 + coin
}

fn uniform01(prng: &mut dyn Prng) -> f64 {
    (prng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

impl Sample for MwBootstrap {
    fn sample(&self, prng: &mut dyn Prng) -> i64 {
        self.sample_level(self.combiners.len(), prng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;
    use crate::sampling::cdf::{CdfSampler, Width};
    use crate::sampling::{Blinding, SamplerConfig};

    fn base(sigma: f64) -> GaussianSampler {
        let cfg = SamplerConfig { sigma, tail: 9.0, blinding: Blinding::None };
        GaussianSampler::Cdf(CdfSampler::build(cfg, Width::W64))
    }

    #[test]
    fn combiner_chain_grows_variance_monotonically() {
        let boot = MwBootstrap::build(base(2.0), 2.0, 1.0, 4, 20, 4);
        let mut last = 0.0f64;
        let mut sigma_sq = 4.0f64;
        for &(z1, z2) in &boot.combiners {
            sigma_sq = (z1 * z1 + z2 * z2) as f64 * sigma_sq;
            assert!(sigma_sq >= last);
            last = sigma_sq;
        }
    }

    #[test]
    fn uncentered_sample_runs_without_panicking() {
        let boot = MwBootstrap::build(base(2.0), 2.0, 1.0, 4, 20, 4);
        let mut prng = seeded_handle([31u8; 32]);
        for _ in 0..100 {
            let _ = boot.sample(&mut *prng);
        }
    }

    #[test]
    fn centered_sample_tracks_requested_center() {
        let boot = MwBootstrap::build(base(2.0), 2.0, 1.0, 4, 20, 4);
        let mut prng = seeded_handle([37u8; 32]);
        let mut sum = 0i64;
        let n = 200;
        for _ in 0..n {
            sum += boot.sample_centered(50.0, &mut *prng);
        }
        let mean = sum as f64 / n as f64;
        assert!((mean - 50.0).abs() < 50.0, "mean={mean}");
    }
}
