//! Bernoulli-rejection discrete Gaussian sampler (§4.10).
//!
//! Draws a candidate magnitude `x` uniformly from `[0, 2^ell)`, then
//! accepts it with probability `exp(-x^2/(2*sigma^2))` by decomposing
//! `x^2` into its set bits and running one independent Bernoulli trial
//! per set bit against the precomputed `exp(-2^i/(2*sigma^2))` table —
//! since `x^2 = sum_{i in bits(x^2)} 2^i`, the product of those per-bit
//! acceptance probabilities is exactly `exp(-x^2/(2*sigma^2))`. Each
//! trial is the constant-time bit-expansion comparison from
//! `original_source/src/utils/sampling/gaussian_bernoulli.c`: every trial walks
//! its full random/probability bit expansion even after the outcome is
//! decided, rather than short-circuiting on the first differing bit, so
//! a successful trial and a failed one take the same number of PRNG
//! draws. On overall rejection the whole draw restarts.

use super::{Sample, SamplerConfig};
use crate::bitops::get_binary_expansion_fraction_64;
use crate::prng::Prng;

const EXPANSION_WIDTH: u32 = 64;
const MAX_EXP_BITS: usize = 64;

pub struct BernoulliSampler {
    /// `p[i] = exp(-2^i / (2*sigma^2))`, as a 64-bit binary expansion.
    p_table: [u64; MAX_EXP_BITS],
    ell: u32,
}

impl BernoulliSampler {
    pub fn build(cfg: SamplerConfig) -> BernoulliSampler {
        let sigma = cfg.effective_sigma();
        let ell = (cfg.tail * sigma).log2().ceil().max(1.0) as u32 + 1;
        let mut p_table = [0u64; MAX_EXP_BITS];
        for (i, slot) in p_table.iter_mut().enumerate() {
            let exponent = (2f64).powi(i as i32) / (2.0 * sigma * sigma);
            let p = (-exponent).exp().clamp(0.0, 1.0 - f64::EPSILON);
            *slot = get_binary_expansion_fraction_64(p);
        }
        BernoulliSampler { p_table, ell }
    }

    /// One constant-time Bernoulli(p) trial, `p` given as a 64-bit
    /// binary expansion.
    fn trial(&self, p_word: u64, prng: &mut dyn Prng) -> bool {
        let mut decided: Option<bool> = None;
        for i in 0..EXPANSION_WIDTH {
            let p_bit = (p_word >> (EXPANSION_WIDTH - 1 - i)) & 1;
            let r_bit = (prng.next_u32() & 1) as u64;
            if decided.is_none() {
                if r_bit < p_bit {
                    decided = Some(true);
                } else if r_bit > p_bit {
                    decided = Some(false);
                }
            }
        }
        decided.unwrap_or(true)
    }

    fn try_once(&self, prng: &mut dyn Prng) -> Option<i64> {
        let mut x: u64 = 0;
        for _ in 0..self.ell {
            x = (x << 1) | (prng.next_u32() & 1) as u64;
        }
        let mag_sq = (x as u128) * (x as u128);
        for i in 0..MAX_EXP_BITS {
            if (mag_sq >> i) & 1 == 1 && !self.trial(self.p_table[i], prng) {
                return None;
            }
        }
        Some(x as i64)
    }
}

impl Sample for BernoulliSampler {
    fn sample(&self, prng: &mut dyn Prng) -> i64 {
        loop {
            if let Some(magnitude) = self.try_once(prng) {
                let negate = prng.next_u32() & 1 == 1;
                return if negate && magnitude != 0 { -magnitude } else { magnitude };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;
    use crate::sampling::Blinding;

    #[test]
    fn samples_stay_within_tail_bound() {
        let cfg = SamplerConfig { sigma: 2.0, tail: 9.0, blinding: Blinding::None };
        let s = BernoulliSampler::build(cfg);
        let mut prng = seeded_handle([11u8; 32]);
        for _ in 0..300 {
            let v = s.sample(&mut *prng);
            assert!(v.unsigned_abs() < (1u64 << s.ell));
        }
    }

    #[test]
    fn trial_with_zero_probability_almost_never_succeeds() {
        let cfg = SamplerConfig { sigma: 1.0, tail: 9.0, blinding: Blinding::None };
        let s = BernoulliSampler::build(cfg);
        let mut prng = seeded_handle([13u8; 32]);
        let mut successes = 0;
        for _ in 0..200 {
            if s.trial(0, &mut *prng) {
                successes += 1;
            }
        }
        assert!(successes < 5, "successes={successes}");
    }
}
