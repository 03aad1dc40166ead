//! Ziggurat discrete Gaussian sampler (§4.10).
//!
//! Classic Marsaglia-Tsang ziggurat over the continuous half-Gaussian
//! (a tower of equal-area rectangles plus a tail region sampled by
//! exponential rejection), rounded to the nearest integer for a discrete
//! draw. Provided for completeness alongside the CDF and Knuth-Yao
//! samplers, which are the ones actually exercised by the MW bootstrap's
//! base level. No ziggurat source file exists anywhere in
//! `original_source/` — the retrieval pack's sampling directory
//! (`original_source/src/utils/sampling/`) only has `gaussian_cdf.c`,
//! `gaussian_knuth_yao.c`, `gaussian_bernoulli.c`, `mw_bootstrap.c`,
//! `gaussian_huffman.c`, and `sampling.c`. This module is grounded in
//! spec.md §4.10's standalone description of the classic Marsaglia-Tsang
//! construction rather than in any original implementation file,
//! simplified to the continuous construction since an exact discrete
//! ziggurat's rounding correction isn't independently checkable without
//! running it.

use super::{Sample, SamplerConfig};
use crate::prng::Prng;

const LAYERS: usize = 128;

pub struct ZigguratSampler {
    /// Layer boundary x-coordinates, `x[0]` is the tail cutoff.
    x: Vec<f64>,
    /// `f(x[i])`, the Gaussian density at each boundary.
    y: Vec<f64>,
    sigma: f64,
}

fn gaussian(x: f64, sigma: f64) -> f64 {
    (-x * x / (2.0 * sigma * sigma)).exp()
}

impl ZigguratSampler {
    pub fn build(cfg: SamplerConfig) -> ZigguratSampler {
        let sigma = cfg.effective_sigma();
        // Equal-area construction: solve for the tail cutoff x[0] and
        // common rectangle area `v` by fixed-point iteration, then
        // derive the remaining layer boundaries from it.
        let mut x_tail = sigma * 3.4;
        let mut v;
        for _ in 0..100 {
            v = x_tail * gaussian(x_tail, sigma) + sigma * (std::f64::consts::PI / 2.0).sqrt() * erfc_tail(x_tail, sigma);
            let target_y = v / x_tail;
            let new_x_tail = solve_for_x(target_y, sigma);
            if (new_x_tail - x_tail).abs() < 1e-12 {
                x_tail = new_x_tail;
                break;
            }
            x_tail = new_x_tail;
        }
        let v = x_tail * gaussian(x_tail, sigma) + sigma * (std::f64::consts::PI / 2.0).sqrt() * erfc_tail(x_tail, sigma);

        let mut x = vec![0.0; LAYERS + 1];
        let mut y = vec![0.0; LAYERS + 1];
        x[0] = x_tail;
        y[0] = gaussian(x_tail, sigma);
        for i in 1..LAYERS {
            y[i] = y[i - 1] + v / x[i - 1];
            if y[i] >= 1.0 {
                x[i] = 0.0;
                y[i] = 1.0;
            } else {
                x[i] = solve_for_x(y[i], sigma);
            }
        }
        x[LAYERS] = 0.0;
        y[LAYERS] = 1.0;

        ZigguratSampler { x, y, sigma }
    }

    fn sample_magnitude(&self, prng: &mut dyn Prng) -> f64 {
        loop {
            let layer = (prng.next_u32() as usize) % LAYERS;
            let u = (prng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
            let candidate = u * self.x[layer];
            if candidate < self.x[layer + 1] {
                return candidate;
            }
            if layer == 0 {
                // Tail: exponential rejection beyond the cutoff.
                loop {
                    let u1 = uniform01(prng);
                    let u2 = uniform01(prng);
                    let tail_x = -(u1.ln()) * self.sigma * self.sigma / self.x[0];
                    let candidate = self.x[0] + tail_x;
                    if u2.ln() * -2.0 >= (candidate * candidate - self.x[0] * self.x[0]) / (self.sigma * self.sigma) {
                        return candidate;
                    }
                }
            }
            let u3 = uniform01(prng);
            let fx = gaussian(candidate, self.sigma);
            let edge = self.y[layer] + u3 * (self.y[layer + 1] - self.y[layer]);
            if edge <= fx {
                return candidate;
            }
        }
    }
}

fn uniform01(prng: &mut dyn Prng) -> f64 {
    (prng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Crude `erfc`-like tail mass approximation (Abramowitz & Stegun 7.1.26,
/// adapted for `exp(-x^2/2sigma^2)`), good enough to seed the fixed-point
/// search for the equal-area cutoff.
fn erfc_tail(x: f64, sigma: f64) -> f64 {
    let t = x / (sigma * std::f64::consts::SQRT_2);
    let p = 0.3275911;
    let a = [0.254829592, -0.284496736, 1.421413741, -1.453152027, 1.061405429];
    let tt = 1.0 / (1.0 + p * t);
    let poly = a[0] * tt + a[1] * tt.powi(2) + a[2] * tt.powi(3) + a[3] * tt.powi(4) + a[4] * tt.powi(5);
    poly * (-t * t).exp()
}

fn solve_for_x(y: f64, sigma: f64) -> f64 {
    if y <= 0.0 {
        return sigma * 10.0;
    }
    (-2.0 * sigma * sigma * y.ln()).max(0.0).sqrt()
}

impl Sample for ZigguratSampler {
    fn sample(&self, prng: &mut dyn Prng) -> i64 {
        let magnitude = self.sample_magnitude(prng).round() as i64;
        let negate = prng.next_u32() & 1 == 1;
        if negate { -magnitude } else { magnitude }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;
    use crate::sampling::Blinding;

    #[test]
    fn samples_cluster_near_zero_for_small_sigma() {
        let cfg = SamplerConfig { sigma: 2.0, tail: 9.0, blinding: Blinding::None };
        let s = ZigguratSampler::build(cfg);
        let mut prng = seeded_handle([5u8; 32]);
        let mut sum_abs = 0i64;
        let n = 2000;
        for _ in 0..n {
            sum_abs += s.sample(&mut *prng).abs();
        }
        let mean_abs = sum_abs as f64 / n as f64;
        assert!(mean_abs < 20.0, "mean_abs={mean_abs}");
    }
}
