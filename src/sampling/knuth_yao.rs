//! Knuth-Yao discrete-distribution-generating (DDG) tree sampler (§4.10).
//!
//! Each column `k` of the probability matrix holds the binary expansion
//! (MSB-first, one bit per row) of the discrete Gaussian mass at `k`; the
//! sampler walks the implied DDG tree row by row, picking the column
//! whose remaining probability mass is first exhausted by a running
//! random distance. Grounded in
//! `original_source/src/utils/sampling/gaussian_knuth_yao.c`.

use super::{Sample, SamplerConfig};
use crate::bitops::get_binary_expansion_fraction_64;
use crate::prng::Prng;

const NUM_ROWS: usize = 64;

pub struct KnuthYaoSampler {
    /// `pmat[row][col]`, `row` 0 is the expansion's MSB.
    pmat: Vec<[bool; NUM_ROWS]>,
    num_cols: usize,
}

impl KnuthYaoSampler {
    pub fn build(cfg: SamplerConfig) -> KnuthYaoSampler {
        let sigma = cfg.effective_sigma();
        let num_cols = (cfg.tail * sigma).ceil() as usize + 1;
        tracing::debug!(sigma, num_cols, "building knuth-yao ddg table");
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * sigma);
        let mut pmat = vec![[false; NUM_ROWS]; num_cols];
        for (k, col) in pmat.iter_mut().enumerate() {
            let mass = norm * (-((k * k) as f64) / (2.0 * sigma * sigma)).exp();
            let bits = get_binary_expansion_fraction_64(mass.clamp(0.0, 1.0 - f64::EPSILON));
            for row in 0..NUM_ROWS {
                col[row] = (bits >> (NUM_ROWS - 1 - row)) & 1 == 1;
            }
        }
        KnuthYaoSampler { pmat, num_cols }
    }

    fn walk_tree(&self, prng: &mut dyn Prng) -> usize {
        let mut d: i64 = 0;
        loop {
            for row in 0..NUM_ROWS {
                let bit = (prng.next_u32() & 1) as i64;
                d = 2 * d + bit;
                for col in 0..self.num_cols {
                    if self.pmat[col][row] {
                        d -= 1;
                    }
                    if d < 0 {
                        return col;
                    }
                }
            }
        }
    }
}

impl Sample for KnuthYaoSampler {
    fn sample(&self, prng: &mut dyn Prng) -> i64 {
        loop {
            let raw = self.walk_tree(prng) % self.num_cols;
            if raw == 0 && prng.next_u32() & 1 == 0 {
                continue;
            }
            let negate = prng.next_u32() & 1 == 1;
            let magnitude = raw as i64;
            return if negate { -magnitude } else { magnitude };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;
    use crate::sampling::Blinding;

    #[test]
    fn samples_stay_within_the_table_domain() {
        let cfg = SamplerConfig { sigma: 3.0, tail: 8.0, blinding: Blinding::None };
        let s = KnuthYaoSampler::build(cfg);
        let mut prng = seeded_handle([3u8; 32]);
        for _ in 0..500 {
            let v = s.sample(&mut *prng);
            assert!(v.unsigned_abs() < s.num_cols as u64);
        }
    }
}
