//! CDF-inversion discrete Gaussian sampler (§4.10).
//!
//! The table is built with [`crate::mpf::Mpf`] arbitrary-precision
//! arithmetic rather than `f64`, per the module's own data-flow note that
//! C2/C3 (`Mpz`/`Mpf`) underpin C10's table construction the same way they
//! underpin the FFT table build in C5. Each entry is the running discrete
//! Gaussian mass from `0` up to (not including) `i`, scaled to the table's
//! fixed-point width and saturating to all-ones once the tail underflows.
//!
//! Grounded in `original_source/src/utils/sampling/gaussian_cdf.c`.

use super::{Sample, SamplerConfig};
use crate::mpf::Mpf;
use crate::prng::Prng;

const TABLE_PRECISION: u32 = 128;

/// Fixed-point table width, matching the three widths the original
/// builds (`uint32_t[]`, `uint64_t[]`, and a 128-bit pair per entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
    W128,
}

impl Width {
    fn bits(self) -> u32 {
        match self {
            Width::W32 => 32,
            Width::W64 => 64,
            Width::W128 => 128,
        }
    }
}

pub struct CdfSampler {
    table: Vec<u128>,
    width: Width,
}

impl CdfSampler {
    pub fn build(cfg: SamplerConfig, width: Width) -> CdfSampler {
        let sigma = cfg.effective_sigma();
        let tail = cfg.tail;
        let size = ((tail * sigma).log2().ceil().max(0.0) as u32);
        let size = 1usize << size;
        tracing::debug!(sigma, size, width = ?width, "building cdf sampler table");
        let w = width.bits();
        let scale = if w >= 128 { Mpf::from_f64(TABLE_PRECISION, 1.0) } else { Mpf::pow_ui(&Mpf::from_u64(TABLE_PRECISION, 2), w as u64) };

        let sigma_mpf = Mpf::from_f64(TABLE_PRECISION, sigma);
        let two_sigma_sq = Mpf::mul(&Mpf::from_f64(TABLE_PRECISION, 2.0), &Mpf::mul(&sigma_mpf, &sigma_mpf));
        let norm = Mpf::div(&Mpf::from_f64(TABLE_PRECISION, 2.0 / (2.0 * std::f64::consts::PI).sqrt()), &sigma_mpf);

        let mut table = vec![0u128; size];
        let mut acc = Mpf::from_u64(TABLE_PRECISION, 0);
        let mut saturated = false;
        for i in 0..size {
            table[i] = if saturated {
                u128::MAX >> (128 - w)
            } else {
                let scaled = if w >= 128 { acc.clone() } else { Mpf::mul(&acc, &scale) };
                let as_u = scaled.get_d();
                if as_u.is_finite() && as_u >= 0.0 {
                    (as_u as u128).min(u128::MAX >> (128 - w))
                } else {
                    u128::MAX >> (128 - w)
                }
            };
            // Add the mass of position i (weighted by 1/2 when i == 0,
            // representing half the unit interval) to roll into entry i+1.
            let k = Mpf::from_u64(TABLE_PRECISION, i as u64);
            let k_sq = Mpf::mul(&k, &k);
            let exponent = Mpf::div(&k_sq, &two_sigma_sq);
            let mass = Mpf::mul(&norm, &Mpf::exp(&exponent.negate()));
            let weighted = if i == 0 { Mpf::div_2exp(&mass, 1) } else { mass };
            if weighted.get_d() == 0.0 {
                saturated = true;
            }
            acc = Mpf::add(&acc, &weighted);
        }
        if size > 0 {
            table[size - 1] = u128::MAX >> (128 - w);
        }
        CdfSampler { table, width }
    }

    fn draw_word(&self, prng: &mut dyn Prng) -> u128 {
        match self.width {
            Width::W32 => prng.next_u32() as u128,
            Width::W64 => prng.next_u64() as u128,
            Width::W128 => ((prng.next_u64() as u128) << 64) | prng.next_u64() as u128,
        }
    }
}

impl Sample for CdfSampler {
    fn sample(&self, prng: &mut dyn Prng) -> i64 {
        let word = self.draw_word(prng);
        // Binary search for the largest i with word >= table[i].
        let mut lo = 0usize;
        let mut hi = self.table.len();
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if word >= self.table[mid] {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let magnitude = lo as i64;
        let negate = word & 1 == 1;
        if negate { -magnitude } else { magnitude }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;
    use crate::sampling::Blinding;

    #[test]
    fn table_is_monotone_and_saturates_at_top() {
        let cfg = SamplerConfig { sigma: 2.0, tail: 9.0, blinding: Blinding::None };
        let s = CdfSampler::build(cfg, Width::W64);
        for w in s.table.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert_eq!(*s.table.last().unwrap(), u128::MAX >> (128 - 64));
    }

    #[test]
    fn samples_are_bounded_by_table_domain() {
        let cfg = SamplerConfig { sigma: 2.0, tail: 9.0, blinding: Blinding::None };
        let s = CdfSampler::build(cfg, Width::W64);
        let mut prng = seeded_handle([1u8; 32]);
        for _ in 0..500 {
            let v = s.sample(&mut *prng);
            assert!(v.unsigned_abs() < s.table.len() as u64);
        }
    }
}
