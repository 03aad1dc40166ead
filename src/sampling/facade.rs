//! Sampling façade (§4.12).
//!
//! A single `create_sampler` entry point selects and builds one of the
//! five base samplers (optionally wrapped in an [`MwBootstrap`]) from a
//! `(algorithm, precision, blinding, tail, sigma)` configuration, mirroring
//! `original_source/src/utils/sampling/sampling.c`'s dispatch-by-enum
//! constructor. `vector_16`/`vector_32` fill destination slices, applying
//! the blinded draw-permute-subtract-permute construction from §4.12 when
//! `blinding` requests it.

use super::bernoulli::BernoulliSampler;
use super::cdf::{CdfSampler, Width};
use super::huffman_sampler::HuffmanSampler;
use super::knuth_yao::KnuthYaoSampler;
use super::mw_bootstrap::MwBootstrap;
use super::ziggurat::ZigguratSampler;
use super::{vector_sample, Blinding, GaussianSampler, Sample, SamplerConfig};
use crate::prng::Prng;

/// Which of the five base samplers to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Cdf(Width),
    KnuthYao,
    Ziggurat,
    Bernoulli,
    /// `table_bits` sizes the Huffman magnitude alphabet.
    HuffmanTree { table_bits: u32 },
}

/// Whether (and how) to wrap the base sampler in an MW bootstrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BootstrapMode {
    Direct,
    Bootstrap { eta: f64, max_slevels: usize, precision: u32, log_base: u32 },
}

pub fn create_sampler(algorithm: Algorithm, cfg: SamplerConfig, bootstrap_mode: BootstrapMode) -> GaussianSampler {
    let base = match algorithm {
        Algorithm::Cdf(width) => GaussianSampler::Cdf(CdfSampler::build(cfg, width)),
        Algorithm::KnuthYao => GaussianSampler::KnuthYao(KnuthYaoSampler::build(cfg)),
        Algorithm::Ziggurat => GaussianSampler::Ziggurat(ZigguratSampler::build(cfg)),
        Algorithm::Bernoulli => GaussianSampler::Bernoulli(BernoulliSampler::build(cfg)),
        Algorithm::HuffmanTree { table_bits } => GaussianSampler::HuffmanTree(HuffmanSampler::build(cfg, table_bits)),
    };
    match bootstrap_mode {
        BootstrapMode::Direct => base,
        BootstrapMode::Bootstrap { eta, max_slevels, precision, log_base } => {
            let sigma_base = cfg.effective_sigma();
            GaussianSampler::Bootstrap(Box::new(MwBootstrap::build(base, sigma_base, eta, max_slevels, precision, log_base)))
        }
    }
}

pub fn sample(sampler: &GaussianSampler, prng: &mut dyn Prng) -> i64 {
    sampler.sample(prng)
}

pub fn vector_16(sampler: &GaussianSampler, blinding: Blinding, dst: &mut [i16], prng: &mut dyn Prng) {
    let mut wide: Vec<i64> = vec![0; dst.len()];
    vector_sample(sampler, blinding, &mut wide, prng);
    for (d, w) in dst.iter_mut().zip(wide) {
        *d = w as i16;
    }
}

pub fn vector_32(sampler: &GaussianSampler, blinding: Blinding, dst: &mut [i32], prng: &mut dyn Prng) {
    let mut wide: Vec<i64> = vec![0; dst.len()];
    vector_sample(sampler, blinding, &mut wide, prng);
    for (d, w) in dst.iter_mut().zip(wide) {
        *d = w as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::seeded_handle;

    #[test]
    fn direct_cdf_sampler_fills_vector() {
        let cfg = SamplerConfig { sigma: 3.0, tail: 9.0, blinding: Blinding::None };
        let sampler = create_sampler(Algorithm::Cdf(Width::W64), cfg, BootstrapMode::Direct);
        let mut prng = seeded_handle([41u8; 32]);
        let mut dst = [0i32; 10];
        vector_32(&sampler, Blinding::None, &mut dst, &mut *prng);
        assert_eq!(dst.len(), 10);
    }

    #[test]
    fn blinded_vector_matches_unblinded_length() {
        let cfg = SamplerConfig { sigma: 3.0, tail: 9.0, blinding: Blinding::BlindedSamples };
        let sampler = create_sampler(Algorithm::Cdf(Width::W64), cfg, BootstrapMode::Direct);
        let mut prng = seeded_handle([43u8; 32]);
        let mut dst = [0i16; 8];
        vector_16(&sampler, Blinding::BlindedSamples, &mut dst, &mut *prng);
        assert_eq!(dst.len(), 8);
    }

    #[test]
    fn bootstrap_mode_wraps_base_sampler() {
        let cfg = SamplerConfig { sigma: 2.0, tail: 9.0, blinding: Blinding::None };
        let sampler = create_sampler(
            Algorithm::Cdf(Width::W64),
            cfg,
            BootstrapMode::Bootstrap { eta: 1.0, max_slevels: 3, precision: 16, log_base: 4 },
        );
        assert!(matches!(sampler, GaussianSampler::Bootstrap(_)));
        let mut prng = seeded_handle([47u8; 32]);
        let _ = sample(&sampler, &mut *prng);
    }
}
