//! Algorithm registry and shared scheme scratch state (§4.14).
//!
//! `SchemeKind` enumerates the lattice schemes this crate's primitives
//! could back, matching the scheme directories in
//! `original_source/src/schemes/` (`bliss_b`, `ring_tesla`, the KEM
//! family) plus reserved slots for schemes not present in the retrieval
//! pack. `SchemeInstance` owns the plumbing every one of those
//! keygen/sign/verify/encrypt/decrypt routines would borrow — a scratch
//! arena, five per-purpose entropy configs, a PRNG handle, an optional
//! Gaussian sampler, and a bounded oldest-evicted error log — without
//! implementing any scheme body itself (out of scope; see spec.md §1).
//! Routing is a `match` on `SchemeKind` rather than a function-pointer
//! table, matching the original's dispatch-by-switch in
//! `original_source/src/safecrypto_private.c`.

use crate::entropy::EntropyConfig;
use crate::error::LatticeError;
use crate::prng::PrngHandle;
use crate::sampling::GaussianSampler;

/// Lattice scheme family a [`SchemeInstance`] is configured for. Capped
/// at 14 variants (8 named, 6 reserved) matching the original's
/// `sc_scheme_e` enumeration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Bliss,
    Dilithium,
    RingTesla,
    RlweEnc,
    NtruKem,
    Kyber,
    DlpSig,
    DlpIbe,
    Reserved0,
    Reserved1,
    Reserved2,
    Reserved3,
    Reserved4,
    Reserved5,
}

/// Which of the five purpose-specific entropy configurations a caller
/// wants for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyUse {
    PubKey,
    PrivKey,
    UserKey,
    Signature,
    Encryption,
}

/// Five purpose-specific entropy configurations, one per coding surface
/// a scheme implementation touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyConfigSet {
    pub pubkey: EntropyConfig,
    pub privkey: EntropyConfig,
    pub user_key: EntropyConfig,
    pub signature: EntropyConfig,
    pub encryption: EntropyConfig,
}

impl EntropyConfigSet {
    fn get(&self, which: EntropyUse) -> &EntropyConfig {
        match which {
            EntropyUse::PubKey => &self.pubkey,
            EntropyUse::PrivKey => &self.privkey,
            EntropyUse::UserKey => &self.user_key,
            EntropyUse::Signature => &self.signature,
            EntropyUse::Encryption => &self.encryption,
        }
    }
}

/// Non-normative operation counters — present for observability, never
/// asserted on in tests (spec.md §9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemeStats {
    pub samples_drawn: u64,
    pub bytes_encoded: u64,
    pub errors_logged: u64,
}

/// Shared state a scheme implementation built on this crate would
/// borrow for its keygen/sign/verify/encrypt/decrypt bodies.
pub struct SchemeInstance {
    kind: SchemeKind,
    scratch: Vec<i32>,
    entropy: EntropyConfigSet,
    prng: PrngHandle,
    sampler: Option<GaussianSampler>,
    errors: Vec<LatticeError>,
    max_errors: usize,
    stats: Option<SchemeStats>,
}

impl SchemeInstance {
    pub fn new(
        kind: SchemeKind,
        scratch_len: usize,
        entropy: EntropyConfigSet,
        prng: PrngHandle,
        sampler: Option<GaussianSampler>,
        max_errors: usize,
        track_stats: bool,
    ) -> SchemeInstance {
        SchemeInstance {
            kind,
            scratch: vec![0i32; scratch_len],
            entropy,
            prng,
            sampler,
            errors: Vec::new(),
            max_errors: max_errors.max(1),
            stats: if track_stats { Some(SchemeStats::default()) } else { None },
        }
    }

    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    /// Every primitive that consumes scratch space takes a mutable
    /// borrow of this arena rather than allocating its own.
    pub fn scratch_mut(&mut self) -> &mut [i32] {
        &mut self.scratch
    }

    pub fn prng_mut(&mut self) -> &mut PrngHandle {
        &mut self.prng
    }

    pub fn sampler(&self) -> Option<&GaussianSampler> {
        self.sampler.as_ref()
    }

    pub fn entropy_config(&self, which: EntropyUse) -> &EntropyConfig {
        self.entropy.get(which)
    }

    pub fn stats(&self) -> Option<&SchemeStats> {
        self.stats.as_ref()
    }

    /// Append an error, evicting the oldest entry once `max_errors` is
    /// reached — a loose, append-only log rather than a fixed-capacity
    /// ring with its own invariant to maintain.
    pub fn record_error(&mut self, err: LatticeError) {
        tracing::warn!(kind = ?self.kind, error = %err, "scheme instance recorded an error");
        if self.errors.len() >= self.max_errors {
            self.errors.remove(0);
        }
        self.errors.push(err);
        if let Some(stats) = &mut self.stats {
            stats.errors_logged += 1;
        }
    }

    pub fn errors(&self) -> &[LatticeError] {
        &self.errors
    }

    pub fn note_samples_drawn(&mut self, n: u64) {
        if let Some(stats) = &mut self.stats {
            stats.samples_drawn += n;
        }
    }

    pub fn note_bytes_encoded(&mut self, n: u64) {
        if let Some(stats) = &mut self.stats {
            stats.bytes_encoded += n;
        }
    }

    /// The entropy configuration's signedness convention for this
    /// scheme's signature material, resolved by a `match` on
    /// `SchemeKind` rather than a table of function pointers (spec.md
    /// §9's Design Note).
    pub fn prefers_signed_signature_coding(&self) -> bool {
        match self.kind {
            SchemeKind::Bliss | SchemeKind::Dilithium | SchemeKind::RingTesla | SchemeKind::DlpSig => true,
            SchemeKind::RlweEnc | SchemeKind::NtruKem | SchemeKind::Kyber | SchemeKind::DlpIbe => false,
            SchemeKind::Reserved0
            | SchemeKind::Reserved1
            | SchemeKind::Reserved2
            | SchemeKind::Reserved3
            | SchemeKind::Reserved4
            | SchemeKind::Reserved5 => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{EntropyScheme, EntropyConfig as Cfg};
    use crate::prng::seeded_handle;

    fn configs() -> EntropyConfigSet {
        let cfg = Cfg { scheme: EntropyScheme::Raw, bits: 16, signed: true, sigma: 3.0 };
        EntropyConfigSet { pubkey: cfg, privkey: cfg, user_key: cfg, signature: cfg, encryption: cfg }
    }

    #[test]
    fn error_log_evicts_oldest_past_capacity() {
        let mut inst = SchemeInstance::new(SchemeKind::Bliss, 64, configs(), seeded_handle([1u8; 32]), None, 2, true);
        inst.record_error(LatticeError::Other { kind: crate::error::ErrorKind::GeneralError, message: "a".into() });
        inst.record_error(LatticeError::Other { kind: crate::error::ErrorKind::GeneralError, message: "b".into() });
        inst.record_error(LatticeError::Other { kind: crate::error::ErrorKind::GeneralError, message: "c".into() });
        assert_eq!(inst.errors().len(), 2);
        assert_eq!(inst.stats().unwrap().errors_logged, 3);
    }

    #[test]
    fn scratch_arena_is_mutable_and_sized_at_construction() {
        let mut inst = SchemeInstance::new(SchemeKind::Kyber, 128, configs(), seeded_handle([2u8; 32]), None, 4, false);
        assert_eq!(inst.scratch_mut().len(), 128);
        inst.scratch_mut()[0] = 42;
        assert_eq!(inst.scratch_mut()[0], 42);
        assert!(inst.stats().is_none());
    }

    #[test]
    fn signature_signedness_follows_scheme_kind() {
        let inst = SchemeInstance::new(SchemeKind::Kyber, 8, configs(), seeded_handle([3u8; 32]), None, 4, false);
        assert!(!inst.prefers_signed_signature_coding());
        let inst = SchemeInstance::new(SchemeKind::Dilithium, 8, configs(), seeded_handle([4u8; 32]), None, 4, false);
        assert!(inst.prefers_signed_signature_coding());
    }
}
