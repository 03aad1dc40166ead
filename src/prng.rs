//! PRNG handle abstraction.
//!
//! Not named by its own `[MODULE]` block, but every sampler in §4.10-4.12
//! and the registry in §4.14 is specified in terms of "a borrowed PRNG
//! handle" / "a PRNG handle owned by the scheme instance". We supplement
//! that plumbing here rather than inventing it ad hoc in each sampler.
//!
//! A `Prng` is a `rand::RngCore` with nothing added: samplers borrow it
//! (`&mut dyn Prng`), never own it, matching §5's "PRNG handles are not
//! thread-safe; each sampler holds one".

use rand::RngCore;

/// A borrowable source of randomness used by samplers and the registry.
pub trait Prng: RngCore {}

impl<T: RngCore> Prng for T {}

/// A boxed, type-erased PRNG handle, owned by a [`crate::registry::SchemeInstance`]
/// and lent out to samplers for the duration of a single `sample()` call.
pub type PrngHandle = Box<dyn RngCore + Send>;

/// Construct a deterministic PRNG handle from a 32-byte seed.
///
/// Used by tests and by any caller that needs reproducible sampling (e.g.
/// known-answer tests for the Gaussian samplers).
pub fn seeded_handle(seed: [u8; 32]) -> PrngHandle {
    use rand::SeedableRng;
    Box::new(rand::rngs::StdRng::from_seed(seed))
}

/// Construct a PRNG handle seeded from the OS entropy source.
pub fn os_handle() -> PrngHandle {
    use rand::SeedableRng;
    Box::new(rand::rngs::StdRng::from_entropy())
}
