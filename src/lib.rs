//! Core primitives for lattice-based post-quantum cryptography.
//!
//! This crate is the shared substrate a lattice scheme implementation
//! (a BLISS-style signature, a Kyber-style KEM, and so on) is built on
//! top of, not a scheme itself: discrete Gaussian sampling, bit-serial
//! entropy coding, multi-precision integer/float/polynomial arithmetic,
//! and a bounded single-producer/single-consumer byte pipe for moving
//! coded output between threads.
//!
//! ## Layering
//!
//! - [`mpz`] / [`mpf`] — arbitrary-precision integer and float
//!   arithmetic, underpinning everything above them.
//! - [`bitops`] / [`prng`] — constant-time bit intrinsics and the PRNG
//!   handle abstraction every sampler and the [`registry`] borrow.
//! - [`poly`] — MPZ-coefficient, small-ring (`i32`), and GF(2) polynomial
//!   kernels.
//! - [`fft`] — complex FFT over cyclotomic rings, used by table
//!   construction in [`sampling`].
//! - [`packer`] / [`huffman`] / [`bac`] — the bit-packer substrate and
//!   the two entropy coders built on it.
//! - [`entropy`] — the dispatcher routing polynomial coefficients
//!   through raw, Huffman, or arithmetic coding.
//! - [`sampling`] — the five discrete Gaussian samplers, the MW
//!   bootstrap combiner chain, and the façade that wires them together.
//! - [`pipe`] — the bounded byte pipe.
//! - [`registry`] — the scheme-kind enum and shared per-instance scratch
//!   state a scheme implementation would build on.
//! - [`error`] — crate-wide error aggregation.
//!
//! Logging throughout uses `tracing` spans/events at module boundaries
//! that do real work (table construction, pipe resize, rejection-sampler
//! restarts) rather than per-call noise.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Constant-time bit intrinsics shared by the arithmetic and sampling layers.
pub mod bitops;
/// Binary arithmetic coder (Witten-Neal-Cleary), the BAC path of the entropy dispatcher.
pub mod bac;
/// Crate-wide error aggregation.
pub mod error;
/// Entropy dispatcher: routes polynomial coefficients to raw/Huffman/BAC coding.
pub mod entropy;
/// Complex FFT over cyclotomic rings `Z[x]/(x^n+1)`.
pub mod fft;
/// Static Huffman coding over small integer alphabets.
pub mod huffman;
/// Arbitrary-precision float arithmetic atop `Mpz`.
pub mod mpf;
/// Arbitrary-precision signed integer arithmetic.
pub mod mpz;
/// MSB-first bit packer over a growable byte buffer.
pub mod packer;
/// Bounded single-producer/single-consumer byte pipe.
pub mod pipe;
/// Polynomial kernels: MPZ-coefficient, small-ring (`i32`), and GF(2).
pub mod poly;
/// PRNG handle abstraction borrowed by samplers and the registry.
pub mod prng;
/// Algorithm registry: scheme-kind enum and shared per-instance scratch state.
pub mod registry;
/// Discrete Gaussian samplers, the MW bootstrap, and the sampling façade.
pub mod sampling;

pub use error::{ErrorKind, LatticeError};
