//! Crate-wide error aggregation.
//!
//! Every module defines its own small `thiserror::Error` enum for the
//! failures it can produce (see e.g. [`crate::mpz::MpzError`],
//! [`crate::packer::PackerError`]). `LatticeError` exists for call-sites
//! that cross module boundaries and for callers that only care about the
//! coarse failure category — the tag set from the original library's
//! error-kind enumeration.

/// Coarse failure category, independent of which module raised it.
///
/// Mirrors the error-kind tag set a scheme layer built on this crate would
/// want to branch on (allocation failure vs. bad arguments vs. a full
/// queue, etc.) without needing to match on every leaf error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfBounds,
    CreateError,
    NullPointer,
    GeneralError,
    InvalidFunctionCall,
    InvalidFilePointer,
    QueueFull,
    QueueEmpty,
    FailedLock,
    ThreadError,
    ThreadExiting,
    DisabledAtCompile,
}

/// Crate-wide error, wrapping any module-local error.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error(transparent)]
    Mpz(#[from] crate::mpz::MpzError),
    #[error(transparent)]
    Mpf(#[from] crate::mpf::MpfError),
    #[error(transparent)]
    Poly(#[from] crate::poly::PolyError),
    #[error(transparent)]
    Packer(#[from] crate::packer::PackerError),
    #[error(transparent)]
    Huffman(#[from] crate::huffman::HuffmanError),
    #[error(transparent)]
    Bac(#[from] crate::bac::BacError),
    #[error(transparent)]
    Entropy(#[from] crate::entropy::EntropyError),
    #[error(transparent)]
    Pipe(#[from] crate::pipe::PipeError),
    #[error("{kind:?}: {message}")]
    Other { kind: ErrorKind, message: String },
}

impl LatticeError {
    /// Coarse category for callers that only want to branch on the kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LatticeError::Mpz(_) => ErrorKind::GeneralError,
            LatticeError::Mpf(_) => ErrorKind::GeneralError,
            LatticeError::Poly(_) => ErrorKind::InvalidFunctionCall,
            LatticeError::Packer(_) => ErrorKind::OutOfBounds,
            LatticeError::Huffman(_) => ErrorKind::GeneralError,
            LatticeError::Bac(_) => ErrorKind::GeneralError,
            LatticeError::Entropy(_) => ErrorKind::InvalidFunctionCall,
            LatticeError::Pipe(_) => ErrorKind::QueueEmpty,
            LatticeError::Other { kind, .. } => *kind,
        }
    }
}
