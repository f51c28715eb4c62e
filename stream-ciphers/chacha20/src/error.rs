// copyright 2019 Kaz Wesley

use thiserror::Error;

/// Errors reported by the ChaCha20 constructors and cursor operations.
///
/// `CounterOverflow` is special: the panicking entry points (`key_stream`,
/// `apply_key_stream`, `xor_key_stream`) treat it as a fatal fault, and only the `try_*`
/// variants hand it back as a value. Either way no keystream byte is produced past the
/// end of the counter space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("chacha20: invalid key size {0}, expected 32 bytes")]
    InvalidKeySize(usize),
    #[error("chacha20: invalid nonce size {0}, expected 8, 12 or 24 bytes")]
    InvalidNonceSize(usize),
    #[error("chacha20: block counter {0} does not fit the counter width")]
    InvalidCounter(u64),
    #[error("chacha20: dst length {dst} does not match src length {src}")]
    BufferLengthMismatch { dst: usize, src: usize },
    #[error("chacha20: block counter would overflow, keystream exhausted for this nonce")]
    CounterOverflow,
}

pub type Result<T> = core::result::Result<T, Error>;
