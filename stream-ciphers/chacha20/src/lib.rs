// copyright 2019 Kaz Wesley

//! Pure Rust ChaCha20 keystreams with runtime-selected SIMD backends.
//!
//! One cipher type covers three nonce layouts, chosen by nonce length:
//!
//! - 8 bytes: ChaCha20 as in Bernstein's original publication, 64-bit block counter.
//! - 12 bytes: IETF RFC 8439 ChaCha20, 32-bit block counter. Unsuitable for messages
//!   longer than 256 GiB.
//! - 24 bytes: XChaCha20. HChaCha20 folds the first 16 nonce bytes into a subkey, then the
//!   cipher proceeds as IETF. The nonce is long enough to be picked at random.
//!
//! This is a raw keystream: there is no authentication, and nonce reuse under one key
//! is the caller's problem.
//!
//! Usage:
//! ```
//! use c2_chacha20::ChaCha20;
//!
//! let key = b"very secret key-the most secret.";
//! let nonce = b"a 24 byte extended nonce";
//! let plaintext = b"The quick brown fox jumps over the lazy dog.";
//!
//! let mut buffer = plaintext.to_vec();
//! // create cipher instance
//! let mut cipher = ChaCha20::new(key, nonce).unwrap();
//! // apply keystream (encrypt)
//! cipher.apply_key_stream(&mut buffer);
//! // and decrypt it back
//! cipher.seek(0).unwrap();
//! cipher.apply_key_stream(&mut buffer);
//! assert_eq!(&buffer[..], &plaintext[..]);
//! // reads can be split anywhere
//! cipher.seek(0).unwrap();
//! for chunk in buffer.chunks_mut(3) {
//!     cipher.apply_key_stream(chunk);
//! }
//! ```
//!
//! Block generation goes through a [`Backend`]. [`Backend::active`] picks the fastest one
//! the CPU supports; [`ChaCha20::with_backend`] runs any other from
//! [`Backend::available`]. All of them produce identical output.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
#[macro_use]
extern crate hex_literal;

mod backends;
mod error;
mod rounds;
#[cfg(feature = "rustcrypto_api")]
mod rustcrypto;
mod state;
mod stream;

#[cfg(feature = "rustcrypto_api")]
pub use cipher;

pub use crate::backends::Backend;
pub use crate::error::{Error, Result};
pub use crate::state::{hchacha20, State, Variant};
pub use crate::stream::ChaCha20;

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;
/// Nonce size of the original construction.
pub const NONCE_SIZE: usize = 8;
/// Nonce size of IETF ChaCha20.
pub const INONCE_SIZE: usize = 12;
/// Nonce size of XChaCha20.
pub const XNONCE_SIZE: usize = 24;
/// Nonce input size of HChaCha20.
pub const HNONCE_SIZE: usize = 16;
/// Keystream block size in bytes.
pub const BLOCK_SIZE: usize = 64;

const STATE_WORDS: usize = 16;
