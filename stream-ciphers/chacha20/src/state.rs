// copyright 2019 Kaz Wesley

//! Nonce/counter layout of the 16-word ChaCha state, and HChaCha20.
//!
//! ```text
//! words  0..4   constants
//! words  4..12  key
//! words 12..16  classic: counter lo, counter hi, nonce, nonce
//!               ietf:    counter,    nonce,      nonce, nonce
//! ```
//!
//! XChaCha20 never reaches this layer as its own variant: its 24-byte nonce is folded
//! into a fresh key by [`hchacha20`] and the rest proceeds as IETF.

use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::rounds::{permute, CONSTANTS};
use crate::{HNONCE_SIZE, INONCE_SIZE, KEY_SIZE, NONCE_SIZE, STATE_WORDS, XNONCE_SIZE};

/// Which nonce layout a cipher was constructed with. The nonce length is the only selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Bernstein's original layout: 64-bit nonce, 64-bit block counter.
    Classic,
    /// RFC 8439: 96-bit nonce, 32-bit block counter.
    Ietf,
    /// 192-bit nonce, reduced to [`Variant::Ietf`] under an HChaCha20-derived key.
    Extended,
}

impl Variant {
    pub fn from_nonce_len(len: usize) -> Result<Self> {
        match len {
            NONCE_SIZE => Ok(Variant::Classic),
            INONCE_SIZE => Ok(Variant::Ietf),
            XNONCE_SIZE => Ok(Variant::Extended),
            _ => Err(Error::InvalidNonceSize(len)),
        }
    }

    /// Nonce length in bytes that selects this variant.
    pub fn nonce_size(self) -> usize {
        match self {
            Variant::Classic => NONCE_SIZE,
            Variant::Ietf => INONCE_SIZE,
            Variant::Extended => XNONCE_SIZE,
        }
    }

    /// Width of the block counter once the layout has been resolved.
    pub fn counter_bits(self) -> u32 {
        match self {
            Variant::Classic => 64,
            Variant::Ietf | Variant::Extended => 32,
        }
    }
}

#[inline(always)]
fn read_u32_le(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn key_words(key: &[u8; KEY_SIZE]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (w, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
        *w = read_u32_le(chunk);
    }
    words
}

/// HChaCha20: derive a 256-bit subkey from a key and the first 16 bytes of an extended
/// nonce.
///
/// The permutation is applied without the final addition of the input state; words 0..4
/// and 12..16 of the result form the subkey.
pub fn hchacha20(key: &[u8; KEY_SIZE], nonce: &[u8; HNONCE_SIZE]) -> [u8; KEY_SIZE] {
    let mut input = [0u32; STATE_WORDS];
    input[..4].copy_from_slice(&CONSTANTS);
    input[4..12].copy_from_slice(&key_words(key));
    for (w, chunk) in input[12..].iter_mut().zip(nonce.chunks_exact(4)) {
        *w = read_u32_le(chunk);
    }
    let mut x = permute(&input);
    let mut out = [0u8; KEY_SIZE];
    for (chunk, w) in out
        .chunks_exact_mut(4)
        .zip(x[..4].iter().chain(x[12..].iter()))
    {
        chunk.copy_from_slice(&w.to_le_bytes());
    }
    input.zeroize();
    x.zeroize();
    out
}

/// The input words of the block function plus the width of their counter.
///
/// Counter arithmetic is checked here so that no backend can wrap it: [`State::advance`]
/// only accepts a block count that [`State::remaining_blocks`] allows.
#[derive(Clone)]
pub struct State {
    words: [u32; STATE_WORDS],
    variant: Variant,
}

impl State {
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self> {
        let key: &[u8; KEY_SIZE] = key
            .try_into()
            .map_err(|_| Error::InvalidKeySize(key.len()))?;
        let variant = Variant::from_nonce_len(nonce.len())?;
        Ok(match variant {
            Variant::Classic | Variant::Ietf => Self::with_layout(key, nonce, variant),
            Variant::Extended => {
                let (hnonce, tail) = nonce.split_at(HNONCE_SIZE);
                let mut hnonce_arr = [0u8; HNONCE_SIZE];
                hnonce_arr.copy_from_slice(hnonce);
                let mut subkey = hchacha20(key, &hnonce_arr);
                // 4 zero bytes then the last 8 nonce bytes, as an IETF nonce
                let mut inonce = [0u8; INONCE_SIZE];
                inonce[4..].copy_from_slice(tail);
                let state = Self::with_layout(&subkey, &inonce, variant);
                subkey.zeroize();
                state
            }
        })
    }

    fn with_layout(key: &[u8; KEY_SIZE], nonce: &[u8], variant: Variant) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[..4].copy_from_slice(&CONSTANTS);
        words[4..12].copy_from_slice(&key_words(key));
        match variant {
            Variant::Classic => {
                // counter occupies words 12 and 13
                words[14] = read_u32_le(&nonce[0..4]);
                words[15] = read_u32_le(&nonce[4..8]);
            }
            Variant::Ietf | Variant::Extended => {
                words[13] = read_u32_le(&nonce[0..4]);
                words[14] = read_u32_le(&nonce[4..8]);
                words[15] = read_u32_le(&nonce[8..12]);
            }
        }
        State { words, variant }
    }

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    fn is_wide(&self) -> bool {
        self.variant.counter_bits() == 64
    }

    /// Index of the next block to generate.
    #[inline]
    pub fn counter(&self) -> u64 {
        if self.is_wide() {
            u64::from(self.words[12]) | (u64::from(self.words[13]) << 32)
        } else {
            u64::from(self.words[12])
        }
    }

    /// Largest value the counter may hold.
    #[inline]
    pub fn max_counter(&self) -> u64 {
        if self.is_wide() {
            u64::MAX
        } else {
            u64::from(u32::MAX)
        }
    }

    pub fn set_counter(&mut self, block: u64) -> Result<()> {
        if block > self.max_counter() {
            return Err(Error::InvalidCounter(block));
        }
        self.words[12] = block as u32;
        if self.is_wide() {
            self.words[13] = (block >> 32) as u32;
        }
        Ok(())
    }

    /// How many blocks can still be generated before the counter runs out of room.
    #[inline]
    pub fn remaining_blocks(&self) -> u64 {
        self.max_counter() - self.counter()
    }

    /// Fail with [`Error::CounterOverflow`] unless `blocks` more blocks fit.
    #[inline]
    pub fn reserve(&self, blocks: u64) -> Result<()> {
        if blocks > self.remaining_blocks() {
            Err(Error::CounterOverflow)
        } else {
            Ok(())
        }
    }

    /// Move the counter forward by `blocks`.
    ///
    /// # Panics
    ///
    /// If the counter would leave its width. Callers reserve first.
    #[inline]
    pub fn advance(&mut self, blocks: u64) {
        assert!(blocks <= self.remaining_blocks(), "{}", Error::CounterOverflow);
        let ctr = self.counter() + blocks;
        self.words[12] = ctr as u32;
        if self.is_wide() {
            self.words[13] = (ctr >> 32) as u32;
        }
    }

    /// The full input words of the block `offset` positions past the current counter.
    #[inline(always)]
    pub(crate) fn block_words(&self, offset: u64) -> [u32; STATE_WORDS] {
        let mut words = self.words;
        let ctr = self.counter() + offset;
        words[12] = ctr as u32;
        if self.is_wide() {
            words[13] = (ctr >> 32) as u32;
        }
        words
    }
}

impl Zeroize for State {
    fn zeroize(&mut self) {
        self.words.zeroize();
    }
}

impl core::fmt::Debug for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("State")
            .field("variant", &self.variant)
            .field("counter", &self.counter())
            .finish_non_exhaustive()
    }
}
