// copyright 2019 Kaz Wesley

use core::{cmp, fmt};
use zeroize::Zeroize;

use crate::backends::Backend;
use crate::error::{Error, Result};
use crate::state::{State, Variant};
use crate::BLOCK_SIZE;

/// Scratch space for XOR: keystream is generated this many blocks at a time.
const BUF_BLOCKS: usize = 4;
const BUF_SIZE: usize = BLOCK_SIZE * BUF_BLOCKS;

#[derive(Clone, Copy)]
enum Mode {
    Overwrite,
    Xor,
}

impl Mode {
    #[inline(always)]
    fn emit(self, data: &mut [u8], keystream: &[u8]) {
        match self {
            Mode::Overwrite => data.copy_from_slice(keystream),
            Mode::Xor => {
                for (d, k) in data.iter_mut().zip(keystream) {
                    *d ^= *k;
                }
            }
        }
    }
}

/// A seekable ChaCha20 keystream.
///
/// The nonce length picks the variant: 8 bytes for the original construction (64-bit
/// counter), 12 bytes for RFC 8439 (32-bit counter), 24 bytes for XChaCha20 (32-bit
/// counter under an HChaCha20 subkey).
///
/// Reads may be chunked arbitrarily: the output of any sequence of calls equals that of
/// one call covering the same total length. Unconsumed bytes of the last block generated
/// are kept for the next call; [`seek`](ChaCha20::seek) drops them.
///
/// Running out of counter space is a fault, never a wraparound. The panicking methods
/// (`key_stream`, `apply_key_stream`, `xor_key_stream`) abort the call, and the `try_*`
/// forms return [`Error::CounterOverflow`]; in both cases before any byte is written.
///
/// Key material is wiped on drop and by [`reset`](ChaCha20::reset).
#[derive(Clone)]
pub struct ChaCha20 {
    state: State,
    backend: Backend,
    buf: [u8; BLOCK_SIZE],
    // buf[off..] is unconsumed keystream; off == BLOCK_SIZE when empty
    off: usize,
}

impl ChaCha20 {
    /// Construct a cipher on the process-wide [`Backend::active`] implementation.
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self> {
        Self::with_backend(key, nonce, Backend::active())
    }

    /// Construct a cipher on a specific implementation.
    pub fn with_backend(key: &[u8], nonce: &[u8], backend: Backend) -> Result<Self> {
        Ok(ChaCha20 {
            state: State::new(key, nonce)?,
            backend,
            buf: [0; BLOCK_SIZE],
            off: BLOCK_SIZE,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Switch implementations. The keystream position is unaffected.
    pub fn set_backend(&mut self, backend: Backend) {
        tracing::debug!(
            from = self.backend.name(),
            to = backend.name(),
            "overriding chacha20 backend"
        );
        self.backend = backend;
    }

    pub fn variant(&self) -> Variant {
        self.state.variant()
    }

    /// Index of the next block that will be generated.
    ///
    /// Buffered bytes belong to the block before this one.
    pub fn block_counter(&self) -> u64 {
        self.state.counter()
    }

    /// Number of buffered keystream bytes not yet handed out.
    pub(crate) fn buffered(&self) -> usize {
        BLOCK_SIZE - self.off
    }

    /// Position the stream at the start of block `block`, discarding buffered bytes.
    ///
    /// Fails with [`Error::InvalidCounter`], leaving the cipher unchanged, if `block` does
    /// not fit the counter (above `u32::MAX` for IETF and XChaCha20 nonces). Seeking to
    /// the very last counter value is accepted; the next read then faults.
    pub fn seek(&mut self, block: u64) -> Result<()> {
        self.state.set_counter(block)?;
        self.off = BLOCK_SIZE;
        self.buf.zeroize();
        tracing::trace!(block, "chacha20 seek");
        Ok(())
    }

    /// Position the stream `byte` bytes into block `block`. On error the cipher is unchanged.
    #[cfg(feature = "rustcrypto_api")]
    pub(crate) fn seek_within(&mut self, block: u64, byte: usize) -> Result<()> {
        debug_assert!(byte < BLOCK_SIZE);
        // a mid-block position needs block `block` itself to be generated
        if byte != 0 && block >= self.state.max_counter() {
            return Err(Error::CounterOverflow);
        }
        self.seek(block)?;
        if byte != 0 {
            self.backend.generate(&mut self.state, &mut self.buf)?;
            self.off = byte;
        }
        Ok(())
    }

    /// Overwrite `dst` with the next `dst.len()` keystream bytes.
    ///
    /// # Panics
    ///
    /// On counter overflow. See [`try_key_stream`](ChaCha20::try_key_stream).
    pub fn key_stream(&mut self, dst: &mut [u8]) {
        if let Err(e) = self.try_key_stream(dst) {
            panic!("{}", e);
        }
    }

    pub fn try_key_stream(&mut self, dst: &mut [u8]) -> Result<()> {
        self.process(dst, Mode::Overwrite)
    }

    /// XOR the next `buf.len()` keystream bytes into `buf`.
    ///
    /// # Panics
    ///
    /// On counter overflow. See [`try_apply_key_stream`](ChaCha20::try_apply_key_stream).
    pub fn apply_key_stream(&mut self, buf: &mut [u8]) {
        if let Err(e) = self.try_apply_key_stream(buf) {
            panic!("{}", e);
        }
    }

    pub fn try_apply_key_stream(&mut self, buf: &mut [u8]) -> Result<()> {
        self.process(buf, Mode::Xor)
    }

    /// Write `src` XOR keystream into `dst`.
    ///
    /// Mismatched lengths are reported as [`Error::BufferLengthMismatch`] without consuming
    /// keystream. For in-place use call [`apply_key_stream`](ChaCha20::apply_key_stream).
    ///
    /// # Panics
    ///
    /// On counter overflow.
    pub fn xor_key_stream(&mut self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        if dst.len() != src.len() {
            return Err(Error::BufferLengthMismatch {
                dst: dst.len(),
                src: src.len(),
            });
        }
        dst.copy_from_slice(src);
        self.apply_key_stream(dst);
        Ok(())
    }

    /// Wipe key, nonce, position and buffered keystream. The cipher keeps working but
    /// produces the keystream of an all-zero state, so it should be dropped.
    pub fn reset(&mut self) {
        self.state.zeroize();
        self.buf.zeroize();
        self.off = BLOCK_SIZE;
    }

    /// Fresh blocks a request of `len` bytes needs after the buffer is drained.
    #[inline]
    fn blocks_needed(&self, len: usize) -> u64 {
        let rest = len - cmp::min(self.buffered(), len);
        rest.div_ceil(BLOCK_SIZE) as u64
    }

    fn process(&mut self, data: &mut [u8], mode: Mode) -> Result<()> {
        // Check the whole request up front so a failing call emits nothing.
        self.state.reserve(self.blocks_needed(data.len()))?;

        let have = cmp::min(self.buffered(), data.len());
        let (head, rest) = data.split_at_mut(have);
        mode.emit(head, &self.buf[self.off..self.off + have]);
        self.off += have;

        let whole = rest.len() - rest.len() % BLOCK_SIZE;
        let (body, tail) = rest.split_at_mut(whole);
        match mode {
            Mode::Overwrite => self.backend.generate(&mut self.state, body)?,
            Mode::Xor => {
                let mut ks = [0u8; BUF_SIZE];
                for chunk in body.chunks_mut(BUF_SIZE) {
                    let ks = &mut ks[..chunk.len()];
                    self.backend.generate(&mut self.state, ks)?;
                    mode.emit(chunk, ks);
                }
                ks.zeroize();
            }
        }

        // Handle the tail through the buffer so leftovers survive to the next call.
        if !tail.is_empty() {
            self.backend.generate(&mut self.state, &mut self.buf)?;
            mode.emit(tail, &self.buf[..tail.len()]);
            self.off = tail.len();
        }
        Ok(())
    }
}

impl Drop for ChaCha20 {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for ChaCha20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaCha20")
            .field("variant", &self.variant())
            .field("backend", &self.backend)
            .field("block_counter", &self.block_counter())
            .field("buffered", &self.buffered())
            .finish_non_exhaustive()
    }
}
