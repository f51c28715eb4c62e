// copyright 2019 Kaz Wesley

//! The ChaCha permutation on a 16-word state, in portable scalar form.
//!
//! Every backend must agree with [`block`] bit for bit; the SIMD backends run the same
//! column/diagonal schedule on vector lanes.

use crate::{BLOCK_SIZE, STATE_WORDS};

/// "expand 32-byte k"
pub(crate) const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Double rounds in ChaCha20.
pub(crate) const DROUNDS: usize = 10;

#[inline(always)]
fn quarter_round(x: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

#[inline(always)]
pub(crate) fn double_round(x: &mut [u32; STATE_WORDS]) {
    // columns
    quarter_round(x, 0, 4, 8, 12);
    quarter_round(x, 1, 5, 9, 13);
    quarter_round(x, 2, 6, 10, 14);
    quarter_round(x, 3, 7, 11, 15);
    // diagonals
    quarter_round(x, 0, 5, 10, 15);
    quarter_round(x, 1, 6, 11, 12);
    quarter_round(x, 2, 7, 8, 13);
    quarter_round(x, 3, 4, 9, 14);
}

/// Twenty rounds without the feed-forward addition. This is the HChaCha20 core and is
/// invertible, so it must never be used to produce keystream directly.
#[inline]
pub(crate) fn permute(input: &[u32; STATE_WORDS]) -> [u32; STATE_WORDS] {
    let mut x = *input;
    for _ in 0..DROUNDS {
        double_round(&mut x);
    }
    x
}

/// One keystream block: the permuted state added word-wise to the input, serialized
/// little-endian.
#[inline]
pub(crate) fn block(input: &[u32; STATE_WORDS], out: &mut [u8]) {
    debug_assert_eq!(out.len(), BLOCK_SIZE);
    let x = permute(input);
    for ((chunk, x), s) in out.chunks_exact_mut(4).zip(x.iter()).zip(input.iter()) {
        chunk.copy_from_slice(&x.wrapping_add(*s).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8439 section 2.1.1
    #[test]
    fn quarter_round_rfc8439() {
        let mut x = [0u32; STATE_WORDS];
        x[0] = 0x1111_1111;
        x[1] = 0x0102_0304;
        x[2] = 0x9b8d_6f43;
        x[3] = 0x0123_4567;
        quarter_round(&mut x, 0, 1, 2, 3);
        assert_eq!(&x[..4], &[0xea2a_92f4, 0xcb1c_f8ce, 0x4581_472e, 0x5881_c4bb]);
    }

    // RFC 8439 section 2.3.2
    #[test]
    fn block_function_rfc8439() {
        let input = [
            0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574, 0x0302_0100, 0x0706_0504,
            0x0b0a_0908, 0x0f0e_0d0c, 0x1312_1110, 0x1716_1514, 0x1b1a_1918, 0x1f1e_1d1c,
            0x0000_0001, 0x0900_0000, 0x4a00_0000, 0x0000_0000,
        ];
        let mut out = [0u8; BLOCK_SIZE];
        block(&input, &mut out);
        let expected = hex!(
            "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e
            d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e"
        );
        assert_eq!(&expected[..], &out[..]);
    }

    #[test]
    fn permute_skips_feed_forward() {
        let mut input = [0u32; STATE_WORDS];
        input[..4].copy_from_slice(&CONSTANTS);
        let mut out = [0u8; BLOCK_SIZE];
        block(&input, &mut out);
        let raw = permute(&input);
        for (i, chunk) in out.chunks_exact(4).enumerate() {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            assert_eq!(word, raw[i].wrapping_add(input[i]));
        }
        assert_ne!(raw[0], raw[0].wrapping_add(input[0]));
    }
}
