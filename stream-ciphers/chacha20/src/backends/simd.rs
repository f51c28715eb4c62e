// copyright 2019 Kaz Wesley

//! x86_64 implementations on `ppv-lite86` vectors.
//!
//! The state is held as four rows of four words. A column round works on whole rows; the
//! diagonal round rotates rows b, c and d into columns first and back afterwards. Four
//! blocks are computed side by side where the output allows, one at a time otherwise.

use ppv_lite86::x86_64::{AVX2, SSE2, SSE41, SSSE3};
use ppv_lite86::{ArithOps, BitOps32, LaneWords4, Machine, MultiLane, StoreBytes};

use crate::rounds::DROUNDS;
use crate::state::State;
use crate::{BLOCK_SIZE, STATE_WORDS};

const BUF_BLOCKS: usize = 4;
const BUF_SIZE: usize = BLOCK_SIZE * BUF_BLOCKS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Isa {
    Sse2,
    Ssse3,
    Sse41,
    Avx2,
}

impl Isa {
    pub(crate) const ALL: [Isa; 4] = [Isa::Sse2, Isa::Ssse3, Isa::Sse41, Isa::Avx2];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Isa::Sse2 => "sse2",
            Isa::Ssse3 => "ssse3",
            Isa::Sse41 => "sse4.1",
            Isa::Avx2 => "avx2",
        }
    }

    pub(crate) fn is_detected(self) -> bool {
        match self {
            // baseline on x86_64
            Isa::Sse2 => true,
            // faster rotates
            Isa::Ssse3 => is_x86_feature_detected!("ssse3"),
            Isa::Sse41 => is_x86_feature_detected!("sse4.1"),
            // wide issue
            Isa::Avx2 => is_x86_feature_detected!("avx2"),
        }
    }

    /// # Safety
    ///
    /// The CPU must support `self`, as reported by [`Isa::is_detected`].
    pub(crate) unsafe fn generate(self, state: &mut State, out: &mut [u8]) {
        match self {
            Isa::Sse2 => generate_sse2(state, out),
            Isa::Ssse3 => generate_ssse3(state, out),
            Isa::Sse41 => generate_sse41(state, out),
            Isa::Avx2 => generate_avx2(state, out),
        }
    }
}

unsafe fn generate_sse2(state: &mut State, out: &mut [u8]) {
    generate_impl(SSE2::instance(), state, out)
}

#[target_feature(enable = "ssse3")]
unsafe fn generate_ssse3(state: &mut State, out: &mut [u8]) {
    generate_impl(SSSE3::instance(), state, out)
}

#[target_feature(enable = "sse4.1")]
unsafe fn generate_sse41(state: &mut State, out: &mut [u8]) {
    generate_impl(SSE41::instance(), state, out)
}

#[target_feature(enable = "avx2")]
unsafe fn generate_avx2(state: &mut State, out: &mut [u8]) {
    generate_impl(AVX2::instance(), state, out)
}

#[derive(Clone, Copy)]
struct Rows<V> {
    a: V,
    b: V,
    c: V,
    d: V,
}

#[inline(always)]
fn round<V: ArithOps + BitOps32>(mut x: Rows<V>) -> Rows<V> {
    x.a += x.b;
    x.d = (x.d ^ x.a).rotate_each_word_right16();
    x.c += x.d;
    x.b = (x.b ^ x.c).rotate_each_word_right20();
    x.a += x.b;
    x.d = (x.d ^ x.a).rotate_each_word_right24();
    x.c += x.d;
    x.b = (x.b ^ x.c).rotate_each_word_right25();
    x
}

#[inline(always)]
fn diagonalize<V: LaneWords4>(mut x: Rows<V>) -> Rows<V> {
    x.b = x.b.shuffle_lane_words3012();
    x.c = x.c.shuffle_lane_words2301();
    x.d = x.d.shuffle_lane_words1230();
    x
}

#[inline(always)]
fn undiagonalize<V: LaneWords4>(mut x: Rows<V>) -> Rows<V> {
    x.b = x.b.shuffle_lane_words1230();
    x.c = x.c.shuffle_lane_words2301();
    x.d = x.d.shuffle_lane_words3012();
    x
}

#[inline(always)]
fn rounds<V: ArithOps + BitOps32 + LaneWords4>(mut x: Rows<V>) -> Rows<V> {
    for _ in 0..DROUNDS {
        x = round(x);
        x = undiagonalize(round(diagonalize(x)));
    }
    x
}

#[inline(always)]
fn generate_impl<M: Machine>(m: M, state: &mut State, out: &mut [u8]) {
    let mut blocks = 0;
    let mut wide = out.chunks_exact_mut(BUF_SIZE);
    for chunk in &mut wide {
        refill_wide(m, state, blocks, chunk);
        blocks += BUF_BLOCKS as u64;
    }
    for block in wide.into_remainder().chunks_exact_mut(BLOCK_SIZE) {
        refill_narrow(m, state, blocks, block);
        blocks += 1;
    }
    state.advance(blocks);
}

#[inline(always)]
fn row<M: Machine>(m: M, w: &[u32; STATE_WORDS], i: usize) -> M::u32x4 {
    m.vec([w[i], w[i + 1], w[i + 2], w[i + 3]])
}

/// Single block at `offset` blocks past the counter.
#[inline(always)]
fn refill_narrow<M: Machine>(m: M, state: &State, offset: u64, out: &mut [u8]) {
    let w = state.block_words(offset);
    let input: Rows<M::u32x4> = Rows {
        a: row(m, &w, 0),
        b: row(m, &w, 4),
        c: row(m, &w, 8),
        d: row(m, &w, 12),
    };
    let x = rounds(input);
    (x.a + input.a).write_le(&mut out[0..16]);
    (x.b + input.b).write_le(&mut out[16..32]);
    (x.c + input.c).write_le(&mut out[32..48]);
    (x.d + input.d).write_le(&mut out[48..64]);
}

/// Four consecutive blocks starting `offset` blocks past the counter, one per lane.
#[inline(always)]
fn refill_wide<M: Machine>(m: M, state: &State, offset: u64, out: &mut [u8]) {
    let w = [
        state.block_words(offset),
        state.block_words(offset + 1),
        state.block_words(offset + 2),
        state.block_words(offset + 3),
    ];
    let lanes = |i: usize| -> M::u32x4x4 {
        M::u32x4x4::from_lanes([
            row(m, &w[0], i),
            row(m, &w[1], i),
            row(m, &w[2], i),
            row(m, &w[3], i),
        ])
    };
    let input: Rows<M::u32x4x4> = Rows {
        a: lanes(0),
        b: lanes(4),
        c: lanes(8),
        d: lanes(12),
    };
    let x = rounds(input);
    let a = (x.a + input.a).to_lanes();
    let b = (x.b + input.b).to_lanes();
    let c = (x.c + input.c).to_lanes();
    let d = (x.d + input.d).to_lanes();
    for (i, block) in out.chunks_exact_mut(BLOCK_SIZE).enumerate() {
        a[i].write_le(&mut block[0..16]);
        b[i].write_le(&mut block[16..32]);
        c[i].write_le(&mut block[32..48]);
        d[i].write_le(&mut block[48..64]);
    }
}
