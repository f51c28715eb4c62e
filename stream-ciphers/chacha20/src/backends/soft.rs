// copyright 2019 Kaz Wesley

//! Portable implementation which does not rely on architecture-specific intrinsics.

use crate::rounds;
use crate::state::State;
use crate::BLOCK_SIZE;

pub(crate) fn generate(state: &mut State, out: &mut [u8]) {
    let mut blocks = 0;
    for block in out.chunks_exact_mut(BLOCK_SIZE) {
        rounds::block(&state.block_words(blocks), block);
        blocks += 1;
    }
    state.advance(blocks);
}
