// copyright 2019 Kaz Wesley

//! RustCrypto `cipher` traits. Positions are in bytes here, not blocks.

use cipher::errors::{LoopError, OverflowError};
use cipher::{SeekNum, StreamCipher, StreamCipherSeek};

use crate::{ChaCha20, BLOCK_SIZE};

impl StreamCipher for ChaCha20 {
    fn try_apply_keystream(&mut self, data: &mut [u8]) -> Result<(), LoopError> {
        self.try_apply_key_stream(data).map_err(|_| LoopError)
    }
}

impl StreamCipherSeek for ChaCha20 {
    fn try_current_pos<T: SeekNum>(&self) -> Result<T, OverflowError> {
        // buffered bytes are the tail of the block before the counter
        let (block, byte) = match self.buffered() {
            0 => (self.block_counter(), 0),
            n => (self.block_counter() - 1, (BLOCK_SIZE - n) as u8),
        };
        T::from_block_byte(block, byte, BLOCK_SIZE as u8)
    }

    fn try_seek<T: SeekNum>(&mut self, pos: T) -> Result<(), LoopError> {
        let (block, byte): (u64, u8) = pos
            .to_block_byte(BLOCK_SIZE as u8)
            .map_err(|_| LoopError)?;
        self.seek_within(block, usize::from(byte))
            .map_err(|_| LoopError)
    }
}
