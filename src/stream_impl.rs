//! # ChaCha20 stream cipher
//!
//! Counter-mode keystream generation on top of the ChaCha20 block function. Encryption and
//! decryption are the same operation: XOR with the keystream.
//!
//! # Usage
//!
//! ```
//! use chacha_poly::{apply_keystream, KEY_SIZE, NONCE_SIZE};
//!
//! let key = [0u8; KEY_SIZE];
//! let nonce = [1u8; NONCE_SIZE];
//! let mut data = *b"Secret message";
//!
//! apply_keystream(&key, &nonce, 1, &mut data);
//! assert_ne!(&data, b"Secret message");
//!
//! apply_keystream(&key, &nonce, 1, &mut data);
//! assert_eq!(&data, b"Secret message");
//! ```
//!
//! The block counter is 32 bits, so one (key, nonce) pair covers at most 2^32 blocks (256 GiB).
//! Asking for more than the counter can address is a programming error and panics before any
//! byte is written.

use crate::chacha::{State, chacha20};
use crate::{BLOCK_SIZE, KEY_SIZE, NONCE_SIZE};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Number of counter values of a 32-bit block counter.
const COUNTER_SPACE: u64 = 1 << 32;

/// Number of keystream blocks needed to cover `len` bytes.
#[inline(always)]
fn blocks_for(len: usize) -> u64 {
    (len as u64).div_ceil(BLOCK_SIZE as u64)
}

/// Panics if `len` bytes starting at `initial_counter` would wrap the block counter.
#[inline]
fn assert_counter_capacity(initial_counter: u32, len: usize) {
    assert!(
        blocks_for(len) <= COUNTER_SPACE - u64::from(initial_counter),
        "ChaCha20 block counter would overflow"
    );
}

/// Generate the 64-byte keystream block for `counter`.
pub fn keystream_block(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    counter: u32,
) -> [u8; BLOCK_SIZE] {
    let mut state = State::init(key, counter, nonce);
    chacha20(&mut state);
    state.to_bytes()
}

/// XOR `buffer` in-place with the keystream starting at block `initial_counter`.
///
/// The final partial block uses a prefix of its keystream block, the output has the same length
/// as the input.
///
/// # Panics
///
/// If `buffer` needs more blocks than remain between `initial_counter` and 2^32.
pub fn apply_keystream(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    initial_counter: u32,
    buffer: &mut [u8],
) {
    assert_counter_capacity(initial_counter, buffer.len());

    let mut counter = initial_counter;
    for chunk in buffer.chunks_mut(BLOCK_SIZE) {
        let keystream = Zeroizing::new(keystream_block(key, nonce, counter));
        for (byte, k) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= k;
        }
        // Wraps only after the last addressable block, which the capacity check allows.
        counter = counter.wrapping_add(1);
    }
}

/// XOR `data` with the keystream starting at block `initial_counter`, returning a new buffer.
///
/// # Panics
///
/// If `data` needs more blocks than remain between `initial_counter` and 2^32.
#[cfg(feature = "alloc")]
pub fn apply(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    initial_counter: u32,
    data: &[u8],
) -> Vec<u8> {
    let mut output = data.to_vec();
    apply_keystream(key, nonce, initial_counter, &mut output);
    output
}

/// Stateful ChaCha20 cipher for data that arrives in pieces.
///
/// Consecutive calls to [`ChaCha20::apply_keystream`] continue where the previous call stopped, so
/// splitting a message at arbitrary points gives the same result as one call over all of it.
///
/// # Example
///
/// ```
/// use chacha_poly::{ChaCha20, apply_keystream};
///
/// let key = [7u8; 32];
/// let nonce = [9u8; 12];
///
/// let mut oneshot = *b"split anywhere you like";
/// apply_keystream(&key, &nonce, 1, &mut oneshot);
///
/// let mut pieces = *b"split anywhere you like";
/// let mut cipher = ChaCha20::new(&key, &nonce, 1);
/// let (head, tail) = pieces.split_at_mut(5);
/// cipher.apply_keystream(head);
/// cipher.apply_keystream(tail);
///
/// assert_eq!(oneshot, pieces);
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    /// Input state of the next block to generate.
    input: State,
    keystream: [u8; BLOCK_SIZE],
    /// Consumed bytes of `keystream`; `BLOCK_SIZE` when nothing is buffered.
    offset: usize,
    /// Blocks the counter can still produce.
    remaining_blocks: u64,
}

impl ChaCha20 {
    /// Create a cipher whose first keystream block uses `initial_counter`.
    pub fn new(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], initial_counter: u32) -> Self {
        Self {
            input: State::init(key, initial_counter, nonce),
            keystream: [0u8; BLOCK_SIZE],
            offset: BLOCK_SIZE,
            remaining_blocks: COUNTER_SPACE - u64::from(initial_counter),
        }
    }

    /// XOR `buffer` in-place with the next bytes of keystream.
    ///
    /// # Panics
    ///
    /// If the block counter cannot cover `buffer`.
    pub fn apply_keystream(&mut self, buffer: &mut [u8]) {
        let buffered = BLOCK_SIZE - self.offset;
        assert!(
            blocks_for(buffer.len().saturating_sub(buffered)) <= self.remaining_blocks,
            "ChaCha20 block counter would overflow"
        );

        for byte in buffer.iter_mut() {
            if self.offset == BLOCK_SIZE {
                self.refill();
            }
            *byte ^= self.keystream[self.offset];
            self.offset += 1;
        }
    }

    /// Generate the next keystream block and advance the counter.
    fn refill(&mut self) {
        let mut block = self.input.clone();
        chacha20(&mut block);
        self.keystream = block.to_bytes();

        self.input.0[12] = self.input.0[12].wrapping_add(1);
        self.remaining_blocks -= 1;
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests;
