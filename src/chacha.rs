//! # ChaCha20 permutation implementation
//!
//! The ChaCha20 block function operates on a 512-bit state as 16 32-bit words, arranged as a 4x4
//! matrix:
//!
//! ```text
//! cccccccc  cccccccc  cccccccc  cccccccc
//! kkkkkkkk  kkkkkkkk  kkkkkkkk  kkkkkkkk
//! kkkkkkkk  kkkkkkkk  kkkkkkkk  kkkkkkkk
//! bbbbbbbb  nnnnnnnn  nnnnnnnn  nnnnnnnn
//! ```
//!
//! `c` = constant, `k` = key, `b` = block counter, `n` = nonce.

use crate::{BLOCK_SIZE, KEY_SIZE, NONCE_SIZE};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of double rounds in the ChaCha20 block function.
pub(crate) const DOUBLE_ROUNDS: usize = 10;

/// "expand 32-byte k" as four little-endian words.
pub(crate) const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

// Always compile portable for benchmarking comparison
mod portable;
#[cfg(target_arch = "x86_64")]
mod sse2;

/// ChaCha20 state: 16 u32 words (512 bits).
///
/// On x86_64 targets the block function uses the SSE2 SIMD implementation, elsewhere the
/// portable one.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct State(pub(crate) [u32; 16]);

impl State {
    /// Create an all-zero state.
    #[inline(always)]
    pub const fn new() -> Self {
        Self([0; 16])
    }

    /// Create a state from raw words.
    #[inline(always)]
    pub const fn from_words(words: [u32; 16]) -> Self {
        Self(words)
    }

    /// Set up the input state for one block.
    pub fn init(key: &[u8; KEY_SIZE], counter: u32, nonce: &[u8; NONCE_SIZE]) -> Self {
        let mut state = Self::new();
        state.0[..4].copy_from_slice(&CONSTANTS);

        for (word, chunk) in state.0[4..12].iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        state.0[12] = counter;

        for (word, chunk) in state.0[13..].iter_mut().zip(nonce.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        state
    }

    /// The state words.
    #[inline(always)]
    pub const fn words(&self) -> &[u32; 16] {
        &self.0
    }

    /// Serialize the state, each word least-significant byte first.
    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// The ChaCha quarter round.
#[inline(always)]
pub const fn quarter_round(mut a: u32, mut b: u32, mut c: u32, mut d: u32) -> (u32, u32, u32, u32) {
    a = a.wrapping_add(b);
    d ^= a;
    d = d.rotate_left(16);

    c = c.wrapping_add(d);
    b ^= c;
    b = b.rotate_left(12);

    a = a.wrapping_add(b);
    d ^= a;
    d = d.rotate_left(8);

    c = c.wrapping_add(d);
    b ^= c;
    b = b.rotate_left(7);

    (a, b, c, d)
}

/// Run the full ChaCha20 block function over `input`, returning the output block.
///
/// This is 10 double rounds followed by the word-wise addition of the input state.
pub fn permute(input: &State) -> State {
    let mut state = input.clone();
    chacha20(&mut state);
    state
}

/// Apply the ChaCha20 block function to the state using SSE2 SIMD.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub(crate) fn chacha20(state: &mut State) {
    // SAFETY: SSE2 is available on all x86_64 targets
    unsafe {
        sse2::chacha20(state);
    }
}

/// Apply the ChaCha20 block function to the state using portable implementation.
#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub(crate) fn chacha20(state: &mut State) {
    portable::chacha20(state);
}

// Public benchmarking functions to compare implementations
#[doc(hidden)]
pub mod bench {
    pub use super::State;

    /// Apply the ChaCha20 block function using portable implementation (for benchmarking).
    pub fn chacha20_portable(state: &mut State) {
        super::portable::chacha20(state);
    }

    /// Apply the ChaCha20 block function using SIMD implementation (for benchmarking).
    ///
    /// On x86_64, this uses hand-written SSE2.
    /// On other platforms, this is an alias for portable.
    pub fn chacha20_simd(state: &mut State) {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: SSE2 is available on all x86_64 targets
            unsafe {
                super::sse2::chacha20(state);
            }
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            super::portable::chacha20(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8439, section 2.1.1.
    #[test]
    fn test_quarter_round() {
        let out = quarter_round(0x11111111, 0x01020304, 0x9b8d6f43, 0x01234567);
        assert_eq!(out, (0xea2a92f4, 0xcb1cf8ce, 0x4581472e, 0x5881c4bb));
    }

    // RFC 8439, section 2.2.1: quarter round on (2, 7, 8, 13) of a state.
    #[test]
    fn test_quarter_round_on_state() {
        let out = quarter_round(0x516461b1, 0x2a5f714c, 0x53372767, 0x3d631689);
        assert_eq!(out, (0xbdb886dc, 0xcfacafd2, 0xe46bea80, 0xccc07c79));
    }

    #[test]
    fn test_init_layout() {
        let key: [u8; KEY_SIZE] = core::array::from_fn(|i| i as u8);
        let nonce = [0, 0, 0, 0x09, 0, 0, 0, 0x4a, 0, 0, 0, 0];

        let state = State::init(&key, 1, &nonce);

        assert_eq!(
            state.words(),
            &[
                0x61707865, 0x3320646e, 0x79622d32, 0x6b206574, 0x03020100, 0x07060504,
                0x0b0a0908, 0x0f0e0d0c, 0x13121110, 0x17161514, 0x1b1a1918, 0x1f1e1d1c,
                0x00000001, 0x09000000, 0x4a000000, 0x00000000,
            ]
        );
    }

    // RFC 8439, section 2.3.2.
    #[test]
    fn test_block_function() {
        let key: [u8; KEY_SIZE] = core::array::from_fn(|i| i as u8);
        let nonce = [0, 0, 0, 0x09, 0, 0, 0, 0x4a, 0, 0, 0, 0];

        let output = permute(&State::init(&key, 1, &nonce));

        assert_eq!(
            output.words(),
            &[
                0xe4e7f110, 0x15593bd1, 0x1fdd0f50, 0xc47120a3, 0xc7f4d1c7, 0x0368c033,
                0x9aaa2204, 0x4e6cd4c3, 0x466482d2, 0x09aa9f07, 0x05d7c214, 0xa2028bd9,
                0xd19c12b5, 0xb94e16de, 0xe883d0cb, 0x4e3c50a2,
            ]
        );

        let bytes = output.to_bytes();
        assert_eq!(&bytes[..8], &[0x10, 0xf1, 0xe7, 0xe4, 0xd1, 0x3b, 0x59, 0x15]);
        assert_eq!(&bytes[56..], &[0xcb, 0xd0, 0x83, 0xe8, 0xa2, 0x50, 0x3c, 0x4e]);
    }

    #[test]
    fn test_zero_state_stays_zero() {
        // Every operation maps zero to zero, including the add-back.
        let output = permute(&State::new());
        assert_eq!(output.words(), &[0u32; 16]);
    }

    #[test]
    fn test_bench_backends_agree() {
        let mut simd = State::from_words(core::array::from_fn(|i| (i as u32).wrapping_mul(0x9e3779b9)));
        let mut portable = simd.clone();

        bench::chacha20_simd(&mut simd);
        bench::chacha20_portable(&mut portable);

        assert_eq!(simd.words(), portable.words());
    }
}
