//! # Salsa20 stream cipher
//!
//! Salsa20/20 with a 256-bit key, 64-bit nonce and 64-bit block counter. It is the ARX
//! predecessor of ChaCha20 and is independent of the AEAD construction in this crate.
//!
//! The 16-word state places the constants on the diagonal:
//!
//! ```text
//! c  k  k  k
//! k  c  n  n
//! b  b  c  k
//! k  k  k  c
//! ```
//!
//! `c` = "expand 32-byte k", `k` = key, `n` = nonce, `b` = block counter (low word first).
//!
//! # Usage
//!
//! ```
//! use chacha_poly::salsa;
//!
//! let key = [1u8; salsa::KEY_SIZE];
//! let nonce = [2u8; salsa::NONCE_SIZE];
//! let mut data = *b"Salsa20 message";
//!
//! salsa::apply_keystream(&key, &nonce, 0, &mut data);
//! salsa::apply_keystream(&key, &nonce, 0, &mut data);
//!
//! assert_eq!(&data, b"Salsa20 message");
//! ```

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Salsa20 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Salsa20 nonce size in bytes.
pub const NONCE_SIZE: usize = 8;

/// Salsa20 keystream block size in bytes.
pub const BLOCK_SIZE: usize = 64;

/// Number of double rounds (Salsa20/20).
const DOUBLE_ROUNDS: usize = 10;

/// "expand 32-byte k" as four little-endian words.
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Salsa20 state: 16 u32 words (512 bits).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct State(pub(crate) [u32; 16]);

impl State {
    /// Set up the input state for one block.
    pub fn init(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], counter: u64) -> Self {
        let mut k = [0u32; 8];
        for (word, chunk) in k.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let n0 = u32::from_le_bytes([nonce[0], nonce[1], nonce[2], nonce[3]]);
        let n1 = u32::from_le_bytes([nonce[4], nonce[5], nonce[6], nonce[7]]);

        let state = Self([
            CONSTANTS[0],
            k[0],
            k[1],
            k[2],
            k[3],
            CONSTANTS[1],
            n0,
            n1,
            counter as u32,
            (counter >> 32) as u32,
            CONSTANTS[2],
            k[4],
            k[5],
            k[6],
            k[7],
            CONSTANTS[3],
        ]);
        k.zeroize();
        state
    }

    /// Create a state from raw words.
    pub const fn from_words(words: [u32; 16]) -> Self {
        Self(words)
    }

    /// The state words.
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

/// The Salsa20 quarter round.
#[inline(always)]
pub const fn quarter_round(y0: u32, y1: u32, y2: u32, y3: u32) -> (u32, u32, u32, u32) {
    let z1 = y1 ^ y0.wrapping_add(y3).rotate_left(7);
    let z2 = y2 ^ z1.wrapping_add(y0).rotate_left(9);
    let z3 = y3 ^ z2.wrapping_add(z1).rotate_left(13);
    let z0 = y0 ^ z3.wrapping_add(z2).rotate_left(18);
    (z0, z1, z2, z3)
}

/// Apply the quarter round to the words at `a`, `b`, `c`, `d`.
#[inline(always)]
fn quarter_round_at(y: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    (y[a], y[b], y[c], y[d]) = quarter_round(y[a], y[b], y[c], y[d]);
}

/// Quarter round on each row, each row starting at its diagonal word.
fn row_round(y: &mut [u32; 16]) {
    quarter_round_at(y, 0, 1, 2, 3);
    quarter_round_at(y, 5, 6, 7, 4);
    quarter_round_at(y, 10, 11, 8, 9);
    quarter_round_at(y, 15, 12, 13, 14);
}

/// Quarter round on each column, each column starting at its diagonal word.
fn column_round(y: &mut [u32; 16]) {
    quarter_round_at(y, 0, 4, 8, 12);
    quarter_round_at(y, 5, 9, 13, 1);
    quarter_round_at(y, 10, 14, 2, 6);
    quarter_round_at(y, 15, 3, 7, 11);
}

/// Run the Salsa20/20 core over `input`: 10 double rounds, then add the input back.
pub fn permute(input: &State) -> State {
    let mut state = input.clone();

    for _ in 0..DOUBLE_ROUNDS {
        column_round(&mut state.0);
        row_round(&mut state.0);
    }

    for (word, original) in state.0.iter_mut().zip(input.0.iter()) {
        *word = word.wrapping_add(*original);
    }

    state
}

/// Generate the 64-byte keystream block for `counter`.
pub fn keystream_block(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    counter: u64,
) -> [u8; BLOCK_SIZE] {
    permute(&State::init(key, nonce, counter)).to_bytes()
}

/// XOR `buffer` in-place with the keystream starting at block `initial_counter`.
///
/// # Panics
///
/// If the 64-bit block counter would wrap.
pub fn apply_keystream(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    initial_counter: u64,
    buffer: &mut [u8],
) {
    let blocks = (buffer.len() as u64).div_ceil(BLOCK_SIZE as u64);
    assert!(
        blocks == 0 || initial_counter.checked_add(blocks - 1).is_some(),
        "Salsa20 block counter would overflow"
    );

    let mut counter = initial_counter;
    for chunk in buffer.chunks_mut(BLOCK_SIZE) {
        let keystream = Zeroizing::new(keystream_block(key, nonce, counter));
        for (byte, k) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= k;
        }
        counter = counter.wrapping_add(1);
    }
}
