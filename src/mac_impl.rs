//! # Poly1305 one-time authenticator
//!
//! Poly1305 evaluates the message as a polynomial over GF(2^130 - 5) at the secret point `r`,
//! then masks the result with the secret `s`. A key must authenticate exactly one message.
//!
//! # Field arithmetic
//!
//! The accumulator and `r` are held in five 26-bit limbs, so limb products fit in 64 bits and
//! the sum of five of them never overflows. Reduction uses `2^130 = 5 (mod p)`: everything that
//! carries out of the top limb is multiplied by 5 and folded back into the bottom limb. The
//! accumulator is only fully reduced once, when the tag is produced.
//!
//! # Usage
//!
//! ```
//! use chacha_poly::{mac, Poly1305};
//!
//! let key = [7u8; 32];
//!
//! // One-shot.
//! let tag = mac(b"Hello, World!", &key);
//!
//! // Incremental.
//! let mut poly = Poly1305::new(&key);
//! poly.update(b"Hello, ");
//! poly.update(b"World!");
//!
//! assert_eq!(poly.finalize(), tag);
//! ```

use crate::aead_impl::{AuthenticationFailed, Tag};
use crate::{KEY_SIZE, MAC_BLOCK_SIZE, TAG_SIZE};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Low 26 bits.
const LIMB_MASK: u32 = 0x03ff_ffff;

/// The appended 0x01 byte of a full block, as seen from the top limb (2^128 = 2^(104 + 24)).
const HIBIT: u32 = 1 << 24;

#[inline(always)]
fn load_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline(always)]
fn mul(a: u32, b: u32) -> u64 {
    u64::from(a) * u64::from(b)
}

/// Clamp the multiplier `r`.
///
/// Clears the top four bits of bytes 3, 7, 11 and 15 and the bottom two bits of bytes 4, 8
/// and 12.
pub fn clamp(r: &mut [u8; 16]) {
    r[3] &= 0x0f;
    r[7] &= 0x0f;
    r[11] &= 0x0f;
    r[15] &= 0x0f;
    r[4] &= 0xfc;
    r[8] &= 0xfc;
    r[12] &= 0xfc;
}

/// Absorb one 16-byte block: `h = (h + block + hibit * 2^104) * r mod p` (partially reduced).
fn compute_block(h: &mut [u32; 5], r: &[u32; 5], block: &[u8], hibit: u32) {
    h[0] += load_u32(block, 0) & LIMB_MASK;
    h[1] += (load_u32(block, 3) >> 2) & LIMB_MASK;
    h[2] += (load_u32(block, 6) >> 4) & LIMB_MASK;
    h[3] += (load_u32(block, 9) >> 6) & LIMB_MASK;
    h[4] += (load_u32(block, 12) >> 8) | hibit;

    let [r0, r1, r2, r3, r4] = *r;
    let [s1, s2, s3, s4] = [r1 * 5, r2 * 5, r3 * 5, r4 * 5];
    let [h0, h1, h2, h3, h4] = *h;

    let d0 = mul(h0, r0) + mul(h1, s4) + mul(h2, s3) + mul(h3, s2) + mul(h4, s1);
    let mut d1 = mul(h0, r1) + mul(h1, r0) + mul(h2, s4) + mul(h3, s3) + mul(h4, s2);
    let mut d2 = mul(h0, r2) + mul(h1, r1) + mul(h2, r0) + mul(h3, s4) + mul(h4, s3);
    let mut d3 = mul(h0, r3) + mul(h1, r2) + mul(h2, r1) + mul(h3, r0) + mul(h4, s4);
    let mut d4 = mul(h0, r4) + mul(h1, r3) + mul(h2, r2) + mul(h3, r1) + mul(h4, r0);

    // Carry propagation, the top carry wraps around times 5.
    let mut c = d0 >> 26;
    h[0] = d0 as u32 & LIMB_MASK;
    d1 += c;
    c = d1 >> 26;
    h[1] = d1 as u32 & LIMB_MASK;
    d2 += c;
    c = d2 >> 26;
    h[2] = d2 as u32 & LIMB_MASK;
    d3 += c;
    c = d3 >> 26;
    h[3] = d3 as u32 & LIMB_MASK;
    d4 += c;
    c = d4 >> 26;
    h[4] = d4 as u32 & LIMB_MASK;

    h[0] += c as u32 * 5;
    let c = h[0] >> 26;
    h[0] &= LIMB_MASK;
    h[1] += c;
}

/// Fully reduce `h` modulo 2^130 - 5 and add `s` modulo 2^128.
fn finish(h: &[u32; 5], s: &[u32; 4]) -> Tag {
    let [mut h0, mut h1, mut h2, mut h3, mut h4] = *h;

    let mut c = h1 >> 26;
    h1 &= LIMB_MASK;
    h2 += c;
    c = h2 >> 26;
    h2 &= LIMB_MASK;
    h3 += c;
    c = h3 >> 26;
    h3 &= LIMB_MASK;
    h4 += c;
    c = h4 >> 26;
    h4 &= LIMB_MASK;
    h0 += c * 5;
    c = h0 >> 26;
    h0 &= LIMB_MASK;
    h1 += c;

    // g = h - p = h + 5 - 2^130
    let mut g0 = h0 + 5;
    c = g0 >> 26;
    g0 &= LIMB_MASK;
    let mut g1 = h1 + c;
    c = g1 >> 26;
    g1 &= LIMB_MASK;
    let mut g2 = h2 + c;
    c = g2 >> 26;
    g2 &= LIMB_MASK;
    let mut g3 = h3 + c;
    c = g3 >> 26;
    g3 &= LIMB_MASK;
    let mut g4 = (h4 + c).wrapping_sub(1 << 26);

    // Select g when h >= p, i.e. when g did not borrow; without branching.
    let select_g = (g4 >> 31).wrapping_sub(1);
    g0 &= select_g;
    g1 &= select_g;
    g2 &= select_g;
    g3 &= select_g;
    g4 &= select_g;
    let select_h = !select_g;
    h0 = (h0 & select_h) | g0;
    h1 = (h1 & select_h) | g1;
    h2 = (h2 & select_h) | g2;
    h3 = (h3 & select_h) | g3;
    h4 = (h4 & select_h) | g4;

    // Repack into 4x32 bits, dropping everything above 2^128.
    let words = [
        h0 | (h1 << 26),
        (h1 >> 6) | (h2 << 20),
        (h2 >> 12) | (h3 << 14),
        (h3 >> 18) | (h4 << 8),
    ];

    // + s, carries past 2^128 are discarded.
    let mut tag = [0u8; TAG_SIZE];
    let mut carry = 0u64;
    for (i, (word, pad)) in words.iter().zip(s.iter()).enumerate() {
        let sum = u64::from(*word) + u64::from(*pad) + carry;
        tag[i * 4..i * 4 + 4].copy_from_slice(&(sum as u32).to_le_bytes());
        carry = sum >> 32;
    }
    tag
}

/// Compute the Poly1305 tag of `message` under the one-time `key`.
///
/// # Example
///
/// ```
/// use chacha_poly::mac;
///
/// // An all-zero `r` leaves only `s` in the tag.
/// let mut key = [0u8; 32];
/// key[16..].copy_from_slice(&[0xab; 16]);
/// assert_eq!(mac(b"anything", &key), [0xab; 16]);
/// ```
pub fn mac(message: &[u8], key: &[u8; KEY_SIZE]) -> Tag {
    let mut poly = Poly1305::new(key);
    poly.update(message);
    poly.finalize()
}

/// Poly1305 state for incremental authentication.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Poly1305 {
    /// Clamped multiplier, 5x26 bits.
    r: [u32; 5],
    /// Final additive mask, 4x32 bits.
    s: [u32; 4],
    /// Accumulator, 5x26 bits (partially reduced).
    h: [u32; 5],
    buffer: [u8; MAC_BLOCK_SIZE],
    buffer_len: usize,
}

impl Poly1305 {
    /// Create a new authenticator from a one-time key (`r || s`).
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        let mut r = [0u8; 16];
        r.copy_from_slice(&key[..16]);
        clamp(&mut r);

        let limbs = [
            load_u32(&r, 0) & LIMB_MASK,
            (load_u32(&r, 3) >> 2) & LIMB_MASK,
            (load_u32(&r, 6) >> 4) & LIMB_MASK,
            (load_u32(&r, 9) >> 6) & LIMB_MASK,
            load_u32(&r, 12) >> 8,
        ];
        r.zeroize();

        Self {
            r: limbs,
            s: [
                load_u32(key, 16),
                load_u32(key, 20),
                load_u32(key, 24),
                load_u32(key, 28),
            ],
            h: [0; 5],
            buffer: [0u8; MAC_BLOCK_SIZE],
            buffer_len: 0,
        }
    }

    /// Update the authenticator with more message data.
    pub fn update(&mut self, mut data: &[u8]) {
        // Top up a partially filled block first.
        if self.buffer_len > 0 {
            let available = data.len().min(MAC_BLOCK_SIZE - self.buffer_len);
            self.buffer[self.buffer_len..self.buffer_len + available]
                .copy_from_slice(&data[..available]);
            self.buffer_len += available;
            data = &data[available..];

            if self.buffer_len < MAC_BLOCK_SIZE {
                return;
            }
            compute_block(&mut self.h, &self.r, &self.buffer, HIBIT);
            self.buffer_len = 0;
        }

        let mut iter = data.chunks_exact(MAC_BLOCK_SIZE);
        for chunk in &mut iter {
            compute_block(&mut self.h, &self.r, chunk, HIBIT);
        }

        let remainder = iter.remainder();
        self.buffer[..remainder.len()].copy_from_slice(remainder);
        self.buffer_len = remainder.len();
    }

    /// Zero-pad buffered data to a full block and absorb it.
    ///
    /// Used by the AEAD framing, where each section is padded to 16 bytes.
    pub(crate) fn pad(&mut self) {
        if self.buffer_len > 0 {
            self.buffer[self.buffer_len..].fill(0);
            compute_block(&mut self.h, &self.r, &self.buffer, HIBIT);
            self.buffer_len = 0;
        }
    }

    /// Absorb the final partial block, if any, and compute the tag.
    pub(crate) fn finalize_mut(&mut self) -> Tag {
        if self.buffer_len > 0 {
            // The 0x01 marker sits right after the data, it is not a full-block padding.
            self.buffer[self.buffer_len] = 1;
            self.buffer[self.buffer_len + 1..].fill(0);
            compute_block(&mut self.h, &self.r, &self.buffer, 0);
            self.buffer_len = 0;
        }

        finish(&self.h, &self.s)
    }

    /// Finalize and return the tag.
    pub fn finalize(mut self) -> Tag {
        self.finalize_mut()
    }

    /// Finalize and compare against `expected` in constant time.
    pub fn verify(mut self, expected: &Tag) -> Result<(), AuthenticationFailed> {
        let computed = self.finalize_mut();
        if computed[..].ct_eq(&expected[..]).into() {
            Ok(())
        } else {
            Err(AuthenticationFailed)
        }
    }
}
