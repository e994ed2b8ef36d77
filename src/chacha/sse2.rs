//! # ChaCha20 block function - SSE2 SIMD implementation
//!
//! SIMD implementation of the ChaCha20 block function using x86-64 SSE2 intrinsics.
//!
//! The 4x4 state maps to 4 SSE2 vectors, one per row:
//! - Vector a: state[0..4]   (constants)
//! - Vector b: state[4..8]   (key, first half)
//! - Vector c: state[8..12]  (key, second half)
//! - Vector d: state[12..16] (counter and nonce)
//!
//! A column round is then one quarter round over whole vectors. For the diagonal round the rows
//! b, c and d are rotated by 1, 2 and 3 lanes so that the diagonals line up as columns, and
//! rotated back afterwards.

use super::{DOUBLE_ROUNDS, State};
use core::arch::x86_64::*;

/// Lane rotation `[1, 2, 3, 0]`.
const ROTATE_LANES_1: i32 = 0x39;
/// Lane rotation `[2, 3, 0, 1]`.
const ROTATE_LANES_2: i32 = 0x4E;
/// Lane rotation `[3, 0, 1, 2]`.
const ROTATE_LANES_3: i32 = 0x93;

/// Quarter round over all four columns at once.
///
/// # Safety
///
/// Requires SSE2.
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn quarter_round(a: &mut __m128i, b: &mut __m128i, c: &mut __m128i, d: &mut __m128i) {
    // SAFETY: the caller guarantees SSE2 support.
    unsafe {
        // a += b; d ^= a; d <<<= 16
        *a = _mm_add_epi32(*a, *b);
        *d = _mm_xor_si128(*d, *a);
        *d = _mm_or_si128(_mm_slli_epi32(*d, 16), _mm_srli_epi32(*d, 16));

        // c += d; b ^= c; b <<<= 12
        *c = _mm_add_epi32(*c, *d);
        *b = _mm_xor_si128(*b, *c);
        *b = _mm_or_si128(_mm_slli_epi32(*b, 12), _mm_srli_epi32(*b, 20));

        // a += b; d ^= a; d <<<= 8
        *a = _mm_add_epi32(*a, *b);
        *d = _mm_xor_si128(*d, *a);
        *d = _mm_or_si128(_mm_slli_epi32(*d, 8), _mm_srli_epi32(*d, 24));

        // c += d; b ^= c; b <<<= 7
        *c = _mm_add_epi32(*c, *d);
        *b = _mm_xor_si128(*b, *c);
        *b = _mm_or_si128(_mm_slli_epi32(*b, 7), _mm_srli_epi32(*b, 25));
    }
}

/// Apply the ChaCha20 block function using SSE2 SIMD.
///
/// # Safety
///
/// This function requires SSE2 support, which is available on all x86-64 targets.
/// The caller must ensure the code is running on a compatible CPU.
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn chacha20(state: &mut State) {
    // SAFETY: All SSE2 intrinsics are safe to use within this function as we have
    // the target_feature(enable = "sse2") attribute and the caller guarantees SSE2 support.
    unsafe {
        let input_a = _mm_loadu_si128(state.0.as_ptr().add(0) as *const __m128i);
        let input_b = _mm_loadu_si128(state.0.as_ptr().add(4) as *const __m128i);
        let input_c = _mm_loadu_si128(state.0.as_ptr().add(8) as *const __m128i);
        let input_d = _mm_loadu_si128(state.0.as_ptr().add(12) as *const __m128i);

        let mut a = input_a;
        let mut b = input_b;
        let mut c = input_c;
        let mut d = input_d;

        for _ in 0..DOUBLE_ROUNDS {
            // Column round.
            quarter_round(&mut a, &mut b, &mut c, &mut d);

            // Diagonal round: line up (0, 5, 10, 15), (1, 6, 11, 12), ... as columns.
            b = _mm_shuffle_epi32(b, ROTATE_LANES_1);
            c = _mm_shuffle_epi32(c, ROTATE_LANES_2);
            d = _mm_shuffle_epi32(d, ROTATE_LANES_3);

            quarter_round(&mut a, &mut b, &mut c, &mut d);

            b = _mm_shuffle_epi32(b, ROTATE_LANES_3);
            c = _mm_shuffle_epi32(c, ROTATE_LANES_2);
            d = _mm_shuffle_epi32(d, ROTATE_LANES_1);
        }

        // Add the input state back.
        a = _mm_add_epi32(a, input_a);
        b = _mm_add_epi32(b, input_b);
        c = _mm_add_epi32(c, input_c);
        d = _mm_add_epi32(d, input_d);

        _mm_storeu_si128(state.0.as_mut_ptr().add(0) as *mut __m128i, a);
        _mm_storeu_si128(state.0.as_mut_ptr().add(4) as *mut __m128i, b);
        _mm_storeu_si128(state.0.as_mut_ptr().add(8) as *mut __m128i, c);
        _mm_storeu_si128(state.0.as_mut_ptr().add(12) as *mut __m128i, d);
    }
}
