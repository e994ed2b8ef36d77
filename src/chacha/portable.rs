//! Portable scalar implementation of the ChaCha20 block function.

use super::{DOUBLE_ROUNDS, State, quarter_round};

/// Apply the quarter round to the words at `a`, `b`, `c`, `d`.
#[inline(always)]
fn quarter_round_at(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    (state[a], state[b], state[c], state[d]) = quarter_round(state[a], state[b], state[c], state[d]);
}

/// Portable implementation of the ChaCha20 block function.
pub(crate) fn chacha20(state: &mut State) {
    let input = state.clone();

    for _ in 0..DOUBLE_ROUNDS {
        // Column round.
        quarter_round_at(&mut state.0, 0, 4, 8, 12);
        quarter_round_at(&mut state.0, 1, 5, 9, 13);
        quarter_round_at(&mut state.0, 2, 6, 10, 14);
        quarter_round_at(&mut state.0, 3, 7, 11, 15);

        // Diagonal round.
        quarter_round_at(&mut state.0, 0, 5, 10, 15);
        quarter_round_at(&mut state.0, 1, 6, 11, 12);
        quarter_round_at(&mut state.0, 2, 7, 8, 13);
        quarter_round_at(&mut state.0, 3, 4, 9, 14);
    }

    for (word, original) in state.0.iter_mut().zip(input.0.iter()) {
        *word = word.wrapping_add(*original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chacha20_block() {
        // RFC 8439, section 2.3.2
        let mut state = State([
            0x61707865, 0x3320646e, 0x79622d32, 0x6b206574, 0x03020100, 0x07060504, 0x0b0a0908,
            0x0f0e0d0c, 0x13121110, 0x17161514, 0x1b1a1918, 0x1f1e1d1c, 0x00000001, 0x09000000,
            0x4a000000, 0x00000000,
        ]);

        chacha20(&mut state);

        let expected = State([
            0xe4e7f110, 0x15593bd1, 0x1fdd0f50, 0xc47120a3, 0xc7f4d1c7, 0x0368c033, 0x9aaa2204,
            0x4e6cd4c3, 0x466482d2, 0x09aa9f07, 0x05d7c214, 0xa2028bd9, 0xd19c12b5, 0xb94e16de,
            0xe883d0cb, 0x4e3c50a2,
        ]);

        assert_eq!(state.0, expected.0);
    }
}
