extern crate std;
use super::*;
use rand::Rng;
use std::vec;
use std::vec::Vec;

fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let hex: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(core::str::from_utf8(&hex[i..i + 2]).unwrap(), 16).unwrap())
        .collect()
}

const SUNSCREEN: &[u8] = b"Ladies and Gentlemen of the class of '99: If I could offer you only one tip for the future, sunscreen would be it.";

#[test]
fn test_rfc8439_encryption() {
    // RFC 8439, section 2.4.2
    let key: [u8; KEY_SIZE] = core::array::from_fn(|i| i as u8);
    let nonce = [0, 0, 0, 0, 0, 0, 0, 0x4a, 0, 0, 0, 0];

    let expected = hex_to_bytes(
        "6e2e359a2568f98041ba0728dd0d6981
         e97e7aec1d4360c20a27afccfd9fae0b
         f91b65c5524733ab8f593dabcd62b357
         1639d624e65152ab8f530c359f0861d8
         07ca0dbf500d6a6156a38e088a22b65e
         52bc514d16ccf806818ce91ab7793736
         5af90bbf74a35be6b40b8eedf2785e42
         874d",
    );

    let mut buffer = SUNSCREEN.to_vec();
    apply_keystream(&key, &nonce, 1, &mut buffer);

    assert_eq!(buffer, expected);
}

#[test]
fn test_keystream_block_matches_block_function() {
    // RFC 8439, section 2.3.2 serialized block
    let key: [u8; KEY_SIZE] = core::array::from_fn(|i| i as u8);
    let nonce = [0, 0, 0, 0x09, 0, 0, 0, 0x4a, 0, 0, 0, 0];

    let expected = hex_to_bytes(
        "10f1e7e4d13b5915500fdd1fa32071c4
         c7d1f4c733c068030422aa9ac3d46c4e
         d2826446079faa0914c2d705d98b02a2
         b5129cd1de164eb9cbd083e8a2503c4e",
    );

    assert_eq!(keystream_block(&key, &nonce, 1).as_slice(), expected.as_slice());
}

#[test]
fn test_keystream_block_deterministic() {
    let key = [0x42u8; KEY_SIZE];
    let nonce = [0x24u8; NONCE_SIZE];

    assert_eq!(keystream_block(&key, &nonce, 7), keystream_block(&key, &nonce, 7));
    assert_ne!(keystream_block(&key, &nonce, 7), keystream_block(&key, &nonce, 8));
}

#[test]
fn test_apply_keystream_uses_consecutive_blocks() {
    let key = [3u8; KEY_SIZE];
    let nonce = [5u8; NONCE_SIZE];

    let mut buffer = vec![0u8; 3 * BLOCK_SIZE];
    apply_keystream(&key, &nonce, 10, &mut buffer);

    for (i, chunk) in buffer.chunks(BLOCK_SIZE).enumerate() {
        assert_eq!(chunk, keystream_block(&key, &nonce, 10 + i as u32).as_slice());
    }
}

#[test]
fn test_self_inverse_all_lengths() {
    let mut rng = rand::thread_rng();
    let key: [u8; KEY_SIZE] = rng.r#gen();
    let nonce: [u8; NONCE_SIZE] = rng.r#gen();

    for len in 0..=3 * BLOCK_SIZE + 1 {
        let mut original = vec![0u8; len];
        rng.fill(&mut original[..]);

        let mut buffer = original.clone();
        apply_keystream(&key, &nonce, 1, &mut buffer);
        if len >= 16 {
            assert_ne!(buffer, original, "len {len}: keystream left data unchanged");
        }
        apply_keystream(&key, &nonce, 1, &mut buffer);

        assert_eq!(buffer, original, "len {len}: round trip failed");
    }
}

#[test]
fn test_partial_block_is_prefix() {
    let key = [1u8; KEY_SIZE];
    let nonce = [2u8; NONCE_SIZE];

    let mut full = [0u8; BLOCK_SIZE];
    apply_keystream(&key, &nonce, 1, &mut full);

    let mut short = [0u8; 17];
    apply_keystream(&key, &nonce, 1, &mut short);

    assert_eq!(&short[..], &full[..17]);
}

#[cfg(feature = "alloc")]
#[test]
fn test_apply_allocating() {
    let key = [8u8; KEY_SIZE];
    let nonce = [6u8; NONCE_SIZE];

    let ciphertext = apply(&key, &nonce, 1, SUNSCREEN);
    assert_eq!(ciphertext.len(), SUNSCREEN.len());
    assert_eq!(apply(&key, &nonce, 1, &ciphertext), SUNSCREEN);
}

#[test]
fn test_last_counter_value_is_usable() {
    let key = [9u8; KEY_SIZE];
    let nonce = [9u8; NONCE_SIZE];

    let mut buffer = [0u8; BLOCK_SIZE];
    apply_keystream(&key, &nonce, u32::MAX, &mut buffer);

    assert_eq!(buffer, keystream_block(&key, &nonce, u32::MAX));
}

#[test]
#[should_panic(expected = "counter would overflow")]
fn test_counter_overflow_panics() {
    let key = [9u8; KEY_SIZE];
    let nonce = [9u8; NONCE_SIZE];

    let mut buffer = [0u8; BLOCK_SIZE + 1];
    apply_keystream(&key, &nonce, u32::MAX, &mut buffer);
}

#[test]
fn test_counter_overflow_leaves_buffer_untouched() {
    let key = [9u8; KEY_SIZE];
    let nonce = [9u8; NONCE_SIZE];

    let mut buffer = [0xaau8; BLOCK_SIZE + 1];
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        apply_keystream(&key, &nonce, u32::MAX, &mut buffer);
    }));

    assert!(result.is_err());
    assert!(buffer.iter().all(|&b| b == 0xaa));
}

#[test]
fn test_stateful_matches_oneshot_for_random_splits() {
    let mut rng = rand::thread_rng();
    let key: [u8; KEY_SIZE] = rng.r#gen();
    let nonce: [u8; NONCE_SIZE] = rng.r#gen();

    for _ in 0..32 {
        let len = rng.gen_range(0..4 * BLOCK_SIZE);
        let mut data = vec![0u8; len];
        rng.fill(&mut data[..]);

        let mut oneshot = data.clone();
        apply_keystream(&key, &nonce, 1, &mut oneshot);

        let mut cipher = ChaCha20::new(&key, &nonce, 1);
        let mut rest = &mut data[..];
        while !rest.is_empty() {
            let take = rng.gen_range(1..=rest.len());
            let (head, tail) = core::mem::take(&mut rest).split_at_mut(take);
            cipher.apply_keystream(head);
            rest = tail;
        }

        assert_eq!(data, oneshot);
    }
}

#[test]
fn test_stateful_uses_buffered_keystream_at_counter_end() {
    let key = [4u8; KEY_SIZE];
    let nonce = [4u8; NONCE_SIZE];

    let mut cipher = ChaCha20::new(&key, &nonce, u32::MAX);
    let mut head = [0u8; 10];
    let mut tail = [0u8; BLOCK_SIZE - 10];
    cipher.apply_keystream(&mut head);
    // The rest of the last block is still buffered and needs no further counter value.
    cipher.apply_keystream(&mut tail);

    let expected = keystream_block(&key, &nonce, u32::MAX);
    assert_eq!(&head[..], &expected[..10]);
    assert_eq!(&tail[..], &expected[10..]);
}

#[test]
#[should_panic(expected = "counter would overflow")]
fn test_stateful_counter_overflow_panics() {
    let key = [4u8; KEY_SIZE];
    let nonce = [4u8; NONCE_SIZE];

    let mut cipher = ChaCha20::new(&key, &nonce, u32::MAX);
    let mut buffer = [0u8; BLOCK_SIZE];
    cipher.apply_keystream(&mut buffer);
    cipher.apply_keystream(&mut buffer[..1]);
}
