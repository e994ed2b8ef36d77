//! # ChaCha20-Poly1305 implementation
//!
//! This module composes the ChaCha20 stream cipher and the Poly1305 authenticator into the
//! ChaCha20-Poly1305 authenticated encryption with associated data (AEAD) construction of
//! RFC 8439.
//!
//! - The Poly1305 key is the first 32 bytes of the keystream block with counter 0.
//! - The data is encrypted with the keystream starting at counter 1.
//! - The tag authenticates `aad || pad16 || ciphertext || pad16 || le64(len(aad)) ||
//!   le64(len(ciphertext))`.
//!
//! # Usage
//!
//! This module provides `no_std`-compatible in-place encryption/decryption:
//!
//! ```
//! use chacha_poly::{encrypt_in_place, decrypt_in_place, KEY_SIZE, NONCE_SIZE};
//!
//! let key = [0u8; KEY_SIZE];
//! let nonce = [1u8; NONCE_SIZE];
//! let mut data = *b"Secret message";
//! let aad = b"public header";
//!
//! // Encrypt in-place.
//! let tag = encrypt_in_place(&key, &nonce, aad, &mut data);
//!
//! // Decrypt in-place with authentication.
//! decrypt_in_place(&key, &nonce, aad, &mut data, &tag)
//!     .expect("authentication failed");
//!
//! assert_eq!(&data, b"Secret message");
//! ```
//!
//! For allocating APIs with separate input/output buffers, use [`seal`] / [`open`] or the
//! RustCrypto [`Aead`](aead::Aead) trait on [`ChaCha20Poly1305`](crate::ChaCha20Poly1305).
//!
//! A nonce must never be reused with the same key. Doing so reveals the XOR of the plaintexts
//! and the Poly1305 key, after which tags can be forged.

use crate::mac_impl::Poly1305;
use crate::stream_impl::{apply_keystream, keystream_block};
use crate::{FIRST_DATA_COUNTER, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Authentication tag (16 bytes).
pub type Tag = [u8; TAG_SIZE];

/// Authentication tag verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationFailed;

impl core::fmt::Display for AuthenticationFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("authentication failed")
    }
}

impl core::error::Error for AuthenticationFailed {}

/// Derive the one-time Poly1305 key for `(key, nonce)`.
///
/// This is the first half of the keystream block with counter 0; the second half is discarded.
/// The returned key is wiped when dropped.
pub fn poly1305_key_gen(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Zeroizing<[u8; KEY_SIZE]> {
    let block = Zeroizing::new(keystream_block(key, nonce, 0));
    let mut one_time_key = Zeroizing::new([0u8; KEY_SIZE]);
    one_time_key.copy_from_slice(&block[..KEY_SIZE]);
    one_time_key
}

/// Compute the tag over the AEAD framing of `associated_data` and `ciphertext`.
fn compute_tag(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    associated_data: &[u8],
    ciphertext: &[u8],
) -> Tag {
    let one_time_key = poly1305_key_gen(key, nonce);
    let mut poly = Poly1305::new(&one_time_key);

    poly.update(associated_data);
    poly.pad();
    poly.update(ciphertext);
    poly.pad();

    let mut lengths = [0u8; 16];
    lengths[..8].copy_from_slice(&(associated_data.len() as u64).to_le_bytes());
    lengths[8..].copy_from_slice(&(ciphertext.len() as u64).to_le_bytes());
    poly.update(&lengths);

    poly.finalize()
}

/// Encrypt plaintext using ChaCha20-Poly1305 (in-place)
///
/// Encrypts the data in `buffer` in-place and returns the authentication tag.
/// The buffer contains plaintext on input and ciphertext on output.
///
/// # Panics
///
/// If `buffer` is longer than the 32-bit block counter can cover (about 256 GiB).
#[must_use]
pub fn encrypt_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    associated_data: &[u8],
    buffer: &mut [u8],
) -> Tag {
    apply_keystream(key, nonce, FIRST_DATA_COUNTER, buffer);
    compute_tag(key, nonce, associated_data, buffer)
}

/// Decrypt ciphertext using ChaCha20-Poly1305 (in-place)
///
/// The tag is checked before any byte is decrypted. On failure `buffer` still holds the
/// unmodified ciphertext; on success it holds the plaintext.
///
/// # Panics
///
/// If `buffer` is longer than the 32-bit block counter can cover (about 256 GiB).
pub fn decrypt_in_place(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    associated_data: &[u8],
    buffer: &mut [u8],
    tag: &Tag,
) -> Result<(), AuthenticationFailed> {
    let expected = compute_tag(key, nonce, associated_data, buffer);

    // Verify tag using constant-time comparison.
    if expected[..].ct_eq(&tag[..]).into() {
        apply_keystream(key, nonce, FIRST_DATA_COUNTER, buffer);
        Ok(())
    } else {
        Err(AuthenticationFailed)
    }
}

/// Encrypt `plaintext`, returning the ciphertext and the detached tag.
///
/// # Example
///
/// ```
/// use chacha_poly::{open, seal};
///
/// let key = [3u8; 32];
/// let nonce = [4u8; 12];
///
/// let (ciphertext, tag) = seal(&key, &nonce, b"attack at dawn", b"header");
/// let plaintext = open(&key, &nonce, &ciphertext, &tag, b"header").unwrap();
///
/// assert_eq!(plaintext, b"attack at dawn");
/// ```
///
/// # Panics
///
/// If `plaintext` is longer than the 32-bit block counter can cover (about 256 GiB).
#[cfg(feature = "alloc")]
pub fn seal(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
    associated_data: &[u8],
) -> (Vec<u8>, Tag) {
    let mut ciphertext = plaintext.to_vec();
    let tag = encrypt_in_place(key, nonce, associated_data, &mut ciphertext);
    (ciphertext, tag)
}

/// Authenticate and decrypt `ciphertext`.
///
/// No plaintext is produced unless the tag verifies.
///
/// # Panics
///
/// If `ciphertext` is longer than the 32-bit block counter can cover (about 256 GiB).
#[cfg(feature = "alloc")]
pub fn open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    tag: &Tag,
    associated_data: &[u8],
) -> Result<Vec<u8>, AuthenticationFailed> {
    let mut plaintext = ciphertext.to_vec();
    decrypt_in_place(key, nonce, associated_data, &mut plaintext, tag)?;
    Ok(plaintext)
}
