//! # RustCrypto AEAD trait implementation
//!
//! This module provides implementations of the RustCrypto `aead` traits for ChaCha20-Poly1305.

use crate::{BLOCK_SIZE, KEY_SIZE, NONCE_SIZE, TAG_SIZE, decrypt_in_place, encrypt_in_place};
use aead::generic_array::GenericArray;
use aead::{
    AeadCore, AeadInPlace, Error, KeyInit, KeySizeUser,
    consts::{U12, U16, U32},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Longest message the block counter can cover: counters 1 to 2^32 - 1.
const MAX_MESSAGE_SIZE: u64 = ((1 << 32) - 1) * BLOCK_SIZE as u64;

/// ChaCha20-Poly1305 (RFC 8439) cipher implementing RustCrypto traits.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20Poly1305 {
    key: [u8; KEY_SIZE],
}

impl KeySizeUser for ChaCha20Poly1305 {
    type KeySize = U32;
}

impl KeyInit for ChaCha20Poly1305 {
    fn new(key: &GenericArray<u8, Self::KeySize>) -> Self {
        let mut s = Self {
            key: [0u8; KEY_SIZE],
        };
        s.key.copy_from_slice(key.as_slice());
        s
    }
}

impl AeadCore for ChaCha20Poly1305 {
    type NonceSize = U12;
    type TagSize = U16;
    type CiphertextOverhead = aead::consts::U0;
}

/// Borrow a `GenericArray` nonce as a built-in array.
#[inline(always)]
const fn ga_nonce_to_array(
    nonce: &GenericArray<u8, <ChaCha20Poly1305 as AeadCore>::NonceSize>,
) -> &[u8; NONCE_SIZE] {
    // SAFETY: `GenericArray<T, N>` is `#[repr(transparent)]` over `[T; N]`, so both references
    // point at the same 12 bytes with the same lifetime. `mem::transmute` refuses to compile if
    // the sizes ever differ.
    unsafe { core::mem::transmute(nonce) }
}

/// Borrow a `GenericArray` tag as a built-in array.
#[inline(always)]
const fn ga_tag_to_array(
    tag: &GenericArray<u8, <ChaCha20Poly1305 as AeadCore>::TagSize>,
) -> &[u8; TAG_SIZE] {
    // SAFETY: as for `ga_nonce_to_array`, over 16 bytes.
    unsafe { core::mem::transmute(tag) }
}

/// Reject messages the 32-bit block counter cannot cover, instead of panicking in the core.
#[inline(always)]
fn check_length(buffer: &[u8]) -> Result<(), Error> {
    if buffer.len() as u64 > MAX_MESSAGE_SIZE {
        return Err(Error);
    }
    Ok(())
}

impl AeadInPlace for ChaCha20Poly1305 {
    #[inline]
    fn encrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> Result<GenericArray<u8, Self::TagSize>, Error> {
        check_length(buffer)?;

        let tag = encrypt_in_place(&self.key, ga_nonce_to_array(nonce), associated_data, buffer);

        Ok(GenericArray::from(tag))
    }

    #[inline]
    fn decrypt_in_place_detached(
        &self,
        nonce: &GenericArray<u8, Self::NonceSize>,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &GenericArray<u8, Self::TagSize>,
    ) -> Result<(), Error> {
        check_length(buffer)?;

        decrypt_in_place(
            &self.key,
            ga_nonce_to_array(nonce),
            associated_data,
            buffer,
            ga_tag_to_array(tag),
        )
        .map_err(|_| Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aead::AeadInPlace;

    #[test]
    fn aead_roundtrip() {
        let key = GenericArray::from([1u8; 32]);
        let cipher = ChaCha20Poly1305::new(&key);

        let nonce = GenericArray::from([2u8; 12]);
        let plaintext = *b"Hello, RustCrypto AEAD!";
        let aad = b"associated data";

        let mut ciphertext = plaintext;
        let tag = cipher
            .encrypt_in_place_detached(&nonce, aad, &mut ciphertext)
            .expect("encryption failed");

        cipher
            .decrypt_in_place_detached(&nonce, aad, &mut ciphertext, &tag)
            .expect("decryption failed");

        assert_eq!(&ciphertext, b"Hello, RustCrypto AEAD!");
    }

    #[test]
    fn aead_matches_free_functions() {
        let key = [42u8; 32];
        let nonce = [99u8; 12];
        let aad = b"metadata";

        let cipher = ChaCha20Poly1305::new(&GenericArray::from(key));
        let mut via_trait = *b"In-place test!  ";
        let tag = cipher
            .encrypt_in_place_detached(&GenericArray::from(nonce), aad, &mut via_trait)
            .expect("encryption failed");

        let mut via_function = *b"In-place test!  ";
        let expected_tag = encrypt_in_place(&key, &nonce, aad, &mut via_function);

        assert_eq!(via_trait, via_function);
        assert_eq!(tag.as_slice(), &expected_tag[..]);
    }

    #[test]
    fn aead_wrong_tag() {
        let key = GenericArray::from([1u8; 32]);
        let cipher = ChaCha20Poly1305::new(&key);

        let nonce = GenericArray::from([2u8; 12]);
        let mut buffer = *b"Test message";

        let mut tag = cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .expect("encryption failed");

        // Corrupt the tag
        tag[0] ^= 1;

        let result = cipher.decrypt_in_place_detached(&nonce, b"", &mut buffer, &tag);
        assert!(result.is_err());
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn aead_allocating() {
        use aead::Aead;

        let cipher = ChaCha20Poly1305::new(&GenericArray::from([7u8; 32]));
        let nonce = GenericArray::from([8u8; 12]);

        let ciphertext = cipher.encrypt(&nonce, b"plaintext".as_ref()).expect("encryption failed");
        assert_eq!(ciphertext.len(), 9 + TAG_SIZE);

        let plaintext = cipher.decrypt(&nonce, ciphertext.as_ref()).expect("decryption failed");
        assert_eq!(plaintext, b"plaintext");
    }

    #[test]
    fn max_message_size() {
        assert_eq!(MAX_MESSAGE_SIZE, 274_877_906_880);
    }
}
