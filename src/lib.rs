#![no_std]
#![doc = include_str!("../README.md")]

#[cfg(feature = "alloc")]
extern crate alloc;

mod aead_impl;
mod chacha;
mod mac_impl;
mod stream_impl;

mod rustcrypto_aead;
mod rustcrypto_mac;

pub mod salsa;

pub use aead_impl::{AuthenticationFailed, Tag, decrypt_in_place, encrypt_in_place, poly1305_key_gen};
#[cfg(feature = "alloc")]
pub use aead_impl::{open, seal};
pub use chacha::{State, permute, quarter_round};
#[doc(hidden)]
pub use chacha::bench;
pub use mac_impl::{Poly1305, clamp, mac};
#[cfg(feature = "alloc")]
pub use stream_impl::apply;
pub use stream_impl::{ChaCha20, apply_keystream, keystream_block};
pub use rustcrypto_aead::ChaCha20Poly1305;
pub use rustcrypto_mac::Poly1305Mac;

pub use aead::{self, AeadInPlace, KeyInit}; // For `ChaCha20Poly1305` users
pub use digest::{self, Mac}; // For `Poly1305Mac` users

/// ChaCha20 keystream block size in bytes (16 u32 words).
pub const BLOCK_SIZE: usize = 64;

/// ChaCha20 nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// ChaCha20 and Poly1305 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Poly1305 message block size in bytes.
const MAC_BLOCK_SIZE: usize = 16;

/// Block counter used for the first block of AEAD ciphertext; counter 0 derives the Poly1305 key.
const FIRST_DATA_COUNTER: u32 = 1;
