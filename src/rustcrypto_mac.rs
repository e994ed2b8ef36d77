//! # RustCrypto MAC trait implementation
//!
//! This module provides implementations of the RustCrypto `digest` MAC traits for Poly1305, so it
//! can be used through [`digest::Mac`].

use crate::{KEY_SIZE, Poly1305};
use digest::{
    Key, KeyInit, MacMarker, Output, OutputSizeUser,
    block_buffer::Eager,
    consts::{U16, U32},
    core_api::{
        Block, BlockSizeUser, Buffer, BufferKindUser, CoreWrapper, FixedOutputCore, UpdateCore,
    },
    crypto_common::KeySizeUser,
};
use zeroize::Zeroize;

/// Poly1305 core implementing RustCrypto block-level MAC traits.
#[derive(Clone)]
pub struct Poly1305Core {
    poly: Poly1305,
}

impl KeySizeUser for Poly1305Core {
    type KeySize = U32;
}

impl KeyInit for Poly1305Core {
    fn new(key: &Key<Self>) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(key.as_slice());
        let core = Self {
            poly: Poly1305::new(&bytes),
        };
        bytes.zeroize();
        core
    }
}

impl OutputSizeUser for Poly1305Core {
    type OutputSize = U16;
}

impl BlockSizeUser for Poly1305Core {
    type BlockSize = U16;
}

impl BufferKindUser for Poly1305Core {
    type BufferKind = Eager;
}

impl UpdateCore for Poly1305Core {
    #[inline]
    fn update_blocks(&mut self, blocks: &[Block<Self>]) {
        for block in blocks {
            self.poly.update(block.as_slice());
        }
    }
}

impl FixedOutputCore for Poly1305Core {
    #[inline]
    fn finalize_fixed_core(&mut self, buffer: &mut Buffer<Self>, out: &mut Output<Self>) {
        // The eager buffer never holds a full block; what is left is the short final block.
        let pos = buffer.get_pos();
        if pos > 0 {
            let data = buffer.get_data();
            self.poly.update(&data[..pos]);
        }

        out.copy_from_slice(&self.poly.finalize_mut());
    }
}

impl MacMarker for Poly1305Core {}

/// Poly1305 one-time authenticator implementing RustCrypto [`digest::Mac`].
pub type Poly1305Mac = CoreWrapper<Poly1305Core>;
