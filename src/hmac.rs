//! HMAC-SHA-256 ([RFC 2104][rfc2104]), the pseudorandom function of PBKDF2.
//!
//! [rfc2104]: https://tools.ietf.org/html/rfc2104

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::compare_digest;
use crate::sha256::{self, Sha256, BLOCK_SIZE, DIGEST_SIZE};

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Keyed HMAC state.
///
/// Both inner and outer hashes have absorbed their padded key block,
/// so cloning a fresh `Hmac` is cheap compared to re-keying.
/// Both are wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Hmac {
    inner: Sha256,
    outer: Sha256,
}

impl Hmac {
    /// Keys longer than one block are hashed first.
    pub fn new(key: &[u8]) -> Self {
        let mut block = [0u8; BLOCK_SIZE];
        if key.len() > BLOCK_SIZE {
            block[..DIGEST_SIZE].copy_from_slice(&sha256::hash(key));
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let mut padded = [0u8; BLOCK_SIZE];
        let mut inner = Sha256::new();
        for (p, k) in padded.iter_mut().zip(block.iter()) {
            *p = k ^ IPAD;
        }
        inner.update(&padded);

        let mut outer = Sha256::new();
        for (p, k) in padded.iter_mut().zip(block.iter()) {
            *p = k ^ OPAD;
        }
        outer.update(&padded);

        block.zeroize();
        padded.zeroize();
        Self { inner, outer }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(mut self) -> [u8; DIGEST_SIZE] {
        let mut inner_hash = core::mem::take(&mut self.inner).finalize();
        let mut outer = core::mem::take(&mut self.outer);
        outer.update(&inner_hash);
        inner_hash.zeroize();
        outer.finalize()
    }

    /// Constant-time check of `tag` against the MAC of everything absorbed so far.
    pub fn verify(self, tag: &[u8]) -> bool {
        compare_digest(&self.finalize(), tag)
    }
}

/// One-shot HMAC-SHA-256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut mac = Hmac::new(key);
    mac.update(data);
    mac.finalize()
}
