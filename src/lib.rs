#![cfg_attr(not(test), no_std)]
//! Cryptographic primitives for small devices.
//!
//! - [`sha256`]: streaming SHA-256, MGF1, optionally with a caller-owned scratch region
//! - [`hmac`] and [`pbkdf2`]: HMAC-SHA256 and PBKDF2-HMAC-SHA256
//! - [`aes`]: AES-128/192/256 with CBC, CBC-MAC and authenticated encryption
//! - [`padding`]: PKCS #7, ISO/IEC 9797-1 M2, ANSI X9.23, and salted OAEP for RSA
//! - [`sprng`]: an entropy pool fed by hardware noise
//! - [`encoding`]: base64
//!
//! All operations write into caller-supplied buffers; nothing allocates.
//! Contexts holding secrets are wiped when dropped.
//!
//! Typical authenticated encryption:
//!
//! ```ignore
//! let mut rng = EntropyPool::init(bus)?;
//! let mut keys = [0u8; 32];
//! rng.fill(&mut keys)?;
//! let enc = aes::KeySchedule::new(&keys[..16])?;
//! let mac = aes::KeySchedule::new(&keys[16..])?;
//!
//! let mut buf = [0u8; aes::auth_ciphertext_size(11)];
//! buf[aes::IV_SIZE..][..11].copy_from_slice(b"hello world");
//! let len = padding::pad_in_place(&mut buf[aes::IV_SIZE..], 11, Scheme::Pkcs7, &mut rng)?;
//! let iv = aes::generate_iv(&mut rng);
//! aes::auth::auth_encrypt_in_place(&mut buf, len, &enc, &mac, &iv)?;
//! ```

delog::generate_macros!();

mod error;
pub use error::{Error, Result};
mod compare;
pub use compare::compare_digest;

pub mod aes;
pub mod encoding;
pub mod hmac;
pub mod padding;
pub mod pbkdf2;
pub mod primitive;
pub mod sha256;
pub mod sprng;

pub use aes::{KeySchedule, KeySize};
pub use padding::Scheme;
pub use pbkdf2::pbkdf2;
pub use sha256::Sha256;
pub use sprng::{EntropyPool, NoiseSource};

#[cfg(test)]
mod fixtures;
