//! The RSA primitive, and OAEP encipherment on top of it.
//!
//! Modular exponentiation is not part of this crate: a key type implements
//! the primitive traits, and [`encrypt_oaep`] / [`decrypt_oaep`] add the
//! padding from [`crate::padding`].

use rand_core::{CryptoRng, RngCore};

use crate::padding::{oaep_decode_in_place, oaep_encode};
use crate::{Error, Result};

pub trait PublicRsaPrimitive {
    /// Byte length of the modulus.
    fn modulus_len(&self) -> usize;

    // or "public operation"
    /// Replace the big-endian integer in `block` (exactly `modulus_len` bytes)
    /// with `block^e mod n`.
    ///
    /// An integer not below the modulus is an error of the implementation's choice.
    fn rsa_primitive(&self, block: &mut [u8]) -> Result<()>;
}

pub trait PrivateRsaPrimitive {
    fn modulus_len(&self) -> usize;

    // or "private operation"
    /// Replace the big-endian integer in `block` with `block^d mod n`.
    fn rsa_primitive(&self, block: &mut [u8]) -> Result<()>;
}

/// OAEP-encode `msg` and encrypt it into `out`, returning the ciphertext length.
pub fn encrypt_oaep<K>(key: &K, msg: &[u8], out: &mut [u8], rng: impl CryptoRng + RngCore) -> Result<usize>
where
    K: PublicRsaPrimitive + ?Sized,
{
    let len = key.modulus_len();
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }
    let block = &mut out[..len];
    oaep_encode(msg, block, rng)?;
    key.rsa_primitive(block)?;
    Ok(len)
}

/// Decrypt `ciphertext` and OAEP-decode it into `out`, returning the message length.
///
/// `out` is used as working space and needs room for the full modulus.
pub fn decrypt_oaep<K>(key: &K, ciphertext: &[u8], out: &mut [u8]) -> Result<usize>
where
    K: PrivateRsaPrimitive + ?Sized,
{
    let len = key.modulus_len();
    if ciphertext.len() != len {
        return Err(Error::DecodingError);
    }
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }
    let block = &mut out[..len];
    block.copy_from_slice(ciphertext);
    key.rsa_primitive(block)?;
    oaep_decode_in_place(block)
}
