//! Padding: block padding for AES, OAEP for RSA.
//!
//! The AES schemes always add at least one byte, so an aligned message gains
//! a full block ([`crate::aes::padded_size`]).
//!
//! - PKCS #7 (RFC 5652, 6.3): `k` bytes of value `k`.
//! - ISO/IEC 9797-1, method 2: `0x80` followed by zeros.
//! - ANSI X9.23 (random variant): random bytes, the last one is `k`.
//!
//! Stripping ANSI X9.23 only validates the final byte and leaves the length
//! unchanged; the caller keeps track of the message length with this scheme.
//!
//! OAEP here is a salted double-masking scheme with a 16 byte salt, not the
//! RSAES-OAEP encoding of RFC 8017. There is no label hash and no `0x01`
//! separator: the message ends where the zero padding starts, so messages
//! with trailing zero bytes do not survive a roundtrip intact.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::aes::{padded_size, BLOCK_SIZE};
use crate::sha256::{self, xor_mgf1, Sha256};
use crate::{Error, Result};

pub const OAEP_SALT_SIZE: usize = 16;

/// Encoded size for a modulus of `modulus_len` bytes, which is the modulus size.
pub const fn oaep_padded_size(modulus_len: usize) -> usize {
    modulus_len
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scheme {
    Pkcs7,
    IsoM2,
    AnsiX923,
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Pkcs7
    }
}

/// Pad `msg` into `out`, returning the padded length.
pub fn pad(msg: &[u8], out: &mut [u8], scheme: Scheme, rng: impl CryptoRng + RngCore) -> Result<usize> {
    if out.len() < padded_size(msg.len()) {
        return Err(Error::BufferTooSmall);
    }
    out[..msg.len()].copy_from_slice(msg);
    pad_in_place(out, msg.len(), scheme, rng)
}

/// Pad the message `buf[..len]` in place, returning the padded length.
pub fn pad_in_place(buf: &mut [u8], len: usize, scheme: Scheme, rng: impl CryptoRng + RngCore) -> Result<usize> {
    // also keeps `padded_size` from overflowing
    if len >= buf.len() {
        return Err(Error::BufferTooSmall);
    }
    let padded_len = padded_size(len);
    if buf.len() < padded_len {
        return Err(Error::BufferTooSmall);
    }
    // 1..=BLOCK_SIZE
    let k = padded_len - len;
    let padding = &mut buf[len..padded_len];

    match scheme {
        Scheme::Pkcs7 => padding.fill(k as u8),
        Scheme::IsoM2 => {
            padding.fill(0);
            padding[0] = 0x80;
        }
        Scheme::AnsiX923 => {
            let mut rng = rng;
            rng.fill_bytes(&mut padding[..k - 1]);
            padding[k - 1] = k as u8;
        }
    }
    Ok(padded_len)
}

fn check_padded(padded: &[u8]) -> Result<()> {
    if padded.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    crate::aes::check_aligned(padded.len())
}

/// Length of the message inside `padded`, after validating the padding.
///
/// For [`Scheme::AnsiX923`] this is the padded length itself.
pub fn unpadded_len(padded: &[u8], scheme: Scheme) -> Result<usize> {
    check_padded(padded)?;
    let last_block = &padded[padded.len() - BLOCK_SIZE..];
    let k = last_block[BLOCK_SIZE - 1];

    let len = match scheme {
        Scheme::Pkcs7 => {
            // inspect the whole block regardless of k
            let mut valid = (1..=BLOCK_SIZE as u8).contains(&k);
            for (i, &byte) in last_block.iter().enumerate() {
                let in_padding = BLOCK_SIZE - i <= k as usize;
                valid &= !in_padding | (byte == k);
            }
            valid.then(|| padded.len() - k as usize)
        }
        Scheme::IsoM2 => last_block
            .iter()
            .rposition(|&byte| byte != 0)
            .filter(|&i| last_block[i] == 0x80)
            .map(|i| padded.len() - BLOCK_SIZE + i),
        Scheme::AnsiX923 => (1..=BLOCK_SIZE as u8).contains(&k).then(|| padded.len()),
    };

    len.ok_or_else(|| {
        warn!("padding: invalid {:?} padding", scheme);
        Error::InvalidPadding
    })
}

/// Strip the padding of `padded` into `out`, returning the message length.
pub fn strip(padded: &[u8], out: &mut [u8], scheme: Scheme) -> Result<usize> {
    let len = unpadded_len(padded, scheme)?;
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }
    out[..len].copy_from_slice(&padded[..len]);
    Ok(len)
}

/// Strip the padding of `buf` in place, clearing it; returns the message length.
pub fn strip_in_place(buf: &mut [u8], scheme: Scheme) -> Result<usize> {
    let len = unpadded_len(buf, scheme)?;
    buf[len..].zeroize();
    Ok(len)
}

/// ## Salted OAEP
/// ```ignore
/// __________________________________________________________________
///
///           +-----------+------------------------+----------+
///           |  message  |  00 00 ... 00 (zeros)  |   salt   |
///           +-----------+------------------------+----------+
///                              |                       |
///                             xor <------- MGF1 -------|
///                              |                       |
///                              |-------- SHA-256       |
///                              |            |          |
///                              |           MGF1 -----> xor
///                              V                       V
///           +------------------------------------+----------+
///     EM =  |             masked DB              |  m. salt |
///           +------------------------------------+----------+
/// __________________________________________________________________
/// ```
///
/// `out.len()` is the modulus length; the whole buffer is written.
pub fn oaep_encode(msg: &[u8], out: &mut [u8], rng: impl CryptoRng + RngCore) -> Result<()> {
    // 1. room for at least the salt and one byte
    let em_len = out.len();
    if em_len <= OAEP_SALT_SIZE {
        return Err(Error::TooShort);
    }
    let db_len = em_len - OAEP_SALT_SIZE;
    if msg.len() > db_len {
        return Err(Error::MessageTooLong);
    }

    // 2. DB = message || zeros
    let (data_block, salt) = out.split_at_mut(db_len);
    data_block[..msg.len()].copy_from_slice(msg);
    data_block[msg.len()..].fill(0);

    // 3. salt
    let mut rng = rng;
    rng.fill_bytes(salt);

    // 4. maskedDB
    let mut hasher = Sha256::new();
    xor_mgf1(&mut hasher, salt, data_block);

    // 5. masked salt
    let mut db_hash = sha256::hash(data_block);
    xor_mgf1(&mut hasher, &db_hash, salt);
    db_hash.zeroize();

    Ok(())
}

/// Decode `encoded` into `out`, returning the message length.
///
/// `out` needs room for everything but the salt.
pub fn oaep_decode(encoded: &[u8], out: &mut [u8]) -> Result<usize> {
    if encoded.len() <= OAEP_SALT_SIZE {
        return Err(Error::TooShort);
    }
    let db_len = encoded.len() - OAEP_SALT_SIZE;
    if out.len() < db_len {
        return Err(Error::BufferTooSmall);
    }
    let (masked_db, masked_salt) = encoded.split_at(db_len);

    // 1. salt
    let mut salt = [0u8; OAEP_SALT_SIZE];
    salt.copy_from_slice(masked_salt);
    let mut hasher = Sha256::new();
    let mut db_hash = sha256::hash(masked_db);
    xor_mgf1(&mut hasher, &db_hash, &mut salt);
    db_hash.zeroize();

    // 2. DB
    let data_block = &mut out[..db_len];
    data_block.copy_from_slice(masked_db);
    xor_mgf1(&mut hasher, &salt, data_block);
    salt.zeroize();

    // 3. message ends at the last non-zero byte
    Ok(message_len(data_block))
}

/// Decode `buf` in place, leaving the message in `buf[..len]` and zeros after it.
pub fn oaep_decode_in_place(buf: &mut [u8]) -> Result<usize> {
    if buf.len() <= OAEP_SALT_SIZE {
        return Err(Error::TooShort);
    }
    let db_len = buf.len() - OAEP_SALT_SIZE;
    let (data_block, salt) = buf.split_at_mut(db_len);

    let mut hasher = Sha256::new();
    let mut db_hash = sha256::hash(data_block);
    xor_mgf1(&mut hasher, &db_hash, salt);
    db_hash.zeroize();

    xor_mgf1(&mut hasher, salt, data_block);
    salt.zeroize();

    Ok(message_len(data_block))
}

fn message_len(data_block: &[u8]) -> usize {
    data_block.iter().rposition(|&byte| byte != 0).map_or(0, |i| i + 1)
}
