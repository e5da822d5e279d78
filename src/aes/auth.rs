//! Authenticated encryption: AES-CBC, then CBC-MAC over IV and ciphertext.
//!
//! ```ignore
//! __________________________________________________________________
//!
//!           +------+-------------------------------+------+
//!  output = |  IV  |  CBC(enc, IV, padded message) | MAC  |
//!           +------+-------------------------------+------+
//!           |<------------- CBC-MAC(mac) -------->|
//! __________________________________________________________________
//! ```
//!
//! Decryption checks the MAC before a single plaintext byte is written.
//!
//! The encryption and MAC schedules must come from independent keys.
//! Passing the same key twice is caught ([`Error::KeyReuse`]), related keys
//! are not: deriving both keys correctly remains the caller's job.

use core::ops::Range;

use ref_cast::RefCast;

use super::{cbc, check_aligned, mac::CbcMac, Block, KeySchedule, IV_SIZE, MAC_SIZE};
use crate::{Error, Result};

/// Bytes added to the padded message: IV in front, MAC at the end.
pub const OVERHEAD: usize = IV_SIZE + MAC_SIZE;

/// Validated view of an `IV || C || MAC` envelope.
#[derive(Debug, Eq, PartialEq, RefCast)]
#[repr(transparent)]
pub struct AuthCiphertext([u8]);

impl AuthCiphertext {
    /// At least one ciphertext block is required.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        check_aligned(bytes.len())?;
        if bytes.len() <= OVERHEAD {
            return Err(Error::TooShort);
        }
        Ok(Self::ref_cast(bytes))
    }

    pub fn iv(&self) -> Block {
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&self.0[..IV_SIZE]);
        iv
    }

    /// The ciphertext blocks.
    pub fn body(&self) -> &[u8] {
        &self.0[IV_SIZE..self.0.len() - MAC_SIZE]
    }

    pub fn mac(&self) -> &[u8] {
        &self.0[self.0.len() - MAC_SIZE..]
    }

    /// IV and ciphertext, the input of the MAC.
    pub fn authenticated(&self) -> &[u8] {
        &self.0[..self.0.len() - MAC_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the plaintext this envelope decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.0.len() - OVERHEAD
    }

    pub fn verify(&self, mac: &KeySchedule) -> Result<()> {
        let mut cbc_mac = CbcMac::new(mac);
        cbc_mac.update(self.authenticated())?;
        cbc_mac.verify(self.mac())
    }
}

fn check_keys(enc: &KeySchedule, mac: &KeySchedule) -> Result<()> {
    if enc.shares_key_with(mac) {
        error!("aes: encryption and MAC keys are identical");
        return Err(Error::KeyReuse);
    }
    Ok(())
}

fn check_plaintext(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyBuffer);
    }
    check_aligned(len)
}

fn append_mac(envelope: &mut [u8], mac: &KeySchedule) -> Result<()> {
    let (authenticated, tag) = envelope.split_at_mut(envelope.len() - MAC_SIZE);
    let mut cbc_mac = CbcMac::new(mac);
    cbc_mac.update(authenticated)?;
    tag.copy_from_slice(&cbc_mac.finalize());
    Ok(())
}

/// Encrypt and authenticate `padded` into `out[..padded.len() + OVERHEAD]`.
pub fn auth_encrypt(
    padded: &[u8],
    out: &mut [u8],
    enc: &KeySchedule,
    mac: &KeySchedule,
    iv: &Block,
) -> Result<usize> {
    check_keys(enc, mac)?;
    check_plaintext(padded.len())?;
    let len = padded.len() + OVERHEAD;
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }
    debug!("aes: authenticated encryption of {} bytes", padded.len());

    let envelope = &mut out[..len];
    envelope[..IV_SIZE].copy_from_slice(iv);
    cbc::encrypt(padded, &mut envelope[IV_SIZE..len - MAC_SIZE], enc, iv)?;
    append_mac(envelope, mac)?;
    Ok(len)
}

/// Encrypt and authenticate `buf[src]`, writing the envelope at `buf[dest..]`.
///
/// The ciphertext lands one block after `dest`, so `dest + IV_SIZE <= src.start`
/// is required. Writing the padded message at offset `IV_SIZE` and using
/// `dest = 0` is the usual layout, see [`auth_encrypt_in_place`].
pub fn auth_encrypt_within(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    enc: &KeySchedule,
    mac: &KeySchedule,
    iv: &Block,
) -> Result<usize> {
    check_keys(enc, mac)?;
    if src.start > src.end || src.end > buf.len() {
        return Err(Error::BufferTooSmall);
    }
    let padded_len = src.end - src.start;
    check_plaintext(padded_len)?;
    if src.start.checked_sub(IV_SIZE).map_or(true, |max| dest > max) {
        return Err(Error::Overlap);
    }
    let len = padded_len + OVERHEAD;
    if dest + len > buf.len() {
        return Err(Error::BufferTooSmall);
    }
    debug!("aes: authenticated encryption of {} bytes", padded_len);

    cbc::encrypt_within(buf, src, dest + IV_SIZE, enc, iv)?;
    let envelope = &mut buf[dest..][..len];
    envelope[..IV_SIZE].copy_from_slice(iv);
    append_mac(envelope, mac)?;
    Ok(len)
}

/// Encrypt the `len` padded bytes at `buf[IV_SIZE..]`, leaving the envelope in
/// `buf[..len + OVERHEAD]`.
pub fn auth_encrypt_in_place(
    buf: &mut [u8],
    len: usize,
    enc: &KeySchedule,
    mac: &KeySchedule,
    iv: &Block,
) -> Result<usize> {
    auth_encrypt_within(buf, IV_SIZE..IV_SIZE + len, 0, enc, mac, iv)
}

/// Verify and decrypt `envelope` into `out`, returning the plaintext length.
///
/// The plaintext is still padded.
pub fn auth_decrypt(
    envelope: &[u8],
    out: &mut [u8],
    dec: &KeySchedule,
    mac: &KeySchedule,
) -> Result<usize> {
    check_keys(dec, mac)?;
    let envelope = AuthCiphertext::from_bytes(envelope)?;
    let len = envelope.plaintext_len();
    if out.len() < len {
        return Err(Error::BufferTooSmall);
    }

    envelope.verify(mac)?;
    cbc::decrypt(envelope.body(), &mut out[..len], dec, &envelope.iv())?;
    Ok(len)
}

/// Verify and decrypt the envelope `buf[src]`, writing the plaintext at
/// `buf[dest..]`. Requires `dest <= src.start + IV_SIZE`.
pub fn auth_decrypt_within(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    dec: &KeySchedule,
    mac: &KeySchedule,
) -> Result<usize> {
    check_keys(dec, mac)?;
    if src.start > src.end || src.end > buf.len() {
        return Err(Error::BufferTooSmall);
    }
    let envelope = AuthCiphertext::from_bytes(&buf[src.clone()])?;
    if dest > src.start + IV_SIZE {
        return Err(Error::Overlap);
    }
    let len = envelope.plaintext_len();

    envelope.verify(mac)?;
    let iv = envelope.iv();
    let body = src.start + IV_SIZE..src.end - MAC_SIZE;
    cbc::decrypt_within(buf, body, dest, dec, &iv)?;
    Ok(len)
}

/// Verify and decrypt `buf`, leaving the plaintext in `buf[..len]`.
pub fn auth_decrypt_in_place(buf: &mut [u8], dec: &KeySchedule, mac: &KeySchedule) -> Result<usize> {
    let len = buf.len();
    auth_decrypt_within(buf, 0..len, 0, dec, mac)
}
