//! AES (FIPS 197): key schedule and single block transform.
//!
//! Keys of 128, 192 or 256 bits, using 10, 12 or 14 rounds.
//!
//! The single block functions are ECB, which is insecure on its own
//! (identical blocks encrypt identically). They are exposed to build other
//! modes. For messages, use [`cbc`] for encryption and [`auth`] for
//! authenticated encryption (CBC + CBC-MAC, encrypt-then-MAC).
//!
//! The state is kept column-major as in the standard: byte `r + 4c` is row `r`,
//! column `c`.

use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

pub mod auth;
pub mod cbc;
pub mod mac;
mod tables;

use tables::{INV_SBOX, RCON, SBOX};

pub const BLOCK_SIZE: usize = 16;
pub const IV_SIZE: usize = BLOCK_SIZE;
pub const MAC_SIZE: usize = BLOCK_SIZE;

pub type Block = [u8; BLOCK_SIZE];

/// Size of a message after padding: always at least one byte longer, rounded
/// up to the block size. Aligned messages gain a full block.
pub const fn padded_size(len: usize) -> usize {
    (len / BLOCK_SIZE + 1) * BLOCK_SIZE
}

/// Padded size plus the IV.
pub const fn ciphertext_size(len: usize) -> usize {
    padded_size(len) + IV_SIZE
}

/// Padded size plus IV and MAC, see [`auth`].
pub const fn auth_ciphertext_size(len: usize) -> usize {
    ciphertext_size(len) + MAC_SIZE
}

pub(crate) fn check_aligned(len: usize) -> Result<()> {
    if len % BLOCK_SIZE != 0 {
        return Err(Error::Misaligned);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeySize {
    Aes128 = 128,
    Aes192 = 192,
    Aes256 = 256,
}

impl KeySize {
    pub fn from_bits(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(KeySize::Aes128),
            192 => Ok(KeySize::Aes192),
            256 => Ok(KeySize::Aes256),
            _ => Err(Error::InvalidKeySize),
        }
    }

    pub const fn bits(self) -> usize {
        self as usize
    }

    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }

    pub const fn rounds(self) -> usize {
        self.key_words() + 6
    }

    // Nk
    const fn key_words(self) -> usize {
        self.bytes() / 4
    }

    // 44, 52 or 60
    const fn schedule_words(self) -> usize {
        4 * (self.rounds() + 1)
    }
}

/// Expanded AES key.
///
/// Derived once from the raw key, immutable afterwards, and wiped on drop,
/// whichever way the owning scope is left.
///
/// Authenticated encryption takes two schedules, which must be derived
/// from independent keys.
#[derive(Zeroize)]
pub struct KeySchedule {
    #[zeroize(skip)]
    size: KeySize,
    round_keys: [u32; 60],
}

impl Drop for KeySchedule {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for KeySchedule {}

impl core::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeySchedule").field("size", &self.size).finish()
    }
}

impl KeySchedule {
    /// Expand `key`, whose length selects the key size.
    pub fn new(key: &[u8]) -> Result<Self> {
        Self::load(key, key.len() * 8)
    }

    /// Expand `key` of `bits` bits (128, 192 or 256).
    pub fn load(key: &[u8], bits: usize) -> Result<Self> {
        let size = KeySize::from_bits(bits)?;
        if key.len() != size.bytes() {
            return Err(Error::InvalidKeySize);
        }
        debug!("aes: loading {}-bit key", bits);

        let nk = size.key_words();
        let mut w = [0u32; 60];
        for (word, bytes) in w.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        for i in nk..size.schedule_words() {
            let mut temp = w[i - 1];
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ (u32::from(RCON[i / nk - 1]) << 24);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            w[i] = w[i - nk] ^ temp;
        }

        Ok(Self { size, round_keys: w })
    }

    pub fn size(&self) -> KeySize {
        self.size
    }

    /// Whether `other` holds the same round keys, in constant time.
    pub(crate) fn shares_key_with(&self, other: &Self) -> bool {
        self.size == other.size && bool::from(self.round_keys[..].ct_eq(&other.round_keys[..]))
    }

    fn round_key(&self, round: usize) -> &[u32] {
        &self.round_keys[4 * round..][..4]
    }

    /// Encrypt one block in place (ECB).
    pub fn encrypt_block(&self, block: &mut Block) {
        let rounds = self.size.rounds();

        add_round_key(block, self.round_key(0));
        for round in 1..rounds {
            sub_bytes(block, &SBOX);
            shift_rows(block);
            mix_columns(block);
            add_round_key(block, self.round_key(round));
        }
        sub_bytes(block, &SBOX);
        shift_rows(block);
        add_round_key(block, self.round_key(rounds));
    }

    /// Decrypt one block in place (ECB).
    pub fn decrypt_block(&self, block: &mut Block) {
        let rounds = self.size.rounds();

        add_round_key(block, self.round_key(rounds));
        for round in (1..rounds).rev() {
            inv_shift_rows(block);
            sub_bytes(block, &INV_SBOX);
            add_round_key(block, self.round_key(round));
            inv_mix_columns(block);
        }
        inv_shift_rows(block);
        sub_bytes(block, &INV_SBOX);
        add_round_key(block, self.round_key(0));
    }
}

fn sub_word(word: u32) -> u32 {
    let b = word.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

fn add_round_key(state: &mut Block, words: &[u32]) {
    for (column, word) in state.chunks_exact_mut(4).zip(words.iter()) {
        for (byte, key) in column.iter_mut().zip(word.to_be_bytes().iter()) {
            *byte ^= key;
        }
    }
}

fn sub_bytes(state: &mut Block, table: &[u8; 256]) {
    for byte in state.iter_mut() {
        *byte = table[*byte as usize];
    }
}

// row r rotates left by r
fn shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

fn inv_shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * ((c + r) % 4)] = old[r + 4 * c];
        }
    }
}

/// Multiplication by x in GF(2^8), modulo x^8 + x^4 + x^3 + x + 1.
fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1b)
}

fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let (a0, a1, a2, a3) = (column[0], column[1], column[2], column[3]);
        let all = a0 ^ a1 ^ a2 ^ a3;
        column[0] ^= all ^ xtime(a0 ^ a1);
        column[1] ^= all ^ xtime(a1 ^ a2);
        column[2] ^= all ^ xtime(a2 ^ a3);
        column[3] ^= all ^ xtime(a3 ^ a0);
    }
}

/// {0b, 0d, 09, 0e} factors as {04, 00, 05, 00} followed by MixColumns.
fn inv_mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let u = xtime(xtime(column[0] ^ column[2]));
        let v = xtime(xtime(column[1] ^ column[3]));
        column[0] ^= u;
        column[1] ^= v;
        column[2] ^= u;
        column[3] ^= v;
    }
    mix_columns(state);
}

/// Fill `key` with a fresh random key of the given size.
pub fn keygen(mut rng: impl CryptoRng + RngCore, size: KeySize, key: &mut [u8]) -> Result<()> {
    if key.len() < size.bytes() {
        return Err(Error::BufferTooSmall);
    }
    rng.fill_bytes(&mut key[..size.bytes()]);
    Ok(())
}

/// A fresh random IV. Never reuse one under the same key.
pub fn generate_iv(mut rng: impl CryptoRng + RngCore) -> Block {
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);
    iv
}
