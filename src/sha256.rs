//! SHA-256, streaming.
//!
//! Reference is FIPS 180-4. The message is processed in 64 byte blocks,
//! padded with `0x80`, zeros, and the big-endian bit length.
//!
//! Every compression expands the block into a 64 word message schedule.
//! [`Sha256`] keeps that schedule on the stack and wipes it after each update.
//! Callers hashing many streams can instead lend a [`Scratch`] region via
//! [`Sha256::with_scratch`], which is reused without ever being moved.
//!
//! [`Sha256`] implements the `digest` traits, so it is a [`digest::Digest`]
//! and can be plugged into generic code, e.g. [`xor_mgf1`].

use digest::generic_array::{GenericArray, typenum::{U32, U64, Unsigned}};
use digest::{BlockInput, FixedOutputDirty, Reset, Update};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Output size in bytes.
pub const DIGEST_SIZE: usize = 32;
/// Hex representation of a digest, with room for a terminating NUL.
pub const DIGEST_HEX_SIZE: usize = 2 * DIGEST_SIZE + 1;
/// Compression block size in bytes.
pub const BLOCK_SIZE: usize = 64;
/// Size in bytes of a message schedule, see [`Scratch`].
pub const SCRATCH_SIZE: usize = 64 * 4;

const H0: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a,
    0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Caller-owned message schedule, lent to a hash stream for its lifetime.
///
/// Wiped whenever a stream using it finalizes, and on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Scratch([u32; 64]);

impl Scratch {
    pub const fn new() -> Self {
        Self([0; 64])
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// One SHA-256 hash stream.
///
/// Any number of [`update`](Sha256::update) calls with chunks of any size
/// (including empty ones) yield the same digest as a single call with
/// their concatenation. [`finalize`](Sha256::finalize) consumes the stream,
/// so no update can follow it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Sha256 {
    state: [u32; 8],
    buffer: [u8; BLOCK_SIZE],
    // always < BLOCK_SIZE between calls
    buffered: usize,
    bit_len: u64,
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha256 {
    pub fn new() -> Self {
        Self {
            state: H0,
            buffer: [0; BLOCK_SIZE],
            buffered: 0,
            bit_len: 0,
        }
    }

    /// Start a stream that uses `scratch` for every compression.
    pub fn with_scratch(scratch: &mut Scratch) -> ScratchSha256<'_> {
        ScratchSha256 { inner: Self::new(), scratch }
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut schedule = [0u32; 64];
        self.absorb(data, &mut schedule);
        schedule.zeroize();
    }

    /// Pad, process the final block(s), and return the digest.
    pub fn finalize(mut self) -> [u8; DIGEST_SIZE] {
        let mut schedule = [0u32; 64];
        let digest = self.finish(&mut schedule);
        schedule.zeroize();
        digest
    }

    fn absorb(&mut self, mut data: &[u8], schedule: &mut [u32; 64]) {
        self.bit_len = self.bit_len.wrapping_add((data.len() as u64) << 3);

        if self.buffered > 0 {
            let take = core::cmp::min(BLOCK_SIZE - self.buffered, data.len());
            self.buffer[self.buffered..][..take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered < BLOCK_SIZE {
                return;
            }
            compress(&mut self.state, &self.buffer, schedule);
            self.buffered = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            compress(&mut self.state, block, schedule);
        }

        let remainder = blocks.remainder();
        self.buffer[..remainder.len()].copy_from_slice(remainder);
        self.buffered = remainder.len();
    }

    fn finish(&mut self, schedule: &mut [u32; 64]) -> [u8; DIGEST_SIZE] {
        let bit_len = self.bit_len;

        // 0x80, then zeros up to 56 mod 64
        let mut padding = [0u8; BLOCK_SIZE];
        padding[0] = 0x80;
        let padding_len = if self.buffered < 56 { 56 - self.buffered } else { 120 - self.buffered };
        self.absorb(&padding[..padding_len], schedule);
        self.absorb(&bit_len.to_be_bytes(), schedule);
        debug_assert_eq!(self.buffered, 0);

        let mut digest = [0u8; DIGEST_SIZE];
        for (chunk, word) in digest.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        digest
    }
}

/// A [`Sha256`] stream using a borrowed [`Scratch`] region.
pub struct ScratchSha256<'s> {
    inner: Sha256,
    scratch: &'s mut Scratch,
}

impl ScratchSha256<'_> {
    pub fn update(&mut self, data: &[u8]) {
        self.inner.absorb(data, &mut self.scratch.0);
    }

    pub fn finalize(mut self) -> [u8; DIGEST_SIZE] {
        self.inner.finish(&mut self.scratch.0)
    }
}

impl Drop for ScratchSha256<'_> {
    fn drop(&mut self) {
        self.scratch.zeroize();
    }
}

fn compress(state: &mut [u32; 8], block: &[u8], w: &mut [u32; 64]) {
    debug_assert_eq!(block.len(), BLOCK_SIZE);

    for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    for t in 16..64 {
        let s0 = w[t - 15].rotate_right(7) ^ w[t - 15].rotate_right(18) ^ (w[t - 15] >> 3);
        let s1 = w[t - 2].rotate_right(17) ^ w[t - 2].rotate_right(19) ^ (w[t - 2] >> 10);
        w[t] = w[t - 16].wrapping_add(s0).wrapping_add(w[t - 7]).wrapping_add(s1);
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;
    for t in 0..64 {
        let s1 = e.rotate_right(6) ^ e.rotate_right(11) ^ e.rotate_right(25);
        let ch = (e & f) ^ (!e & g);
        let t1 = h.wrapping_add(s1).wrapping_add(ch).wrapping_add(K[t]).wrapping_add(w[t]);
        let s0 = a.rotate_right(2) ^ a.rotate_right(13) ^ a.rotate_right(22);
        let maj = (a & b) ^ (a & c) ^ (b & c);
        let t2 = s0.wrapping_add(maj);

        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for (word, value) in state.iter_mut().zip([a, b, c, d, e, f, g, h].iter()) {
        *word = word.wrapping_add(*value);
    }
}

/// One-shot SHA-256.
pub fn hash(data: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize()
}

impl BlockInput for Sha256 {
    type BlockSize = U64;
}

impl Update for Sha256 {
    fn update(&mut self, input: impl AsRef<[u8]>) {
        Sha256::update(self, input.as_ref());
    }
}

impl FixedOutputDirty for Sha256 {
    type OutputSize = U32;

    fn finalize_into_dirty(&mut self, out: &mut GenericArray<u8, U32>) {
        let mut schedule = [0u32; 64];
        out.copy_from_slice(&self.finish(&mut schedule));
        schedule.zeroize();
    }
}

impl Reset for Sha256 {
    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Mask Generating Function 1, XORed into `data`.
///
/// The mask is `H(seed || 0) || H(seed || 1) || ...`, counters as 4 big-endian bytes,
/// truncated to `data.len()`.
pub fn xor_mgf1<H: digest::Digest>(hasher: &mut H, seed: &[u8], data: &mut [u8]) {
    hasher.reset();
    let h_len = H::OutputSize::to_usize();
    // a short final chunk simply stops the zip early
    for (counter, chunk) in (0u32..).zip(data.chunks_mut(h_len)) {
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        for (byte, mask) in chunk.iter_mut().zip(hasher.finalize_reset().iter()) {
            *byte ^= *mask;
        }
    }
}

/// Arbitrary output length hashing: fills `out` with MGF1-SHA-256 of `data`.
pub fn mgf1(data: &[u8], out: &mut [u8]) {
    out.fill(0);
    xor_mgf1(&mut Sha256::new(), data, out);
}
