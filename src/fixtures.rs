//! Deterministic stand-ins for the collaborators: randomness, bus noise, RSA.

pub use hex_literal::hex;
pub use rand_core::{CryptoRng, RngCore};

use crate::primitive::{PrivateRsaPrimitive, PublicRsaPrimitive};
use crate::{Error, Result};

/// Not random at all: the bytes `n, n + 1, ...` (wrapping).
pub struct CountingRng(pub u64);

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.0 as u8;
            self.0 = self.0.wrapping_add(1);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for CountingRng {}

fn xorshift(state: &mut u64) -> u8 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    (x >> 32) as u8
}

/// Bus noise on at most one channel; every other channel reads a constant.
pub struct SimulatedBus {
    state: u64,
    channels: usize,
    pub noisy: Option<usize>,
}

impl SimulatedBus {
    pub fn new(channels: usize, noisy: Option<usize>) -> Self {
        Self { state: 0x2545_f491_4f6c_dd1d, channels, noisy }
    }
}

impl crate::sprng::NoiseSource for SimulatedBus {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample(&mut self, channel: usize) -> u8 {
        if self.noisy == Some(channel) {
            xorshift(&mut self.state)
        } else {
            0xa5
        }
    }
}

/// Noise on every channel, but each bit is set seven times out of eight.
pub struct BiasedBus {
    state: u64,
    channels: usize,
}

impl BiasedBus {
    pub fn new(channels: usize) -> Self {
        Self { state: 0x9e37_79b9_7f4a_7c15, channels }
    }
}

impl crate::sprng::NoiseSource for BiasedBus {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample(&mut self, _channel: usize) -> u8 {
        xorshift(&mut self.state) | xorshift(&mut self.state) | xorshift(&mut self.state)
    }
}

/// Per channel, bit 0 is set in exactly the first `ones[channel]` of
/// every [`INIT_SAMPLES`](crate::sprng::INIT_SAMPLES) reads. All other bits stay clear.
pub struct CountedBus {
    ones: Vec<u32>,
    reads: Vec<u32>,
}

impl CountedBus {
    pub fn new(ones: &[u32]) -> Self {
        Self { ones: ones.to_vec(), reads: vec![0; ones.len()] }
    }
}

impl crate::sprng::NoiseSource for CountedBus {
    fn channels(&self) -> usize {
        self.ones.len()
    }

    fn sample(&mut self, channel: usize) -> u8 {
        let read = self.reads[channel] % crate::sprng::INIT_SAMPLES;
        self.reads[channel] += 1;
        u8::from(read < self.ones[channel])
    }
}

/// XOR with a fixed keystream: its own inverse, so public and private
/// operation coincide.
pub struct ToyRsa {
    pub modulus_len: usize,
    pub fail: bool,
}

impl ToyRsa {
    pub fn new(modulus_len: usize) -> Self {
        Self { modulus_len, fail: false }
    }

    fn apply(&self, block: &mut [u8]) -> Result<()> {
        if self.fail || block.len() != self.modulus_len {
            return Err(Error::DecodingError);
        }
        for (i, byte) in block.iter_mut().enumerate() {
            *byte ^= (i as u8).wrapping_mul(0x1f) ^ 0xa5;
        }
        Ok(())
    }
}

impl PublicRsaPrimitive for ToyRsa {
    fn modulus_len(&self) -> usize {
        self.modulus_len
    }

    fn rsa_primitive(&self, block: &mut [u8]) -> Result<()> {
        self.apply(block)
    }
}

impl PrivateRsaPrimitive for ToyRsa {
    fn modulus_len(&self) -> usize {
        self.modulus_len
    }

    fn rsa_primitive(&self, block: &mut [u8]) -> Result<()> {
        self.apply(block)
    }
}
