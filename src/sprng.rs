//! Secure pseudorandom number generator, seeded from hardware noise.
//!
//! The device exposes a memory region affected by bus noise, modelled as a
//! [`NoiseSource`] with one channel per address. Seeding reads every channel
//! [`INIT_SAMPLES`] times and counts, per bit, how often it was set. The
//! channel holding the bit closest to a 50/50 split is selected, provided
//! it deviates from `INIT_SAMPLES / 2` by at most [`MAX_DEVIATION`]
//! (i.e., 256 to 768 ones out of 1024).
//!
//! The selected channel feeds a [`POOL_SIZE`] byte entropy pool, by XOR only,
//! so accumulated entropy is never replaced. Outputs are SHA-256 digests of
//! the whole pool, folded to 32 bits, so no raw sample is ever exposed.
//! The pool itself can neither be read nor set.
//!
//! Pool mixing is not atomic: share an [`EntropyPool`] between threads of
//! execution only behind a lock.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::sha256;
use crate::{Error, Result};

/// Size of the entropy pool in bytes.
pub const POOL_SIZE: usize = 119;
/// Reads per channel when selecting the noisiest bit.
pub const INIT_SAMPLES: u32 = 1024;
/// Largest tolerated deviation from `INIT_SAMPLES / 2` set bits.
pub const MAX_DEVIATION: u32 = INIT_SAMPLES / 4;
/// Reads of the selected channel per [`EntropyPool::add_entropy`].
pub const ENTROPY_SAMPLES: usize = 128;

/// Hardware noise, e.g. a bus-noise affected memory region.
pub trait NoiseSource {
    /// Number of channels (addresses) that may be sampled.
    fn channels(&self) -> usize;

    /// One read of `channel`. Each bit is a potential noise bit.
    fn sample(&mut self, channel: usize) -> u8;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn sample(&mut self, channel: usize) -> u8 {
        (**self).sample(channel)
    }
}

/// The selected noise channel, with the bit that qualified it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Channel {
    pub index: usize,
    pub bit: u8,
    /// Distance of the bit's set count from `INIT_SAMPLES / 2`.
    pub deviation: u32,
}

fn select_channel<N: NoiseSource>(source: &mut N) -> Option<Channel> {
    let half = INIT_SAMPLES / 2;
    let mut best: Option<Channel> = None;

    for index in 0..source.channels() {
        let mut counts = [0u32; 8];
        for _ in 0..INIT_SAMPLES {
            let byte = source.sample(index);
            for (bit, count) in counts.iter_mut().enumerate() {
                *count += u32::from((byte >> bit) & 1);
            }
        }

        for (bit, &count) in counts.iter().enumerate() {
            let deviation = if count > half { count - half } else { half - count };
            if deviation <= MAX_DEVIATION && best.map_or(true, |b| deviation < b.deviation) {
                best = Some(Channel { index, bit: bit as u8, deviation });
            }
        }
    }

    best
}

/// Process-wide entropy pool, as an explicit handle.
///
/// The only way to obtain one is [`EntropyPool::init`], so every handle is
/// seeded. Also a [`RngCore`] + [`CryptoRng`], which is how the rest of
/// this crate consumes randomness (salts, padding bytes, keys, IVs).
///
/// The pool is wiped on drop.
pub struct EntropyPool<N: NoiseSource> {
    source: N,
    channel: Channel,
    pool: [u8; POOL_SIZE],
}

impl<N: NoiseSource> EntropyPool<N> {
    /// Select the most entropic channel and seed the pool from it.
    ///
    /// Fails with [`Error::EntropyExhausted`] if no channel qualifies.
    /// This is not fatal, sampling again may well succeed:
    ///
    /// ```ignore
    /// let mut attempts = 5;
    /// let pool = loop {
    ///     match EntropyPool::init(&mut bus) {
    ///         Ok(pool) => break pool,
    ///         Err(_) if attempts > 1 => attempts -= 1,
    ///         Err(err) => return Err(err),
    ///     }
    /// };
    /// ```
    pub fn init(mut source: N) -> Result<Self> {
        let channel = select_channel(&mut source).ok_or_else(|| {
            warn!("sprng: no channel within {} of {}/{}", MAX_DEVIATION, INIT_SAMPLES / 2, INIT_SAMPLES);
            Error::EntropyExhausted
        })?;
        info!("sprng: channel {} bit {} deviation {}", channel.index, channel.bit, channel.deviation);

        let mut pool = Self { source, channel, pool: [0; POOL_SIZE] };
        pool.add_entropy();
        Ok(pool)
    }

    /// The channel selected at seeding.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Run the channel selection again, e.g. after the hardware changed.
    ///
    /// The pool keeps its content. On failure, the current channel stays selected.
    pub fn reselect(&mut self) -> Result<Channel> {
        let channel = select_channel(&mut self.source).ok_or(Error::EntropyExhausted)?;
        info!("sprng: reselected channel {} bit {}", channel.index, channel.bit);
        self.channel = channel;
        self.add_entropy();
        Ok(channel)
    }

    /// Sample the channel [`ENTROPY_SAMPLES`] times and XOR the samples into the pool.
    ///
    /// May be called at any time to make the state more dynamic.
    pub fn add_entropy(&mut self) {
        let mut samples = [0u8; ENTROPY_SAMPLES];
        for sample in samples.iter_mut() {
            *sample = self.source.sample(self.channel.index);
        }
        for (i, sample) in samples.iter().enumerate() {
            self.pool[i % POOL_SIZE] ^= sample;
        }
        samples.zeroize();
    }

    /// A random `u32`.
    pub fn random(&mut self) -> u32 {
        // transient partial value, masked by every lane of the digest
        let mut seed = [0u8; 4];
        for byte in seed.iter_mut() {
            *byte = self.source.sample(self.channel.index);
        }
        let mut random = u32::from_le_bytes(seed);

        self.add_entropy();
        let mut digest = sha256::hash(&self.pool);
        for lane in digest.chunks_exact(4) {
            random ^= u32::from_le_bytes([lane[0], lane[1], lane[2], lane[3]]);
        }

        digest.zeroize();
        seed.zeroize();
        random
    }

    /// Fill `buffer` with random bytes.
    ///
    /// Fails with [`Error::EmptyBuffer`] if there is nothing to fill.
    pub fn fill(&mut self, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        self.fill_unchecked(buffer);
        Ok(())
    }

    fn fill_unchecked(&mut self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(4) {
            let random = self.random().to_le_bytes();
            chunk.copy_from_slice(&random[..chunk.len()]);
        }
    }

    /// Recover after the pool's memory was overwritten with predictable data.
    ///
    /// Zeroes the pool, then adds fresh entropy. Never needed in normal operation.
    pub fn repair(&mut self) {
        warn!("sprng: repairing pool");
        self.pool.zeroize();
        self.add_entropy();
    }
}

impl<N: NoiseSource> Drop for EntropyPool<N> {
    fn drop(&mut self) {
        self.pool.zeroize();
    }
}

impl<N: NoiseSource> RngCore for EntropyPool<N> {
    fn next_u32(&mut self) -> u32 {
        self.random()
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // an empty `dest` is not an error for `RngCore`
        self.fill_unchecked(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl<N: NoiseSource> CryptoRng for EntropyPool<N> {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn selects_the_noisy_channel() {
        let bus = SimulatedBus::new(16, Some(11));
        let pool = EntropyPool::init(bus).unwrap();
        let channel = pool.channel();
        assert_eq!(channel.index, 11);
        assert!(channel.deviation <= MAX_DEVIATION);
    }

    #[test]
    fn degenerate_noise_is_rejected() {
        assert_eq!(EntropyPool::init(SimulatedBus::new(8, None)).err(), Some(Error::EntropyExhausted));
        assert_eq!(EntropyPool::init(BiasedBus::new(8)).err(), Some(Error::EntropyExhausted));
    }

    #[test]
    fn deviation_window_is_inclusive() {
        let low = 256;
        let high = 768;
        for &ones in &[low, high] {
            let pool = EntropyPool::init(CountedBus::new(&[ones])).unwrap();
            assert_eq!(pool.channel(), Channel { index: 0, bit: 0, deviation: MAX_DEVIATION });
        }

        for &ones in &[low - 1, high + 1, 0, INIT_SAMPLES] {
            assert_eq!(EntropyPool::init(CountedBus::new(&[ones])).err(), Some(Error::EntropyExhausted));
        }
    }

    #[test]
    fn least_deviating_channel_wins() {
        let mut bus = CountedBus::new(&[300, 769, 700, 520, 255, 504]);
        // 520 and 504 tie at 8, the first one scanned is kept
        assert_eq!(select_channel(&mut bus), Some(Channel { index: 3, bit: 0, deviation: 8 }));

        let mut bus = CountedBus::new(&[255, 768, 769]);
        assert_eq!(select_channel(&mut bus), Some(Channel { index: 1, bit: 0, deviation: 256 }));
    }

    #[test]
    fn init_can_be_retried_with_the_same_source() {
        let mut bus = SimulatedBus::new(4, None);
        assert!(EntropyPool::init(&mut bus).is_err());

        // the noisy line comes alive
        bus.noisy = Some(2);
        let pool = EntropyPool::init(&mut bus).unwrap();
        assert_eq!(pool.channel().index, 2);
    }

    #[test]
    fn random_bytes() {
        let mut pool = EntropyPool::init(SimulatedBus::new(4, Some(0))).unwrap();
        assert_eq!(pool.fill(&mut []), Err(Error::EmptyBuffer));

        let mut a = [0u8; 37];
        let mut b = [0u8; 37];
        pool.fill(&mut a).unwrap();
        pool.fill(&mut b).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, [0u8; 37]);

        assert_ne!(pool.random(), pool.random());
    }

    #[test]
    fn add_entropy_mixes_and_never_replaces() {
        let mut pool = EntropyPool::init(SimulatedBus::new(2, Some(1))).unwrap();
        let before = pool.pool;
        pool.add_entropy();
        assert_ne!(pool.pool, before);
    }

    #[test]
    fn repair_after_clobbering() {
        let mut pool = EntropyPool::init(SimulatedBus::new(2, Some(1))).unwrap();
        pool.pool = [0xff; POOL_SIZE];
        pool.repair();
        assert_ne!(pool.pool, [0xff; POOL_SIZE]);
        assert!(pool.pool.iter().any(|&b| b != 0));
    }

    #[test]
    fn reselect_keeps_channel_on_failure() {
        let mut bus = SimulatedBus::new(3, Some(1));
        let mut pool = EntropyPool::init(&mut bus).unwrap();
        pool.source.noisy = None;
        assert_eq!(pool.reselect(), Err(Error::EntropyExhausted));
        assert_eq!(pool.channel().index, 1);

        pool.source.noisy = Some(2);
        assert_eq!(pool.reselect().unwrap().index, 2);
    }

    // NIST SP 800-22 frequency (monobit) test, 16 KiB sample
    #[test]
    fn monobit() {
        let mut pool = EntropyPool::init(SimulatedBus::new(4, Some(3))).unwrap();
        let mut sample = [0u8; 16384];
        pool.fill_bytes(&mut sample);

        let n = (sample.len() * 8) as f64;
        let ones: u32 = sample.iter().map(|byte| byte.count_ones()).sum();
        let s = 2.0 * f64::from(ones) - n;
        // erfc(s / sqrt(2n)) >= 0.0001  <=>  |s| / sqrt(n) <= 3.8906
        assert!(s.abs() / n.sqrt() <= 3.8906, "{} ones out of {}", ones, n);
    }

    #[test]
    fn usable_as_rng() {
        fn takes_rng(mut rng: impl CryptoRng + RngCore) -> u64 {
            rng.next_u64()
        }
        let mut pool = EntropyPool::init(SimulatedBus::new(1, Some(0))).unwrap();
        let a = takes_rng(&mut pool);
        let b = takes_rng(&mut pool);
        assert_ne!(a, b);
    }
}
