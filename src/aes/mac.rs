//! CBC-MAC: the last block of a CBC encryption with a zero IV.
//!
//! Only sound for messages of a fixed, agreed-upon length, or when the first
//! block binds the length (as the IV does in [`super::auth`]).
//! The MAC schedule must not be one used for encryption of the same data.

use zeroize::Zeroize;

use super::{check_aligned, Block, KeySchedule, BLOCK_SIZE, MAC_SIZE};
use crate::{Error, Result};

/// Incremental CBC-MAC over block-aligned chunks.
pub struct CbcMac<'k> {
    schedule: &'k KeySchedule,
    state: Block,
}

impl Drop for CbcMac<'_> {
    fn drop(&mut self) {
        self.state.zeroize();
    }
}

impl<'k> CbcMac<'k> {
    pub fn new(schedule: &'k KeySchedule) -> Self {
        Self { schedule, state: [0u8; BLOCK_SIZE] }
    }

    /// Absorb `data`, whose length must be a multiple of the block size.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        check_aligned(data.len())?;
        for block in data.chunks_exact(BLOCK_SIZE) {
            for (state, byte) in self.state.iter_mut().zip(block.iter()) {
                *state ^= byte;
            }
            self.schedule.encrypt_block(&mut self.state);
        }
        Ok(())
    }

    pub fn finalize(self) -> Block {
        self.state
    }

    /// Compare against `tag` in constant time.
    pub fn verify(self, tag: &[u8]) -> Result<()> {
        let mut computed = self.finalize();
        let matches = crate::compare_digest(&computed, tag);
        computed.zeroize();
        if matches {
            Ok(())
        } else {
            warn!("aes: MAC mismatch");
            Err(Error::MacMismatch)
        }
    }
}

/// CBC-MAC of padded `data`.
pub fn output_mac(data: &[u8], schedule: &KeySchedule) -> Result<Block> {
    if data.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    let mut mac = CbcMac::new(schedule);
    mac.update(data)?;
    Ok(mac.finalize())
}

/// Check that the last block of `tagged` is the CBC-MAC of everything before it.
///
/// This is the `IV || C || MAC` envelope of [`super::auth`], verified without
/// decrypting.
pub fn verify_mac(tagged: &[u8], schedule: &KeySchedule) -> Result<()> {
    check_aligned(tagged.len())?;
    if tagged.len() < 2 * BLOCK_SIZE {
        return Err(Error::TooShort);
    }
    let (data, tag) = tagged.split_at(tagged.len() - MAC_SIZE);
    let mut mac = CbcMac::new(schedule);
    mac.update(data)?;
    mac.verify(tag)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures::*;

    const MAC_KEY: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const PLAINTEXT: [u8; 64] = hex!("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e5130c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710");

    #[test]
    fn last_block_of_zero_iv_cbc() {
        let schedule = KeySchedule::new(&MAC_KEY).unwrap();
        let mac = output_mac(&PLAINTEXT, &schedule).unwrap();
        assert_eq!(mac, hex!("45534ac21f6b0296a26953315a0b62bb"));

        let mut ciphertext = [0u8; 64];
        super::super::cbc::encrypt(&PLAINTEXT, &mut ciphertext, &schedule, &[0u8; 16]).unwrap();
        assert_eq!(mac, ciphertext[48..]);
    }

    #[test]
    fn incremental() {
        let schedule = KeySchedule::new(&MAC_KEY).unwrap();
        let mut mac = CbcMac::new(&schedule);
        mac.update(&PLAINTEXT[..16]).unwrap();
        mac.update(&[]).unwrap();
        mac.update(&PLAINTEXT[16..]).unwrap();
        assert_eq!(mac.finalize(), output_mac(&PLAINTEXT, &schedule).unwrap());

        assert_eq!(CbcMac::new(&schedule).update(&PLAINTEXT[..20]), Err(Error::Misaligned));
        assert_eq!(output_mac(&[], &schedule), Err(Error::EmptyBuffer));
    }

    #[test]
    fn verification() {
        let schedule = KeySchedule::new(&MAC_KEY).unwrap();
        let mut tagged = [0u8; 80];
        tagged[..64].copy_from_slice(&PLAINTEXT);
        let tag = output_mac(&PLAINTEXT, &schedule).unwrap();
        tagged[64..].copy_from_slice(&tag);
        assert_eq!(verify_mac(&tagged, &schedule), Ok(()));

        for i in 0..tagged.len() {
            let mut tampered = tagged;
            tampered[i] ^= 0x01;
            assert_eq!(verify_mac(&tampered, &schedule), Err(Error::MacMismatch));
        }

        let other = KeySchedule::new(&[0u8; 16]).unwrap();
        assert_eq!(verify_mac(&tagged, &other), Err(Error::MacMismatch));
        assert_eq!(verify_mac(&tagged[..16], &schedule), Err(Error::TooShort));
        assert_eq!(verify_mac(&tagged[..70], &schedule), Err(Error::Misaligned));
    }
}
