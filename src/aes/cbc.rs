//! Cipher block chaining.
//!
//! Input must be padded already (see [`crate::padding`]); lengths that are not
//! a multiple of the block size are rejected before anything is written.
//!
//! Overlapping input and output live in a single buffer: the `*_within`
//! variants take the input as a range and the output as a start offset, which
//! must not lie after the input start. Blocks are processed front to back and
//! each input block is read before its output block is written, so this is
//! the only safe direction.

use core::ops::Range;

use zeroize::Zeroize;

use super::{check_aligned, Block, KeySchedule, BLOCK_SIZE};
use crate::{Error, Result};

fn xor_into(block: &mut Block, other: &Block) {
    for (byte, mask) in block.iter_mut().zip(other.iter()) {
        *byte ^= mask;
    }
}

fn check_input(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyBuffer);
    }
    check_aligned(len)
}

fn run(input: &[u8], output: &mut [u8], mut step: impl FnMut(&mut Block)) -> Result<()> {
    check_input(input.len())?;
    if output.len() < input.len() {
        return Err(Error::BufferTooSmall);
    }

    let mut block = [0u8; BLOCK_SIZE];
    for (from, to) in input.chunks_exact(BLOCK_SIZE).zip(output.chunks_exact_mut(BLOCK_SIZE)) {
        block.copy_from_slice(from);
        step(&mut block);
        to.copy_from_slice(&block);
    }
    block.zeroize();
    Ok(())
}

fn run_within(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    mut step: impl FnMut(&mut Block),
) -> Result<()> {
    if src.start > src.end || src.end > buf.len() {
        return Err(Error::BufferTooSmall);
    }
    check_input(src.end - src.start)?;
    if dest > src.start {
        return Err(Error::Overlap);
    }

    let mut block = [0u8; BLOCK_SIZE];
    for offset in (0..src.end - src.start).step_by(BLOCK_SIZE) {
        block.copy_from_slice(&buf[src.start + offset..][..BLOCK_SIZE]);
        step(&mut block);
        buf[dest + offset..][..BLOCK_SIZE].copy_from_slice(&block);
    }
    block.zeroize();
    Ok(())
}

/// Chaining step of encryption, `C_i = E(P_i ^ C_{i-1})` with `C_0 = iv`.
fn encryptor<'a>(schedule: &'a KeySchedule, chain: &'a mut Block) -> impl FnMut(&mut Block) + 'a {
    move |block: &mut Block| {
        xor_into(block, chain);
        schedule.encrypt_block(block);
        chain.copy_from_slice(block);
    }
}

/// Chaining step of decryption, `P_i = D(C_i) ^ C_{i-1}` with `C_0 = iv`.
fn decryptor<'a>(schedule: &'a KeySchedule, chain: &'a mut Block) -> impl FnMut(&mut Block) + 'a {
    move |block: &mut Block| {
        let ciphertext = *block;
        schedule.decrypt_block(block);
        xor_into(block, chain);
        chain.copy_from_slice(&ciphertext);
    }
}

pub fn encrypt(plaintext: &[u8], ciphertext: &mut [u8], schedule: &KeySchedule, iv: &Block) -> Result<()> {
    let mut chain = *iv;
    let result = run(plaintext, ciphertext, encryptor(schedule, &mut chain));
    chain.zeroize();
    result
}

pub fn decrypt(ciphertext: &[u8], plaintext: &mut [u8], schedule: &KeySchedule, iv: &Block) -> Result<()> {
    let mut chain = *iv;
    let result = run(ciphertext, plaintext, decryptor(schedule, &mut chain));
    chain.zeroize();
    result
}

/// Encrypt `buf[src]` into `buf[dest..]`, where `dest <= src.start`.
pub fn encrypt_within(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    schedule: &KeySchedule,
    iv: &Block,
) -> Result<()> {
    let mut chain = *iv;
    let result = run_within(buf, src, dest, encryptor(schedule, &mut chain));
    chain.zeroize();
    result
}

/// Decrypt `buf[src]` into `buf[dest..]`, where `dest <= src.start`.
pub fn decrypt_within(
    buf: &mut [u8],
    src: Range<usize>,
    dest: usize,
    schedule: &KeySchedule,
    iv: &Block,
) -> Result<()> {
    let mut chain = *iv;
    let result = run_within(buf, src, dest, decryptor(schedule, &mut chain));
    chain.zeroize();
    result
}

pub fn encrypt_in_place(buf: &mut [u8], schedule: &KeySchedule, iv: &Block) -> Result<()> {
    let len = buf.len();
    encrypt_within(buf, 0..len, 0, schedule, iv)
}

pub fn decrypt_in_place(buf: &mut [u8], schedule: &KeySchedule, iv: &Block) -> Result<()> {
    let len = buf.len();
    decrypt_within(buf, 0..len, 0, schedule, iv)
}
