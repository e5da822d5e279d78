//! PBKDF2 with HMAC-SHA-256 as pseudorandom function.
//!
//! Defined in [RFC 8018, section 5.2][rfc8018]:
//!
//! ```text
//! DK = T_1 || T_2 || ... (truncated to dkLen)
//! T_i = U_1 ^ U_2 ^ ... ^ U_c
//! U_1 = PRF(P, S || INT(i)),  U_j = PRF(P, U_{j-1})
//! ```
//!
//! [rfc8018]: https://tools.ietf.org/html/rfc8018#section-5.2

use zeroize::Zeroize;

use crate::hmac::Hmac;
use crate::sha256::DIGEST_SIZE;
use crate::{Error, Result};

/// Derive `out.len()` bytes of key material from `password` and `salt`.
///
/// Salts should be at least 16 random bytes, iteration counts as high as
/// the device tolerates.
pub fn pbkdf2(password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()> {
    if iterations == 0 {
        return Err(Error::ZeroIterations);
    }
    if out.is_empty() {
        return Err(Error::EmptyBuffer);
    }

    let prf = Hmac::new(password);

    // block indices are 1-based
    for (index, chunk) in (1u32..).zip(out.chunks_mut(DIGEST_SIZE)) {
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&index.to_be_bytes());
        let mut u = mac.finalize();
        let mut t = u;

        for _ in 1..iterations {
            let mut mac = prf.clone();
            mac.update(&u);
            u = mac.finalize();
            for (t, u) in t.iter_mut().zip(u.iter()) {
                *t ^= u;
            }
        }

        chunk.copy_from_slice(&t[..chunk.len()]);
        u.zeroize();
        t.zeroize();
    }

    Ok(())
}
