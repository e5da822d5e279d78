//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compares two buffers in time that depends only on their length.
///
/// Lengths are considered public, buffers of different lengths are unequal.
/// Use this for every MAC or digest check.
pub fn compare_digest(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equal_and_unequal() {
        let digest = [0x5au8; 32];
        assert!(compare_digest(&digest, &digest.clone()));
        assert!(compare_digest(&[], &[]));

        for i in 0..digest.len() {
            let mut other = digest;
            other[i] ^= 0x01;
            assert!(!compare_digest(&digest, &other));
        }
    }

    #[test]
    fn length_mismatch() {
        assert!(!compare_digest(&[1, 2, 3], &[1, 2]));
        assert!(!compare_digest(&[], &[0]));
    }

    #[test]
    #[cfg(feature = "extended-testing")]
    fn timing_independent_of_first_difference() {
        use std::time::Instant;

        const LEN: usize = 4096;
        const TRIALS: usize = 2000;

        let a = vec![0xa5u8; LEN];
        let mut early = a.clone();
        early[0] ^= 0xff;
        let mut late = a.clone();
        late[LEN - 1] ^= 0xff;

        // interleave to spread out scheduler noise, keep the best of each
        let mut best_early = u128::MAX;
        let mut best_late = u128::MAX;
        for _ in 0..TRIALS {
            let start = Instant::now();
            assert!(!compare_digest(&a, &early));
            best_early = best_early.min(start.elapsed().as_nanos());

            let start = Instant::now();
            assert!(!compare_digest(&a, &late));
            best_late = best_late.min(start.elapsed().as_nanos());
        }

        let (fast, slow) = (best_early.min(best_late) as f64, best_early.max(best_late) as f64);
        assert!(slow / fast < 1.5, "early {} ns vs late {} ns", best_early, best_late);
    }
}
