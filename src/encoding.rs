//! Base64 (RFC 4648, standard alphabet, `=` padding) into caller buffers.

use base64::engine::general_purpose::STANDARD;
use base64::{DecodeSliceError, Engine};

use crate::{Error, Result};

/// Exact length of the encoding of `len` bytes.
pub const fn encoded_len(len: usize) -> usize {
    (len + 2) / 3 * 4
}

/// Upper bound on the decoded length of `len` base64 characters.
pub const fn decoded_len_estimate(len: usize) -> usize {
    (len + 3) / 4 * 3
}

/// Encode `data` into `out`, returning the number of characters written.
pub fn encode(data: &[u8], out: &mut [u8]) -> Result<usize> {
    STANDARD.encode_slice(data, out).map_err(|_| Error::BufferTooSmall)
}

/// Encode `data` into `out`, returning the encoding as a string slice of `out`.
pub fn encode_str<'o>(data: &[u8], out: &'o mut [u8]) -> Result<&'o str> {
    let len = encode(data, out)?;
    core::str::from_utf8(&out[..len]).map_err(|_| Error::DecodingError)
}

/// Decode `b64` into `out`, returning the number of bytes written.
///
/// Fails on characters outside the alphabet and on malformed padding.
pub fn decode(b64: &[u8], out: &mut [u8]) -> Result<usize> {
    STANDARD.decode_slice(b64, out).map_err(|err| match err {
        DecodeSliceError::OutputSliceTooSmall => Error::BufferTooSmall,
        _ => {
            debug!("base64: {:?}", err);
            Error::DecodingError
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn rfc4648() {
        let vectors: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];
        for (data, b64) in vectors.iter() {
            let mut out = [0u8; 8];
            assert_eq!(encode_str(data, &mut out), Ok(*b64));
            assert_eq!(encoded_len(data.len()), b64.len());

            let mut decoded = [0u8; 6];
            assert_eq!(decode(b64.as_bytes(), &mut decoded), Ok(data.len()));
            assert_eq!(&decoded[..data.len()], *data);
        }
    }

    #[test]
    fn binary() {
        let mut out = [0u8; 12];
        assert_eq!(encode_str(b"hashlib", &mut out), Ok("aGFzaGxpYg=="));
        assert_eq!(encode_str(&[0x00, 0xff, 0x10], &mut out), Ok("AP8Q"));
    }

    #[test]
    fn roundtrip_all_lengths() {
        let mut rng = CountingRng(0x37);
        for len in 0..64 {
            let mut data = [0u8; 64];
            rng.fill_bytes(&mut data[..len]);

            let mut b64 = [0u8; encoded_len(64)];
            let written = encode(&data[..len], &mut b64).unwrap();
            assert_eq!(written, encoded_len(len));

            let mut decoded = [0u8; 66];
            assert!(decoded_len_estimate(written) <= decoded.len());
            assert_eq!(decode(&b64[..written], &mut decoded), Ok(len));
            assert_eq!(decoded[..len], data[..len]);
        }
    }

    #[test]
    fn malformed() {
        let mut out = [0u8; 16];
        assert_eq!(decode(b"aGFz*Gxp", &mut out), Err(Error::DecodingError));
        assert_eq!(decode(b"aGFzaGxpYg=", &mut out), Err(Error::DecodingError));
        assert_eq!(decode(b"aGFza", &mut out), Err(Error::DecodingError));
        assert_eq!(decode(b"aG=zaGxp", &mut out), Err(Error::DecodingError));

        assert_eq!(encode(b"hashlib", &mut out[..11]), Err(Error::BufferTooSmall));
    }
}
