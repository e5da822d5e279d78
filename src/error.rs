/// Failures, grouped by what the caller can do about them.
///
/// Preconditions and alignment problems are detected before any output
/// buffer is touched. Integrity failures never come with plaintext.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// AES keys are 128, 192 or 256 bits long.
    InvalidKeySize,
    /// Buffer must not be empty.
    EmptyBuffer,
    /// Output buffer cannot hold the result.
    BufferTooSmall,
    /// Input is shorter than its format requires.
    TooShort,
    /// PBKDF2 needs at least one iteration.
    ZeroIterations,
    /// Output region of an overlapping operation starts after its input region.
    Overlap,
    /// Encryption and MAC schedules were derived from the same key.
    KeyReuse,
    /// Message does not fit in the OAEP frame.
    MessageTooLong,
    /// Length is not a multiple of the AES block size.
    Misaligned,
    /// Authentication tag does not match, the message must be discarded.
    MacMismatch,
    /// Padding bytes are inconsistent with the selected scheme.
    InvalidPadding,
    /// Encoded input (base64, RSA ciphertext) is malformed.
    DecodingError,
    /// No noise channel of sufficient quality; retrying may help.
    EntropyExhausted,
}

/// [`Error`] or success.
pub type Result<T> = core::result::Result<T, Error>;
