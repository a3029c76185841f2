//! Shared secret handling
//!
//! Secrets travel as RFC4648 base32 text (`A-Z`, `2-7`, `=` padding, upper case
//! only) and are held decoded in memory that is scrubbed on drop.

use crate::error::SecretError;
use std::fmt;
use zeroize::Zeroizing;

const ALPHABET: base32::Alphabet = base32::Alphabet::RFC4648 { padding: true };

/// Number of random bytes in a freshly generated secret (160 bits)
pub const SECRET_LEN: usize = 20;

const PAD: u8 = b'=';

fn is_alphabet(c: u8) -> bool {
    matches!(c, b'A'..=b'Z' | b'2'..=b'7')
}

/// Split `text` into (data characters, padding characters), checking that only
/// the alphabet is used and that padding only appears at the end.
fn scan(text: &str) -> Result<(usize, usize), SecretError> {
    let bytes = text.as_bytes();
    let data = bytes.iter().take_while(|&&c| is_alphabet(c)).count();
    let pad = bytes[data..].iter().take_while(|&&c| c == PAD).count();
    if data + pad != bytes.len() {
        return Err(SecretError::Alphabet);
    }
    Ok((data, pad))
}

/// Check that `text` has the shape `[A-Z2-7]+=*`.
///
/// This is only the syntactic check; [`decode`] also checks that the padding
/// and length describe whole bytes.
pub fn is_valid_secret_text(text: &str) -> bool {
    matches!(scan(text), Ok((data, _)) if data > 0)
}

/// Encode bytes as padded RFC4648 base32.
pub fn encode(bytes: &[u8]) -> String {
    base32::encode(ALPHABET, bytes)
}

/// Decode padded or unpadded RFC4648 base32.
///
/// Decoding is case sensitive. A trailing group must hold 2, 4, 5 or 7
/// characters, and when padding is present it must complete the last group
/// to 8 characters exactly.
pub fn decode(text: &str) -> Result<Vec<u8>, SecretError> {
    let (data, pad) = scan(text)?;
    let rem = data % 8;
    if !matches!(rem, 0 | 2 | 4 | 5 | 7) {
        return Err(SecretError::Structure);
    }
    if pad > 0 && (rem == 0 || pad != 8 - rem) {
        return Err(SecretError::Structure);
    }
    base32::decode(ALPHABET, text).ok_or(SecretError::Structure)
}

/// Decoded secret bytes, zeroed when dropped
#[derive(Clone)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Secret(Zeroizing::new(bytes))
    }

    /// Validate and decode a text secret
    pub fn from_text(text: &str) -> Result<Self, SecretError> {
        if !is_valid_secret_text(text) {
            return Err(SecretError::Alphabet);
        }
        decode(text).map(Self::from_bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text form of this secret
    pub fn to_text(&self) -> String {
        encode(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes, redacted)", self.0.len())
    }
}

/// Generate a new text secret from [`SECRET_LEN`] random bytes.
///
/// When a label is given its UTF-8 bytes are appended to the random bytes
/// before encoding. The output is always accepted by [`is_valid_secret_text`].
pub fn generate_secret(label: Option<&str>) -> String {
    let random: Zeroizing<[u8; SECRET_LEN]> = Zeroizing::new(rand::random());
    let extra = label.map_or(0, str::len);
    let mut bytes = Zeroizing::new(Vec::with_capacity(SECRET_LEN + extra));
    bytes.extend_from_slice(&random[..]);
    if let Some(label) = label {
        bytes.extend_from_slice(label.as_bytes());
    }
    encode(&bytes)
}
