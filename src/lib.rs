//! TOTP (Time-based one time password) generation and verification built on
//! HOTP (Hash-based)
//!
//! HOTP is described at [RFC4226](https://tools.ietf.org/html/rfc4226)
//! TOTP is described at [RFC6238](https://datatracker.ietf.org/doc/html/rfc6238)
//!
//! Shared secrets are exchanged as RFC4648 base32 text, see [`secret`].
//!
//! ```
//! use totp_engine::{Config, TotpEngine};
//!
//! let engine = TotpEngine::new("JBSWY3DPEHPK3PXP", Config::default().with_window(1)).unwrap();
//! let code = engine.generate();
//! assert!(engine.verify(&code.to_string()).unwrap().success);
//! ```

use cryptoxide::hmac::Hmac;
use cryptoxide::mac::Mac;
use cryptoxide::sha1::Sha1;
use cryptoxide::sha2::{Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

pub mod error;
pub mod secret;
pub mod totp;

pub use error::{Error, Result, SecretError};
pub use secret::{decode, encode, generate_secret, is_valid_secret_text, Secret};
pub use totp::{Code, Config, TotpEngine, Verification};

/// Algorithm for running HMAC
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Size in bytes of the HMAC output
    pub const fn digest_len(self) -> usize {
        match self {
            Algorithm::Sha1 => 20,
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Sha1 => "SHA1",
            Algorithm::Sha256 => "SHA256",
            Algorithm::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SHA1" | "SHA-1" => Ok(Algorithm::Sha1),
            "SHA256" | "SHA-256" => Ok(Algorithm::Sha256),
            "SHA512" | "SHA-512" => Ok(Algorithm::Sha512),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Period of time, in seconds
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(u32);

impl Period {
    pub const fn new(seconds: u32) -> Self {
        Period(seconds)
    }
    pub const fn seconds30() -> Self {
        Period(30)
    }
    pub const fn seconds45() -> Self {
        Period(45)
    }
    pub const fn seconds60() -> Self {
        Period(60)
    }
    pub const fn as_secs(self) -> u32 {
        self.0
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::seconds30()
    }
}

impl From<Period> for u32 {
    fn from(p: Period) -> Self {
        p.0
    }
}

/// 31 bits authentication token, before reduction to a digit count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token(u32);

impl Token {
    /// Reduce the token to `digits` decimal digits
    ///
    /// `digits` above 9 overflow the `u32` modulus; [`Config`] keeps it in range.
    pub fn truncate(self, digits: u32) -> u32 {
        self.0 % 10u32.pow(digits)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Counter to use for otp
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(u64);

fn unix_millis(at: SystemTime) -> u128 {
    // clocks set before the epoch count as the epoch itself
    at.duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

impl Counter {
    /// The counter is zero
    pub const fn zero() -> Self {
        Counter(0)
    }

    /// Increase the counter to the next value
    pub const fn incr(self) -> Self {
        Counter(self.0 + 1)
    }

    pub const fn hotp(counter: u64) -> Self {
        Counter(counter)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Shift the counter by `delta` steps, `None` if it would leave the u64 range
    pub fn offset(self, delta: i64) -> Option<Self> {
        let shifted = if delta >= 0 {
            self.0.checked_add(delta as u64)
        } else {
            self.0.checked_sub(delta.unsigned_abs())
        };
        shifted.map(Counter)
    }

    pub fn totp_now(period: Period) -> Self {
        Counter::totp_at(period, SystemTime::now())
    }

    pub fn totp_at(period: Period, at: SystemTime) -> Self {
        Counter::totp_left_at(period, at).0
    }

    /// Counter at `at` and the time left before it moves to the next value
    pub fn totp_left_at(period: Period, at: SystemTime) -> (Self, Duration) {
        let millis = unix_millis(at);
        let period = period.0 as u128 * 1000;
        let slot = (millis / period) as u64;
        let left = period - (millis % period);
        let left = Duration::from_millis(left as u64);
        (Counter(slot), left)
    }
}

/// Raw HOTP derivation: HMAC the big endian counter and dynamically truncate
pub fn otp(algorithm: Algorithm, secret: &[u8], counter: Counter) -> Token {
    let hmac_message = counter.0.to_be_bytes();
    let mut output = [0u8; 64];
    let size = algorithm.digest_len();

    match algorithm {
        Algorithm::Sha1 => {
            let mut hmac = Hmac::new(Sha1::new(), secret);
            hmac.input(&hmac_message);
            hmac.raw_result(&mut output[0..size]);
        }
        Algorithm::Sha256 => {
            let mut hmac = Hmac::new(Sha256::new(), secret);
            hmac.input(&hmac_message);
            hmac.raw_result(&mut output[0..size]);
        }
        Algorithm::Sha512 => {
            let mut hmac = Hmac::new(Sha512::new(), secret);
            hmac.input(&hmac_message);
            hmac.raw_result(&mut output[0..size]);
        }
    };

    // calculate the dynamic offset for the value
    let dynamic_offset = (output[size - 1] & 0x0f) as usize;

    // build the u32 code from the hash, dropping the top bit
    let tok = ((output[dynamic_offset] as u32) & 0x7f) << 24
        | (output[dynamic_offset + 1] as u32) << 16
        | (output[dynamic_offset + 2] as u32) << 8
        | (output[dynamic_offset + 3] as u32);
    Token(tok)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8; 20] = b"12345678901234567890";

    // RFC4226 appendix D
    const TEST_RESULTS: [u32; 10] = [
        755224, 287082, 359152, 969429, 338314, 254676, 287922, 162583, 399871, 520489,
    ];

    const TEST_TRUNCATED: [u32; 2] = [1284755224, 1094287082];

    #[test]
    fn hotp_vectors() {
        let mut counter = Counter::zero();

        for r in &TEST_RESULTS {
            let token = otp(Algorithm::Sha1, TEST_KEY, counter);
            assert_eq!(token.truncate(6), *r);
            counter = counter.incr();
        }
    }

    #[test]
    fn hotp_truncated_values() {
        for (i, r) in TEST_TRUNCATED.iter().enumerate() {
            let token = otp(Algorithm::Sha1, TEST_KEY, Counter::hotp(i as u64));
            assert_eq!(token.value(), *r);
        }
    }

    #[test]
    fn otp_is_deterministic() {
        let a = otp(Algorithm::Sha512, b"some key", Counter::hotp(77));
        let b = otp(Algorithm::Sha512, b"some key", Counter::hotp(77));
        assert_eq!(a, b);
        assert!(a.value() < 1 << 31);
    }

    #[test]
    fn algorithm_names() {
        assert_eq!("SHA1".parse::<Algorithm>(), Ok(Algorithm::Sha1));
        assert_eq!("sha-256".parse::<Algorithm>(), Ok(Algorithm::Sha256));
        assert_eq!("SHA-512".parse::<Algorithm>(), Ok(Algorithm::Sha512));
        assert_eq!(
            "MD5".parse::<Algorithm>(),
            Err(Error::UnknownAlgorithm("MD5".to_string()))
        );
        assert_eq!(Algorithm::Sha256.to_string(), "SHA256");
        assert_eq!(Algorithm::default(), Algorithm::Sha1);
    }

    #[test]
    fn counter_from_time() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(59);
        assert_eq!(Counter::totp_at(Period::seconds30(), at), Counter::hotp(1));
        let (ctr, left) = Counter::totp_left_at(Period::seconds30(), at);
        assert_eq!(ctr.value(), 1);
        assert_eq!(left, Duration::from_secs(1));

        let before_epoch = SystemTime::UNIX_EPOCH - Duration::from_secs(100);
        assert_eq!(Counter::totp_at(Period::seconds30(), before_epoch), Counter::zero());

        assert!(Counter::totp_now(Period::seconds60()) > Counter::hotp(27_000_000));
    }

    #[test]
    fn counter_offset_bounds() {
        assert_eq!(Counter::hotp(5).offset(-2), Some(Counter::hotp(3)));
        assert_eq!(Counter::hotp(5).offset(2), Some(Counter::hotp(7)));
        assert_eq!(Counter::hotp(1).offset(-2), None);
        assert_eq!(Counter::hotp(u64::MAX).offset(1), None);
        assert_eq!(Counter::hotp(3).offset(i64::MIN), None);
    }
}
