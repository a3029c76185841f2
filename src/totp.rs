//! Time-based codes over a decoded shared secret
//!
//! A [`TotpEngine`] is built once per secret and [`Config`], then answers
//! [`TotpEngine::generate`] and [`TotpEngine::verify`] from the system clock.
//! Both only read the engine, so one instance can be shared between threads.
//!
//! Two calls to `generate` within the same period return the same code.
//! Refusing a code that was already used is left to the caller.

use crate::error::{Error, Result};
use crate::secret::Secret;
use crate::{otp, Algorithm, Counter, Period};
use std::fmt;
use std::time::{Duration, SystemTime};
use subtle::ConstantTimeEq;

pub const MIN_DIGITS: u32 = 6;
pub const MAX_DIGITS: u32 = 9;

/// Secrets shorter than this are accepted but logged
const MIN_SECRET_LEN: usize = 10;

const VERIFIED: &str = "TOTP verified";
const INVALID: &str = "Invalid TOTP";

/// Engine parameters, fixed once the engine is built
///
/// Defaults to a 30 second period, 6 digits, no window and SHA1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    period: Period,
    digits: u32,
    window: u32,
    algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            period: Period::seconds30(),
            digits: MIN_DIGITS,
            window: 0,
            algorithm: Algorithm::Sha1,
        }
    }
}

impl Config {
    pub fn with_period(self, period: Period) -> Self {
        Config { period, ..self }
    }

    pub fn with_digits(self, digits: u32) -> Self {
        Config { digits, ..self }
    }

    /// Number of periods accepted on each side of the current one
    pub fn with_window(self, window: u32) -> Self {
        Config { window, ..self }
    }

    pub fn with_algorithm(self, algorithm: Algorithm) -> Self {
        Config { algorithm, ..self }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn validate(&self) -> Result<()> {
        if self.period.as_secs() == 0 {
            return Err(Error::InvalidPeriod);
        }
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(Error::InvalidDigits(self.digits));
        }
        Ok(())
    }
}

/// A generated code; displays as exactly `digits` characters, zero padded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Code {
    value: u32,
    digits: u32,
}

impl Code {
    pub fn value(self) -> u32 {
        self.value
    }

    pub fn digits(self) -> u32 {
        self.digits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.digits as usize)
    }
}

/// Outcome of checking a well formed code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verification {
    pub success: bool,
    pub message: &'static str,
}

impl Verification {
    fn verified() -> Self {
        Verification {
            success: true,
            message: VERIFIED,
        }
    }

    fn rejected() -> Self {
        Verification {
            success: false,
            message: INVALID,
        }
    }
}

#[derive(Debug)]
pub struct TotpEngine {
    secret: Secret,
    config: Config,
}

impl TotpEngine {
    /// Build an engine from a base32 text secret.
    ///
    /// Fails with [`Error::InvalidSecret`] if the text is not `[A-Z2-7]+=*` or
    /// does not decode, and with a config error if `config` is out of range.
    pub fn new(secret: &str, config: Config) -> Result<Self> {
        let secret = Secret::from_text(secret)?;
        config.validate()?;
        if secret.len() < MIN_SECRET_LEN {
            log::warn!(
                "shared secret is only {} bytes, at least {} are recommended",
                secret.len(),
                MIN_SECRET_LEN
            );
        }
        log::debug!(
            "totp engine: algorithm={} period={}s digits={} window={}",
            config.algorithm,
            config.period.as_secs(),
            config.digits,
            config.window
        );
        Ok(TotpEngine { secret, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn hotp(&self, counter: Counter) -> Code {
        let token = otp(self.config.algorithm, self.secret.as_bytes(), counter);
        Code {
            value: token.truncate(self.config.digits),
            digits: self.config.digits,
        }
    }

    /// Code for the current period
    pub fn generate(&self) -> Code {
        self.generate_at(SystemTime::now())
    }

    /// Code for the period containing `at`
    pub fn generate_at(&self, at: SystemTime) -> Code {
        self.hotp(Counter::totp_at(self.config.period, at))
    }

    /// Time left before the current code changes
    pub fn remaining(&self) -> Duration {
        self.remaining_at(SystemTime::now())
    }

    pub fn remaining_at(&self, at: SystemTime) -> Duration {
        Counter::totp_left_at(self.config.period, at).1
    }

    /// Check a user supplied code against the current period and the window
    /// around it.
    ///
    /// Only input that is not all ASCII digits is an error. A wrong code, or
    /// one whose length differs from the configured digit count, gives a
    /// `success: false` result.
    pub fn verify(&self, code: &str) -> Result<Verification> {
        self.verify_at(code, SystemTime::now())
    }

    pub fn verify_at(&self, code: &str, at: SystemTime) -> Result<Verification> {
        if code.is_empty() || !code.bytes().all(|c| c.is_ascii_digit()) {
            log::debug!("malformed code of {} bytes", code.len());
            return Err(Error::MalformedInput);
        }

        let current = Counter::totp_at(self.config.period, at);
        let window = i64::from(self.config.window);
        // oldest period first, stop at the first match
        for delta in -window..=window {
            let counter = match current.offset(delta) {
                Some(counter) => counter,
                None => continue,
            };
            let expected = self.hotp(counter).to_string();
            if bool::from(code.as_bytes().ct_eq(expected.as_bytes())) {
                log::trace!("code matched at window offset {}", delta);
                return Ok(Verification::verified());
            }
        }

        log::debug!("code matched none of {} periods", 2 * window + 1);
        Ok(Verification::rejected())
    }
}
