use thiserror::Error;

/// Why a text secret was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretError {
    /// not of the form `[A-Z2-7]+=*`
    Alphabet,
    /// padding or length that does not decode to whole bytes
    Structure,
}

impl SecretError {
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Alphabet => "secret must match [A-Z2-7]+=*",
            Self::Structure => "secret padding or length is not valid base32",
        }
    }
}

impl std::fmt::Display for SecretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl std::error::Error for SecretError {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid secret: {0}")]
    InvalidSecret(SecretError),

    #[error("malformed code: expected one or more decimal digits")]
    MalformedInput,

    #[error("invalid period: must be at least one second")]
    InvalidPeriod,

    #[error("invalid digit count {0}: must be between 6 and 9")]
    InvalidDigits(u32),

    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),
}

impl From<SecretError> for Error {
    fn from(e: SecretError) -> Self {
        Error::InvalidSecret(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
