// ⚠️ Error types
// Library errors are typed; binaries wrap them with anyhow context.

use thiserror::Error;

/// Registry lookups and registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown bank account type: {0}")]
    NotFound(String),
    #[error("Bank account type already registered: {0}")]
    DuplicateTypeCode(String),
    #[error("Invalid {field} pattern for {type_code}: {message}")]
    InvalidPattern {
        type_code: String,
        field: &'static str,
        message: String,
    },
}

/// Why an IBAN was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IbanError {
    #[error("IBAN is too short")]
    TooShort,
    #[error("IBAN contains an invalid character: {0:?}")]
    InvalidCharacter(char),
    #[error("IBAN country is not recognised: {0}")]
    UnknownCountry(String),
    #[error("IBAN has the wrong length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("IBAN account part does not match the {0} format")]
    InvalidFormat(String),
    #[error("IBAN check digits do not match")]
    ChecksumMismatch,
}

/// Persistence adapter failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Bank account is invalid: {}", format_field_errors(.0))]
    Invalid(Vec<crate::validation::FieldError>),
    #[error("Bank account not found: {0}")]
    NotFound(String),
    #[error("Bank account {account_id} does not belong to user {user_id}")]
    NotOwner { account_id: String, user_id: String },
    #[error("Bank account has been invalidated: {0}")]
    Invalidated(String),
    #[error("Bank account type cannot change from {from} to {to}")]
    TypeCodeChanged { from: String, to: String },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
}

fn format_field_errors(errors: &[crate::validation::FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
