// Creator Payouts - Core Library
// Per-country bank account rules, validation and display for payout details.
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod display;
pub mod entities;
pub mod error;
pub mod iban;
pub mod import;
pub mod reading_time;
pub mod registry;
pub mod rules;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, Environment, RuntimeContext};
pub use display::{country, masked_account_number, routing_number, summary, BankAccountSummary};
pub use entities::{AccountNumber, BankAccountFields, BankAccountInstance};
pub use error::{ConfigError, IbanError, RegistryError, StoreError};
pub use iban::Iban;
pub use import::{load_csv, validate_rows, ImportReport, ImportRow, RowOutcome};
pub use reading_time::{calculate_reading_time, format_reading_time};
pub use registry::BankAccountRegistry;
pub use rules::{AccountTypeRequirement, BankAccountRule, CountrySource, Pattern, RoutingNumberJoin};
pub use store::{
    create_bank_account, get_alive_bank_account_for_user, get_bank_account,
    get_bank_accounts_for_user, get_events_for_entity, setup_database, update_bank_account, Event,
};
pub use validation::{BankAccountValidator, FieldError, FieldName, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
