// Entity Models
// A payout bank account keeps its identity for life; values change, and a
// superseded account is invalidated rather than deleted.

pub mod bank_account;

pub use bank_account::{AccountNumber, BankAccountFields, BankAccountInstance};
