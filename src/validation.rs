// 📐 Validation - bank account fields against their country rule
// Every check runs; all failures are collected, never short-circuited.

use crate::config::RuntimeContext;
use crate::entities::BankAccountInstance;
use crate::error::RegistryError;
use crate::iban;
use crate::registry::BankAccountRegistry;
use crate::rules::BankAccountRule;
use serde::Serialize;
use std::fmt;

// ============================================================================
// FIELD ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    BankCode,
    BranchCode,
    AccountNumber,
    AccountType,
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::BankCode => "bank_code",
            FieldName::BranchCode => "branch_code",
            FieldName::AccountNumber => "account_number",
            FieldName::AccountType => "account_type",
        }
    }

    /// Message shown to the user
    pub fn invalid_message(&self) -> &'static str {
        match self {
            FieldName::BankCode => "The bank code is invalid.",
            FieldName::BranchCode => "The branch code is invalid.",
            FieldName::AccountNumber => "The account number is invalid.",
            FieldName::AccountType => "The account type is invalid.",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field failed its format check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FieldName,
    pub message: String,
}

impl FieldError {
    pub fn format_invalid(field: FieldName) -> Self {
        FieldError {
            field,
            message: field.invalid_message().to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub type ValidationResult = Result<(), Vec<FieldError>>;

// ============================================================================
// RULE CHECKS
// ============================================================================

/// Check `account` against `rule` in the given runtime context
pub fn validate_against(
    rule: &BankAccountRule,
    account: &BankAccountInstance,
    context: RuntimeContext,
) -> ValidationResult {
    let mut errors = Vec::new();

    if !bank_code_valid(rule, account) {
        errors.push(FieldError::format_invalid(FieldName::BankCode));
    }

    if !branch_code_valid(rule, account) {
        errors.push(FieldError::format_invalid(FieldName::BranchCode));
    }

    if !account_number_valid(rule, account, context) {
        errors.push(FieldError::format_invalid(FieldName::AccountNumber));
    }

    if !account_type_valid(rule, account) {
        errors.push(FieldError::format_invalid(FieldName::AccountType));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn bank_code_valid(rule: &BankAccountRule, account: &BankAccountInstance) -> bool {
    match &rule.bank_code_pattern {
        Some(pattern) => pattern.is_full_match(account.bank_code_str()),
        None => true,
    }
}

fn branch_code_valid(rule: &BankAccountRule, account: &BankAccountInstance) -> bool {
    match &rule.branch_code_pattern {
        Some(pattern) => pattern.is_full_match(account.branch_code_str()),
        None => true,
    }
}

fn account_number_valid(
    rule: &BankAccountRule,
    account: &BankAccountInstance,
    context: RuntimeContext,
) -> bool {
    // Legacy accounts in these countries only pass in production data
    if rule.production_only_account_check && !context.is_live_production() {
        return true;
    }

    let number = account.account_number.expose();

    if rule.use_iban_validation {
        return iban::is_valid(number);
    }

    match &rule.account_number_pattern {
        Some(pattern) => pattern.is_full_match(number),
        None => true,
    }
}

fn account_type_valid(rule: &BankAccountRule, account: &BankAccountInstance) -> bool {
    match (&rule.requires_account_type, &account.account_type) {
        (Some(requirement), Some(account_type)) => requirement.allows(account_type),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Looks up each account's rule and validates it
pub struct BankAccountValidator<'a> {
    registry: &'a BankAccountRegistry,
    context: RuntimeContext,
}

impl<'a> BankAccountValidator<'a> {
    pub fn new(registry: &'a BankAccountRegistry, context: RuntimeContext) -> Self {
        BankAccountValidator { registry, context }
    }

    pub fn context(&self) -> RuntimeContext {
        self.context
    }

    /// Validate one account
    ///
    /// The outer error is an unknown type code, which callers reject outright;
    /// the inner result carries the per-field errors shown to the user.
    pub fn validate(&self, account: &BankAccountInstance) -> Result<ValidationResult, RegistryError> {
        let rule = self.registry.lookup(&account.type_code)?;
        let result = validate_against(rule, account, self.context);

        match &result {
            Ok(()) => tracing::debug!(
                account_id = %account.id,
                type_code = %account.type_code,
                "bank account valid"
            ),
            Err(errors) => tracing::warn!(
                account_id = %account.id,
                type_code = %account.type_code,
                fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
                "bank account invalid"
            ),
        }

        Ok(result)
    }

    /// Validate a batch, one outcome per account in input order
    pub fn validate_all(
        &self,
        accounts: &[BankAccountInstance],
    ) -> Vec<Result<ValidationResult, RegistryError>> {
        accounts.iter().map(|a| self.validate(a)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
