// 💳 Bank Account Entity - one payout account a user registered
//
// Identity: UUID (never changes); the type code is fixed at creation.
// Values: bank code, branch code, account number, account type (user-editable).
// Lifecycle: never deleted, only invalidated when a newer account supersedes it.

use crate::rules::BankAccountRule;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

// ============================================================================
// ACCOUNT NUMBER (secret)
// ============================================================================

/// Decrypted account number
///
/// The host encrypts this at rest; here it is only ever read by validation and
/// masking. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(value: impl Into<String>) -> Self {
        AccountNumber(value.into())
    }

    /// The plain value; keep it out of logs
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Last four characters (the whole value if shorter)
    pub fn last_four(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(4);
        chars[start..].iter().collect()
    }
}

impl fmt::Debug for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountNumber(******{})", self.last_four())
    }
}

impl From<&str> for AccountNumber {
    fn from(value: &str) -> Self {
        AccountNumber::new(value)
    }
}

impl From<String> for AccountNumber {
    fn from(value: String) -> Self {
        AccountNumber::new(value)
    }
}

// ============================================================================
// SUBMITTED FIELDS
// ============================================================================

/// What a user submits when adding or editing payout details
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BankAccountFields {
    #[serde(default)]
    pub bank_code: Option<String>,
    #[serde(default)]
    pub branch_code: Option<String>,
    pub account_number: AccountNumber,
    #[serde(default)]
    pub account_type: Option<String>,
}

// ============================================================================
// BANK ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BankAccountInstance {
    // ========================================================================
    // IDENTITY (never changes)
    // ========================================================================
    pub id: String,
    pub user_id: String,
    /// Which rule applies (e.g. "JP")
    pub type_code: String,

    // ========================================================================
    // VALUES
    // ========================================================================
    pub bank_code: Option<String>,
    pub branch_code: Option<String>,
    pub account_number: AccountNumber,
    pub account_type: Option<String>,

    // ========================================================================
    // LIFECYCLE
    // ========================================================================
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when superseded; None = still the user's live account
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl BankAccountInstance {
    /// Create a new account for `rule`
    ///
    /// Rules that require an account type get their default when none was
    /// submitted. This happens here, once, and never again on update.
    pub fn create(user_id: impl Into<String>, rule: &BankAccountRule, fields: BankAccountFields) -> Self {
        let now = Utc::now();

        let account_type = match (&rule.requires_account_type, fields.account_type) {
            (Some(requirement), None) => Some(requirement.default.clone()),
            (_, submitted) => submitted,
        };

        BankAccountInstance {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            type_code: rule.type_code.clone(),
            bank_code: fields.bank_code,
            branch_code: fields.branch_code,
            account_number: fields.account_number,
            account_type,
            created_at: now,
            updated_at: now,
            invalidated_at: None,
        }
    }

    /// Replace the editable values; identity and type code stay put
    pub fn apply_update(&mut self, fields: BankAccountFields) {
        self.bank_code = fields.bank_code;
        self.branch_code = fields.branch_code;
        self.account_number = fields.account_number;
        self.account_type = fields.account_type;
        self.updated_at = Utc::now();
    }

    pub fn is_alive(&self) -> bool {
        self.invalidated_at.is_none()
    }

    /// Soft-invalidate; a second call keeps the first timestamp
    pub fn invalidate(&mut self, at: DateTime<Utc>) {
        if self.invalidated_at.is_none() {
            self.invalidated_at = Some(at);
        }
    }

    /// Bank code as the validator sees it (absent = empty)
    pub fn bank_code_str(&self) -> &str {
        self.bank_code.as_deref().unwrap_or("")
    }

    pub fn branch_code_str(&self) -> &str {
        self.branch_code.as_deref().unwrap_or("")
    }

    pub fn account_number_last_four(&self) -> String {
        self.account_number.last_four()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    fn fields(bank: &str, account: &str) -> BankAccountFields {
        BankAccountFields {
            bank_code: Some(bank.to_string()),
            branch_code: None,
            account_number: AccountNumber::new(account),
            account_type: None,
        }
    }

    #[test]
    fn test_create_assigns_identity() {
        let rule = registry::global().lookup("TH").unwrap();
        let account = BankAccountInstance::create("user-1", rule, fields("123", "1234567890"));

        assert!(!account.id.is_empty());
        assert_eq!(account.user_id, "user-1");
        assert_eq!(account.type_code, "TH");
        assert!(account.is_alive());
        assert_eq!(account.created_at, account.updated_at);
        assert_eq!(account.account_type, None);
    }

    #[test]
    fn test_create_defaults_account_type() {
        let rule = registry::global().lookup("CL").unwrap();
        let account = BankAccountInstance::create("user-1", rule, fields("001", "123456"));

        assert_eq!(account.account_type.as_deref(), Some("checking"));
    }

    #[test]
    fn test_create_keeps_submitted_account_type() {
        let rule = registry::global().lookup("CO").unwrap();
        let mut submitted = fields("001", "123456789");
        submitted.account_type = Some("savings".to_string());

        let account = BankAccountInstance::create("user-1", rule, submitted);
        assert_eq!(account.account_type.as_deref(), Some("savings"));
    }

    #[test]
    fn test_update_does_not_default_account_type() {
        let rule = registry::global().lookup("CL").unwrap();
        let mut account = BankAccountInstance::create("user-1", rule, fields("001", "123456"));
        let id = account.id.clone();

        account.apply_update(fields("002", "654321"));

        assert_eq!(account.id, id);
        assert_eq!(account.type_code, "CL");
        assert_eq!(account.bank_code.as_deref(), Some("002"));
        assert_eq!(account.account_type, None);
    }

    #[test]
    fn test_invalidate_keeps_first_timestamp() {
        let rule = registry::global().lookup("TH").unwrap();
        let mut account = BankAccountInstance::create("user-1", rule, fields("123", "1234567890"));

        let first = Utc::now();
        account.invalidate(first);
        account.invalidate(first + chrono::Duration::seconds(60));

        assert!(!account.is_alive());
        assert_eq!(account.invalidated_at, Some(first));
    }

    #[test]
    fn test_account_number_is_redacted_in_debug() {
        let number = AccountNumber::new("1234567890");
        let debug = format!("{:?}", number);

        assert_eq!(debug, "AccountNumber(******7890)");
        assert!(!debug.contains("123456"));
    }

    #[test]
    fn test_last_four() {
        assert_eq!(AccountNumber::new("1234567890").last_four(), "7890");
        assert_eq!(AccountNumber::new("12").last_four(), "12");
        assert_eq!(AccountNumber::new("").last_four(), "");
    }

    #[test]
    fn test_fields_deserialize() {
        let json = r#"{"bank_code": "0001", "account_number": "1234567"}"#;
        let fields: BankAccountFields = serde_json::from_str(json).unwrap();

        assert_eq!(fields.bank_code.as_deref(), Some("0001"));
        assert_eq!(fields.branch_code, None);
        assert_eq!(fields.account_number.expose(), "1234567");
    }

    #[test]
    fn test_absent_codes_read_as_empty() {
        let rule = registry::global().lookup("NO").unwrap();
        let account = BankAccountInstance::create(
            "user-1",
            rule,
            BankAccountFields {
                account_number: AccountNumber::new("NO9386011117947"),
                ..Default::default()
            },
        );

        assert_eq!(account.bank_code_str(), "");
        assert_eq!(account.branch_code_str(), "");
    }
}
