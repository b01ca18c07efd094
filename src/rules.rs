// 🏷️ Bank Account Rules - Rules as Data
// One immutable rule per payout country: field formats, routing, display.

use crate::error::RegistryError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACCOUNT_TYPE_CHECKING: &str = "checking";
pub const ACCOUNT_TYPE_SAVINGS: &str = "savings";

// ============================================================================
// PATTERN
// ============================================================================

/// A field format that must match the WHOLE value
///
/// The source is wrapped as `^(?:source)$` before compiling, so a pattern can
/// never accept a value that merely contains a matching substring.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Pattern { source, regex })
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Pattern::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

// ============================================================================
// RULE OPTIONS
// ============================================================================

/// How bank code and branch code combine into a routing number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingNumberJoin {
    /// No routing number at all
    None,
    /// "BANK-BRANCH"
    Hyphen,
    /// "BANKBRANCH"
    Concatenate,
}

/// Where the account's country comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountrySource {
    /// ISO 3166-1 alpha-2 code fixed by the rule
    Fixed(String),
    /// First two characters of the account number (SEPA IBANs)
    AccountNumberPrefix,
}

/// Allowed account types and the value assumed at creation when none is given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypeRequirement {
    pub allowed: Vec<String>,
    pub default: String,
}

impl AccountTypeRequirement {
    /// checking / savings, defaulting to checking
    pub fn checking_or_savings() -> Self {
        AccountTypeRequirement {
            allowed: vec![
                ACCOUNT_TYPE_CHECKING.to_string(),
                ACCOUNT_TYPE_SAVINGS.to_string(),
            ],
            default: ACCOUNT_TYPE_CHECKING.to_string(),
        }
    }

    pub fn allows(&self, account_type: &str) -> bool {
        self.allowed.iter().any(|t| t == account_type)
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccountRule {
    /// Payout method type code (e.g. "JP")
    pub type_code: String,

    pub country: CountrySource,

    /// ISO 4217 settlement currency
    pub currency: String,

    pub bank_code_pattern: Option<Pattern>,
    pub branch_code_pattern: Option<Pattern>,
    pub account_number_pattern: Option<Pattern>,

    /// Check the account number as an IBAN instead of a pattern
    pub use_iban_validation: bool,

    pub routing_number_join: RoutingNumberJoin,

    /// Masked display reads "IL******1234" instead of "******1234"
    pub show_country_prefix_in_display: bool,

    pub requires_account_type: Option<AccountTypeRequirement>,

    /// Skip the account-number check unless running in live production
    pub production_only_account_check: bool,
}

impl BankAccountRule {
    /// Rule with no format checks, a hyphen-joined routing number and plain display
    pub fn new(
        type_code: impl Into<String>,
        country: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        BankAccountRule {
            type_code: type_code.into(),
            country: CountrySource::Fixed(country.into()),
            currency: currency.into(),
            bank_code_pattern: None,
            branch_code_pattern: None,
            account_number_pattern: None,
            use_iban_validation: false,
            routing_number_join: RoutingNumberJoin::Hyphen,
            show_country_prefix_in_display: false,
            requires_account_type: None,
            production_only_account_check: false,
        }
    }

    /// Builder: bank code format
    pub fn with_bank_code(mut self, source: &str) -> Result<Self, RegistryError> {
        self.bank_code_pattern = Some(self.compile("bank_code", source)?);
        Ok(self)
    }

    /// Builder: branch code format
    pub fn with_branch_code(mut self, source: &str) -> Result<Self, RegistryError> {
        self.branch_code_pattern = Some(self.compile("branch_code", source)?);
        Ok(self)
    }

    /// Builder: account number format
    pub fn with_account_number(mut self, source: &str) -> Result<Self, RegistryError> {
        self.account_number_pattern = Some(self.compile("account_number", source)?);
        Ok(self)
    }

    pub fn with_iban_validation(mut self) -> Self {
        self.use_iban_validation = true;
        self
    }

    pub fn with_routing_join(mut self, join: RoutingNumberJoin) -> Self {
        self.routing_number_join = join;
        self
    }

    pub fn with_country_prefix_display(mut self) -> Self {
        self.show_country_prefix_in_display = true;
        self
    }

    pub fn with_account_type(mut self, requirement: AccountTypeRequirement) -> Self {
        self.requires_account_type = Some(requirement);
        self
    }

    pub fn with_production_only_account_check(mut self) -> Self {
        self.production_only_account_check = true;
        self
    }

    pub fn with_country_source(mut self, country: CountrySource) -> Self {
        self.country = country;
        self
    }

    pub fn has_routing_number(&self) -> bool {
        self.routing_number_join != RoutingNumberJoin::None
    }

    /// Fixed country code, if the rule has one
    pub fn fixed_country(&self) -> Option<&str> {
        match &self.country {
            CountrySource::Fixed(code) => Some(code),
            CountrySource::AccountNumberPrefix => None,
        }
    }

    fn compile(&self, field: &'static str, source: &str) -> Result<Pattern, RegistryError> {
        Pattern::new(source).map_err(|e| RegistryError::InvalidPattern {
            type_code: self.type_code.clone(),
            field,
            message: e.to_string(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::new("[0-9]{4}").unwrap();

        assert!(pattern.is_full_match("1234"));
        assert!(!pattern.is_full_match("12345"));
        assert!(!pattern.is_full_match("x1234"));
        assert!(!pattern.is_full_match("1234\n"));
        assert!(!pattern.is_full_match(""));
    }

    #[test]
    fn test_pattern_alternation_is_grouped() {
        // Without the non-capturing group, "^a|b$" would accept "ax"
        let pattern = Pattern::new("a|b").unwrap();
        assert!(pattern.is_full_match("a"));
        assert!(pattern.is_full_match("b"));
        assert!(!pattern.is_full_match("ax"));
        assert!(!pattern.is_full_match("xb"));
    }

    #[test]
    fn test_pattern_serde_uses_source() {
        let pattern = Pattern::new(r"\d{3}").unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, r#""\\d{3}""#);

        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);

        let bad: Result<Pattern, _> = serde_json::from_str(r#""[0-9""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_rule_builder_defaults() {
        let rule = BankAccountRule::new("NO", "NO", "NOK");

        assert_eq!(rule.fixed_country(), Some("NO"));
        assert!(rule.has_routing_number());
        assert_eq!(rule.routing_number_join, RoutingNumberJoin::Hyphen);
        assert!(rule.bank_code_pattern.is_none());
        assert!(!rule.use_iban_validation);
        assert!(!rule.production_only_account_check);
    }

    #[test]
    fn test_rule_builder_rejects_bad_pattern() {
        let result = BankAccountRule::new("XX", "XX", "XXX").with_bank_code("[0-9");

        match result {
            Err(RegistryError::InvalidPattern { type_code, field, .. }) => {
                assert_eq!(type_code, "XX");
                assert_eq!(field, "bank_code");
            }
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_account_type_requirement() {
        let requirement = AccountTypeRequirement::checking_or_savings();
        assert!(requirement.allows("checking"));
        assert!(requirement.allows("savings"));
        assert!(!requirement.allows("credit"));
        assert_eq!(requirement.default, "checking");
    }

    #[test]
    fn test_no_routing_number() {
        let rule = BankAccountRule::new("IL", "IL", "ILS").with_routing_join(RoutingNumberJoin::None);
        assert!(!rule.has_routing_number());
    }
}
