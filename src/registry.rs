// 🗂️ Bank Account Registry
// Every supported payout country as one row of data, looked up by type code.
//
// The table below is the single source of truth for which countries skip the
// routing number, prefix the masked number with the country, or only check the
// account number in production.

use crate::error::RegistryError;
use crate::rules::{AccountTypeRequirement, BankAccountRule, CountrySource, RoutingNumberJoin};
use std::collections::HashMap;
use std::sync::LazyLock;

/// SWIFT/BIC: bank (4) + country (2) + location (2) + optional branch (3)
const SWIFT_CODE: &str = "[a-zA-Z]{4}[a-zA-Z]{2}[0-9a-zA-Z]{2}([0-9a-zA-Z]{3})?";

static GLOBAL_REGISTRY: LazyLock<BankAccountRegistry> = LazyLock::new(|| {
    BankAccountRegistry::with_default_rules().expect("built-in bank account rules are valid")
});

/// Canonical form of a type code typed by a user or read from a file ("jp " -> "JP")
pub fn normalize_type_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Process-wide registry of the built-in rules, built on first use
pub fn global() -> &'static BankAccountRegistry {
    &GLOBAL_REGISTRY
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Read-only after construction; share it freely across threads
#[derive(Debug, Clone, Default)]
pub struct BankAccountRegistry {
    /// Registration order
    rules: Vec<BankAccountRule>,
    by_type_code: HashMap<String, usize>,
}

impl BankAccountRegistry {
    /// Registry with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in country rule
    pub fn with_default_rules() -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        registry.register_default_rules()?;
        tracing::debug!(count = registry.count(), "bank account rules registered");
        Ok(registry)
    }

    /// Add a rule; type codes are unique
    pub fn register(&mut self, rule: BankAccountRule) -> Result<(), RegistryError> {
        if self.by_type_code.contains_key(&rule.type_code) {
            return Err(RegistryError::DuplicateTypeCode(rule.type_code));
        }
        self.by_type_code.insert(rule.type_code.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Find the rule for an exact type code
    ///
    /// Callers holding user input run it through `normalize_type_code` first.
    pub fn lookup(&self, type_code: &str) -> Result<&BankAccountRule, RegistryError> {
        self.get(type_code)
            .ok_or_else(|| RegistryError::NotFound(type_code.to_string()))
    }

    pub fn get(&self, type_code: &str) -> Option<&BankAccountRule> {
        self.by_type_code.get(type_code).map(|&i| &self.rules[i])
    }

    /// All rules in registration order
    pub fn all_rules(&self) -> &[BankAccountRule] {
        &self.rules
    }

    pub fn type_codes(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.type_code.as_str()).collect()
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    /// Rules with a fixed country equal to `country`
    pub fn by_country(&self, country: &str) -> Vec<&BankAccountRule> {
        self.rules
            .iter()
            .filter(|r| r.fixed_country().is_some_and(|c| c.eq_ignore_ascii_case(country)))
            .collect()
    }

    pub fn by_currency(&self, currency: &str) -> Vec<&BankAccountRule> {
        self.rules
            .iter()
            .filter(|r| r.currency.eq_ignore_ascii_case(currency))
            .collect()
    }

    // ========================================================================
    // BUILT-IN RULES
    // ========================================================================

    fn register_default_rules(&mut self) -> Result<(), RegistryError> {
        let checking_or_savings = AccountTypeRequirement::checking_or_savings;

        let rules = vec![
            BankAccountRule::new("AL", "AL", "ALL").with_bank_code("[0-9a-zA-Z]{8,11}")?,
            BankAccountRule::new("DZ", "DZ", "DZD")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number(r"\d{20}")?,
            BankAccountRule::new("AO", "AO", "AOA").with_bank_code("[0-9a-zA-Z]{8,11}")?,
            BankAccountRule::new("AG", "AG", "XCD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{1,32}")?,
            BankAccountRule::new("AM", "AM", "AMD")
                .with_bank_code("[0-9A-Za-z]{8,11}")?
                .with_account_number(r"\d{11,16}")?,
            BankAccountRule::new("AZ", "AZ", "AZN")
                .with_bank_code(r"\d{6}")?
                .with_branch_code(r"\d{6}")?,
            BankAccountRule::new("BS", "BS", "BSD")
                .with_bank_code("[a-z0-9A-Z]{8,11}")?
                .with_account_number(r"\d{1,10}")?,
            BankAccountRule::new("BH", "BH", "BHD").with_bank_code("[0-9a-zA-Z]{8,11}")?,
            BankAccountRule::new("BD", "BD", "BDT")
                .with_bank_code("[0-9a-zA-Z]{9}")?
                .with_account_number("[0-9a-zA-Z]{13,17}")?,
            BankAccountRule::new("BT", "BT", "BTN")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9a-zA-Z]{1,17}")?,
            BankAccountRule::new("BO", "BO", "BOB")
                .with_bank_code(r"\d{1,3}")?
                .with_account_number(r"\d{10,15}")?,
            BankAccountRule::new("BN", "BN", "BND")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9]{1,13}")?,
            BankAccountRule::new("CL", "CL", "CLP")
                .with_bank_code("[0-9]{3}")?
                .with_account_number("[0-9]{5,25}")?
                .with_account_type(checking_or_savings()),
            BankAccountRule::new("CO", "CO", "COP")
                .with_bank_code("[0-9]{3}")?
                .with_account_number("[0-9]{9,16}")?
                .with_account_type(checking_or_savings()),
            BankAccountRule::new("DO", "DO", "DOP")
                .with_bank_code(r"\d{1,3}")?
                .with_account_number(r"\d{1,28}")?,
            BankAccountRule::new("EC", "EC", "USD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[0-9]{5,18}")?,
            BankAccountRule::new("EG", "EG", "EGP").with_bank_code(SWIFT_CODE)?,
            BankAccountRule::new("ET", "ET", "ETB")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9a-zA-Z]{13,16}")?,
            // SEPA: the IBAN itself says which country the account is in
            BankAccountRule::new("EU", "", "EUR")
                .with_country_source(CountrySource::AccountNumberPrefix),
            BankAccountRule::new("GA", "GA", "XAF")
                .with_bank_code("[0-9A-Za-z]{8,11}")?
                .with_account_number("[0-9]{23}")?,
            BankAccountRule::new("GH", "GH", "GHS")
                .with_bank_code("[0-9]{6}")?
                .with_account_number("[0-9]{8,20}")?,
            BankAccountRule::new("GT", "GT", "GTQ")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{1,34}")?,
            BankAccountRule::new("ID", "ID", "IDR")
                .with_bank_code("[0-9a-zA-Z]{3,4}")?
                .with_account_number("[0-9]{1,35}")?,
            BankAccountRule::new("IL", "IL", "ILS")
                .with_iban_validation()
                .with_routing_join(RoutingNumberJoin::None)
                .with_country_prefix_display()
                .with_production_only_account_check(),
            BankAccountRule::new("JM", "JM", "JMD")
                .with_bank_code(r"\d{3}")?
                .with_branch_code(r"\d{5}")?
                .with_account_number(r"\d{1,18}")?,
            BankAccountRule::new("JP", "JP", "JPY")
                .with_bank_code("[0-9]{4}")?
                .with_branch_code("[0-9]{3}")?
                .with_account_number("[0-9]{4,8}")?
                .with_routing_join(RoutingNumberJoin::Concatenate),
            BankAccountRule::new("JO", "JO", "JOD").with_bank_code("[0-9a-zA-Z]{8,11}")?,
            BankAccountRule::new("KZ", "KZ", "KZT").with_bank_code("[a-zA-Z0-9]{8,11}")?,
            BankAccountRule::new("KE", "KE", "KES")
                .with_bank_code(SWIFT_CODE)?
                .with_account_number("[0-9a-zA-Z]{1,32}")?,
            BankAccountRule::new("KR", "KR", "KRW")
                .with_bank_code("[A-Za-z]{4}KR[A-Za-z0-9]{2,5}")?
                .with_account_number("[0-9]{11,15}")?,
            BankAccountRule::new("KW", "KW", "KWD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_iban_validation(),
            BankAccountRule::new("LA", "LA", "LAK")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9a-zA-Z]{1,18}")?,
            BankAccountRule::new("MO", "MO", "MOP")
                .with_bank_code("[A-Za-z0-9]{8,11}")?
                .with_account_number(r"\d{1,19}")?,
            BankAccountRule::new("MG", "MG", "MGA")
                .with_bank_code(SWIFT_CODE)?
                .with_account_number("MG[0-9]{25}")?,
            BankAccountRule::new("MY", "MY", "MYR")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9]{5,17}")?
                .with_production_only_account_check(),
            BankAccountRule::new("MU", "MU", "MUR").with_bank_code("[a-zA-Z0-9]{8,11}")?,
            BankAccountRule::new("MZ", "MZ", "MZN")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number("[0-9a-zA-Z]{21}")?,
            BankAccountRule::new("NA", "NA", "NAD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{8,13}")?,
            BankAccountRule::new("NG", "NG", "NGN")
                .with_bank_code("[0-9a-zA-Z]{8,11}")?
                .with_account_number(r"\d{10}")?
                .with_country_prefix_display()
                .with_production_only_account_check(),
            BankAccountRule::new("MK", "MK", "MKD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{19}")?,
            BankAccountRule::new("NO", "NO", "NOK"),
            BankAccountRule::new("OM", "OM", "OMR")
                .with_bank_code("[A-Z]{4}OM[A-Z0-9]{2,5}")?
                .with_account_number("[0-9]{6,16}")?,
            BankAccountRule::new("PK", "PK", "PKR").with_bank_code(SWIFT_CODE)?,
            BankAccountRule::new("PA", "PA", "USD")
                .with_bank_code("[A-Z]{4}PAPA[A-Z0-9]{3}")?
                .with_account_number(r"\d{1,18}")?,
            BankAccountRule::new("PY", "PY", "PYG")
                .with_bank_code("[0-9]{1,2}")?
                .with_account_number("[0-9]{1,16}")?,
            BankAccountRule::new("PH", "PH", "PHP")
                .with_bank_code("[A-Za-z0-9]{8,11}")?
                .with_account_number("[0-9]{1,17}")?,
            BankAccountRule::new("QA", "QA", "QAR")
                .with_bank_code("[a-zA-Z0-9]{11}")?
                .with_account_number("[a-zA-Z0-9]{29}")?,
            BankAccountRule::new("LC", "LC", "XCD")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{1,32}")?,
            BankAccountRule::new("SA", "SA", "SAR").with_bank_code(SWIFT_CODE)?,
            BankAccountRule::new("SG", "SG", "SGD")
                .with_bank_code("[0-9]{4}")?
                .with_branch_code("[0-9]{3}")?
                .with_account_number("[0-9]{6,19}")?,
            BankAccountRule::new("ZA", "ZA", "ZAR")
                .with_bank_code(SWIFT_CODE)?
                .with_account_number("[0-9a-zA-Z]{1,16}")?,
            BankAccountRule::new("LK", "LK", "LKR")
                .with_bank_code("[a-z0-9A-Z]{11}")?
                .with_branch_code(r"\d{7}")?
                .with_account_number(r"\d{10,18}")?,
            BankAccountRule::new("TW", "TW", "TWD")
                .with_bank_code(SWIFT_CODE)?
                .with_account_number("[0-9]{10,14}")?,
            BankAccountRule::new("TZ", "TZ", "TZS")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_account_number("[a-zA-Z0-9]{10,14}")?,
            BankAccountRule::new("TH", "TH", "THB")
                .with_bank_code("[0-9]{3}")?
                .with_account_number("[0-9]{6,15}")?,
            BankAccountRule::new("TT", "TT", "TTD")
                .with_bank_code("[0-9]{3}")?
                .with_branch_code("[0-9]{5}")?
                .with_account_number("[0-9]{1,17}")?,
            BankAccountRule::new("TN", "TN", "TND"),
            BankAccountRule::new("TR", "TR", "TRY").with_bank_code(SWIFT_CODE)?,
            BankAccountRule::new("UY", "UY", "UYU")
                .with_bank_code(r"\d{3}")?
                .with_account_number(r"\d{1,12}")?,
            BankAccountRule::new("UZ", "UZ", "UZS")
                .with_bank_code("[a-zA-Z0-9]{8,11}")?
                .with_branch_code("[0-9]{5}")?
                .with_account_number(r"\d{5,20}")?,
            BankAccountRule::new("VN", "VN", "VND")
                .with_bank_code("[0-9]{8}")?
                .with_account_number("[0-9]{1,17}")?,
        ];

        for rule in rules {
            self.register(rule)?;
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_initialization() {
        let registry = BankAccountRegistry::with_default_rules().unwrap();

        assert_eq!(registry.count(), 61);
        assert_eq!(registry.all_rules().len(), 61);
    }

    #[test]
    fn test_registration_order_is_stable() {
        let registry = BankAccountRegistry::with_default_rules().unwrap();
        let codes = registry.type_codes();

        assert_eq!(&codes[..4], &["AL", "DZ", "AO", "AG"]);
        assert_eq!(codes.last(), Some(&"VN"));
        assert_eq!(codes, global().type_codes());
    }

    #[test]
    fn test_lookup() {
        let registry = global();

        let japan = registry.lookup("JP").unwrap();
        assert_eq!(japan.fixed_country(), Some("JP"));
        assert_eq!(japan.currency, "JPY");
        assert_eq!(japan.routing_number_join, RoutingNumberJoin::Concatenate);

        // Exact match; user input is normalized first
        assert_eq!(registry.lookup("jp"), Err(RegistryError::NotFound("jp".to_string())));
        assert!(registry.get(" JP").is_none());
        assert_eq!(registry.lookup(&normalize_type_code(" jp ")).unwrap().type_code, "JP");
    }

    #[test]
    fn test_lookup_unknown_type_code() {
        let result = global().lookup("US");
        assert_eq!(result.unwrap_err(), RegistryError::NotFound("US".to_string()));
        assert!(global().get("").is_none());
    }

    #[test]
    fn test_duplicate_type_code_rejected() {
        let mut registry = BankAccountRegistry::empty();
        registry.register(BankAccountRule::new("NO", "NO", "NOK")).unwrap();

        let result = registry.register(BankAccountRule::new("NO", "NO", "EUR"));
        assert_eq!(result, Err(RegistryError::DuplicateTypeCode("NO".to_string())));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.lookup("NO").unwrap().currency, "NOK");
    }

    #[test]
    fn test_flags_live_in_the_table() {
        let registry = global();

        let no_routing: Vec<&str> = registry
            .all_rules()
            .iter()
            .filter(|r| !r.has_routing_number())
            .map(|r| r.type_code.as_str())
            .collect();
        assert_eq!(no_routing, vec!["IL"]);

        let production_only: Vec<&str> = registry
            .all_rules()
            .iter()
            .filter(|r| r.production_only_account_check)
            .map(|r| r.type_code.as_str())
            .collect();
        assert_eq!(production_only, vec!["IL", "MY", "NG"]);

        let iban: Vec<&str> = registry
            .all_rules()
            .iter()
            .filter(|r| r.use_iban_validation)
            .map(|r| r.type_code.as_str())
            .collect();
        assert_eq!(iban, vec!["IL", "KW"]);

        let account_type: Vec<&str> = registry
            .all_rules()
            .iter()
            .filter(|r| r.requires_account_type.is_some())
            .map(|r| r.type_code.as_str())
            .collect();
        assert_eq!(account_type, vec!["CL", "CO"]);
    }

    #[test]
    fn test_by_currency_and_country() {
        let registry = global();

        let usd: Vec<&str> = registry
            .by_currency("usd")
            .iter()
            .map(|r| r.type_code.as_str())
            .collect();
        assert_eq!(usd, vec!["EC", "PA"]);

        let xcd = registry.by_currency("XCD");
        assert_eq!(xcd.len(), 2);

        assert_eq!(registry.by_country("JP").len(), 1);
        // EU has no fixed country
        assert!(registry.by_country("").is_empty());
        assert!(registry.by_country("US").is_empty());
    }

    #[test]
    fn test_european_rule_takes_country_from_account_number() {
        let eu = global().lookup("EU").unwrap();
        assert_eq!(eu.country, CountrySource::AccountNumberPrefix);
        assert_eq!(eu.fixed_country(), None);
        assert_eq!(eu.currency, "EUR");
    }
}
