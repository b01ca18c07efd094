// 🪪 Display - routing number, masked account number, payout summary
// Pure functions of an account and its rule.

use crate::entities::BankAccountInstance;
use crate::rules::{BankAccountRule, CountrySource, RoutingNumberJoin};
use serde::Serialize;

pub const MASK: &str = "******";

/// Country of the account: the rule's, or the IBAN prefix for SEPA accounts
pub fn country(rule: &BankAccountRule, account: &BankAccountInstance) -> Option<String> {
    match &rule.country {
        CountrySource::Fixed(code) => Some(code.clone()),
        CountrySource::AccountNumberPrefix => {
            let prefix: String = account.account_number.expose().chars().take(2).collect();
            if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
                Some(prefix.to_ascii_uppercase())
            } else {
                None
            }
        }
    }
}

/// Bank code, joined with the branch code when there is one
pub fn routing_number(rule: &BankAccountRule, account: &BankAccountInstance) -> Option<String> {
    let bank_code = account.bank_code_str();

    match (rule.routing_number_join, account.branch_code.as_deref()) {
        (RoutingNumberJoin::None, _) => None,
        (RoutingNumberJoin::Hyphen, Some(branch)) if !branch.is_empty() => {
            Some(format!("{}-{}", bank_code, branch))
        }
        (RoutingNumberJoin::Concatenate, Some(branch)) if !branch.is_empty() => {
            Some(format!("{}{}", bank_code, branch))
        }
        _ => Some(bank_code.to_string()),
    }
}

/// "******1234", or "IL******1234" for rules that show the country
pub fn masked_account_number(rule: &BankAccountRule, account: &BankAccountInstance) -> String {
    let last_four = account.account_number_last_four();

    if rule.show_country_prefix_in_display {
        let prefix = country(rule, account).unwrap_or_default();
        format!("{}{}{}", prefix, MASK, last_four)
    } else {
        format!("{}{}", MASK, last_four)
    }
}

/// What payout screens and APIs show for an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankAccountSummary {
    /// Omitted from JSON entirely when the country has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    pub account_number: String,
    pub bank_account_type: String,
}

pub fn summary(rule: &BankAccountRule, account: &BankAccountInstance) -> BankAccountSummary {
    BankAccountSummary {
        routing_number: routing_number(rule, account),
        account_number: masked_account_number(rule, account),
        bank_account_type: rule.type_code.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountNumber, BankAccountFields};
    use crate::registry;

    fn account(rule: &BankAccountRule, bank: &str, branch: Option<&str>, number: &str) -> BankAccountInstance {
        BankAccountInstance::create(
            "user-1",
            rule,
            BankAccountFields {
                bank_code: Some(bank.to_string()),
                branch_code: branch.map(str::to_string),
                account_number: AccountNumber::new(number),
                account_type: None,
            },
        )
    }

    #[test]
    fn test_routing_number_hyphen() {
        let rule = registry::global().lookup("TT").unwrap();
        let tt = account(rule, "123", Some("456"), "1234567890");
        assert_eq!(routing_number(rule, &tt), Some("123-456".to_string()));
    }

    #[test]
    fn test_routing_number_concatenate() {
        let rule = registry::global().lookup("JP").unwrap();
        let jp = account(rule, "123", Some("456"), "1234567890");
        assert_eq!(routing_number(rule, &jp), Some("123456".to_string()));
    }

    #[test]
    fn test_routing_number_without_branch() {
        let rule = registry::global().lookup("TH").unwrap();
        let th = account(rule, "123", None, "1234567890");
        assert_eq!(routing_number(rule, &th), Some("123".to_string()));

        // An empty branch counts as absent
        let jp_rule = registry::global().lookup("JP").unwrap();
        let jp = account(jp_rule, "123", Some(""), "1234567890");
        assert_eq!(routing_number(jp_rule, &jp), Some("123".to_string()));
    }

    #[test]
    fn test_no_routing_number_for_israel() {
        let rule = registry::global().lookup("IL").unwrap();
        let il = account(rule, "123", Some("456"), "IL620108000000099999999");
        assert_eq!(routing_number(rule, &il), None);
    }

    #[test]
    fn test_masked_account_number() {
        let rule = registry::global().lookup("TH").unwrap();
        let th = account(rule, "123", None, "1234567890");
        assert_eq!(masked_account_number(rule, &th), "******7890");
    }

    #[test]
    fn test_masked_account_number_with_country_prefix() {
        let rule = registry::global().lookup("IL").unwrap();
        let il = account(rule, "", None, "1234567890");
        assert_eq!(masked_account_number(rule, &il), "IL******7890");

        let ng_rule = registry::global().lookup("NG").unwrap();
        let ng = account(ng_rule, "GTBINGLA", None, "0123456789");
        assert_eq!(masked_account_number(ng_rule, &ng), "NG******6789");
    }

    #[test]
    fn test_summary_omits_missing_routing_number() {
        let rule = registry::global().lookup("IL").unwrap();
        let il = account(rule, "", None, "IL620108000000099999999");

        let json = serde_json::to_value(summary(rule, &il)).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("routing_number"));
        assert_eq!(object["account_number"], "IL******9999");
        assert_eq!(object["bank_account_type"], "IL");
    }

    #[test]
    fn test_summary_with_routing_number() {
        let rule = registry::global().lookup("JP").unwrap();
        let jp = account(rule, "0001", Some("123"), "1234567");

        let json = serde_json::to_value(summary(rule, &jp)).unwrap();
        assert_eq!(json["routing_number"], "0001123");
        assert_eq!(json["account_number"], "******4567");
        assert_eq!(json["bank_account_type"], "JP");
    }

    #[test]
    fn test_european_country_from_iban() {
        let rule = registry::global().lookup("EU").unwrap();
        let de = account(rule, "", None, "de89370400440532013000");
        assert_eq!(country(rule, &de), Some("DE".to_string()));

        let junk = account(rule, "", None, "12");
        assert_eq!(country(rule, &junk), None);
    }
}
