// 🔢 IBAN - registered length, BBAN structure, mod-97 check digits
// ISO 13616: CC + 2 check digits + country-specific BBAN (up to 30 chars)

use crate::error::IbanError;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

// ============================================================================
// REGISTERED FORMATS
// ============================================================================

/// Total IBAN length and BBAN structure per country (SWIFT IBAN registry)
pub const IBAN_FORMATS: &[(&str, usize, &str)] = &[
    ("AD", 24, r"\d{8}[A-Z0-9]{12}"),
    ("AE", 23, r"\d{19}"),
    ("AL", 28, r"\d{8}[A-Z0-9]{16}"),
    ("AT", 20, r"\d{16}"),
    ("AZ", 28, r"[A-Z]{4}[A-Z0-9]{20}"),
    ("BA", 20, r"\d{16}"),
    ("BE", 16, r"\d{12}"),
    ("BG", 22, r"[A-Z]{4}\d{6}[A-Z0-9]{8}"),
    ("BH", 22, r"[A-Z]{4}[A-Z0-9]{14}"),
    ("BI", 27, r"\d{23}"),
    ("BR", 29, r"\d{23}[A-Z][A-Z0-9]"),
    ("BY", 28, r"[A-Z0-9]{4}\d{4}[A-Z0-9]{16}"),
    ("CH", 21, r"\d{5}[A-Z0-9]{12}"),
    ("CR", 22, r"\d{18}"),
    ("CY", 28, r"\d{8}[A-Z0-9]{16}"),
    ("CZ", 24, r"\d{20}"),
    ("DE", 22, r"\d{18}"),
    ("DJ", 27, r"\d{23}"),
    ("DK", 18, r"\d{14}"),
    ("DO", 28, r"[A-Z0-9]{4}\d{20}"),
    ("EE", 20, r"\d{16}"),
    ("EG", 29, r"\d{25}"),
    ("ES", 24, r"\d{20}"),
    ("FI", 18, r"\d{14}"),
    ("FK", 18, r"[A-Z]{2}\d{12}"),
    ("FO", 18, r"\d{14}"),
    ("FR", 27, r"\d{10}[A-Z0-9]{11}\d{2}"),
    ("GB", 22, r"[A-Z]{4}\d{14}"),
    ("GE", 22, r"[A-Z]{2}\d{16}"),
    ("GI", 23, r"[A-Z]{4}[A-Z0-9]{15}"),
    ("GL", 18, r"\d{14}"),
    ("GR", 27, r"\d{7}[A-Z0-9]{16}"),
    ("GT", 28, r"[A-Z0-9]{24}"),
    ("HR", 21, r"\d{17}"),
    ("HU", 28, r"\d{24}"),
    ("IE", 22, r"[A-Z]{4}\d{14}"),
    ("IL", 23, r"\d{19}"),
    ("IQ", 23, r"[A-Z]{4}\d{15}"),
    ("IS", 26, r"\d{22}"),
    ("IT", 27, r"[A-Z]\d{10}[A-Z0-9]{12}"),
    ("JO", 30, r"[A-Z]{4}\d{4}[A-Z0-9]{18}"),
    ("KW", 30, r"[A-Z]{4}[A-Z0-9]{22}"),
    ("KZ", 20, r"\d{3}[A-Z0-9]{13}"),
    ("LB", 28, r"\d{4}[A-Z0-9]{20}"),
    ("LC", 32, r"[A-Z]{4}[A-Z0-9]{24}"),
    ("LI", 21, r"\d{5}[A-Z0-9]{12}"),
    ("LT", 20, r"\d{16}"),
    ("LU", 20, r"\d{3}[A-Z0-9]{13}"),
    ("LV", 21, r"[A-Z]{4}[A-Z0-9]{13}"),
    ("LY", 25, r"\d{21}"),
    ("MC", 27, r"\d{10}[A-Z0-9]{11}\d{2}"),
    ("MD", 24, r"[A-Z0-9]{20}"),
    ("ME", 22, r"\d{18}"),
    ("MK", 19, r"\d{3}[A-Z0-9]{10}\d{2}"),
    ("MN", 20, r"\d{16}"),
    ("MR", 27, r"\d{23}"),
    ("MT", 31, r"[A-Z]{4}\d{5}[A-Z0-9]{18}"),
    ("MU", 30, r"[A-Z]{4}\d{19}[A-Z]{3}"),
    ("NI", 28, r"[A-Z]{4}\d{20}"),
    ("NL", 18, r"[A-Z]{4}\d{10}"),
    ("NO", 15, r"\d{11}"),
    ("OM", 23, r"\d{3}[A-Z0-9]{16}"),
    ("PK", 24, r"[A-Z]{4}[A-Z0-9]{16}"),
    ("PL", 28, r"\d{24}"),
    ("PS", 29, r"[A-Z]{4}[A-Z0-9]{21}"),
    ("PT", 25, r"\d{21}"),
    ("QA", 29, r"[A-Z]{4}[A-Z0-9]{21}"),
    ("RO", 24, r"[A-Z]{4}[A-Z0-9]{16}"),
    ("RS", 22, r"\d{18}"),
    ("RU", 33, r"\d{14}[A-Z0-9]{15}"),
    ("SA", 24, r"\d{2}[A-Z0-9]{18}"),
    ("SC", 31, r"[A-Z]{4}\d{20}[A-Z]{3}"),
    ("SD", 18, r"\d{14}"),
    ("SE", 24, r"\d{20}"),
    ("SI", 19, r"\d{15}"),
    ("SK", 24, r"\d{20}"),
    ("SM", 27, r"[A-Z]\d{10}[A-Z0-9]{12}"),
    ("SO", 23, r"\d{19}"),
    ("ST", 25, r"\d{21}"),
    ("SV", 28, r"[A-Z]{4}\d{20}"),
    ("TL", 23, r"\d{19}"),
    ("TN", 24, r"\d{20}"),
    ("TR", 26, r"\d{6}[A-Z0-9]{16}"),
    ("UA", 29, r"\d{6}[A-Z0-9]{19}"),
    ("VA", 22, r"\d{18}"),
    ("VG", 24, r"[A-Z]{4}\d{16}"),
    ("XK", 20, r"\d{16}"),
    ("YE", 30, r"[A-Z]{4}\d{4}[A-Z0-9]{18}"),
];

const MIN_LENGTH: usize = 5;

static BBAN_FORMATS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    IBAN_FORMATS
        .iter()
        .map(|(country, _, bban)| {
            let regex = Regex::new(&format!("^(?:{})$", bban)).expect("Invalid BBAN regex pattern");
            (*country, regex)
        })
        .collect()
});

pub fn iban_length(country: &str) -> Option<usize> {
    IBAN_FORMATS
        .iter()
        .find(|(code, _, _)| *code == country)
        .map(|(_, len, _)| *len)
}

/// Whether `bban` has the registered structure for `country`
pub fn bban_matches(country: &str, bban: &str) -> bool {
    BBAN_FORMATS
        .get(country)
        .is_some_and(|format| format.is_match(bban))
}

// ============================================================================
// IBAN VALUE
// ============================================================================

/// A structurally valid IBAN in electronic format (no spaces, upper case)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Iban(String);

impl Iban {
    /// Normalize and validate an IBAN
    ///
    /// Accepts the printed format (groups of four separated by spaces) and
    /// lower-case input.
    pub fn parse(input: &str) -> Result<Iban, IbanError> {
        let electronic: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if electronic.len() < MIN_LENGTH {
            return Err(IbanError::TooShort);
        }

        if let Some(bad) = electronic.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(IbanError::InvalidCharacter(bad));
        }

        let country = &electronic[0..2];
        if !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(IbanError::UnknownCountry(country.to_string()));
        }
        if let Some(bad) = electronic[2..4].chars().find(|c| !c.is_ascii_digit()) {
            return Err(IbanError::InvalidCharacter(bad));
        }

        let expected = iban_length(country)
            .ok_or_else(|| IbanError::UnknownCountry(country.to_string()))?;
        if electronic.len() != expected {
            return Err(IbanError::WrongLength {
                expected,
                actual: electronic.len(),
            });
        }

        if !bban_matches(country, &electronic[4..]) {
            return Err(IbanError::InvalidFormat(country.to_string()));
        }

        if mod97(&electronic) != 1 {
            return Err(IbanError::ChecksumMismatch);
        }

        Ok(Iban(electronic))
    }

    pub fn country_code(&self) -> &str {
        &self.0[0..2]
    }

    pub fn check_digits(&self) -> &str {
        &self.0[2..4]
    }

    pub fn bban(&self) -> &str {
        &self.0[4..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iban {
    /// Printed format: groups of four
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.0.chars().collect();
        let groups: Vec<String> = chars.chunks(4).map(|c| c.iter().collect()).collect();
        f.write_str(&groups.join(" "))
    }
}

/// Convenience wrapper used by the validator
pub fn is_valid(input: &str) -> bool {
    Iban::parse(input).is_ok()
}

/// Remainder of the rearranged IBAN (BBAN + country + check digits) modulo 97,
/// with letters expanded to 10..=35. Computed digit by digit to stay in u32.
fn mod97(electronic: &str) -> u32 {
    let (head, tail) = electronic.split_at(4);
    let mut remainder: u32 = 0;

    for c in tail.chars().chain(head.chars()) {
        // Caller guarantees ASCII alphanumeric
        let value = c.to_digit(36).unwrap_or(0);
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ibans() {
        assert!(is_valid("IL620108000000099999999"));
        assert!(is_valid("KW81CBKU0000000000001234560101"));
        assert!(is_valid("DE89370400440532013000"));
        assert!(is_valid("GB82WEST12345698765432"));
        assert!(is_valid("NO9386011117947"));
        assert!(is_valid("FR1420041010050500013M02606"));
    }

    #[test]
    fn test_printed_and_lowercase_format() {
        let iban = Iban::parse("de89 3704 0044 0532 0130 00").unwrap();
        assert_eq!(iban.as_str(), "DE89370400440532013000");
        assert_eq!(iban.to_string(), "DE89 3704 0044 0532 0130 00");
        assert_eq!(iban.country_code(), "DE");
        assert_eq!(iban.check_digits(), "89");
        assert_eq!(iban.bban(), "370400440532013000");
    }

    #[test]
    fn test_corrupted_checksum() {
        assert_eq!(
            Iban::parse("IL630108000000099999999"),
            Err(IbanError::ChecksumMismatch)
        );
        assert_eq!(
            Iban::parse("KW82CBKU0000000000001234560101"),
            Err(IbanError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(
            Iban::parse("DE8937040044053201300"),
            Err(IbanError::WrongLength {
                expected: 22,
                actual: 21
            })
        );
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(Iban::parse("DE8"), Err(IbanError::TooShort));
        assert_eq!(Iban::parse(""), Err(IbanError::TooShort));
        assert_eq!(
            Iban::parse("DE89-3704-0044"),
            Err(IbanError::InvalidCharacter('-'))
        );
        assert_eq!(
            Iban::parse("ZZ89370400440532013000"),
            Err(IbanError::UnknownCountry("ZZ".to_string()))
        );
        assert_eq!(
            Iban::parse("12893704004405320130"),
            Err(IbanError::UnknownCountry("12".to_string()))
        );
        assert_eq!(
            Iban::parse("DEX9370400440532013000"),
            Err(IbanError::InvalidCharacter('X'))
        );
    }

    #[test]
    fn test_bban_structure_is_checked_before_checksum() {
        // Both carry correct check digits but the wrong BBAN shape
        assert_eq!(
            Iban::parse("IL94ABCDEFGHIJKLMNOPQRS"),
            Err(IbanError::InvalidFormat("IL".to_string()))
        );
        assert_eq!(
            Iban::parse("KW501234ABCDEFGHIJKLMNOPQRSTUV"),
            Err(IbanError::InvalidFormat("KW".to_string()))
        );
        assert!(!is_valid("IL94ABCDEFGHIJKLMNOPQRS"));
        assert!(!is_valid("KW501234ABCDEFGHIJKLMNOPQRSTUV"));
    }

    #[test]
    fn test_bban_formats() {
        assert!(bban_matches("IL", "0108000000099999999"));
        assert!(!bban_matches("IL", "010800000009999999A"));
        assert!(bban_matches("KW", "CBKU0000000000001234560101"));
        assert!(!bban_matches("KW", "1234CBKU000000000001234560"));
        assert!(bban_matches("GB", "WEST12345698765432"));
        assert!(!bban_matches("US", "123"));
    }

    #[test]
    fn test_every_country_has_a_compiled_format() {
        for (country, length, _) in IBAN_FORMATS {
            assert!(BBAN_FORMATS.contains_key(*country), "{}", country);
            assert!(*length > 4 && *length <= 34, "{}", country);
        }
        assert_eq!(BBAN_FORMATS.len(), IBAN_FORMATS.len());
    }

    #[test]
    fn test_plain_account_number_is_not_an_iban() {
        assert!(!is_valid("1234567890"));
    }

    #[test]
    fn test_length_lookup() {
        assert_eq!(iban_length("IL"), Some(23));
        assert_eq!(iban_length("KW"), Some(30));
        assert_eq!(iban_length("US"), None);
    }
}
