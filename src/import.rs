// 📥 Import - batch-check payout details from a CSV export
// Columns: user_id,bank_account_type,bank_code,branch_code,account_number,account_type

use crate::config::RuntimeContext;
use crate::entities::{AccountNumber, BankAccountFields, BankAccountInstance};
use crate::registry::{normalize_type_code, BankAccountRegistry};
use crate::validation::{BankAccountValidator, FieldError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One CSV line; empty cells read as absent
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRow {
    pub user_id: String,
    pub bank_account_type: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub bank_code: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub branch_code: Option<String>,
    pub account_number: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub account_type: Option<String>,
}

impl ImportRow {
    /// Type code in canonical form
    pub fn type_code(&self) -> String {
        normalize_type_code(&self.bank_account_type)
    }

    /// Submitted fields with blank cells as absent
    pub fn fields(&self) -> BankAccountFields {
        BankAccountFields {
            bank_code: non_empty(&self.bank_code),
            branch_code: non_empty(&self.branch_code),
            account_number: AccountNumber::new(self.account_number.trim()),
            account_type: non_empty(&self.account_type),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<ImportRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    read_rows(file)
}

/// Parse rows from any reader (header line required)
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let row: ImportRow = result.with_context(|| format!("Failed to deserialize row {}", index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Valid { routing_number: Option<String>, account_number: String },
    UnknownType { type_code: String },
    Invalid { errors: Vec<FieldError> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    /// 1-based, header excluded
    pub line: usize,
    pub user_id: String,
    pub bank_account_type: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown_type: usize,
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.invalid == 0 && self.unknown_type == 0
    }
}

/// Validate every row, never stopping at the first bad one
pub fn validate_rows(
    registry: &BankAccountRegistry,
    rows: &[ImportRow],
    context: RuntimeContext,
) -> ImportReport {
    let validator = BankAccountValidator::new(registry, context);
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let outcome = match registry.get(&row.type_code()) {
            None => {
                report.unknown_type += 1;
                RowOutcome::UnknownType {
                    type_code: row.bank_account_type.clone(),
                }
            }
            Some(rule) => {
                let account = BankAccountInstance::create(row.user_id.clone(), rule, row.fields());
                match validator.validate(&account) {
                    Ok(Ok(())) => {
                        report.valid += 1;
                        let summary = crate::display::summary(rule, &account);
                        RowOutcome::Valid {
                            routing_number: summary.routing_number,
                            account_number: summary.account_number,
                        }
                    }
                    Ok(Err(errors)) => {
                        report.invalid += 1;
                        RowOutcome::Invalid { errors }
                    }
                    Err(_) => {
                        report.unknown_type += 1;
                        RowOutcome::UnknownType {
                            type_code: row.bank_account_type.clone(),
                        }
                    }
                }
            }
        };

        report.rows.push(RowReport {
            line: index + 1,
            user_id: row.user_id.clone(),
            bank_account_type: row.bank_account_type.clone(),
            outcome,
        });
    }

    report.total = rows.len();

    tracing::info!(
        total = report.total,
        valid = report.valid,
        invalid = report.invalid,
        unknown_type = report.unknown_type,
        "import validated"
    );

    report
}
