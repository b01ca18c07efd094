use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use creator_payouts::config::DEFAULT_CONFIG_PATH;
use creator_payouts::registry::normalize_type_code;
use creator_payouts::{
    calculate_reading_time, create_bank_account, format_reading_time, load_csv, registry,
    setup_database, summary, validate_rows, AccountNumber, AppConfig, BankAccountFields,
    BankAccountInstance, BankAccountValidator, RowOutcome,
};

#[derive(Parser)]
#[command(name = "creator-payouts")]
#[command(about = "Check and display creator payout bank details", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every supported bank account type
    Types,
    /// Show the rule for one bank account type
    Show { code: String },
    /// Validate one set of bank details
    Validate {
        #[arg(long = "type")]
        type_code: String,
        #[arg(long)]
        bank_code: Option<String>,
        #[arg(long)]
        branch_code: Option<String>,
        #[arg(long)]
        account_number: String,
        #[arg(long)]
        account_type: Option<String>,
    },
    /// Validate a CSV of bank details
    Import {
        csv: PathBuf,
        /// Save valid rows to the database
        #[arg(long)]
        commit: bool,
    },
    /// Estimate reading time of a post (HTML or text)
    ReadingTime { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config).context("Failed to load config")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Types => run_types(),
        Commands::Show { code } => run_show(&code),
        Commands::Validate {
            type_code,
            bank_code,
            branch_code,
            account_number,
            account_type,
        } => run_validate(
            &config,
            &type_code,
            BankAccountFields {
                bank_code,
                branch_code,
                account_number: AccountNumber::new(account_number),
                account_type,
            },
        ),
        Commands::Import { csv, commit } => run_import(&config, &csv, commit),
        Commands::ReadingTime { file } => run_reading_time(&file),
    }
}

fn run_types() -> Result<()> {
    let registry = registry::global();

    println!("🏦 Supported bank account types ({})", registry.count());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for rule in registry.all_rules() {
        println!(
            "  {:<4} {:<4} {}",
            rule.type_code,
            rule.fixed_country().unwrap_or("--"),
            rule.currency
        );
    }

    Ok(())
}

fn run_show(code: &str) -> Result<()> {
    let rule = registry::global().lookup(&normalize_type_code(code))?;
    println!("{}", serde_json::to_string_pretty(rule)?);
    Ok(())
}

fn run_validate(config: &AppConfig, type_code: &str, fields: BankAccountFields) -> Result<()> {
    let registry = registry::global();
    let rule = registry.lookup(&normalize_type_code(type_code))?;
    let account = BankAccountInstance::create("cli", rule, fields);

    let validator = BankAccountValidator::new(registry, config.runtime_context());
    match validator.validate(&account)? {
        Ok(()) => {
            println!("✅ Valid {} bank account", rule.type_code);
            println!("{}", serde_json::to_string_pretty(&summary(rule, &account))?);
            Ok(())
        }
        Err(errors) => {
            println!("❌ Invalid {} bank account", rule.type_code);
            for error in &errors {
                println!("   {}", error);
            }
            bail!("{} field(s) failed validation", errors.len())
        }
    }
}

fn run_import(config: &AppConfig, csv_path: &Path, commit: bool) -> Result<()> {
    println!("📂 Loading {}...", csv_path.display());
    let rows = load_csv(csv_path)?;
    println!("✓ Loaded {} rows", rows.len());

    let registry = registry::global();
    let context = config.runtime_context();
    let report = validate_rows(registry, &rows, context);

    for row in &report.rows {
        match &row.outcome {
            RowOutcome::Valid { account_number, .. } => {
                println!("  ✓ line {} {} {} {}", row.line, row.user_id, row.bank_account_type, account_number)
            }
            RowOutcome::UnknownType { type_code } => {
                println!("  ✗ line {} {} unknown type {}", row.line, row.user_id, type_code)
            }
            RowOutcome::Invalid { errors } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                println!("  ✗ line {} {} invalid: {}", row.line, row.user_id, fields.join(", "))
            }
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Total {} | valid {} | invalid {} | unknown type {}",
        report.total, report.valid, report.invalid, report.unknown_type
    );

    if commit {
        let mut conn = Connection::open(&config.database_path)
            .with_context(|| format!("Failed to open database {}", config.database_path))?;
        setup_database(&conn)?;

        let mut saved = 0;
        for (row, outcome) in rows.iter().zip(&report.rows) {
            if !matches!(outcome.outcome, RowOutcome::Valid { .. }) {
                continue;
            }
            let rule = registry.lookup(&row.type_code())?;
            let account = BankAccountInstance::create(row.user_id.clone(), rule, row.fields());
            create_bank_account(&mut conn, registry, &account, context)
                .with_context(|| format!("Failed to save line {}", outcome.line))?;
            saved += 1;
        }
        println!("💾 Saved {} accounts to {}", saved, config.database_path);
    }

    Ok(())
}

fn run_reading_time(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let minutes = calculate_reading_time(&content);

    if minutes == 0 {
        println!("Too short for a reading time");
    } else {
        println!("{}", format_reading_time(minutes));
    }

    Ok(())
}
