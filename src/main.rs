//! Policy Valuation CLI
//!
//! Values a book of policy holdings, looks up rate tiers, and applies loan
//! repayments. Set `RUST_LOG=info` (or `debug`) for engine logging.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use policy_valuation::loan::{load_loan_json, load_loans, LoanLedger};
use policy_valuation::policy::{load_holders, load_policies};
use policy_valuation::rates::load_rate_table;
use policy_valuation::{EngineConfig, RepaymentType, TierOverflow, ValuationRunner};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "policy_valuation", version, about = "Surrender value and policy loan engine")]
struct Cli {
    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RepaymentArg {
    Interest,
    Principal,
    Both,
}

impl From<RepaymentArg> for RepaymentType {
    fn from(arg: RepaymentArg) -> Self {
        match arg {
            RepaymentArg::Interest => RepaymentType::Interest,
            RepaymentArg::Principal => RepaymentType::Principal,
            RepaymentArg::Both => RepaymentType::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Value every holding in a book at a date
    Report {
        /// Policy definitions (JSON array)
        #[arg(long)]
        policies: PathBuf,

        /// Policy holders (CSV)
        #[arg(long)]
        holders: PathBuf,

        /// Outstanding loans (CSV)
        #[arg(long)]
        loans: Option<PathBuf>,

        /// Valuation date (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,

        /// Override the configured loan capacity percentage
        #[arg(long)]
        capacity_pct: Option<Decimal>,

        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Look up the rate tier for a duration or age
    Lookup {
        /// Rate rows (CSV)
        #[arg(long)]
        rates: PathBuf,

        #[arg(long)]
        key: u32,

        /// Report no rate beyond the highest tier instead of clamping
        #[arg(long)]
        no_clamp: bool,
    },

    /// Apply one repayment to a loan and print the updated loan and ledger entry
    Repay {
        /// Loan (JSON)
        #[arg(long)]
        loan: PathBuf,

        /// Repayment date (YYYY-MM-DD); interest is accrued to this date first
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        amount: Decimal,

        #[arg(long = "type", value_enum, default_value = "both")]
        repayment_type: RepaymentArg,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Report { policies, holders, loans, as_of, capacity_pct, format, output } => {
            let mut config = config;
            if let Some(pct) = capacity_pct {
                config.loan_capacity_pct = pct;
            }
            run_report(
                config,
                &policies,
                &holders,
                loans.as_deref(),
                as_of,
                format,
                output.as_deref(),
            )
        }
        Command::Lookup { rates, key, no_clamp } => run_lookup(&config, &rates, key, no_clamp),
        Command::Repay { loan, date, amount, repayment_type } => {
            run_repay(&config, &loan, date, amount, repayment_type.into())
        }
    }
}

fn run_report(
    config: EngineConfig,
    policies: &Path,
    holders: &Path,
    loans: Option<&Path>,
    as_of: NaiveDate,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let start = Instant::now();

    let policies = load_policies(policies)
        .with_context(|| format!("failed to load policies {}", policies.display()))?;
    let holders = load_holders(holders)
        .with_context(|| format!("failed to load holders {}", holders.display()))?;
    let loans = match loans {
        Some(path) => load_loans(path)
            .with_context(|| format!("failed to load loans {}", path.display()))?,
        None => HashMap::new(),
    };
    eprintln!(
        "Loaded {} policies, {} holders, {} loans in {:?}",
        policies.len(),
        holders.len(),
        loans.len(),
        start.elapsed()
    );

    let runner = ValuationRunner::new(policies, config);
    let results = runner.value_book(&holders, &loans, as_of)?;

    let mut reports = Vec::with_capacity(results.len());
    for entry in results {
        match entry.result {
            Ok(report) => reports.push(report),
            Err(err) => error!("{}: {}", entry.policy_number, err),
        }
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for report in &reports {
                csv_writer.serialize(report)?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(writer, &reports)?;
        }
    }

    eprintln!("Valued {} of {} holdings in {:?}", reports.len(), holders.len(), start.elapsed());
    Ok(())
}

fn run_lookup(config: &EngineConfig, rates: &Path, key: u32, no_clamp: bool) -> Result<()> {
    let overflow = if no_clamp { TierOverflow::NoValue } else { config.tier_overflow };
    let table = load_rate_table(rates)
        .with_context(|| format!("failed to load rates {}", rates.display()))?
        .with_overflow(overflow);

    match table.tier_for(key) {
        Some(row) => println!("{} -> [{}, {}] {}%", key, row.min, row.max, row.rate),
        None => println!("{} -> no applicable rate", key),
    }
    Ok(())
}

fn run_repay(
    config: &EngineConfig,
    loan: &Path,
    date: NaiveDate,
    amount: Decimal,
    repayment_type: RepaymentType,
) -> Result<()> {
    let loan = load_loan_json(loan)
        .with_context(|| format!("failed to load loan {}", loan.display()))?;
    if loan.is_settled() {
        bail!("loan {} is already settled", loan.loan_id);
    }

    let mut ledger = LoanLedger::with_convention(loan, config.accrual);
    ledger.repay(date, amount, repayment_type)?;
    let (loan, repayments) = ledger.into_parts();

    let out = serde_json::json!({
        "loan": loan,
        "repayment": repayments.last(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
