//! Command-line shell over the expense tracker backend.
//!
//! One invocation is one session: authenticate, act on the working copy,
//! persist, exit. Edits and deletes are addressed by the record id shown
//! in `list`, which is resolved to the current ledger position before the
//! mutation is applied.

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

use masarif::backend::domain::commands::accounts::{RegisterCommand, UpdateProfileCommand};
use masarif::backend::domain::commands::expenses::ExpenseInput;
use masarif::backend::domain::models::{PaymentMethod, TransportType};
use masarif::backend::domain::stats_service::{BreakdownDimension, ExpenseFilter, Period};
use masarif::backend::domain::Session;
use masarif::backend::Backend;

#[derive(Parser)]
#[command(name = "masarif", version, about = "Transportation expense tracker")]
struct Cli {
    /// Directory holding the JSON store
    #[arg(long, default_value = ".", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct Credentials {
    /// Account username
    #[arg(short, long)]
    username: String,
    /// Account password
    #[arg(short, long)]
    password: String,
}

#[derive(Args, Clone)]
struct ExpenseFields {
    /// Trip date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    /// Starting location
    #[arg(long)]
    from: String,
    /// Destination
    #[arg(long)]
    to: String,
    /// ride-hailing | taxi | metro | bus | private-car | other
    #[arg(long)]
    transport: String,
    /// cash | card | e-wallet | instant-pay | other; defaults to the
    /// profile's payment method
    #[arg(long)]
    payment: Option<String>,
    /// Amount in EGP
    #[arg(long)]
    amount: f64,
    /// Free-text notes
    #[arg(long, default_value = "")]
    notes: String,
    /// Path to a receipt image
    #[arg(long)]
    receipt: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Full name
        #[arg(long)]
        name: String,
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        company: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Add an expense to the ledger
    Add {
        #[command(flatten)]
        auth: Credentials,
        #[command(flatten)]
        expense: ExpenseFields,
    },
    /// List expenses, optionally filtered
    List {
        #[command(flatten)]
        auth: Credentials,
        /// Case-insensitive text matched against from/to/transport/notes
        #[arg(long, default_value = "")]
        search: String,
        /// all | today | this-week | this-month | last-30-days
        #[arg(long, default_value = "all")]
        period: String,
    },
    /// Show totals and per-category breakdowns
    Stats {
        #[command(flatten)]
        auth: Credentials,
    },
    /// Replace an expense (full replace, addressed by id)
    Edit {
        #[command(flatten)]
        auth: Credentials,
        /// Record id as shown by `list`
        #[arg(long)]
        id: String,
        #[command(flatten)]
        expense: ExpenseFields,
    },
    /// Delete an expense by id
    Remove {
        #[command(flatten)]
        auth: Credentials,
        /// Record id as shown by `list`
        #[arg(long)]
        id: String,
    },
    /// Delete every expense on the ledger
    ClearAll {
        #[command(flatten)]
        auth: Credentials,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Update profile fields; omitted fields keep their current value
    Profile {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        employee_id: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// New default payment method
        #[arg(long)]
        payment: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Print the resolved receipt path of an expense, for an external viewer
    Receipt {
        #[command(flatten)]
        auth: Credentials,
        /// Record id as shown by `list`
        #[arg(long)]
        id: String,
    },
    /// Generate the Excel expense report
    Report {
        #[command(flatten)]
        auth: Credentials,
        /// Output path; defaults to the Documents folder
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let backend = Backend::new(&cli.data_dir)?;

    match cli.command {
        Command::Register {
            username,
            password,
            confirm_password,
            name,
            employee_id,
            company,
            department,
            email,
        } => {
            let result = backend.account_service.register(RegisterCommand {
                username,
                password,
                confirm_password,
                name,
                employee_id,
                company_name: company,
                department,
                email,
            })?;
            println!("Account '{}' created. You can now log in.", result.username);
        }

        Command::Add { auth, expense } => {
            let mut session = login(&backend, &auth)?;
            let input = expense_input(expense)?;
            let record = backend.ledger_service.append(&mut session, input)?;
            println!(
                "Added expense {} ({:.2} EGP, {} on {})",
                record.id, record.amount, record.transport_type, record.date
            );
        }

        Command::List { auth, search, period } => {
            let session = login(&backend, &auth)?;
            let filter = ExpenseFilter {
                search,
                period: parse_period(&period)?,
            };
            let filtered = backend.stats_service.filter(session.ledger(), &filter);
            print_ledger(&filtered);
            let totals = backend.stats_service.aggregate(&filtered);
            println!(
                "Total: {:.2} EGP across {} expense(s)",
                totals.total, totals.count
            );
        }

        Command::Stats { auth } => {
            let session = login(&backend, &auth)?;
            let records = session.ledger();
            let totals = backend.stats_service.aggregate(records);
            println!("Total:    {:>10.2} EGP", totals.total);
            println!("Count:    {:>10}", totals.count);
            println!("Average:  {:>10.2} EGP", totals.average);
            println!("Highest:  {:>10.2} EGP", totals.max);
            println!("Lowest:   {:>10.2} EGP", totals.min);

            println!("\nBy transport type:");
            for entry in backend
                .stats_service
                .breakdown_by(records, BreakdownDimension::TransportType)
            {
                println!(
                    "  {:<14} {:>10.2} EGP ({:>5.1}%)",
                    entry.label, entry.amount, entry.share
                );
            }

            println!("\nBy payment method:");
            for entry in backend
                .stats_service
                .breakdown_by(records, BreakdownDimension::PaymentMethod)
            {
                println!(
                    "  {:<14} {:>10.2} EGP ({:>5.1}%)",
                    entry.label, entry.amount, entry.share
                );
            }
        }

        Command::Edit { auth, id, expense } => {
            let mut session = login(&backend, &auth)?;
            let index = resolve_id(&backend, &session, &id)?;
            let input = expense_input(expense)?;
            let record = backend.ledger_service.replace_at(&mut session, index, input)?;
            println!("Updated expense {}.", record.id);
        }

        Command::Remove { auth, id } => {
            let mut session = login(&backend, &auth)?;
            let index = resolve_id(&backend, &session, &id)?;
            let removed = backend.ledger_service.remove_at(&mut session, index)?;
            println!("Removed expense {} ({:.2} EGP).", removed.id, removed.amount);
        }

        Command::ClearAll { auth, yes } => {
            let mut session = login(&backend, &auth)?;
            if !yes && !confirm("Delete ALL expenses on this ledger?")? {
                println!("Aborted.");
                return Ok(());
            }
            let removed = backend.ledger_service.clear_all(&mut session)?;
            println!("Removed {} expense(s).", removed);
        }

        Command::Profile {
            auth,
            name,
            employee_id,
            company,
            department,
            email,
            payment,
            new_password,
            confirm_password,
        } => {
            let mut session = login(&backend, &auth)?;
            let account = &session.account;
            let payment_method = match payment {
                Some(raw) => parse_payment(&raw)?,
                None => account.payment_method,
            };
            let command = UpdateProfileCommand {
                name: name.unwrap_or_else(|| account.name.clone()),
                employee_id: employee_id.unwrap_or_else(|| account.employee_id.clone()),
                company_name: company.unwrap_or_else(|| account.company_name.clone()),
                department: department.unwrap_or_else(|| account.department.clone()),
                email: email.unwrap_or_else(|| account.email.clone()),
                payment_method,
                new_password,
                confirm_password,
            };
            backend.account_service.update_profile(&mut session, command)?;
            println!("Profile updated.");
        }

        Command::Receipt { auth, id } => {
            let session = login(&backend, &auth)?;
            let index = resolve_id(&backend, &session, &id)?;
            match session.ledger()[index].receipt_path.as_deref() {
                None => println!("Expense {} has no receipt attached.", id),
                Some(path) if path.exists() => {
                    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                    println!("{}", resolved.display());
                }
                Some(path) => println!(
                    "Receipt path {} no longer resolves to a file.",
                    path.display()
                ),
            }
        }

        Command::Report { auth, output } => {
            let session = login(&backend, &auth)?;
            let output = match output {
                Some(path) => path,
                None => default_report_path(&session)?,
            };
            backend.report_service.generate(
                &output,
                &session.username,
                &session.account,
                session.ledger(),
            )?;
            println!("Report written to {}", output.display());
        }
    }

    Ok(())
}

fn login(backend: &Backend, auth: &Credentials) -> Result<Session> {
    let session = backend
        .account_service
        .authenticate(&auth.username, &auth.password)?;
    info!("Session opened for '{}'", session.username);
    Ok(session)
}

fn expense_input(fields: ExpenseFields) -> Result<ExpenseInput> {
    let date = fields
        .date
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    let payment_method = match fields.payment {
        Some(raw) => Some(parse_payment(&raw)?),
        None => None,
    };
    Ok(ExpenseInput {
        date,
        from_location: fields.from,
        to_location: fields.to,
        transport_type: parse_transport(&fields.transport)?,
        payment_method,
        amount: fields.amount,
        notes: fields.notes,
        receipt_path: fields.receipt,
    })
}

fn parse_transport(raw: &str) -> Result<TransportType> {
    raw.parse().map_err(|message: String| anyhow!(message))
}

fn parse_payment(raw: &str) -> Result<PaymentMethod> {
    raw.parse().map_err(|message: String| anyhow!(message))
}

fn parse_period(raw: &str) -> Result<Period> {
    raw.parse().map_err(|message: String| anyhow!(message))
}

fn print_ledger(records: &[masarif::backend::domain::models::ExpenseRecord]) {
    if records.is_empty() {
        println!("No expenses.");
        return;
    }
    println!(
        "{:<22} {:<12} {:<16} {:<16} {:<13} {:<12} {:>10} {:<9}",
        "Id", "Date", "From", "To", "Transport", "Payment", "Amount", "Receipt"
    );
    for record in records {
        println!(
            "{:<22} {:<12} {:<16} {:<16} {:<13} {:<12} {:>10.2} {:<9}",
            record.id,
            record.date,
            record.from_location,
            record.to_location,
            record.transport_type,
            record.payment_method,
            record.amount,
            if record.has_receipt() { "attached" } else { "none" }
        );
        if !record.notes.is_empty() {
            println!("    notes: {}", record.notes);
        }
    }
}

fn resolve_id(backend: &Backend, session: &Session, id: &str) -> Result<usize> {
    backend
        .ledger_service
        .position_of(session, id)
        .ok_or_else(|| anyhow!("no expense with id '{}' on this ledger", id))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn default_report_path(session: &Session) -> Result<PathBuf> {
    let directory = dirs::document_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("could not determine a default report directory"))?;
    let filename = format!(
        "expenses_report_{}_{}.xlsx",
        session.username,
        Local::now().format("%Y-%m-%d")
    );
    Ok(directory.join(filename))
}
