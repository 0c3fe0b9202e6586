//! `bloodbank` - CLI for the blood donor ledger
//!
//! This binary loads the ledger from the configured database, runs one
//! command and commits any change before exiting.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use bloodbank::cli::{
    Cli, Command, ConfigCommand, DonorCommand, OutputFormat, RegisterArgs, RequestCommand,
    SubmitArgs,
};
use bloodbank::{init_logging, Config, DonorRecord, Ledger, LedgerError, RequestRecord, Storage};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Validation must work even when the active configuration is broken.
    if let Some(path) = cli.config_to_validate() {
        return Ok(validate_config(path));
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Configuration commands never touch the database.
    if let Command::Config(cmd) = cli.command {
        return handle_config(&config, cmd);
    }

    let storage = Storage::open(config.database_path()).context("opening ledger database")?;
    let mut ledger = storage
        .load_ledger(&config.ledger_options())
        .context("loading ledger")?;

    let mutates = cli.command.mutates();
    let outcome = match cli.command {
        Command::Donor(DonorCommand::Register(args)) => handle_register(&mut ledger, &args),
        Command::Donor(DonorCommand::List { format }) => print_donors(&ledger, format),
        Command::Donor(DonorCommand::Profile { json }) => print_profile(&ledger, json),
        Command::Request(RequestCommand::Submit(args)) => handle_submit(&mut ledger, &args),
        Command::Request(RequestCommand::List { format }) => print_requests(&ledger, format),
        Command::Inventory(cmd) => print_inventory(&ledger, cmd.json),
        Command::Stats(cmd) => print_stats(&ledger, cmd.json),
        Command::Config(_) => unreachable!("handled before the ledger is loaded"),
    }?;

    if mutates {
        let written = storage.commit(&mut ledger).context("saving ledger")?;
        debug!(slots = written, "Committed ledger");
    }

    Ok(outcome)
}

fn handle_register(ledger: &mut Ledger, args: &RegisterArgs) -> anyhow::Result<ExitCode> {
    match ledger.register_donor(&args.to_form()) {
        Ok(donor) => {
            if args.json {
                print_json(&donor)?;
            } else {
                println!(
                    "Registered {} ({}) as donor {}.",
                    donor.name, donor.blood_group, donor.id
                );
                println!(
                    "{} stock is now {} units.",
                    donor.blood_group,
                    ledger.inventory().get(donor.blood_group)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_rejection(&e)),
    }
}

fn handle_submit(ledger: &mut Ledger, args: &SubmitArgs) -> anyhow::Result<ExitCode> {
    match ledger.submit_request(&args.to_form()) {
        Ok(request) => {
            if args.json {
                print_json(&request)?;
            } else {
                println!(
                    "Request {} accepted: {} units of {} for {} ({}).",
                    request.id,
                    request.units_needed,
                    request.blood_group,
                    request.patient_name,
                    request.urgency
                );
                println!(
                    "{} units of {} remain.",
                    ledger.inventory().get(request.blood_group),
                    request.blood_group
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_rejection(&e)),
    }
}

/// Print a user-correctable failure on stderr, one line per invalid field.
fn report_rejection(error: &LedgerError) -> ExitCode {
    match error.validation_errors() {
        Some(errors) => {
            for e in errors {
                eprintln!("{}: {}", e.field, e.message);
            }
        }
        None => eprintln!("{error}"),
    }
    ExitCode::FAILURE
}

fn print_donors(ledger: &Ledger, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let donors = ledger.donors();
    match format {
        OutputFormat::Json => print_json(donors)?,
        _ if donors.is_empty() => println!("No donors registered."),
        OutputFormat::Plain => {
            for donor in donors {
                println!(
                    "{} {} <{}> {}",
                    donor.id, donor.name, donor.email, donor.blood_group
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<15} {:<24} {:<30} {:<5} {:>4} {:>6}",
                "ID", "NAME", "EMAIL", "GROUP", "AGE", "WEIGHT"
            );
            for donor in donors {
                println!(
                    "{:<15} {:<24} {:<30} {:<5} {:>4} {:>6}",
                    donor.id,
                    truncate(&donor.name, 24),
                    truncate(&donor.email, 30),
                    donor.blood_group,
                    donor.age,
                    donor.weight
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_profile(ledger: &Ledger, json: bool) -> anyhow::Result<ExitCode> {
    let Some(donor) = ledger.donors().latest() else {
        println!("No donors registered.");
        return Ok(ExitCode::SUCCESS);
    };

    if json {
        print_json(donor)?;
    } else {
        print_donor_card(donor);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_donor_card(donor: &DonorRecord) {
    println!("Donor {}", donor.id);
    println!("-----------------------");
    println!("Name:        {}", donor.name);
    println!("Email:       {}", donor.email);
    println!("Phone:       {}", donor.phone);
    println!("Age:         {}", donor.age);
    println!("Blood group: {}", donor.blood_group);
    println!("Weight:      {} kg", donor.weight);
    println!("Address:     {}", donor.address);
    println!(
        "Registered:  {}",
        donor.registered_at.format("%Y-%m-%d %H:%M UTC")
    );
}

fn print_requests(ledger: &Ledger, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let requests = ledger.requests();
    match format {
        OutputFormat::Json => print_json(requests)?,
        _ if requests.is_empty() => println!("No requests submitted."),
        OutputFormat::Plain => {
            for request in requests {
                print_request_line(request);
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<15} {:<24} {:<5} {:>5} {:<8} {:<8}",
                "ID", "PATIENT", "GROUP", "UNITS", "URGENCY", "STATUS"
            );
            for request in requests {
                println!(
                    "{:<15} {:<24} {:<5} {:>5} {:<8} {:<8}",
                    request.id,
                    truncate(&request.patient_name, 24),
                    request.blood_group,
                    request.units_needed,
                    request.urgency,
                    request.status
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_request_line(request: &RequestRecord) {
    println!(
        "{} {} {}x{} {} {}",
        request.id,
        request.patient_name,
        request.units_needed,
        request.blood_group,
        request.urgency,
        request.status
    );
}

fn print_inventory(ledger: &Ledger, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        let entries: Vec<_> = ledger.inventory().levels().collect();
        print_json(&entries)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<5} {:>5}  STATUS", "GROUP", "UNITS");
    for entry in ledger.inventory().levels() {
        println!(
            "{:<5} {:>5}  {}",
            entry.blood_group,
            entry.units,
            entry.level.description()
        );
    }
    println!("{:<5} {:>5}", "TOTAL", ledger.inventory().total());
    Ok(ExitCode::SUCCESS)
}

fn print_stats(ledger: &Ledger, json: bool) -> anyhow::Result<ExitCode> {
    let stats = ledger.stats();
    if json {
        print_json(&stats)?;
    } else {
        println!("Total donors:   {}", stats.total_donors);
        println!("Total units:    {}", stats.total_units);
        println!("Total requests: {}", stats.total_requests);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                let options = config.ledger_options();
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Inventory]");
                println!(
                    "  Seed range:     {}..={}",
                    options.seed_range.start(),
                    options.seed_range.end()
                );
                println!();
                println!("[Registry]");
                println!("  Sample donors:  {}", options.sample_donors);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { .. } => unreachable!("validated before loading configuration"),
    }
    Ok(ExitCode::SUCCESS)
}

fn validate_config(path: PathBuf) -> ExitCode {
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
