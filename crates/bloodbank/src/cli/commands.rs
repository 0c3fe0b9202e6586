//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands. Form fields are
//! taken as optional text so that the ledger's validation, not clap, reports
//! every missing or malformed value at once.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::validation::{DonorForm, RequestForm};

/// Donor registry commands.
#[derive(Debug, Subcommand)]
pub enum DonorCommand {
    /// Register a new donor
    Register(RegisterArgs),

    /// List registered donors
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the most recently registered donor
    Profile {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Donor registration arguments.
#[derive(Debug, Default, Args)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Age in years (18-65)
    #[arg(long)]
    pub age: Option<String>,

    /// Blood group, e.g. "O+" or "AB-"
    #[arg(short, long)]
    pub blood_group: Option<String>,

    /// Weight in kilograms (at least 50)
    #[arg(long)]
    pub weight: Option<String>,

    /// Postal address
    #[arg(long)]
    pub address: Option<String>,

    /// Accept the donor terms and conditions
    #[arg(long)]
    pub accept_terms: bool,

    /// Output the registered donor as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl RegisterArgs {
    /// Raw donor form built from the arguments.
    #[must_use]
    pub fn to_form(&self) -> DonorForm {
        DonorForm {
            name: text(self.name.as_deref()),
            email: text(self.email.as_deref()),
            phone: text(self.phone.as_deref()),
            age: text(self.age.as_deref()),
            blood_group: text(self.blood_group.as_deref()),
            weight: text(self.weight.as_deref()),
            address: text(self.address.as_deref()),
            terms_accepted: self.accept_terms,
        }
    }
}

/// Blood request commands.
#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Submit a blood request against current stock
    Submit(SubmitArgs),

    /// List accepted requests
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Blood request arguments.
#[derive(Debug, Default, Args)]
pub struct SubmitArgs {
    /// Patient who needs blood
    #[arg(long)]
    pub patient_name: Option<String>,

    /// Person filing the request
    #[arg(long)]
    pub requester_name: Option<String>,

    /// Requester phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Required blood group
    #[arg(short, long)]
    pub blood_group: Option<String>,

    /// Units needed (1-10)
    #[arg(short, long)]
    pub units: Option<String>,

    /// normal, urgent or critical
    #[arg(long)]
    pub urgency: Option<String>,

    /// Hospital delivery address
    #[arg(long)]
    pub hospital_address: Option<String>,

    /// Medical reason (optional)
    #[arg(long)]
    pub reason: Option<String>,

    /// Output the accepted request as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl SubmitArgs {
    /// Raw request form built from the arguments.
    #[must_use]
    pub fn to_form(&self) -> RequestForm {
        RequestForm {
            patient_name: text(self.patient_name.as_deref()),
            requester_name: text(self.requester_name.as_deref()),
            phone: text(self.phone.as_deref()),
            blood_group: text(self.blood_group.as_deref()),
            units_needed: text(self.units.as_deref()),
            urgency: text(self.urgency.as_deref()),
            hospital_address: text(self.hospital_address.as_deref()),
            medical_reason: text(self.reason.as_deref()),
        }
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Inventory command arguments.
#[derive(Debug, Args)]
pub struct InventoryCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_args_to_form() {
        let args = RegisterArgs {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            age: Some("36".to_string()),
            blood_group: Some("O-".to_string()),
            accept_terms: true,
            ..RegisterArgs::default()
        };

        let form = args.to_form();

        assert_eq!(form.name, "Ada Lovelace");
        assert_eq!(form.blood_group, "O-");
        assert_eq!(form.phone, "");
        assert!(form.terms_accepted);
    }

    #[test]
    fn test_missing_register_args_fail_validation() {
        let errors = RegisterArgs::default().to_form().validate().unwrap_err();
        assert!(errors.for_field("name").is_some());
        assert!(errors.for_field("terms").is_some());
    }

    #[test]
    fn test_submit_args_to_form() {
        let args = SubmitArgs {
            units: Some("4".to_string()),
            urgency: Some("critical".to_string()),
            reason: None,
            ..SubmitArgs::default()
        };

        let form = args.to_form();

        assert_eq!(form.units_needed, "4");
        assert_eq!(form.urgency, "critical");
        assert_eq!(form.medical_reason, "");
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
