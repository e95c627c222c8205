use clap::{Parser, Subcommand};
use log::info;

use crate::config::Config;
use crate::contracts::Contract;
use crate::database::Database;
use crate::error::FieldOpsError;
use crate::jobs::Job;
use crate::leads::Lead;
use crate::pickup::DbPickupLookup;
use crate::preview::{self, PreviewHorizon};

#[derive(Parser)]
#[command(
    name = "fieldops",
    version,
    about = "FieldOps: field-service operations console"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the API server (default if no command specified)
    Serve,

    /// Preview a contract's upcoming visits without creating anything
    Preview {
        /// Contract ID to preview
        #[arg(long = "contract", short = 'c')]
        contract: i64,

        /// Horizon in days (7, 14, 30, 60, or 90; defaults to the configured horizon)
        #[arg(long = "horizon")]
        horizon: Option<u32>,
    },

    /// Materialize a contract's visits as a job with instances
    Schedule {
        /// Contract ID to schedule
        #[arg(long = "contract", short = 'c')]
        contract: i64,
    },

    /// List contracts
    Contracts,

    /// List jobs
    Jobs {
        /// Only jobs belonging to this contract
        #[arg(long = "contract", short = 'c')]
        contract: Option<i64>,
    },

    /// List leads
    Leads,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), FieldOpsError> {
        let args = Cli::parse();

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(),
            Command::Preview { contract, horizon } => Self::preview(contract, horizon),
            Command::Schedule { contract } => Self::schedule(contract),
            Command::Contracts => Self::list_contracts(),
            Command::Jobs { contract } => Self::list_jobs(contract),
            Command::Leads => Self::list_leads(),
        }
    }

    fn start_server() -> Result<(), FieldOpsError> {
        let host = Config::get_server_host();
        let port = Config::get_server_port();

        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| FieldOpsError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::api::WebServer::new(host, port);
            web_server.start().await
        })
    }

    fn preview(contract_id: i64, horizon_days: Option<u32>) -> Result<(), FieldOpsError> {
        let horizon = match horizon_days {
            Some(days) => PreviewHorizon::from_days(days).ok_or_else(|| {
                FieldOpsError::Error(format!(
                    "Unsupported horizon: {} days (expected 7, 14, 30, 60, or 90)",
                    days
                ))
            })?,
            None => PreviewHorizon::from_days(Config::get_preview_horizon_days())
                .unwrap_or_default(),
        };

        let conn = Database::get_connection()?;
        let contract = Contract::get_by_id(&conn, contract_id)?.ok_or_else(|| {
            FieldOpsError::Error(format!("Contract {} not found", contract_id))
        })?;

        let lookup = DbPickupLookup::new(&conn);
        let today = chrono::Local::now().date_naive();
        let schedule_preview =
            preview::preview_contract(&conn, &contract, &lookup, today, horizon)?;

        println!(
            "Contract {} '{}', next {} days (pickup data: {})",
            contract.contract_id,
            contract.title,
            schedule_preview.horizon_days,
            schedule_preview.provenance
        );

        if schedule_preview.visits.is_empty() {
            println!("No scheduled visits");
            return Ok(());
        }

        for visit in &schedule_preview.visits {
            println!("  {} {:<9} {}", visit.date, visit.weekday_label, visit.summary());
        }

        Ok(())
    }

    fn schedule(contract_id: i64) -> Result<(), FieldOpsError> {
        let conn = Database::get_connection()?;
        let contract = Contract::get_by_id(&conn, contract_id)?.ok_or_else(|| {
            FieldOpsError::Error(format!("Contract {} not found", contract_id))
        })?;

        let lookup = DbPickupLookup::new(&conn);
        let outcome = Job::schedule_recurring(&conn, &contract, &lookup)?;

        println!(
            "Created job {} for contract {}",
            outcome.job.job_id, contract_id
        );

        if outcome.materialization.is_complete() {
            println!(
                "Created {} visit instance(s)",
                outcome.materialization.inserted
            );
        } else {
            // The parent job exists either way; report the batch shortfall
            println!(
                "Created {} of {} visit instance(s); batch failed: {}",
                outcome.materialization.inserted,
                outcome.materialization.requested,
                outcome
                    .materialization
                    .error
                    .as_deref()
                    .unwrap_or("unknown error")
            );
        }

        Ok(())
    }

    fn list_contracts() -> Result<(), FieldOpsError> {
        let conn = Database::get_connection()?;
        let contracts = Contract::list(&conn)?;

        if contracts.is_empty() {
            println!("No contracts");
            return Ok(());
        }

        for contract in contracts {
            println!(
                "{:>5}  {:<32}  {:?}  starts {}",
                contract.contract_id, contract.title, contract.status, contract.start_date
            );
        }

        Ok(())
    }

    fn list_jobs(contract_id: Option<i64>) -> Result<(), FieldOpsError> {
        let conn = Database::get_connection()?;
        let jobs = match contract_id {
            Some(id) => Job::list_for_contract(&conn, id)?,
            None => Job::list(&conn)?,
        };

        if jobs.is_empty() {
            println!("No jobs");
            return Ok(());
        }

        for job in jobs {
            println!(
                "{:>5}  {}  {:<32}  {:?}{}",
                job.job_id,
                job.scheduled_date,
                job.title,
                job.status,
                if job.is_recurring_parent {
                    "  (recurring)"
                } else {
                    ""
                }
            );
        }

        Ok(())
    }

    fn list_leads() -> Result<(), FieldOpsError> {
        let conn = Database::get_connection()?;
        let leads = Lead::list(&conn)?;

        if leads.is_empty() {
            println!("No leads");
            return Ok(());
        }

        for lead in leads {
            println!("{:>5}  {:<24}  {:?}", lead.lead_id, lead.contact_name, lead.status);
        }

        Ok(())
    }
}
