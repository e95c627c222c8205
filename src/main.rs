mod api;
mod cli;
mod config;
mod contracts;
mod database;
mod engine;
mod error;
mod jobs;
mod leads;
mod materialize;
mod pickup;
mod preview;
mod properties;
mod proposals;
mod schema;
mod service_categories;
mod utils;

use directories::ProjectDirs;
use log::error;

use crate::cli::Cli;
use crate::config::{Config, CONFIG};
use crate::database::Database;

fn main() {
    let Some(project_dirs) = ProjectDirs::from("dev", "fieldops", "fieldops") else {
        eprintln!("Could not determine a home directory for configuration");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);
    let log_spec = format!("fieldops={}", config.logging.fieldops);
    let db_path = Config::database_path(&project_dirs);

    if CONFIG.set(config).is_err() {
        eprintln!("Configuration was initialized twice");
        std::process::exit(1);
    }

    // Keep the handle alive for the life of the process
    let _logger = match flexi_logger::Logger::try_with_str(&log_spec) {
        Ok(logger) => logger.start().ok(),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    if let Err(err) = Database::init(&db_path) {
        error!("{}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }

    if let Err(err) = Cli::handle_command_line() {
        error!("{}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
