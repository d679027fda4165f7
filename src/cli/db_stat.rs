use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP};

#[derive(Clone, Args)]
#[clap(author, about, 
    after_help = &**AFTER_HELP)]
pub struct DbStatSettings {
    /// Input definition database file (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "database")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_database: PathBuf,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Checks that the database exists and logs the settings
pub fn check_db_stat_settings(settings: DbStatSettings) -> DbStatSettings {
    // dump stuff to the logger
    check_required_filename(&settings.input_database, "Definition database JSON");
    info!("Input database: {:?}", &settings.input_database);
    settings
}
