
use log::{LevelFilter, error, info};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use starmatch::cli::core::{Commands, get_cli};
use starmatch::cli::db_stat::{DbStatSettings, check_db_stat_settings};
use starmatch::cli::matcher::{MatchSettings, check_match_settings};
use starmatch::data_types::database::DefinitionDatabase;
use starmatch::data_types::gene_config::{GeneCapability, GeneConfig};
use starmatch::data_types::match_results::{Diplotype, MatchResults};
use starmatch::data_types::sample_allele::SampleData;
use starmatch::util::file_io::{load_json, save_json};

/// Sets up the global logger based on the verbosity count
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Loads and validates the definition database, exiting on failure
fn load_database(filename: &Path) -> DefinitionDatabase {
    info!("Loading definition database from {filename:?}...");
    let database: DefinitionDatabase = match load_json(filename) {
        Ok(db) => db,
        Err(e) => {
            error!("Error while loading definition database file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };

    // we also need to validate that the database is complete enough to run
    if let Err(e) = database.validate() {
        error!("Error while validating definition database file: {e}");
        std::process::exit(exitcode::IOERR);
    }
    database
}

/// This will run the "match" mode of the tool
/// # Arguments
/// * `settings` - the MatchSettings object
fn run_match(settings: MatchSettings) {
    // immediately setup logging first
    init_logging(settings.verbosity);

    // okay, now we can check all the other settings
    let cli_settings: MatchSettings = match check_match_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while processing CLI settings: {e}");
            std::process::exit(exitcode::USAGE);
        }
    };

    let database = load_database(&cli_settings.input_database);

    info!("Loading sample calls from {:?}...", cli_settings.sample_filename);
    let sample: SampleData = match load_json(&cli_settings.sample_filename) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while loading sample file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    };
    if let Err(e) = sample.validate() {
        error!("Error while validating sample file: {e}");
        std::process::exit(exitcode::IOERR);
    }

    // now hand it to the caller
    let results: MatchResults = match starmatch::diplotyper::call_diplotypes(&database, &sample, &cli_settings) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while calling diplotypes: {e}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    info!("Saving gene calls to {:?}", cli_settings.output_filename);
    if let Err(e) = save_json(&results, &cli_settings.output_filename) {
        error!("Error while writing gene calls to file: {e}");
        std::process::exit(exitcode::IOERR);
    }

    if let Some(filename) = cli_settings.pharmcat_tsv.as_ref() {
        // overrides were already checked, so this only fails on a contradictory table
        let gene_config = match cli_settings.gene_config(database.gene_config()) {
            Ok(gc) => gc,
            Err(e) => {
                error!("Error while processing gene capabilities: {e}");
                std::process::exit(exitcode::USAGE);
            }
        };

        info!("Saving PharmCAT diplotypes to {:?}", filename);
        if let Err(e) = save_pharmcat_tsv(&results, &gene_config, filename) {
            error!("Error while writing PharmCAT diplotypes to file: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }
}

/// Wrapper for the pharmcat output
#[derive(Serialize)]
struct PharmCatRow {
    #[serde(rename = "#gene")]
    gene: String,
    diplotype: String
}

/// Helper function to save the basic TSV file for feeding into PharmCAT
/// # Arguments
/// * `results` - our gene calls
/// * `gene_config` - the capability table used for the calls
/// * `filename` - the output filename, TSV
/// # Errors
/// * if we have any errors opening or writing to the file
fn save_pharmcat_tsv(results: &MatchResults, gene_config: &GeneConfig, filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(filename)?;

    for (gene, gene_call) in results.gene_calls().iter() {
        // check if we have one result or multiple
        let mut summaries: Vec<Diplotype> = vec![];
        for d in gene_call.summary_diplotypes(gene_config).into_iter() {
            if !summaries.contains(&d) {
                summaries.push(d);
            }
        }
        let summary: Diplotype = if summaries.len() == 1 {
            summaries.remove(0)
        } else {
            Diplotype::new("Multiple", "Multiple")
        };

        let diplotype: String = if gene_config.has_capability(gene, GeneCapability::SinglePloidy) {
            // single copy genes only get one haplotype
            summary.homozygous_haplotype().unwrap_or("Unknown").to_string()
        } else {
            summary.pharmcat_diplotype()
        };

        let row = PharmCatRow {
            gene: gene.clone(),
            diplotype
        };
        csv_writer.serialize(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// This will run the "db_stat" mode of the tool
/// # Arguments
/// * `settings` - the DbStatSettings object
fn run_db_stat(settings: DbStatSettings) {
    init_logging(settings.verbosity);
    let cli_settings: DbStatSettings = check_db_stat_settings(settings);

    let database = load_database(&cli_settings.input_database);
    info!("Database loaded successfully.");

    // display the database statistics
    starmatch::db_stat::print_stats(&database);
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::DbStat(settings) => {
            run_db_stat(*settings);
        },
        Commands::Match(settings) => {
            run_match(*settings);
        }
    }

    info!("Process finished successfully.");
}
