
use log::{debug, info, warn};
use rustc_hash::FxHashSet as HashSet;

use crate::cli::matcher::MatchSettings;
use crate::data_types::database::DefinitionDatabase;
use crate::data_types::gene_config::{GeneConfig, MatcherConfig};
use crate::data_types::match_results::{GeneCall, MatchResults};
use crate::data_types::sample_allele::SampleData;
use crate::matcher::caller::NamedAlleleCaller;
use crate::matcher::errors::MatcherError;
use crate::util::file_io::load_file_lines;

/// This is the main function to call all of the diplotypes for a sample.
/// # Arguments
/// * `database` - the pre-loaded definition database
/// * `sample` - the pre-loaded sample calls
/// * `cli_settings` - the full settings for matching
/// # Errors
/// * if the include or exclude sets cannot be loaded
/// * if the capability overrides are invalid
/// * if a gene definition is corrupt
pub fn call_diplotypes(database: &DefinitionDatabase, sample: &SampleData, cli_settings: &MatchSettings) -> Result<MatchResults, Box<dyn std::error::Error>> {
    // figure out the set of genes to include / exclude
    let opt_exclude_set: Option<HashSet<String>> = if let Some(efn) = cli_settings.exclude_fn.as_deref() {
        Some(load_file_lines(efn)?)
    } else {
        None
    };
    let opt_include_set: Option<HashSet<String>> = if let Some(ifn) = cli_settings.include_fn.as_deref() {
        Some(load_file_lines(ifn)?)
    } else {
        None
    };

    let config = cli_settings.matcher_config();
    let gene_config = cli_settings.gene_config(database.gene_config())?;
    call_sample(database, sample, &config, &gene_config, opt_include_set.as_ref(), opt_exclude_set.as_ref())
}

/// Runs the caller across every gene in the database
/// # Arguments
/// * `database` - the definition database
/// * `sample` - the sample calls
/// * `config` - the run-level matcher options
/// * `gene_config` - the capability table, including any overrides
/// * `opt_include_set` - if provided, only these genes are called
/// * `opt_exclude_set` - if provided, these genes are skipped
/// # Errors
/// * if a gene definition is corrupt
pub fn call_sample(
    database: &DefinitionDatabase, sample: &SampleData, config: &MatcherConfig, gene_config: &GeneConfig,
    opt_include_set: Option<&HashSet<String>>, opt_exclude_set: Option<&HashSet<String>>
) -> Result<MatchResults, Box<dyn std::error::Error>> {
    let caller = NamedAlleleCaller::new(config, gene_config);
    let mut results = MatchResults::new(database.database_metadata().clone(), sample.sample_id());

    for (gene_name, gene_entry) in database.gene_entries().iter() {
        // assume include set has everything UNLESS it is specified
        let included = opt_include_set.map(|include_set| include_set.contains(gene_name)).unwrap_or(true);
        if !included {
            debug!("Skipping {gene_name}, not in include set");
            continue;
        }

        // assume exclude set has nothing UNLESS it is specified
        let excluded = opt_exclude_set.map(|exclude_set| exclude_set.contains(gene_name)).unwrap_or(false);
        if excluded {
            debug!("Skipping {gene_name}, part of exclude set");
            continue;
        }

        info!("Solving {gene_name}...");
        let exemption = database.exemptions().get(gene_name);
        let gene_call = match caller.call_gene(gene_entry, exemption, sample) {
            Ok(Some(gc)) => gc,
            Ok(None) => continue,
            Err(e @ MatcherError::PermutationLimitExceeded { .. }) => {
                // only this gene is lost, everything else still gets called
                warn!("Unable to call {gene_name}: {e}");
                GeneCall::no_call(gene_name, gene_entry.chromosome(), &e.to_string())
            },
            Err(e) => return Err(Box::new(e))
        };

        let diplotype_names: Vec<&str> = gene_call.diplotypes().iter().map(|d| d.name()).collect();
        if diplotype_names.is_empty() {
            let haplotype_names: Vec<&str> = gene_call.haplotypes().iter().map(|h| h.name()).collect();
            info!("\t{gene_name} haplotypes: {haplotype_names:?}");
        } else {
            info!("\t{gene_name} diplotypes: {diplotype_names:?}");
        }
        results.insert(gene_name.clone(), gene_call)?;
    }

    Ok(results)
}
