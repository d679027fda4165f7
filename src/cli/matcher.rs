
use clap::Args;
use log::info;
use simple_error::bail;
use std::path::PathBuf;

use crate::cli::core::{AFTER_HELP, check_optional_filename, check_required_filename};
use crate::data_types::gene_config::{GeneConfig, MatcherConfig};
use crate::matcher::permutations::DEFAULT_MAX_PERMUTATIONS;

#[derive(Args, Clone, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct MatchSettings {
    /// Input definition database file (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "database")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_database: PathBuf,

    /// Input sample calls (JSON, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "sample")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub sample_filename: PathBuf,

    /// Output gene call file (JSON)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-calls")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Output file that can be provided to PharmCAT for further call interpretation
    #[clap(long = "pharmcat-tsv")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub pharmcat_tsv: Option<PathBuf>,

    /// Optional file indicating the list of genes to include in matching, one per line
    #[clap(long = "include-set")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub include_fn: Option<PathBuf>,

    /// Optional file indicating the list of genes to exclude from matching, one per line
    #[clap(long = "exclude-set")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub exclude_fn: Option<PathBuf>,

    /// Reports every candidate diplotype instead of only the top-scoring ones
    #[clap(long = "all-results")]
    #[clap(help_heading = Some("Matching"))]
    pub all_results: bool,

    /// Synthesizes combination and partial haplotypes when no single definition explains a strand
    #[clap(long = "find-combinations")]
    #[clap(help_heading = Some("Matching"))]
    pub find_combinations: bool,

    /// Calls genes that are excluded by default; research use only
    #[clap(long = "research-excluded-genes")]
    #[clap(help_heading = Some("Matching"))]
    pub research_excluded_genes: bool,

    /// Upper bound on the strand permutations generated for a single gene
    #[clap(long = "max-permutations")]
    #[clap(value_name = "COUNT")]
    #[clap(help_heading = Some("Matching"))]
    pub max_permutations: Option<usize>,

    /// Adds a gene capability on top of the database table, can be specified multiple times (e.g. "TPMT:PresenceOnly")
    #[clap(long = "gene-capability")]
    #[clap(value_name = "GENE:CAPABILITY")]
    #[clap(help_heading = Some("Matching"))]
    pub gene_capabilities: Vec<String>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl MatchSettings {
    /// Converts the CLI flags into the matcher options
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig::new(
            self.find_combinations,
            !self.all_results,
            self.research_excluded_genes,
            self.max_permutations.unwrap_or(DEFAULT_MAX_PERMUTATIONS)
        )
    }

    /// Applies any capability overrides to the database table
    /// # Arguments
    /// * `database_config` - the capability table from the database
    /// # Errors
    /// * if an override cannot be parsed
    /// * if the combined table is contradictory
    pub fn gene_config(&self, database_config: &GeneConfig) -> Result<GeneConfig, Box<dyn std::error::Error>> {
        let mut gene_config = database_config.clone();
        for value in self.gene_capabilities.iter() {
            gene_config.add_override(value)?;
        }
        gene_config.validate_config()?;
        Ok(gene_config)
    }
}

/// Checks the inputs exist, sanity checks the options, and logs everything
/// # Errors
/// * if both an include and exclude set are given
/// * if the permutation bound is zero
/// * if a capability override cannot be parsed
pub fn check_match_settings(settings: MatchSettings) -> Result<MatchSettings, Box<dyn std::error::Error>> {
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.input_database, "Definition database JSON");
    check_required_filename(&settings.sample_filename, "Sample JSON");
    info!("\tDatabase: {:?}", settings.input_database);
    info!("\tSample: {:?}", settings.sample_filename);

    if settings.include_fn.is_some() && settings.exclude_fn.is_some() {
        bail!("Only one of --exclude-set and --include-set can be specified.");
    }
    check_optional_filename(settings.include_fn.as_deref(), "Include set");
    check_optional_filename(settings.exclude_fn.as_deref(), "Exclude set");
    if let Some(ifn) = settings.include_fn.as_ref() {
        info!("\tInclude set file: {ifn:?}");
    }
    if let Some(efn) = settings.exclude_fn.as_ref() {
        info!("\tExclude set file: {efn:?}");
    }

    // outputs
    info!("Outputs:");
    info!("\tGene calls: {:?}", settings.output_filename);
    if let Some(filename) = settings.pharmcat_tsv.as_ref() {
        info!("\tPharmCAT TSV: {:?}", filename);
    }

    // matching settings
    info!("Matching settings:");
    info!("\tReport all results: {}", if settings.all_results { "ENABLED" } else { "DISABLED" });
    info!("\tFind combinations: {}", if settings.find_combinations { "ENABLED" } else { "DISABLED" });
    info!("\tResearch excluded genes: {}", if settings.research_excluded_genes { "ENABLED" } else { "DISABLED" });
    if settings.max_permutations == Some(0) {
        bail!("--max-permutations must be greater than 0");
    }
    info!("\tMax permutations: {}", settings.max_permutations.unwrap_or(DEFAULT_MAX_PERMUTATIONS));

    // parse these early so a typo fails before any work is done
    let mut overrides = GeneConfig::empty();
    for value in settings.gene_capabilities.iter() {
        overrides.add_override(value)?;
        info!("\tGene capability: {value}");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data_types::gene_config::GeneCapability;

    #[test]
    fn test_matcher_config() {
        let settings = MatchSettings {
            all_results: true,
            find_combinations: true,
            max_permutations: Some(256),
            ..Default::default()
        };
        let config = settings.matcher_config();
        assert!(config.find_combinations());
        assert!(!config.top_candidate_only());
        assert!(!config.call_excluded_genes());
        assert_eq!(config.max_permutations(), 256);

        let config = MatchSettings::default().matcher_config();
        assert!(config.top_candidate_only());
        assert_eq!(config.max_permutations(), DEFAULT_MAX_PERMUTATIONS);
    }

    #[test]
    fn test_gene_config_overrides() {
        let settings = MatchSettings {
            gene_capabilities: vec!["TPMT:PresenceOnly".to_string()],
            ..Default::default()
        };
        let gene_config = settings.gene_config(&GeneConfig::default()).unwrap();
        assert!(gene_config.has_capability("TPMT", GeneCapability::PresenceOnly));
        assert!(gene_config.has_capability("DPYD", GeneCapability::AdditiveInterpretation));

        let settings = MatchSettings {
            gene_capabilities: vec!["DPYD:ExcludedByDefault".to_string()],
            ..Default::default()
        };
        assert!(settings.gene_config(&GeneConfig::default()).is_err());
    }
}
