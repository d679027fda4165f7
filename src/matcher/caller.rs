use log::{debug, warn};

use crate::data_types::database::GeneDefinition;
use crate::data_types::exemption::DefinitionExemption;
use crate::data_types::gene_config::{GeneCapability, GeneConfig, MatcherConfig};
use crate::data_types::match_results::GeneCall;
use crate::data_types::sample_allele::SampleData;
use crate::matcher::diplotype_matcher::DiplotypeMatcher;
use crate::matcher::errors::MatcherError;
use crate::matcher::haplotype_matcher::{HaplotypeMatcher, MatchMode};
use crate::matcher::match_data::{MatchData, MatchDataBuilder};
use crate::matcher::name_comparator::{AlleleNameComparator, NaturalNameComparator};

/// Picks the calling strategy for each gene and assembles the gene call
pub struct NamedAlleleCaller {
    config: MatcherConfig,
    gene_config: GeneConfig,
    comparator: Box<dyn AlleleNameComparator>
}

impl NamedAlleleCaller {
    /// Creates a caller with the natural allele name ordering
    /// # Arguments
    /// * `config` - the run-level matcher options
    /// * `gene_config` - the gene capability table
    pub fn new(config: &MatcherConfig, gene_config: &GeneConfig) -> NamedAlleleCaller {
        NamedAlleleCaller {
            config: config.clone(),
            gene_config: gene_config.clone(),
            comparator: Box::new(NaturalNameComparator::default())
        }
    }

    /// Replaces the allele name ordering
    pub fn with_comparator(mut self, comparator: Box<dyn AlleleNameComparator>) -> NamedAlleleCaller {
        self.comparator = comparator;
        self
    }

    /// Calls a single gene for a sample.
    /// Returns None if the gene is excluded by default and the research opt-in is not set.
    /// # Arguments
    /// * `gene_definition` - the gene positions and catalog
    /// * `exemption` - optional overrides for the gene
    /// * `sample` - the sample calls
    /// # Errors
    /// * if the definitions are not aligned to the gene positions
    /// * if the permutation bound is exceeded
    pub fn call_gene(&self, gene_definition: &GeneDefinition, exemption: Option<&DefinitionExemption>, sample: &SampleData) -> Result<Option<GeneCall>, MatcherError> {
        let gene = gene_definition.gene();
        if self.gene_config.has_capability(gene, GeneCapability::ExcludedByDefault) && !self.config.call_excluded_genes() {
            warn!("{gene} is excluded by default and requires the research opt-in, skipping");
            return Ok(None);
        }

        let gene_call = if self.gene_config.has_capability(gene, GeneCapability::AdditiveInterpretation) {
            self.call_additive(gene_definition, exemption, sample)?
        } else {
            self.call_default(gene_definition, exemption, sample)?
        };
        Ok(Some(gene_call))
    }

    /// Back-filled matching first, then combinations if nothing pairs up
    fn call_default(&self, gene_definition: &GeneDefinition, exemption: Option<&DefinitionExemption>, sample: &SampleData) -> Result<GeneCall, MatcherError> {
        let gene = gene_definition.gene();
        let top_candidate_only = exemption
            .and_then(|e| e.all_hits())
            .map(|all_hits| !all_hits)
            .unwrap_or(self.config.top_candidate_only());

        let data = self.builder(gene_definition, sample, exemption)
            .assume_reference(true)
            .build()?;
        let diplotypes = DiplotypeMatcher::new(&data, self.comparator.as_ref())
            .compute(MatchMode::Standard, top_candidate_only)?;

        if diplotypes.is_empty() && self.config.find_combinations() && !data.is_empty() {
            debug!("{gene}: no diplotypes with reference back-fill, searching for combinations");
            let combination_data = self.builder(gene_definition, sample, exemption)
                .find_combinations(true)
                .build()?;
            let diplotypes = DiplotypeMatcher::new(&combination_data, self.comparator.as_ref())
                .compute(MatchMode::Combination, top_candidate_only)?;
            let warnings = collect_warnings(gene_definition, sample, &combination_data);
            return Ok(GeneCall::from_diplotypes(&combination_data, diplotypes, warnings));
        }

        let warnings = collect_warnings(gene_definition, sample, &data);
        Ok(GeneCall::from_diplotypes(&data, diplotypes, warnings))
    }

    /// Strict pairing when the phase is (nearly) known, otherwise the per-strand haplotype set
    fn call_additive(&self, gene_definition: &GeneDefinition, exemption: Option<&DefinitionExemption>, sample: &SampleData) -> Result<GeneCall, MatcherError> {
        let gene = gene_definition.gene();
        let data = self.builder(gene_definition, sample, exemption).build()?;

        let num_permutations = data.num_permutations();
        if num_permutations > 0 && num_permutations <= 2 {
            let diplotypes = DiplotypeMatcher::new(&data, self.comparator.as_ref())
                .compute(MatchMode::Strict, false)?;
            if !diplotypes.is_empty() {
                let warnings = collect_warnings(gene_definition, sample, &data);
                return Ok(GeneCall::from_diplotypes(&data, diplotypes, warnings));
            }
            debug!("{gene}: no strict diplotype, reporting the haplotype set");
        } else {
            debug!("{gene}: {num_permutations} permutations, reporting the haplotype set");
        }

        let combination_data = self.builder(gene_definition, sample, exemption)
            .find_combinations(true)
            .build()?;
        let haplotypes = HaplotypeMatcher::new(&combination_data, self.comparator.as_ref())
            .haplotype_set()?;
        let warnings = collect_warnings(gene_definition, sample, &combination_data);
        Ok(GeneCall::from_haplotypes(&combination_data, haplotypes, warnings))
    }

    fn builder<'a>(&self, gene_definition: &'a GeneDefinition, sample: &'a SampleData, exemption: Option<&'a DefinitionExemption>) -> MatchDataBuilder<'a> {
        MatchDataBuilder::new(gene_definition, sample)
            .exemption(exemption)
            .max_permutations(self.config.max_permutations())
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn gene_config(&self) -> &GeneConfig {
        &self.gene_config
    }
}

/// Copies the sample warnings for the gene positions and adds one for each mismatched position
fn collect_warnings(gene_definition: &GeneDefinition, sample: &SampleData, data: &MatchData) -> Vec<String> {
    let mut warnings: Vec<String> = vec![];
    for locus in gene_definition.positions().iter() {
        for warning in sample.warnings_for(locus).iter() {
            warnings.push(format!("{}: {warning}", locus.chr_position()));
        }
    }
    for locus in data.mismatched_positions().iter() {
        let observed: Vec<&str> = data.sample_allele(locus.position())
            .map(|a| a.unaccepted_symbols(locus))
            .unwrap_or_default();
        warnings.push(format!("{}: sample allele(s) {} are not accepted by the definition", locus.chr_position(), observed.join(", ")));
    }
    warnings
}
