use itertools::Itertools;
use serde::Serialize;
use simple_error::bail;
use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry::{Occupied, Vacant};

use crate::data_types::database::DefinitionMetadata;
use crate::data_types::gene_config::{GeneCapability, GeneConfig};
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::base_match::{BaseMatch, COMBINATION_JOINER, DiplotypeMatch};
use crate::matcher::match_data::{ExtraPosition, MatchData};

/// Intended to be serialized to JSON as the final result
#[derive(Debug, Serialize)]
pub struct MatchResults {
    /// Version of the tool that generated the calls
    starmatch_version: String,
    /// Metadata for the definitions that were used
    database_metadata: DefinitionMetadata,
    /// The sample the calls are for
    sample_id: String,
    /// When the calls were made
    run_time: chrono::DateTime<chrono::Utc>,
    /// Map from gene name to gene call
    gene_calls: BTreeMap<String, GeneCall>
}

impl MatchResults {
    pub fn new(database_metadata: DefinitionMetadata, sample_id: &str) -> MatchResults {
        MatchResults {
            starmatch_version: crate::cli::core::FULL_VERSION.to_string(),
            database_metadata,
            sample_id: sample_id.to_string(),
            run_time: chrono::Utc::now(),
            gene_calls: Default::default()
        }
    }

    /// Simple wrapper for our call insertion to make sure we do not double insert
    /// # Arguments
    /// * `gene` - the gene name we are saving the call for
    /// * `gene_call` - the call getting saved
    pub fn insert(&mut self, gene: String, gene_call: GeneCall) -> Result<(), Box<dyn std::error::Error>> {
        match self.gene_calls.entry(gene) {
            Vacant(entry) => entry.insert(gene_call),
            Occupied(entry) => bail!("Entry for {} is already occupied.", entry.key())
        };
        Ok(())
    }

    // getters
    pub fn database_metadata(&self) -> &DefinitionMetadata {
        &self.database_metadata
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn gene_calls(&self) -> &BTreeMap<String, GeneCall> {
        &self.gene_calls
    }
}

/// Everything reported for a single gene
#[derive(Clone, Debug, Serialize)]
pub struct GeneCall {
    gene: String,
    chromosome: String,
    /// True if every heterozygous call used for matching was phased
    phased: bool,
    /// Ordered diplotype candidates
    diplotypes: Vec<DiplotypeMatch>,
    /// Distinct haplotypes across the diplotypes, or the bare per-strand set for additive genes
    haplotypes: Vec<BaseMatch>,
    missing_positions: BTreeSet<VariantLocus>,
    mismatched_positions: BTreeSet<VariantLocus>,
    ignored_positions: BTreeSet<VariantLocus>,
    extra_positions: Vec<ExtraPosition>,
    warnings: Vec<String>,
    /// Set if the gene could not be called at all
    #[serde(skip_serializing_if = "Option::is_none")]
    uncallable_reason: Option<String>
}

impl GeneCall {
    /// Wraps a list of diplotype candidates, which may be empty
    /// # Arguments
    /// * `data` - the working set the candidates were found with
    /// * `diplotypes` - the ordered candidates
    /// * `warnings` - any warnings for the gene
    pub fn from_diplotypes(data: &MatchData, diplotypes: Vec<DiplotypeMatch>, warnings: Vec<String>) -> GeneCall {
        let mut seen: BTreeSet<&str> = Default::default();
        let haplotypes: Vec<BaseMatch> = diplotypes.iter()
            .flat_map(|d| [d.haplotype1(), d.haplotype2()])
            .filter(|h| seen.insert(h.name()))
            .cloned()
            .collect();
        GeneCall::from_data(data, diplotypes, haplotypes, warnings)
    }

    /// Wraps a bare per-strand haplotype set, no pairing is reported
    /// # Arguments
    /// * `data` - the working set the haplotypes were found with
    /// * `haplotypes` - the ordered haplotypes
    /// * `warnings` - any warnings for the gene
    pub fn from_haplotypes(data: &MatchData, haplotypes: Vec<BaseMatch>, warnings: Vec<String>) -> GeneCall {
        GeneCall::from_data(data, vec![], haplotypes, warnings)
    }

    /// Generic wrapper for a gene that could not be called, usually from some algorithm failure
    pub fn no_call(gene: &str, chromosome: &str, reason: &str) -> GeneCall {
        GeneCall {
            gene: gene.to_string(),
            chromosome: chromosome.to_string(),
            phased: false,
            diplotypes: vec![],
            haplotypes: vec![],
            missing_positions: Default::default(),
            mismatched_positions: Default::default(),
            ignored_positions: Default::default(),
            extra_positions: vec![],
            warnings: vec![reason.to_string()],
            uncallable_reason: Some(reason.to_string())
        }
    }

    fn from_data(data: &MatchData, diplotypes: Vec<DiplotypeMatch>, haplotypes: Vec<BaseMatch>, warnings: Vec<String>) -> GeneCall {
        GeneCall {
            gene: data.gene().to_string(),
            chromosome: data.chromosome().to_string(),
            phased: data.is_phased(),
            diplotypes,
            haplotypes,
            missing_positions: data.missing_positions().clone(),
            mismatched_positions: data.mismatched_positions().clone(),
            ignored_positions: data.ignored_positions().clone(),
            extra_positions: data.extra_positions().to_vec(),
            warnings,
            uncallable_reason: None
        }
    }

    /// Simplified diplotypes for downstream tools.
    /// Presence-only genes, and additive genes that only have a haplotype set, collapse to the distinct non-reference haplotypes.
    /// # Arguments
    /// * `gene_config` - the capability table
    pub fn summary_diplotypes(&self, gene_config: &GeneConfig) -> Vec<Diplotype> {
        if self.uncallable_reason.is_some() || (self.diplotypes.is_empty() && self.haplotypes.is_empty()) {
            return vec![Diplotype::new("NO_MATCH", "NO_MATCH")];
        }

        let presence_only = gene_config.has_capability(&self.gene, GeneCapability::PresenceOnly);
        if presence_only || self.diplotypes.is_empty() {
            let found: Vec<&BaseMatch> = if self.diplotypes.is_empty() {
                self.haplotypes.iter().collect()
            } else {
                self.diplotypes.iter()
                    .flat_map(|d| [d.haplotype1(), d.haplotype2()])
                    .collect()
            };

            let non_reference: Vec<&str> = found.iter()
                .filter(|h| !h.is_reference())
                .map(|h| h.name())
                .unique()
                .collect();
            let summary = if non_reference.is_empty() {
                found.iter().find(|h| h.is_reference())
                    .map(|h| h.name().to_string())
                    .unwrap_or_else(|| "NO_MATCH".to_string())
            } else {
                non_reference.join(COMBINATION_JOINER)
            };
            return vec![Diplotype::new(&summary, &summary)];
        }

        self.diplotypes.iter()
            .map(|d| Diplotype::new(d.haplotype1().name(), d.haplotype2().name()))
            .collect()
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    pub fn diplotypes(&self) -> &[DiplotypeMatch] {
        &self.diplotypes
    }

    pub fn haplotypes(&self) -> &[BaseMatch] {
        &self.haplotypes
    }

    pub fn missing_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.missing_positions
    }

    pub fn mismatched_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.mismatched_positions
    }

    pub fn ignored_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.ignored_positions
    }

    pub fn extra_positions(&self) -> &[ExtraPosition] {
        &self.extra_positions
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn uncallable_reason(&self) -> Option<&str> {
        self.uncallable_reason.as_deref()
    }
}

/// A simplified diplotype, just the two haplotype names
#[derive(Clone, Debug, Serialize)]
pub struct Diplotype {
    /// short string for haplotype 1
    hap1: String,
    /// short string for haplotype 2
    hap2: String,
    /// combination diplotype call
    diplotype: String
}

impl Diplotype {
    pub fn new(hap1: &str, hap2: &str) -> Diplotype {
        Diplotype {
            hap1: hap1.to_string(),
            hap2: hap2.to_string(),
            diplotype: format!("{}/{}", hap1, hap2)
        }
    }

    /// If homozygous, return the single haplotype
    pub fn homozygous_haplotype(&self) -> Option<&str> {
        if self.hap1 == self.hap2 {
            Some(&self.hap1)
        } else {
            None
        }
    }

    pub fn diplotype(&self) -> &str {
        &self.diplotype
    }

    /// Returns a PharmCAT formatted diplotype, combination haplotypes are wrapped in brackets.
    /// See https://pharmcat.org/using/Outside-Call-Format/#diplotypes for more details.
    pub fn pharmcat_diplotype(&self) -> String {
        let bracket = |h: &str| -> String {
            if h.contains(COMBINATION_JOINER) {
                format!("[{h}]")
            } else {
                h.to_string()
            }
        };
        format!("{}/{}", bracket(&self.hap1), bracket(&self.hap2))
    }
}

impl PartialEq for Diplotype {
    fn eq(&self, other: &Self) -> bool {
        // this allows for a swap in hap1/hap2 and we still report identity
        (self.hap1 == other.hap1 && self.hap2 == other.hap2) ||
            (self.hap1 == other.hap2 && self.hap2 == other.hap1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matcher::diplotype_matcher::DiplotypeMatcher;
    use crate::matcher::haplotype_matcher::{HaplotypeMatcher, MatchMode};
    use crate::matcher::match_data::MatchDataBuilder;
    use crate::matcher::name_comparator::NaturalNameComparator;
    use crate::util::test_util::{build_sample, dpyd_like_gene, het, hom, phased, test_metadata};

    #[test]
    fn test_diplotype() {
        let diplotype = Diplotype::new("*1", "*6 + *7");
        assert_eq!(diplotype.diplotype(), "*1/*6 + *7");
        assert_eq!(diplotype.pharmcat_diplotype(), "*1/[*6 + *7]");
        assert_eq!(Diplotype::new("Reference", "c.1905+1G>A").pharmcat_diplotype(), "Reference/c.1905+1G>A");
        assert_eq!(diplotype.homozygous_haplotype(), None);
        assert_eq!(Diplotype::new("*2", "*2").homozygous_haplotype(), Some("*2"));
        assert_eq!(diplotype, Diplotype::new("*6 + *7", "*1"));
    }

    #[test]
    fn test_gene_call_summaries() {
        let comparator = NaturalNameComparator::default();
        let gene = dpyd_like_gene();
        let sample = build_sample(vec![het(100, "G", "A", false), hom(200, "C"), hom(300, "A"), hom(400, "C")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        let diplotypes = DiplotypeMatcher::new(&data, &comparator).compute(MatchMode::Strict, false).unwrap();
        let gene_call = GeneCall::from_diplotypes(&data, diplotypes, vec![]);
        let names: Vec<&str> = gene_call.haplotypes().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["Reference", "c.62G>A"]);

        let mut config = GeneConfig::empty();
        assert_eq!(gene_call.summary_diplotypes(&config), vec![Diplotype::new("Reference", "c.62G>A")]);
        config.add_capability("DPYD", GeneCapability::PresenceOnly);
        assert_eq!(gene_call.summary_diplotypes(&config), vec![Diplotype::new("c.62G>A", "c.62G>A")]);

        // a haplotype set collapses to what is present
        let sample = build_sample(vec![phased(100, "G", "A"), phased(200, "C", "T"), phased(300, "A", "G"), phased(400, "C", "C")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let haplotypes = HaplotypeMatcher::new(&data, &comparator).haplotype_set().unwrap();
        let gene_call = GeneCall::from_haplotypes(&data, haplotypes, vec![]);
        assert!(gene_call.diplotypes().is_empty());
        assert_eq!(
            gene_call.summary_diplotypes(&GeneConfig::empty()),
            vec![Diplotype::new("c.62G>A + c.1129-5923C>G", "c.62G>A + c.1129-5923C>G")]
        );

        let no_call = GeneCall::no_call("DPYD", "chr1", "too many permutations");
        assert_eq!(no_call.summary_diplotypes(&GeneConfig::empty()), vec![Diplotype::new("NO_MATCH", "NO_MATCH")]);
        assert_eq!(no_call.uncallable_reason(), Some("too many permutations"));
    }

    #[test]
    fn test_match_results_insert() {
        let gene_call = GeneCall::no_call("DPYD", "chr1", "skipped");
        let mut results = MatchResults::new(test_metadata(), "sample");
        results.insert("DPYD".to_string(), gene_call.clone()).unwrap();
        assert!(results.insert("DPYD".to_string(), gene_call).is_err());
        assert_eq!(results.gene_calls().len(), 1);
        assert_eq!(results.sample_id(), "sample");
    }
}
