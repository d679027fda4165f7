use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::matcher::permutations::DEFAULT_MAX_PERMUTATIONS;

/// Capabilities that change how a gene is called or reported
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum GeneCapability {
    /// Only one copy is present, a homozygous call is reported as a single haplotype
    SinglePloidy,
    /// Reporting only cares which non-reference haplotypes are present
    PresenceOnly,
    /// The gene is skipped unless the research opt-in is set
    ExcludedByDefault,
    /// Haplotypes combine additively, so ambiguous samples report a per-strand haplotype set instead of a forced pairing
    AdditiveInterpretation
}

/// The gene capability table, stored with the definitions
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeneConfig {
    /// Gene name to capabilities
    capabilities: BTreeMap<String, BTreeSet<GeneCapability>>
}

impl Default for GeneConfig {
    fn default() -> Self {
        let capabilities: BTreeMap<String, BTreeSet<GeneCapability>> = [
            // copy-number aware calling lives outside this matcher
            ("CYP2D6", GeneCapability::ExcludedByDefault),
            ("DPYD", GeneCapability::AdditiveInterpretation),
            ("G6PD", GeneCapability::PresenceOnly),
            ("MT-RNR1", GeneCapability::SinglePloidy)
        ].into_iter()
            .map(|(gene, capability)| (gene.to_string(), BTreeSet::from([capability])))
            .collect();
        Self {
            capabilities
        }
    }
}

impl GeneConfig {
    /// Creates an empty table with no special genes
    pub fn empty() -> GeneConfig {
        GeneConfig {
            capabilities: Default::default()
        }
    }

    /// Adds a capability to a gene
    pub fn add_capability(&mut self, gene: &str, capability: GeneCapability) {
        self.capabilities.entry(gene.to_string())
            .or_default()
            .insert(capability);
    }

    /// Parses a "GENE:Capability" override and adds it to the table
    /// # Arguments
    /// * `value` - the override, e.g. "DPYD:AdditiveInterpretation"
    /// # Errors
    /// * if the value is not of the form "GENE:Capability"
    /// * if the capability is not recognized
    pub fn add_override(&mut self, value: &str) -> Result<(), SimpleError> {
        let (gene, capability_str) = match value.split_once(':') {
            Some((g, c)) if !g.is_empty() => (g, c),
            _ => bail!("Gene capability override must be of the form GENE:Capability, found \"{value}\"")
        };
        let capability = match GeneCapability::from_str(capability_str) {
            Ok(c) => c,
            Err(e) => bail!("Unrecognized gene capability \"{capability_str}\": {e}")
        };
        self.add_capability(gene, capability);
        Ok(())
    }

    /// True if the gene has the capability
    pub fn has_capability(&self, gene: &str, capability: GeneCapability) -> bool {
        self.capabilities.get(gene)
            .map(|c| c.contains(&capability))
            .unwrap_or(false)
    }

    /// Checks that no gene has contradictory capabilities
    /// # Errors
    /// * if a gene is both excluded by default and interpreted additively
    /// * if a gene is both single ploidy and presence only
    pub fn validate_config(&self) -> Result<(), SimpleError> {
        for (gene, capabilities) in self.capabilities.iter() {
            if capabilities.contains(&GeneCapability::ExcludedByDefault) && capabilities.contains(&GeneCapability::AdditiveInterpretation) {
                bail!("{gene} cannot be both {} and {}", GeneCapability::ExcludedByDefault, GeneCapability::AdditiveInterpretation);
            }
            if capabilities.contains(&GeneCapability::SinglePloidy) && capabilities.contains(&GeneCapability::PresenceOnly) {
                bail!("{gene} cannot be both {} and {}", GeneCapability::SinglePloidy, GeneCapability::PresenceOnly);
            }
        }
        Ok(())
    }

    pub fn capabilities(&self) -> &BTreeMap<String, BTreeSet<GeneCapability>> {
        &self.capabilities
    }
}

/// Run-level options for the matcher
#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// Enables synthesizing combination and partial haplotypes when nothing else explains a strand
    find_combinations: bool,
    /// Only keep the top-scoring diplotypes, unless an exemption says otherwise
    top_candidate_only: bool,
    /// Research opt-in for genes that are excluded by default
    call_excluded_genes: bool,
    /// Upper bound on generated strand permutations per gene
    max_permutations: usize
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            find_combinations: false,
            top_candidate_only: true,
            call_excluded_genes: false,
            max_permutations: DEFAULT_MAX_PERMUTATIONS
        }
    }
}

impl MatcherConfig {
    /// Constructor
    /// # Arguments
    /// * `find_combinations` - if true, synthesizes combination and partial haplotypes as a fallback
    /// * `top_candidate_only` - if true, only the top-scoring diplotypes are kept
    /// * `call_excluded_genes` - if true, genes that are excluded by default are called anyways
    /// * `max_permutations` - the permutation bound per gene
    pub fn new(find_combinations: bool, top_candidate_only: bool, call_excluded_genes: bool, max_permutations: usize) -> MatcherConfig {
        MatcherConfig {
            find_combinations,
            top_candidate_only,
            call_excluded_genes,
            max_permutations
        }
    }

    // getters
    pub fn find_combinations(&self) -> bool {
        self.find_combinations
    }

    pub fn top_candidate_only(&self) -> bool {
        self.top_candidate_only
    }

    pub fn call_excluded_genes(&self) -> bool {
        self.call_excluded_genes
    }

    pub fn max_permutations(&self) -> usize {
        self.max_permutations
    }
}
