use log::{debug, warn};
use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, bail};
use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::exemption::DefinitionExemption;
use crate::data_types::gene_config::GeneConfig;
use crate::data_types::named_allele::AlleleDefinition;
use crate::data_types::variant_locus::VariantLocus;

/// Provenance of a definition catalog
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DefinitionMetadata {
    /// The catalog version string
    version: String,
    /// Where the definitions came from, e.g. "PharmGKB"
    source: String,
    /// The time the catalog was assembled
    build_time: chrono::DateTime<chrono::Utc>
}

impl DefinitionMetadata {
    pub fn new(version: &str, source: &str, build_time: chrono::DateTime<chrono::Utc>) -> DefinitionMetadata {
        DefinitionMetadata {
            version: version.to_string(),
            source: source.to_string(),
            build_time
        }
    }

    // getters
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn build_time(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.build_time
    }
}

/// A gene's variant positions along with its catalog of named alleles.
/// Every allele is an ordered tuple of symbols aligned to `positions`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeneDefinition {
    /// The name of the gene
    gene: String,
    /// The chromosome the gene and all of its positions are on
    chromosome: String,
    /// Positions in ascending coordinate order
    positions: Vec<VariantLocus>,
    /// The allele catalog
    named_alleles: Vec<AlleleDefinition>
}

impl GeneDefinition {
    /// Creates a new gene definition and checks it for consistency
    /// # Arguments
    /// * `gene` - the gene name
    /// * `chromosome` - the chromosome all positions are on
    /// * `positions` - the positions, ascending
    /// * `named_alleles` - the catalog entries
    /// # Errors
    /// * see `validate()`
    pub fn new(gene: &str, chromosome: &str, positions: Vec<VariantLocus>, named_alleles: Vec<AlleleDefinition>) -> Result<GeneDefinition, SimpleError> {
        let definition = GeneDefinition {
            gene: gene.to_string(),
            chromosome: chromosome.to_string(),
            positions,
            named_alleles
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Checks the structural invariants of the definitions
    /// # Errors
    /// * if positions are not strictly ascending or are on another chromosome
    /// * if a locus does not list its reference symbol first
    /// * if any allele tuple length differs from the position count
    /// * if allele names are duplicated
    /// * if more than one reference allele is defined
    /// * if the reference allele uses a symbol its locus does not accept
    pub fn validate(&self) -> Result<(), SimpleError> {
        for locus in self.positions.iter() {
            if locus.chromosome() != self.chromosome {
                bail!("{}: position {} is on {}, expected {}", self.gene, locus.position(), locus.chromosome(), self.chromosome);
            }
            if locus.alleles().first().map(|a| a.as_str()) != Some(locus.reference()) {
                bail!("{}: position {} must list its reference symbol first", self.gene, locus.position());
            }
        }
        for (l1, l2) in self.positions.iter().zip(self.positions.iter().skip(1)) {
            if l1.position() >= l2.position() {
                bail!("{}: positions must be strictly ascending, found {} then {}", self.gene, l1.position(), l2.position());
            }
        }

        let mut names: BTreeSet<&str> = Default::default();
        let mut num_reference = 0;
        for allele in self.named_alleles.iter() {
            if allele.alleles().len() != self.positions.len() {
                bail!("{}: allele {} defines {} positions, expected {}", self.gene, allele.name(), allele.alleles().len(), self.positions.len());
            }
            if !names.insert(allele.name()) {
                bail!("{}: allele {} is defined more than once", self.gene, allele.name());
            }
            if allele.is_reference() {
                num_reference += 1;
                for (locus, symbol) in self.positions.iter().zip(allele.alleles().iter()) {
                    if let Some(s) = symbol.as_deref() {
                        if !locus.is_accepted(s) && !crate::data_types::iupac::is_wobble(s) {
                            bail!("{}: reference allele {} uses {s} at position {}, which is not an accepted symbol", self.gene, allele.name(), locus.position());
                        }
                    }
                }
            }
        }
        if num_reference > 1 {
            bail!("{}: found {num_reference} reference alleles, expected at most one", self.gene);
        }
        Ok(())
    }

    /// Returns the reference allele definition, if there is one
    pub fn reference_allele(&self) -> Option<&AlleleDefinition> {
        self.named_alleles.iter().find(|a| a.is_reference())
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn positions(&self) -> &[VariantLocus] {
        &self.positions
    }

    pub fn named_alleles(&self) -> &[AlleleDefinition] {
        &self.named_alleles
    }
}

/// The full definition catalog that the matcher runs against
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DefinitionDatabase {
    /// Metadata for the catalog
    database_metadata: DefinitionMetadata,
    /// Gene name to definitions
    gene_entries: BTreeMap<String, GeneDefinition>,
    /// Gene name to any exemptions
    #[serde(default)]
    exemptions: BTreeMap<String, DefinitionExemption>,
    /// The capability table
    #[serde(default)] // will populate with our default() if not in the file
    gene_config: GeneConfig
}

impl DefinitionDatabase {
    /// Constructor
    /// # Arguments
    /// * `database_metadata` - catalog provenance
    /// * `gene_entries` - all gene definitions
    /// * `exemptions` - all gene exemptions
    /// * `gene_config` - the capability table
    pub fn new(
        database_metadata: DefinitionMetadata, gene_entries: Vec<GeneDefinition>,
        exemptions: Vec<DefinitionExemption>, gene_config: GeneConfig
    ) -> DefinitionDatabase {
        DefinitionDatabase {
            database_metadata,
            gene_entries: gene_entries.into_iter().map(|g| (g.gene().to_string(), g)).collect(),
            exemptions: exemptions.into_iter().map(|e| (e.gene().to_string(), e)).collect(),
            gene_config
        }
    }

    /// Makes sure the catalog is internally consistent before anything is called against it
    /// # Errors
    /// * if any gene definition is invalid
    /// * if a gene is stored under the wrong name
    /// * if an exemption refers to a gene or position that is not defined
    /// * if the capability table is contradictory
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for (gene_name, gene_entry) in self.gene_entries.iter() {
            if gene_name != gene_entry.gene() {
                bail!("Gene entry {gene_name} contains the definitions for {}", gene_entry.gene());
            }
            gene_entry.validate()?;
        }

        for (gene_name, exemption) in self.exemptions.iter() {
            if gene_name != exemption.gene() {
                bail!("Exemption entry {gene_name} contains the exemption for {}", exemption.gene());
            }
            let gene_entry = match self.gene_entries.get(gene_name) {
                Some(ge) => ge,
                None => bail!("Exemption found for {gene_name}, which has no gene definition")
            };

            let defined: BTreeSet<u64> = gene_entry.positions().iter().map(|l| l.position()).collect();
            for position in exemption.ignored_positions().iter() {
                if !defined.contains(position) {
                    bail!("Exemption for {gene_name} ignores position {position}, which is not defined");
                }
            }
            for allele_name in exemption.ignored_alleles().iter() {
                if !gene_entry.named_alleles().iter().any(|a| a.name().eq_ignore_ascii_case(allele_name)) {
                    // not fatal, catalogs change under exemptions all the time
                    warn!("Exemption for {gene_name} ignores allele {allele_name}, which is not defined");
                }
            }
        }

        self.gene_config.validate_config()?;
        debug!("Validated {} gene entries and {} exemptions", self.gene_entries.len(), self.exemptions.len());
        Ok(())
    }

    // getters
    pub fn database_metadata(&self) -> &DefinitionMetadata {
        &self.database_metadata
    }

    pub fn gene_entries(&self) -> &BTreeMap<String, GeneDefinition> {
        &self.gene_entries
    }

    pub fn exemptions(&self) -> &BTreeMap<String, DefinitionExemption> {
        &self.exemptions
    }

    pub fn gene_config(&self) -> &GeneConfig {
        &self.gene_config
    }
}
