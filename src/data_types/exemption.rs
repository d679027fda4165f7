use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data_types::database::GeneDefinition;
use crate::data_types::variant_locus::VariantLocus;

/// Per-gene overrides that are shipped alongside the definitions
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DefinitionExemption {
    /// The gene these overrides apply to
    gene: String,
    /// Allele names to drop from matching, compared case-insensitively
    #[serde(default)]
    ignored_alleles: BTreeSet<String>,
    /// Positions to drop from the usable set
    #[serde(default)]
    ignored_positions: BTreeSet<u64>,
    /// Positions that do not define any allele but should be reported
    #[serde(default)]
    extra_positions: Vec<VariantLocus>,
    /// If set, overrides whether all candidate diplotypes are reported instead of the top-scoring ones
    #[serde(default)]
    all_hits: Option<bool>
}

impl DefinitionExemption {
    /// Constructor
    /// # Arguments
    /// * `gene` - gene name
    /// * `ignored_alleles` - allele names to skip
    /// * `ignored_positions` - positions to skip
    /// * `extra_positions` - non-defining positions to report
    /// * `all_hits` - optional reporting mode override
    pub fn new(
        gene: &str, ignored_alleles: BTreeSet<String>, ignored_positions: BTreeSet<u64>,
        extra_positions: Vec<VariantLocus>, all_hits: Option<bool>
    ) -> DefinitionExemption {
        DefinitionExemption {
            gene: gene.to_string(),
            ignored_alleles,
            ignored_positions,
            extra_positions,
            all_hits
        }
    }

    /// True if the named allele should be dropped from matching
    pub fn ignores_allele(&self, allele_name: &str) -> bool {
        self.ignored_alleles.iter().any(|a| a.eq_ignore_ascii_case(allele_name))
    }

    /// Finds positions that are only needed by ignored alleles.
    /// A position is unused if at least one ignored allele defines it and no retained non-reference allele does.
    /// The reference allele defines everything, so it never keeps a position alive.
    /// # Arguments
    /// * `gene_definition` - the definitions for the gene this exemption applies to
    pub fn unused_positions(&self, gene_definition: &GeneDefinition) -> BTreeSet<u64> {
        let positions = gene_definition.positions();
        let mut ignored_use: BTreeSet<u64> = Default::default();
        let mut retained_use: BTreeSet<u64> = Default::default();

        for definition in gene_definition.named_alleles().iter().filter(|d| !d.is_reference()) {
            let target = if self.ignores_allele(definition.name()) {
                &mut ignored_use
            } else {
                &mut retained_use
            };
            target.extend(definition.defined_positions(positions).map(|l| l.position()));
        }

        let unused: BTreeSet<u64> = ignored_use.difference(&retained_use).cloned().collect();
        trace!("{} unused positions from ignored alleles: {unused:?}", self.gene);
        unused
    }

    /// All positions to remove from the usable set, explicit ones plus any only defined by ignored alleles
    pub fn excluded_positions(&self, gene_definition: &GeneDefinition) -> BTreeSet<u64> {
        let mut excluded = self.unused_positions(gene_definition);
        excluded.extend(self.ignored_positions.iter().cloned());
        excluded
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn ignored_alleles(&self) -> &BTreeSet<String> {
        &self.ignored_alleles
    }

    pub fn ignored_positions(&self) -> &BTreeSet<u64> {
        &self.ignored_positions
    }

    pub fn extra_positions(&self) -> &[VariantLocus] {
        &self.extra_positions
    }

    pub fn all_hits(&self) -> Option<bool> {
        self.all_hits
    }
}
