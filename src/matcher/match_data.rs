use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::database::GeneDefinition;
use crate::data_types::exemption::DefinitionExemption;
use crate::data_types::named_allele::NamedAllele;
use crate::data_types::sample_allele::{SampleAllele, SampleData};
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::errors::MatcherError;
use crate::matcher::pattern::format_sequence;
use crate::matcher::permutations::{DEFAULT_MAX_PERMUTATIONS, PermutationMap, complement_strand, generate_permutations, is_effectively_phased};

/// A non-defining position that is tracked for reporting
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtraPosition {
    locus: VariantLocus,
    sample_allele: Option<SampleAllele>
}

impl ExtraPosition {
    pub fn locus(&self) -> &VariantLocus {
        &self.locus
    }

    pub fn sample_allele(&self) -> Option<&SampleAllele> {
        self.sample_allele.as_ref()
    }
}

/// Output of the alignment stage
struct Alignment {
    positions: Vec<VariantLocus>,
    sample_alleles: BTreeMap<u64, SampleAllele>,
    missing_positions: BTreeSet<VariantLocus>,
    ignored_positions: BTreeSet<VariantLocus>,
    extra_positions: Vec<ExtraPosition>
}

/// Builds the per-gene working set for one sample.
/// The stages always run in order (alignment, consistency check, haplotype re-derivation, optional back-fill, permutations)
/// and only the finished `MatchData` can be queried.
pub struct MatchDataBuilder<'a> {
    gene_definition: &'a GeneDefinition,
    sample: &'a SampleData,
    exemption: Option<&'a DefinitionExemption>,
    assume_reference: bool,
    find_combinations: bool,
    max_permutations: usize
}

impl<'a> MatchDataBuilder<'a> {
    /// Starts a builder with no exemption, no back-fill, no combinations, and the default permutation bound
    pub fn new(gene_definition: &'a GeneDefinition, sample: &'a SampleData) -> MatchDataBuilder<'a> {
        MatchDataBuilder {
            gene_definition,
            sample,
            exemption: None,
            assume_reference: false,
            find_combinations: false,
            max_permutations: DEFAULT_MAX_PERMUTATIONS
        }
    }

    pub fn exemption(mut self, exemption: Option<&'a DefinitionExemption>) -> Self {
        self.exemption = exemption;
        self
    }

    /// If true, undefined positions are back-filled from the reference, ignored when combinations are enabled
    pub fn assume_reference(mut self, assume_reference: bool) -> Self {
        self.assume_reference = assume_reference;
        self
    }

    /// If true, zero-score projections are kept in the working set.
    /// They define no usable position, so the matchers never pick them as candidates.
    pub fn find_combinations(mut self, find_combinations: bool) -> Self {
        self.find_combinations = find_combinations;
        self
    }

    pub fn max_permutations(mut self, max_permutations: usize) -> Self {
        self.max_permutations = max_permutations;
        self
    }

    /// Runs every stage and returns the finished working set
    /// # Errors
    /// * if a definition tuple does not match the gene positions
    /// * if the permutation bound is exceeded
    pub fn build(&self) -> Result<MatchData, MatcherError> {
        let gene = self.gene_definition.gene();
        let alignment = self.align();
        debug!("{gene}: {} usable, {} missing, {} ignored, {} extra positions",
            alignment.positions.len(), alignment.missing_positions.len(), alignment.ignored_positions.len(), alignment.extra_positions.len()
        );

        let mismatched_positions = check_consistency(gene, &alignment.positions, &alignment.sample_alleles);

        let mut haplotypes = self.rederive_haplotypes(&alignment)?;
        let backfilled = self.assume_reference && !self.find_combinations;
        if backfilled && !haplotypes.is_empty() {
            haplotypes = backfill(gene, haplotypes, &alignment.positions)?;
        }

        let aligned: Vec<&SampleAllele> = aligned_alleles(gene, &alignment.positions, &alignment.sample_alleles)?;
        let is_phased = is_effectively_phased(&aligned);
        let permutations = generate_permutations(gene, &alignment.positions, &aligned, self.max_permutations)?;

        Ok(MatchData {
            gene: gene.to_string(),
            chromosome: self.gene_definition.chromosome().to_string(),
            positions: alignment.positions,
            sample_alleles: alignment.sample_alleles,
            missing_positions: alignment.missing_positions,
            ignored_positions: alignment.ignored_positions,
            mismatched_positions,
            extra_positions: alignment.extra_positions,
            haplotypes,
            permutations,
            is_phased,
            backfilled
        })
    }

    /// Pairs gene positions with sample alleles.
    /// Missing is recorded before ignored, so a position the sample lacks is always reported missing.
    fn align(&self) -> Alignment {
        let excluded: BTreeSet<u64> = self.exemption
            .map(|e| e.excluded_positions(self.gene_definition))
            .unwrap_or_default();

        let mut positions: Vec<VariantLocus> = vec![];
        let mut sample_alleles: BTreeMap<u64, SampleAllele> = Default::default();
        let mut missing_positions: BTreeSet<VariantLocus> = Default::default();
        let mut ignored_positions: BTreeSet<VariantLocus> = Default::default();

        for locus in self.gene_definition.positions().iter() {
            match self.sample.get(locus) {
                None => {
                    missing_positions.insert(locus.clone());
                },
                Some(sample_allele) => {
                    if excluded.contains(&locus.position()) {
                        ignored_positions.insert(locus.clone());
                    } else {
                        positions.push(locus.clone());
                        sample_alleles.insert(locus.position(), sample_allele.clone());
                    }
                }
            }
        }

        let extra_positions: Vec<ExtraPosition> = self.exemption
            .map(|e| e.extra_positions().iter()
                .map(|locus| ExtraPosition {
                    locus: locus.clone(),
                    sample_allele: self.sample.get(locus).cloned()
                })
                .collect()
            )
            .unwrap_or_default();

        Alignment {
            positions,
            sample_alleles,
            missing_positions,
            ignored_positions,
            extra_positions
        }
    }

    /// Projects every retained catalog definition onto the usable positions
    fn rederive_haplotypes(&self, alignment: &Alignment) -> Result<Vec<NamedAllele>, MatcherError> {
        let gene = self.gene_definition.gene();
        if alignment.positions.is_empty() {
            return Ok(vec![]);
        }

        let mut haplotypes: Vec<NamedAllele> = vec![];
        for definition in self.gene_definition.named_alleles().iter() {
            if self.exemption.map(|e| e.ignores_allele(definition.name())).unwrap_or(false) {
                trace!("{gene}: ignoring {}", definition.name());
                continue;
            }

            let projected = NamedAllele::project(
                definition, gene,
                self.gene_definition.positions(), &alignment.positions, &alignment.missing_positions
            )?;
            if projected.score() > 0 || self.find_combinations {
                haplotypes.push(projected);
            } else {
                trace!("{gene}: dropping {}, no defining positions remain", definition.name());
            }
        }

        // catalog order, with the reference first
        haplotypes.sort_by_key(|h| !h.is_reference());
        Ok(haplotypes)
    }
}

/// Flags usable positions where the sample has a symbol the locus does not accept
fn check_consistency(gene: &str, positions: &[VariantLocus], sample_alleles: &BTreeMap<u64, SampleAllele>) -> BTreeSet<VariantLocus> {
    let mut mismatched: BTreeSet<VariantLocus> = Default::default();
    for locus in positions.iter() {
        if let Some(sample_allele) = sample_alleles.get(&locus.position()) {
            let unaccepted = sample_allele.unaccepted_symbols(locus);
            if !unaccepted.is_empty() {
                warn!("{gene}: sample allele(s) {unaccepted:?} at {} are not accepted by the definition {:?}", locus.chr_position(), locus.alleles());
                mismatched.insert(locus.clone());
            }
        }
    }
    mismatched
}

/// Fills every non-reference haplotype's gaps from the reference
fn backfill(gene: &str, haplotypes: Vec<NamedAllele>, positions: &[VariantLocus]) -> Result<Vec<NamedAllele>, MatcherError> {
    let reference: Option<NamedAllele> = haplotypes.iter().find(|h| h.is_reference()).cloned();
    if reference.is_none() {
        debug!("{gene}: no reference allele, back-filling from locus reference symbols");
    }
    haplotypes.into_iter()
        .map(|h| {
            if h.is_reference() {
                Ok(h)
            } else {
                h.backfilled(reference.as_ref(), positions)
            }
        })
        .collect()
}

fn aligned_alleles<'a>(gene: &str, positions: &[VariantLocus], sample_alleles: &'a BTreeMap<u64, SampleAllele>) -> Result<Vec<&'a SampleAllele>, MatcherError> {
    positions.iter()
        .map(|locus| sample_alleles.get(&locus.position()).ok_or_else(|| MatcherError::UnknownPosition {
            gene: gene.to_string(),
            position: locus.position()
        }))
        .collect()
}

/// The fully initialized per-gene working set for one sample
#[derive(Clone, Debug)]
pub struct MatchData {
    gene: String,
    chromosome: String,
    /// Usable positions, ascending
    positions: Vec<VariantLocus>,
    /// Sample alleles at the usable positions, keyed by coordinate
    sample_alleles: BTreeMap<u64, SampleAllele>,
    missing_positions: BTreeSet<VariantLocus>,
    ignored_positions: BTreeSet<VariantLocus>,
    mismatched_positions: BTreeSet<VariantLocus>,
    extra_positions: Vec<ExtraPosition>,
    /// Candidate haplotypes aligned to `positions`, reference first
    haplotypes: Vec<NamedAllele>,
    permutations: PermutationMap,
    is_phased: bool,
    backfilled: bool
}

impl MatchData {
    /// True if the sample has no usable data for the gene
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn num_sample_alleles(&self) -> usize {
        self.sample_alleles.len()
    }

    pub fn num_permutations(&self) -> usize {
        self.permutations.len()
    }

    /// Iterates over (sequence, symbols) for every strand reconstruction
    pub fn permutations(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.permutations.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the decomposed symbols of a generated strand sequence
    pub fn strand(&self, sequence: &str) -> Option<&[String]> {
        self.permutations.get(sequence).map(|v| v.as_slice())
    }

    /// Returns the strand sequence that pairs with the given one to reconstruct the observed genotype
    pub fn complement(&self, sequence: &str) -> Option<String> {
        let strand = self.strand(sequence)?;
        let aligned: Vec<&SampleAllele> = self.positions.iter()
            .map(|l| self.sample_alleles.get(&l.position()))
            .collect::<Option<Vec<_>>>()?;
        let other = complement_strand(strand, &aligned);
        let key = format_sequence(&self.positions, &other);
        if self.permutations.contains_key(&key) {
            Some(key)
        } else {
            None
        }
    }

    /// The reference haplotype, if it survived projection
    pub fn reference_haplotype(&self) -> Option<&NamedAllele> {
        self.haplotypes.iter().find(|h| h.is_reference())
    }

    pub fn sample_allele(&self, position: u64) -> Option<&SampleAllele> {
        self.sample_alleles.get(&position)
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

    pub fn missing_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.missing_positions
    }

    pub fn ignored_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.ignored_positions
    }

    pub fn mismatched_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.mismatched_positions
    }

    pub fn extra_positions(&self) -> &[ExtraPosition] {
        &self.extra_positions
    }

    pub fn haplotypes(&self) -> &[NamedAllele] {
        &self.haplotypes
    }

    pub fn is_phased(&self) -> bool {
        self.is_phased
    }

    pub fn is_backfilled(&self) -> bool {
        self.backfilled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::util::test_util::{build_gene, build_sample, het, hom, snp};

    /// *1 reference, *2 at 10, *3 at 20, *4 at 20 and 30
    fn test_gene() -> GeneDefinition {
        build_gene(
            "GENE",
            vec![snp(10, "C", "T"), snp(20, "A", "G"), snp(30, "G", "T")],
            &[
                ("*1", vec![Some("C"), Some("A"), Some("G")], true),
                ("*2", vec![Some("T"), None, None], false),
                ("*3", vec![None, Some("G"), None], false),
                ("*4", vec![None, Some("G"), Some("T")], false)
            ]
        )
    }

    #[test]
    fn test_alignment_and_missing() {
        let gene = test_gene();
        let sample = build_sample(vec![het(10, "C", "T", false), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();

        assert_eq!(data.positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![10, 30]);
        assert_eq!(data.missing_positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![20]);
        assert_eq!(data.num_sample_alleles(), 2);
        assert!(data.is_phased()); // only one het

        // *3 only defines the missing position, so it is dropped without combinations
        let names: Vec<&str> = data.haplotypes().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["*1", "*2", "*4"]);
        let h4 = &data.haplotypes()[2];
        assert_eq!(h4.score(), 1);
        assert_eq!(h4.missing_positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![20]);

        // with combinations, zero-score projections are retained
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let names: Vec<&str> = data.haplotypes().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["*1", "*2", "*3", "*4"]);
        assert_eq!(data.haplotypes()[2].score(), 0);
    }

    #[test]
    fn test_mismatched_positions() {
        let gene = test_gene();
        let sample = build_sample(vec![het(10, "C", "A", false), hom(20, "A"), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        assert_eq!(data.mismatched_positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![10]);
        // still usable
        assert_eq!(data.positions().len(), 3);
    }

    #[test]
    fn test_exemption_alignment() {
        let gene = test_gene();
        let sample = build_sample(vec![hom(10, "C"), hom(20, "A"), hom(30, "G")]);
        let extra = snp(40, "A", "C");
        let exemption = DefinitionExemption::new("GENE", BTreeSet::from(["*4".to_string()]), Default::default(), vec![extra], None);
        let data = MatchDataBuilder::new(&gene, &sample)
            .exemption(Some(&exemption))
            .build().unwrap();

        // 30 is only needed by the ignored *4, 20 is still needed by *3
        assert_eq!(data.positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![10, 20]);
        assert_eq!(data.ignored_positions().iter().map(|l| l.position()).collect::<Vec<u64>>(), vec![30]);
        assert!(data.missing_positions().is_empty());
        assert!(data.haplotypes().iter().all(|h| h.name() != "*4"));
        assert_eq!(data.extra_positions().len(), 1);
        assert!(data.extra_positions()[0].sample_allele().is_none());
    }

    #[test]
    fn test_backfill_stage() {
        let gene = test_gene();
        let sample = build_sample(vec![het(10, "C", "T", false), hom(20, "A"), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample)
            .assume_reference(true)
            .build().unwrap();
        assert!(data.is_backfilled());
        let h2 = data.haplotypes().iter().find(|h| h.name() == "*2").unwrap();
        assert_eq!(h2.alleles(), &[Some("T".to_string()), Some("A".to_string()), Some("G".to_string())]);
        assert_eq!(h2.score(), 1);

        // never back-filled while searching for combinations
        let data = MatchDataBuilder::new(&gene, &sample)
            .assume_reference(true)
            .find_combinations(true)
            .build().unwrap();
        assert!(!data.is_backfilled());
        let h2 = data.haplotypes().iter().find(|h| h.name() == "*2").unwrap();
        assert_eq!(h2.alleles(), &[Some("T".to_string()), None, None]);
    }

    #[test]
    fn test_permutations_and_complement() {
        let gene = test_gene();
        let sample = build_sample(vec![het(10, "C", "T", false), het(20, "A", "G", false), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        assert!(!data.is_phased());
        assert_eq!(data.num_permutations(), 4);
        assert_eq!(data.complement("10:C;20:A;30:G;"), Some("10:T;20:G;30:G;".to_string()));
        assert_eq!(data.complement("10:C;20:G;30:G;"), Some("10:T;20:A;30:G;".to_string()));
        assert_eq!(data.complement("10:A;20:A;30:G;"), None);
    }

    #[test]
    fn test_empty_sample() {
        let gene = test_gene();
        let sample = build_sample(vec![]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        assert!(data.is_empty());
        assert!(!data.is_phased());
        assert!(data.haplotypes().is_empty());
        assert_eq!(data.num_permutations(), 0);
        assert_eq!(data.missing_positions().len(), 3);
    }

    #[test]
    fn test_permutation_bound() {
        let gene = test_gene();
        let sample = build_sample(vec![het(10, "C", "T", false), het(20, "A", "G", false), het(30, "G", "T", false)]);
        let result = MatchDataBuilder::new(&gene, &sample).max_permutations(4).build();
        assert!(matches!(result, Err(MatcherError::PermutationLimitExceeded { permutations: 8, limit: 4, .. })));
    }

    #[test]
    fn test_partially_phased() {
        let gene = test_gene();

        // one phased het is not enough, the unphased one still needs both orientations
        let sample = build_sample(vec![het(10, "C", "T", true), het(20, "A", "G", false), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        assert!(!data.is_phased());
        assert_eq!(data.num_permutations(), 4);
        assert_eq!(data.complement("10:C;20:G;30:G;"), Some("10:T;20:A;30:G;".to_string()));

        // homozygous calls do not count against phasing
        let sample = build_sample(vec![het(10, "C", "T", true), het(20, "A", "G", true), hom(30, "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        assert!(data.is_phased());
        assert_eq!(data.num_permutations(), 2);
        assert!(data.strand("10:C;20:A;30:G;").is_some());
        assert!(data.strand("10:C;20:G;30:G;").is_none());
    }
}
