use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::data_types::iupac::is_wobble;
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::errors::MatcherError;
use crate::matcher::pattern::AllelePattern;

/// A catalog entry as authored, aligned to the full position list of its gene
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AlleleDefinition {
    /// Stable identifier for the allele
    id: String,
    /// Display name, e.g. "*2"
    name: String,
    /// One symbol per gene position, None means the allele does not define that position
    alleles: Vec<Option<String>>,
    /// True for the canonical reference allele of the gene
    #[serde(default)]
    reference: bool,
    /// Optional population -> frequency map, passed through to results
    #[serde(default)]
    population_frequency: Option<BTreeMap<String, String>>
}

impl AlleleDefinition {
    /// Constructor
    /// # Arguments
    /// * `id` - stable identifier
    /// * `name` - display name
    /// * `alleles` - the symbol tuple, aligned to the gene positions
    /// * `reference` - if true, this is the canonical reference allele
    pub fn new(id: &str, name: &str, alleles: Vec<Option<String>>, reference: bool) -> AlleleDefinition {
        AlleleDefinition {
            id: id.to_string(),
            name: name.to_string(),
            alleles,
            reference,
            population_frequency: None
        }
    }

    /// Returns the positions this allele defines a symbol for
    /// # Arguments
    /// * `positions` - the gene positions this allele is aligned to
    pub fn defined_positions<'a>(&'a self, positions: &'a [VariantLocus]) -> impl Iterator<Item = &'a VariantLocus> + 'a {
        positions.iter().zip(self.alleles.iter())
            .filter(|(_, symbol)| symbol.is_some())
            .map(|(locus, _)| locus)
    }

    // getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alleles(&self) -> &[Option<String>] {
        &self.alleles
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn population_frequency(&self) -> Option<&BTreeMap<String, String>> {
        self.population_frequency.as_ref()
    }
}

/// A haplotype definition that has been initialized against a specific position list and is ready to match.
/// These are never edited; re-aligning to another position list builds a new instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedAllele {
    id: String,
    name: String,
    is_reference: bool,
    /// One symbol per aligned position
    alleles: Vec<Option<String>>,
    /// Number of catalog definitions this haplotype was built from, 1 for a plain definition
    num_components: usize,
    /// Number of residual novel positions, only non-zero for synthesized haplotypes
    num_partials: usize,
    /// Count of defining symbols, this does not change when gaps are back-filled
    score: usize,
    /// Positions the allele defines that the sample did not have data for
    missing_positions: BTreeSet<VariantLocus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    population_frequency: Option<BTreeMap<String, String>>,
    #[serde(skip)]
    pattern: AllelePattern
}

impl NamedAllele {
    /// Initializes a catalog definition against the full gene position list.
    /// # Arguments
    /// * `definition` - the catalog entry
    /// * `positions` - the full gene position list the definition was authored against
    /// # Errors
    /// * if the definition tuple length does not match the position count
    pub fn from_definition(definition: &AlleleDefinition, positions: &[VariantLocus]) -> Result<NamedAllele, MatcherError> {
        let score = definition.alleles().iter().filter(|a| a.is_some()).count();
        NamedAllele::initialize(
            definition.id(), definition.name(), definition.is_reference(),
            definition.alleles().to_vec(), positions,
            1, 0, score,
            Default::default(), definition.population_frequency().cloned()
        )
    }

    /// Re-derives a catalog definition onto a reduced position list.
    /// The new tuple only keeps the usable positions and the score is recomputed from it.
    /// # Arguments
    /// * `definition` - the catalog entry
    /// * `gene` - the gene name, for error reporting
    /// * `all_positions` - the full gene position list the definition was authored against
    /// * `usable` - the subset of positions to project onto, in the same order as `all_positions`
    /// * `missing` - positions the sample has no data for
    /// # Errors
    /// * if the definition tuple does not match `all_positions`
    /// * if a usable position is not part of `all_positions`
    pub fn project(definition: &AlleleDefinition, gene: &str, all_positions: &[VariantLocus], usable: &[VariantLocus], missing: &BTreeSet<VariantLocus>) -> Result<NamedAllele, MatcherError> {
        if definition.alleles().len() != all_positions.len() {
            return Err(MatcherError::AlleleLengthMismatch {
                allele: definition.name().to_string(),
                expected: all_positions.len(),
                found: definition.alleles().len()
            });
        }

        let index: BTreeMap<u64, usize> = all_positions.iter().enumerate()
            .map(|(i, locus)| (locus.position(), i))
            .collect();

        let mut alleles: Vec<Option<String>> = Vec::with_capacity(usable.len());
        for locus in usable.iter() {
            let i = *index.get(&locus.position()).ok_or_else(|| MatcherError::UnknownPosition {
                gene: gene.to_string(),
                position: locus.position()
            })?;
            alleles.push(definition.alleles()[i].clone());
        }

        let missing_positions: BTreeSet<VariantLocus> = definition.defined_positions(all_positions)
            .filter(|locus| missing.contains(*locus))
            .cloned()
            .collect();

        let score = alleles.iter().filter(|a| a.is_some()).count();
        NamedAllele::initialize(
            definition.id(), definition.name(), definition.is_reference(),
            alleles, usable,
            1, 0, score,
            missing_positions, definition.population_frequency().cloned()
        )
    }

    /// Builds a synthesized haplotype, e.g. a combination of several definitions with novel variants on top.
    /// The score is supplied by the caller since novel positions do not count towards it.
    /// # Arguments
    /// * `id` - identifier for the synthesized haplotype
    /// * `name` - display name for the synthesized haplotype
    /// * `alleles` - the combined symbol tuple
    /// * `positions` - the positions the tuple is aligned to
    /// * `num_components` - how many catalog definitions contributed
    /// * `num_partials` - how many novel positions were appended
    /// * `score` - the summed component score
    /// * `missing_positions` - union of the component missing positions
    /// # Errors
    /// * if the tuple length does not match the position count
    #[allow(clippy::too_many_arguments)]
    pub fn synthesize(
        id: &str, name: &str, alleles: Vec<Option<String>>, positions: &[VariantLocus],
        num_components: usize, num_partials: usize, score: usize, missing_positions: BTreeSet<VariantLocus>
    ) -> Result<NamedAllele, MatcherError> {
        NamedAllele::initialize(id, name, false, alleles, positions, num_components, num_partials, score, missing_positions, None)
    }

    /// Returns a copy where every undefined position is filled in from the reference.
    /// A gap becomes the locus reference symbol unless the reference definition has a wobble code there, which is kept as-is.
    /// The score is carried over unchanged, filled positions are not evidence.
    /// # Arguments
    /// * `reference` - the reference haplotype aligned to the same positions, if the gene has one
    /// * `positions` - the aligned positions
    /// # Errors
    /// * if the tuple length does not match the position count
    pub fn backfilled(&self, reference: Option<&NamedAllele>, positions: &[VariantLocus]) -> Result<NamedAllele, MatcherError> {
        let alleles: Vec<Option<String>> = self.alleles.iter().zip(positions.iter()).enumerate()
            .map(|(i, (symbol, locus))| {
                if symbol.is_some() {
                    return symbol.clone();
                }
                let reference_symbol = reference.and_then(|r| r.alleles().get(i)).and_then(|s| s.as_deref());
                match reference_symbol {
                    Some(wobble) if is_wobble(wobble) => Some(wobble.to_string()),
                    _ => Some(locus.reference().to_string())
                }
            })
            .collect();

        NamedAllele::initialize(
            &self.id, &self.name, self.is_reference,
            alleles, positions,
            self.num_components, self.num_partials, self.score,
            self.missing_positions.clone(), self.population_frequency.clone()
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn initialize(
        id: &str, name: &str, is_reference: bool, alleles: Vec<Option<String>>, positions: &[VariantLocus],
        num_components: usize, num_partials: usize, score: usize,
        missing_positions: BTreeSet<VariantLocus>, population_frequency: Option<BTreeMap<String, String>>
    ) -> Result<NamedAllele, MatcherError> {
        if alleles.len() != positions.len() {
            return Err(MatcherError::AlleleLengthMismatch {
                allele: name.to_string(),
                expected: positions.len(),
                found: alleles.len()
            });
        }

        let pattern = AllelePattern::compile(&alleles, positions);
        Ok(NamedAllele {
            id: id.to_string(),
            name: name.to_string(),
            is_reference,
            alleles,
            num_components,
            num_partials,
            score,
            missing_positions,
            population_frequency,
            pattern
        })
    }

    /// True if this haplotype was synthesized rather than taken from a single catalog definition
    pub fn is_combination(&self) -> bool {
        self.num_components != 1 || self.num_partials > 0
    }

    /// True if this haplotype carries residual novel positions
    pub fn is_partial(&self) -> bool {
        self.num_partials > 0
    }

    // getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    pub fn alleles(&self) -> &[Option<String>] {
        &self.alleles
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn num_partials(&self) -> usize {
        self.num_partials
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn missing_positions(&self) -> &BTreeSet<VariantLocus> {
        &self.missing_positions
    }

    pub fn population_frequency(&self) -> Option<&BTreeMap<String, String>> {
        self.population_frequency.as_ref()
    }

    pub fn pattern(&self) -> &AllelePattern {
        &self.pattern
    }
}
