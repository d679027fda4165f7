use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::data_types::named_allele::NamedAllele;
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::errors::MatcherError;
use crate::matcher::name_comparator::AlleleNameComparator;

/// Separator between the parts of a synthesized haplotype name, e.g. "*6 + *7"
pub const COMBINATION_JOINER: &str = " + ";

/// A residual position where the strand carries a non-reference symbol that no chosen definition explains
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PartialVariant {
    position: u64,
    allele: String,
    /// Genomic notation for the change, e.g. "g.40A>G"
    name: String
}

impl PartialVariant {
    pub fn new(locus: &VariantLocus, allele: &str) -> PartialVariant {
        PartialVariant {
            position: locus.position(),
            allele: allele.to_string(),
            name: locus.novel_variant_name(allele)
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn allele(&self) -> &str {
        &self.allele
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One strand's candidate: a haplotype plus every strand sequence it was matched against
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BaseMatch {
    name: String,
    haplotype: NamedAllele,
    sequences: BTreeSet<String>,
    /// Catalog definitions this match is built from, just the haplotype itself for plain matches
    components: Vec<String>,
    partials: Vec<PartialVariant>
}

impl BaseMatch {
    /// Wraps a plain catalog haplotype
    pub fn new(haplotype: NamedAllele) -> BaseMatch {
        BaseMatch {
            name: haplotype.name().to_string(),
            components: vec![haplotype.name().to_string()],
            haplotype,
            sequences: Default::default(),
            partials: vec![]
        }
    }

    /// Records another strand sequence that this haplotype matches
    pub fn add_sequence(&mut self, sequence: &str) {
        self.sequences.insert(sequence.to_string());
    }

    /// Adds all the sequences from another match of the same haplotype
    pub fn merge(&mut self, other: &BaseMatch) {
        self.sequences.extend(other.sequences.iter().cloned());
    }

    pub fn score(&self) -> usize {
        self.haplotype.score()
    }

    pub fn is_reference(&self) -> bool {
        self.haplotype.is_reference()
    }

    pub fn is_combination(&self) -> bool {
        self.haplotype.is_combination()
    }

    pub fn is_partial(&self) -> bool {
        self.haplotype.is_partial()
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn haplotype(&self) -> &NamedAllele {
        &self.haplotype
    }

    pub fn sequences(&self) -> &BTreeSet<String> {
        &self.sequences
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn partials(&self) -> &[PartialVariant] {
        &self.partials
    }
}

/// Compares two possibly combined names part by part, e.g. "*6 + *7" vs "*6 + g.40A>G"
pub fn compare_combined_names(name1: &str, name2: &str, comparator: &dyn AlleleNameComparator) -> Ordering {
    let parts1: Vec<&str> = name1.split(COMBINATION_JOINER).collect();
    let parts2: Vec<&str> = name2.split(COMBINATION_JOINER).collect();
    for (p1, p2) in parts1.iter().zip(parts2.iter()) {
        let ordering = comparator.compare(p1, p2);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    parts1.len().cmp(&parts2.len())
}

/// Reporting order for single-strand matches: the reference first, then by name
pub fn compare_base_matches(m1: &BaseMatch, m2: &BaseMatch, comparator: &dyn AlleleNameComparator) -> Ordering {
    m2.is_reference().cmp(&m1.is_reference())
        .then_with(|| compare_combined_names(m1.name(), m2.name(), comparator))
        .then_with(|| m1.sequences().cmp(m2.sequences()))
}

/// A synthesized explanation of one strand built from disjoint catalog definitions and residual novel variants
#[derive(Clone, Debug)]
pub struct CombinationMatch {
    /// The chosen definitions, in name order
    components: Vec<NamedAllele>,
    /// Residual non-reference positions, in position order
    partials: Vec<PartialVariant>,
    /// The strand sequence this explains
    sequence: String,
    name: String,
    /// Sum of the component scores, partials do not count
    score: usize
}

impl CombinationMatch {
    /// Constructor, the display name is the component names followed by the partial names
    /// # Arguments
    /// * `components` - the chosen definitions, must define disjoint positions
    /// * `partials` - the residual novel variants
    /// * `sequence` - the strand sequence being explained
    /// * `comparator` - orders the component names
    pub fn new(mut components: Vec<NamedAllele>, mut partials: Vec<PartialVariant>, sequence: &str, comparator: &dyn AlleleNameComparator) -> CombinationMatch {
        components.sort_by(|a, b| comparator.compare(a.name(), b.name()));
        partials.sort_by_key(|p| p.position());

        let name = components.iter().map(|c| c.name())
            .chain(partials.iter().map(|p| p.name()))
            .collect::<Vec<&str>>()
            .join(COMBINATION_JOINER);
        let score = components.iter().map(|c| c.score()).sum();

        CombinationMatch {
            components,
            partials,
            sequence: sequence.to_string(),
            name,
            score
        }
    }

    /// Priority between two explanations of the same strand, `Less` means `self` is preferred.
    /// Higher score wins, then fewer partials, then fewer components, then name order.
    pub fn priority_cmp(&self, other: &CombinationMatch, comparator: &dyn AlleleNameComparator) -> Ordering {
        other.score.cmp(&self.score)
            .then_with(|| self.partials.len().cmp(&other.partials.len()))
            .then_with(|| self.components.len().cmp(&other.components.len()))
            .then_with(|| compare_combined_names(&self.name, &other.name, comparator))
    }

    /// Builds the synthetic haplotype and wraps it as a strand match.
    /// Each position takes the symbol of the component defining it, or the observed symbol for a partial.
    /// # Arguments
    /// * `positions` - the positions every component is aligned to
    /// # Errors
    /// * if a component is not aligned to `positions`
    pub fn into_base_match(self, positions: &[VariantLocus]) -> Result<BaseMatch, MatcherError> {
        let mut alleles: Vec<Option<String>> = vec![None; positions.len()];
        for component in self.components.iter() {
            if component.alleles().len() != positions.len() {
                return Err(MatcherError::AlleleLengthMismatch {
                    allele: component.name().to_string(),
                    expected: positions.len(),
                    found: component.alleles().len()
                });
            }
            for (slot, symbol) in alleles.iter_mut().zip(component.alleles().iter()) {
                if slot.is_none() {
                    slot.clone_from(symbol);
                }
            }
        }
        for partial in self.partials.iter() {
            if let Some(i) = positions.iter().position(|l| l.position() == partial.position()) {
                alleles[i] = Some(partial.allele().to_string());
            }
        }

        let missing_positions: BTreeSet<VariantLocus> = self.components.iter()
            .flat_map(|c| c.missing_positions().iter().cloned())
            .collect();
        let haplotype = NamedAllele::synthesize(
            &self.name, &self.name, alleles, positions,
            self.components.len(), self.partials.len(), self.score, missing_positions
        )?;

        Ok(BaseMatch {
            name: self.name,
            haplotype,
            sequences: BTreeSet::from([self.sequence]),
            components: self.components.iter().map(|c| c.name().to_string()).collect(),
            partials: self.partials
        })
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn components(&self) -> &[NamedAllele] {
        &self.components
    }

    pub fn partials(&self) -> &[PartialVariant] {
        &self.partials
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }
}

/// An unordered pair of strand matches that jointly reconstructs the sample genotype
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiplotypeMatch {
    /// "hap1/hap2"
    name: String,
    haplotype1: BaseMatch,
    haplotype2: BaseMatch,
    /// Sum of the two haplotype scores
    score: usize,
    /// The (strand 1, strand 2) sequence pairs that produced this pairing, aligned to the haplotype order
    sequence_pairs: BTreeSet<(String, String)>
}

impl DiplotypeMatch {
    /// Pairs two strand matches, the lower one by reporting order always comes first
    pub fn new(haplotype1: BaseMatch, haplotype2: BaseMatch, comparator: &dyn AlleleNameComparator) -> DiplotypeMatch {
        let (haplotype1, haplotype2) = if compare_base_matches(&haplotype1, &haplotype2, comparator) == Ordering::Greater {
            (haplotype2, haplotype1)
        } else {
            (haplotype1, haplotype2)
        };
        DiplotypeMatch {
            name: format!("{}/{}", haplotype1.name(), haplotype2.name()),
            score: haplotype1.score() + haplotype2.score(),
            haplotype1,
            haplotype2,
            sequence_pairs: Default::default()
        }
    }

    /// Records a strand pair, the sequences are given for the named haplotypes and re-ordered to match
    /// # Arguments
    /// * `name1` - the haplotype matched by `sequence1`
    /// * `sequence1` - one strand sequence
    /// * `sequence2` - the complementary strand sequence
    pub fn add_sequence_pair(&mut self, name1: &str, sequence1: &str, sequence2: &str) {
        let pair = if name1 == self.haplotype1.name() {
            (sequence1.to_string(), sequence2.to_string())
        } else {
            (sequence2.to_string(), sequence1.to_string())
        };
        self.sequence_pairs.insert(pair);
    }

    /// True if both strands carry the same haplotype
    pub fn is_homozygous(&self) -> bool {
        self.haplotype1.name() == self.haplotype2.name()
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn haplotype1(&self) -> &BaseMatch {
        &self.haplotype1
    }

    pub fn haplotype2(&self) -> &BaseMatch {
        &self.haplotype2
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn sequence_pairs(&self) -> &BTreeSet<(String, String)> {
        &self.sequence_pairs
    }
}

/// Default diplotype order: highest score first, then by the first and second haplotypes
pub fn compare_diplotypes(d1: &DiplotypeMatch, d2: &DiplotypeMatch, comparator: &dyn AlleleNameComparator) -> Ordering {
    d2.score().cmp(&d1.score())
        .then_with(|| compare_base_matches(d1.haplotype1(), d2.haplotype1(), comparator))
        .then_with(|| compare_base_matches(d1.haplotype2(), d2.haplotype2(), comparator))
}
