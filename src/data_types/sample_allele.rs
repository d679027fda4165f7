use serde::{Deserialize, Serialize};
use simple_error::bail;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry::{Occupied, Vacant};

use crate::data_types::variant_locus::VariantLocus;

/// The sample's observed symbols at one position
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SampleAllele {
    /// Chromosome the call is on
    chromosome: String,
    /// 1-based coordinate
    position: u64,
    /// First observed symbol, strand 1 when phased
    allele1: String,
    /// Second observed symbol, strand 2 when phased; absent for haploid calls
    #[serde(default)]
    allele2: Option<String>,
    /// True if the symbols are assigned to specific strands
    #[serde(default)]
    phased: bool
}

impl SampleAllele {
    /// Constructor
    /// # Arguments
    /// * `chromosome` - chromosome label
    /// * `position` - 1-based coordinate
    /// * `allele1` - first symbol
    /// * `allele2` - second symbol, None for haploid
    /// * `phased` - if true, allele1 is on strand 1 and allele2 is on strand 2
    pub fn new(chromosome: &str, position: u64, allele1: &str, allele2: Option<&str>, phased: bool) -> SampleAllele {
        SampleAllele {
            chromosome: chromosome.to_string(),
            position,
            allele1: allele1.to_string(),
            allele2: allele2.map(|a| a.to_string()),
            phased
        }
    }

    /// Returns the "chromosome:position" key
    pub fn chr_position(&self) -> String {
        format!("{}:{}", self.chromosome, self.position)
    }

    /// True if both strands carry the same symbol, haploid calls count as homozygous
    pub fn is_homozygous(&self) -> bool {
        self.allele2.as_ref().map(|a2| a2 == &self.allele1).unwrap_or(true)
    }

    /// The symbol on strand 2, which is allele1 again for haploid calls
    pub fn strand2_allele(&self) -> &str {
        self.allele2.as_deref().unwrap_or(&self.allele1)
    }

    /// The distinct symbols observed, allele1 first
    pub fn choices(&self) -> Vec<&str> {
        if self.is_homozygous() {
            vec![self.allele1.as_str()]
        } else {
            vec![self.allele1.as_str(), self.strand2_allele()]
        }
    }

    /// Given the symbol on one strand, returns the symbol on the other strand
    pub fn other_allele(&self, symbol: &str) -> &str {
        if symbol == self.allele1 {
            self.strand2_allele()
        } else {
            &self.allele1
        }
    }

    /// Returns every observed symbol that the locus does not accept
    pub fn unaccepted_symbols(&self, locus: &VariantLocus) -> Vec<&str> {
        self.choices().into_iter()
            .filter(|s| !locus.is_accepted(s))
            .collect()
    }

    // getters
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn allele1(&self) -> &str {
        &self.allele1
    }

    pub fn allele2(&self) -> Option<&str> {
        self.allele2.as_deref()
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }
}

/// The parsed variant calls for one sample, keyed by "chromosome:position"
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SampleData {
    /// Identifier for the sample
    sample_id: String,
    /// All observed alleles
    alleles: BTreeMap<String, SampleAllele>,
    /// Any warnings raised while parsing the calls, keyed the same way as the alleles
    #[serde(default)]
    warnings: BTreeMap<String, Vec<String>>
}

impl SampleData {
    pub fn new(sample_id: &str) -> SampleData {
        SampleData {
            sample_id: sample_id.to_string(),
            alleles: Default::default(),
            warnings: Default::default()
        }
    }

    /// Adds a sample allele, keyed by its position
    /// # Errors
    /// * if the position already has an allele
    pub fn insert(&mut self, allele: SampleAllele) -> Result<(), Box<dyn std::error::Error>> {
        match self.alleles.entry(allele.chr_position()) {
            Vacant(entry) => entry.insert(allele),
            Occupied(entry) => bail!("Sample allele for {} is already present.", entry.key())
        };
        Ok(())
    }

    /// Attaches a parsing warning to a position
    pub fn add_warning(&mut self, chr_position: &str, warning: &str) {
        self.warnings.entry(chr_position.to_string())
            .or_default()
            .push(warning.to_string());
    }

    /// Makes sure every allele is stored under its own position key
    /// # Errors
    /// * if any key disagrees with the allele it points to
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for (key, allele) in self.alleles.iter() {
            let expected = allele.chr_position();
            if key != &expected {
                bail!("Sample allele key {key} does not match allele position {expected}");
            }
        }
        Ok(())
    }

    /// Looks up the sample allele at a locus
    pub fn get(&self, locus: &VariantLocus) -> Option<&SampleAllele> {
        self.alleles.get(&locus.chr_position())
    }

    /// Returns the warnings attached to a locus
    pub fn warnings_for(&self, locus: &VariantLocus) -> &[String] {
        self.warnings.get(&locus.chr_position())
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn alleles(&self) -> &BTreeMap<String, SampleAllele> {
        &self.alleles
    }

    pub fn warnings(&self) -> &BTreeMap<String, Vec<String>> {
        &self.warnings
    }
}
