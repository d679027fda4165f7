use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// This matches tandem-repeat like symbols: AC(8) OR ACGTAGT(3).
    /// "seq" matches the repeated unit and "count" matches the contained repeat value.
    pub static ref REPEAT_REGEX: Regex = Regex::new(r"^(?<seq>[A-Z]+)\((?<count>[0-9]+)\)$").unwrap();
}

/// The class of variation described by a locus, which drives how novel alleles are named
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::Display)]
pub enum LocusType {
    /// Single base change
    #[default]
    #[strum(to_string = "SNP")]
    #[serde(alias = "SNP")]
    Snp,
    /// Anchored deletion, reference symbol is longer than the alternates
    #[strum(to_string = "DEL")]
    #[serde(alias = "DEL")]
    Deletion,
    /// Anchored insertion, alternate symbols extend the reference
    #[strum(to_string = "INS")]
    #[serde(alias = "INS")]
    Insertion,
    /// Tandem repeat, symbols are written as UNIT(count)
    #[strum(to_string = "REPEAT")]
    #[serde(alias = "REPEAT")]
    Repeat,
    /// Anything else, e.g. MNVs or deletion-insertions
    #[strum(to_string = "DELINS")]
    #[serde(alias = "DELINS")]
    DelIns
}

/// A single genomic position of interest for a gene.
/// Loci are immutable after loading and order by chromosome, then coordinate.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct VariantLocus {
    /// Chromosome the locus is on
    chromosome: String,
    /// 1-based coordinate of the first reference base
    position: u64,
    /// The reference symbol at this locus
    reference: String,
    /// The accepted VCF symbols at this locus, the reference is always first
    alleles: Vec<String>,
    /// The variation class
    #[serde(default)]
    locus_type: LocusType,
    /// Stable identifier, typically a dbSNP ID
    #[serde(default)]
    rsid: Option<String>
}

impl VariantLocus {
    /// Constructor
    /// # Arguments
    /// * `chromosome` - the chromosome label, e.g. "chr1"
    /// * `position` - 1-based coordinate
    /// * `reference` - the reference symbol
    /// * `alternates` - any alternate symbols that are accepted at this locus
    /// * `locus_type` - the variation class
    /// * `rsid` - optional stable identifier
    pub fn new(chromosome: &str, position: u64, reference: &str, alternates: &[&str], locus_type: LocusType, rsid: Option<String>) -> VariantLocus {
        let mut alleles = vec![reference.to_string()];
        alleles.extend(alternates.iter().filter(|&&a| a != reference).map(|a| a.to_string()));
        VariantLocus {
            chromosome: chromosome.to_string(),
            position,
            reference: reference.to_string(),
            alleles,
            locus_type,
            rsid
        }
    }

    /// Returns the "chromosome:position" key that sample alleles are indexed by
    pub fn chr_position(&self) -> String {
        format!("{}:{}", self.chromosome, self.position)
    }

    /// Returns true if the symbol is one of the accepted alleles for this locus
    pub fn is_accepted(&self, symbol: &str) -> bool {
        self.alleles.iter().any(|a| a == symbol)
    }

    /// Names a non-reference symbol observed at this locus with genomic HGVS-style notation, e.g. "g.233760973C>T".
    /// # Arguments
    /// * `allele` - the observed symbol
    pub fn novel_variant_name(&self, allele: &str) -> String {
        let reference = self.reference.as_str();

        if self.locus_type == LocusType::Repeat {
            if let Some(captures) = REPEAT_REGEX.captures(allele) {
                return format!("g.{}{}[{}]", self.position, &captures["seq"], &captures["count"]);
            }
        }

        let ref_len = reference.chars().count();
        let alt_len = allele.chars().count();
        let shared = reference.chars().zip(allele.chars())
            .take_while(|(r, a)| r == a)
            .count();

        if ref_len == 1 && alt_len == 1 {
            format!("g.{}{}>{}", self.position, reference, allele)
        } else if shared == alt_len && ref_len > alt_len {
            // anchored deletion
            let deleted: String = reference.chars().skip(shared).collect();
            let start = self.position + shared as u64;
            let end = self.position + ref_len as u64 - 1;
            if start == end {
                format!("g.{start}del{deleted}")
            } else {
                format!("g.{start}_{end}del{deleted}")
            }
        } else if shared == ref_len && alt_len > ref_len {
            // anchored insertion
            let inserted: String = allele.chars().skip(shared).collect();
            let left = self.position + ref_len as u64 - 1;
            format!("g.{}_{}ins{}", left, left + 1, inserted)
        } else {
            let end = self.position + ref_len.max(1) as u64 - 1;
            if end == self.position {
                format!("g.{}delins{}", self.position, allele)
            } else {
                format!("g.{}_{}delins{}", self.position, end, allele)
            }
        }
    }

    // getters
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    pub fn locus_type(&self) -> LocusType {
        self.locus_type
    }

    pub fn rsid(&self) -> Option<&str> {
        self.rsid.as_deref()
    }
}
