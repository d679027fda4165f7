//! Small programmatic fixtures shared by the unit tests

use crate::data_types::database::{DefinitionMetadata, GeneDefinition};
use crate::data_types::named_allele::AlleleDefinition;
use crate::data_types::sample_allele::{SampleAllele, SampleData};
use crate::data_types::variant_locus::{LocusType, VariantLocus};

/// A chr1 SNP
pub fn snp(position: u64, reference: &str, alt: &str) -> VariantLocus {
    VariantLocus::new("chr1", position, reference, &[alt], LocusType::Snp, None)
}

pub fn definition(name: &str, alleles: Vec<Option<&str>>, reference: bool) -> AlleleDefinition {
    let id = format!("ID_{name}");
    AlleleDefinition::new(&id, name, alleles.into_iter().map(|a| a.map(|s| s.to_string())).collect(), reference)
}

/// Builds a chr1 gene from (name, symbols, is_reference) tuples, panics if the result is invalid
pub fn build_gene(gene: &str, positions: Vec<VariantLocus>, alleles: &[(&str, Vec<Option<&str>>, bool)]) -> GeneDefinition {
    let named_alleles = alleles.iter()
        .map(|(name, symbols, reference)| definition(name, symbols.clone(), *reference))
        .collect();
    GeneDefinition::new(gene, "chr1", positions, named_alleles).unwrap()
}

pub fn test_metadata() -> DefinitionMetadata {
    let build_time = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc);
    DefinitionMetadata::new("test", "unit tests", build_time)
}

pub fn het(position: u64, allele1: &str, allele2: &str, is_phased: bool) -> SampleAllele {
    SampleAllele::new("chr1", position, allele1, Some(allele2), is_phased)
}

pub fn hom(position: u64, allele: &str) -> SampleAllele {
    SampleAllele::new("chr1", position, allele, Some(allele), false)
}

/// A phased call, `allele1` on strand 1 and `allele2` on strand 2
pub fn phased(position: u64, allele1: &str, allele2: &str) -> SampleAllele {
    SampleAllele::new("chr1", position, allele1, Some(allele2), true)
}

pub fn build_sample(alleles: Vec<SampleAllele>) -> SampleData {
    let mut sample = SampleData::new("test_sample");
    for allele in alleles.into_iter() {
        sample.insert(allele).unwrap();
    }
    sample
}

/// Reference *1 and a single *2 across a SNP, an insertion, and a deletion
pub fn star2_gene() -> GeneDefinition {
    build_gene(
        "GENE",
        vec![
            snp(1, "C", "T"),
            VariantLocus::new("chr1", 2, "C", &["CT"], LocusType::Insertion, None),
            VariantLocus::new("chr1", 4, "TG", &["T"], LocusType::Deletion, None)
        ],
        &[
            ("*1", vec![Some("C"), Some("C"), Some("TG")], true),
            ("*2", vec![Some("T"), Some("CT"), Some("T")], false)
        ]
    )
}

/// *6 is the union of *4 and *9, *7 sits on its own position, and nothing defines 40:G
pub fn cyp2b6_like_gene() -> GeneDefinition {
    build_gene(
        "CYP2B6",
        vec![snp(10, "G", "T"), snp(20, "A", "G"), snp(30, "C", "T"), snp(40, "A", "G")],
        &[
            ("*1", vec![Some("G"), Some("A"), Some("C"), Some("A")], true),
            ("*4", vec![None, Some("G"), None, None], false),
            ("*9", vec![Some("T"), None, None, None], false),
            ("*6", vec![Some("T"), Some("G"), None, None], false),
            ("*7", vec![None, None, Some("T"), None], false)
        ]
    )
}

/// Additive gene with HGVS-style allele names
pub fn dpyd_like_gene() -> GeneDefinition {
    build_gene(
        "DPYD",
        vec![snp(100, "G", "A"), snp(200, "C", "T"), snp(300, "A", "G"), snp(400, "C", "A")],
        &[
            ("Reference", vec![Some("G"), Some("C"), Some("A"), Some("C")], true),
            ("c.62G>A", vec![Some("A"), None, None, None], false),
            ("c.1129-5923C>G", vec![None, Some("T"), Some("G"), None], false),
            ("c.3067C>A", vec![None, None, None, Some("A")], false)
        ]
    )
}

/// Additive gene whose reference carries the wobble R (A or G) at position 20
pub fn wobble_reference_gene() -> GeneDefinition {
    build_gene(
        "DPYD",
        vec![snp(10, "C", "T"), snp(20, "A", "G")],
        &[
            ("Reference", vec![Some("C"), Some("R")], true),
            ("c.10C>T", vec![Some("T"), None], false)
        ]
    )
}
