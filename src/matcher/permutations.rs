use itertools::Itertools;
use log::debug;
use std::collections::BTreeMap;

use crate::data_types::sample_allele::SampleAllele;
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::errors::MatcherError;
use crate::matcher::pattern::format_sequence;

/// Default bound on the number of strand sequences generated for a single gene, 16 unphased heterozygous positions
pub const DEFAULT_MAX_PERMUTATIONS: usize = 1 << 16;

/// Strand sequence string to its per-position symbols
pub type PermutationMap = BTreeMap<String, Vec<String>>;

/// Returns true if every heterozygous call is phased, homozygous calls carry no linkage information.
/// With no calls at all there is nothing to be phased, so this is false.
pub fn is_effectively_phased(sample_alleles: &[&SampleAllele]) -> bool {
    !sample_alleles.is_empty() &&
        sample_alleles.iter().all(|a| a.is_phased() || a.is_homozygous())
}

/// Counts the strand sequences an unphased cross product would produce, saturating instead of overflowing
pub fn count_permutations(sample_alleles: &[&SampleAllele]) -> u128 {
    sample_alleles.iter()
        .fold(1_u128, |acc, a| acc.saturating_mul(a.choices().len() as u128))
}

/// Enumerates every strand reconstruction for the sample alleles aligned to the given positions.
/// Phased samples yield the two known strands; otherwise, the cross product of each position's observed symbols.
/// # Arguments
/// * `gene` - gene name, for error reporting
/// * `positions` - the usable positions in ascending order
/// * `sample_alleles` - one sample allele per position, in the same order
/// * `max_permutations` - upper bound on the number of generated sequences
/// # Errors
/// * if the cross product would exceed `max_permutations`
pub fn generate_permutations(gene: &str, positions: &[VariantLocus], sample_alleles: &[&SampleAllele], max_permutations: usize) -> Result<PermutationMap, MatcherError> {
    let mut permutations: PermutationMap = Default::default();
    if sample_alleles.is_empty() {
        return Ok(permutations);
    }

    if is_effectively_phased(sample_alleles) {
        let strand1: Vec<String> = sample_alleles.iter().map(|a| a.allele1().to_string()).collect();
        let strand2: Vec<String> = sample_alleles.iter().map(|a| a.strand2_allele().to_string()).collect();
        permutations.insert(format_sequence(positions, &strand1), strand1);
        permutations.insert(format_sequence(positions, &strand2), strand2);
        debug!("{gene}: phased input, {} distinct strand sequence(s)", permutations.len());
        return Ok(permutations);
    }

    let count = count_permutations(sample_alleles);
    if count > max_permutations as u128 {
        return Err(MatcherError::PermutationLimitExceeded {
            gene: gene.to_string(),
            permutations: count,
            limit: max_permutations
        });
    }

    for strand in sample_alleles.iter().map(|a| a.choices()).multi_cartesian_product() {
        let strand: Vec<String> = strand.into_iter().map(|s| s.to_string()).collect();
        permutations.insert(format_sequence(positions, &strand), strand);
    }
    debug!("{gene}: unphased input, {} strand sequences", permutations.len());
    Ok(permutations)
}

/// Builds the other strand implied by one strand reconstruction.
/// At each position the opposite observed symbol is taken, homozygous positions stay the same.
/// # Arguments
/// * `strand` - one symbol per position
/// * `sample_alleles` - the aligned sample alleles
pub fn complement_strand(strand: &[String], sample_alleles: &[&SampleAllele]) -> Vec<String> {
    strand.iter().zip(sample_alleles.iter())
        .map(|(symbol, allele)| allele.other_allele(symbol).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::util::test_util::snp;

    fn cyp_like_positions() -> Vec<VariantLocus> {
        vec![
            snp(1, "C", "T"),
            VariantLocus::new("chr1", 2, "C", &["CT"], crate::data_types::variant_locus::LocusType::Insertion, None),
            VariantLocus::new("chr1", 4, "TG", &["T"], crate::data_types::variant_locus::LocusType::Deletion, None)
        ]
    }

    fn cyp_like_alleles(phased: bool) -> Vec<SampleAllele> {
        vec![
            SampleAllele::new("chr1", 1, "C", Some("T"), phased),
            SampleAllele::new("chr1", 2, "C", Some("CT"), phased),
            SampleAllele::new("chr1", 4, "TG", Some("T"), phased)
        ]
    }

    #[test]
    fn test_phased_permutations() {
        let positions = cyp_like_positions();
        let alleles = cyp_like_alleles(true);
        let refs: Vec<&SampleAllele> = alleles.iter().collect();
        let permutations = generate_permutations("GENE", &positions, &refs, DEFAULT_MAX_PERMUTATIONS).unwrap();
        let keys: Vec<&str> = permutations.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["1:C;2:C;4:TG;", "1:T;2:CT;4:T;"]);
    }

    #[test]
    fn test_unphased_permutations() {
        let positions = cyp_like_positions();
        let alleles = cyp_like_alleles(false);
        let refs: Vec<&SampleAllele> = alleles.iter().collect();
        assert_eq!(count_permutations(&refs), 8);
        let permutations = generate_permutations("GENE", &positions, &refs, DEFAULT_MAX_PERMUTATIONS).unwrap();
        assert_eq!(permutations.len(), 8);
        assert!(permutations.contains_key("1:C;2:CT;4:TG;"));
        assert_eq!(permutations.get("1:T;2:C;4:T;").unwrap(), &vec!["T".to_string(), "C".to_string(), "T".to_string()]);
    }

    #[test]
    fn test_homozygous_reference() {
        let positions = cyp_like_positions();
        let alleles = vec![
            SampleAllele::new("chr1", 1, "C", Some("C"), false),
            SampleAllele::new("chr1", 2, "C", Some("C"), false),
            SampleAllele::new("chr1", 4, "TG", None, false)
        ];
        let refs: Vec<&SampleAllele> = alleles.iter().collect();
        assert!(is_effectively_phased(&refs));
        assert!(!is_effectively_phased(&[]));
        let permutations = generate_permutations("GENE", &positions, &refs, DEFAULT_MAX_PERMUTATIONS).unwrap();
        assert_eq!(permutations.len(), 1);
        assert!(permutations.contains_key("1:C;2:C;4:TG;"));
    }

    #[test]
    fn test_permutation_limit() {
        let positions = cyp_like_positions();
        let alleles = cyp_like_alleles(false);
        let refs: Vec<&SampleAllele> = alleles.iter().collect();
        let result = generate_permutations("GENE", &positions, &refs, 4);
        assert_eq!(result, Err(MatcherError::PermutationLimitExceeded { gene: "GENE".to_string(), permutations: 8, limit: 4 }));
    }

    #[test]
    fn test_complement_strand() {
        let alleles = cyp_like_alleles(false);
        let refs: Vec<&SampleAllele> = alleles.iter().collect();
        let strand = vec!["C".to_string(), "CT".to_string(), "TG".to_string()];
        assert_eq!(complement_strand(&strand, &refs), vec!["T".to_string(), "C".to_string(), "T".to_string()]);
    }
}
