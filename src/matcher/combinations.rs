use log::{trace, warn};

use crate::data_types::named_allele::NamedAllele;
use crate::data_types::variant_locus::VariantLocus;
use crate::matcher::base_match::{CombinationMatch, PartialVariant};
use crate::matcher::match_data::MatchData;
use crate::matcher::name_comparator::AlleleNameComparator;
use crate::matcher::pattern::PositionRule;

/// Bound on the definitions considered for one synthesized haplotype, the search is exponential in this count
pub const MAX_COMBINATION_CANDIDATES: usize = 16;

/// True if the observed symbol is what the reference carries at this index.
/// A wobble code on the reference haplotype accepts any of its bases, otherwise the locus reference symbol is required.
fn carries_reference(observed: &str, index: usize, locus: &VariantLocus, reference: Option<&NamedAllele>) -> bool {
    match reference.and_then(|r| r.pattern().rules().get(index)) {
        Some((_, PositionRule::Wildcard)) | None => observed == locus.reference(),
        Some((_, rule)) => rule.matches(observed)
    }
}

/// Returns true if the haplotype matches the strand with nothing left over.
/// Every position the haplotype leaves undefined must carry the reference.
/// # Arguments
/// * `haplotype` - a non-back-filled haplotype aligned to `positions`
/// * `strand` - the observed symbols, one per position
/// * `positions` - the aligned positions
/// * `reference` - the reference haplotype aligned to `positions`, if the gene has one
pub fn explains_fully(haplotype: &NamedAllele, strand: &[String], positions: &[VariantLocus], reference: Option<&NamedAllele>) -> bool {
    haplotype.pattern().matches(strand) &&
        haplotype.alleles().iter().zip(strand.iter()).zip(positions.iter()).enumerate()
            .all(|(i, ((symbol, observed), locus))| symbol.is_some() || carries_reference(observed, i, locus, reference))
}

/// Collects the non-reference symbols at every position not yet covered
/// # Arguments
/// * `strand` - the observed symbols, one per position
/// * `positions` - the aligned positions
/// * `reference` - the reference haplotype aligned to `positions`, if the gene has one
/// * `covered` - true for positions a chosen definition already explains
pub fn residual_partials(strand: &[String], positions: &[VariantLocus], reference: Option<&NamedAllele>, covered: &[bool]) -> Vec<PartialVariant> {
    positions.iter().zip(strand.iter()).zip(covered.iter()).enumerate()
        .filter(|(i, ((locus, observed), is_covered))| !**is_covered && !carries_reference(observed, *i, locus, reference))
        .map(|(_, ((locus, observed), _))| PartialVariant::new(locus, observed))
        .collect()
}

/// Finds the best synthesized explanation for a strand that no single definition explains.
/// Candidates are the non-reference definitions with a positive score whose pattern matches the strand.
/// Every maximal set of candidates with pairwise disjoint defined positions is scored, and the leftover
/// non-reference symbols become partials. Returns None if there is nothing to explain.
/// Only the highest scoring candidates (catalog order within a score) are searched, see `MAX_COMBINATION_CANDIDATES`.
/// # Arguments
/// * `data` - the non-back-filled working set
/// * `sequence` - the strand sequence key
/// * `strand` - the decomposed strand
/// * `comparator` - the allele name ordering for the final tie-break
pub fn find_best_combination(data: &MatchData, sequence: &str, strand: &[String], comparator: &dyn AlleleNameComparator) -> Option<CombinationMatch> {
    let mut candidates: Vec<&NamedAllele> = data.haplotypes().iter()
        .filter(|h| !h.is_reference() && h.score() > 0 && h.pattern().matches(strand))
        .collect();
    if candidates.len() > MAX_COMBINATION_CANDIDATES {
        warn!("{}: {} combination candidates for {sequence}, only the top {MAX_COMBINATION_CANDIDATES} by score are searched", data.gene(), candidates.len());
        candidates.sort_by_key(|h| std::cmp::Reverse(h.score()));
        candidates.truncate(MAX_COMBINATION_CANDIDATES);
    }
    trace!("{}: {} combination candidates for {sequence}", data.gene(), candidates.len());

    // suffix sums of the candidate scores, an upper bound on what is still reachable
    let mut remaining_score: Vec<usize> = vec![0; candidates.len() + 1];
    for (i, candidate) in candidates.iter().enumerate().rev() {
        remaining_score[i] = remaining_score[i + 1] + candidate.score();
    }

    let mut search = CombinationSearch {
        positions: data.positions(),
        reference: data.reference_haplotype(),
        sequence,
        strand,
        candidates,
        remaining_score,
        comparator,
        best: None
    };
    let mut chosen: Vec<usize> = vec![];
    let mut covered: Vec<bool> = vec![false; data.positions().len()];
    search.visit(0, 0, &mut chosen, &mut covered);
    search.best
}

/// Depth-first include/exclude search over the candidate list
struct CombinationSearch<'a> {
    positions: &'a [VariantLocus],
    reference: Option<&'a NamedAllele>,
    sequence: &'a str,
    strand: &'a [String],
    candidates: Vec<&'a NamedAllele>,
    remaining_score: Vec<usize>,
    comparator: &'a dyn AlleleNameComparator,
    best: Option<CombinationMatch>
}

impl<'a> CombinationSearch<'a> {
    fn visit(&mut self, index: usize, score: usize, chosen: &mut Vec<usize>, covered: &mut [bool]) {
        if let Some(best) = self.best.as_ref() {
            // ties are still explored, the lower priorities can break them
            if score + self.remaining_score[index] < best.score() {
                return;
            }
        }

        if index == self.candidates.len() {
            self.evaluate(chosen, covered);
            return;
        }

        let candidate: &'a NamedAllele = self.candidates[index];
        if fits(candidate, covered) {
            set_coverage(candidate, covered, true);
            chosen.push(index);
            self.visit(index + 1, score + candidate.score(), chosen, covered);
            chosen.pop();
            set_coverage(candidate, covered, false);
        }
        self.visit(index + 1, score, chosen, covered);
    }

    fn evaluate(&mut self, chosen: &[usize], covered: &[bool]) {
        // a set that could still take another candidate is never the best one
        let is_maximal = self.candidates.iter().enumerate()
            .all(|(i, candidate)| chosen.contains(&i) || !fits(candidate, covered));
        if !is_maximal {
            return;
        }

        let partials = residual_partials(self.strand, self.positions, self.reference, covered);
        if chosen.is_empty() && partials.is_empty() {
            return;
        }

        let components: Vec<NamedAllele> = chosen.iter().map(|&i| self.candidates[i].clone()).collect();
        let combination = CombinationMatch::new(components, partials, self.sequence, self.comparator);
        let is_better = match self.best.as_ref() {
            Some(best) => combination.priority_cmp(best, self.comparator).is_lt(),
            None => true
        };
        if is_better {
            self.best = Some(combination);
        }
    }
}

/// True if the haplotype defines none of the covered positions
fn fits(haplotype: &NamedAllele, covered: &[bool]) -> bool {
    haplotype.alleles().iter().zip(covered.iter())
        .all(|(symbol, is_covered)| symbol.is_none() || !is_covered)
}

fn set_coverage(haplotype: &NamedAllele, covered: &mut [bool], value: bool) {
    for (symbol, is_covered) in haplotype.alleles().iter().zip(covered.iter_mut()) {
        if symbol.is_some() {
            *is_covered = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matcher::match_data::MatchDataBuilder;
    use crate::matcher::name_comparator::NaturalNameComparator;
    use crate::util::test_util::{build_gene, build_sample, cyp2b6_like_gene, phased, snp, wobble_reference_gene};

    fn strand(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explains_fully() {
        let gene = cyp2b6_like_gene();
        let sample = build_sample(vec![phased(10, "G", "T"), phased(20, "A", "G"), phased(30, "C", "C"), phased(40, "A", "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        let star6 = data.haplotypes().iter().find(|h| h.name() == "*6").unwrap();
        let reference = data.reference_haplotype();
        assert!(explains_fully(star6, &strand(&["T", "G", "C", "A"]), data.positions(), reference));
        assert!(!explains_fully(star6, &strand(&["T", "G", "T", "A"]), data.positions(), reference));
        assert!(!explains_fully(star6, &strand(&["G", "G", "C", "A"]), data.positions(), reference));
    }

    #[test]
    fn test_best_combination() {
        let comparator = NaturalNameComparator::default();
        let gene = cyp2b6_like_gene();
        let sample = build_sample(vec![phased(10, "G", "T"), phased(20, "A", "G"), phased(30, "C", "T"), phased(40, "A", "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();

        // *6 + *7 and *4 + *7 + *9 cover the same positions with the same score, fewer components wins
        let observed = strand(&["T", "G", "T", "A"]);
        let best = find_best_combination(&data, "10:T;20:G;30:T;40:A;", &observed, &comparator).unwrap();
        assert_eq!(best.name(), "*6 + *7");
        assert_eq!(best.score(), 3);
        assert!(best.partials().is_empty());

        // nothing defines 40:G, so it is left as a partial
        let observed = strand(&["T", "G", "C", "G"]);
        let best = find_best_combination(&data, "10:T;20:G;30:C;40:G;", &observed, &comparator).unwrap();
        assert_eq!(best.name(), "*6 + g.40A>G");
        assert_eq!(best.partials().len(), 1);

        // only novel variants
        let observed = strand(&["G", "A", "C", "G"]);
        let best = find_best_combination(&data, "10:G;20:A;30:C;40:G;", &observed, &comparator).unwrap();
        assert_eq!(best.name(), "g.40A>G");
        assert_eq!(best.score(), 0);
        assert!(best.components().is_empty());

        // the reference strand has nothing to explain
        let observed = strand(&["G", "A", "C", "A"]);
        assert!(find_best_combination(&data, "10:G;20:A;30:C;40:A;", &observed, &comparator).is_none());
    }

    #[test]
    fn test_residual_partials() {
        let gene = cyp2b6_like_gene();
        let observed = strand(&["T", "G", "C", "G"]);
        let partials = residual_partials(&observed, gene.positions(), None, &[true, true, false, false]);
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].position(), 40);
        assert_eq!(partials[0].allele(), "G");
    }

    #[test]
    fn test_reference_wobble() {
        let gene = wobble_reference_gene();
        let sample = build_sample(vec![phased(10, "C", "T"), phased(20, "G", "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let reference = data.reference_haplotype();
        let variant = data.haplotypes().iter().find(|h| h.name() == "c.10C>T").unwrap();

        // G is one of the bases of the reference R at 20
        let observed = strand(&["T", "G"]);
        assert!(explains_fully(variant, &observed, data.positions(), reference));
        assert!(residual_partials(&observed, data.positions(), reference, &[true, false]).is_empty());

        // without the reference haplotype, only the literal locus reference counts
        assert!(!explains_fully(variant, &observed, data.positions(), None));
        assert_eq!(residual_partials(&observed, data.positions(), None, &[true, false]).len(), 1);
    }

    #[test]
    fn test_candidate_limit() {
        let comparator = NaturalNameComparator::default();
        let num_variants = MAX_COMBINATION_CANDIDATES + 2;
        let positions: Vec<_> = (1..=num_variants as u64).map(|i| snp(10 * i, "A", "G")).collect();
        let names: Vec<String> = (0..num_variants).map(|i| format!("*{}", i + 2)).collect();

        // a reference plus one single-position allele per position
        let mut alleles: Vec<(&str, Vec<Option<&str>>, bool)> = vec![("*1", vec![Some("A"); num_variants], true)];
        for (i, name) in names.iter().enumerate() {
            let mut symbols: Vec<Option<&str>> = vec![None; num_variants];
            symbols[i] = Some("G");
            alleles.push((name.as_str(), symbols, false));
        }
        let gene = build_gene("GENE", positions.clone(), &alleles);

        let sample = build_sample(positions.iter().map(|l| phased(l.position(), "G", "A")).collect());
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let observed: Vec<String> = vec!["G".to_string(); num_variants];
        let sequence = crate::matcher::pattern::format_sequence(data.positions(), &observed);

        // the candidates past the limit are reported as novel variants instead
        let best = find_best_combination(&data, &sequence, &observed, &comparator).unwrap();
        assert_eq!(best.components().len(), MAX_COMBINATION_CANDIDATES);
        let partial_positions: Vec<u64> = best.partials().iter().map(|p| p.position()).collect();
        assert_eq!(partial_positions, vec![170, 180]);
    }
}
