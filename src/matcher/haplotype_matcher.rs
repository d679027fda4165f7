use log::trace;
use std::collections::BTreeMap;

use crate::data_types::named_allele::NamedAllele;
use crate::matcher::base_match::{BaseMatch, CombinationMatch, compare_base_matches};
use crate::matcher::combinations::{explains_fully, find_best_combination, residual_partials};
use crate::matcher::errors::MatcherError;
use crate::matcher::match_data::MatchData;
use crate::matcher::name_comparator::AlleleNameComparator;

/// How a strand is compared against the haplotype definitions
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum MatchMode {
    /// Plain pattern matching, undefined positions are wildcards
    Standard,
    /// Pattern matching where undefined positions must carry the reference symbol
    Strict,
    /// Strict matching, with a synthesized combination for strands nothing explains
    Combination
}

/// Single-strand matches for every generated strand sequence
#[derive(Debug, Default)]
pub struct StrandMatches {
    /// Haplotype name to match, merged across strands
    matches: BTreeMap<String, BaseMatch>,
    /// Strand sequence to the names of every haplotype it matched
    by_sequence: BTreeMap<String, Vec<String>>
}

impl StrandMatches {
    fn insert(&mut self, sequence: &str, base_match: BaseMatch) {
        let names = self.by_sequence.entry(sequence.to_string()).or_default();
        if !names.iter().any(|n| n == base_match.name()) {
            names.push(base_match.name().to_string());
        }

        match self.matches.get_mut(base_match.name()) {
            Some(existing) => {
                existing.add_sequence(sequence);
                existing.merge(&base_match);
            },
            None => {
                let mut base_match = base_match;
                base_match.add_sequence(sequence);
                self.matches.insert(base_match.name().to_string(), base_match);
            }
        };
    }

    /// Returns every match for a strand sequence
    pub fn matches_for(&self, sequence: &str) -> Vec<&BaseMatch> {
        self.by_sequence.get(sequence)
            .map(|names| names.iter().filter_map(|n| self.matches.get(n)).collect())
            .unwrap_or_default()
    }

    /// Returns every distinct match in reporting order
    pub fn sorted_matches(&self, comparator: &dyn AlleleNameComparator) -> Vec<&BaseMatch> {
        let mut matches: Vec<&BaseMatch> = self.matches.values().collect();
        matches.sort_by(|a, b| compare_base_matches(a, b, comparator));
        matches
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Matches the strand sequences of one working set against its haplotypes
pub struct HaplotypeMatcher<'a> {
    data: &'a MatchData,
    comparator: &'a dyn AlleleNameComparator
}

impl<'a> HaplotypeMatcher<'a> {
    pub fn new(data: &'a MatchData, comparator: &'a dyn AlleleNameComparator) -> HaplotypeMatcher<'a> {
        HaplotypeMatcher {
            data,
            comparator
        }
    }

    /// Finds the matching haplotypes for every generated strand sequence
    /// # Arguments
    /// * `mode` - the comparison to use
    /// # Errors
    /// * if a synthesized haplotype cannot be aligned to the working positions
    pub fn match_strands(&self, mode: MatchMode) -> Result<StrandMatches, MatcherError> {
        let mut strand_matches = StrandMatches::default();
        let positions = self.data.positions();
        let reference = self.data.reference_haplotype();

        for (sequence, strand) in self.data.permutations() {
            let matched: Vec<&NamedAllele> = match mode {
                MatchMode::Standard => self.candidates()
                    .filter(|h| h.pattern().matches(strand))
                    .collect(),
                MatchMode::Strict | MatchMode::Combination => self.candidates()
                    .filter(|h| explains_fully(h, strand, positions, reference))
                    .collect()
            };

            if matched.is_empty() && mode == MatchMode::Combination {
                if let Some(combination) = find_best_combination(self.data, sequence, strand, self.comparator) {
                    trace!("{}: {sequence} => {} (synthesized)", self.data.gene(), combination.name());
                    strand_matches.insert(sequence, combination.into_base_match(positions)?);
                }
                continue;
            }

            for haplotype in matched.into_iter() {
                trace!("{}: {sequence} => {}", self.data.gene(), haplotype.name());
                strand_matches.insert(sequence, BaseMatch::new(haplotype.clone()));
            }
        }
        Ok(strand_matches)
    }

    /// Builds the per-strand haplotype set used when haplotypes are interpreted additively.
    /// A strand that a definition fully explains contributes those definitions.
    /// Otherwise it contributes every definition it partially matches, plus a novel variant for any non-reference symbol none of them cover.
    /// # Errors
    /// * if a novel variant haplotype cannot be aligned to the working positions
    pub fn haplotype_set(&self) -> Result<Vec<BaseMatch>, MatcherError> {
        let mut strand_matches = StrandMatches::default();
        let positions = self.data.positions();
        let reference = self.data.reference_haplotype();

        for (sequence, strand) in self.data.permutations() {
            let full: Vec<&NamedAllele> = self.candidates()
                .filter(|h| explains_fully(h, strand, positions, reference))
                .collect();
            if !full.is_empty() {
                for haplotype in full.into_iter() {
                    strand_matches.insert(sequence, BaseMatch::new(haplotype.clone()));
                }
                continue;
            }

            let hits: Vec<&NamedAllele> = self.candidates()
                .filter(|h| !h.is_reference() && h.pattern().matches(strand))
                .collect();
            let mut covered: Vec<bool> = vec![false; positions.len()];
            for haplotype in hits.into_iter() {
                for (symbol, is_covered) in haplotype.alleles().iter().zip(covered.iter_mut()) {
                    *is_covered |= symbol.is_some();
                }
                strand_matches.insert(sequence, BaseMatch::new(haplotype.clone()));
            }

            for partial in residual_partials(strand, positions, reference, &covered).into_iter() {
                let novel = CombinationMatch::new(vec![], vec![partial], sequence, self.comparator);
                strand_matches.insert(sequence, novel.into_base_match(positions)?);
            }
        }

        Ok(strand_matches.sorted_matches(self.comparator).into_iter().cloned().collect())
    }

    /// Haplotypes that can be matched on their own.
    /// A zero-score projection defines none of the usable positions, so it would match every strand and is skipped.
    fn candidates(&self) -> impl Iterator<Item = &'a NamedAllele> {
        self.data.haplotypes().iter()
            .filter(|h| h.is_reference() || h.score() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matcher::match_data::MatchDataBuilder;
    use crate::matcher::name_comparator::NaturalNameComparator;
    use crate::util::test_util::{build_sample, cyp2b6_like_gene, dpyd_like_gene, het, hom, phased};

    fn names(matches: &[&BaseMatch]) -> Vec<String> {
        matches.iter().map(|m| m.name().to_string()).collect()
    }

    #[test]
    fn test_standard_matching() {
        let comparator = NaturalNameComparator::default();
        let gene = cyp2b6_like_gene();
        let sample = build_sample(vec![het(10, "G", "T", false), het(20, "A", "G", false), hom(30, "C"), hom(40, "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).assume_reference(true).build().unwrap();
        let matcher = HaplotypeMatcher::new(&data, &comparator);
        let strand_matches = matcher.match_strands(MatchMode::Standard).unwrap();

        assert_eq!(names(&strand_matches.sorted_matches(&comparator)), vec!["*1", "*4", "*6", "*9"]);
        assert_eq!(names(&strand_matches.matches_for("10:T;20:G;30:C;40:A;")), vec!["*6"]);
        assert!(strand_matches.matches_for("10:T;20:G;30:T;40:A;").is_empty());
    }

    #[test]
    fn test_standard_without_backfill() {
        let comparator = NaturalNameComparator::default();
        let gene = cyp2b6_like_gene();
        let sample = build_sample(vec![het(10, "G", "T", false), het(20, "A", "G", false), hom(30, "C"), hom(40, "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).build().unwrap();
        let strand_matches = HaplotypeMatcher::new(&data, &comparator).match_strands(MatchMode::Standard).unwrap();

        // wildcards let the single-variant alleles match the *6 strand as well
        assert_eq!(names(&strand_matches.matches_for("10:T;20:G;30:C;40:A;")), vec!["*4", "*9", "*6"]);
    }

    #[test]
    fn test_combination_matching() {
        let comparator = NaturalNameComparator::default();
        let gene = cyp2b6_like_gene();
        let sample = build_sample(vec![phased(10, "G", "T"), phased(20, "A", "G"), phased(30, "C", "T"), phased(40, "A", "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let strand_matches = HaplotypeMatcher::new(&data, &comparator).match_strands(MatchMode::Combination).unwrap();

        assert_eq!(names(&strand_matches.matches_for("10:G;20:A;30:C;40:A;")), vec!["*1"]);
        let synthesized = strand_matches.matches_for("10:T;20:G;30:T;40:A;");
        assert_eq!(names(&synthesized), vec!["*6 + *7"]);
        assert!(synthesized[0].is_combination());
        assert!(!synthesized[0].is_partial());
        assert_eq!(synthesized[0].score(), 3);

        // strict mode never synthesizes
        let strand_matches = HaplotypeMatcher::new(&data, &comparator).match_strands(MatchMode::Strict).unwrap();
        assert!(strand_matches.matches_for("10:T;20:G;30:T;40:A;").is_empty());
    }

    #[test]
    fn test_haplotype_set() {
        let comparator = NaturalNameComparator::default();
        let gene = dpyd_like_gene();

        // one strand is fully explained, the other needs every definition
        let sample = build_sample(vec![phased(100, "G", "A"), phased(200, "C", "T"), phased(300, "A", "G"), phased(400, "C", "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let haplotypes = HaplotypeMatcher::new(&data, &comparator).haplotype_set().unwrap();
        let found: Vec<&str> = haplotypes.iter().map(|h| h.name()).collect();
        assert_eq!(found, vec!["Reference", "c.62G>A", "c.1129-5923C>G", "c.3067C>A"]);

        // an uncovered variant is reported on its own
        let sample = build_sample(vec![phased(100, "G", "A"), phased(200, "C", "C"), phased(300, "A", "G"), phased(400, "C", "C")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let haplotypes = HaplotypeMatcher::new(&data, &comparator).haplotype_set().unwrap();
        let found: Vec<&str> = haplotypes.iter().map(|h| h.name()).collect();
        assert_eq!(found, vec!["Reference", "c.62G>A", "g.300A>G"]);
        assert!(haplotypes[2].is_partial());
    }

    #[test]
    fn test_zero_score_projection() {
        let comparator = NaturalNameComparator::default();
        let gene = cyp2b6_like_gene();

        // 20 is missing, so *4 defines nothing that is left
        let sample = build_sample(vec![phased(10, "G", "T"), phased(30, "C", "C"), phased(40, "A", "A")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let star4 = data.haplotypes().iter().find(|h| h.name() == "*4").unwrap();
        assert_eq!(star4.score(), 0);

        // its all-wildcard pattern would match the reference strand, but it is never a candidate
        let strand_matches = HaplotypeMatcher::new(&data, &comparator).match_strands(MatchMode::Combination).unwrap();
        assert_eq!(names(&strand_matches.matches_for("10:G;30:C;40:A;")), vec!["*1"]);
        assert_eq!(names(&strand_matches.matches_for("10:T;30:C;40:A;")), vec!["*9", "*6"]);

        let haplotypes = HaplotypeMatcher::new(&data, &comparator).haplotype_set().unwrap();
        let found: Vec<&str> = haplotypes.iter().map(|h| h.name()).collect();
        assert_eq!(found, vec!["*1", "*6", "*9"]);
    }

    #[test]
    fn test_reference_wobble_modes() {
        let comparator = NaturalNameComparator::default();
        let gene = crate::util::test_util::wobble_reference_gene();
        let sample = build_sample(vec![phased(10, "C", "T"), phased(20, "G", "G")]);
        let data = MatchDataBuilder::new(&gene, &sample).find_combinations(true).build().unwrap();
        let matcher = HaplotypeMatcher::new(&data, &comparator);

        // the G at 20 is allowed by the reference R, so nothing novel is reported
        for mode in [MatchMode::Strict, MatchMode::Combination] {
            let strand_matches = matcher.match_strands(mode).unwrap();
            assert_eq!(names(&strand_matches.matches_for("10:C;20:G;")), vec!["Reference"]);
            assert_eq!(names(&strand_matches.matches_for("10:T;20:G;")), vec!["c.10C>T"]);
        }

        let haplotypes = matcher.haplotype_set().unwrap();
        let found: Vec<&str> = haplotypes.iter().map(|h| h.name()).collect();
        assert_eq!(found, vec!["Reference", "c.10C>T"]);
        assert!(haplotypes.iter().all(|h| !h.is_partial()));
    }
}

