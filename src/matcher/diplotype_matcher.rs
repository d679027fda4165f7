use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::matcher::base_match::{DiplotypeMatch, compare_base_matches, compare_diplotypes};
use crate::matcher::errors::MatcherError;
use crate::matcher::haplotype_matcher::{HaplotypeMatcher, MatchMode, StrandMatches};
use crate::matcher::match_data::MatchData;
use crate::matcher::name_comparator::AlleleNameComparator;

/// Pairs single-strand matches into diplotypes that reconstruct the sample genotype
pub struct DiplotypeMatcher<'a> {
    data: &'a MatchData,
    comparator: &'a dyn AlleleNameComparator
}

impl<'a> DiplotypeMatcher<'a> {
    pub fn new(data: &'a MatchData, comparator: &'a dyn AlleleNameComparator) -> DiplotypeMatcher<'a> {
        DiplotypeMatcher {
            data,
            comparator
        }
    }

    /// Matches every strand and pairs the results
    /// # Arguments
    /// * `mode` - how strands are matched
    /// * `top_candidate_only` - if true, only the top-scoring diplotypes are returned
    /// # Errors
    /// * if strand matching fails
    pub fn compute(&self, mode: MatchMode, top_candidate_only: bool) -> Result<Vec<DiplotypeMatch>, MatcherError> {
        let strand_matches = HaplotypeMatcher::new(self.data, self.comparator).match_strands(mode)?;
        let diplotypes = self.pair(&strand_matches, top_candidate_only);
        debug!("{}: {} diplotype(s) from {mode} matching", self.data.gene(), diplotypes.len());
        Ok(diplotypes)
    }

    /// Pairs each strand sequence with its complement.
    /// A pair of haplotypes is a candidate if one matches a strand and the other matches the complement, the same haplotype may pair with itself.
    /// # Arguments
    /// * `strand_matches` - the single-strand matches
    /// * `top_candidate_only` - if true, only the top-scoring diplotypes are returned
    pub fn pair(&self, strand_matches: &StrandMatches, top_candidate_only: bool) -> Vec<DiplotypeMatch> {
        let mut diplotypes: BTreeMap<String, DiplotypeMatch> = Default::default();
        for (sequence, _strand) in self.data.permutations() {
            let complement = match self.data.complement(sequence) {
                Some(c) => c,
                None => continue
            };

            for m1 in strand_matches.matches_for(sequence).into_iter() {
                for m2 in strand_matches.matches_for(&complement).into_iter() {
                    let (first, second, first_sequence, second_sequence) = if compare_base_matches(m1, m2, self.comparator) == Ordering::Greater {
                        (m2, m1, complement.as_str(), sequence)
                    } else {
                        (m1, m2, sequence, complement.as_str())
                    };

                    let name = format!("{}/{}", first.name(), second.name());
                    trace!("{}: {first_sequence} + {second_sequence} => {name}", self.data.gene());
                    diplotypes.entry(name)
                        .or_insert_with(|| DiplotypeMatch::new(first.clone(), second.clone(), self.comparator))
                        .add_sequence_pair(first.name(), first_sequence, second_sequence);
                }
            }
        }

        let mut diplotypes: Vec<DiplotypeMatch> = diplotypes.into_values().collect();
        diplotypes.sort_by(|a, b| compare_diplotypes(a, b, self.comparator));
        if top_candidate_only {
            if let Some(top_score) = diplotypes.first().map(|d| d.score()) {
                diplotypes.retain(|d| d.score() == top_score);
            }
        }
        diplotypes
    }
}
