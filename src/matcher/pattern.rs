use itertools::Itertools;

use crate::data_types::iupac::wobble_bases;
use crate::data_types::variant_locus::VariantLocus;

/// Formats one strand reconstruction as "position:symbol;" tokens in position order.
/// # Arguments
/// * `positions` - the ordered positions the symbols are aligned to
/// * `symbols` - the symbols on the strand, one per position
pub fn format_sequence<S: AsRef<str>>(positions: &[VariantLocus], symbols: &[S]) -> String {
    positions.iter().zip(symbols.iter())
        .map(|(locus, symbol)| format!("{}:{};", locus.position(), symbol.as_ref()))
        .join("")
}

/// A single positional rule in a compiled pattern
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PositionRule {
    /// The observed symbol must equal this one
    Exact(String),
    /// The observed symbol must be one of these bases, compiled from an IUPAC wobble code
    Wobble(&'static str),
    /// Anything goes, including the position being absent
    Wildcard
}

impl PositionRule {
    /// Compiles a definition symbol into a rule
    pub fn from_symbol(symbol: Option<&str>) -> PositionRule {
        match symbol {
            None => PositionRule::Wildcard,
            Some(s) => match wobble_bases(s) {
                Some(bases) => PositionRule::Wobble(bases),
                None => PositionRule::Exact(s.to_string())
            }
        }
    }

    /// Returns true if the observed symbol satisfies this rule
    pub fn matches(&self, observed: &str) -> bool {
        match self {
            PositionRule::Exact(symbol) => symbol == observed,
            PositionRule::Wobble(bases) => {
                observed.len() == 1 && bases.contains(observed)
            },
            PositionRule::Wildcard => true
        }
    }
}

/// Compiled per-position match rules for a single haplotype definition.
/// Rules are positional comparisons, there is no pattern engine underneath.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllelePattern {
    /// (position, rule) in ascending position order
    rules: Vec<(u64, PositionRule)>
}

impl AllelePattern {
    /// Compiles a symbol tuple against the positions it is aligned to.
    /// # Arguments
    /// * `symbols` - the definition symbols, None is a wildcard
    /// * `positions` - the aligned positions, must be the same length as `symbols`
    pub fn compile(symbols: &[Option<String>], positions: &[VariantLocus]) -> AllelePattern {
        let rules = positions.iter().zip(symbols.iter())
            .map(|(locus, symbol)| (locus.position(), PositionRule::from_symbol(symbol.as_deref())))
            .collect();
        AllelePattern { rules }
    }

    /// Checks an already decomposed strand, which must be aligned 1:1 with the compiled positions
    /// # Arguments
    /// * `strand` - one observed symbol per position
    pub fn matches(&self, strand: &[String]) -> bool {
        strand.len() == self.rules.len() &&
            self.rules.iter().zip(strand.iter())
                .all(|((_, rule), observed)| rule.matches(observed))
    }

    pub fn rules(&self) -> &[(u64, PositionRule)] {
        &self.rules
    }
}
