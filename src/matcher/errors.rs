/// Errors that can be produced by the matching engine, these abort the affected gene
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MatcherError {
    #[error("allele {allele} defines {found} positions, but {expected} positions are aligned")]
    AlleleLengthMismatch { allele: String, expected: usize, found: usize },
    #[error("{gene} would generate {permutations} permutations, exceeding the limit of {limit}")]
    PermutationLimitExceeded { gene: String, permutations: u128, limit: usize },
    #[error("{gene} does not define a locus at position {position}")]
    UnknownPosition { gene: String, position: u64 }
}
