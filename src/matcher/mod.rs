
/// Contains the single-strand and paired match types along with their orderings
pub mod base_match;
/// Contains the per-gene calling policy
pub mod caller;
/// Contains the combination and partial haplotype search
pub mod combinations;
/// Contains the pairing of strand matches into diplotypes
pub mod diplotype_matcher;
/// Contains the engine error types
pub mod errors;
/// Contains single-strand matching in each mode
pub mod haplotype_matcher;
/// Contains the staged per-gene working set
pub mod match_data;
/// Contains the allele name orderings
pub mod name_comparator;
/// Contains the compiled per-position match rules
pub mod pattern;
/// Contains strand sequence enumeration
pub mod permutations;
