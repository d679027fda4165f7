
/// Contains all the CLI related functionality
pub mod cli;
/// Contains any specialized data types that are shared across the tooling
pub mod data_types;
/// Contains functionality for displaying database statistics
pub mod db_stat;
/// Contains the functionality for calling every gene for a sample
pub mod diplotyper;
/// Contains the haplotype and diplotype matching engine
pub mod matcher;
/// Contains generic utilities that are handy wrappers
pub mod util;
