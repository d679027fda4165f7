
/// the main CLI module
pub mod core;
/// The db-stat CLI subcommand for summarizing a definition database
pub mod db_stat;
/// the match CLI subcommand for calling the diplotypes
pub mod matcher;
