
/// Generic functionality for reading/writing serializable object to file
pub mod file_io;
/// Shared fixtures for unit tests
#[cfg(test)]
pub mod test_util;
