use std::io;
use std::path::PathBuf;

use config_mapping::ConfigurationError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the config-map CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to read a declaration or properties file.
    #[error("Failed to load file '{}': {source}", path.display())]
    LoadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The declaration, properties or mapping could not be processed.
    ///
    /// Wraps every library error, including the aggregated report of a failed
    /// mapping build.
    #[error(transparent)]
    Mapping(#[from] ConfigurationError),

    /// Failed to render the resolved mapping.
    #[error("Failed to render output: {0}")]
    Output(String),
}
