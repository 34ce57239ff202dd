use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Graft's outer layers (manifest, config, operations).
///
/// The resolution engine has its own typed error; it converts into a report
/// through `miette` like this one.
#[derive(Debug, Error, Diagnostic)]
pub enum GraftError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. Graft.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Graft.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid resolution configuration file.
    #[error("Config error: {message}")]
    #[diagnostic(help("See the [resolution] keys accepted by the config file"))]
    Config { message: String },

    /// Dependency resolution could not produce a graph.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type GraftResult<T> = miette::Result<T>;
