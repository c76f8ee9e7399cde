//! Errors surfaced by the `stylemap` front end.

use crate::worker::WorkerError;
use stylemap_core::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing value for `{flag}`.")]
    MissingValue { flag: String },

    #[error("Unknown argument `{0}`. Run `stylemap --help` for usage.")]
    UnknownArgument(String),

    #[error("Missing required argument `{0}`.")]
    MissingArgument(&'static str),

    #[error("Invalid value `{value}` for `{flag}`: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid options file `{path}`: {source}")]
    Options {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("Failed to serialize the result: {0}")]
    Output(#[from] serde_json::Error),
}
