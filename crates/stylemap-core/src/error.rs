//! Error types for the enhancement engine.
//!
//! Only hard failures live here. Soft anomalies (unrecognized stylesheet
//! fragments, unmatched nodes, conflicts) are reported as data on the
//! returned `ParseOutcome` / `EnhancementResult`.

use crate::parser::ParseDiagnostic;

/// Errors that abort a whole `enhance` call.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// The stylesheet scanner failed internally; nothing partial is returned.
    #[error("Stylesheet could not be parsed: {}", summarize(.errors))]
    Stylesheet { errors: Vec<ParseDiagnostic> },
}

/// Errors raised while validating a design document at the input boundary.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The input is not JSON of the expected shape.
    #[error("Invalid design document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A node has an empty `id`.
    #[error("Node `{name}` has an empty id.")]
    EmptyId { name: String },

    /// Two nodes share the same `id`.
    #[error("Duplicate node id `{id}`.")]
    DuplicateId { id: String },

    /// A node was attached under a parent that is not in the tree.
    #[error("Parent of node `{id}` is not in the tree.")]
    UnknownParent { id: String },

    /// A color channel is outside [0, 1] or not finite.
    #[error("Node `{id}` has an invalid color channel value {value}.")]
    InvalidColor { id: String, value: f32 },

    /// A bounding box has a negative or non-finite size.
    #[error("Node `{id}` has an invalid bounding box ({width} × {height}).")]
    InvalidBounds { id: String, width: f32, height: f32 },
}

fn summarize(errors: &[ParseDiagnostic]) -> String {
    match errors {
        [] => "unknown error".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_error_message_names_first_error() {
        let err = EnhanceError::Stylesheet {
            errors: vec![
                ParseDiagnostic::new(3, "scanner stopped"),
                ParseDiagnostic::new(9, "second"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Stylesheet could not be parsed: line 3: scanner stopped (and 1 more)"
        );
    }

    #[test]
    fn duplicate_id_message() {
        let err = DocumentError::DuplicateId { id: "1:2".into() };
        assert_eq!(err.to_string(), "Duplicate node id `1:2`.");
    }
}
