use thiserror;

/// Registration-time errors, surfaced synchronously to the caller.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("handler entry builder is missing required field: {field}")]
    IncompleteBuilder { field: &'static str },
}
