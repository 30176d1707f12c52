use thiserror::Error;

/// Errors raised by the form models.
///
/// All of them are data-contract violations: the payload handed to a model
/// did not have the shape the model requires, or a path did not lead where
/// the caller expected. None of them are transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("expected an object for `{0}`")]
    NotObject(String),
    #[error("attribute `{0}` is not a sequence")]
    NotSequence(String),
    #[error("region `{0}` has `fields` that are not a sequence")]
    MalformedRegion(String),
    #[error("field without a string identifier")]
    MissingIdentifier,
    #[error("attribute `{0}` is not defined on this node")]
    UnknownAttribute(String),
    #[error("path step `{0}` not found")]
    PathNotFound(String),
    #[error("no handler registered for `{0}` steps")]
    UnsupportedStep(String),
    #[error("restoring `{0}` would orphan locally authored models")]
    RestoreNotPermitted(String),
}
