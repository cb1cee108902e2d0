use thiserror::Error;

/// Why an input was not turned into a [`VideoReference`](super::VideoReference).
///
/// None of these are fatal: callers fall back to another provider or reject
/// the input as "not a video".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is not a recognizable video reference")]
    NoMatch,

    #[error("pattern `{pattern}` matched but captured no video id")]
    IncompleteMatch { pattern: &'static str },

    #[error("no registered provider accepts this input")]
    NoProvider,
}
