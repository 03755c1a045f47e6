//! Error types for tagfuse
//!
//! Each failure domain carries its own enum so callers can contain failures
//! at the right level: a bad taggram skips one model, a dead tag source
//! disables one pipeline, and neither takes down the other.

use thiserror::Error;

/// Common result type for tagfuse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Taggram reduction error
    #[error("Reduction error: {0}")]
    Reduction(#[from] ReductionError),

    /// Model inference error
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Community tag source error
    #[error("Tag source error: {0}")]
    TagSource(#[from] TagSourceError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Taggram reduction errors
///
/// Local to one model's output. The ensemble combiner treats any of these
/// as "model produced no usable signal" and skips the model.
#[derive(Debug, Error)]
pub enum ReductionError {
    /// Taggram contains no frames
    #[error("taggram has no frames")]
    EmptyTaggram,

    /// Taggram has no tag columns
    #[error("taggram has no tag columns")]
    NoTags,

    /// A frame row does not match the tag index width
    #[error("frame {frame} has {got} values, expected {expected}")]
    RaggedFrame {
        frame: usize,
        got: usize,
        expected: usize,
    },

    /// A likelihood cell is NaN or infinite
    #[error("non-finite likelihood at frame {frame}, column {column}")]
    NonFinite { frame: usize, column: usize },
}

/// Model inference errors reported by a `ModelInference` backend
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Model weights or runtime not available on this host
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Inference ran but failed to produce a taggram
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Community tag source errors
///
/// Transport or parse failures on a community query. Never retried here;
/// the caller treats this as "no community suggestions available".
#[derive(Debug, Error)]
pub enum TagSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Suggestion contract violations
///
/// Returned by [`SuggestionResult::verify_contract`](crate::types::SuggestionResult::verify_contract).
#[derive(Debug, Error, PartialEq)]
pub enum ContractViolation {
    #[error("result has {got} entries, cap is {cap}")]
    OverCap { got: usize, cap: usize },

    #[error("weight {weight} for '{tag}' is below the minimum {min}")]
    BelowThreshold {
        tag: String,
        weight: f32,
        min: f32,
    },

    #[error("weights are not non-increasing at '{tag}'")]
    OutOfOrder { tag: String },

    #[error("duplicate tag '{tag}'")]
    DuplicateTag { tag: String },
}
