//! Error types for the lineage graph engine.
//!
//! This module provides a unified error type [`GraphError`] for all engine
//! operations, along with a convenient [`Result`] type alias.
//!
//! Deadline expiry during a traversal is deliberately *not* an error: the
//! engine returns the results of completed hops and logs at info level. Only
//! hard failures (a backend RPC error, an undecodable edge document, an
//! unsupported filter) surface through [`GraphError`].

use thiserror::Error;

/// Main error type for lineage graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    // Input validation errors
    #[error("Invalid urn: {0}")]
    InvalidUrn(String),

    #[error("Unsupported filter condition, only EQUAL is supported: {0}")]
    InvalidFilterCondition(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // Search backend errors
    #[error("Search query failed: {0}")]
    SearchBackend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GraphError {
    /// Check if the error originated in the search backend, where a caller
    /// may reasonably retry the whole request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::SearchBackend(_))
    }
}

/// Result type alias for lineage graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
