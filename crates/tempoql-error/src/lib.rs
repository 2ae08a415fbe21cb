//! Shared error type for the TempoQL workspace.
//!
//! One enum covers the build-time failures of the AST factory and the
//! boundary-contract failures of the metadata store, catalog, and data sink.
//! Traversal-time signals are deliberately *not* errors; they travel through
//! the three-valued visit outcome in `tempoql-nodes`.

use thiserror::Error;

/// Workspace-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TempoError {
    /// An identifier exceeded its configured byte limit.
    #[error("{what} too long: {len} bytes, limit is {max}")]
    IdentifierTooLong {
        /// Which identifier class was violated ("database name", ...).
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// A literal token could not be parsed as its claimed type.
    #[error("invalid {what} literal: {text:?}")]
    InvalidLiteral { what: &'static str, text: String },

    /// A statement build produced no root node and no recorded failure.
    #[error("statement build produced no root node")]
    EmptyBuild,

    /// A binary metadata encoding failed validation during decode.
    #[error("corrupt encoding: {detail}")]
    CorruptEncoding { detail: String },

    /// Catalog lookup failed: no such database.
    #[error("database not found: {db}")]
    DatabaseNotFound { db: String },

    /// Catalog lookup failed: no such table.
    #[error("table not found: {db}.{table}")]
    TableNotFound { db: String, table: String },

    /// Rollup store lookup failed: no such index.
    #[error("rollup index not found: {name}")]
    IndexNotFound { name: String },

    /// A data sink refused a block because it is at capacity.
    #[error("data sink at capacity: {held} blocks held, limit is {limit}")]
    SinkAtCapacity { held: usize, limit: usize },

    /// Invariant violation that indicates a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TempoError {
    /// Convenience constructor for [`TempoError::Internal`].
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }
}

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, TempoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TempoError::IdentifierTooLong {
            what: "table name",
            len: 200,
            max: 193,
        };
        assert_eq!(err.to_string(), "table name too long: 200 bytes, limit is 193");

        let err = TempoError::TableNotFound {
            db: "power".to_owned(),
            table: "meters".to_owned(),
        };
        assert!(err.to_string().contains("power.meters"));

        let err = TempoError::internal("walked off the end");
        assert!(err.to_string().starts_with("internal error"));
    }
}
