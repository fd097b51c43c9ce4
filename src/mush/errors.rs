use thiserror::Error;

/// Errors that can arise while interacting with the world storage layer.
#[derive(Debug, Error)]
pub enum MushError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Another room already occupies the requested map cell.
    #[error("coordinates ({x}, {y}) already taken by room {occupant}")]
    CoordinatesTaken { x: i64, y: i64, occupant: String },

    /// A write-once attribute was already set when the write arrived.
    #[error("{attribute} already set on {target}")]
    AttributeAlreadySet {
        attribute: &'static str,
        target: String,
    },

    /// Internal error (unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
