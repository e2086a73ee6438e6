use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitError>;

/// Errors raised by the core, grouped by the layer that produces them.
#[derive(Debug, Error)]
pub enum GitError {
    // Transport.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("advertisement names no HEAD ref")]
    NoHeadRef,

    // Framing.
    #[error("malformed pkt-line frame: {0}")]
    MalformedFrame(String),

    #[error("malformed varint: truncated or oversized")]
    MalformedVarint,

    // Pack.
    #[error("pack is missing the PACK magic")]
    BadMagic,

    #[error("unsupported pack version: {0}")]
    UnsupportedPackVersion(u32),

    #[error("unknown pack object type code: {0}")]
    UnknownObjectType(u8),

    #[error("unsupported pack object type: {0}")]
    UnsupportedObjectType(&'static str),

    #[error("pack header declares {expected} objects but {actual} were parsed")]
    PackCountMismatch { expected: u32, actual: u32 },

    #[error("truncated pack object: {0}")]
    TruncatedObject(String),

    #[error("pack trailer checksum does not match its contents")]
    BadPackChecksum,

    // Delta.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    #[error("delta declares a base of {expected} bytes but the base object has {actual}")]
    DeltaBaseMismatch { expected: usize, actual: usize },

    #[error("delta copy range {offset}+{size} exceeds base of {base_len} bytes")]
    DeltaRange {
        offset: usize,
        size: usize,
        base_len: usize,
    },

    #[error("delta produced {actual} bytes, expected {expected}")]
    DeltaSizeMismatch { expected: usize, actual: usize },

    #[error("unresolvable deltas: {0} entries have no reachable base")]
    UnresolvableDelta(usize),

    // Object store.
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("compression error: {0}")]
    Compression(String),

    // Checkout.
    #[error("object type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}
