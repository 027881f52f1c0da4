//! Error handling for plexus operations.
//!
//! All public APIs return `Result<T, PlexusError>`. Storage faults,
//! malformed queries, and resolution failures are all routed through the
//! same enum so a query caller sees exactly one terminal error per
//! `execute` call.

use std::io;

use thiserror::Error;

use crate::model::Uid;

/// Result type for plexus operations.
pub type Result<T> = std::result::Result<T, PlexusError>;

/// Errors that can occur while storing postings or resolving queries.
#[derive(Debug, Error)]
pub enum PlexusError {
    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored data failed checksum or structural validation.
    ///
    /// Posting lists are framed with crc32 checksums; a mismatch means
    /// the backing store returned bytes that were never written by us.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// Error while encoding a resolved tree for output.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The query tree violates structural invariants.
    ///
    /// The parser collaborator is expected to hand us well-formed trees;
    /// this is the executor's defensive rejection of trees that slipped
    /// through (missing root filter, empty attribute name).
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// The root filter could not be evaluated.
    ///
    /// Distinct from a filter that matches nothing, which is a valid
    /// empty result.
    #[error("filter resolution failed: {0}")]
    FilterResolution(#[source] Box<PlexusError>),

    /// An index lookup failed due to an underlying storage fault.
    ///
    /// "No postings" is an empty successful result, never this error.
    #[error("lookup failed for entity {uid} attribute {attr:?}: {source}")]
    Lookup {
        /// Entity whose posting list was requested.
        uid: Uid,
        /// Attribute that was being resolved.
        attr: String,
        /// Underlying storage fault.
        #[source]
        source: Box<PlexusError>,
    },

    /// A single (entity, attribute) posting list mixes scalar and edge
    /// postings, so the attribute cannot be classified as scalar or
    /// relation. Rejected rather than silently picking one reading.
    #[error("attribute {attr:?} on entity {uid} mixes scalar and edge postings")]
    MixedPostings {
        /// Entity carrying the ambiguous posting list.
        uid: Uid,
        /// Attribute with mixed posting tags.
        attr: String,
    },

    /// Invalid configuration or argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
