//! Image reference errors

use oci_distribution::ParseError;
use thiserror::Error;

/// Errors that can occur when parsing or retagging an image reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// The reference string was empty
    #[error("repository name must have at least one component")]
    NameEmpty,

    /// The reference does not match the reference grammar
    #[error("invalid reference format: {0}")]
    InvalidFormat(String),

    /// The repository name contains uppercase characters
    #[error("invalid reference format: repository name must be lowercase: {0}")]
    NameNotLowercase(String),

    /// The fully qualified repository name is too long
    #[error("repository name is too long: {0}")]
    NameTooLong(String),

    /// The tag is not a valid tag
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// The digest is malformed or uses an unsupported algorithm
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// The reference has no tag (untagged or digest-only)
    #[error("reference is not tagged: {0}")]
    NotTagged(String),
}

impl ReferenceError {
    /// Map a parser error for `input` into a reference error
    pub(crate) fn from_parse(input: &str, err: &ParseError) -> Self {
        let input = input.to_string();
        match err {
            ParseError::NameEmpty => Self::NameEmpty,
            ParseError::NameContainsUppercase => Self::NameNotLowercase(input),
            ParseError::NameTooLong => Self::NameTooLong(input),
            ParseError::TagInvalidFormat => Self::InvalidTag(input),
            ParseError::DigestInvalidFormat
            | ParseError::DigestInvalidLength
            | ParseError::DigestUnsupported => Self::InvalidDigest(input),
            _ => Self::InvalidFormat(format!("{input}: {err}")),
        }
    }
}
