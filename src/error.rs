//! Errors raised while reading documents and patterns.
//!
//! Mismatches found by the matching engine are not errors; they are reported
//! through [`crate::MatchOutcome`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Top-level error type returned by the parsing and validation APIs.
pub enum Error {
    /// Malformed document or pattern text.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The same key appears twice in one object of a document.
    #[error("Duplicated key '{key}' in the object {path}")]
    DuplicateKey { key: String, path: String },
    /// Two pair matches of one object match name the same key (or are both
    /// wildcards), including a key declared both required and optional.
    #[error("Duplicated key '{key}' in the object {path}")]
    DuplicateOrConflictingKey { key: String, path: String },
    /// A negated key whose value match is not a wildcard.
    #[error("negated key {key} must be paired with a wildcard value at {path}")]
    IllegalNegation { key: String, path: String },
    /// A wildcard entry that is not the last entry of its array match.
    #[error("wildcard entry must be the last entry of the array at {path}")]
    MisplacedWildcard { path: String },
    /// A regex literal the regex engine refuses to compile.
    #[error("invalid regex /{pattern}/ at {path}: {reason}")]
    InvalidRegex {
        pattern: String,
        path: String,
        reason: String,
    },
}

impl Error {
    /// The `$`-rooted path of the offending node, when the error has one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Syntax(_) => None,
            Self::DuplicateKey { path, .. }
            | Self::DuplicateOrConflictingKey { path, .. }
            | Self::IllegalNegation { path, .. }
            | Self::MisplacedWildcard { path }
            | Self::InvalidRegex { path, .. } => Some(path),
        }
    }
}

impl From<pest::error::Error<crate::parser::Rule>> for Error {
    fn from(err: pest::error::Error<crate::parser::Rule>) -> Self {
        Self::Syntax(err.to_string())
    }
}
