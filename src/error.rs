//! Error taxonomy for call-map loading and resolution.
//!
//! Load-time problems (`DecodeError`, `DataIntegrityError`) are caught
//! while a table is being built so bad data never reaches the resolver.
//! Resolution itself can only fail with [`InvalidVersion`].  Drift between
//! a delta's recorded prior state and the folded state is not an error at
//! all: it is reported as a [`DriftWarning`] and resolution carries on.

use std::fmt;
use std::path::PathBuf;

use crate::symbol::SymbolId;
use crate::types::SignatureValue;
use crate::version::PhpVersion;

/// A requested version string that cannot be parsed or compared against
/// the registry's ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid PHP version `{input}`: {reason}")]
pub struct InvalidVersion {
    pub input: String,
    pub reason: &'static str,
}

/// Which of a delta table's three sections a symbol was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaSection {
    Added,
    Changed,
    Removed,
}

impl fmt::Display for DeltaSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeltaSection::Added => "added",
            DeltaSection::Changed => "changed",
            DeltaSection::Removed => "removed",
        })
    }
}

/// A symbol listed in more than one section of the same delta table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delta for PHP {version}: `{symbol}` appears in both `{first}` and `{second}`")]
pub struct DataIntegrityError {
    pub version: PhpVersion,
    pub symbol: SymbolId,
    pub first: DeltaSection,
    pub second: DeltaSection,
}

/// The raw table could not be turned into typed signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("expected {expected} at `{path}`")]
    UnexpectedShape { path: String, expected: &'static str },

    #[error("invalid symbol key `{0}`")]
    InvalidSymbol(String),

    #[error("invalid parameter key `{key}` in `{symbol}`")]
    InvalidParameter { symbol: String, key: String },

    #[error("duplicate parameter `{name}` in `{symbol}`")]
    DuplicateParameter { symbol: String, name: String },

    #[error("`{symbol}` is listed twice in the same table")]
    DuplicateSymbol { symbol: String },
}

/// Anything that can go wrong turning a raw delta table into a
/// [`DeltaTable`](crate::delta::DeltaTable).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

/// Registry construction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("delta for PHP {version} is registered more than once")]
    Duplicate { version: PhpVersion },

    #[error("delta for PHP {version} must come after PHP {previous}")]
    OutOfOrder {
        version: PhpVersion,
        previous: PhpVersion,
    },
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Version(#[from] InvalidVersion),
}

/// A mismatch between what a delta expected the prior state to be and what
/// the fold actually produced.  The delta's own data always wins; the
/// warning only annotates the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftWarning {
    /// An `added` symbol already existed before this version.
    AlreadyPresent {
        version: PhpVersion,
        symbol: SymbolId,
        existing: SignatureValue,
    },
    /// A `changed` entry's `old` signature differs from the folded one
    /// (`found` is `None` when the symbol did not exist at all).
    ChangedMismatch {
        version: PhpVersion,
        symbol: SymbolId,
        expected: SignatureValue,
        found: Option<SignatureValue>,
    },
    /// A `removed` symbol was not present before this version.
    RemovedMissing { version: PhpVersion, symbol: SymbolId },
    /// A `removed` symbol was present but with a different signature.
    RemovedMismatch {
        version: PhpVersion,
        symbol: SymbolId,
        expected: SignatureValue,
        found: SignatureValue,
    },
}

impl DriftWarning {
    pub fn version(&self) -> PhpVersion {
        match self {
            DriftWarning::AlreadyPresent { version, .. }
            | DriftWarning::ChangedMismatch { version, .. }
            | DriftWarning::RemovedMissing { version, .. }
            | DriftWarning::RemovedMismatch { version, .. } => *version,
        }
    }

    pub fn symbol(&self) -> &SymbolId {
        match self {
            DriftWarning::AlreadyPresent { symbol, .. }
            | DriftWarning::ChangedMismatch { symbol, .. }
            | DriftWarning::RemovedMissing { symbol, .. }
            | DriftWarning::RemovedMismatch { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for DriftWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftWarning::AlreadyPresent {
                version,
                symbol,
                existing,
            } => write!(
                f,
                "PHP {version}: `{symbol}` is added but already existed as `{}`",
                existing.label(&symbol.to_string())
            ),
            DriftWarning::ChangedMismatch {
                version,
                symbol,
                expected,
                found: Some(found),
            } => write!(
                f,
                "PHP {version}: `{symbol}` expected `{}` before change, found `{}`",
                expected.label(&symbol.to_string()),
                found.label(&symbol.to_string())
            ),
            DriftWarning::ChangedMismatch {
                version,
                symbol,
                found: None,
                ..
            } => write!(f, "PHP {version}: `{symbol}` is changed but did not exist"),
            DriftWarning::RemovedMissing { version, symbol } => {
                write!(f, "PHP {version}: `{symbol}` is removed but did not exist")
            }
            DriftWarning::RemovedMismatch {
                version,
                symbol,
                expected,
                found,
            } => write!(
                f,
                "PHP {version}: `{symbol}` removed as `{}` but was `{}`",
                expected.label(&symbol.to_string()),
                found.label(&symbol.to_string())
            ),
        }
    }
}
