//! Version-aware resolution of PHP built-in function and method signatures.
//!
//! Built-in signatures change between PHP releases: functions are added
//! (`str_contains` in 8.0), parameters are renamed (`acos($number)` became
//! `acos($num)`), and functions disappear (`each` in 8.0).  Call maps record
//! this as one full base table for the oldest supported version plus one
//! delta per later version.  This crate folds those deltas into the
//! effective signature map for any target version and caches the result.
//!
//! ```no_run
//! use std::sync::Arc;
//! use phpantom_callmap::{DeltaTable, PhpVersion, Resolver, SignatureMap, VersionRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base = SignatureMap::from_json(r#"{"each": {"0": "array", "&r_arr": "array"}}"#)?;
//! let php80 = PhpVersion::parse("8.0")?;
//! let delta = DeltaTable::from_json(php80, r#"{"removed": {"each": {"0": "array", "&r_arr": "array"}}}"#)?;
//!
//! let registry = VersionRegistry::builder(PhpVersion::parse("7.4")?, base)
//!     .delta(delta)
//!     .build()?;
//! let resolver = Resolver::new(Arc::new(registry));
//!
//! assert!(resolver.resolve("7.4")?.contains("each"));
//! assert!(!resolver.resolve("8.0")?.contains("each"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod decode;
pub mod delta;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod signature_map;
pub mod symbol;
pub mod types;
pub mod version;

pub use cache::Cache;
pub use config::Config;
pub use delta::{Change, DeltaTable};
pub use error::{
    ConfigError, DataIntegrityError, DecodeError, DeltaSection, DriftWarning, InvalidVersion,
    LoadError, RegistryError,
};
pub use registry::{RegistryBuilder, VersionRegistry};
pub use resolver::{Resolution, Resolver};
pub use signature_map::SignatureMap;
pub use symbol::SymbolId;
pub use types::{ParamSlot, RefAccess, SignatureValue, TypeToken};
pub use version::PhpVersion;
