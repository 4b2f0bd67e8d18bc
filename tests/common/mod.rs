#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use phpantom_callmap::decode::decode_signature;
use phpantom_callmap::{DeltaTable, PhpVersion, Resolver, SignatureMap, SignatureValue, VersionRegistry};
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; `RUST_LOG=phpantom_callmap=debug`
/// shows fold and cache activity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).expect("failed to read fixture")
}

pub fn v(version: &str) -> PhpVersion {
    PhpVersion::parse(version).expect("valid version")
}

/// Decode a raw signature entry written as JSON.
pub fn sig(json: &str) -> SignatureValue {
    let value: serde_json::Value = serde_json::from_str(json).expect("valid JSON");
    decode_signature("test", &value).expect("valid signature")
}

pub fn base_74() -> SignatureMap {
    SignatureMap::from_json(&fixture("callmap_74_base.json")).expect("valid base table")
}

pub fn delta_80() -> DeltaTable {
    DeltaTable::from_json(v("8.0"), &fixture("callmap_80_delta.json")).expect("valid 8.0 delta")
}

pub fn delta_81() -> DeltaTable {
    DeltaTable::from_json(v("8.1"), &fixture("callmap_81_delta.json")).expect("valid 8.1 delta")
}

/// PHP 7.4 base with the 8.0 and 8.1 deltas on top.
pub fn fixture_registry() -> VersionRegistry {
    VersionRegistry::builder(v("7.4"), base_74())
        .delta(delta_80())
        .delta(delta_81())
        .build()
        .expect("registry versions are ordered")
}

pub fn fixture_resolver() -> Resolver {
    init_tracing();
    Resolver::new(Arc::new(fixture_registry()))
}
