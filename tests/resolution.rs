mod common;

use std::sync::Arc;

use common::{fixture_registry, fixture_resolver, init_tracing, sig, v};
use phpantom_callmap::{
    Config, DeltaTable, DriftWarning, ParamSlot, RefAccess, Resolver, SignatureMap,
    SignatureValue, SymbolId, VersionRegistry,
};

// ─── Known PHP 8.0 transitions ──────────────────────────────────────────────

#[test]
fn test_str_contains_is_added_in_80() {
    let resolver = fixture_resolver();

    let expected = SignatureValue::new(
        "bool",
        vec![
            ParamSlot::new("haystack", "string"),
            ParamSlot::new("needle", "string"),
        ],
    );
    assert_eq!(resolver.lookup("8.0", "str_contains").unwrap(), Some(expected));
    assert_eq!(resolver.lookup("7.4", "str_contains").unwrap(), None);
}

#[test]
fn test_acos_parameter_rename() {
    let resolver = fixture_resolver();

    let old = SignatureValue::new("float", vec![ParamSlot::new("number", "float")]);
    let new = SignatureValue::new("float", vec![ParamSlot::new("num", "float")]);

    assert_eq!(resolver.lookup("7.4", "acos").unwrap(), Some(old));
    assert_eq!(resolver.lookup("8.0", "acos").unwrap(), Some(new));
}

#[test]
fn test_each_is_removed_in_80() {
    let resolver = fixture_resolver();

    let documented = SignatureValue::new(
        "array",
        vec![ParamSlot::new("arr", "array").by_reference(Some(RefAccess::Read))],
    );
    assert_eq!(resolver.lookup("7.4", "each").unwrap(), Some(documented));
    assert_eq!(resolver.lookup("8.0", "each").unwrap(), None);
    assert_eq!(resolver.lookup("8.1", "each").unwrap(), None);
}

#[test]
fn test_lookup_is_case_insensitive() {
    let resolver = fixture_resolver();
    let map = resolver.resolve("8.0").unwrap();

    assert_eq!(map.lookup("Str_Contains"), map.lookup("str_contains"));
    assert!(map.lookup("STR_CONTAINS").is_some());
    assert_eq!(
        map.lookup("ArrayObject::__construct"),
        map.lookup("arrayobject::__construct")
    );
    assert!(map.contains("Stringable::__toString"));
}

#[test]
fn test_overloads_resolve_independently() {
    let resolver = fixture_resolver();
    let php74 = resolver.resolve("7.4").unwrap();
    let php80 = resolver.resolve("8.0").unwrap();

    assert_eq!(
        php80.lookup("count_chars"),
        Some(&sig(r#"{"0": "array<int,int>", "string": "string", "mode=": "0|1|2"}"#))
    );
    assert_eq!(
        php80.lookup("count_chars'1"),
        Some(&sig(r#"{"0": "string", "string": "string", "mode=": "3|4"}"#))
    );

    let overloads: Vec<String> = php80
        .overloads("count_chars")
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();
    assert_eq!(overloads, vec!["count_chars", "count_chars'1"]);

    // Changing only the overload must leave the primary alone.
    let registry = VersionRegistry::builder(v("8.0"), SignatureMap::clone(&php80))
        .delta(
            DeltaTable::from_json(
                v("8.1"),
                r#"{"changed": {"count_chars'1": {
                    "old": {"0": "string", "string": "string", "mode=": "3|4"},
                    "new": {"0": "non-empty-string", "string": "string", "mode=": "3|4"}
                }}}"#,
            )
            .unwrap(),
        )
        .build()
        .unwrap();
    let resolver = Resolver::new(Arc::new(registry));
    let php81 = resolver.resolve("8.1").unwrap();
    assert_eq!(php81.lookup("count_chars"), php80.lookup("count_chars"));
    assert_ne!(php81.lookup("count_chars'1"), php80.lookup("count_chars'1"));
    assert_ne!(php74.lookup("count_chars"), php80.lookup("count_chars"));
}

#[test]
fn test_methods_of_class() {
    let resolver = fixture_resolver();
    let map = resolver.resolve("8.0").unwrap();

    let methods = map.methods_of("\\ArrayObject");
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].0, SymbolId::method("arrayobject", "__construct"));
    let names: Vec<&str> = methods[0]
        .1
        .parameters()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["array", "flags", "iteratorClass"]);
}

#[test]
fn test_fixture_fold_has_no_drift() {
    let resolver = fixture_resolver();
    let resolution = resolver.resolve_with_report(v("8.1"));

    assert_eq!(resolution.requested, v("8.1"));
    assert_eq!(resolution.version, v("8.1"));
    assert!(resolution.warnings.is_empty(), "{:?}", resolution.warnings);
    assert!(resolution.map.contains("array_is_list"));
}

// ─── Version handling ───────────────────────────────────────────────────────

#[test]
fn test_versions_between_registry_entries_share_a_map() {
    let resolver = fixture_resolver();
    let exact = resolver.resolve("8.0").unwrap();
    let patch = resolver.resolve("8.0.30").unwrap();

    assert!(Arc::ptr_eq(&exact, &patch));
    assert!(!patch.contains("array_is_list"));
}

#[test]
fn test_version_older_than_base_uses_base() {
    let resolver = fixture_resolver();
    let ancient = resolver.resolve("5.6").unwrap();

    assert_eq!(*ancient, *resolver.registry().base());
    assert!(ancient.contains("each"));
}

#[test]
fn test_version_newer_than_registry_uses_latest() {
    let resolver = fixture_resolver();
    assert_eq!(
        *resolver.resolve("8.4").unwrap(),
        *resolver.resolve("8.1").unwrap()
    );
}

#[test]
fn test_invalid_version_is_a_typed_error() {
    let resolver = fixture_resolver();

    let err = resolver.resolve("eight").unwrap_err();
    assert_eq!(err.input, "eight");
    assert!(resolver.lookup("8.x", "acos").is_err());
    assert!(resolver.diff("7.4", "").is_err());
}

/// Unknown symbols are `Ok(None)`, not errors, so callers can tell "no such
/// version" from "no such symbol".
#[test]
fn test_unknown_symbol_is_not_an_error() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.lookup("8.0", "no_such_function").unwrap(), None);
    assert_eq!(resolver.lookup("8.0", "not a symbol").unwrap(), None);
}

// ─── Fold properties ────────────────────────────────────────────────────────

#[test]
fn test_resolve_is_deterministic() {
    let first = fixture_resolver().resolve("8.1").unwrap();
    let second = fixture_resolver().resolve("8.1").unwrap();
    assert_eq!(*first, *second);
}

#[test]
fn test_fold_is_monotonic() {
    let resolver = fixture_resolver();
    let php80 = resolver.resolve("8.0").unwrap();
    let php81 = resolver.resolve("8.1").unwrap();

    let delta = resolver.registry().delta(v("8.1")).unwrap();
    assert_eq!(*php81, delta.apply(&php80));
}

/// Folding from a cached intermediate gives the same map as folding from
/// the base.
#[test]
fn test_fold_from_cached_intermediate_matches_full_fold() {
    let warm = fixture_resolver();
    let _ = warm.resolve("8.0").unwrap();
    let via_cache = warm.resolve("8.1").unwrap();

    let cold = fixture_resolver();
    let direct = cold.resolve("8.1").unwrap();

    assert_eq!(*via_cache, *direct);
}

/// A symbol added in one version and changed in a later one goes through
/// both transformations in order.
#[test]
fn test_added_then_changed_then_removed() {
    init_tracing();
    let x = r#"{"0": "int", "a": "int"}"#;
    let y = r#"{"0": "int", "a": "int", "b=": "bool"}"#;

    let registry = VersionRegistry::builder(v("7.0"), SignatureMap::new())
        .delta(
            DeltaTable::from_json(v("7.1"), &format!(r#"{{"added": {{"widget": {}}}}}"#, x))
                .unwrap(),
        )
        .delta(
            DeltaTable::from_json(
                v("7.3"),
                &format!(r#"{{"changed": {{"widget": {{"old": {}, "new": {}}}}}}}"#, x, y),
            )
            .unwrap(),
        )
        .delta(
            DeltaTable::from_json(v("8.0"), &format!(r#"{{"removed": {{"widget": {}}}}}"#, y))
                .unwrap(),
        )
        .build()
        .unwrap();
    let resolver = Resolver::new(Arc::new(registry));

    assert_eq!(resolver.lookup("7.0", "widget").unwrap(), None);
    assert_eq!(resolver.lookup("7.1", "widget").unwrap(), Some(sig(x)));
    assert_eq!(resolver.lookup("7.2", "widget").unwrap(), Some(sig(x)));
    assert_eq!(resolver.lookup("7.3", "widget").unwrap(), Some(sig(y)));
    assert_eq!(resolver.lookup("7.4", "widget").unwrap(), Some(sig(y)));
    assert_eq!(resolver.lookup("8.0", "widget").unwrap(), None);

    assert!(resolver.resolve_with_report(v("8.0")).warnings.is_empty());
}

#[test]
fn test_drift_is_reported_but_does_not_stop_resolution() {
    let base: SignatureMap = [(SymbolId::function("foo"), sig(r#"{"0": "int"}"#))]
        .into_iter()
        .collect();
    let registry = VersionRegistry::builder(v("7.4"), base)
        .delta(
            DeltaTable::from_json(
                v("8.0"),
                r#"{"changed": {"foo": {"old": {"0": "string"}, "new": {"0": "bool"}}}}"#,
            )
            .unwrap(),
        )
        .build()
        .unwrap();
    let resolver = Resolver::new(Arc::new(registry));

    let resolution = resolver.resolve_with_report(v("8.0"));
    assert_eq!(resolution.map.lookup("foo"), Some(&sig(r#"{"0": "bool"}"#)));
    assert!(matches!(
        &resolution.warnings[..],
        [DriftWarning::ChangedMismatch { .. }]
    ));
    assert_eq!(resolution.warnings[0].version(), v("8.0"));
    assert_eq!(*resolution.warnings[0].symbol(), SymbolId::function("foo"));

    // The plain path resolves to the same map.
    assert_eq!(*resolver.resolve("8.0").unwrap(), *resolution.map);
}

// ─── Diff ───────────────────────────────────────────────────────────────────

#[test]
fn test_diff_between_adjacent_versions_is_the_delta() {
    let resolver = fixture_resolver();
    let diff = resolver.diff("7.4", "8.0").unwrap();
    assert_eq!(&diff, resolver.registry().delta(v("8.0")).unwrap());
}

#[test]
fn test_diff_backwards_is_the_inverse() {
    let resolver = fixture_resolver();
    let backwards = resolver.diff("8.0", "7.4").unwrap();
    let inverse = resolver.registry().delta(v("8.0")).unwrap().invert();

    assert_eq!(backwards.added(), inverse.added());
    assert_eq!(backwards.changed(), inverse.changed());
    assert_eq!(backwards.removed(), inverse.removed());
}

#[test]
fn test_diff_across_several_versions() {
    let resolver = fixture_resolver();
    let diff = resolver.diff("7.4", "8.1").unwrap();

    assert_eq!(diff.version(), v("8.1"));
    assert!(diff.added().contains_key(&SymbolId::function("str_contains")));
    assert!(diff.added().contains_key(&SymbolId::function("array_is_list")));
    assert!(diff.removed().contains_key(&SymbolId::function("each")));
    assert!(resolver.diff("8.1", "8.1").unwrap().is_empty());
}

// ─── Configuration and cache interplay ──────────────────────────────────────

#[test]
fn test_default_version_from_config() {
    let config = Config::from_toml_str("[php]\nversion = \"8.0\"\n").unwrap();
    let resolver = Resolver::with_config(Arc::new(fixture_registry()), &config).unwrap();

    assert_eq!(resolver.default_version(), v("8.0"));
    let map = resolver.resolve_default();
    assert!(map.contains("str_contains"));
    assert!(!map.contains("array_is_list"));
}

#[test]
fn test_default_version_falls_back_to_latest() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.default_version(), v("8.1"));
    assert!(resolver.resolve_default().contains("array_is_list"));
}

#[test]
fn test_bounded_cache_still_resolves_correctly() {
    let config = Config::from_toml_str("[cache]\ncapacity = 1\n").unwrap();
    let resolver = Resolver::with_config(Arc::new(fixture_registry()), &config).unwrap();
    let unbounded = fixture_resolver();

    for version in ["7.4", "8.1", "8.0", "7.4", "8.1"] {
        assert_eq!(
            *resolver.resolve(version).unwrap(),
            *unbounded.resolve(version).unwrap(),
            "mismatch at {}",
            version
        );
        assert_eq!(resolver.cache().len(), 1);
    }
}

#[test]
fn test_invalidate_clears_cached_maps() {
    let resolver = fixture_resolver();
    let before = resolver.resolve("8.0").unwrap();
    assert!(resolver.cache().contains(v("8.0")));

    resolver.invalidate();
    assert!(resolver.cache().is_empty());

    let after = resolver.resolve("8.0").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(*before, *after);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_agree() {
    let resolver = Arc::new(fixture_resolver());
    let expected: Vec<SignatureMap> = ["7.4", "8.0", "8.1"]
        .iter()
        .map(|version| SignatureMap::clone(&fixture_resolver().resolve(version).unwrap()))
        .collect();

    let mut handles = Vec::new();
    for i in 0..24 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::task::spawn_blocking(move || {
            let version = ["7.4", "8.0", "8.1"][i % 3];
            (i % 3, resolver.resolve(version).unwrap())
        }));
    }

    for handle in handles {
        let (idx, map) = handle.await.unwrap();
        assert_eq!(*map, expected[idx]);
    }
    assert_eq!(resolver.cache().len(), 3);
}
