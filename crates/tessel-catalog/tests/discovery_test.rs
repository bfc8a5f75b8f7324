//! Integration tests for operator discovery
//!
//! Tests use temporary search directories with real manifest files to verify:
//! - Registration by file stem and filtering of non-manifest entries
//! - Idempotent discovery per (package, location)
//! - Name collision policies
//! - Capability filtering
//! - Tolerance of broken manifests and fail-fast mode
//! - Concurrent discovery

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tessel_catalog::{
    ComponentRegistry, DiscoveryErrorKind, DiscoveryOptions, Error, OperatorKind, OperatorTable,
    Params, builtins,
};
use tessel_core::config::ConflictPolicy;
use tessel_core::{Capability, Transformer, Value};

const FIT_TRANSFORM: &[Capability] = &[Capability::Fit, Capability::Transform];

/// Helper to create a search directory holding the given manifests.
fn search_dir(manifests: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_manifests(dir.path(), manifests);
    dir
}

fn write_manifests(dir: &Path, manifests: &[(&str, &str)]) {
    for (file, contents) in manifests {
        std::fs::write(dir.join(file), contents).unwrap();
    }
}

fn registry(options: DiscoveryOptions) -> ComponentRegistry {
    ComponentRegistry::new(builtins::table(), options)
}

const STANDARD: &[(&str, &str)] = &[
    ("title_hash.yaml", "kind: text2vector\nparams:\n  dimensions: 4\n"),
    ("scale.yml", "kind: standard_scaler\n"),
    ("colors.yaml", "kind: one_hot\nparams:\n  handle_unknown: error\n"),
];

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_discover_registers_manifests_by_file_stem() {
    let dir = search_dir(STANDARD);
    write_manifests(dir.path(), &[("README.md", "# not a manifest\n")]);
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    write_manifests(
        &dir.path().join("nested"),
        &[("deep.yaml", "kind: drop_missing\n")],
    );

    let registry = registry(DiscoveryOptions::default());
    let report = registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.registered, vec!["colors", "scale", "title_hash"]);
    assert_eq!(registry.names(), vec!["colors", "scale", "title_hash"]);

    let descriptor = registry.lookup("title_hash").unwrap();
    assert_eq!(descriptor.kind(), "text2vector");
    assert_eq!(descriptor.source().package, "ops");
    assert!(descriptor.source().path.is_some());
    assert!(matches!(registry.lookup("deep"), Err(Error::NotFound { .. })));
}

#[test]
fn test_manifest_description_overrides_kind_description() {
    let dir = search_dir(&[(
        "described.yaml",
        "kind: drop_missing\ndescription: Rows without gaps\n",
    )]);
    let registry = registry(DiscoveryOptions::default());
    registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    assert_eq!(
        registry.lookup("described").unwrap().description(),
        "Rows without gaps"
    );
}

#[test]
fn test_instantiate_returns_independent_instances() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());
    registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    let data = tessel_core::Dataset::from_rows(
        vec![vec![Value::from(1.0)], vec![Value::from(3.0)]],
        vec![Value::Null, Value::Null],
    )
    .unwrap();

    let mut fitted = registry.instantiate("scale").unwrap();
    fitted.fit(&data, &[0]).unwrap();
    assert!(fitted.transform(&data, &[0]).is_ok());

    // a second instance shares no fitted state
    let fresh = registry.instantiate("scale").unwrap();
    assert_eq!(fresh.name(), "scale");
    assert!(fresh.transform(&data, &[0]).is_err());
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_repeated_discovery_is_a_no_op() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());

    registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();
    let before: Vec<_> = registry.all().iter().cloned().collect();

    // a different spelling of the same directory
    let respelled = dir.path().join(".");
    let report = registry.discover("ops", &respelled, FIT_TRANSFORM).unwrap();

    assert!(report.already_discovered);
    assert!(report.registered.is_empty());
    assert!(report.errors.is_empty());
    let after: Vec<_> = registry.all().iter().cloned().collect();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert!(Arc::ptr_eq(b, a));
    }
    assert!(registry.is_discovered("ops", dir.path()));
}

#[test]
fn test_late_manifests_ignored_for_discovered_location() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());
    registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    write_manifests(dir.path(), &[("late.yaml", "kind: drop_missing\n")]);
    registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    assert!(registry.lookup("late").is_err());
}

// =============================================================================
// Name collisions
// =============================================================================

#[test]
fn test_conflict_rejected_keeps_first_entry() {
    let first = search_dir(&[("hash.yaml", "kind: text2vector\n")]);
    let second = search_dir(&[
        ("hash.yaml", "kind: text2vector\nparams:\n  dimensions: 8\n"),
        ("extra.yaml", "kind: drop_missing\n"),
    ]);
    let registry = registry(DiscoveryOptions::default());

    registry.discover("first", first.path(), FIT_TRANSFORM).unwrap();
    let report = registry
        .discover("second", second.path(), FIT_TRANSFORM)
        .unwrap();

    assert_eq!(report.registered, vec!["extra"]);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0].kind,
        DiscoveryErrorKind::NameConflict { name, .. } if name == "hash"
    ));
    assert_eq!(registry.lookup("hash").unwrap().source().package, "first");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_conflict_last_write_wins_replaces_entry() {
    let first = search_dir(&[("hash.yaml", "kind: text2vector\n")]);
    let second = search_dir(&[("hash.yaml", "kind: text2vector\nparams:\n  dimensions: 8\n")]);
    let registry = registry(DiscoveryOptions {
        on_conflict: ConflictPolicy::LastWriteWins,
        ..Default::default()
    });

    registry.discover("first", first.path(), FIT_TRANSFORM).unwrap();
    let report = registry
        .discover("second", second.path(), FIT_TRANSFORM)
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.replaced, vec!["hash"]);
    let descriptor = registry.lookup("hash").unwrap();
    assert_eq!(descriptor.source().package, "second");
    assert_eq!(descriptor.params()["dimensions"].as_u64(), Some(8));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_manifest_shadowing_builtin_conflicts() {
    let dir = search_dir(&[("one_hot.yaml", "kind: one_hot\nparams:\n  max_categories: 3\n")]);
    let registry = registry(DiscoveryOptions::default());
    registry.register_builtins(FIT_TRANSFORM).unwrap();

    let report = registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(registry.lookup("one_hot").unwrap().params().is_null());
}

// =============================================================================
// Capabilities
// =============================================================================

fn unbuildable(_: &str, _: &Params) -> tessel_core::Result<Box<dyn Transformer>> {
    Err(tessel_core::Error::transform("fit_only", "never constructed"))
}

const FIT_ONLY: OperatorKind = OperatorKind {
    name: "fit_only",
    description: "Fits but cannot transform",
    capabilities: &[Capability::Fit],
    build: unbuildable,
};

#[test]
fn test_candidates_lacking_capabilities_are_excluded() {
    let table = OperatorTable::new(builtins::table().iter().copied().chain([FIT_ONLY]));
    let registry = ComponentRegistry::new(table, DiscoveryOptions::default());
    let dir = search_dir(&[
        ("partial.yaml", "kind: fit_only\n"),
        ("scale.yaml", "kind: standard_scaler\n"),
    ]);

    let report = registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.registered, vec!["scale"]);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].name, "partial");
    assert_eq!(report.excluded[0].missing, vec![Capability::Transform]);
    assert!(registry.lookup("partial").is_err());
}

#[test]
fn test_stricter_requirement_narrows_registration() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());
    let report = registry
        .discover(
            "ops",
            dir.path(),
            &[Capability::Fit, Capability::Transform, Capability::InverseTransform],
        )
        .unwrap();

    assert_eq!(report.registered, vec!["scale"]);
    assert_eq!(report.excluded.len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

const BROKEN: &[(&str, &str)] = &[
    ("a_good.yaml", "kind: drop_missing\n"),
    ("b_malformed.yaml", "kind: [unterminated\n"),
    ("c_unknown.yaml", "kind: tfidf\n"),
    ("d_bad_params.yaml", "kind: text2vector\nparams:\n  dimensions: 0\n"),
    ("e_good.yaml", "kind: standard_scaler\n"),
];

#[test]
fn test_broken_manifests_do_not_abort_discovery() {
    let dir = search_dir(BROKEN);
    let registry = registry(DiscoveryOptions::default());
    let report = registry.discover("ops", dir.path(), FIT_TRANSFORM).unwrap();

    assert_eq!(report.registered, vec!["a_good", "e_good"]);
    let kinds: Vec<_> = report.errors.iter().map(|e| &e.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(matches!(kinds[0], DiscoveryErrorKind::Malformed(_)));
    assert!(matches!(kinds[1], DiscoveryErrorKind::UnknownKind { kind } if kind == "tfidf"));
    assert!(matches!(kinds[2], DiscoveryErrorKind::InvalidParams(_)));
    assert!(report.errors[0].path.ends_with("b_malformed.yaml"));
}

#[test]
fn test_fail_fast_registers_nothing() {
    let dir = search_dir(BROKEN);
    let registry = registry(DiscoveryOptions {
        fail_fast: true,
        ..Default::default()
    });

    let err = registry
        .discover("ops", dir.path(), FIT_TRANSFORM)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Discovery(ref e) if matches!(e.kind, DiscoveryErrorKind::Malformed(_))
    ));
    assert!(registry.is_empty());
    assert!(!registry.is_discovered("ops", dir.path()));
}

#[test]
fn test_file_location_is_unreadable() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());
    let result = registry.discover("ops", dir.path().join("scale.yml"), FIT_TRANSFORM);
    assert!(matches!(result, Err(Error::LocationUnreadable { .. })));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_discovery_of_one_location_merges_once() {
    let dir = search_dir(STANDARD);
    let registry = registry(DiscoveryOptions::default());

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.discover("ops", dir.path(), FIT_TRANSFORM)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    let merged: Vec<_> = reports.iter().filter(|r| !r.already_discovered).collect();
    assert_eq!(merged.len(), 1);
    assert!(merged[0].is_clean());
    assert_eq!(registry.len(), STANDARD.len());
}

#[test]
fn test_concurrent_discovery_of_distinct_locations() {
    let dirs: Vec<TempDir> = (0..6)
        .map(|i| {
            let file = format!("op_{i}.yaml");
            search_dir(&[(file.as_str(), "kind: drop_missing\n")])
        })
        .collect();
    let registry = registry(DiscoveryOptions::default());

    std::thread::scope(|scope| {
        for (i, dir) in dirs.iter().enumerate() {
            let registry = &registry;
            scope.spawn(move || {
                registry
                    .discover(&format!("pkg{i}"), dir.path(), FIT_TRANSFORM)
                    .unwrap();
                // readers always see a consistent snapshot
                let snapshot = registry.all();
                assert!(snapshot.iter().count() == snapshot.len());
            });
        }
    });

    assert_eq!(registry.len(), dirs.len());
    for i in 0..dirs.len() {
        assert!(registry.lookup(&format!("op_{i}")).is_ok());
    }
}
