//! Golden tests for generated destination files.
//!
//! Each case generates stubs for one interface on one concrete type in the
//! `tests/testdata` module and compares the full file with
//! `tests/golden/<case>.go.golden`.
//!
//! ## Updating Golden Files
//!
//! ```bash
//! GOIMPL_UPDATE_GOLDEN=1 cargo nextest run -p goimpl-go golden
//! git diff tests/golden/
//! ```

use std::fs;
use std::path::PathBuf;

use goimpl_core::types::TypeRef;
use goimpl_go::ops::{generate_stubs, GenerateOptions};
use goimpl_go::source::FsSource;
use goimpl_go::toolchain::LoadConfig;

const MODULE: &str = "example.com/impl/testdata";

// ============================================================================
// Test Infrastructure
// ============================================================================

fn tests_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests")
}

fn source() -> FsSource {
    let config = LoadConfig::new(tests_dir().join("testdata")).with_goroot(tests_dir().join("goroot"));
    FsSource::new(config).expect("testdata go.mod should parse")
}

/// `name` in package `pkg` of the test module, or a standard-library ref.
fn type_ref(pkg: &str, name: &str) -> TypeRef {
    if pkg.contains('.') || pkg == "io" {
        TypeRef::new(pkg, name)
    } else {
        TypeRef::new(format!("{}/{}", MODULE, pkg), name)
    }
}

fn update_mode() -> bool {
    std::env::var("GOIMPL_UPDATE_GOLDEN").is_ok()
}

fn run_golden(case: &str, iface: (&str, &str), concrete: (&str, &str)) {
    let outcome = generate_stubs(
        &source(),
        &type_ref(iface.0, iface.1),
        &type_ref(concrete.0, concrete.1),
        &GenerateOptions::default(),
    )
    .unwrap_or_else(|e| panic!("{}: generation failed: {}", case, e));
    let implementation = outcome
        .implementation
        .unwrap_or_else(|| panic!("{}: expected missing methods", case));
    assert!(!outcome.written);

    let path = tests_dir().join("golden").join(format!("{}.go.golden", case));
    if update_mode() {
        fs::write(&path, &implementation.file_content).expect("write golden file");
        return;
    }
    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("{}: cannot read {}: {}", case, path.display(), e));
    assert_eq!(
        implementation.file_content, expected,
        "{}: output differs from {}",
        case,
        path.display()
    );
}

// ============================================================================
// Cases
// ============================================================================

#[test]
fn golden_standard_library_interface() {
    run_golden("goer_writer", ("io", "Writer"), ("goer", "Goer"));
}

#[test]
fn golden_destination_package_qualifier_is_dropped() {
    run_golden("crowd_rioter", ("rioter", "Rioter"), ("crowd", "Mob"));
}

#[test]
fn golden_embedded_interfaces_and_new_imports() {
    run_golden("goer_partier", ("partier", "Partier"), ("goer", "Goer"));
}

#[test]
fn golden_blank_import_is_not_a_qualifier() {
    run_golden("underscore_simple", ("simple", "Simple"), ("underscore", "Underscore"));
}

#[test]
fn golden_dot_imported_names_are_qualified() {
    run_golden("underscore_dotter", ("dotter", "Dotter"), ("underscore", "Underscore"));
}
