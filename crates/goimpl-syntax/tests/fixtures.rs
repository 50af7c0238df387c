// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Fixture tests for the goimpl-syntax parser, printer and formatter.
//!
//! Every file in `tests/fixtures/` is gofmt-clean Go. The tests check that
//! each one parses, that the format pass leaves it unchanged, and that
//! interface methods print back exactly as written.

use difference::assert_diff;
use itertools::Itertools;
use std::path::PathBuf;

use goimpl_syntax::{
    format_source, parse_file, print_signature_indented, Decl, SourceFile, TypeExpr,
};

fn all_fixtures() -> impl Iterator<Item = (PathBuf, String)> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");

    path.read_dir()
        .expect("read_dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|p| p.extension().is_some_and(|e| e == "go"))
        .sorted()
        .map(|path| {
            let contents = std::fs::read_to_string(&path).expect("reading file");
            (path, contents)
        })
}

fn load(name: &str) -> (String, SourceFile) {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    let source = std::fs::read_to_string(&path).expect("reading file");
    let file = parse_file(&source).unwrap_or_else(|e| panic!("{}: {}", name, e));
    (source, file)
}

fn visualize(s: &str) -> String {
    s.replace(' ', "▩").replace('\t', "→").lines().join("↩\n")
}

#[test]
fn fixtures_parse() {
    for (path, input) in all_fixtures() {
        if let Err(e) = parse_file(&input) {
            panic!("{}: {}", path.display(), e);
        }
    }
}

#[test]
fn fixtures_are_format_fixed_points() {
    for (path, input) in all_fixtures() {
        let formatted =
            format_source(&input).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        if formatted != input {
            assert_diff!(&visualize(&input), &visualize(&formatted), "", 0);
        }
    }
}

#[test]
fn interface_methods_print_as_written() {
    let (source, file) = load("interfaces.go");
    let partier = file
        .type_specs()
        .find(|s| s.name == "Partier")
        .expect("Partier");
    let TypeExpr::Interface(iface) = &partier.ty else {
        panic!("Partier is not an interface");
    };
    assert_eq!(iface.embeds().count(), 3);
    assert_eq!(iface.methods().count(), 7);
    for method in iface.methods() {
        let line = format!("\t{}{}", method.name, print_signature_indented(&method.sig, 1));
        assert!(
            source.contains(&line),
            "{} printed as\n{}",
            method.name,
            line
        );
    }
}

#[test]
fn imports_keep_names_and_paths() {
    let (_, file) = load("interfaces.go");
    let imports = file
        .import_specs()
        .map(|s| (s.name.as_deref(), s.path.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        imports,
        vec![
            (None, "io"),
            (None, "example.com/impl/testdata/crowd"),
            (Some("m"), "example.com/impl/testdata/models"),
        ]
    );
}

#[test]
fn generic_declarations() {
    let (_, file) = load("generics.go");
    let names = file
        .type_specs()
        .map(|s| (s.name.as_str(), s.type_params.len()))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![("Number", 0), ("Box", 1), ("Pair", 2), ("Grid", 0), ("Sink", 1)]
    );
    let methods = file
        .funcs()
        .filter_map(|f| f.recv.as_ref().map(|r| (f.name.as_str(), r.pointer)))
        .collect::<Vec<_>>();
    assert_eq!(methods, vec![("Len", true), ("String", false)]);
}

#[test]
fn bodies_and_values_are_opaque() {
    let (_, file) = load("bodies.go");
    let values = file
        .decls
        .iter()
        .filter(|d| matches!(d, Decl::Value(_)))
        .count();
    assert_eq!(values, 4);
    let funcs = file.funcs().map(|f| f.name.as_str()).collect::<Vec<_>>();
    assert_eq!(funcs, vec!["Inc", "Describe", "run"]);
    assert!(file.funcs().all(|f| f.body.is_some()));
}
