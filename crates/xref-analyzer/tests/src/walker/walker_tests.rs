use std::path::Path;

use super::*;

fn names(source: &str) -> Vec<&str> {
    identifiers(source).map(|identifier| identifier.text).collect()
}

#[test]
fn identifiers_skip_keywords_and_literals() {
    let source = r#"import { Foo } from "./b";
// Foo in a comment
/* and Bar in a block */
let foo: Foo = Object({ label: 'Baz', note: `Qux ${x}` });
"#;
    assert_eq!(names(source), vec!["Foo", "foo", "Foo", "Object", "label", "note"]);
}

#[test]
fn identifier_offsets_are_bytes() {
    let source = "const é = 1; let $value = é;";
    let found = identifiers(source).collect::<Vec<_>>();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "$value");
    assert_eq!(&source[found[0].start..found[0].end], "$value");
}

#[test]
fn numbers_are_not_identifiers() {
    assert_eq!(names("let x1 = 0x1F + 10n + 3e5;"), vec!["x1"]);
}

#[test]
fn contextual_keywords_are_skipped() {
    assert!(is_keyword("readonly"));
    assert!(is_keyword("keyof"));
    assert!(!is_keyword("target"));
    assert_eq!(names("declare module \"d\" { interface I { target: string; } }"), vec!["I", "target"]);
}

#[test]
fn regex_literals_do_not_open_comments() {
    let source = "const trimmed = path.replace(/\\/*$/, '');\nconst target = lookup(trimmed);\n/** Helper. */\nfunction helper() {}";
    assert_eq!(names(source), vec!["trimmed", "path", "replace", "target", "lookup", "trimmed", "helper"]);
}

#[test]
fn regex_bodies_and_flags_are_skipped() {
    assert_eq!(names("if (/[/]Foo\\/Bar/gi.test(input)) return /x/;"), vec!["test", "input"]);
    assert_eq!(names("const re = typeof /a*/ === 'object';"), vec!["re"]);
}

#[test]
fn division_is_not_a_regex() {
    assert_eq!(names("const half = total / 2 / scale; // note"), vec!["half", "total", "scale"]);
    assert_eq!(names("let r = (a) / b /* c */ + d[0] / e;"), vec!["r", "a", "b", "d", "e"]);
}

#[test]
fn builtin_bundle_patterns() {
    let filter = BundleFilter::default();
    assert!(filter.is_bundle(Path::new("/ws/dist/app.min.js")));
    assert!(filter.is_bundle(Path::new("/ws/dist/app.min.mjs")));
    assert!(filter.is_bundle(Path::new("/ws/dist/vendor-bundle.js")));
    assert!(filter.is_bundle(Path::new("/ws/dist/main.bundle.js")));
    assert!(filter.is_bundle(Path::new("/ws/dist/12.chunk.js")));
    assert!(!filter.is_bundle(Path::new("/ws/src/minimal.js")));
    assert!(!filter.is_bundle(Path::new("/ws/src/bundle.ts")));
}

#[test]
fn extra_bundle_patterns_and_invalid_ones() {
    let filter = BundleFilter::new(&["\\.dist\\.js$".to_string(), "(".to_string()]);
    assert!(filter.is_bundle(Path::new("/ws/out/app.dist.js")));
    assert!(!filter.is_bundle(Path::new("/ws/out/app.js")));
}
