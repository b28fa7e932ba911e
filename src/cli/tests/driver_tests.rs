use clap::Parser;
use std::fs;
use std::path::Path;

use super::args::CliArgs;
use super::driver::{Report, ReportedDecl, run};
use stubir_ir::Origin;
use stubir_serialization::{IdentitySource, UniqId};

const COLORS: &str = r#"
{
  "library": "libcolors",
  "packages": [
    {
      "name": "colors",
      "declarations": [
        { "kind": "enum", "name": "Color", "backing": "i32",
          "entries": [{ "name": "RED", "value": 1 }, { "name": "GREEN", "value": 2 }] },
        { "kind": "class", "name": "Node", "objc": true,
          "members": [
            { "kind": "field", "name": "next", "type": "*Node" },
            { "kind": "function", "name": "hash", "returns": "u64", "fakeOverride": true }
          ] },
        { "kind": "property", "name": "favorite", "type": "Color", "mutable": true },
        { "kind": "function", "name": "paint",
          "params": [{ "name": "c", "type": "Color" }], "uniqId": 77 }
      ]
    }
  ]
}
"#;

fn write_manifest(dir: &Path) {
    fs::write(dir.join("libcolors.json"), COLORS).expect("write manifest");
}

fn run_with(dir: &Path, extra: &[&str]) -> anyhow::Result<Report> {
    let mut argv = vec!["stubir"];
    argv.extend_from_slice(extra);
    argv.push("libcolors.json");
    let args = CliArgs::try_parse_from(argv).expect("args parse");
    run(&args, dir)
}

fn find<'a>(report: &'a Report, fq_name: &str) -> Option<&'a ReportedDecl> {
    report.declarations.iter().find(|d| d.fq_name == fq_name)
}

#[test]
fn materializes_every_top_level_entity() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let report = run_with(dir.path(), &[]).expect("run succeeds");
    assert_eq!(report.module, "main");
    assert_eq!(report.library, "libcolors");
    assert_eq!(report.stats.enums_synthesized, 1);
    assert_eq!(report.stats.rollbacks, 0);

    for name in [
        "colors.Color",
        "colors.Color.RED",
        "colors.Color.GREEN",
        "colors.Color.values",
        "colors.Color.Var",
        "colors.Node",
        "colors.Node.next",
        "colors.Node.hash",
        "colors.favorite",
        "colors.paint",
    ] {
        assert!(find(&report, name).is_some(), "missing {name}");
    }

    let paint = find(&report, "colors.paint").expect("paint");
    assert_eq!(paint.uniq_id, UniqId(77));
    assert_eq!(paint.identity, IdentitySource::Precomputed);
    assert_eq!(paint.depth, 0);

    let hash = find(&report, "colors.Node.hash").expect("hash");
    assert_eq!(hash.origin, Origin::FakeOverride);
    assert_eq!(hash.identity, IdentitySource::Structural);
    assert_eq!(hash.depth, 1);

    let red = find(&report, "colors.Color.RED").expect("entry");
    assert_eq!(red.kind, "enum-entry");
}

#[test]
fn accessors_share_the_property_identity() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let report = run_with(dir.path(), &["--entity", "colors.favorite"]).expect("run succeeds");
    let property = find(&report, "colors.favorite").expect("property");
    let getter = find(&report, "colors.favorite.<get-favorite>").expect("getter");
    assert_eq!(getter.uniq_id, property.uniq_id);
    assert_eq!(getter.depth, 1);
}

#[test]
fn explicit_entities_are_lazy() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let report = run_with(dir.path(), &["--entity", "colors.paint"]).expect("run succeeds");
    assert_eq!(report.declarations.len(), 1);
    assert_eq!(report.stats.factory_invocations, 1);
    assert_eq!(report.stats.enums_synthesized, 0);
}

#[test]
fn special_cased_entities_are_skipped() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let report = run_with(dir.path(), &["--special", "colors.paint"]).expect("run succeeds");
    assert!(find(&report, "colors.paint").is_none());
    assert!(find(&report, "colors.Color").is_some());

    let err = run_with(dir.path(), &["--special", "colors.paint", "--entity", "colors.paint"])
        .expect_err("special-cased entity");
    assert!(format!("{err:#}").contains("colors.paint"));
}

#[test]
fn unknown_entity_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let err = run_with(dir.path(), &["--entity", "colors.Missing"]).expect_err("unknown entity");
    assert!(err.to_string().contains("colors.Missing"));
}

#[test]
fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = run_with(dir.path(), &[]).expect_err("no manifest");
    assert!(err.to_string().contains("libcolors.json"));
}

#[test]
fn report_serializes_to_camel_case_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path());

    let report = run_with(dir.path(), &["--entity", "colors.paint", "--module-name", "app"])
        .expect("run succeeds");
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["module"], "app");
    assert_eq!(json["declarations"][0]["fqName"], "colors.paint");
    assert_eq!(json["declarations"][0]["uniqId"], 77);
    assert_eq!(json["declarations"][0]["identity"], "precomputed");
    assert_eq!(json["declarations"][0]["origin"], "ExternalStub");
    assert_eq!(json["stats"]["factoryInvocations"], 1);
}

const CLASHING: &str = r#"
{
  "library": "libclash",
  "packages": [
    {
      "name": "clash",
      "declarations": [
        { "kind": "enum", "name": "Mode", "backing": "u8",
          "entries": [{ "name": "FAST", "value": 0 }] },
        { "kind": "property", "name": "Mode", "type": "Mode" },
        { "kind": "property", "name": "depth", "type": "i32" },
        { "kind": "property", "name": "depth", "type": "i64", "mutable": true }
      ]
    }
  ]
}
"#;

#[test]
fn colliding_foreign_properties_are_renamed() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("libclash.json"), CLASHING).expect("write manifest");
    let args = CliArgs::try_parse_from(["stubir", "libclash.json"]).expect("args parse");

    let report = run(&args, dir.path()).expect("run succeeds");
    let renamed: Vec<(&str, &str, &str)> = report
        .renamed
        .iter()
        .map(|r| (r.fq_name.as_str(), r.from.as_str(), r.to.as_str()))
        .collect();
    assert_eq!(
        renamed,
        [("clash.Mode", "Mode", "Mode_"), ("clash.depth", "depth", "depth_")]
    );
}
