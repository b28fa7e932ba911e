use super::driver::{RenamedProperty, Report, ReportedDecl};
use super::reporter::Reporter;
use stubir_ir::Origin;
use stubir_provider::SessionStats;
use stubir_serialization::{IdentitySource, UniqId};

fn report() -> Report {
    Report {
        module: "main".to_string(),
        library: "libcolors".to_string(),
        declarations: vec![
            ReportedDecl {
                depth: 0,
                kind: "class",
                name: "Color".to_string(),
                fq_name: "colors.Color".to_string(),
                origin: Origin::ExternalStub,
                uniq_id: UniqId(0x2a),
                identity: IdentitySource::Precomputed,
            },
            ReportedDecl {
                depth: 1,
                kind: "function",
                name: "values".to_string(),
                fq_name: "colors.Color.values".to_string(),
                origin: Origin::EnumSpecialMember,
                uniq_id: UniqId(1),
                identity: IdentitySource::Structural,
            },
        ],
        renamed: vec![RenamedProperty {
            fq_name: "app.x".to_string(),
            from: "x".to_string(),
            to: "x_".to_string(),
        }],
        stats: SessionStats {
            factory_invocations: 0,
            registry_hits: 3,
            enums_synthesized: 1,
            rollbacks: 0,
        },
    }
}

#[test]
fn renders_plain_tree() {
    let out = Reporter::new(false).render(&report());
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "module main (libcolors)");
    assert_eq!(lines[1], "class Color =000000000000002a");
    assert_eq!(lines[2], "  function values ~0000000000000001");
    assert!(out.contains("renamed\n  app.x: x -> x_\n"));
    assert!(out.ends_with("2 declarations, 0 built, 1 enums, 3 cache hits\n"));
}

#[test]
fn omits_rename_section_when_empty() {
    let mut report = report();
    report.renamed.clear();
    let out = Reporter::new(false).render(&report);
    assert!(!out.contains("renamed"));
}
