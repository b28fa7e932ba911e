use colored::Colorize;

use super::driver::{Report, ReportedDecl};
use stubir_serialization::IdentitySource;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// Indented declaration tree followed by renames and a summary line.
    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        out.push_str(&self.paint_header(&format!("module {} ({})", report.module, report.library)));
        out.push('\n');
        for decl in &report.declarations {
            out.push_str(&self.format_decl(decl));
            out.push('\n');
        }
        if !report.renamed.is_empty() {
            out.push('\n');
            out.push_str(&self.paint_header("renamed"));
            out.push('\n');
            for renamed in &report.renamed {
                out.push_str(&format!("  {}: {} -> {}\n", renamed.fq_name, renamed.from, renamed.to));
            }
        }
        let stats = &report.stats;
        out.push_str(&format!(
            "\n{} declarations, {} built, {} enums, {} cache hits\n",
            report.declarations.len(),
            stats.factory_invocations,
            stats.enums_synthesized,
            stats.registry_hits,
        ));
        out
    }

    pub fn format_decl(&self, decl: &ReportedDecl) -> String {
        let indent = "  ".repeat(decl.depth);
        let marker = match decl.identity {
            IdentitySource::Precomputed => "=",
            IdentitySource::Structural => "~",
        };
        format!(
            "{indent}{} {} {}{}",
            self.paint_kind(decl.kind),
            decl.name,
            marker,
            self.paint_id(&decl.uniq_id.to_string()),
        )
    }

    fn paint_header(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_kind(&self, kind: &str) -> String {
        if self.color {
            kind.cyan().to_string()
        } else {
            kind.to_string()
        }
    }

    fn paint_id(&self, id: &str) -> String {
        if self.color {
            id.dimmed().to_string()
        } else {
            id.to_string()
        }
    }
}
