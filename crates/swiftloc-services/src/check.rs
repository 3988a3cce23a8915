//! Guardrail: find hard-coded source-language literals that should have
//! gone through the localization pipeline.

use std::fmt;

use swiftloc_core::TargetGroup;
use swiftloc_scan::{extract_rules, scan_manifest, scan_swift_source, SourceLanguageFilter};
use tracing::info;
use walkdir::WalkDir;

use crate::project::ProjectLayout;
use crate::Result;

/// One flagged literal. The guardrail reports, it never rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub kind: String,
    pub literal: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: [{}] \"{}\"", self.file, self.line, self.kind, self.literal)
    }
}

/// Scan the included groups plus the manifest and report every literal the
/// filter classifies as source-language text. Missing permission keys are
/// not an error here; the check is about literals, not preconditions.
pub fn run_check(
    layout: &ProjectLayout,
    include: &[TargetGroup],
    filter: &dyn SourceLanguageFilter,
) -> Result<Vec<Violation>> {
    let rules = extract_rules();
    let mut violations: Vec<Violation> = Vec::new();

    for group in include {
        let Some(dir) = layout.group_dir(*group) else {
            continue;
        };
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || !path.extension().is_some_and(|ext| ext == "swift")
            {
                continue;
            }
            let content = std::fs::read_to_string(path)?;
            for (text, ctx) in
                scan_swift_source(&content, &layout.rel(path), *group, &rules, filter)
            {
                violations.push(Violation {
                    file: ctx.file,
                    line: ctx.line,
                    kind: ctx.kind,
                    literal: text,
                });
            }
        }
    }

    let manifest = std::fs::read_to_string(&layout.pbx_path)?;
    let (pairs, _) = scan_manifest(&manifest, &layout.rel(&layout.pbx_path), filter);
    for (text, ctx) in pairs {
        violations.push(Violation {
            file: ctx.file,
            line: ctx.line,
            kind: ctx.kind,
            literal: text,
        });
    }

    violations.sort_by(|a, b| (&a.file, a.line, &a.kind).cmp(&(&b.file, b.line, &b.kind)));
    info!(event = "check_done", violations = violations.len());
    Ok(violations)
}
