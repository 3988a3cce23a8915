//! Project-wide candidate collection: Swift sources per target group, the
//! manifest's permission descriptions, and keys already present in the
//! string catalogs.

use std::collections::BTreeMap;
use std::path::Path;

use swiftloc_catalog::StringCatalog;
use swiftloc_core::{Candidate, OriginContext, TargetGroup};
use swiftloc_scan::{
    aggregate, extract_rules, looks_translatable, scan_manifest, scan_swift_source, ExtractRule,
    SourceLanguageFilter,
};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::project::{ProjectError, ProjectLayout};
use crate::Result;

#[derive(Debug)]
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    /// Permission key -> raw manifest value.
    pub permission_texts: BTreeMap<String, String>,
}

fn swift_files(dir: &Path) -> Vec<std::path::PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "swift"))
        .collect()
}

fn scan_group(
    layout: &ProjectLayout,
    group: TargetGroup,
    rules: &[ExtractRule],
    filter: &dyn SourceLanguageFilter,
    pairs: &mut Vec<(String, OriginContext)>,
) -> Result<()> {
    let dir = layout
        .group_dir(group)
        .ok_or(ProjectError::WidgetNotConfigured)?;

    for path in swift_files(dir) {
        let content = std::fs::read_to_string(&path)?;
        let extracted =
            scan_swift_source(&content, &layout.rel(&path), group, rules, filter);
        debug!(event = "source_scanned", file = %layout.rel(&path), extracted = extracted.len());
        pairs.extend(extracted);
    }

    // Keys already in the catalog are candidates too: they may have been
    // added by hand without a localization for the current language.
    if let Some(catalog_path) = layout.catalog_path(group) {
        if catalog_path.is_file() {
            let catalog = StringCatalog::load(&catalog_path)?;
            let rel = layout.rel(&catalog_path);
            for key in catalog.keys() {
                if looks_translatable(&key) && filter.accepts(&key) {
                    pairs.push((
                        key,
                        OriginContext {
                            file: rel.clone(),
                            line: 0,
                            kind: "xcstrings_key".to_string(),
                            target: group,
                        },
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Collect every unique translatable string reachable from the included
/// target groups, in deterministic order. The manifest is always scanned;
/// presence of the required permission keys is checked by the caller.
pub fn collect_candidates(
    layout: &ProjectLayout,
    include: &[TargetGroup],
    filter: &dyn SourceLanguageFilter,
) -> Result<ScanOutcome> {
    let rules = extract_rules();
    let mut pairs: Vec<(String, OriginContext)> = Vec::new();

    for group in include {
        scan_group(layout, *group, &rules, filter, &mut pairs)?;
    }

    let manifest = std::fs::read_to_string(&layout.pbx_path)?;
    let (manifest_pairs, permission_texts) =
        scan_manifest(&manifest, &layout.rel(&layout.pbx_path), filter);
    pairs.extend(manifest_pairs);

    let candidates = aggregate(pairs);
    info!(event = "scan_done", candidates = candidates.len());
    Ok(ScanOutcome {
        candidates,
        permission_texts,
    })
}
