//! The onboarding pipeline: scan, translate with bounded retries, then
//! merge validated results into the project's localization surfaces.
//!
//! Order matters: artifacts are written before any network call result is
//! merged, and the manifest precondition runs before the first request.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use swiftloc_catalog::{
    ensure_known_region, known_regions, merge_catalog, normalize_language_code,
    render_permission_strings, sanitize_catalog, sync_bundle_localizations, write_atomic,
};
use swiftloc_core::{RowStatus, TargetGroup, TranslationRow};
use swiftloc_domain::MergeSummary;
use swiftloc_scan::{ensure_permission_keys, SourceLanguageFilter, REQUIRED_PERMISSION_KEYS};
use swiftloc_translate::{translate_candidates, TranslateOptions, TranslationProvider};
use tracing::info;

use crate::artifacts::{write_candidates_artifact, write_results_artifact};
use crate::project::ProjectLayout;
use crate::scan::collect_candidates;
use crate::Result;

#[derive(Debug, Clone)]
pub struct OnboardOptions {
    pub source_language: String,
    /// Target language tag; `pt_BR` is accepted and normalized to `pt-BR`.
    pub language: String,
    pub model: String,
    pub batch_size: usize,
    pub max_retries: usize,
    pub cache_size: usize,
    pub include: Vec<TargetGroup>,
    /// Scan and write the candidates artifact, then stop before any
    /// network or project mutation.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct OnboardOutcome {
    pub candidates_path: PathBuf,
    pub results_path: Option<PathBuf>,
    pub total_candidates: usize,
    pub summary: Option<MergeSummary>,
}

fn group_pairs(rows: &[TranslationRow], group: TargetGroup) -> BTreeMap<String, String> {
    rows.iter()
        .filter(|r| r.is_for(group))
        .map(|r| (r.source.clone(), r.target.clone()))
        .collect()
}

fn apply_results(
    layout: &ProjectLayout,
    language: &str,
    include: &[TargetGroup],
    rows: &[TranslationRow],
    permission_texts: &BTreeMap<String, String>,
) -> Result<MergeSummary> {
    let mut summary = MergeSummary {
        region_added: ensure_known_region(&layout.pbx_path, language)?,
        ..MergeSummary::default()
    };

    let regions = known_regions(&layout.pbx_path)?;
    summary.plists_synced = sync_bundle_localizations(&layout.info_plists, &regions)?;

    for group in include {
        let Some(catalog) = layout.catalog_path(*group) else {
            continue;
        };
        let pairs = group_pairs(rows, *group);
        let updated = merge_catalog(&catalog, language, &pairs)?;
        let sanitized = sanitize_catalog(&catalog, language)?;
        match group {
            TargetGroup::App => {
                summary.app_catalog_entries_updated = updated;
                summary.app_sanitized_keys = sanitized;
            }
            TargetGroup::Widget => {
                summary.widget_catalog_entries_updated = updated;
                summary.widget_sanitized_keys = sanitized;
            }
        }
    }

    // Localized permission descriptions, falling back to the manifest text
    // when its translation did not survive validation.
    let by_source: HashMap<&str, &str> = rows
        .iter()
        .map(|r| (r.source.as_str(), r.target.as_str()))
        .collect();
    let rendered = render_permission_strings(REQUIRED_PERMISSION_KEYS.iter().map(|key| {
        let raw = permission_texts
            .get(*key)
            .map(String::as_str)
            .unwrap_or_default();
        (*key, by_source.get(raw).copied().unwrap_or(raw))
    }));
    write_atomic(&layout.permission_strings_path(language), rendered.as_bytes())?;

    summary.translated = rows.iter().filter(|r| r.status == RowStatus::Translated).count();
    summary.fallback = rows.len() - summary.translated;
    Ok(summary)
}

/// Run the full onboarding pipeline for one target language.
pub fn run_onboard(
    layout: &ProjectLayout,
    opts: &OnboardOptions,
    filter: &dyn SourceLanguageFilter,
    provider: &dyn TranslationProvider,
) -> Result<OnboardOutcome> {
    let language = normalize_language_code(&opts.language);

    let scan = collect_candidates(layout, &opts.include, filter)?;
    ensure_permission_keys(&scan.permission_texts)?;

    let include_names: Vec<String> = opts.include.iter().map(|g| g.to_string()).collect();
    let artifact_dir = layout.artifact_dir(&language);
    let candidates_path = write_candidates_artifact(
        &artifact_dir,
        &scan.candidates,
        &opts.source_language,
        &language,
        &include_names,
    )?;

    if opts.dry_run {
        info!(event = "onboard_dry_run", candidates = scan.candidates.len());
        return Ok(OnboardOutcome {
            candidates_path,
            results_path: None,
            total_candidates: scan.candidates.len(),
            summary: None,
        });
    }

    let rows = translate_candidates(
        &scan.candidates,
        provider,
        &TranslateOptions {
            model: opts.model.clone(),
            source_lang: opts.source_language.clone(),
            target_lang: language.clone(),
            batch_size: opts.batch_size,
            max_retries: opts.max_retries,
            cache_size: opts.cache_size,
        },
    )?;
    let results_path = write_results_artifact(
        &artifact_dir,
        &rows,
        &opts.source_language,
        &language,
        &opts.model,
    )?;

    let summary = apply_results(layout, &language, &opts.include, &rows, &scan.permission_texts)?;
    info!(
        event = "onboard_done",
        language = %language,
        translated = summary.translated,
        fallback = summary.fallback
    );

    Ok(OnboardOutcome {
        candidates_path,
        results_path: Some(results_path),
        total_candidates: scan.candidates.len(),
        summary: Some(summary),
    })
}
