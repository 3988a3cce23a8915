use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One point of use as persisted in run artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContextRow {
    pub file: String,
    pub line: usize,
    pub kind: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CandidateRow {
    pub source: String,
    pub contexts: Vec<ContextRow>,
}

/// Inventory of unique strings discovered by a scan. The only artifact a
/// dry run writes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesArtifact {
    pub schema_version: u32,
    pub generated_at: String,
    pub source_language: String,
    pub target_language: String,
    pub include_targets: Vec<String>,
    pub total_candidates: usize,
    pub candidates: Vec<CandidateRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResultRow {
    pub source: String,
    pub target: String,
    pub status: String,
    pub validation: String,
    pub contexts: Vec<ContextRow>,
}

/// Per-run audit record of what the orchestrator decided for each candidate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsArtifact {
    pub schema_version: u32,
    pub generated_at: String,
    pub source_language: String,
    pub target_language: String,
    pub model: String,
    pub total_results: usize,
    pub results: Vec<ResultRow>,
}

/// Counters reported after the merge step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub region_added: bool,
    pub plists_synced: usize,
    pub app_catalog_entries_updated: usize,
    pub widget_catalog_entries_updated: usize,
    pub app_sanitized_keys: usize,
    pub widget_sanitized_keys: usize,
    pub translated: usize,
    pub fallback: usize,
}
