//! Run artifact writers: the candidates inventory, the per-run results
//! audit file, and a CSV rendering for spreadsheet review.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use swiftloc_catalog::write_atomic;
use swiftloc_core::{Candidate, TranslationRow};
use swiftloc_domain::{
    CandidateRow, CandidatesArtifact, ContextRow, ResultRow, ResultsArtifact, SCHEMA_VERSION,
};
use tracing::info;

use crate::Result;

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn context_rows(contexts: &[swiftloc_core::OriginContext]) -> Vec<ContextRow> {
    contexts
        .iter()
        .map(|c| ContextRow {
            file: c.file.clone(),
            line: c.line,
            kind: c.kind.clone(),
            target: c.target.to_string(),
        })
        .collect()
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Write `translation_candidates.json` into `dir` and return its path.
pub fn write_candidates_artifact(
    dir: &Path,
    candidates: &[Candidate],
    source_language: &str,
    target_language: &str,
    include_targets: &[String],
) -> Result<PathBuf> {
    let artifact = CandidatesArtifact {
        schema_version: SCHEMA_VERSION,
        generated_at: timestamp(),
        source_language: source_language.to_string(),
        target_language: target_language.to_string(),
        include_targets: include_targets.to_vec(),
        total_candidates: candidates.len(),
        candidates: candidates
            .iter()
            .map(|c| CandidateRow {
                source: c.source.clone(),
                contexts: context_rows(&c.contexts),
            })
            .collect(),
    };
    let path = dir.join("translation_candidates.json");
    write_json(&path, &artifact)?;
    info!(event = "candidates_written", path = %path.display(), total = candidates.len());
    Ok(path)
}

/// Write `translation_results.json` into `dir` and return its path.
pub fn write_results_artifact(
    dir: &Path,
    rows: &[TranslationRow],
    source_language: &str,
    target_language: &str,
    model: &str,
) -> Result<PathBuf> {
    let artifact = ResultsArtifact {
        schema_version: SCHEMA_VERSION,
        generated_at: timestamp(),
        source_language: source_language.to_string(),
        target_language: target_language.to_string(),
        model: model.to_string(),
        total_results: rows.len(),
        results: rows
            .iter()
            .map(|r| ResultRow {
                source: r.source.clone(),
                target: r.target.clone(),
                status: r.status.as_str().to_string(),
                validation: r.validation.clone(),
                contexts: context_rows(&r.contexts),
            })
            .collect(),
    };
    let path = dir.join("translation_results.json");
    write_json(&path, &artifact)?;
    info!(event = "results_written", path = %path.display(), total = rows.len());
    Ok(path)
}

/// Render candidates as CSV, one line per point of use.
pub fn write_candidates_csv<W: Write>(out: W, candidates: &[Candidate]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["source", "file", "line", "kind", "target"])?;
    for candidate in candidates {
        for ctx in &candidate.contexts {
            let line = ctx.line.to_string();
            writer.write_record([
                candidate.source.as_str(),
                ctx.file.as_str(),
                line.as_str(),
                ctx.kind.as_str(),
                ctx.target.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swiftloc_core::{OriginContext, TargetGroup};
    use tempfile::tempdir;

    fn candidate(source: &str, file: &str) -> Candidate {
        Candidate {
            source: source.to_string(),
            contexts: vec![OriginContext {
                file: file.to_string(),
                line: 3,
                kind: "Text".to_string(),
                target: TargetGroup::App,
            }],
        }
    }

    #[test]
    fn candidates_artifact_is_camel_case_json() {
        let dir = tempdir().unwrap();
        let path = write_candidates_artifact(
            dir.path(),
            &[candidate("Add City", "Weather/ContentView.swift")],
            "en",
            "es",
            &["app".to_string()],
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["totalCandidates"], 1);
        assert_eq!(value["candidates"][0]["source"], "Add City");
        assert_eq!(value["candidates"][0]["contexts"][0]["target"], "app");
        assert!(value["generatedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn csv_emits_one_line_per_context() {
        let mut candidate = candidate("Cancel", "Weather/A.swift");
        candidate.contexts.push(OriginContext {
            file: "WeatherWidget/W.swift".to_string(),
            line: 8,
            kind: "Button".to_string(),
            target: TargetGroup::Widget,
        });

        let mut buf = Vec::new();
        write_candidates_csv(&mut buf, &[candidate]).unwrap();
        let rendered = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "source,file,line,kind,target");
        assert_eq!(lines[1], "Cancel,Weather/A.swift,3,Text,app");
        assert_eq!(lines[2], "Cancel,WeatherWidget/W.swift,8,Button,widget");
    }
}
