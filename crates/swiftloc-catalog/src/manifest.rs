//! Region/locale registration in the Xcode project manifest.
//!
//! The `knownRegions = ( ... );` block is a small keyed configuration store
//! with read-modify-write semantics; it is read then rewritten at most once
//! per run, and only when the region list actually changes.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::{write_atomic, CatalogError};

const BASE_REGION: &str = "Base";

/// `pt_BR` and `pt-BR` are the same tag.
pub fn normalize_language_code(code: &str) -> String {
    code.replace('_', "-")
}

/// Region code derived from a language tag: the part after the first
/// hyphen, or the whole tag uppercased when there is none.
pub fn derived_region(language: &str) -> String {
    match language.split_once('-') {
        Some((_, region)) => region.to_uppercase(),
        None => language.to_uppercase(),
    }
}

fn find_regions_block(lines: &[String], path: &Path) -> Result<(usize, usize), CatalogError> {
    let start = lines
        .iter()
        .position(|l| l.contains("knownRegions = ("))
        .ok_or_else(|| CatalogError::RegionsMissing(path.display().to_string()))?;
    let end = lines
        .iter()
        .skip(start + 1)
        .position(|l| l.trim() == ");")
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| CatalogError::RegionsMalformed(path.display().to_string()))?;
    Ok((start, end))
}

fn normalize_region(token: &str) -> String {
    token.trim().trim_end_matches(',').trim_matches('"').trim().to_string()
}

fn format_region(region: &str) -> String {
    let bare = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
    if bare.is_match(region) {
        region.to_string()
    } else {
        format!("\"{region}\"")
    }
}

fn parse_regions(lines: &[String], start: usize, end: usize) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for line in &lines[start + 1..end] {
        let region = normalize_region(line);
        if !region.is_empty() && !unique.contains(&region) {
            unique.push(region);
        }
    }
    unique
}

/// Current region list, deduped in file order.
pub fn known_regions(pbx_path: &Path) -> Result<Vec<String>, CatalogError> {
    let content = std::fs::read_to_string(pbx_path)?;
    let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let (start, end) = find_regions_block(&lines, pbx_path)?;
    Ok(parse_regions(&lines, start, end))
}

/// Register `language` in the knownRegions block, keeping the `Base`
/// sentinel last when present. Returns whether the manifest changed.
pub fn ensure_known_region(pbx_path: &Path, language: &str) -> Result<bool, CatalogError> {
    let content = std::fs::read_to_string(pbx_path)?;
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let (start, end) = find_regions_block(&lines, pbx_path)?;

    let mut regions = parse_regions(&lines, start, end);
    if !regions.iter().any(|r| r == language) {
        match regions.iter().position(|r| r == BASE_REGION) {
            Some(base_idx) => regions.insert(base_idx, language.to_string()),
            None => regions.push(language.to_string()),
        }
    }
    if regions.iter().any(|r| r == BASE_REGION) {
        regions.retain(|r| r != BASE_REGION);
        regions.push(BASE_REGION.to_string());
    }

    let new_block: Vec<String> = regions
        .iter()
        .map(|r| format!("\t\t\t\t{},", format_region(r)))
        .collect();
    let changed = lines[start + 1..end] != new_block[..];
    if changed {
        lines.splice(start + 1..end, new_block);
        let mut rendered = lines.join("\n");
        rendered.push('\n');
        write_atomic(pbx_path, rendered.as_bytes())?;
        debug!(event = "known_regions_updated", language = language, path = %pbx_path.display());
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PBX: &str = "// !$*UTF8*$!\n\
        \t\t\tknownRegions = (\n\
        \t\t\t\ten,\n\
        \t\t\t\tBase,\n\
        \t\t\t);\n\
        \t\t\tmainGroup = ABC;\n";

    fn write_pbx(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn derived_region_uses_subtag_or_uppercases() {
        assert_eq!(derived_region("pt-BR"), "BR");
        assert_eq!(derived_region("fr"), "FR");
        assert_eq!(normalize_language_code("pt_BR"), "pt-BR");
    }

    #[test]
    fn adds_language_before_base_sentinel() {
        let (_dir, path) = write_pbx(PBX);
        assert!(ensure_known_region(&path, "pt-BR").unwrap());
        assert_eq!(known_regions(&path).unwrap(), vec!["en", "pt-BR", "Base"]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\t\t\t\t\"pt-BR\","));
        assert!(content.contains("mainGroup = ABC;"));
    }

    #[test]
    fn re_adding_an_existing_language_is_a_noop() {
        let (_dir, path) = write_pbx(PBX);
        ensure_known_region(&path, "de").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(!ensure_known_region(&path, "de").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn bare_tokens_stay_unquoted() {
        let (_dir, path) = write_pbx(PBX);
        ensure_known_region(&path, "de").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\t\t\t\tde,"));
        assert!(!content.contains("\"de\""));
    }

    #[test]
    fn missing_block_is_an_error() {
        let (_dir, path) = write_pbx("no regions here\n");
        let err = ensure_known_region(&path, "de").unwrap_err();
        assert!(matches!(err, CatalogError::RegionsMissing(_)));
    }

    #[test]
    fn unterminated_block_is_malformed() {
        let (_dir, path) = write_pbx("knownRegions = (\nen,\n");
        let err = known_regions(&path).unwrap_err();
        assert!(matches!(err, CatalogError::RegionsMalformed(_)));
    }
}
