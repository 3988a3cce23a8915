//! `.xcstrings` string catalog read/merge/sanitize.
//!
//! The catalog is keyed on exact source text. Entries unrelated to the
//! current merge are carried through untouched (unknown per-entry fields
//! survive via flattening); keys are rewritten in case-insensitive lexical
//! order on every merge so output stays diff-stable.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{write_atomic, CatalogError};

const CATALOG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringUnit {
    pub state: String,
    pub value: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Localization {
    #[serde(rename = "stringUnit")]
    pub string_unit: StringUnit,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "extractionState", skip_serializing_if = "Option::is_none")]
    pub extraction_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localizations: Option<BTreeMap<String, Localization>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CatalogEntry {
    fn localized_value(&self, language: &str) -> Option<&str> {
        self.localizations
            .as_ref()
            .and_then(|l| l.get(language))
            .map(|loc| loc.string_unit.value.as_str())
    }

    fn is_auto_generated(&self) -> bool {
        self.extra
            .get("isCommentAutoGenerated")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StringCatalog {
    #[serde(rename = "sourceLanguage")]
    pub source_language: String,
    #[serde(default)]
    pub strings: HashMap<String, CatalogEntry>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    CATALOG_VERSION.to_string()
}

impl Default for StringCatalog {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            strings: HashMap::new(),
            version: default_version(),
        }
    }
}

impl StringCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Translatable keys already present in the catalog.
    pub fn keys(&self) -> Vec<String> {
        self.strings.keys().cloned().collect()
    }

    /// Serialize with top-level key order sourceLanguage/strings/version and
    /// case-insensitive lexical ordering of string keys.
    fn render(&self) -> Result<Vec<u8>, CatalogError> {
        let mut keys: Vec<&String> = self.strings.keys().collect();
        keys.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

        let mut strings = serde_json::Map::new();
        for key in keys {
            let entry = serde_json::to_value(&self.strings[key]).map_err(|e| {
                CatalogError::Parse {
                    path: String::new(),
                    message: e.to_string(),
                }
            })?;
            strings.insert(key.clone(), entry);
        }

        let mut root = serde_json::Map::new();
        root.insert("sourceLanguage".into(), Value::String(self.source_language.clone()));
        root.insert("strings".into(), Value::Object(strings));
        root.insert("version".into(), Value::String(self.version.clone()));

        let mut out = serde_json::to_vec_pretty(&Value::Object(root)).map_err(|e| {
            CatalogError::Parse {
                path: String::new(),
                message: e.to_string(),
            }
        })?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let bytes = self.render()?;
        write_atomic(path, &bytes)?;
        Ok(())
    }
}

/// Apply (source -> localized value) pairs for `language` into the catalog
/// at `path`, creating it when absent. Returns the number of entries whose
/// stored value actually changed (new entry, or value differed). Re-applying
/// the same pairs is a no-op reporting zero.
pub fn merge_catalog(
    path: &Path,
    language: &str,
    pairs: &BTreeMap<String, String>,
) -> Result<usize, CatalogError> {
    let mut catalog = StringCatalog::load(path)?;
    catalog.version = CATALOG_VERSION.to_string();

    let mut changed = 0usize;
    for (source_key, localized_value) in pairs {
        let entry = catalog.strings.entry(source_key.clone()).or_default();
        if entry.extraction_state.is_none() {
            entry.extraction_state = Some("manual".to_string());
        }
        if entry.localized_value(language) != Some(localized_value.as_str()) {
            changed += 1;
        }
        entry.localizations.get_or_insert_with(BTreeMap::new).insert(
            language.to_string(),
            Localization {
                string_unit: StringUnit {
                    state: "translated".to_string(),
                    value: localized_value.clone(),
                    extra: serde_json::Map::new(),
                },
                extra: serde_json::Map::new(),
            },
        );
    }

    catalog.save(path)?;
    debug!(event = "catalog_merged", path = %path.display(), entries = pairs.len(), changed = changed);
    Ok(changed)
}

/// Remove risky localization metadata for auto-generated `%`-keys.
///
/// Auto-extracted keys that start with `%` can fail string-symbol
/// generation when marked manual or manually localized. This is the one
/// deliberate exception to never dropping data: only that key shape, only
/// for the given language.
pub fn sanitize_catalog(path: &Path, language: &str) -> Result<usize, CatalogError> {
    if !path.exists() {
        return Ok(0);
    }
    let mut catalog = StringCatalog::load(path)?;
    let mut changed = 0usize;

    for (key, entry) in catalog.strings.iter_mut() {
        if !key.starts_with('%') || !entry.is_auto_generated() {
            continue;
        }
        if entry.extraction_state.as_deref() == Some("manual") {
            entry.extraction_state = None;
            changed += 1;
        }
        if let Some(localizations) = entry.localizations.as_mut() {
            if localizations.remove(language).is_some() {
                changed += 1;
            }
        }
    }

    if changed > 0 {
        catalog.save(path)?;
    }
    Ok(changed)
}
