use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwiftLocConfig {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    pub max_retries: Option<usize>,
    pub include_targets: Option<Vec<String>>,
    pub project: Option<ProjectCfg>,
    pub translate: Option<TranslateCfg>,
    pub filter: Option<FilterCfg>,
}

/// Where the project's pieces live, relative to the scan root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectCfg {
    pub app_dir: Option<String>,
    pub widget_dir: Option<String>,
    pub xcodeproj: Option<String>,
    pub info_plists: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateCfg {
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub cache_size: Option<usize>,
}

/// Keyword/diacritic lists for the source-language heuristic used by the
/// guardrail check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterCfg {
    pub keywords: Option<Vec<String>>,
    pub diacritics: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Search order: CWD/swiftloc.toml, then $CONFIG_DIR/swiftloc/swiftloc.toml.
/// Earlier layers win per field.
pub fn load_config() -> Result<SwiftLocConfig, ConfigError> {
    let mut merged = SwiftLocConfig::default();
    if let Ok(cwd) = std::env::current_dir() {
        merged = merge(merged, load_file(&cwd.join("swiftloc.toml")));
    }
    if let Some(base) = dirs::config_dir() {
        merged = merge(merged, load_file(&base.join("swiftloc").join("swiftloc.toml")));
    }
    Ok(merged)
}

fn load_file(path: &std::path::Path) -> SwiftLocConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| toml::from_str(&s).ok())
        .unwrap_or_default()
}

fn merge(mut a: SwiftLocConfig, b: SwiftLocConfig) -> SwiftLocConfig {
    if a.source_lang.is_none() {
        a.source_lang = b.source_lang;
    }
    if a.target_lang.is_none() {
        a.target_lang = b.target_lang;
    }
    if a.model.is_none() {
        a.model = b.model;
    }
    if a.batch_size.is_none() {
        a.batch_size = b.batch_size;
    }
    if a.max_retries.is_none() {
        a.max_retries = b.max_retries;
    }
    if a.include_targets.is_none() {
        a.include_targets = b.include_targets;
    }
    a.project = merge_opt(a.project, b.project, merge_project);
    a.translate = merge_opt(a.translate, b.translate, merge_translate);
    a.filter = merge_opt(a.filter, b.filter, merge_filter);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_project(mut a: ProjectCfg, b: ProjectCfg) -> ProjectCfg {
    if a.app_dir.is_none() {
        a.app_dir = b.app_dir;
    }
    if a.widget_dir.is_none() {
        a.widget_dir = b.widget_dir;
    }
    if a.xcodeproj.is_none() {
        a.xcodeproj = b.xcodeproj;
    }
    if a.info_plists.is_none() {
        a.info_plists = b.info_plists;
    }
    a
}

fn merge_translate(mut a: TranslateCfg, b: TranslateCfg) -> TranslateCfg {
    if a.endpoint.is_none() {
        a.endpoint = b.endpoint;
    }
    if a.timeout_ms.is_none() {
        a.timeout_ms = b.timeout_ms;
    }
    if a.cache_size.is_none() {
        a.cache_size = b.cache_size;
    }
    a
}

fn merge_filter(mut a: FilterCfg, b: FilterCfg) -> FilterCfg {
    if a.keywords.is_none() {
        a.keywords = b.keywords;
    }
    if a.diacritics.is_none() {
        a.diacritics = b.diacritics;
    }
    a
}
