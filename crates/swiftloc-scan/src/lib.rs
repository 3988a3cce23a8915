//! Line-oriented extraction of user-facing literals from Swift sources and
//! the Xcode project manifest, plus aggregation into ordered candidates.
//!
//! Scanning is deliberately textual: no Swift parse is attempted. Multi-line
//! literals are accepted false negatives; false positives are suppressed by
//! the icon deny-list and the translatability pre-filters.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use swiftloc_core::{Candidate, OriginContext, TargetGroup};
use thiserror::Error;

mod filter;
pub use filter::{AcceptAll, KeywordDiacriticFilter, SourceLanguageFilter};

/// Permission description keys that must both be present in the manifest.
pub const REQUIRED_PERMISSION_KEYS: [&str; 2] = [
    "NSLocationAlwaysAndWhenInUseUsageDescription",
    "NSLocationWhenInUseUsageDescription",
];

/// SF Symbol identifiers and similar non-text tokens that the patterns
/// would otherwise pick up.
const SKIP_LITERALS: [&str; 24] = [
    "doc.text.magnifyingglass",
    "magnifyingglass",
    "arrow.triangle.2.circlepath",
    "plus.circle.fill",
    "arrow.left.arrow.right",
    "doc.text",
    "doc.badge.gearshape",
    "trash",
    "location.fill",
    "clock.fill",
    "arrow.counterclockwise",
    "globe.americas.fill",
    "mappin.slash",
    "mappin.circle.fill",
    "xmark.circle.fill",
    "line.3.horizontal",
    "lock.fill",
    "thermometer.medium",
    "equal",
    "chevron.right",
    "xmark",
    "clock",
    "gear",
    "ellipsis.circle",
];

/// One extraction rule: a UI construct label and the pattern that captures
/// its literal. Rules are data so new constructs can be added without
/// touching aggregation or validation.
#[derive(Debug)]
pub struct ExtractRule {
    pub kind: &'static str,
    pub regex: Regex,
}

const LIT: &str = r#"((?:\\.|[^"\\])*)"#;

/// Fixed ordered list of user-facing constructs. Only the first match per
/// rule per line is taken.
pub fn extract_rules() -> Vec<ExtractRule> {
    let specs: [(&str, String); 13] = [
        ("Text", format!(r#"\bText\(\s*"{LIT}""#)),
        ("Label", format!(r#"\bLabel\(\s*"{LIT}"\s*,\s*systemImage:"#)),
        ("Button", format!(r#"\bButton\(\s*"{LIT}""#)),
        ("navigationTitle", format!(r#"\.navigationTitle\(\s*"{LIT}"\s*\)"#)),
        ("accessibilityLabel", format!(r#"\.accessibilityLabel\(\s*"{LIT}"\s*\)"#)),
        ("accessibilityHint", format!(r#"\.accessibilityHint\(\s*"{LIT}"\s*\)"#)),
        ("alert", format!(r#"\.alert\(\s*"{LIT}""#)),
        ("TextField", format!(r#"\bTextField\(\s*"{LIT}""#)),
        ("searchPrompt", format!(r#"\bprompt\s*:\s*"{LIT}""#)),
        ("widgetConfigName", format!(r#"\.configurationDisplayName\(\s*"{LIT}"\s*\)"#)),
        ("widgetConfigDescription", format!(r#"\.description\(\s*"{LIT}"\s*\)"#)),
        ("NSLocalizedString", format!(r#"NSLocalizedString\(\s*"{LIT}""#)),
        ("errorMessageAssign", format!(r#"\berrorMessage\s*=\s*"{LIT}""#)),
    ];
    specs
        .into_iter()
        .map(|(kind, pattern)| ExtractRule {
            kind,
            regex: Regex::new(&pattern).unwrap(),
        })
        .collect()
}

fn manifest_key_re() -> Regex {
    Regex::new(
        r#"INFOPLIST_KEY_(NSLocationAlwaysAndWhenInUseUsageDescription|NSLocationWhenInUseUsageDescription)\s*=\s*"((?:\\.|[^"\\])*)";"#,
    )
    .unwrap()
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("missing required usage description keys in manifest: {missing:?}")]
    MissingPermissionKeys { missing: Vec<String> },
}

/// Cheap pre-filters, not semantic judgements about translatability.
pub fn looks_translatable(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if SKIP_LITERALS.contains(&text) {
        return false;
    }
    // Bare format keys such as "%lld" or "%@: %@ / %@" are auto-extracted
    // internals and can break string-symbol generation.
    if text.trim_start().starts_with('%') {
        return false;
    }
    if text.starts_with("\\(") {
        return false;
    }
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Scan one Swift file's content. Pure: content in, (text, context) out.
pub fn scan_swift_source(
    content: &str,
    rel_path: &str,
    target: TargetGroup,
    rules: &[ExtractRule],
    filter: &dyn SourceLanguageFilter,
) -> Vec<(String, OriginContext)> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim_start().starts_with("//") {
            continue;
        }
        for rule in rules {
            let Some(caps) = rule.regex.captures(line) else {
                continue;
            };
            let literal = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if !looks_translatable(literal) || !filter.accepts(literal) {
                continue;
            }
            out.push((
                literal.to_string(),
                OriginContext {
                    file: rel_path.to_string(),
                    line: idx + 1,
                    kind: rule.kind.to_string(),
                    target,
                },
            ));
        }
    }
    out
}

/// Scan the project manifest for permission description assignments.
/// Returns the extracted pairs plus a key -> value map of the descriptions
/// (first assignment wins). Presence of the required keys is checked
/// separately via [`ensure_permission_keys`].
pub fn scan_manifest(
    content: &str,
    rel_path: &str,
    filter: &dyn SourceLanguageFilter,
) -> (Vec<(String, OriginContext)>, BTreeMap<String, String>) {
    let re = manifest_key_re();
    let mut by_key: BTreeMap<String, String> = BTreeMap::new();
    let mut out = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        by_key
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        if looks_translatable(value) && filter.accepts(value) {
            out.push((
                value.to_string(),
                OriginContext {
                    file: rel_path.to_string(),
                    line: idx + 1,
                    kind: "InfoPlistUsageDescription".to_string(),
                    target: TargetGroup::App,
                },
            ));
        }
    }

    (out, by_key)
}

/// Fail fast when a required usage description key is absent, before any
/// network activity.
pub fn ensure_permission_keys(by_key: &BTreeMap<String, String>) -> Result<(), ScanError> {
    let missing: Vec<String> = REQUIRED_PERMISSION_KEYS
        .iter()
        .filter(|k| !by_key.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScanError::MissingPermissionKeys { missing })
    }
}

fn context_key(ctx: &OriginContext) -> String {
    format!("{}|{}|{}|{}", ctx.file, ctx.line, ctx.kind, ctx.target)
}

/// Group extracted pairs by exact text, dedupe contexts, and return
/// candidates in case-insensitive lexical order of source text. This
/// ordering keeps batch boundaries and artifact diffs stable across runs.
pub fn aggregate(pairs: Vec<(String, OriginContext)>) -> Vec<Candidate> {
    let mut grouped: HashMap<String, Vec<OriginContext>> = HashMap::new();
    for (text, ctx) in pairs {
        grouped.entry(text).or_default().push(ctx);
    }

    let mut result: Vec<Candidate> = grouped
        .into_iter()
        .map(|(source, contexts)| {
            let mut seen: HashSet<String> = HashSet::new();
            let mut unique: Vec<OriginContext> = contexts
                .into_iter()
                .filter(|c| seen.insert(context_key(c)))
                .collect();
            unique.sort();
            Candidate {
                source,
                contexts: unique,
            }
        })
        .collect();
    result.sort_by(|a, b| {
        a.source
            .to_lowercase()
            .cmp(&b.source.to_lowercase())
            .then_with(|| a.source.cmp(&b.source))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(file: &str, line: usize, kind: &str, target: TargetGroup) -> OriginContext {
        OriginContext {
            file: file.to_string(),
            line,
            kind: kind.to_string(),
            target,
        }
    }

    #[test]
    fn extracts_text_and_button_literals() {
        let src = r#"
            Text("Add City")
            Button("Cancel") { dismiss() }
            // Text("commented out")
        "#;
        let pairs = scan_swift_source(src, "App/View.swift", TargetGroup::App, &extract_rules(), &AcceptAll);
        let texts: Vec<&str> = pairs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["Add City", "Cancel"]);
        assert_eq!(pairs[0].1.kind, "Text");
        assert_eq!(pairs[0].1.line, 2);
    }

    #[test]
    fn label_requires_system_image_argument() {
        let src = r#"Label("Settings", systemImage: "gear")"#;
        let pairs = scan_swift_source(src, "a.swift", TargetGroup::App, &extract_rules(), &AcceptAll);
        assert!(pairs.iter().any(|(t, c)| t == "Settings" && c.kind == "Label"));
        // The icon identifier itself is deny-listed.
        assert!(!pairs.iter().any(|(t, _)| t == "gear"));
    }

    #[test]
    fn only_first_match_per_rule_per_line() {
        let src = r#"Text("One"); Text("Two")"#;
        let pairs = scan_swift_source(src, "a.swift", TargetGroup::App, &extract_rules(), &AcceptAll);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "One");
    }

    #[test]
    fn pre_filters_exclude_format_and_interpolation_only_strings() {
        assert!(!looks_translatable("%lld"));
        assert!(!looks_translatable("%@: %@ / %@"));
        assert!(!looks_translatable("\\(count)"));
        assert!(!looks_translatable("  "));
        assert!(!looks_translatable("123 456"));
        assert!(looks_translatable("Search %d cities"));
    }

    #[test]
    fn manifest_scan_requires_both_permission_keys() {
        let content = r#"
            INFOPLIST_KEY_NSLocationWhenInUseUsageDescription = "Shows local weather.";
        "#;
        let (_, by_key) = scan_manifest(content, "project.pbxproj", &AcceptAll);
        let err = ensure_permission_keys(&by_key).unwrap_err();
        match err {
            ScanError::MissingPermissionKeys { missing } => {
                assert_eq!(
                    missing,
                    vec!["NSLocationAlwaysAndWhenInUseUsageDescription".to_string()]
                );
            }
        }
    }

    #[test]
    fn manifest_scan_collects_descriptions() {
        let content = concat!(
            "INFOPLIST_KEY_NSLocationAlwaysAndWhenInUseUsageDescription = \"Always access.\";\n",
            "INFOPLIST_KEY_NSLocationWhenInUseUsageDescription = \"In use access.\";\n",
            "INFOPLIST_KEY_NSLocationWhenInUseUsageDescription = \"In use access.\";\n",
        );
        let (pairs, by_key) = scan_manifest(content, "project.pbxproj", &AcceptAll);
        ensure_permission_keys(&by_key).unwrap();
        assert_eq!(by_key.len(), 2);
        assert_eq!(by_key["NSLocationWhenInUseUsageDescription"], "In use access.");
        // Duplicate assignment lines each produce a context.
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|(_, c)| c.kind == "InfoPlistUsageDescription"));
    }

    #[test]
    fn aggregate_dedupes_contexts_and_sorts_case_insensitively() {
        let pairs = vec![
            ("cancel".to_string(), ctx("b.swift", 2, "Button", TargetGroup::App)),
            ("Add".to_string(), ctx("a.swift", 1, "Text", TargetGroup::App)),
            ("cancel".to_string(), ctx("b.swift", 2, "Button", TargetGroup::App)),
            ("Cancel".to_string(), ctx("w.swift", 9, "Button", TargetGroup::Widget)),
        ];
        let candidates = aggregate(pairs);
        let sources: Vec<&str> = candidates.iter().map(|c| c.source.as_str()).collect();
        assert_eq!(sources, vec!["Add", "Cancel", "cancel"]);
        assert_eq!(candidates[2].contexts.len(), 1);
    }

    #[test]
    fn same_string_in_two_targets_is_one_candidate_with_two_contexts() {
        let pairs = vec![
            ("Cancel".to_string(), ctx("App/A.swift", 4, "Button", TargetGroup::App)),
            ("Cancel".to_string(), ctx("Widget/W.swift", 8, "Button", TargetGroup::Widget)),
        ];
        let candidates = aggregate(pairs);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].contexts.len(), 2);
        assert!(candidates[0].contexts.iter().any(|c| c.target == TargetGroup::App));
        assert!(candidates[0].contexts.iter().any(|c| c.target == TargetGroup::Widget));
    }

    #[test]
    fn scan_order_is_deterministic_across_runs() {
        let src = r#"
            Text("Zebra")
            Text("apple")
            Button("Mango")
        "#;
        let run = || {
            aggregate(scan_swift_source(
                src,
                "a.swift",
                TargetGroup::App,
                &extract_rules(),
                &AcceptAll,
            ))
        };
        let first: Vec<String> = run().into_iter().map(|c| c.source).collect();
        let second: Vec<String> = run().into_iter().map(|c| c.source).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["apple", "Mango", "Zebra"]);
    }
}
