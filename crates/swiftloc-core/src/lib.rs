use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Which shipped deliverable consumes a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetGroup {
    App,
    Widget,
}

impl TargetGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetGroup::App => "app",
            TargetGroup::Widget => "widget",
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetGroup {
    type Err = SwiftLocError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "app" => Ok(TargetGroup::App),
            "widget" => Ok(TargetGroup::Widget),
            other => Err(SwiftLocError::UnknownTargetGroup(other.to_string())),
        }
    }
}

/// One point of use of a user-facing string. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginContext {
    /// Path relative to the project root.
    pub file: String,
    /// 1-based line number; 0 for logical positions (e.g. catalog keys).
    pub line: usize,
    /// Extraction rule that matched ("Text", "Button", "xcstrings_key", ...).
    pub kind: String,
    pub target: TargetGroup,
}

/// A unique source text awaiting translation, with all its points of use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub source: String,
    pub contexts: Vec<OriginContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Translated,
    Fallback,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Translated => "translated",
            RowStatus::Fallback => "fallback",
        }
    }
}

/// Final outcome for one candidate after the retry loop. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRow {
    pub source: String,
    pub target: String,
    pub status: RowStatus,
    /// "ok", "fallback_due_to_validation" or "fallback_missing_translation".
    pub validation: String,
    pub contexts: Vec<OriginContext>,
}

impl TranslationRow {
    pub fn is_for(&self, target: TargetGroup) -> bool {
        self.contexts.iter().any(|c| c.target == target)
    }
}

#[derive(Debug, Error)]
pub enum SwiftLocError {
    #[error("unknown target group: {0} (expected app or widget)")]
    UnknownTargetGroup(String),
    #[error("{0}")]
    Other(String),
}
