//! Persistence layer: `.xcstrings` string catalogs, the project manifest's
//! region list, `Info.plist` localization lists and `InfoPlist.strings`.
//!
//! All writes are full rewrites with deterministic ordering (diff-stable)
//! and go through `write_atomic`.

use std::path::Path;

use thiserror::Error;

mod manifest;
mod plist;
mod xcstrings;

pub use manifest::{derived_region, ensure_known_region, known_regions, normalize_language_code};
pub use plist::sync_bundle_localizations;
pub use xcstrings::{merge_catalog, sanitize_catalog, StringCatalog};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{path}: malformed catalog: {message}")]
    Parse { path: String, message: String },
    #[error("could not locate knownRegions block in {0}")]
    RegionsMissing(String),
    #[error("malformed knownRegions block in {0}")]
    RegionsMalformed(String),
    #[error("{path}: malformed plist: {message}")]
    Plist { path: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write via a temp file in the same directory, then rename over the
/// destination.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp~");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Escape a value for a `.strings` double-quoted literal.
pub fn escape_strings_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the localized permission-description file for one language:
/// exactly the required keys, in a fixed order.
pub fn render_permission_strings<'a>(
    keys: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut out = String::new();
    for (key, value) in keys {
        out.push_str(&format!("\"{}\" = \"{}\";\n", key, escape_strings_literal(value)));
    }
    out
}
