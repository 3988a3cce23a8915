//! `CFBundleLocalizations` sync for XML `Info.plist` files.
//!
//! The list is read with quick-xml, compared against the desired region
//! set, and spliced back as text so surrounding formatting is preserved.
//! Binary plists are out of scope.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::{write_atomic, CatalogError};

const KEY: &str = "CFBundleLocalizations";

/// Byte span of the `<array>...</array>` (or `<array/>`) that follows the
/// CFBundleLocalizations key, plus the current entries. None when the key
/// is absent.
struct LocalizationsArray {
    start: usize,
    end: usize,
    values: Vec<String>,
}

fn find_localizations(content: &str, path: &Path) -> Result<Option<LocalizationsArray>, CatalogError> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();

    let mut in_key = false;
    let mut key_seen = false;
    let mut array_start: Option<usize> = None;
    let mut in_string = false;
    let mut values: Vec<String> = Vec::new();

    loop {
        let pos_before = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"key" => in_key = true,
                b"array" if key_seen => {
                    // buffer_position is past the tag; back up over it.
                    array_start.get_or_insert(pos_before);
                }
                b"string" if key_seen && array_start.is_some() => in_string = true,
                _ if key_seen && array_start.is_none() => {
                    // Some other value type follows the key; treat as absent.
                    key_seen = false;
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if key_seen && e.name().as_ref() == b"array" {
                    return Ok(Some(LocalizationsArray {
                        start: pos_before,
                        end: reader.buffer_position() as usize,
                        values,
                    }));
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| CatalogError::Plist {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?
                    .into_owned();
                if in_key {
                    key_seen = text == KEY;
                } else if in_string {
                    values.push(text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"key" => in_key = false,
                b"string" => in_string = false,
                b"array" => {
                    if let Some(start) = array_start {
                        return Ok(Some(LocalizationsArray {
                            start,
                            end: reader.buffer_position() as usize,
                            values,
                        }));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => {
                return Err(CatalogError::Plist {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
}

fn render_array(localizations: &[String], indent: &str) -> String {
    let mut out = String::from("<array>\n");
    for lang in localizations {
        out.push_str(&format!("{indent}\t<string>{lang}</string>\n"));
    }
    out.push_str(&format!("{indent}</array>"));
    out
}

fn indent_of(content: &str, pos: usize) -> String {
    let line_start = content[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    content[line_start..pos]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect()
}

fn sync_one(path: &Path, localizations: &[String]) -> Result<bool, CatalogError> {
    let content = std::fs::read_to_string(path)?;

    let updated = match find_localizations(&content, path)? {
        Some(found) => {
            if found.values == localizations {
                return Ok(false);
            }
            let indent = indent_of(&content, found.start);
            format!(
                "{}{}{}",
                &content[..found.start],
                render_array(localizations, &indent),
                &content[found.end..]
            )
        }
        None => {
            // Insert the key before the top-level dict's closing tag.
            let close = content.rfind("</dict>").ok_or_else(|| CatalogError::Plist {
                path: path.display().to_string(),
                message: "no </dict> element".to_string(),
            })?;
            let indent = "\t";
            format!(
                "{}{indent}<key>{KEY}</key>\n{indent}{}\n{}",
                &content[..close],
                render_array(localizations, indent),
                &content[close..]
            )
        }
    };

    write_atomic(path, updated.as_bytes())?;
    debug!(event = "plist_localizations_synced", path = %path.display());
    Ok(true)
}

/// Set every plist's `CFBundleLocalizations` to the known regions minus the
/// `Base` sentinel. Returns how many files were actually rewritten.
pub fn sync_bundle_localizations(
    plist_paths: &[PathBuf],
    regions: &[String],
) -> Result<usize, CatalogError> {
    let localizations: Vec<String> = regions.iter().filter(|r| *r != "Base").cloned().collect();
    let mut changed = 0usize;
    for path in plist_paths {
        if sync_one(path, &localizations)? {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PLIST_WITH_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>CFBundleName</key>
	<string>Weather</string>
	<key>CFBundleLocalizations</key>
	<array>
		<string>en</string>
	</array>
</dict>
</plist>
"#;

    const PLIST_WITHOUT_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>CFBundleName</key>
	<string>Weather</string>
</dict>
</plist>
"#;

    fn regions(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn rewrites_existing_list_excluding_base() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        std::fs::write(&path, PLIST_WITH_LIST).unwrap();

        let changed =
            sync_bundle_localizations(&[path.clone()], &regions(&["en", "pt-BR", "Base"])).unwrap();
        assert_eq!(changed, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<string>en</string>"));
        assert!(content.contains("<string>pt-BR</string>"));
        assert!(!content.contains("<string>Base</string>"));
        // Unrelated keys survive.
        assert!(content.contains("<string>Weather</string>"));
    }

    #[test]
    fn up_to_date_plist_is_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        std::fs::write(&path, PLIST_WITH_LIST).unwrap();

        let changed = sync_bundle_localizations(&[path.clone()], &regions(&["en"])).unwrap();
        assert_eq!(changed, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PLIST_WITH_LIST);
    }

    #[test]
    fn missing_key_is_inserted_before_dict_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Info.plist");
        std::fs::write(&path, PLIST_WITHOUT_LIST).unwrap();

        let changed =
            sync_bundle_localizations(&[path.clone()], &regions(&["en", "de"])).unwrap();
        assert_eq!(changed, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<key>CFBundleLocalizations</key>"));
        assert!(content.contains("<string>de</string>"));
        // Still parseable: a second sync with the same regions is a no-op.
        let again = sync_bundle_localizations(&[path.clone()], &regions(&["en", "de"])).unwrap();
        assert_eq!(again, 0);
    }
}
