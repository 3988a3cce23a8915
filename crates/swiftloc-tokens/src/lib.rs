use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// printf-style specifier: optional positional index, flags, width,
/// precision, conversion character (`%d`, `%@`, `%1$d`, `%.1f`, ...).
const PLACEHOLDER_PATTERN: &str = r"%(?:\d+\$)?[#+0\- ]*(?:\d+)?(?:\.\d+)?[a-zA-Z@]";

/// Swift string interpolation span: `\(expr)`.
const INTERPOLATION_PATTERN: &str = r"\\\([^\)]+\)";

/// Unit symbols a translation must carry over verbatim.
const UNITS: [&str; 2] = ["°F", "°C"];

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).unwrap())
}

fn interpolation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INTERPOLATION_PATTERN).unwrap())
}

/// Structural signature of a string. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Ordered; duplicates kept. Positional specifiers may encode argument
    /// order, so reordering is a mismatch.
    pub placeholders: Vec<String>,
    /// Ordered interpolation spans, full token text.
    pub interpolations: Vec<String>,
    /// Which unit symbols occur, in probe order.
    pub units: Vec<&'static str>,
}

pub fn fingerprint(text: &str) -> Fingerprint {
    Fingerprint {
        placeholders: placeholder_re()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
        interpolations: interpolation_re()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
        units: UNITS.iter().copied().filter(|u| text.contains(u)).collect(),
    }
}

/// Why a candidate translation was rejected. At most one reason is reported
/// per pair, in the priority order of the variants below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("placeholder mismatch: expected {expected:?}, got {got:?}")]
    PlaceholderMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("interpolation mismatch: expected {expected:?}, got {got:?}")]
    InterpolationMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("unit mismatch: expected {expected:?}, got {got:?}")]
    UnitMismatch {
        expected: Vec<&'static str>,
        got: Vec<&'static str>,
    },
    #[error("empty translation")]
    EmptyTranslation,
    #[error("no translation returned")]
    MissingTranslation,
}

impl ValidationIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationIssue::PlaceholderMismatch { .. } => "placeholder-mismatch",
            ValidationIssue::InterpolationMismatch { .. } => "interpolation-mismatch",
            ValidationIssue::UnitMismatch { .. } => "unit-mismatch",
            ValidationIssue::EmptyTranslation => "empty-translation",
            ValidationIssue::MissingTranslation => "missing-translation",
        }
    }
}

/// Compare structural fingerprints between a source string and a candidate
/// translation. Any mismatch invalidates the pair; no partial credit.
pub fn validate(source: &str, candidate: &str) -> Result<(), ValidationIssue> {
    let src = fingerprint(source);
    let dst = fingerprint(candidate);

    if src.placeholders != dst.placeholders {
        return Err(ValidationIssue::PlaceholderMismatch {
            expected: src.placeholders,
            got: dst.placeholders,
        });
    }
    if src.interpolations != dst.interpolations {
        return Err(ValidationIssue::InterpolationMismatch {
            expected: src.interpolations,
            got: dst.interpolations,
        });
    }
    if src.units != dst.units {
        return Err(ValidationIssue::UnitMismatch {
            expected: src.units,
            got: dst.units,
        });
    }
    if candidate.trim().is_empty() {
        return Err(ValidationIssue::EmptyTranslation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_always_validates() {
        for s in [
            "Search %d cities",
            "Delete \\(city.name)?",
            "%1$@ / %2$@ at %d",
            "High: 75°F",
            "plain text",
        ] {
            assert_eq!(validate(s, s), Ok(()), "identity failed for {s:?}");
        }
    }

    #[test]
    fn preserved_placeholder_passes() {
        assert_eq!(validate("Search %d cities", "Buscar %d ciudades"), Ok(()));
    }

    #[test]
    fn dropped_interpolation_is_rejected() {
        let err = validate("Delete \\(city.name)?", "¿Eliminar la ciudad?").unwrap_err();
        assert!(matches!(err, ValidationIssue::InterpolationMismatch { .. }));
    }

    #[test]
    fn reordered_interpolations_are_a_mismatch_even_with_equal_sets() {
        let source = "\\(a) to \\(b)";
        let swapped = "\\(b) to \\(a)";
        let err = validate(source, swapped).unwrap_err();
        assert!(matches!(err, ValidationIssue::InterpolationMismatch { .. }));
    }

    #[test]
    fn reordered_positional_placeholders_are_a_mismatch() {
        let err = validate("%1$@ in %2$@", "%2$@ in %1$@").unwrap_err();
        assert!(matches!(err, ValidationIssue::PlaceholderMismatch { .. }));
    }

    #[test]
    fn unit_swap_is_rejected() {
        let err = validate("Now 20°C", "Now 68°F").unwrap_err();
        assert!(matches!(err, ValidationIssue::UnitMismatch { .. }));
    }

    #[test]
    fn placeholder_check_wins_when_several_mismatches_cooccur() {
        // Both the placeholder and the unit are broken; only the
        // highest-priority reason surfaces.
        let err = validate("%d°C", "grados").unwrap_err();
        assert!(matches!(err, ValidationIssue::PlaceholderMismatch { .. }));
    }

    #[test]
    fn whitespace_only_translation_is_empty() {
        assert_eq!(
            validate("Cancel", "   "),
            Err(ValidationIssue::EmptyTranslation)
        );
    }

    #[test]
    fn fingerprint_keeps_duplicate_placeholders() {
        let fp = fingerprint("%@: %@ / %@");
        assert_eq!(fp.placeholders, vec!["%@", "%@", "%@"]);
    }

    #[test]
    fn fingerprint_flags_and_width_are_part_of_the_token() {
        let fp = fingerprint("pad %-5d and %.2f");
        assert_eq!(fp.placeholders, vec!["%-5d", "%.2f"]);
    }
}
