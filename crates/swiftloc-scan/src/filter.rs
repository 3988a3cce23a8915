//! Source-language detection as a replaceable filter.
//!
//! The keyword/diacritic heuristic is a coarse classifier with no
//! precision/recall guarantee; callers that need better recall can plug in
//! their own implementation at the scan seam.

/// Decides whether a literal belongs to the language being migrated.
pub trait SourceLanguageFilter {
    fn accepts(&self, text: &str) -> bool;
}

/// Passes everything through. Used when onboarding from the project's base
/// language, where every user-facing literal is a candidate.
pub struct AcceptAll;

impl SourceLanguageFilter for AcceptAll {
    fn accepts(&self, _text: &str) -> bool {
        true
    }
}

/// Accepts a literal when it contains one of the language's diacritics or a
/// known keyword (matched case-insensitively as a substring).
pub struct KeywordDiacriticFilter {
    keywords: Vec<String>,
    diacritics: Vec<char>,
}

impl KeywordDiacriticFilter {
    pub fn new<I, S>(keywords: I, diacritics: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.into().to_lowercase()).collect(),
            diacritics: diacritics.chars().collect(),
        }
    }

    /// Stock heuristic for Spanish UI copy.
    pub fn spanish() -> Self {
        Self::new(
            [
                "agregar",
                "busca",
                "buscar",
                "ciudad",
                "ciudades",
                "cancelar",
                "actualizar",
                "zona horaria",
                "conversor",
                "sin resultados",
                "intenta",
                "permiso",
                "ubicación",
                "ajustes",
                "muestra",
                "desliza",
                "tiempo mundial",
                "cerrar",
                "limpiar",
                "máximo",
                "esta ciudad",
                "no se pudo",
                "obteniendo",
                "solicitando",
                "lugar",
                "lugares",
            ],
            "áéíóúñ¿¡",
        )
    }
}

impl SourceLanguageFilter for KeywordDiacriticFilter {
    fn accepts(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        if lower.chars().any(|c| self.diacritics.contains(&c)) {
            return true;
        }
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}
