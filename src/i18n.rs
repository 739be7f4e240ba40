use serde_json::json;

/// UI languages the report texts are available in. English is the base
/// language and the fallback for any unsupported code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Es,
    Ca,
}

impl Language {
    /// Parse a language code, falling back to English for anything
    /// unsupported. Accepts region suffixes ("es-ES").
    pub fn from_code(code: &str) -> Self {
        match code
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "es" => Language::Es,
            "ca" => Language::Ca,
            _ => Language::En,
        }
    }

    pub fn is_supported(code: &str) -> bool {
        matches!(code, "en" | "es" | "ca")
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Ca => "ca",
        }
    }
}

/// UI string catalog served by the translations endpoint. Returns None
/// for unsupported language codes so the HTTP layer can 404.
pub fn ui_catalog(code: &str) -> Option<serde_json::Value> {
    if !Language::is_supported(code) {
        return None;
    }
    let lang = Language::from_code(code);
    let t = |en: &str, es: &str, ca: &str| match lang {
        Language::En => en.to_string(),
        Language::Es => es.to_string(),
        Language::Ca => ca.to_string(),
    };
    Some(json!({
        "language": lang.code(),
        "app_title": t("Phishing Analyzer", "Analizador de Phishing", "Analitzador de Phishing"),
        "paste_prompt": t(
            "Paste the suspicious message here",
            "Pega aquí el mensaje sospechoso",
            "Enganxa aquí el missatge sospitós"
        ),
        "upload_prompt": t(
            "Or upload an .eml file",
            "O sube un archivo .eml",
            "O puja un fitxer .eml"
        ),
        "analyze_button": t("Analyze", "Analizar", "Analitza"),
        "risk_heading": t("Risk level", "Nivel de riesgo", "Nivell de risc"),
        "findings_heading": t("Findings", "Hallazgos", "Troballes"),
        "no_findings": t(
            "No phishing indicators were found.",
            "No se han encontrado indicadores de phishing.",
            "No s'han trobat indicadors de phishing."
        ),
        "risk_labels": {
            "low": t("Low", "Bajo", "Baix"),
            "medium": t("Medium", "Medio", "Mitjà"),
            "high": t("High", "Alto", "Alt"),
            "critical": t("Critical", "Crítico", "Crític"),
        },
        "errors": {
            "empty_text": t("No text provided", "No se ha proporcionado texto", "No s'ha proporcionat text"),
            "bad_file": t("File must be .eml", "El archivo debe ser .eml", "El fitxer ha de ser .eml"),
            "parse_failed": t(
                "The message could not be parsed",
                "No se ha podido interpretar el mensaje",
                "No s'ha pogut interpretar el missatge"
            ),
        },
    }))
}
