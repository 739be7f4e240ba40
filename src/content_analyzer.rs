use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::analyzer::Analyzer;
use crate::document::Document;
use crate::i18n::Language;
use crate::model::{Alarm, Severity};

pub const NAME: &str = "content_analyzer";

/// Body text is checked against every supported language's tables no
/// matter which UI language was requested: phishing text mixes languages.
const CHECK_LANGUAGES: [Language; 3] = [Language::En, Language::Es, Language::Ca];

// ---------------------------------------------------------------------------
// Keyword and pattern tables. Versioned detection data, not logic; kept
// per-language so localization updates never touch the matching code.
// ---------------------------------------------------------------------------

const URGENCY_KEYWORDS_EN: &[&str] = &[
    "urgent",
    "immediately",
    "account suspended",
    "account will be closed",
    "verify your account",
    "confirm your identity",
    "unauthorized access",
    "suspicious activity",
    "limited time",
    "act now",
    "expire",
    "within 24 hours",
    "within 48 hours",
    "your account has been",
];

const URGENCY_KEYWORDS_ES: &[&str] = &[
    "urgente",
    "inmediatamente",
    "cuenta suspendida",
    "cuenta será cerrada",
    "verifica tu cuenta",
    "confirma tu identidad",
    "acceso no autorizado",
    "actividad sospechosa",
    "tiempo limitado",
    "actúa ahora",
    "expirar",
    "en 24 horas",
    "en 48 horas",
    "tu cuenta ha sido",
];

const URGENCY_KEYWORDS_CA: &[&str] = &[
    "urgent",
    "immediatament",
    "compte suspès",
    "compte serà tancat",
    "verifica el teu compte",
    "confirma la teva identitat",
    "accés no autoritzat",
    "activitat sospitosa",
    "temps limitat",
    "actua ara",
    "expirar",
    "en 24 hores",
    "en 48 hores",
    "el teu compte ha estat",
];

const CREDENTIAL_KEYWORDS_EN: &[&str] = &[
    "contraseña",
    "pin code",
    "credit card",
    "card number",
    "social security",
    "ssn",
    "bank account",
    "cvv",
    "cvc",
    "login credentials",
    "enter your password",
    "confirm password",
    "update your payment",
    "billing information",
];

const CREDENTIAL_KEYWORDS_ES: &[&str] = &[
    "contraseña",
    "clave",
    "código pin",
    "tarjeta de crédito",
    "número de tarjeta",
    "seguro social",
    "cuenta bancaria",
    "cvv",
    "cvc",
    "credenciales",
    "introduce tu contraseña",
    "confirma tu contraseña",
    "actualiza tu pago",
    "información de facturación",
];

const CREDENTIAL_KEYWORDS_CA: &[&str] = &[
    "contrasenya",
    "clau",
    "codi pin",
    "targeta de crèdit",
    "número de targeta",
    "seguretat social",
    "compte bancari",
    "cvv",
    "cvc",
    "credencials",
    "introdueix la teva contrasenya",
    "confirma la contrasenya",
    "actualitza el teu pagament",
    "informació de facturació",
];

const PRIZE_BAIT_PATTERNS_EN: &[&str] = &[
    r"you have (been selected|won|been chosen)",
    r"you'?ve (been selected|won|been chosen)",
    r"congratulations.{0,20}(winner|won|selected|chosen|prize|reward)",
    r"(claim|collect) your (prize|reward|gift|winnings)",
    r"you are (the|a) (lucky )?(winner|selected|chosen)",
    r"(exclusive|special) (offer|reward|prize) for you",
    r"(lottery|raffle|sweepstake|giveaway).{0,30}(winner|won|selected)",
    r"(gift card|voucher|coupon).{0,20}(reserved|waiting|selected)",
    r"free (iphone|ipad|macbook|samsung|laptop|tv|gift)",
    r"(selected|chosen) (to receive|for a|as a winner)",
];

const PRIZE_BAIT_PATTERNS_ES: &[&str] = &[
    r"has (sido seleccionado|ganado|sido elegido)",
    r"(felicidades|enhorabuena).{0,20}(ganador|ganado|seleccionado|premio|recompensa)",
    r"(reclama|recoge) tu (premio|recompensa|regalo)",
    r"eres (el|un) (afortunado )?(ganador|seleccionado|elegido)",
    r"(oferta|recompensa|premio) (exclusiv[oa]|especial) para ti",
    r"(lotería|sorteo|rifa).{0,30}(ganador|ganado|seleccionado)",
    r"(tarjeta regalo|vale|cupón).{0,20}(reservad[oa]|esperando|seleccionado)",
    r"(iphone|ipad|macbook|samsung|portátil|televisor|regalo) gratis",
    r"(seleccionado|elegido) (para recibir|como ganador)",
    r"has sido el ganador",
];

const PRIZE_BAIT_PATTERNS_CA: &[&str] = &[
    r"has (estat seleccionat|guanyat|estat escollit)",
    r"(felicitats|enhorabona).{0,20}(guanyador|guanyat|seleccionat|premi|recompensa)",
    r"(reclama|recull) el teu (premi|recompensa|regal)",
    r"ets (el|un) (afortunat )?(guanyador|seleccionat|escollit)",
    r"(oferta|recompensa|premi) (exclusiu|exclusiva|especial) per a tu",
    r"(loteria|sorteig|rifa).{0,30}(guanyador|guanyat|seleccionat)",
    r"(targeta regal|val|cupó).{0,20}(reservat|esperant|seleccionat)",
    r"(iphone|ipad|macbook|samsung|portàtil|televisor|regal) gratis",
    r"(seleccionat|escollit) (per rebre|com a guanyador)",
    r"has estat el guanyador",
];

const THREAT_PATTERNS_EN: &[&str] = &[
    r"in \d+ hours?",
    r"within \d+ days?",
    r"will be (closed|suspended|terminated|locked)",
    r"failure to (respond|verify|confirm|act)",
    r"legal action",
];

const THREAT_PATTERNS_ES: &[&str] = &[
    r"en \d+ horas?",
    r"en \d+ días?",
    r"será (cerrada|suspendida|bloqueada)",
    r"si no (respondes|verificas|confirmas|actúas)",
    r"acción legal",
];

const THREAT_PATTERNS_CA: &[&str] = &[
    r"en \d+ hores?",
    r"en \d+ dies?",
    r"serà (tancat|suspès|bloquejat)",
    r"si no (respons|verifiques|confirmes|actues)",
    r"acció legal",
];

const FREE_EMAIL_PROVIDERS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "mail.com",
    "protonmail.com",
    "zoho.com",
    "yandex.com",
    "gmx.com",
    "icloud.com",
    "live.com",
    "msn.com",
];

// Matched as raw substrings of the lower-cased body, so generic fragments
// like "bank" can fire on ordinary text. Known precision/recall tuning
// point, kept deliberately.
const WELL_KNOWN_BRANDS: &[&str] = &[
    "paypal",
    "apple",
    "microsoft",
    "google",
    "amazon",
    "netflix",
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
    "bank",
    "wells fargo",
    "chase",
    "citibank",
    "hsbc",
    "santander",
    "bbva",
    "caixabank",
    "sabadell",
    "bankia",
    "ing",
    "openbank",
];

// Tunable heuristic thresholds, approximate signal rather than ground truth.
const GIBBERISH_MIN_LETTERS: usize = 4;
const GIBBERISH_MAX_VOWEL_RATIO: f64 = 0.15;

lazy_static! {
    static ref CREDENTIAL_REGEXES: Vec<(Language, Vec<(&'static str, Regex)>)> = {
        let compile = |keywords: &[&'static str]| {
            keywords
                .iter()
                .map(|kw| {
                    let pattern = format!(r"\b{}\b", regex::escape(kw));
                    (*kw, Regex::new(&pattern).unwrap())
                })
                .collect::<Vec<_>>()
        };
        vec![
            (Language::En, compile(CREDENTIAL_KEYWORDS_EN)),
            (Language::Es, compile(CREDENTIAL_KEYWORDS_ES)),
            (Language::Ca, compile(CREDENTIAL_KEYWORDS_CA)),
        ]
    };
    static ref PRIZE_BAIT_REGEXES: Vec<(Language, Vec<Regex>)> = vec![
        (Language::En, compile_all(PRIZE_BAIT_PATTERNS_EN)),
        (Language::Es, compile_all(PRIZE_BAIT_PATTERNS_ES)),
        (Language::Ca, compile_all(PRIZE_BAIT_PATTERNS_CA)),
    ];
    static ref THREAT_REGEXES: Vec<(Language, Vec<Regex>)> = vec![
        (Language::En, compile_all(THREAT_PATTERNS_EN)),
        (Language::Es, compile_all(THREAT_PATTERNS_ES)),
        (Language::Ca, compile_all(THREAT_PATTERNS_CA)),
    ];
    static ref EMAIL_ADDRESS_REGEX: Regex = Regex::new(r"([\w.+-]+)@([\w.-]+)").unwrap();
    static ref NUMERIC_LOCAL_REGEX: Regex = Regex::new(r"^\d+$").unwrap();
    static ref CAMEL_LOCAL_REGEX: Regex = Regex::new(r"^[a-z]+[A-Z][a-z]+$").unwrap();
    static ref CONSONANT_RUN_REGEX: Regex = Regex::new(r"[^aeiou\d_.+-]{4,}").unwrap();
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

fn urgency_keywords(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::En => URGENCY_KEYWORDS_EN,
        Language::Es => URGENCY_KEYWORDS_ES,
        Language::Ca => URGENCY_KEYWORDS_CA,
    }
}

/// Pattern-based checks over the message body plus sender heuristics.
pub struct ContentAnalyzer;

#[async_trait]
impl Analyzer for ContentAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, document: &Document, language: Language) -> anyhow::Result<Vec<Alarm>> {
        let body = document.body_text.to_lowercase();

        let mut alarms: Vec<Alarm> = Vec::new();
        for check_lang in CHECK_LANGUAGES {
            alarms.extend(check_urgency(&body, check_lang, language));
            alarms.extend(check_credentials(&body, check_lang, language));
            alarms.extend(check_threats(&body, check_lang, language));
            alarms.extend(check_prize_bait(&body, check_lang, language));
        }

        // One alarm per family: the first matching language wins.
        let mut seen: Vec<&'static str> = Vec::new();
        alarms.retain(|a| {
            if seen.contains(&a.alarm_type) {
                false
            } else {
                seen.push(a.alarm_type);
                true
            }
        });

        alarms.extend(check_free_provider(document, &body, language));
        alarms.extend(check_suspicious_sender(document, language));

        Ok(alarms)
    }
}

fn effective_sender(document: &Document) -> Option<String> {
    document
        .sender
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| document.headers.get("from").cloned())
        .filter(|s| !s.is_empty())
}

fn check_urgency(body: &str, check_lang: Language, ui_lang: Language) -> Option<Alarm> {
    let found: Vec<&str> = urgency_keywords(check_lang)
        .iter()
        .filter(|kw| body.contains(*kw))
        .copied()
        .collect();
    if found.is_empty() {
        return None;
    }
    let preview: Vec<&str> = found.into_iter().take(5).collect();
    let (title, description) = alarm_text("urgency", ui_lang);
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "urgency_detected",
        severity: Severity::Medium,
        title: title.to_string(),
        description: description.to_string(),
        details: json!({ "keywords_found": preview }),
    })
}

fn check_credentials(body: &str, check_lang: Language, ui_lang: Language) -> Option<Alarm> {
    let regexes = &CREDENTIAL_REGEXES
        .iter()
        .find(|(lang, _)| *lang == check_lang)?
        .1;
    // Word-boundary matching avoids partial-word false positives.
    let found: Vec<&str> = regexes
        .iter()
        .filter(|(_, re)| re.is_match(body))
        .map(|(kw, _)| *kw)
        .collect();
    if found.is_empty() {
        return None;
    }
    let (title, description_template) = alarm_text("credentials", ui_lang);
    let description = description_template.replace("{keyword}", found[0]);
    let preview: Vec<&str> = found.into_iter().take(5).collect();
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "credential_request",
        severity: Severity::High,
        title: title.to_string(),
        description,
        details: json!({ "keywords_found": preview }),
    })
}

fn check_threats(body: &str, check_lang: Language, ui_lang: Language) -> Option<Alarm> {
    let regexes = &THREAT_REGEXES
        .iter()
        .find(|(lang, _)| *lang == check_lang)?
        .1;
    let matched = regexes.iter().filter(|re| re.is_match(body)).count();
    if matched == 0 {
        return None;
    }
    let (title, description) = alarm_text("threat", ui_lang);
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "threat_detected",
        severity: Severity::Medium,
        title: title.to_string(),
        description: description.to_string(),
        details: json!({ "patterns_matched": matched }),
    })
}

fn check_prize_bait(body: &str, check_lang: Language, ui_lang: Language) -> Option<Alarm> {
    let regexes = &PRIZE_BAIT_REGEXES
        .iter()
        .find(|(lang, _)| *lang == check_lang)?
        .1;
    let found: Vec<&str> = regexes
        .iter()
        .filter_map(|re| re.find(body))
        .map(|m| m.as_str())
        .collect();
    if found.is_empty() {
        return None;
    }
    let preview: Vec<&str> = found.into_iter().take(5).collect();
    let (title, description) = alarm_text("prize_bait", ui_lang);
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "prize_bait",
        severity: Severity::Medium,
        title: title.to_string(),
        description: description.to_string(),
        details: json!({ "matches": preview }),
    })
}

fn check_free_provider(document: &Document, body: &str, ui_lang: Language) -> Option<Alarm> {
    let sender = effective_sender(document)?;
    let sender_lower = sender.to_lowercase();

    let sender_domain = EMAIL_ADDRESS_REGEX
        .captures(&sender_lower)
        .map(|caps| caps[2].to_string())?;
    if !FREE_EMAIL_PROVIDERS.contains(&sender_domain.as_str()) {
        return None;
    }

    let brand = WELL_KNOWN_BRANDS
        .iter()
        .find(|brand| body.contains(*brand) || sender_lower.contains(*brand))?;

    let (title, description) = alarm_text("free_provider", ui_lang);
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "free_provider_impersonation",
        severity: Severity::High,
        title: title.to_string(),
        description: description.to_string(),
        details: json!({ "sender_domain": sender_domain, "brand_mentioned": brand }),
    })
}

fn check_suspicious_sender(document: &Document, ui_lang: Language) -> Option<Alarm> {
    let sender = effective_sender(document)?;
    let caps = EMAIL_ADDRESS_REGEX.captures(&sender)?;
    let local_part = caps[1].to_string();
    let domain_full = caps[2].to_lowercase();
    let full_address = format!("{local_part}@{domain_full}");

    let mut reasons: Vec<String> = Vec::new();

    // Purely numeric local part (e.g. 4824135658@...)
    if NUMERIC_LOCAL_REGEX.is_match(&local_part) {
        reasons.push(reason_label("numeric_local", ui_lang).to_string());
    }

    // Repeated subdomains (e.g. ggruzsu.ggruzsu.ggruzsu.fr)
    let labels: Vec<&str> = domain_full.split('.').collect();
    let non_tld = &labels[..labels.len().saturating_sub(1)];
    if non_tld.len() >= 2 && non_tld.iter().all(|l| *l == non_tld[0]) {
        reasons.push(reason_label("repeated_subdomains", ui_lang).to_string());
    }

    // Gibberish domain label (low vowel ratio)
    if non_tld.iter().any(|label| is_gibberish(label)) {
        reasons.push(reason_label("gibberish_domain", ui_lang).to_string());
    }

    // Domain label mixing digits and letters (e.g. 628iuqeu)
    if non_tld.iter().any(|label| {
        label.len() >= 4
            && label.chars().any(|c| c.is_ascii_digit())
            && label.chars().any(|c| c.is_alphabetic())
    }) {
        reasons.push(reason_label("mixed_alphanum_domain", ui_lang).to_string());
    }

    // Random uppercase past the first character (e.g. norespondarledlNwbb),
    // excluding a simple lower+Upper+lower shape
    if local_part.len() > 3 {
        let upper_in_mid = local_part
            .chars()
            .skip(1)
            .filter(|c| c.is_uppercase())
            .count();
        if upper_in_mid >= 1 && !CAMEL_LOCAL_REGEX.is_match(&local_part) {
            reasons.push(reason_label("random_case_local", ui_lang).to_string());
        }
    }

    // Long consonant run in the local part (e.g. rledlNwbb)
    let local_lower = local_part.to_lowercase();
    if CONSONANT_RUN_REGEX.is_match(&local_lower) && local_part.len() > 6 {
        reasons.push(reason_label("gibberish_local", ui_lang).to_string());
    }

    if reasons.is_empty() {
        return None;
    }

    let (title, description_template) = alarm_text("suspicious_sender", ui_lang);
    let description = description_template
        .replace("{sender}", &full_address)
        .replace("{reasons}", &reasons.join("; "));
    Some(Alarm {
        analyzer: NAME,
        alarm_type: "suspicious_sender",
        severity: Severity::High,
        title: title.to_string(),
        description,
        details: json!({ "sender": full_address, "reasons": reasons }),
    })
}

/// A label with enough letters and almost no vowels is likely generated.
fn is_gibberish(word: &str) -> bool {
    if word.len() < GIBBERISH_MIN_LETTERS {
        return false;
    }
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < GIBBERISH_MIN_LETTERS {
        return false;
    }
    let vowels = letters
        .iter()
        .filter(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .count();
    (vowels as f64 / letters.len() as f64) < GIBBERISH_MAX_VOWEL_RATIO
}

fn alarm_text(key: &str, lang: Language) -> (&'static str, &'static str) {
    match (key, lang) {
        ("urgency", Language::En) => (
            "Urgency language detected",
            "The message uses urgency tactics to pressure you into acting quickly.",
        ),
        ("urgency", Language::Es) => (
            "Lenguaje de urgencia detectado",
            "El mensaje usa tácticas de urgencia para presionar a actuar rápido.",
        ),
        ("urgency", Language::Ca) => (
            "Llenguatge d'urgència detectat",
            "El missatge utilitza tàctiques d'urgència per pressionar a actuar ràpid.",
        ),
        ("credentials", Language::En) => (
            "Credential request detected",
            "The message asks for sensitive information. Keyword detected: \"{keyword}\".",
        ),
        ("credentials", Language::Es) => (
            "Petición de credenciales detectada",
            "El mensaje solicita información sensible. Palabra detectada: \"{keyword}\".",
        ),
        ("credentials", Language::Ca) => (
            "Petició de credencials detectada",
            "El missatge sol·licita informació sensible. Paraula detectada: \"{keyword}\".",
        ),
        ("threat", Language::En) => (
            "Threat or deadline detected",
            "The message contains threats or artificial deadlines to force action.",
        ),
        ("threat", Language::Es) => (
            "Amenaza o plazo detectado",
            "El mensaje contiene amenazas o plazos artificiales para forzar una acción.",
        ),
        ("threat", Language::Ca) => (
            "Amenaça o termini detectat",
            "El missatge conté amenaces o terminis artificials per forçar una acció.",
        ),
        ("free_provider", Language::En) => (
            "Free email provider impersonation",
            "The sender uses a free email provider while impersonating a known brand.",
        ),
        ("free_provider", Language::Es) => (
            "Suplantación con proveedor gratuito",
            "El remitente usa un proveedor de email gratuito haciéndose pasar por una marca conocida.",
        ),
        ("free_provider", Language::Ca) => (
            "Suplantació amb proveïdor gratuït",
            "El remitent usa un proveïdor d'email gratuït fent-se passar per una marca coneguda.",
        ),
        ("prize_bait", Language::En) => (
            "Prize or reward bait",
            "The message claims you've won a prize or been selected for a reward. Did you actually sign up for this?",
        ),
        ("prize_bait", Language::Es) => (
            "Cebo de premio o recompensa",
            "El mensaje afirma que has ganado un premio o has sido seleccionado para una recompensa. ¿Realmente te habías apuntado a algo así?",
        ),
        ("prize_bait", Language::Ca) => (
            "Esquer de premi o recompensa",
            "El missatge afirma que has guanyat un premi o has estat seleccionat per a una recompensa. Realment t'havies apuntat a alguna cosa així?",
        ),
        ("suspicious_sender", Language::En) => (
            "Suspicious sender address",
            "The sender address \"{sender}\" looks fake: {reasons}.",
        ),
        ("suspicious_sender", Language::Es) => (
            "Dirección de remitente sospechosa",
            "La dirección \"{sender}\" parece falsa: {reasons}.",
        ),
        ("suspicious_sender", Language::Ca) => (
            "Adreça de remitent sospitosa",
            "L'adreça \"{sender}\" sembla falsa: {reasons}.",
        ),
        _ => ("Unknown finding", "Unknown finding."),
    }
}

fn reason_label(key: &str, lang: Language) -> &'static str {
    match (key, lang) {
        ("numeric_local", Language::En) => "local part is purely numeric",
        ("numeric_local", Language::Es) => "la parte local es puramente numérica",
        ("numeric_local", Language::Ca) => "la part local és purament numèrica",
        ("repeated_subdomains", Language::En) => "domain has repeated subdomains",
        ("repeated_subdomains", Language::Es) => "el dominio tiene subdominios repetidos",
        ("repeated_subdomains", Language::Ca) => "el domini té subdominis repetits",
        ("gibberish_domain", Language::En) => "domain name looks randomly generated",
        ("gibberish_domain", Language::Es) => {
            "el nombre de dominio parece generado aleatoriamente"
        }
        ("gibberish_domain", Language::Ca) => "el nom de domini sembla generat aleatòriament",
        ("mixed_alphanum_domain", Language::En) => "domain mixes digits and letters unnaturally",
        ("mixed_alphanum_domain", Language::Es) => {
            "el dominio mezcla dígitos y letras de forma sospechosa"
        }
        ("mixed_alphanum_domain", Language::Ca) => {
            "el domini barreja dígits i lletres de forma sospitosa"
        }
        ("random_case_local", Language::En) => "local part has random uppercase letters",
        ("random_case_local", Language::Es) => "la parte local tiene mayúsculas aleatorias",
        ("random_case_local", Language::Ca) => "la part local té majúscules aleatòries",
        ("gibberish_local", Language::En) => "local part looks randomly generated",
        ("gibberish_local", Language::Es) => "la parte local parece generada aleatoriamente",
        ("gibberish_local", Language::Ca) => "la part local sembla generada aleatòriament",
        _ => "unknown reason",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSource;

    fn doc_with_body(body: &str) -> Document {
        let mut doc = Document::empty(DocumentSource::PlainText);
        doc.body_text = body.to_string();
        doc
    }

    fn doc_with_sender(body: &str, sender: &str) -> Document {
        let mut doc = doc_with_body(body);
        doc.sender = Some(sender.to_string());
        doc
    }

    async fn analyze(doc: &Document) -> Vec<Alarm> {
        ContentAnalyzer.analyze(doc, Language::En).await.unwrap()
    }

    #[tokio::test]
    async fn test_urgency_detected() {
        let doc = doc_with_body("URGENT: Your account has been suspended immediately!");
        let alarms = analyze(&doc).await;
        assert!(alarms.iter().any(|a| a.alarm_type == "urgency_detected"));
    }

    #[tokio::test]
    async fn test_urgency_deduplicated_across_languages() {
        // "urgent" appears in both the English and Catalan tables.
        let doc = doc_with_body("urgent");
        let alarms = analyze(&doc).await;
        let count = alarms
            .iter()
            .filter(|a| a.alarm_type == "urgency_detected")
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_credential_request_detected() {
        let doc = doc_with_body("Please confirm your credit card and card number today");
        let alarms = analyze(&doc).await;
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "credential_request")
            .unwrap();
        assert_eq!(alarm.severity, Severity::High);
        assert!(alarm.description.contains("credit card"));
    }

    #[tokio::test]
    async fn test_credential_word_boundary() {
        // "ssn" must not fire inside an ordinary word.
        let doc = doc_with_body("the classness of it all");
        let alarms = analyze(&doc).await;
        assert!(!alarms.iter().any(|a| a.alarm_type == "credential_request"));
    }

    #[tokio::test]
    async fn test_threat_detected() {
        let doc = doc_with_body("Respond in 24 hours or your account will be closed");
        let alarms = analyze(&doc).await;
        assert!(alarms.iter().any(|a| a.alarm_type == "threat_detected"));
    }

    #[tokio::test]
    async fn test_prize_bait_detected() {
        let doc = doc_with_body("congratulations! you are the lucky winner of a free iphone");
        let alarms = analyze(&doc).await;
        assert!(alarms.iter().any(|a| a.alarm_type == "prize_bait"));
    }

    #[tokio::test]
    async fn test_free_provider_impersonation() {
        let doc = doc_with_sender(
            "Your PayPal account needs attention",
            "security@gmail.com",
        );
        let alarms = analyze(&doc).await;
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "free_provider_impersonation")
            .unwrap();
        assert_eq!(alarm.details["sender_domain"], "gmail.com");
        assert_eq!(alarm.details["brand_mentioned"], "paypal");
    }

    #[tokio::test]
    async fn test_free_provider_needs_brand_mention() {
        let doc = doc_with_sender("Hi, lunch tomorrow?", "friend@gmail.com");
        let alarms = analyze(&doc).await;
        assert!(!alarms
            .iter()
            .any(|a| a.alarm_type == "free_provider_impersonation"));
    }

    #[tokio::test]
    async fn test_corporate_sender_not_flagged_as_free_provider() {
        let doc = doc_with_sender("About your PayPal account", "support@paypal.com");
        let alarms = analyze(&doc).await;
        assert!(!alarms
            .iter()
            .any(|a| a.alarm_type == "free_provider_impersonation"));
    }

    #[tokio::test]
    async fn test_suspicious_sender_numeric_local() {
        let doc = doc_with_sender("hello", "4824135658@example.com");
        let alarms = analyze(&doc).await;
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "suspicious_sender")
            .unwrap();
        assert!(alarm.details["reasons"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r.as_str().unwrap().contains("numeric")));
    }

    #[tokio::test]
    async fn test_suspicious_sender_repeated_subdomains() {
        let doc = doc_with_sender("hello", "info@ggruzsu.ggruzsu.ggruzsu.fr");
        let alarms = analyze(&doc).await;
        assert!(alarms.iter().any(|a| a.alarm_type == "suspicious_sender"));
    }

    #[tokio::test]
    async fn test_suspicious_sender_random_uppercase() {
        let doc = doc_with_sender("hello", "paYPalSecuRity@example.com");
        let alarms = analyze(&doc).await;
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "suspicious_sender")
            .unwrap();
        let reasons = alarm.details["reasons"].as_array().unwrap();
        assert!(reasons
            .iter()
            .any(|r| r.as_str().unwrap().contains("uppercase")));
    }

    #[tokio::test]
    async fn test_suspicious_sender_consonant_run() {
        // A single interior uppercase fits the lower+Upper+lower shape,
        // but the consonant run still gives it away.
        let doc = doc_with_sender("hello", "norespondarledlNwbb@example.com");
        let alarms = analyze(&doc).await;
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "suspicious_sender")
            .unwrap();
        let reasons = alarm.details["reasons"].as_array().unwrap();
        assert!(reasons
            .iter()
            .any(|r| r.as_str().unwrap().contains("randomly generated")));
    }

    #[tokio::test]
    async fn test_ordinary_sender_not_suspicious() {
        let doc = doc_with_sender("hello", "jane.doe@example.com");
        let alarms = analyze(&doc).await;
        assert!(!alarms.iter().any(|a| a.alarm_type == "suspicious_sender"));
    }

    #[tokio::test]
    async fn test_descriptions_localized() {
        let doc = doc_with_body("urgent: verify your account");
        let alarms = ContentAnalyzer.analyze(&doc, Language::Ca).await.unwrap();
        let alarm = alarms
            .iter()
            .find(|a| a.alarm_type == "urgency_detected")
            .unwrap();
        assert_eq!(alarm.title, "Llenguatge d'urgència detectat");
    }

    #[test]
    fn test_is_gibberish() {
        assert!(is_gibberish("ggrzsx"));
        assert!(!is_gibberish("example"));
        assert!(!is_gibberish("abc"));
    }
}
