//! Classification of the free-form company input.
//!
//! A user may type a company name, a website (with or without scheme), an
//! 11-digit Partita IVA, or a mix of them. Everything downstream works from
//! the [`InputAnalysis`] produced here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::validation::{DOMAIN_RE, WHITESPACE_RE};

static PIVA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{11}\b").expect("valid piva regex"));

// Unanchored so prefixed numbers such as IT04427770278 still yield their digits.
static PIVA_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{11}").expect("valid piva digits regex"));

static DOMAIN_IN_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,})\b")
        .expect("valid domain-in-text regex")
});

static LEGAL_FORMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:s\.r\.l|s\.p\.a|s\.n\.c|s\.a\.s|srl|spa|snc|sas|ltd|llc|inc|corp)\b")
        .expect("valid legal forms regex")
});

static SPECIAL_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid special chars regex"));

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").expect("valid non-word regex"));

/// Placeholder name used when only a VAT number was supplied
pub const NAME_FROM_PARTITA_IVA: &str = "Azienda da P.IVA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Url,
    PartitaIva,
    Domain,
    CompanyWithDomain,
    CompanyName,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partita_iva: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputAnalysis {
    pub original_input: String,
    pub input_type: InputKind,
    pub extracted_data: ExtractedData,
    pub confidence: f32,
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn url_host(input: &str) -> Option<String> {
    Url::parse(input)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
}

fn strip_www(host: &str) -> String {
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn non_blank(text: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(text.trim(), " ").to_string();
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Works out what kind of input the user gave and pulls out its parts.
pub fn identify(user_input: &str) -> InputAnalysis {
    let input = user_input.trim();
    let mut extracted = ExtractedData::default();

    let (kind, confidence) = if is_url(input) {
        extracted.url = Some(input.to_string());
        extracted.domain = url_host(input);
        (InputKind::Url, 1.0)
    } else if let Some(m) = PIVA_RE.find(input) {
        extracted.partita_iva = Some(m.as_str().to_string());
        extracted.company_name = non_blank(&PIVA_RE.replace_all(input, ""));
        (InputKind::PartitaIva, 0.9)
    } else if DOMAIN_RE.is_match(input) {
        extracted.domain = Some(input.to_string());
        (InputKind::Domain, 0.8)
    } else if let Some(caps) = DOMAIN_IN_TEXT_RE.captures(input) {
        let domain = caps[1].to_string();
        extracted.company_name = non_blank(&input.replace(&domain, ""));
        extracted.domain = Some(domain);
        (InputKind::CompanyWithDomain, 0.7)
    } else {
        extracted.company_name = Some(input.to_string());
        (InputKind::CompanyName, 0.5)
    };

    InputAnalysis {
        original_input: input.to_string(),
        input_type: kind,
        extracted_data: extracted,
        confidence,
    }
}

/// Domain to query SEMRush with, without the `www.` prefix
pub fn domain_from_input(user_input: &str) -> Option<String> {
    let input = user_input.trim();
    if is_url(input) {
        return url_host(input).map(|h| strip_www(&h));
    }
    if input.contains('.') && !input.contains(' ') {
        return Some(input.replace("www.", ""));
    }
    identify(input)
        .extracted_data
        .domain
        .map(|domain| strip_www(&domain))
}

/// Best-effort company name to search competitors and social profiles with
pub fn company_name_from_input(user_input: &str) -> String {
    let analysis = identify(user_input);
    match analysis.input_type {
        InputKind::Url | InputKind::Domain => analysis
            .extracted_data
            .domain
            .map(|d| {
                d.replace("www.", "")
                    .replace(".com", "")
                    .replace(".it", "")
            })
            .unwrap_or(analysis.original_input),
        InputKind::PartitaIva => analysis
            .extracted_data
            .company_name
            .unwrap_or_else(|| NAME_FROM_PARTITA_IVA.to_string()),
        InputKind::CompanyWithDomain | InputKind::CompanyName => analysis
            .extracted_data
            .company_name
            .unwrap_or(analysis.original_input),
    }
}

/// First 11-digit run in the input, or an empty string
pub fn partita_iva_from_input(user_input: &str) -> String {
    PIVA_DIGITS_RE
        .find(user_input)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Strips legal forms (srl, s.p.a., ltd...) and punctuation from a company name.
pub fn clean_company_name(company_name: &str) -> String {
    let without_forms = LEGAL_FORMS_RE.replace_all(company_name, "");
    let without_specials = SPECIAL_CHARS_RE.replace_all(&without_forms, "");
    WHITESPACE_RE
        .replace_all(&without_specials, " ")
        .trim()
        .to_string()
}

/// Plausible website domains for a company name
pub fn domain_suggestions(company_name: &str) -> Vec<String> {
    let clean_name = clean_company_name(company_name);
    let base = NON_WORD_RE
        .replace_all(&clean_name.to_lowercase(), "")
        .to_string();
    if base.is_empty() {
        return Vec::new();
    }

    let mut suggestions = vec![
        format!("{base}.it"),
        format!("{base}.com"),
        format!("www.{base}.it"),
        format!("www.{base}.com"),
    ];

    let words: Vec<String> = clean_name
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    if words.len() > 1 {
        let hyphenated = words.join("-");
        suggestions.push(format!("{hyphenated}.it"));
        suggestions.push(format!("{hyphenated}.com"));
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_url() {
        let analysis = identify("  https://www.venezianico.com/shop ");
        assert_eq!(analysis.input_type, InputKind::Url);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(
            analysis.extracted_data.domain.as_deref(),
            Some("www.venezianico.com")
        );
    }

    #[test]
    fn test_identify_partita_iva_with_name() {
        let analysis = identify("Venezianico SRL 04427770278");
        assert_eq!(analysis.input_type, InputKind::PartitaIva);
        assert_eq!(
            analysis.extracted_data.partita_iva.as_deref(),
            Some("04427770278")
        );
        assert_eq!(
            analysis.extracted_data.company_name.as_deref(),
            Some("Venezianico SRL")
        );
    }

    #[test]
    fn test_identify_twelve_digits_is_not_a_partita_iva() {
        let analysis = identify("Acme 123456789012");
        assert_ne!(analysis.input_type, InputKind::PartitaIva);
    }

    #[test]
    fn test_identify_domain_and_company_with_domain() {
        let analysis = identify("venezianico.com");
        assert_eq!(analysis.input_type, InputKind::Domain);
        assert_eq!(analysis.confidence, 0.8);

        let analysis = identify("Venezianico venezianico.com");
        assert_eq!(analysis.input_type, InputKind::CompanyWithDomain);
        assert_eq!(
            analysis.extracted_data.domain.as_deref(),
            Some("venezianico.com")
        );
        assert_eq!(
            analysis.extracted_data.company_name.as_deref(),
            Some("Venezianico")
        );
    }

    #[test]
    fn test_identify_company_name() {
        let analysis = identify("Venezianico SRL");
        assert_eq!(analysis.input_type, InputKind::CompanyName);
        assert_eq!(analysis.confidence, 0.5);
        assert_eq!(
            analysis.extracted_data.company_name.as_deref(),
            Some("Venezianico SRL")
        );
    }

    #[test]
    fn test_domain_from_input() {
        assert_eq!(
            domain_from_input("https://www.venezianico.com/about").as_deref(),
            Some("venezianico.com")
        );
        assert_eq!(
            domain_from_input("www.venezianico.com").as_deref(),
            Some("venezianico.com")
        );
        assert_eq!(
            domain_from_input("Venezianico venezianico.it").as_deref(),
            Some("venezianico.it")
        );
        assert_eq!(domain_from_input("Venezianico SRL"), None);
        assert_eq!(domain_from_input("04427770278"), None);
    }

    #[test]
    fn test_company_name_from_input() {
        assert_eq!(
            company_name_from_input("https://www.venezianico.com"),
            "venezianico"
        );
        assert_eq!(company_name_from_input("04427770278"), NAME_FROM_PARTITA_IVA);
        assert_eq!(
            company_name_from_input("Venezianico 04427770278"),
            "Venezianico"
        );
        assert_eq!(company_name_from_input("Venezianico SRL"), "Venezianico SRL");
    }

    #[test]
    fn test_partita_iva_from_input() {
        assert_eq!(partita_iva_from_input("P.IVA 04427770278"), "04427770278");
        assert_eq!(partita_iva_from_input("no vat here"), "");
    }

    #[test]
    fn test_partita_iva_with_country_prefix() {
        assert_eq!(
            partita_iva_from_input("Venezianico IT04427770278"),
            "04427770278"
        );
        assert_ne!(
            identify("Venezianico IT04427770278").input_type,
            InputKind::PartitaIva
        );
    }

    #[test]
    fn test_clean_company_name() {
        assert_eq!(clean_company_name("Venezianico S.r.l."), "Venezianico");
        assert_eq!(clean_company_name("ACME SpA"), "ACME");
        assert_eq!(clean_company_name("Rossi & Figli snc"), "Rossi Figli");
        assert_eq!(clean_company_name("Spazio Verde"), "Spazio Verde");
    }

    #[test]
    fn test_domain_suggestions() {
        let suggestions = domain_suggestions("Rossi Figli S.p.A.");
        assert_eq!(
            suggestions,
            vec![
                "rossifigli.it",
                "rossifigli.com",
                "www.rossifigli.it",
                "www.rossifigli.com",
                "rossi-figli.it",
                "rossi-figli.com",
            ]
        );

        let single = domain_suggestions("Venezianico srl");
        assert_eq!(single.len(), 4);
        assert!(domain_suggestions("srl").is_empty());
    }
}
