//! Validation and sanitisation of company identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

pub(crate) static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("valid domain regex")
});

static CODICE_FISCALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{6}\d{2}[A-Z]\d{2}[A-Z]\d{3}[A-Z]$").expect("valid codice fiscale regex")
});

static PARTITA_IVA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{11}$").expect("valid partita iva regex"));

static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>"'/\\{}();]"#).expect("valid unsafe chars regex"));

pub(crate) static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// Italian amounts: "." groups thousands, "," separates decimals.
static NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"€\s*(\d{1,3}(?:\.\d{3})*(?:,\d{2})?)",
        r"(\d{1,3}(?:\.\d{3})*(?:,\d{2})?)\s*€",
        r"(\d{1,3}(?:\.\d{3})*)",
        r"(\d+,\d{2})",
        r"(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid number regex"))
    .collect()
});

/// Named validation rules accepted by [`validate_input`]
pub const RULES: [&str; 4] = ["partita_iva", "codice_fiscale", "domain", "url"];

/// Checks an Italian VAT number, including its check digit.
/// Non-digit characters are ignored.
pub fn validate_partita_iva(piva: &str) -> bool {
    let digits: Vec<u32> = piva.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return false;
    }

    let odd_sum: u32 = digits[..10].iter().step_by(2).sum();
    let even_sum: u32 = digits[1..10]
        .iter()
        .step_by(2)
        .map(|d| {
            let doubled = d * 2;
            if doubled < 10 { doubled } else { doubled - 9 }
        })
        .sum();

    let check_digit = (10 - (odd_sum + even_sum) % 10) % 10;
    digits[10] == check_digit
}

pub fn validate_domain(domain: &str) -> bool {
    DOMAIN_RE.is_match(domain)
}

/// A URL is valid when it has both a scheme and a host
pub fn validate_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

pub fn validate_codice_fiscale(code: &str) -> bool {
    CODICE_FISCALE_RE.is_match(code)
}

/// Validates `value` against one of the named [`RULES`]. Unknown rules never match.
pub fn validate_input(rule: &str, value: &str) -> bool {
    match rule {
        "partita_iva" => PARTITA_IVA_RE.is_match(value),
        "codice_fiscale" => validate_codice_fiscale(value),
        "domain" => validate_domain(value),
        "url" => value.starts_with("http://") || value.starts_with("https://"),
        _ => false,
    }
}

/// Removes characters that have no place in a search query
pub fn sanitize_company_name(name: &str) -> String {
    let stripped = UNSAFE_CHARS_RE.replace_all(name, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Extracts every number found in `text`, reading Italian separators.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    for pattern in NUMBER_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let normalized = m.as_str().replace('.', "").replace(',', ".");
            if let Ok(value) = normalized.parse::<f64>() {
                numbers.push(value);
            }
        }
    }
    numbers
}
