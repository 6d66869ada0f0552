use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities
///
/// Prompts name the target language in English ("French", "Japanese"),
/// while configuration and glossary columns use ISO codes. These helpers
/// convert between the two.

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve an ISO 639-1, 639-2/T, 639-2/B code or an English language name
pub fn resolve_language(input: &str) -> Result<Language> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    let by_code = match lower.len() {
        2 => Language::from_639_1(&lower),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == lower)
                .map(|(_, t)| *t)
                .unwrap_or(lower.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    };
    if let Some(lang) = by_code {
        return Ok(lang);
    }

    let mut chars = lower.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Language::from_name(trimmed)
        .or_else(|| Language::from_name(&capitalized))
        .ok_or_else(|| anyhow!("Unknown language: {}", input))
}

/// ISO 639-1 code if one exists, otherwise ISO 639-2/T
///
/// Glossary target columns are keyed this way (`fr`, `it`, `ja`).
pub fn normalize_to_part1_or_part2t(input: &str) -> Result<String> {
    let lang = resolve_language(input)?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two codes or names represent the same language
pub fn language_codes_match(a: &str, b: &str) -> bool {
    match (resolve_language(a), resolve_language(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// English name of a language given as code or name
pub fn get_language_name(input: &str) -> Result<String> {
    Ok(resolve_language(input)?.to_name().to_string())
}
