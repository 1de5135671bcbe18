// file: src/extraction/patterns.rs
// description: compiled regex patterns for fallback requirement extraction
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Financial
    pub static ref BUDGET: Regex = Regex::new(
        r"(?i)budget.*?(\$[\d,]+(?:\.\d+)?[kmb]?)"
    ).expect("BUDGET regex is valid");

    // Schedule
    pub static ref TIMELINE: Regex = Regex::new(
        r"(?i)(?:deadline|timeline|due).*?(\d+\s+(?:days?|weeks?|months?))"
    ).expect("TIMELINE regex is valid");

    // Place
    pub static ref LOCATION: Regex = Regex::new(
        r"(?i)(?:location|site|facility).*?([A-Z][a-z]+,?\s*[A-Z]{2})"
    ).expect("LOCATION regex is valid");

    // Workforce size
    pub static ref EMPLOYEES: Regex = Regex::new(
        r"(?i)(?:employees?|staff|workforce).*?(\d+)"
    ).expect("EMPLOYEES regex is valid");

    // Floor area
    pub static ref SQUARE_FEET: Regex = Regex::new(
        r"(?i)(\d+(?:,\d+)?)\s*(?:sq\.?\s*ft\.?|square\s+feet)"
    ).expect("SQUARE_FEET regex is valid");

    // Fenced model output such as ```json ... ```
    pub static ref CODE_FENCE: Regex = Regex::new(
        r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$"
    ).expect("CODE_FENCE regex is valid");
}

/// Keywords that imply a technical capability requirement.
pub const TECH_KEYWORDS: &[&str] = &["technology", "software", "system"];

/// First capture group of `pattern` in `text`.
pub fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
