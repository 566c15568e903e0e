//! Phone identity helpers.
//!
//! A phone identity is a digit-only string.  Historical records store the
//! same number both with and without the country prefix, so lookups fan out
//! over a small variant set instead of trusting a single format.

/// Length of a bare national number for the default country.
pub const NATIONAL_NUMBER_LEN: usize = 10;

/// Strip everything that is not an ASCII digit.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Generate the variant set for a raw phone number.
///
/// - always the normalized form;
/// - with `country_code` stripped when the number carries it and is longer
///   than a national number;
/// - with `country_code` prepended when the number is exactly a national
///   number.
///
/// Returns an empty vec for input without digits.
pub fn variants(raw: &str, country_code: &str) -> Vec<String> {
    let norm = normalize(raw);
    if norm.is_empty() {
        return Vec::new();
    }

    let mut out = vec![norm.clone()];

    if !country_code.is_empty()
        && norm.starts_with(country_code)
        && norm.len() > NATIONAL_NUMBER_LEN
    {
        let stripped = norm[country_code.len()..].to_owned();
        if !stripped.is_empty() && !out.contains(&stripped) {
            out.push(stripped);
        }
    }

    if norm.len() == NATIONAL_NUMBER_LEN && !country_code.is_empty() {
        let prefixed = format!("{country_code}{norm}");
        if !out.contains(&prefixed) {
            out.push(prefixed);
        }
    }

    out
}

/// Format a number the way the messaging provider expects it: digits only,
/// with the default country prefix added to bare national numbers.
pub fn to_provider_format(raw: &str, country_code: &str) -> String {
    let norm = normalize(raw);
    if norm.len() == NATIONAL_NUMBER_LEN {
        format!("{country_code}{norm}")
    } else {
        norm
    }
}
