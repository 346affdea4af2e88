//! Phone Number Normalization
//!
//! Outbound numbers are normalized to digits-only international form
//! before reaching the transport: strip everything non-numeric, map a
//! leading national trunk `0` to the configured country code, and prepend
//! the country code when it is missing entirely.

/// Normalize a raw phone number. Returns `None` when nothing dialable
/// remains after stripping.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    if let Some(rest) = digits.strip_prefix('0') {
        // National trunk prefix → country code
        if rest.is_empty() {
            return None;
        }
        return Some(format!("{country_code}{rest}"));
    }

    if digits.starts_with(country_code) {
        return Some(digits);
    }

    Some(format!("{country_code}{digits}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CC: &str = "254";

    #[test]
    fn test_trunk_prefix_mapped_to_country_code() {
        assert_eq!(normalize_phone("0712345678", CC).unwrap(), "254712345678");
    }

    #[test]
    fn test_already_international_passes_through() {
        assert_eq!(normalize_phone("254712345678", CC).unwrap(), "254712345678");
    }

    #[test]
    fn test_plus_and_separators_stripped() {
        assert_eq!(
            normalize_phone("+254 712-345-678", CC).unwrap(),
            "254712345678"
        );
    }

    #[test]
    fn test_bare_subscriber_number_gets_prefix() {
        assert_eq!(normalize_phone("712345678", CC).unwrap(), "254712345678");
    }

    #[test]
    fn test_no_digits_is_none() {
        assert_eq!(normalize_phone("n/a", CC), None);
        assert_eq!(normalize_phone("", CC), None);
        assert_eq!(normalize_phone("0", CC), None);
    }
}
