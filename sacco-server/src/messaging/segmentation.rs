//! Message Segmentation
//!
//! Pure functions for billable-unit counting. A message body fitting the
//! 7-bit alphabet packs 160 characters per unit; one character outside it
//! drops the whole body to 70-character UCS-2 units.

/// Characters per unit for pure-ASCII bodies
pub const SINGLE_BYTE_UNIT: usize = 160;

/// Characters per unit once any character needs UCS-2
pub const UCS2_UNIT: usize = 70;

/// Whether the body fits the single-byte alphabet
pub fn is_single_byte(body: &str) -> bool {
    body.chars().all(|c| c.is_ascii())
}

/// Billable unit count for a message body.
///
/// `units = ceil(chars / unit_size)`; an empty body still bills one unit.
pub fn message_units(body: &str) -> i64 {
    let chars = body.chars().count();
    if chars == 0 {
        return 1;
    }
    let unit = if is_single_byte(body) {
        SINGLE_BYTE_UNIT
    } else {
        UCS2_UNIT
    };
    chars.div_ceil(unit) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_boundary_160() {
        let body = "a".repeat(160);
        assert_eq!(message_units(&body), 1);
    }

    #[test]
    fn test_ascii_boundary_161() {
        let body = "a".repeat(161);
        assert_eq!(message_units(&body), 2);
    }

    #[test]
    fn test_unicode_boundary_70() {
        // 69 ASCII chars + one non-ASCII → 70 chars, UCS-2 alphabet
        let body = format!("{}é", "a".repeat(69));
        assert_eq!(body.chars().count(), 70);
        assert_eq!(message_units(&body), 1);
    }

    #[test]
    fn test_unicode_boundary_71() {
        let body = format!("{}é", "a".repeat(70));
        assert_eq!(body.chars().count(), 71);
        assert_eq!(message_units(&body), 2);
    }

    #[test]
    fn test_empty_body_bills_one_unit() {
        assert_eq!(message_units(""), 1);
    }

    #[test]
    fn test_single_char() {
        assert_eq!(message_units("y"), 1);
        assert_eq!(message_units("¥"), 1);
    }

    #[test]
    fn test_long_unicode_body() {
        // 141 chars with a non-ASCII char → ceil(141 / 70) = 3
        let body = format!("{}ñ", "a".repeat(140));
        assert_eq!(message_units(&body), 3);
    }

    #[test]
    fn test_is_single_byte() {
        assert!(is_single_byte("plain text 123"));
        assert!(!is_single_byte("naïve"));
    }
}
