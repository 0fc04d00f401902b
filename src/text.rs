//! Bounded projection of the free-text status and automation fields.
//!
//! The device keeps whatever text it was given. Readers see at most
//! [`TextLimit`] characters, always a prefix of the stored text.

use crate::error::{DeviceError, DeviceResult};

/// Longest text a plain publishing string can carry unmodified.
pub const NATIVE_STRING_LIMIT: usize = 40;

/// Smallest permitted projection length.
pub const MIN_TEXT_LIMIT: usize = 500;

/// Projection length used when none is configured.
pub const DEFAULT_TEXT_LIMIT: usize = 1024;

/// Maximum number of characters returned when reading a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimit(usize);

impl TextLimit {
    pub fn new(chars: usize) -> DeviceResult<Self> {
        if chars < MIN_TEXT_LIMIT {
            return Err(DeviceError::InvalidConfig {
                what: format!(
                    "text limit {} is below the minimum of {}",
                    chars, MIN_TEXT_LIMIT
                ),
            });
        }
        Ok(Self(chars))
    }

    pub fn chars(self) -> usize {
        self.0
    }
}

impl Default for TextLimit {
    fn default() -> Self {
        Self(DEFAULT_TEXT_LIMIT)
    }
}

/// Returns the first `min(len, limit)` characters of `stored`.
pub fn project(stored: &str, limit: TextLimit) -> &str {
    match stored.char_indices().nth(limit.chars()) {
        Some((cut, _)) => &stored[..cut],
        None => stored,
    }
}

/// Whether the text fits a native short string without truncation.
pub fn is_native_string(text: &str) -> bool {
    text.chars().count() < NATIVE_STRING_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_medium_text_is_untouched() {
        let short_status = "Device status";
        let medium_status = "This is a device status that contains a bit more information";
        assert!(is_native_string(short_status));
        assert!(!is_native_string(medium_status));
        for status in [short_status, medium_status] {
            assert_eq!(project(status, TextLimit::default()), status);
        }
    }

    #[test]
    fn long_text_is_cut_to_exactly_the_limit() {
        let long_status = format!(
            "This device status is quite long:{}",
            " (here is a load of information)".repeat(60)
        );
        assert!(long_status.len() > 1700);
        let limit = TextLimit::new(MIN_TEXT_LIMIT).unwrap();
        let shown = project(&long_status, limit);
        assert_eq!(shown.chars().count(), MIN_TEXT_LIMIT);
        assert!(long_status.starts_with(shown));
    }

    #[test]
    fn text_exactly_at_limit_is_kept() {
        let limit = TextLimit::new(500).unwrap();
        let text = "x".repeat(500);
        assert_eq!(project(&text, limit), text);
    }

    #[test]
    fn cut_respects_multibyte_characters() {
        let limit = TextLimit::new(500).unwrap();
        let text = "µK".repeat(400);
        let shown = project(&text, limit);
        assert_eq!(shown.chars().count(), 500);
        assert!(text.starts_with(shown));
    }

    #[test]
    fn limit_below_minimum_is_rejected() {
        assert!(matches!(
            TextLimit::new(499),
            Err(DeviceError::InvalidConfig { .. })
        ));
    }
}
