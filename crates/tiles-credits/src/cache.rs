//! Memoization of converted credit markup.

use std::collections::HashMap;

/// Maps raw credit markup to its converted rich text.
///
/// A given markup string always converts to the same output, so entries are
/// never invalidated. The cache grows with the number of distinct credits
/// seen during a session.
#[derive(Debug, Default, Clone)]
pub struct ConversionCache {
    entries: HashMap<String, String>,
}

impl ConversionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the conversion of `markup`, running `convert` only on a miss.
    pub fn get_or_convert<F>(&mut self, markup: &str, convert: F) -> &str
    where
        F: FnOnce(&str) -> String,
    {
        if !self.entries.contains_key(markup) {
            let converted = convert(markup);
            self.entries.insert(markup.to_string(), converted);
        }
        self.entries.get(markup).map_or("", String::as_str)
    }

    /// The cached conversion of `markup`, if any.
    #[must_use]
    pub fn get(&self, markup: &str) -> Option<&str> {
        self.entries.get(markup).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, markup: &str) -> bool {
        self.entries.contains_key(markup)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Only the owner does this, when it is destroyed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MarkupConverter;
    use crate::image::ImageSlots;

    #[test]
    fn test_second_lookup_does_not_reparse() {
        let mut cache = ConversionCache::new();
        let mut converter = MarkupConverter::new();
        let mut images = ImageSlots::<()>::new();
        let markup = "<a href='https://example.com'>Example</a>";

        let first = cache
            .get_or_convert(markup, |m| converter.convert(m, &mut images))
            .to_string();
        let second = cache
            .get_or_convert(markup, |m| converter.convert(m, &mut images))
            .to_string();

        assert_eq!(first, second);
        assert_eq!(converter.parse_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_images_requested_once_per_markup() {
        let mut cache = ConversionCache::new();
        let mut converter = MarkupConverter::new();
        let mut images = ImageSlots::<()>::new();

        for _ in 0..3 {
            cache.get_or_convert("<img src='logo.png'>", |m| converter.convert(m, &mut images));
        }
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_failed_conversion_is_cached() {
        let mut cache = ConversionCache::new();
        let mut calls = 0;

        for _ in 0..2 {
            let output = cache.get_or_convert("<blink>x</blink>", |_| {
                calls += 1;
                String::new()
            });
            assert_eq!(output, "");
        }
        assert_eq!(calls, 1);
        assert!(cache.contains("<blink>x</blink>"));
    }

    #[test]
    fn test_clear() {
        let mut cache = ConversionCache::new();
        cache.get_or_convert("a", str::to_uppercase);
        assert_eq!(cache.get("a"), Some("A"));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
