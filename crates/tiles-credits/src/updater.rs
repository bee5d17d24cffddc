//! Per-frame credit text updates.

use crate::cache::ConversionCache;
use crate::convert::MarkupConverter;
use crate::credit::CreditSource;
use crate::image::ImageLoader;

/// Clickable suffix appended to the on-screen credits; opens the popup.
pub const DATA_ATTRIBUTION_LINK: &str = "<link=\"popup\"><u>Data Attribution</u></link>";

/// Receives the formatted credit texts.
pub trait CreditDisplay {
    /// Replace the displayed texts.
    ///
    /// `popup` lists the credits in full; `on_screen` holds the credits shown
    /// directly over the scene followed by [`DATA_ATTRIBUTION_LINK`].
    fn set_credit_texts(&mut self, popup: &str, on_screen: &str);
}

/// The last texts pushed to a display.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CreditTexts {
    pub popup: String,
    pub on_screen: String,
}

impl CreditDisplay for CreditTexts {
    fn set_credit_texts(&mut self, popup: &str, on_screen: &str) {
        popup.clone_into(&mut self.popup);
        on_screen.clone_into(&mut self.on_screen);
    }
}

/// Rebuilds the displayed credit texts when the set of shown credits changes.
#[derive(Debug, Default)]
pub struct CreditFrameUpdater {
    converter: MarkupConverter,
    cache: ConversionCache,
    last_credits_count: usize,
}

impl CreditFrameUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The converter used for cache misses.
    #[must_use]
    pub fn converter(&self) -> &MarkupConverter {
        &self.converter
    }

    /// Markup conversions cached so far.
    #[must_use]
    pub fn cache(&self) -> &ConversionCache {
        &self.cache
    }

    /// Number of credits shown at the last recompute.
    #[must_use]
    pub fn last_credits_count(&self) -> usize {
        self.last_credits_count
    }

    /// Run one display tick.
    ///
    /// Texts are rebuilt only when the number of shown credits changed or some
    /// credit stopped being shown. Only the first shown credit is rendered.
    /// The source is always advanced to the next frame afterwards.
    ///
    /// Returns whether the display was updated.
    pub fn update<S, L, D>(&mut self, source: &mut S, images: &mut L, display: &mut D) -> bool
    where
        S: CreditSource + ?Sized,
        L: ImageLoader + ?Sized,
        D: CreditDisplay + ?Sized,
    {
        let credits = source.credits_to_show_this_frame();
        let credits_count = credits.len();
        let first = credits.first().copied();
        let credits_updated = credits_count != self.last_credits_count
            || !source.credits_to_no_longer_show_this_frame().is_empty();

        if credits_updated {
            let mut popup = String::new();
            let mut on_screen = String::new();

            if let Some(credit) = first {
                let converter = &mut self.converter;
                let rich_text = self
                    .cache
                    .get_or_convert(source.html(credit), |markup| {
                        converter.convert(markup, images)
                    });

                popup.push_str(rich_text);
                if source.should_be_shown_on_screen(credit) {
                    on_screen.push_str(rich_text);
                }
            }

            on_screen.push_str(DATA_ATTRIBUTION_LINK);
            display.set_credit_texts(&popup, &on_screen);

            tracing::debug!(
                "Updated credit texts: {credits_count} shown (was {})",
                self.last_credits_count
            );
            self.last_credits_count = credits_count;
        }

        source.start_next_frame();
        credits_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::{Credit, CreditSystem};
    use crate::image::ImageSlots;

    /// Display that records every call.
    #[derive(Default)]
    struct RecordingDisplay {
        calls: Vec<(String, String)>,
    }

    impl CreditDisplay for RecordingDisplay {
        fn set_credit_texts(&mut self, popup: &str, on_screen: &str) {
            self.calls.push((popup.to_string(), on_screen.to_string()));
        }
    }

    fn show(system: &mut CreditSystem, credits: &[Credit]) {
        for &credit in credits {
            system.add_credit_to_frame(credit);
        }
    }

    #[test]
    fn test_recompute_only_on_change() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("A", true);
        let b = system.create_credit("B", true);
        let c = system.create_credit("C", true);
        let mut images = ImageSlots::<()>::new();
        let mut display = RecordingDisplay::default();
        let mut updater = CreditFrameUpdater::new();

        show(&mut system, &[a, b]);
        assert!(updater.update(&mut system, &mut images, &mut display));
        assert_eq!(updater.last_credits_count(), 2);

        // Same two credits: no recompute.
        show(&mut system, &[a, b]);
        assert!(!updater.update(&mut system, &mut images, &mut display));
        assert_eq!(display.calls.len(), 1);

        // A third credit: recompute.
        show(&mut system, &[a, b, c]);
        assert!(updater.update(&mut system, &mut images, &mut display));
        assert_eq!(display.calls.len(), 2);
        assert_eq!(updater.last_credits_count(), 3);
    }

    #[test]
    fn test_recompute_when_credit_replaced() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("A", true);
        let b = system.create_credit("B", true);
        let mut images = ImageSlots::<()>::new();
        let mut display = RecordingDisplay::default();
        let mut updater = CreditFrameUpdater::new();

        show(&mut system, &[a]);
        updater.update(&mut system, &mut images, &mut display);

        // Same count, but A stopped being shown.
        show(&mut system, &[b]);
        assert!(updater.update(&mut system, &mut images, &mut display));
        assert_eq!(display.calls[1].0, "B");
    }

    #[test]
    fn test_only_first_credit_rendered() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("<a href='https://a.example'>A</a>", true);
        let b = system.create_credit("B", true);
        let mut images = ImageSlots::<()>::new();
        let mut texts = CreditTexts::default();

        show(&mut system, &[a, b]);
        CreditFrameUpdater::new().update(&mut system, &mut images, &mut texts);

        assert_eq!(texts.popup, "<link=\"https://a.example\">A</link>");
        assert_eq!(
            texts.on_screen,
            format!("<link=\"https://a.example\">A</link>{DATA_ATTRIBUTION_LINK}")
        );
    }

    #[test]
    fn test_popup_only_credit() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("Popup only", false);
        let mut images = ImageSlots::<()>::new();
        let mut texts = CreditTexts::default();

        show(&mut system, &[a]);
        CreditFrameUpdater::new().update(&mut system, &mut images, &mut texts);

        assert_eq!(texts.popup, "Popup only");
        assert_eq!(texts.on_screen, DATA_ATTRIBUTION_LINK);
    }

    #[test]
    fn test_all_credits_removed() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("A", true);
        let mut images = ImageSlots::<()>::new();
        let mut display = RecordingDisplay::default();
        let mut updater = CreditFrameUpdater::new();

        show(&mut system, &[a]);
        updater.update(&mut system, &mut images, &mut display);

        // Nothing shown this frame.
        assert!(updater.update(&mut system, &mut images, &mut display));
        assert_eq!(
            display.calls[1],
            (String::new(), DATA_ATTRIBUTION_LINK.to_string())
        );
        assert_eq!(updater.last_credits_count(), 0);
    }

    #[test]
    fn test_markup_converted_once_across_frames() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("<img src='logo.png'> Example", true);
        let b = system.create_credit("B", true);
        let mut images = ImageSlots::<()>::new();
        let mut display = RecordingDisplay::default();
        let mut updater = CreditFrameUpdater::new();

        show(&mut system, &[a]);
        updater.update(&mut system, &mut images, &mut display);
        show(&mut system, &[a, b]);
        updater.update(&mut system, &mut images, &mut display);

        assert_eq!(display.calls.len(), 2);
        assert_eq!(display.calls[0], display.calls[1]);
        assert_eq!(updater.converter().parse_count(), 1);
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_source_always_advances() {
        let mut system = CreditSystem::new();
        let a = system.create_credit("A", true);
        let mut images = ImageSlots::<()>::new();
        let mut display = RecordingDisplay::default();
        let mut updater = CreditFrameUpdater::new();

        // Nothing shown and nothing changed: no recompute, but still advanced.
        assert!(!updater.update(&mut system, &mut images, &mut display));

        show(&mut system, &[a]);
        updater.update(&mut system, &mut images, &mut display);
        assert!(system.credits_to_show_this_frame().is_empty());
        assert_eq!(system.credits_to_no_longer_show_this_frame(), &[a]);
    }
}
