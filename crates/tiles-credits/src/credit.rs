//! Credit registry and the per-frame credit lists.

use std::collections::HashMap;

/// Opaque reference to a credit registered with a [`CreditSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Credit(usize);

/// Read access to the credits that should be displayed each frame.
pub trait CreditSource {
    /// Credits to show this frame, in the order they were added.
    fn credits_to_show_this_frame(&self) -> &[Credit];

    /// Credits shown last frame that are not shown this frame.
    fn credits_to_no_longer_show_this_frame(&self) -> &[Credit];

    /// The raw markup of `credit`.
    fn html(&self, credit: Credit) -> &str;

    /// Whether `credit` should appear on screen, not only in the popup.
    fn should_be_shown_on_screen(&self, credit: Credit) -> bool;

    /// Advance to the next frame's credit state.
    fn start_next_frame(&mut self);
}

#[derive(Debug, Clone)]
struct CreditRecord {
    html: String,
    show_on_screen: bool,
}

/// Owns all credits and tracks which ones are shown each frame.
///
/// Producers (tilesets, raster overlays) call
/// [`add_credit_to_frame`](Self::add_credit_to_frame) for every credit they
/// need while rendering a frame; the display side reads the resulting lists
/// and then calls [`start_next_frame`](CreditSource::start_next_frame).
#[derive(Debug, Default, Clone)]
pub struct CreditSystem {
    credits: Vec<CreditRecord>,
    by_html: HashMap<String, Credit>,
    to_show_this_frame: Vec<Credit>,
    to_no_longer_show_this_frame: Vec<Credit>,
}

impl CreditSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credit, or return the existing credit with the same markup.
    ///
    /// When the markup is already registered, its original `show_on_screen`
    /// flag is kept.
    pub fn create_credit(&mut self, html: &str, show_on_screen: bool) -> Credit {
        if let Some(&credit) = self.by_html.get(html) {
            return credit;
        }

        let credit = Credit(self.credits.len());
        self.credits.push(CreditRecord {
            html: html.to_string(),
            show_on_screen,
        });
        self.by_html.insert(html.to_string(), credit);
        credit
    }

    /// Number of registered credits.
    #[must_use]
    pub fn credit_count(&self) -> usize {
        self.credits.len()
    }

    /// Mark `credit` as needed this frame.
    pub fn add_credit_to_frame(&mut self, credit: Credit) {
        if self.to_show_this_frame.contains(&credit) {
            return;
        }
        self.to_show_this_frame.push(credit);

        // Still shown, so it has not stopped being shown.
        self.to_no_longer_show_this_frame.retain(|&c| c != credit);
    }

    fn record(&self, credit: Credit) -> Option<&CreditRecord> {
        self.credits.get(credit.0)
    }
}

impl CreditSource for CreditSystem {
    fn credits_to_show_this_frame(&self) -> &[Credit] {
        &self.to_show_this_frame
    }

    fn credits_to_no_longer_show_this_frame(&self) -> &[Credit] {
        &self.to_no_longer_show_this_frame
    }

    fn html(&self, credit: Credit) -> &str {
        self.record(credit).map_or("", |record| record.html.as_str())
    }

    fn should_be_shown_on_screen(&self, credit: Credit) -> bool {
        self.record(credit).is_some_and(|record| record.show_on_screen)
    }

    fn start_next_frame(&mut self) {
        std::mem::swap(
            &mut self.to_no_longer_show_this_frame,
            &mut self.to_show_this_frame,
        );
        self.to_show_this_frame.clear();
    }
}
