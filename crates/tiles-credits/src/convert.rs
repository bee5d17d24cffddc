//! Markup to rich-text conversion.
//!
//! The output uses the tag dialect of the engine's text renderer:
//!
//! - `<link="URL">…</link>` for hyperlinked text and images
//! - `<sprite name="credit-image-N">` for the N-th loaded credit image
//! - `<noparse><</noparse>` for a literal `<` in credit text

use std::fmt::Write as _;

use crate::image::{ImageLoader, reserve_image};
use crate::markup::{Node, parse_markup};

/// Name of the sprite that displays the credit image at `index`.
#[must_use]
pub fn credit_image_name(index: usize) -> String {
    format!("credit-image-{index}")
}

/// A `<` that the text renderer shows instead of parsing as a tag.
const LITERAL_LESS_THAN: &str = "<noparse><</noparse>";

/// Append `text` so that none of it is read as a rich-text tag.
fn push_literal(output: &mut String, text: &str) {
    for (i, part) in text.split('<').enumerate() {
        if i > 0 {
            output.push_str(LITERAL_LESS_THAN);
        }
        output.push_str(part);
    }
}

/// A link target that cannot end the `<link="…">` attribute early.
fn link_target(href: &str) -> String {
    href.replace('"', "%22")
}

/// Converts attribution markup into rich text.
///
/// Images referenced by the markup are requested from an [`ImageLoader`] as a
/// side effect of conversion.
#[derive(Debug, Default)]
pub struct MarkupConverter {
    parse_count: usize,
}

impl MarkupConverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markup strings parsed by this converter so far.
    #[must_use]
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }

    /// Convert `markup` into rich text.
    ///
    /// Returns an empty string if the markup contains a fatal error. Images
    /// that were encountered before the error was detected are not requested,
    /// since parsing finishes before any output is produced.
    pub fn convert<L: ImageLoader + ?Sized>(&mut self, markup: &str, images: &mut L) -> String {
        self.parse_count += 1;
        let parsed = parse_markup(markup);

        for warning in parsed.warnings() {
            tracing::debug!("credit markup {warning}");
        }

        if parsed.has_errors() {
            for diagnostic in &parsed.diagnostics {
                tracing::warn!("discarding credit markup {markup:?}: {diagnostic}");
            }
            return String::new();
        }

        let mut output = String::new();
        let mut current_link = String::new();
        write_nodes(
            &mut output,
            &mut current_link,
            &parsed.document.children,
            images,
        );
        output
    }
}

/// Append the rich text for `nodes` to `output`.
///
/// `current_link` is shared by the whole traversal: an `href` replaces it for
/// the element's subtree and for every node visited after it.
fn write_nodes<L: ImageLoader + ?Sized>(
    output: &mut String,
    current_link: &mut String,
    nodes: &[Node],
    images: &mut L,
) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                // Only a single trailing newline is dropped. Text left empty
                // emits nothing, not even an empty link.
                let text = text.strip_suffix('\n').unwrap_or(text);
                if text.is_empty() {
                    continue;
                }
                if current_link.is_empty() {
                    push_literal(output, text);
                } else {
                    let _ = write!(output, "<link=\"{current_link}\">");
                    push_literal(output, text);
                    output.push_str("</link>");
                }
            }
            Node::Element(element) => {
                if element.is_image()
                    && let Some(src) = element.attribute("src")
                {
                    let index = reserve_image(images, src);
                    let sprite = format!("<sprite name=\"{}\">", credit_image_name(index));
                    if current_link.is_empty() {
                        output.push_str(&sprite);
                    } else {
                        let _ = write!(output, "<link=\"{current_link}\">{sprite}</link>");
                    }
                }

                if let Some(href) = element.attribute("href") {
                    *current_link = link_target(href);
                }

                write_nodes(output, current_link, &element.children, images);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageSlots;
    use crate::rich_text::{RichSpan, rich_text_spans};

    fn convert(markup: &str) -> (String, ImageSlots) {
        let mut images = ImageSlots::new();
        let output = MarkupConverter::new().convert(markup, &mut images);
        (output, images)
    }

    #[test]
    fn test_plain_text() {
        let (output, images) = convert("Imagery \u{a9} 2024 Example Maps");
        assert_eq!(output, "Imagery \u{a9} 2024 Example Maps");
        assert!(images.is_empty());
    }

    #[test]
    fn test_link_wraps_text() {
        let (output, _) = convert("<a href='X'>hi</a>");
        assert_eq!(output, "<link=\"X\">hi</link>");
    }

    #[test]
    fn test_images_use_increasing_indices() {
        let mut images = ImageSlots::<()>::new();
        images.reserve("https://example.com/already-loaded.png");
        images.reserve("https://example.com/also-loaded.png");

        let output =
            MarkupConverter::new().convert("<img src='a.png'><img src='b.png'>", &mut images);

        assert_eq!(
            output,
            "<sprite name=\"credit-image-2\"><sprite name=\"credit-image-3\">"
        );
        assert_eq!(images.get(2).map(|slot| slot.url.as_str()), Some("a.png"));
        assert_eq!(images.get(3).map(|slot| slot.url.as_str()), Some("b.png"));
    }

    #[test]
    fn test_linked_image() {
        let (output, images) =
            convert("<a href=\"https://ion.example\"><img src=\"logo.png\"></a>");
        assert_eq!(
            output,
            "<link=\"https://ion.example\"><sprite name=\"credit-image-0\"></link>"
        );
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_image_without_source_is_skipped() {
        let (output, images) = convert("<img alt='logo'>text");
        assert_eq!(output, "text");
        assert!(images.is_empty());
    }

    #[test]
    fn test_link_persists_for_later_siblings() {
        let (output, _) = convert("<a href='X'>one</a> two");
        assert_eq!(output, "<link=\"X\">one</link><link=\"X\"> two</link>");
    }

    #[test]
    fn test_inner_link_overrides_outer() {
        let (output, _) = convert("<span href='A'>a<a href='B'>b</a>c</span>");
        assert_eq!(
            output,
            "<link=\"A\">a</link><link=\"B\">b</link><link=\"B\">c</link>"
        );
    }

    #[test]
    fn test_empty_href_clears_link() {
        let (output, _) = convert("<a href='X'>x</a><a href=''>y</a>");
        assert_eq!(output, "<link=\"X\">x</link>y");
    }

    #[test]
    fn test_single_trailing_newline_stripped() {
        let (output, _) = convert("<span>line\n\n</span><b>\n</b>end");
        assert_eq!(output, "line\nend");
    }

    #[test]
    fn test_nested_formatting_is_flattened() {
        let (output, _) = convert("<p>Data <b>provided</b> by <i>someone</i></p>");
        assert_eq!(output, "Data provided by someone");
    }

    #[test]
    fn test_fatal_markup_yields_empty_string() {
        let mut images = ImageSlots::<()>::new();
        let mut converter = MarkupConverter::new();
        let output = converter.convert("<img src='a.png'><marquee>x</marquee>", &mut images);

        assert_eq!(output, "");
        assert!(images.is_empty());
        assert_eq!(converter.parse_count(), 1);
    }

    #[test]
    fn test_repairable_markup_still_converts() {
        let (output, _) = convert("<a href='X'>unclosed");
        assert_eq!(output, "<link=\"X\">unclosed</link>");
    }

    #[test]
    fn test_escaped_tags_stay_text() {
        let (output, _) = convert("<a href='X'>a &lt;/link&gt;b</a>");
        assert_eq!(output, "<link=\"X\">a <noparse><</noparse>/link>b</link>");
        assert_eq!(
            rich_text_spans(&output),
            vec![RichSpan::Text {
                text: "a </link>b".to_string(),
                link: Some("X".to_string()),
                underline: false,
            }]
        );

        let (output, images) = convert("&lt;sprite name=\"credit-image-0\"&gt; plain");
        assert!(images.is_empty());
        assert_eq!(
            rich_text_spans(&output),
            vec![RichSpan::Text {
                text: "<sprite name=\"credit-image-0\"> plain".to_string(),
                link: None,
                underline: false,
            }]
        );
    }

    #[test]
    fn test_quote_in_href_is_percent_encoded() {
        let (output, _) = convert("<a href='https://x.test/?q=&quot;y'>q</a>");
        assert_eq!(output, "<link=\"https://x.test/?q=%22y\">q</link>");
        assert_eq!(
            rich_text_spans(&output),
            vec![RichSpan::Text {
                text: "q".to_string(),
                link: Some("https://x.test/?q=%22y".to_string()),
                underline: false,
            }]
        );
    }

    #[test]
    fn test_empty_linked_text_emits_nothing() {
        let (output, _) = convert("<a href='X'>\n</a><a href=''>\n</a>");
        assert_eq!(output, "");
    }

    #[test]
    fn test_credit_image_name() {
        assert_eq!(credit_image_name(0), "credit-image-0");
        assert_eq!(credit_image_name(12), "credit-image-12");
    }
}
