//! Reading converted credit text back into spans.
//!
//! Display sinks that cannot interpret the rich-text tags directly use
//! [`rich_text_spans`] to get structured runs of text, links and sprites.

/// A run of rich text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichSpan {
    Text {
        text: String,
        link: Option<String>,
        underline: bool,
    },
    /// A credit image, by its index in the image list.
    Sprite { index: usize, link: Option<String> },
}

const LINK_OPEN: &str = "<link=\"";
const LINK_CLOSE: &str = "</link>";
const SPRITE_OPEN: &str = "<sprite name=\"credit-image-";
const NOPARSE_OPEN: &str = "<noparse>";
const NOPARSE_CLOSE: &str = "</noparse>";
const UNDERLINE_OPEN: &str = "<u>";
const UNDERLINE_CLOSE: &str = "</u>";

/// Split credit rich text into spans.
///
/// Unrecognized tags are kept as literal text.
#[must_use]
pub fn rich_text_spans(rich_text: &str) -> Vec<RichSpan> {
    let mut spans = Vec::new();
    let mut link: Option<String> = None;
    let mut underline = false;
    let mut text = String::new();
    let mut rest = rich_text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(LINK_OPEN)
            && let Some(end) = after.find("\">")
        {
            flush(&mut spans, &mut text, link.as_ref(), underline);
            link = Some(after[..end].to_string());
            rest = &after[end + 2..];
        } else if let Some(after) = rest.strip_prefix(LINK_CLOSE) {
            flush(&mut spans, &mut text, link.as_ref(), underline);
            link = None;
            rest = after;
        } else if let Some(after) = rest.strip_prefix(NOPARSE_OPEN) {
            // Kept verbatim; an unterminated span runs to the end.
            let end = after.find(NOPARSE_CLOSE).unwrap_or(after.len());
            text.push_str(&after[..end]);
            rest = after.get(end + NOPARSE_CLOSE.len()..).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix(UNDERLINE_OPEN) {
            flush(&mut spans, &mut text, link.as_ref(), underline);
            underline = true;
            rest = after;
        } else if let Some(after) = rest.strip_prefix(UNDERLINE_CLOSE) {
            flush(&mut spans, &mut text, link.as_ref(), underline);
            underline = false;
            rest = after;
        } else if let Some(after) = rest.strip_prefix(SPRITE_OPEN)
            && let Some(end) = after.find("\">")
            && let Ok(index) = after[..end].parse::<usize>()
        {
            flush(&mut spans, &mut text, link.as_ref(), underline);
            spans.push(RichSpan::Sprite {
                index,
                link: link.clone(),
            });
            rest = &after[end + 2..];
        } else {
            // Copy up to the next possible tag.
            let first = rest.chars().next().map_or(1, char::len_utf8);
            let next = rest[first..].find('<').map_or(rest.len(), |i| i + first);
            text.push_str(&rest[..next]);
            rest = &rest[next..];
        }
    }
    flush(&mut spans, &mut text, link.as_ref(), underline);

    spans
}

fn flush(spans: &mut Vec<RichSpan>, text: &mut String, link: Option<&String>, underline: bool) {
    if !text.is_empty() {
        spans.push(RichSpan::Text {
            text: std::mem::take(text),
            link: link.cloned(),
            underline,
        });
    }
}
