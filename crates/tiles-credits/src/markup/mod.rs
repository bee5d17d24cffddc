//! Attribution markup trees.
//!
//! Credits arrive as small fragments of HTML written by data providers, and
//! they are not always well formed. [`parse_markup`] always produces a
//! [`Document`], repairing what it can and reporting what it found as
//! [`Diagnostic`]s. Only diagnostics with [`Severity::Error`] mean the markup
//! should not be displayed.

mod entities;
mod parse;

use std::fmt;

pub use parse::parse_markup;

/// A parsed markup fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level nodes in source order.
    pub children: Vec<Node>,
}

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Character data with references already decoded.
    Text(String),
    /// An element and its subtree.
    Element(Element),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name.
    pub tag: String,
    /// Attributes in source order, names lower-cased.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of the first attribute with the given (lower-case) name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this is an `<img>` element.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.tag == "img"
    }
}

/// How serious a parse diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The markup was repaired; output is still meaningful.
    Warning,
    /// The markup could not be understood; output must be discarded.
    Error,
}

/// A problem found while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Byte offset into the source where the problem was found.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level} at byte {}: {}", self.offset, self.message)
    }
}

/// The result of parsing a markup string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMarkup {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedMarkup {
    /// Whether any diagnostic is fatal.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Iterate over the non-fatal diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Every element name the parser accepts.
const KNOWN_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "b", "base", "bdi", "bdo", "big",
    "blockquote", "body", "br", "caption", "center", "cite", "code", "col", "colgroup", "dd",
    "del", "details", "dfn", "div", "dl", "dt", "em", "embed", "figcaption", "figure", "font",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "i", "img",
    "input", "ins", "kbd", "label", "li", "link", "main", "mark", "meta", "nav", "nobr", "ol",
    "p", "param", "picture", "pre", "q", "s", "samp", "section", "small", "source", "span",
    "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "time", "title", "tr", "track", "tt", "u", "ul", "var", "wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn is_known_element(tag: &str) -> bool {
    KNOWN_ELEMENTS.contains(&tag)
}
