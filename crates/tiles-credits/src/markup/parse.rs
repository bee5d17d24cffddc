//! Tolerant markup parser.
//!
//! Handles the subset of HTML that shows up in data attribution: elements,
//! attributes, text, character references and comments. Structural problems
//! are repaired the way a browser would and reported as warnings. Only
//! unrecognized element names are reported as errors.

use super::entities::decode_reference;
use super::{
    Diagnostic, Document, Element, Node, ParsedMarkup, Severity, is_known_element,
    is_void_element,
};

/// Parse a markup fragment into a tree.
///
/// This never fails: every input produces a document, possibly accompanied by
/// diagnostics describing what had to be repaired.
#[must_use]
pub fn parse_markup(source: &str) -> ParsedMarkup {
    let mut parser = Parser::new(source);
    parser.run();
    parser.finish()
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    offset: usize,
    /// Top-level nodes of the fragment.
    root: Vec<Node>,
    /// Currently open elements, innermost last.
    open: Vec<Element>,
    /// Pending character data not yet attached to the tree.
    text: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            offset: 0,
            root: Vec::new(),
            open: Vec::new(),
            text: String::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.offset < self.bytes.len() {
            let rest = &self.source[self.offset..];
            if rest.starts_with("<!--") {
                self.skip_comment();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration();
            } else if rest.starts_with("</") && self.is_alpha_at(self.offset + 2) {
                self.end_tag();
            } else if rest.starts_with('<') && self.is_alpha_at(self.offset + 1) {
                self.start_tag();
            } else if rest.starts_with('<') {
                self.warn(self.offset, "unescaped '<' treated as text");
                self.text.push('<');
                self.offset += 1;
            } else if rest.starts_with('&') {
                self.reference();
            } else {
                let end = rest.find(['<', '&']).unwrap_or(rest.len());
                self.text.push_str(&rest[..end]);
                self.offset += end;
            }
        }
    }

    fn finish(mut self) -> ParsedMarkup {
        self.flush_text();
        while let Some(element) = self.open.last() {
            let message = format!("missing </{}>", element.tag);
            self.warn(self.bytes.len(), message);
            self.close_innermost();
        }

        ParsedMarkup {
            document: Document {
                children: self.root,
            },
            diagnostics: self.diagnostics,
        }
    }

    fn is_alpha_at(&self, index: usize) -> bool {
        self.bytes.get(index).is_some_and(u8::is_ascii_alphabetic)
    }

    fn warn(&mut self, offset: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            offset,
            message: message.into(),
        });
    }

    fn error(&mut self, offset: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            offset,
            message: message.into(),
        });
    }

    /// Attach a node to the innermost open element, or the root.
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.append(Node::Text(text));
        }
    }

    fn close_innermost(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn reference(&mut self) {
        let rest = &self.source[self.offset..];
        if let Some((c, consumed)) = decode_reference(rest) {
            self.text.push(c);
            self.offset += consumed;
        } else {
            self.warn(self.offset, "unescaped '&' treated as text");
            self.text.push('&');
            self.offset += 1;
        }
    }

    fn skip_comment(&mut self) {
        let body = self.offset + 4;
        match self.source[body..].find("-->") {
            Some(end) => self.offset = body + end + 3,
            None => {
                self.warn(self.offset, "unterminated comment");
                self.offset = self.bytes.len();
            }
        }
    }

    fn skip_declaration(&mut self) {
        match self.source[self.offset..].find('>') {
            Some(end) => self.offset += end + 1,
            None => {
                self.warn(self.offset, "unterminated declaration");
                self.offset = self.bytes.len();
            }
        }
    }

    /// Read a tag name starting at `index`, returning it lower-cased.
    fn tag_name(&self, index: usize) -> (String, usize) {
        let mut end = index;
        while end < self.bytes.len()
            && (self.bytes[end].is_ascii_alphanumeric() || matches!(self.bytes[end], b'-' | b':'))
        {
            end += 1;
        }
        (self.source[index..end].to_ascii_lowercase(), end)
    }

    fn skip_whitespace(&self, mut index: usize) -> usize {
        while index < self.bytes.len() && self.bytes[index].is_ascii_whitespace() {
            index += 1;
        }
        index
    }

    fn start_tag(&mut self) {
        let bytes = self.bytes;
        let tag_start = self.offset;
        let (tag, mut pos) = self.tag_name(self.offset + 1);
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            pos = self.skip_whitespace(pos);
            match bytes.get(pos) {
                None => {
                    self.warn(tag_start, format!("unterminated <{tag}>"));
                    break;
                }
                Some(b'>') => {
                    pos += 1;
                    break;
                }
                Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                    self_closing = true;
                    pos += 2;
                    break;
                }
                Some(b'/') => pos += 1,
                Some(_) => match self.attribute(pos) {
                    Some((name, value, next)) => {
                        attributes.push((name, value));
                        pos = next;
                    }
                    None => {
                        // Not an attribute name; skip one character.
                        let skipped = self.source[pos..]
                            .chars()
                            .next()
                            .map_or(1, char::len_utf8);
                        self.warn(pos, format!("unexpected character in <{tag}>"));
                        pos += skipped;
                    }
                },
            }
        }

        self.offset = pos;
        self.flush_text();

        if !is_known_element(&tag) {
            self.error(tag_start, format!("<{tag}> is not recognized"));
        }

        let element = Element {
            tag,
            attributes,
            children: Vec::new(),
        };
        if self_closing || is_void_element(&element.tag) {
            self.append(Node::Element(element));
        } else {
            self.open.push(element);
        }
    }

    /// Parse one attribute at `pos`, returning its name, value and the
    /// position after it.
    fn attribute(&mut self, pos: usize) -> Option<(String, String, usize)> {
        let (source, bytes) = (self.source, self.bytes);
        let mut end = pos;
        while end < bytes.len()
            && !bytes[end].is_ascii_whitespace()
            && !matches!(bytes[end], b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
        {
            end += 1;
        }
        if end == pos {
            return None;
        }
        let name = source[pos..end].to_ascii_lowercase();

        let after_name = self.skip_whitespace(end);
        if bytes.get(after_name) != Some(&b'=') {
            return Some((name, String::new(), end));
        }

        let value_start = self.skip_whitespace(after_name + 1);
        let quote = bytes
            .get(value_start)
            .copied()
            .filter(|b| matches!(b, b'"' | b'\''));
        let (raw, next) = if let Some(quote) = quote {
            let body = value_start + 1;
            if let Some(len) = source[body..].find(char::from(quote)) {
                (&source[body..body + len], body + len + 1)
            } else {
                self.warn(value_start, format!("unterminated value for '{name}'"));
                (&source[body..], bytes.len())
            }
        } else {
            let mut value_end = value_start;
            while value_end < bytes.len()
                && !bytes[value_end].is_ascii_whitespace()
                && bytes[value_end] != b'>'
            {
                value_end += 1;
            }
            (&source[value_start..value_end], value_end)
        };

        Some((name, decode_attribute(raw), next))
    }

    fn end_tag(&mut self) {
        let tag_start = self.offset;
        let (tag, pos) = self.tag_name(self.offset + 2);
        match self.source[pos..].find('>') {
            Some(end) => self.offset = pos + end + 1,
            None => {
                self.warn(tag_start, format!("unterminated </{tag}>"));
                self.offset = self.bytes.len();
            }
        }

        self.flush_text();

        let Some(index) = self.open.iter().rposition(|e| e.tag == tag) else {
            self.warn(tag_start, format!("discarding unexpected </{tag}>"));
            return;
        };

        while self.open.len() > index + 1 {
            if let Some(inner) = self.open.last() {
                let message = format!("missing </{}> before </{tag}>", inner.tag);
                self.warn(tag_start, message);
            }
            self.close_innermost();
        }
        self.close_innermost();
    }
}

/// Decode character references in an attribute value, keeping unknown ones.
fn decode_attribute(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];
        if let Some((c, consumed)) = decode_reference(rest) {
            decoded.push(c);
            rest = &rest[consumed..];
        } else {
            decoded.push('&');
            rest = &rest[1..];
        }
    }
    decoded.push_str(rest);
    decoded
}
