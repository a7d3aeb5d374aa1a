//! Minimal element tree over an XML document.
//!
//! Every element remembers its exact byte span in the source text and the
//! namespace declarations it inherits, so a signed element can later be cut
//! out and canonicalized on its own.

use std::collections::HashSet;
use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};

/// Deepest element nesting accepted.
const MAX_DEPTH: usize = 64;

/// An element with its attributes, text and children.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    /// Qualified name as written, e.g. `saml:Assertion`.
    pub qname: String,
    /// Local part of the name.
    pub local: String,
    /// Attributes as `(qualified key, unescaped value)`, namespace
    /// declarations included.
    pub attrs: Vec<(String, String)>,
    /// `xmlns` declarations made by ancestors, nearest winning.
    pub inherited_ns: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated unescaped character data of this element (not descendants).
    pub text: String,
    /// Byte range of the element in the source, from `<` to the closing `>`.
    pub span: Range<usize>,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local == local)
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local == local)
    }

    /// Trimmed text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Trimmed text of the first child named `local`.
    pub fn child_text(&self, local: &str) -> Option<String> {
        self.child(local).map(|c| c.text().to_string())
    }

    /// Namespace declarations made on this element itself.
    fn own_ns(&self) -> impl Iterator<Item = &(String, String)> {
        self.attrs.iter().filter(|(k, _)| is_ns_decl(k))
    }

    /// Declarations in scope for this element's children.
    fn scope_for_children(&self) -> Vec<(String, String)> {
        let mut scope = self.inherited_ns.clone();
        for (key, value) in self.own_ns() {
            match scope.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1.clone_from(value),
                None => scope.push((key.clone(), value.clone())),
            }
        }
        scope
    }

    /// Byte offset just past the qualified name in the start tag.
    fn name_end(&self) -> usize {
        self.span.start + 1 + self.qname.len()
    }

    /// Re-serializes this element as a standalone fragment.
    ///
    /// Inherited namespace declarations are written onto the start tag and the
    /// byte range `cut` (a descendant's span) is left out.
    pub fn standalone_fragment(&self, source: &str, cut: Option<&Range<usize>>) -> SamlResult<String> {
        let name_end = self.name_end();
        let mut out = String::with_capacity(self.span.len() + 256);
        out.push_str(slice(source, self.span.start..name_end)?);

        for (key, value) in &self.inherited_ns {
            if self.attr(key).is_none() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
        }

        match cut {
            Some(cut) if cut.start >= name_end && cut.end <= self.span.end => {
                out.push_str(slice(source, name_end..cut.start)?);
                out.push_str(slice(source, cut.end..self.span.end)?);
            }
            Some(_) => return Err(SamlError::malformed("cut range outside element")),
            None => out.push_str(slice(source, name_end..self.span.end)?),
        }
        Ok(out)
    }
}

/// Parses `xml` into its root element.
///
/// DTDs are refused outright. Duplicate `ID` attributes anywhere in the
/// document make it malformed, so an ID always names exactly one element.
pub(crate) fn parse_document(xml: &str) -> SamlResult<Element> {
    let mut reader = Reader::from_str(xml);
    // Whitespace is significant for signed content.
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut ids = HashSet::new();

    loop {
        let event_start = usize::try_from(reader.buffer_position())
            .map_err(|_| SamlError::malformed("document too large"))?;
        let event = reader.read_event()?;
        let position = usize::try_from(reader.buffer_position())
            .map_err(|_| SamlError::malformed("document too large"))?;

        match event {
            Event::Start(e) => {
                let element = open_element(xml, &e, event_start..position, stack.last(), &mut ids)?;
                if stack.len() >= MAX_DEPTH {
                    return Err(SamlError::malformed("document nested too deeply"));
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = open_element(xml, &e, event_start..position, stack.last(), &mut ids)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| SamlError::malformed("unbalanced end tag"))?;
                element.span.end = position;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| SamlError::malformed(format!("bad character data: {e}")))?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(SamlError::malformed("text outside the root element")),
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    let raw = std::str::from_utf8(&c)
                        .map_err(|e| SamlError::malformed(format!("invalid UTF-8: {e}")))?;
                    top.text.push_str(raw);
                }
            }
            Event::DocType(_) => return Err(SamlError::malformed("DTDs are not allowed")),
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SamlError::malformed("unclosed element"));
    }
    root.ok_or_else(|| SamlError::malformed("empty document"))
}

fn open_element(
    xml: &str,
    tag: &BytesStart<'_>,
    span: Range<usize>,
    parent: Option<&Element>,
    ids: &mut HashSet<String>,
) -> SamlResult<Element> {
    // The reader may skip a leading byte order mark before the first tag.
    let raw = slice(xml, span.clone())?;
    let open = raw.find('<').ok_or_else(|| SamlError::malformed("start tag not found"))?;
    if raw[open + 1..].contains('<') {
        return Err(SamlError::malformed("'<' inside a start tag"));
    }
    let span = span.start + open..span.end;

    let qname = utf8(tag.name().as_ref())?.to_string();
    let local = utf8(tag.local_name().as_ref())?.to_string();

    let mut attrs = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| SamlError::malformed(format!("bad attribute: {e}")))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| SamlError::malformed(format!("bad attribute value: {e}")))?
            .into_owned();
        if key == "ID" && !ids.insert(value.clone()) {
            return Err(SamlError::malformed(format!("duplicate ID {value}")));
        }
        attrs.push((key, value));
    }

    Ok(Element {
        qname,
        local,
        attrs,
        inherited_ns: parent.map(Element::scope_for_children).unwrap_or_default(),
        children: Vec::new(),
        text: String::new(),
        span,
    })
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> SamlResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(SamlError::malformed("multiple root elements")),
    }
    Ok(())
}

fn is_ns_decl(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

fn utf8(bytes: &[u8]) -> SamlResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| SamlError::malformed(format!("invalid UTF-8: {e}")))
}

fn slice(source: &str, range: Range<usize>) -> SamlResult<&str> {
    source
        .get(range)
        .ok_or_else(|| SamlError::malformed("element span out of bounds"))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}
