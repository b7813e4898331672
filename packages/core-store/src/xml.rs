//! Minimal XML element tree.
//!
//! Property lists, glyph files and the single-document backend all share
//! this representation. It keeps attribute order, drops whitespace between
//! child elements and keeps leaf text verbatim.

use indexmap::IndexMap;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::Error;

/// XML declaration written in front of every generated document.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// One element with its attributes, child elements and text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, Error> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::malformed(e.to_string()))?
        .to_string();

    let mut element = Element::new(tag);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let name = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| Error::malformed(e.to_string()))?
            .to_string();
        let value = attribute.unescape_value()?.into_owned();
        if element.attributes.insert(name.clone(), value).is_some() {
            return Err(Error::malformed(format!(
                "attribute '{}' repeated on <{}>",
                name, element.tag
            )));
        }
    }
    Ok(element)
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), Error> {
    let mut element = element;
    if !element.children.is_empty() && element.text.trim().is_empty() {
        element.text.clear();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::malformed("more than one root element")),
    }
    Ok(())
}

/// Parse a document into its root element.
pub fn parse(bytes: &[u8]) -> Result<Element, Error> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::malformed(e.to_string()))?;
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => attach(start_element(&start)?, &mut stack, &mut root)?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::malformed("unexpected closing tag"))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(Error::malformed("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let data =
                    std::str::from_utf8(&data).map_err(|e| Error::malformed(e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(data),
                    None => return Err(Error::malformed("CDATA outside the root element")),
                }
            }
            Event::Eof => break,
            // Declarations, doctypes, comments and processing instructions
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::malformed("unexpected end of document"));
    }
    root.ok_or_else(|| Error::malformed("document has no root element"))
}

// Writing into a Vec cannot fail, so write results are dropped.
fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) {
    let mut start = BytesStart::new(element.tag.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        let _ = writer.write_event(Event::Empty(start));
        return;
    }

    let _ = writer.write_event(Event::Start(start));
    if element.children.is_empty() {
        let text = partial_escape(&element.text);
        let _ = writer.write_event(Event::Text(BytesText::from_escaped(text)));
    } else {
        for child in &element.children {
            write_element(writer, child);
        }
    }
    let _ = writer.write_event(Event::End(BytesEnd::new(element.tag.as_str())));
}

/// Serialize an element tree, tab indented, after `header`.
pub fn write(root: &Element, header: &str) -> Vec<u8> {
    let mut writer = Writer::new_with_indent(header.as_bytes().to_vec(), b'\t', 1);
    write_element(&mut writer, root);
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_attribute_order_and_children() {
        let root = parse(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<glyph name="A" format="2">
	<advance width="500"/>
	<note>two
lines</note>
</glyph>
"#,
        )
        .unwrap();

        assert_eq!(root.tag, "glyph");
        let names: Vec<&str> = root.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["name", "format"]);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.text, "");
        assert_eq!(root.child("advance").unwrap().attr("width"), Some("500"));
        assert_eq!(root.child("note").unwrap().text, "two\nlines");
    }

    #[test]
    fn entities_are_unescaped() {
        let root = parse(br#"<string a="&lt;&amp;">x &amp; y</string>"#).unwrap();
        assert_eq!(root.attr("a"), Some("<&"));
        assert_eq!(root.text, "x & y");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            parse(b"<a><b></a>"),
            Err(Error::MalformedDocument { .. })
        ));
        assert!(parse(b"<a>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a/><b/>").is_err());
        assert!(parse(b"<a x=\"1\" x=\"2\"/>").is_err());
        assert!(parse(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn write_indents_with_tabs() {
        let root = Element::new("dict")
            .with_child(Element::new("key").with_text("a"))
            .with_child(Element::new("string").with_text("x < y"))
            .with_child(Element::new("true"));

        let bytes = write(&root, XML_DECLARATION);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <dict>\n\
             \t<key>a</key>\n\
             \t<string>x &lt; y</string>\n\
             \t<true/>\n\
             </dict>\n"
        );
    }

    #[test]
    fn written_documents_parse_back() {
        let root = Element::new("font")
            .with_attr("creator", "org.fontstore")
            .with_child(Element::new("features").with_text("feature liga {\n} liga;"))
            .with_child(Element::new("glyphs").with_attr("name", "public.default"));

        let parsed = parse(&write(&root, XML_DECLARATION)).unwrap();
        assert_eq!(parsed, root);
    }
}
