//! Property list codec.
//!
//! Converts between [`PropertyValue`] trees and XML property list documents.
//! Decoding is strict: unknown tags and broken key/value pairing are errors
//! rather than being skipped. Encoding sorts dictionary keys so the same tree
//! always produces the same bytes.

use crate::xml::{self, Element};
use crate::{Dict, Error, PropertyValue};

/// Declaration and doctype written in front of every plist document.
pub const PLIST_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
    "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
);

/// Decode a `<plist>` root element.
pub fn decode(root: &Element) -> Result<PropertyValue, Error> {
    if root.tag != "plist" {
        return Err(Error::malformed(format!(
            "expected <plist> root, found <{}>",
            root.tag
        )));
    }
    match root.children.as_slice() {
        [value] => decode_value(value),
        children => Err(Error::malformed(format!(
            "<plist> must hold exactly one value, found {}",
            children.len()
        ))),
    }
}

/// Decode one value element.
pub fn decode_value(element: &Element) -> Result<PropertyValue, Error> {
    match element.tag.as_str() {
        "dict" => decode_dict(element).map(PropertyValue::Dict),
        "array" => element
            .children
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(PropertyValue::List),
        "string" => Ok(PropertyValue::String(element.text.clone())),
        "integer" => element
            .text
            .trim()
            .parse()
            .map(PropertyValue::Integer)
            .map_err(|_| Error::malformed(format!("bad <integer> {:?}", element.text))),
        "real" => element
            .text
            .trim()
            .parse()
            .map(PropertyValue::Real)
            .map_err(|_| Error::malformed(format!("bad <real> {:?}", element.text))),
        "true" => Ok(PropertyValue::Bool(true)),
        "false" => Ok(PropertyValue::Bool(false)),
        other => Err(Error::malformed(format!("unsupported plist tag <{}>", other))),
    }
}

fn decode_dict(element: &Element) -> Result<Dict, Error> {
    let mut dict = Dict::with_capacity(element.children.len() / 2);
    let mut pending: Option<String> = None;

    for child in &element.children {
        match (child.tag.as_str(), pending.take()) {
            ("key", None) => pending = Some(child.text.clone()),
            ("key", Some(key)) => {
                return Err(Error::malformed(format!("key {:?} has no value", key)))
            }
            (_, None) => {
                return Err(Error::malformed(format!(
                    "<{}> in <dict> without a key",
                    child.tag
                )))
            }
            (_, Some(key)) => {
                let value = decode_value(child)?;
                if dict.insert(key.clone(), value).is_some() {
                    return Err(Error::malformed(format!("key {:?} repeated", key)));
                }
            }
        }
    }

    if let Some(key) = pending {
        return Err(Error::malformed(format!("key {:?} has no value", key)));
    }
    Ok(dict)
}

/// Encode a dictionary-rooted tree into a `<plist>` element.
pub fn encode(value: &PropertyValue) -> Result<Element, Error> {
    match value {
        PropertyValue::Dict(_) => Ok(wrap(encode_value(value))),
        other => Err(Error::InvalidRootType {
            expected: "dict",
            found: other.type_name(),
        }),
    }
}

/// Encode a list-rooted document. Only layer contents use this shape.
pub fn encode_list(items: &[PropertyValue]) -> Element {
    wrap(Element {
        tag: "array".to_string(),
        children: items.iter().map(encode_value).collect(),
        ..Default::default()
    })
}

fn wrap(value: Element) -> Element {
    Element::new("plist")
        .with_attr("version", "1.0")
        .with_child(value)
}

/// Encode one value element. Dictionary keys are emitted in sorted order.
pub fn encode_value(value: &PropertyValue) -> Element {
    match value {
        PropertyValue::Dict(dict) => {
            let mut entries: Vec<(&String, &PropertyValue)> = dict.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut element = Element::new("dict");
            for (key, value) in entries {
                element.push(Element::new("key").with_text(key.as_str()));
                element.push(encode_value(value));
            }
            element
        }
        PropertyValue::List(items) => Element {
            tag: "array".to_string(),
            children: items.iter().map(encode_value).collect(),
            ..Default::default()
        },
        PropertyValue::String(s) => Element::new("string").with_text(s.as_str()),
        PropertyValue::Integer(i) => Element::new("integer").with_text(i.to_string()),
        PropertyValue::Real(r) => Element::new("real").with_text(format!("{:?}", r)),
        PropertyValue::Bool(true) => Element::new("true"),
        PropertyValue::Bool(false) => Element::new("false"),
    }
}

/// Parse plist document bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<PropertyValue, Error> {
    decode(&xml::parse(bytes)?)
}

/// Serialize a dictionary-rooted tree to plist document bytes.
pub fn to_bytes(value: &PropertyValue) -> Result<Vec<u8>, Error> {
    Ok(xml::write(&encode(value)?, PLIST_HEADER))
}

/// Serialize a list-rooted plist document.
pub fn list_to_bytes(items: &[PropertyValue]) -> Vec<u8> {
    xml::write(&encode_list(items), PLIST_HEADER)
}
