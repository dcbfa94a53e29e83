//! XML adapter
//!
//! Elements become object fields named after the tag. Repeated sibling tags
//! collect into an array. An element with only text becomes that text; one
//! that also has children or kept attributes stores its text under
//! `text_node_name`.
//!
//! ```text
//! <users><user id="1">ada</user><user id="2">bob</user></users>
//! ```
//!
//! with `--attributes` becomes
//!
//! ```text
//! {"users": {"user": [{"@_id": 1, "#text": "ada"}, {"@_id": 2, "#text": "bob"}]}}
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use super::AdapterError;
use crate::ast::XmlOptions;
use crate::value::{Map, Value};

/// An element whose end tag has not been read yet.
struct Frame {
    name: String,
    attributes: Map,
    children: Map,
    text: String,
}

/// Parse an XML document.
pub fn parse(text: &str, options: &XmlOptions) -> Result<Value, AdapterError> {
    debug!(bytes = text.len(), attributes = options.attributes, "parsing XML payload");

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut root = Map::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AdapterError::Xml(e.to_string()))?;
        match event {
            Event::Start(start) => stack.push(open(&start, options)?),
            Event::Empty(start) => {
                let frame = open(&start, options)?;
                let (name, value) = close(frame, options);
                attach(stack.last_mut().map_or(&mut root, |f| &mut f.children), name, value);
            }
            Event::Text(t) => {
                let content = t.unescape().map_err(|e| AdapterError::Xml(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&content);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| AdapterError::Xml("unexpected closing tag".to_string()))?;
                let (name, value) = close(frame, options);
                attach(stack.last_mut().map_or(&mut root, |f| &mut f.children), name, value);
            }
            Event::Eof => break,
            _ => {} // declarations, comments, processing instructions
        }
    }

    if let Some(frame) = stack.last() {
        return Err(AdapterError::Xml(format!("unclosed element <{}>", frame.name)));
    }
    Ok(Value::Object(root))
}

fn open(start: &BytesStart<'_>, options: &XmlOptions) -> Result<Frame, AdapterError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Map::new();
    if options.attributes {
        for attr in start.attributes() {
            let attr = attr.map_err(|e| AdapterError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref());
            let raw = attr
                .unescape_value()
                .map_err(|e| AdapterError::Xml(e.to_string()))?;
            attributes.insert(
                format!("{}{}", options.attribute_prefix, key),
                scalar(&raw, options),
            );
        }
    }
    Ok(Frame {
        name,
        attributes,
        children: Map::new(),
        text: String::new(),
    })
}

fn close(frame: Frame, options: &XmlOptions) -> (String, Value) {
    let Frame {
        name,
        attributes,
        children,
        text,
    } = frame;

    if attributes.is_empty() && children.is_empty() {
        return (name, scalar(&text, options));
    }

    let mut out = attributes;
    out.extend(children);
    if !text.is_empty() {
        out.insert(options.text_node_name.clone(), scalar(&text, options));
    }
    (name, Value::Object(out))
}

/// Add a child under `name`, turning repeated names into an array.
fn attach(parent: &mut Map, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

fn scalar(text: &str, options: &XmlOptions) -> Value {
    if !options.parse_values {
        return Value::String(text.to_string());
    }
    match text {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        t if looks_numeric(t) => t
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(t.to_string())),
        t => Value::String(t.to_string()),
    }
}

fn looks_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
