//! XML text codec for [`XmlNode`] trees.
//!
//! Parsing reads quick-xml events into an owned tree. Rendering walks a tree
//! and writes quick-xml events, escaping attribute values and text.
//!
//! Whitespace-only text is dropped and text mixed with child elements is
//! trimmed. Comments, processing instructions and doctype declarations are
//! skipped.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ModelError, Result};
use crate::node::XmlNode;

/// Parses `xml` into a tree rooted at its document element.
///
/// # Examples
///
/// ```
/// use datamodels::xml::parse;
///
/// let node = parse(r#"<person id="7"><name>Ann</name></person>"#)?;
/// assert_eq!(node.attribute("id"), Some("7"));
/// assert_eq!(node.child("name").map(|n| n.text()), Some("Ann"));
/// # Ok::<(), datamodels::ModelError>(())
/// ```
pub fn parse(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| malformed(position, format!("XML parse error: {}", e)))?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root, &stack, position)?;
                stack.push(open_element(&start, position)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, &stack, position)?;
                let node = open_element(&start, position)?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| malformed(position, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(text) => {
                let content = String::from_utf8_lossy(text.as_ref());
                append_text(&mut stack, &content, position)?;
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(data.as_ref());
                append_text(&mut stack, &content, position)?;
            }
            Event::GeneralRef(reference) => {
                let resolved = resolve_reference(&reference, position)?;
                append_text(&mut stack, &resolved, position)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            reader.buffer_position() as u64,
            format!("unexpected end of input inside <{}>", open.name),
        ));
    }
    root.ok_or_else(|| malformed(0, "document has no root element"))
}

/// Renders `node` as compact XML without a declaration.
pub fn render(node: &XmlNode) -> Result<String> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new(&mut buffer);
    write_node(&mut writer, node)?;
    into_string(buffer)
}

/// Renders `node` with an XML declaration and `indent` spaces per level.
pub fn render_pretty(node: &XmlNode, indent: usize) -> Result<String> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', indent);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(render_error)?;
    write_node(&mut writer, node)?;
    into_string(buffer)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    let mut element = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        element.push_attribute((key.as_str(), value.as_str()));
    }

    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && node.children.is_empty() {
        writer
            .write_event(Event::Empty(element))
            .map_err(render_error)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(element))
        .map_err(render_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(render_error)?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(render_error)?;

    Ok(())
}

fn open_element(start: &BytesStart, position: u64) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr =
            attr.map_err(|e| malformed(position, format!("Failed to parse attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(position, format!("Invalid attribute value: {}", e)))?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, mut node: XmlNode) {
    // Entity references split text into several events, so whitespace is
    // only normalized once the element is complete.
    if let Some(text) = node.text.take() {
        if !text.trim().is_empty() {
            node.text = Some(if node.children.is_empty() {
                text
            } else {
                text.trim().to_string()
            });
        }
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn ensure_single_root(root: &Option<XmlNode>, stack: &[XmlNode], position: u64) -> Result<()> {
    if stack.is_empty() && root.is_some() {
        return Err(malformed(position, "multiple root elements"));
    }
    Ok(())
}

fn append_text(stack: &mut [XmlNode], content: &str, position: u64) -> Result<()> {
    match stack.last_mut() {
        Some(node) => {
            node.text.get_or_insert_with(String::new).push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(malformed(position, "text outside of the root element")),
    }
}

fn resolve_reference(reference: &BytesRef, position: u64) -> Result<String> {
    let name = String::from_utf8_lossy(reference.as_ref()).to_string();
    let resolved = match name.as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|code| {
            let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            parsed.and_then(char::from_u32)
        }),
    };
    resolved
        .map(String::from)
        .ok_or_else(|| malformed(position, format!("unknown entity reference &{};", name)))
}

fn into_string(buffer: Vec<u8>) -> Result<String> {
    String::from_utf8(buffer).map_err(|e| ModelError::Render(e.to_string()))
}

fn render_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Render(err.to_string())
}

fn malformed(position: u64, message: impl Into<String>) -> ModelError {
    ModelError::MalformedDocument {
        position,
        message: message.into(),
    }
}
