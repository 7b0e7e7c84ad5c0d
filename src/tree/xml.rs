//! XML Decoding
//!
//! Turns an `imgdir` export into a [`Node`] tree. Only the five element kinds
//! the tree models are kept; anything else (`short`, `float`, `uol`, ...) is
//! dropped together with its subtree.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::node::Node;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("document has no root container")]
    NoRoot,
    #[error("document ended inside an open element")]
    UnexpectedEof,
    #[error("document has more than one top-level element")]
    MultipleRoots,
}

/// Element on the open-element stack
enum Frame {
    Node(Node),
    /// Unknown element, or anything nested under a leaf
    Skipped,
}

/// Decode a whole document; its root must be a container.
pub fn parse_document(xml: &str) -> Result<Node, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Start(_) | Event::Empty(_)) && stack.is_empty() && root.is_some() {
            return Err(DecodeError::MultipleRoots);
        }

        match event {
            Event::Start(e) => {
                let frame = if accepts_children(&stack) {
                    decode_element(&e)?.map_or(Frame::Skipped, Frame::Node)
                } else {
                    Frame::Skipped
                };
                stack.push(frame);
            }
            Event::Empty(e) => {
                if accepts_children(&stack) {
                    if let Some(node) = decode_element(&e)? {
                        attach(&mut stack, &mut root, node);
                    }
                }
            }
            Event::End(_) => {
                // quick-xml rejects mismatched end tags, so the stack is balanced here
                if let Some(Frame::Node(node)) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Eof => {
                if !stack.is_empty() {
                    return Err(DecodeError::UnexpectedEof);
                }
                break;
            }
            _ => {}
        }
    }

    match root {
        Some(node) if node.is_container() => Ok(node),
        _ => Err(DecodeError::NoRoot),
    }
}

fn accepts_children(stack: &[Frame]) -> bool {
    match stack.last() {
        None => true,
        Some(Frame::Node(node)) => node.is_container(),
        Some(Frame::Skipped) => false,
    }
}

fn attach(stack: &mut [Frame], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(Frame::Node(parent)) => {
            if let Some(children) = parent.children_mut() {
                children.push(node);
            }
        }
        Some(Frame::Skipped) => {}
        None => *root = Some(node),
    }
}

fn decode_element(e: &BytesStart<'_>) -> Result<Option<Node>, DecodeError> {
    let node = match e.name().as_ref() {
        b"imgdir" => Node::Group {
            name: required(e, "name")?,
            children: Vec::new(),
        },
        b"canvas" => Node::Canvas {
            name: required(e, "name")?,
            width: attribute(e, "width")?.unwrap_or_default(),
            height: attribute(e, "height")?.unwrap_or_default(),
            children: Vec::new(),
        },
        b"int" => Node::Integer {
            name: required(e, "name")?,
            value: required(e, "value")?,
        },
        b"string" => Node::String {
            name: required(e, "name")?,
            value: required(e, "value")?,
        },
        b"vector" => Node::Point {
            name: required(e, "name")?,
            x: required(e, "x")?,
            y: required(e, "y")?,
        },
        _ => return Ok(None),
    };
    Ok(Some(node))
}

fn attribute(e: &BytesStart<'_>, key: &'static str) -> Result<Option<String>, DecodeError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, key: &'static str) -> Result<String, DecodeError> {
    attribute(e, key)?.ok_or_else(|| DecodeError::MissingAttribute {
        element: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attribute: key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<imgdir name="Check.img">
  <imgdir name="1000">
    <imgdir name="0">
      <int name="lvmin" value="10"/>
      <short name="ignored" value="3"/>
      <imgdir name="job">
        <int name="0" value="100"/>
      </imgdir>
    </imgdir>
    <string name="end" value="2010010100"/>
    <canvas name="icon" width="32" height="32">
      <vector name="origin" x="0" y="32"/>
    </canvas>
  </imgdir>
</imgdir>"#;

    #[test]
    fn test_decode_keeps_known_variants_in_order() {
        let root = parse_document(CHECK).unwrap();
        assert_eq!(root.name(), "Check.img");

        let quest = root.child_by_name("1000").unwrap();
        let names: Vec<&str> = quest.children().unwrap().iter().map(Node::name).collect();
        assert_eq!(names, vec!["0", "end", "icon"]);

        let start = quest.child_by_name("0").unwrap();
        assert_eq!(start.children().unwrap().len(), 2);
        assert_eq!(start.get_integer("lvmin").unwrap(), 10);
        assert_eq!(root.child_by_name("1000/0/job/0").unwrap().as_integer().unwrap(), 100);
        assert!(matches!(
            root.child_by_name("1000/icon/origin").unwrap(),
            Node::Point { x, y, .. } if x == "0" && y == "32"
        ));
    }

    #[test]
    fn test_decode_rejects_leaf_root_and_broken_documents() {
        assert!(matches!(
            parse_document(r#"<int name="a" value="1"/>"#),
            Err(DecodeError::NoRoot)
        ));
        assert!(parse_document(r#"<imgdir name="a"><int name="b" value="1"/>"#).is_err());
        assert!(parse_document(r#"<imgdir name="a"></string>"#).is_err());
        assert!(matches!(
            parse_document(r#"<imgdir name="a"><int value="1"/></imgdir>"#),
            Err(DecodeError::MissingAttribute { attribute: "name", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_second_top_level_element() {
        let two_roots = r#"<imgdir name="a"/><imgdir name="b"><int name="x" value="1"/></imgdir>"#;
        assert!(matches!(parse_document(two_roots), Err(DecodeError::MultipleRoots)));
        let trailing_leaf = r#"<imgdir name="a"></imgdir><int name="x" value="1"/>"#;
        assert!(matches!(parse_document(trailing_leaf), Err(DecodeError::MultipleRoots)));
        // Declarations and comments around the root are fine
        let commented = r#"<?xml version="1.0"?><imgdir name="a"/><!-- export -->"#;
        assert_eq!(parse_document(commented).unwrap().name(), "a");
    }
}
