//! XML → DocNode tree builder
//!
//! Builds the generic node tree that both input formats are reduced to.
//! Namespace prefixes are resolved with a scope stack so the ODS loader can
//! query by namespace URI while the XFDL side keeps querying by the names
//! as written (`custom:date`).

use crate::error::LoadError;
use crate::types::{DocNode, NodeAttribute, NodeChild};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Name of the synthetic node wrapping the document element
pub const DOCUMENT_NODE: &str = "#document";

/// Parse XML text into a tree rooted at a synthetic `#document` node.
///
/// The wrapper lets `descendants()` find the document element itself, the
/// same way a DOM `getElementsByTagName` on the document does.
pub fn parse_document(xml: &str) -> Result<DocNode, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<DocNode> = vec![DocNode::new(DOCUMENT_NODE)];
    let mut scopes = NamespaceScopes::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let node = open_element(&e, &mut scopes)?;
                stack.push(node);
            }
            Event::Empty(e) => {
                let node = open_element(&e, &mut scopes)?;
                scopes.pop();
                append_child(&mut stack, NodeChild::Element(node))?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(LoadError::Xml("unexpected closing tag".to_string()));
                }
                if let Some(node) = stack.pop() {
                    scopes.pop();
                    append_child(&mut stack, NodeChild::Element(node))?;
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if !text.is_empty() {
                    append_child(&mut stack, NodeChild::Text(text.into_owned()))?;
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_child(&mut stack, NodeChild::Text(text))?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) if document.name == DOCUMENT_NODE => {
            if document.elements().next().is_none() {
                return Err(LoadError::Xml("document has no root element".to_string()));
            }
            Ok(document)
        }
        _ => Err(LoadError::Xml("unclosed element at end of input".to_string())),
    }
}

fn append_child(stack: &mut [DocNode], child: NodeChild) -> Result<(), LoadError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(child);
            Ok(())
        }
        None => Err(LoadError::Xml("content outside the document".to_string())),
    }
}

/// Prefix declarations of every open element, innermost last
#[derive(Default)]
struct NamespaceScopes {
    scopes: Vec<Vec<(String, String)>>,
}

impl NamespaceScopes {
    fn push(&mut self, declarations: Vec<(String, String)>) {
        self.scopes.push(declarations);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }
}

fn split_qname(qname: &str) -> (&str, &str) {
    qname.split_once(':').unwrap_or(("", qname))
}

fn open_element(e: &BytesStart<'_>, scopes: &mut NamespaceScopes) -> Result<DocNode, LoadError> {
    let name = decode_name(e.name().as_ref())?;

    let mut raw_attributes = Vec::new();
    let mut declarations = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = decode_name(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), value));
        } else {
            raw_attributes.push((key, value));
        }
    }
    // An element's own declarations apply to its name and attributes
    scopes.push(declarations);

    let (prefix, _) = split_qname(&name);
    let namespace = scopes.resolve(prefix);

    let attributes = raw_attributes
        .into_iter()
        .map(|(key, value)| {
            // Unprefixed attributes carry no namespace
            let namespace = match split_qname(&key) {
                ("", _) => None,
                (prefix, _) => scopes.resolve(prefix),
            };
            NodeAttribute {
                name: key,
                namespace,
                value,
            }
        })
        .collect();

    Ok(DocNode {
        name,
        namespace,
        attributes,
        children: Vec::new(),
    })
}

fn decode_name(bytes: &[u8]) -> Result<String, LoadError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| LoadError::Xml(format!("invalid UTF-8 in name: {e}")))
}
