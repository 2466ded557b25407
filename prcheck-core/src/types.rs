use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ===== GENERIC DOCUMENT TREE =====
// Both inputs (the XFDL form and the ODS content.xml) are reduced to this
// tree before anything else looks at them.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    /// Qualified name as written in the source, e.g. "custom:date"
    pub name: String,
    /// Namespace URI the prefix resolved to, if any
    pub namespace: Option<String>,
    pub attributes: Vec<NodeAttribute>,
    pub children: Vec<NodeChild>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeChild {
    Element(DocNode),
    Text(String),
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map(|(_, local)| local).unwrap_or(qname)
}

impl DocNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Attribute by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute by namespace URI and local name
    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && local_part(&a.name) == local)
            .map(|a| a.value.as_str())
    }

    /// Direct element children
    pub fn elements(&self) -> impl Iterator<Item = &DocNode> {
        self.children.iter().filter_map(|child| match child {
            NodeChild::Element(node) => Some(node),
            NodeChild::Text(_) => None,
        })
    }

    /// All descendant elements with the given qualified name, pre-order.
    /// The node itself is never included.
    pub fn descendants(&self, name: &str) -> Vec<&DocNode> {
        let mut found = Vec::new();
        self.collect_descendants(&|node| node.name == name, &mut found);
        found
    }

    /// All descendant elements in `namespace` with the given local name, pre-order.
    pub fn descendants_ns(&self, namespace: &str, local: &str) -> Vec<&DocNode> {
        let mut found = Vec::new();
        self.collect_descendants(
            &|node| node.namespace.as_deref() == Some(namespace) && node.local_name() == local,
            &mut found,
        );
        found
    }

    pub fn first_descendant(&self, name: &str) -> Option<&DocNode> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    fn collect_descendants<'a>(
        &'a self,
        predicate: &dyn Fn(&DocNode) -> bool,
        found: &mut Vec<&'a DocNode>,
    ) {
        for child in self.elements() {
            if predicate(child) {
                found.push(child);
            }
            child.collect_descendants(predicate, found);
        }
    }

    /// Concatenated text of all descendants, depth-first pre-order.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.append_text(&mut text);
        text
    }

    fn append_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                NodeChild::Element(node) => node.append_text(out),
                NodeChild::Text(t) => out.push_str(t),
            }
        }
    }
}

// ===== FORM DOCUMENT =====

/// One of the two physical sides of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Page {
    One,
    Two,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::One, Page::Two];

    /// Parse the page column of a rule row. Only the literal strings "1" and "2" count.
    pub fn from_cell(cell: &str) -> Option<Page> {
        match cell {
            "1" => Some(Page::One),
            "2" => Some(Page::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Page::One => 1,
            Page::Two => 2,
        }
    }
}

/// The three kinds of form items that carry rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckGroup {
    Fields,
    Checks,
    Popups,
}

impl CheckGroup {
    pub const ALL: [CheckGroup; 3] = [CheckGroup::Fields, CheckGroup::Checks, CheckGroup::Popups];

    /// XFDL element name for items of this group
    pub fn tag(self) -> &'static str {
        match self {
            CheckGroup::Fields => "field",
            CheckGroup::Checks => "check",
            CheckGroup::Popups => "popup",
        }
    }
}

/// A decoded target form: type, version and the two page roots
#[derive(Debug, Clone)]
pub struct FormDocument {
    /// Raw title text from the global page
    pub title: String,
    /// Short type code such as "OPR" or "EPR"
    pub document_type: String,
    pub version: String,
    pub page1: DocNode,
    pub page2: DocNode,
}

impl FormDocument {
    pub fn page(&self, page: Page) -> &DocNode {
        match page {
            Page::One => &self.page1,
            Page::Two => &self.page2,
        }
    }
}

/// Field identifier → raw text, in document order.
///
/// Re-inserting a key replaces the value but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    entries: IndexMap<String, String>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

// ===== RULES WORKBOOK =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Workbook {
    /// Sheet by exact name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, children: Vec<NodeChild>) -> NodeChild {
        NodeChild::Element(DocNode {
            name: name.to_string(),
            children,
            ..DocNode::default()
        })
    }

    fn text(t: &str) -> NodeChild {
        NodeChild::Text(t.to_string())
    }

    #[test]
    fn test_text_concatenates_mixed_content_in_order() {
        let root = DocNode {
            name: "value".to_string(),
            children: vec![
                text("Led "),
                element("b", vec![text("25"), element("i", vec![text(" Amn")])]),
                text(" daily"),
            ],
            ..DocNode::default()
        };
        assert_eq!(root.text(), "Led 25 Amn daily");
    }

    #[test]
    fn test_descendants_excludes_self_and_keeps_document_order() {
        let root = DocNode {
            name: "field".to_string(),
            children: vec![
                element("field", vec![element("field", vec![])]),
                element("other", vec![element("field", vec![])]),
            ],
            ..DocNode::default()
        };
        assert_eq!(root.descendants("field").len(), 3);
        assert!(root.first_descendant("missing").is_none());
    }

    #[test]
    fn test_form_values_reinsert_keeps_position() {
        let mut values = FormValues::new();
        values.insert("a", "1");
        values.insert("b", "2");
        values.insert("a", "3");
        let keys: Vec<_> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(values.get("a"), Some("3"));
    }

    #[test]
    fn test_form_values_lookup_on_large_sections() {
        let values: FormValues = (0..5000).map(|i| (format!("FIELD{i}"), i.to_string())).collect();
        assert_eq!(values.len(), 5000);
        assert_eq!(values.get("FIELD4999"), Some("4999"));
        assert_eq!(values.get("FIELD5000"), None);
        assert_eq!(values.iter().next(), Some(("FIELD0", "0")));
        assert_eq!(values.iter().last(), Some(("FIELD4999", "4999")));
    }

    #[test]
    fn test_page_from_cell_accepts_only_literal_numbers() {
        assert_eq!(Page::from_cell("1"), Some(Page::One));
        assert_eq!(Page::from_cell("2"), Some(Page::Two));
        assert_eq!(Page::from_cell("1.0"), None);
        assert_eq!(Page::from_cell(""), None);
    }
}
