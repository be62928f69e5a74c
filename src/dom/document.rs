//! Document - Arena-based node tree
//!
//! The whole tree lives in one arena owned by `Document`; nodes are
//! addressed by `NodeId` and exposed through the `Copy` handles `NodeRef`
//! and `ElemRef`. The arena is populated once by the builder and never
//! mutated afterwards, so handles can be traversed concurrently without
//! locks. Every collection accessor returns a fresh snapshot.

use std::collections::HashMap;
use std::fmt;

use super::namespace::NsScope;
use super::node::{NodeId, NodeKind, RawName, TreeNode};
use super::strings::{StrId, StringPool};
use super::{Element, ExprResult, Node};
use crate::token::{QName, Token};

/// An immutable node tree in document order
///
/// Constructed by [`crate::dom::builder::TreeBuilder`]; the arena index of
/// a node is its document-order position.
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes, in document order
    pub(crate) nodes: Vec<TreeNode>,
    /// Scope table; scope 0 is the empty scope of the document node
    pub(crate) scopes: Vec<NsScope>,
    /// Interned strings
    pub(crate) strings: StringPool,
    /// The single root element
    pub(crate) root_element: NodeId,
}

impl Document {
    /// Get the document root node (position 0)
    ///
    /// The root node is element-capable: it has children (the root element
    /// plus any top-level comments and processing instructions), an empty
    /// attribute list and an empty namespace scope. It is the only node
    /// with no parent.
    pub fn root(&self) -> ElemRef<'_> {
        ElemRef {
            node: NodeRef { doc: self, id: 0 },
        }
    }

    /// Get the root element
    pub fn root_element(&self) -> ElemRef<'_> {
        ElemRef {
            node: NodeRef {
                doc: self,
                id: self.root_element,
            },
        }
    }

    /// Get a node by its document-order position
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        if (id as usize) < self.nodes.len() {
            Some(NodeRef { doc: self, id })
        } else {
            None
        }
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over every node in document order
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len() as NodeId).map(move |id| NodeRef { doc: self, id })
    }

    /// Resolve a node payload. Ids handed out by this document are always
    /// in range.
    pub(crate) fn data(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id as usize]
    }

    pub(crate) fn str(&self, id: StrId) -> &str {
        self.strings.get(id)
    }

    pub(crate) fn qname(&self, raw: RawName) -> QName {
        QName {
            space: self.str(raw.space).to_string(),
            local: self.str(raw.local).to_string(),
        }
    }
}

/// Handle to a node in a document
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> NodeRef<'d> {
    /// Document-order position of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Kind of this node
    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    /// The document owning this node
    pub fn document(&self) -> &'d Document {
        self.doc
    }

    /// Qualified name: element/attribute/namespace-declaration name, or
    /// the target for processing instructions. Empty for other kinds.
    pub fn name(&self) -> QName {
        self.doc.qname(self.data().name)
    }

    /// Literal value: text content, attribute value, bound namespace URI,
    /// comment text or PI data. Empty for document and element nodes.
    pub fn value(&self) -> &'d str {
        self.doc.str(self.data().value)
    }

    /// Widen to the element capability, if this node carries it
    pub fn as_element(&self) -> Option<ElemRef<'d>> {
        if self.data().is_element_like() {
            Some(ElemRef { node: *self })
        } else {
            None
        }
    }

    fn data(&self) -> &'d TreeNode {
        self.doc.data(self.id)
    }
}

impl ExprResult for NodeRef<'_> {
    /// String value per the markup data model: concatenated descendant
    /// text for document and element nodes, the literal value otherwise.
    fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Document | NodeKind::Element => {
                let elem = ElemRef { node: *self };
                let mut out = String::new();
                for node in elem.descendants() {
                    if node.data().is_text() {
                        out.push_str(node.value());
                    }
                }
                out
            }
            _ => self.value().to_string(),
        }
    }
}

impl<'d> Node<'d> for NodeRef<'d> {
    fn position(&self) -> usize {
        self.id as usize
    }

    /// Reconstruct the token this node was built from. The document root
    /// reports an element start with an empty name.
    fn token(&self) -> Token {
        let data = self.data();
        match data.kind {
            NodeKind::Document => Token::ElementStart(QName::default()),
            NodeKind::Element => Token::ElementStart(self.name()),
            NodeKind::Text => Token::Text(self.value().to_string()),
            NodeKind::Comment => Token::Comment(self.value().to_string()),
            NodeKind::ProcessingInstruction => Token::Pi {
                target: self.doc.str(data.name.local).to_string(),
                data: self.value().to_string(),
            },
            NodeKind::Attribute => Token::Attribute {
                name: self.name(),
                value: self.value().to_string(),
            },
            NodeKind::Namespace => Token::NamespaceDecl {
                name: self.name(),
                uri: self.value().to_string(),
            },
        }
    }

    fn parent(&self) -> Option<ElemRef<'d>> {
        self.data().parent.map(|id| ElemRef {
            node: NodeRef { doc: self.doc, id },
        })
    }
}

impl PartialEq for NodeRef<'_> {
    /// Node identity: same document, same position
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("pos", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

/// Handle to an element-capable node (an element or the document root)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ElemRef<'d> {
    node: NodeRef<'d>,
}

impl<'d> ElemRef<'d> {
    /// Narrow back to the plain node handle
    pub fn as_node(&self) -> NodeRef<'d> {
        self.node
    }

    /// Document-order position of this element
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Qualified name of this element (empty for the document root)
    pub fn name(&self) -> QName {
        self.node.name()
    }

    /// Iterate over all descendants in document order (children,
    /// grandchildren, ...; attributes and namespace nodes excluded)
    pub fn descendants(&self) -> Descendants<'d> {
        let mut stack: Vec<NodeId> = self.node.data().children.clone();
        stack.reverse();
        Descendants {
            doc: self.node.doc,
            stack,
        }
    }
}

impl ExprResult for ElemRef<'_> {
    fn string_value(&self) -> String {
        self.node.string_value()
    }
}

impl<'d> Node<'d> for ElemRef<'d> {
    fn position(&self) -> usize {
        self.node.position()
    }

    fn token(&self) -> Token {
        self.node.token()
    }

    fn parent(&self) -> Option<ElemRef<'d>> {
        self.node.parent()
    }
}

impl<'d> Element<'d> for ElemRef<'d> {
    fn children(&self) -> Vec<NodeRef<'d>> {
        let doc = self.node.doc;
        self.node
            .data()
            .children
            .iter()
            .map(|&id| NodeRef { doc, id })
            .collect()
    }

    fn attributes(&self) -> Vec<NodeRef<'d>> {
        let doc = self.node.doc;
        self.node
            .data()
            .attrs
            .iter()
            .map(|&id| NodeRef { doc, id })
            .collect()
    }

    fn namespaces(&self) -> HashMap<QName, NodeRef<'d>> {
        let doc = self.node.doc;
        let scope = &doc.scopes[self.node.data().scope as usize];
        scope
            .snapshot()
            .into_iter()
            .map(|(raw, id)| (doc.qname(raw), NodeRef { doc, id }))
            .collect()
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&'d str> {
        let doc = self.node.doc;
        let scope = &doc.scopes[self.node.data().scope as usize];
        for (raw, id) in scope.iter() {
            let space = doc.str(raw.space);
            let local = doc.str(raw.local);
            let matched = if prefix.is_empty() {
                space.is_empty() && local == "xmlns"
            } else {
                space == "xmlns" && local == prefix
            };
            if matched {
                return Some(doc.str(doc.data(id).value));
            }
        }
        None
    }
}

impl fmt::Debug for ElemRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElemRef")
            .field("pos", &self.node.id)
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for ElemRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

/// Iterator over descendant nodes (depth-first, document order)
pub struct Descendants<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for Descendants<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse so the first child is visited next
        let children = &self.doc.data(current).children;
        for &child in children.iter().rev() {
            self.stack.push(child);
        }

        Some(NodeRef {
            doc: self.doc,
            id: current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn sample() -> Document {
        // <a xmlns:x="urn:x"><b x:id="1">hi<c/></b><!--note--></a>
        Document::from_tokens(vec![
            Token::ElementStart(QName::local("a")),
            Token::NamespaceDecl {
                name: QName::xmlns_prefix("x"),
                uri: "urn:x".to_string(),
            },
            Token::ElementStart(QName::local("b")),
            Token::Attribute {
                name: QName::new("urn:x", "id"),
                value: "1".to_string(),
            },
            Token::Text("hi".to_string()),
            Token::ElementStart(QName::local("c")),
            Token::ElementEnd(QName::local("c")),
            Token::ElementEnd(QName::local("b")),
            Token::Comment("note".to_string()),
            Token::ElementEnd(QName::local("a")),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_and_root_element() {
        let doc = sample();
        assert_eq!(doc.root().as_node().kind(), NodeKind::Document);
        assert_eq!(doc.root().position(), 0);
        assert!(doc.root().parent().is_none());
        assert_eq!(doc.root_element().name(), QName::local("a"));
    }

    #[test]
    fn test_positions_are_strictly_ordered() {
        let doc = sample();
        let positions: Vec<usize> = doc.nodes().map(|n| n.position()).collect();
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(positions.len(), doc.node_count());
    }

    #[test]
    fn test_parent_links() {
        let doc = sample();
        for node in doc.nodes().skip(1) {
            let parent = node.parent().expect("non-root node must have a parent");
            let in_children = parent.children().contains(&node);
            let in_attrs = parent.attributes().contains(&node);
            let in_ns = parent
                .namespaces()
                .values()
                .any(|ns| ns.id() == node.id());
            assert!(
                in_children || in_attrs || in_ns,
                "node {:?} not reachable from its parent",
                node
            );
        }
    }

    #[test]
    fn test_children_and_attributes_are_disjoint() {
        let doc = sample();
        let b = doc.root_element().children()[0].as_element().unwrap();
        let children = b.children();
        let attrs = b.attributes();
        for attr in &attrs {
            assert!(!children.contains(attr));
        }
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name(), QName::new("urn:x", "id"));
        assert_eq!(attrs[0].value(), "1");
    }

    #[test]
    fn test_returned_collections_are_snapshots() {
        let doc = sample();
        let root = doc.root_element();

        let mut children = root.children();
        let before = children.len();
        children.clear();
        assert_eq!(root.children().len(), before);

        let b = root.children()[0].as_element().unwrap();
        let mut attrs = b.attributes();
        attrs.clear();
        assert_eq!(b.attributes().len(), 1);

        let mut ns = root.namespaces();
        let ns_before = ns.len();
        ns.clear();
        assert_eq!(root.namespaces().len(), ns_before);
    }

    #[test]
    fn test_as_element_capability() {
        let doc = sample();
        assert!(doc.root().as_node().as_element().is_some());
        let b = doc.root_element().children()[0];
        assert!(b.as_element().is_some());
        let attr = b.as_element().unwrap().attributes()[0];
        assert!(attr.as_element().is_none());
        let text = b.as_element().unwrap().children()[0];
        assert_eq!(text.kind(), NodeKind::Text);
        assert!(text.as_element().is_none());
    }

    #[test]
    fn test_string_value() {
        let doc = sample();
        assert_eq!(doc.root_element().string_value(), "hi");
        assert_eq!(doc.root().string_value(), "hi");

        let b = doc.root_element().children()[0].as_element().unwrap();
        let attr = b.attributes()[0];
        assert_eq!(attr.string_value(), "1");
        assert_eq!(attr.to_string(), "1");

        let comment = doc.root_element().children()[1];
        assert_eq!(comment.kind(), NodeKind::Comment);
        assert_eq!(comment.string_value(), "note");
    }

    #[test]
    fn test_token_reconstruction() {
        let doc = sample();
        let root = doc.root_element();
        assert_eq!(root.token(), Token::ElementStart(QName::local("a")));

        let b = root.children()[0].as_element().unwrap();
        assert_eq!(
            b.attributes()[0].token(),
            Token::Attribute {
                name: QName::new("urn:x", "id"),
                value: "1".to_string(),
            }
        );

        let ns = root.namespaces();
        let x = ns.get(&QName::xmlns_prefix("x")).unwrap();
        assert_eq!(
            x.token(),
            Token::NamespaceDecl {
                name: QName::xmlns_prefix("x"),
                uri: "urn:x".to_string(),
            }
        );

        let text = b.children()[0];
        assert_eq!(text.token(), Token::Text("hi".to_string()));

        assert_eq!(
            doc.root().token(),
            Token::ElementStart(QName::default())
        );
    }

    #[test]
    fn test_descendants_order() {
        let doc = sample();
        let kinds: Vec<NodeKind> = doc
            .root_element()
            .descendants()
            .map(|n| n.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Element, // b
                NodeKind::Text,    // hi
                NodeKind::Element, // c
                NodeKind::Comment, // note
            ]
        );
    }

    #[test]
    fn test_lookup_namespace_inherited() {
        let doc = sample();
        let b = doc.root_element().children()[0].as_element().unwrap();
        let c = b.children()[1].as_element().unwrap();
        // c declares nothing; the binding comes from the root element
        assert_eq!(c.lookup_namespace("x"), Some("urn:x"));
        assert_eq!(c.lookup_namespace("y"), None);
        assert_eq!(c.lookup_namespace(""), None);
    }

    #[test]
    fn test_document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }

    #[test]
    fn test_node_lookup_bounds() {
        let doc = sample();
        assert!(doc.node(0).is_some());
        assert!(doc.node(doc.node_count() as NodeId).is_none());
    }
}
