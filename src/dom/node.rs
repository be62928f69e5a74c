//! Node Storage
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. A node's
//! id doubles as its document-order position: the builder pushes nodes into
//! the arena in discovery order and never reassigns them.

use super::namespace::ScopeId;
use super::strings::StrId;

/// Compact node identifier (index into the arena). Ids are assigned in
/// document order, so comparing ids compares document positions.
pub type NodeId = u32;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Attribute node
    Attribute,
    /// Namespace binding node
    Namespace,
}

/// Interned qualified name: (namespace, local) string ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct RawName {
    /// Namespace URI id (or the `xmlns` marker space for declarations)
    pub space: StrId,
    /// Local name id; holds the target for processing instructions
    pub local: StrId,
}

/// A node in the arena
///
/// One payload type covers every kind; the unused fields of a given kind
/// stay empty. Attributes and namespace bindings are owned by their element
/// but never appear in its child list.
#[derive(Debug)]
pub(crate) struct TreeNode {
    /// Kind of this node
    pub kind: NodeKind,
    /// Parent node (None for the document root only)
    pub parent: Option<NodeId>,
    /// Qualified name (elements, attributes, namespace bindings, PI target)
    pub name: RawName,
    /// Literal value: text content, attribute value, namespace URI,
    /// comment text or PI data
    pub value: StrId,
    /// Child nodes in document order (document and element nodes)
    pub children: Vec<NodeId>,
    /// Attribute nodes in token order (element nodes)
    pub attrs: Vec<NodeId>,
    /// Namespace nodes materialized on this element, in token order
    pub ns_decls: Vec<NodeId>,
    /// Namespace scope visible at this node
    pub scope: ScopeId,
}

impl TreeNode {
    /// Create the document root node
    pub fn document() -> Self {
        TreeNode {
            kind: NodeKind::Document,
            parent: None,
            name: RawName::default(),
            value: 0,
            children: Vec::new(),
            attrs: Vec::new(),
            ns_decls: Vec::new(),
            scope: 0,
        }
    }

    /// Create an element node
    pub fn element(name: RawName, parent: NodeId, scope: ScopeId) -> Self {
        TreeNode {
            kind: NodeKind::Element,
            parent: Some(parent),
            name,
            value: 0,
            children: Vec::new(),
            attrs: Vec::new(),
            ns_decls: Vec::new(),
            scope,
        }
    }

    /// Create a text node
    pub fn text(value: StrId, parent: NodeId, scope: ScopeId) -> Self {
        Self::leaf(NodeKind::Text, RawName::default(), value, parent, scope)
    }

    /// Create a comment node
    pub fn comment(value: StrId, parent: NodeId, scope: ScopeId) -> Self {
        Self::leaf(NodeKind::Comment, RawName::default(), value, parent, scope)
    }

    /// Create a processing instruction node
    pub fn processing_instruction(
        target: StrId,
        data: StrId,
        parent: NodeId,
        scope: ScopeId,
    ) -> Self {
        let name = RawName {
            space: 0,
            local: target,
        };
        Self::leaf(NodeKind::ProcessingInstruction, name, data, parent, scope)
    }

    /// Create an attribute node
    pub fn attribute(name: RawName, value: StrId, parent: NodeId, scope: ScopeId) -> Self {
        Self::leaf(NodeKind::Attribute, name, value, parent, scope)
    }

    /// Create a namespace binding node
    pub fn namespace(name: RawName, uri: StrId, parent: NodeId, scope: ScopeId) -> Self {
        Self::leaf(NodeKind::Namespace, name, uri, parent, scope)
    }

    fn leaf(kind: NodeKind, name: RawName, value: StrId, parent: NodeId, scope: ScopeId) -> Self {
        TreeNode {
            kind,
            parent: Some(parent),
            name,
            value,
            children: Vec::new(),
            attrs: Vec::new(),
            ns_decls: Vec::new(),
            scope,
        }
    }

    /// Check if this node can carry children and attributes
    #[inline]
    pub fn is_element_like(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element)
    }

    /// Check if this is a text node
    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }
}
