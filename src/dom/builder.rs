//! Tree Builder
//!
//! Consumes a markup token stream and populates the document arena.
//! Push-style: feed tokens one at a time with [`TreeBuilder::token`], then
//! publish the finished tree with [`TreeBuilder::finish`]. A malformed or
//! unbalanced stream is rejected with a [`BuildError`]; no partially built
//! tree is ever returned, since the builder is consumed by `finish`.

use thiserror::Error;
use tracing::{debug, instrument, trace};

use super::document::Document;
use super::namespace::{ns, NsScope, ScopeId};
use super::node::{NodeId, RawName, TreeNode};
use super::strings::StringPool;
use crate::token::{QName, Token};

/// Construction-time rejection of a malformed token stream
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// End tag arrived with no element open
    #[error("end tag {0} with no open element")]
    UnexpectedEndTag(QName),

    /// End tag does not match the innermost open element
    #[error("mismatched end tag: {expected} closed by {found}")]
    MismatchedEndTag {
        /// Name of the innermost open element
        expected: QName,
        /// Name carried by the end tag
        found: QName,
    },

    /// Attribute or namespace declaration with no element open
    #[error("attribute {0} outside any element")]
    AttributeOutsideElement(QName),

    /// Attribute or namespace declaration after the element's content began
    #[error("attribute {0} after element content")]
    AttributeAfterContent(QName),

    /// Same attribute or declaration name twice on one element
    #[error("duplicate attribute {0}")]
    DuplicateAttribute(QName),

    /// Attempt to rebind the reserved `xml` or `xmlns` prefixes
    #[error("namespace prefix {0} is reserved")]
    ReservedPrefix(QName),

    /// A second element at document level
    #[error("document has multiple root elements")]
    MultipleRootElements,

    /// Non-whitespace character data at document level
    #[error("text content outside the root element")]
    TextOutsideRoot,

    /// `finish` called while elements are still open
    #[error("unclosed element {0}")]
    UnclosedElement(QName),

    /// `finish` called before any root element was seen
    #[error("document has no root element")]
    NoRootElement,
}

/// Builds a [`Document`] from a token stream
///
/// The single arena-push counter is the document-order counter: an
/// element's node is pushed when its start token arrives, its attribute
/// and namespace nodes as their tokens arrive, its children after that.
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
    scopes: Vec<NsScope>,
    strings: StringPool,
    /// Open elements; entry 0 is the document node
    stack: Vec<NodeId>,
    root_element: Option<NodeId>,
    /// Content seen for the innermost open element (attributes close then)
    content_started: bool,
    /// Pre-interned `{xmlns}xml`
    xml_name: RawName,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a builder holding an empty document node
    pub fn new() -> Self {
        let mut strings = StringPool::new();
        let xml_name = RawName {
            space: strings.intern("xmlns"),
            local: strings.intern("xml"),
        };
        TreeBuilder {
            nodes: vec![TreeNode::document()],
            scopes: vec![NsScope::new()],
            strings,
            stack: vec![0],
            root_element: None,
            content_started: false,
            xml_name,
        }
    }

    /// Consume one token from the stream
    #[instrument(level = "trace", skip(self))]
    pub fn token(&mut self, token: Token) -> Result<(), BuildError> {
        match token {
            Token::ElementStart(name) => self.start_element(name),
            Token::ElementEnd(name) => self.end_element(name),
            Token::Attribute { name, value } => {
                // Tolerate tokenizers that do not split declarations out
                if name.is_xmlns() {
                    self.namespace_decl(name, value)
                } else {
                    self.attribute(name, value)
                }
            }
            Token::NamespaceDecl { name, uri } => self.namespace_decl(name, uri),
            Token::Text(value) => self.text(value),
            Token::Comment(value) => {
                let parent = self.top();
                let scope = self.nodes[parent as usize].scope;
                let value_id = self.strings.intern(&value);
                let id = self.push_node(TreeNode::comment(value_id, parent, scope));
                self.nodes[parent as usize].children.push(id);
                self.content_started = true;
                Ok(())
            }
            Token::Pi { target, data } => {
                let parent = self.top();
                let scope = self.nodes[parent as usize].scope;
                let target_id = self.strings.intern(&target);
                let data_id = self.strings.intern(&data);
                let node = TreeNode::processing_instruction(target_id, data_id, parent, scope);
                let id = self.push_node(node);
                self.nodes[parent as usize].children.push(id);
                self.content_started = true;
                Ok(())
            }
        }
    }

    /// Validate balance, then publish the immutable tree
    pub fn finish(self) -> Result<Document, BuildError> {
        if self.stack.len() > 1 {
            let top = *self.stack.last().unwrap_or(&0);
            return Err(BuildError::UnclosedElement(
                self.qname_of(self.nodes[top as usize].name),
            ));
        }
        let root_element = self.root_element.ok_or(BuildError::NoRootElement)?;
        debug!(
            nodes = self.nodes.len(),
            scopes = self.scopes.len(),
            "document built"
        );
        Ok(Document {
            nodes: self.nodes,
            scopes: self.scopes,
            strings: self.strings,
            root_element,
        })
    }

    fn start_element(&mut self, name: QName) -> Result<(), BuildError> {
        let parent = self.top();
        if parent == 0 && self.root_element.is_some() {
            return Err(BuildError::MultipleRootElements);
        }

        let raw = self.intern_name(&name);
        let scope = self.nodes[parent as usize].scope;
        let id = self.push_node(TreeNode::element(raw, parent, scope));
        self.nodes[parent as usize].children.push(id);

        if parent == 0 {
            self.root_element = Some(id);
            self.bind_xml(id);
        }

        self.stack.push(id);
        self.content_started = false;
        Ok(())
    }

    fn end_element(&mut self, name: QName) -> Result<(), BuildError> {
        if self.stack.len() == 1 {
            return Err(BuildError::UnexpectedEndTag(name));
        }
        let top = self.top();
        let raw = self.nodes[top as usize].name;
        if self.strings.get(raw.space) != name.space || self.strings.get(raw.local) != name.local {
            return Err(BuildError::MismatchedEndTag {
                expected: self.qname_of(raw),
                found: name,
            });
        }
        self.stack.pop();
        self.content_started = true;
        Ok(())
    }

    fn attribute(&mut self, name: QName, value: String) -> Result<(), BuildError> {
        let elem = self.open_element_for(&name)?;
        let raw = self.intern_name(&name);
        if self.has_attribute_name(elem, raw) {
            return Err(BuildError::DuplicateAttribute(name));
        }
        let value_id = self.strings.intern(&value);
        let scope = self.nodes[elem as usize].scope;
        let id = self.push_node(TreeNode::attribute(raw, value_id, elem, scope));
        self.nodes[elem as usize].attrs.push(id);
        Ok(())
    }

    fn namespace_decl(&mut self, name: QName, uri: String) -> Result<(), BuildError> {
        let elem = self.open_element_for(&name)?;

        // The xml prefix is pre-bound; accept a redundant redeclaration,
        // refuse rebinding it or touching xmlns itself
        if name.space == "xmlns" && name.local == "xml" {
            if uri == ns::XML {
                trace!("ignoring redundant xml prefix declaration");
                return Ok(());
            }
            return Err(BuildError::ReservedPrefix(name));
        }
        if name.space == "xmlns" && name.local == "xmlns" {
            return Err(BuildError::ReservedPrefix(name));
        }

        let raw = self.intern_name(&name);
        if self.has_attribute_name(elem, raw) {
            return Err(BuildError::DuplicateAttribute(name));
        }

        let scope = self.ensure_own_scope(elem);
        if uri.is_empty() {
            // xmlns="" (or an empty prefixed URI) un-declares the binding
            // for this subtree; no namespace node is materialized
            self.scopes[scope as usize].unbind(raw);
            trace!(name = %name, "namespace binding removed");
            return Ok(());
        }

        let uri_id = self.strings.intern(&uri);
        let id = self.push_node(TreeNode::namespace(raw, uri_id, elem, scope));
        self.nodes[elem as usize].ns_decls.push(id);
        self.scopes[scope as usize].bind(raw, id);
        Ok(())
    }

    fn text(&mut self, value: String) -> Result<(), BuildError> {
        if self.stack.len() == 1 {
            let whitespace = value
                .bytes()
                .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
            if whitespace {
                trace!("skipping whitespace at document level");
                return Ok(());
            }
            return Err(BuildError::TextOutsideRoot);
        }
        let parent = self.top();
        let scope = self.nodes[parent as usize].scope;
        let value_id = self.strings.intern(&value);
        let id = self.push_node(TreeNode::text(value_id, parent, scope));
        self.nodes[parent as usize].children.push(id);
        self.content_started = true;
        Ok(())
    }

    /// Innermost open node (the document node when no element is open)
    fn top(&self) -> NodeId {
        *self.stack.last().unwrap_or(&0)
    }

    /// The element an attribute-like token attaches to
    fn open_element_for(&self, name: &QName) -> Result<NodeId, BuildError> {
        if self.stack.len() == 1 {
            return Err(BuildError::AttributeOutsideElement(name.clone()));
        }
        if self.content_started {
            return Err(BuildError::AttributeAfterContent(name.clone()));
        }
        Ok(self.top())
    }

    fn has_attribute_name(&self, elem: NodeId, raw: RawName) -> bool {
        let node = &self.nodes[elem as usize];
        node.attrs
            .iter()
            .chain(node.ns_decls.iter())
            .any(|&id| self.nodes[id as usize].name == raw)
    }

    /// Give an element its own scope entry, cloned from its parent's, the
    /// first time it declares a binding. Attribute and namespace nodes
    /// created before the first declaration are re-pointed at it.
    fn ensure_own_scope(&mut self, elem: NodeId) -> ScopeId {
        let cur = self.nodes[elem as usize].scope;
        let parent_scope = match self.nodes[elem as usize].parent {
            Some(p) => self.nodes[p as usize].scope,
            None => return cur,
        };
        if cur != parent_scope {
            return cur;
        }

        let new_id = self.scopes.len() as ScopeId;
        let cloned = self.scopes[cur as usize].clone();
        self.scopes.push(cloned);
        self.nodes[elem as usize].scope = new_id;

        let owned: Vec<NodeId> = {
            let node = &self.nodes[elem as usize];
            node.attrs.iter().chain(node.ns_decls.iter()).copied().collect()
        };
        for id in owned {
            self.nodes[id as usize].scope = new_id;
        }
        new_id
    }

    /// Materialize the implicit `xml` prefix binding on the root element
    fn bind_xml(&mut self, elem: NodeId) {
        let scope = self.ensure_own_scope(elem);
        let uri_id = self.strings.intern(ns::XML);
        let id = self.push_node(TreeNode::namespace(self.xml_name, uri_id, elem, scope));
        self.nodes[elem as usize].ns_decls.push(id);
        self.scopes[scope as usize].bind(self.xml_name, id);
    }

    fn push_node(&mut self, node: TreeNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    fn intern_name(&mut self, name: &QName) -> RawName {
        RawName {
            space: self.strings.intern(&name.space),
            local: self.strings.intern(&name.local),
        }
    }

    fn qname_of(&self, raw: RawName) -> QName {
        QName {
            space: self.strings.get(raw.space).to_string(),
            local: self.strings.get(raw.local).to_string(),
        }
    }
}

impl Document {
    /// Build a document from a whole token stream
    pub fn from_tokens<I>(tokens: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut builder = TreeBuilder::new();
        for token in tokens {
            builder.token(token)?;
        }
        builder.finish()
    }
}
