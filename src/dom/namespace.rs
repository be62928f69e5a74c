//! Namespace Scopes
//!
//! Per-element cache of the namespace bindings visible at that point in the
//! tree. Scopes are computed once during construction by overlaying an
//! element's own declarations on its parent's scope; elements that declare
//! nothing share their parent's scope entry. Reads go through `snapshot`,
//! which returns an independent copy of the binding table.

use std::collections::HashMap;

use super::node::{NodeId, RawName};

/// Well-known namespace URIs
pub mod ns {
    /// Namespace bound to the reserved `xml` prefix on every document
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Namespace of the `xmlns` declaration attributes themselves
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Index into the document's scope table
pub(crate) type ScopeId = u32;

/// Namespace bindings visible at one element
///
/// Keyed by the declaring attribute's qualified name (`{xmlns}p` or
/// `{}xmlns`), valued by the namespace node carrying the binding. The map
/// itself is never handed out; `snapshot` copies it so callers can mutate
/// their view freely without touching the cache.
#[derive(Debug, Clone, Default)]
pub(crate) struct NsScope {
    bindings: HashMap<RawName, NodeId>,
}

impl NsScope {
    /// Create an empty scope
    pub fn new() -> Self {
        NsScope {
            bindings: HashMap::new(),
        }
    }

    /// Bind a declaration, shadowing any inherited binding for the same name
    pub fn bind(&mut self, name: RawName, node: NodeId) {
        self.bindings.insert(name, node);
    }

    /// Remove a binding (empty-URI declaration un-declares it)
    pub fn unbind(&mut self, name: RawName) {
        self.bindings.remove(&name);
    }

    /// Look up the namespace node for a declaration name
    pub fn get(&self, name: RawName) -> Option<NodeId> {
        self.bindings.get(&name).copied()
    }

    /// Return an independent copy of the binding table
    pub fn snapshot(&self) -> HashMap<RawName, NodeId> {
        self.bindings.clone()
    }

    /// Iterate over the visible bindings (internal, unordered)
    pub fn iter(&self) -> impl Iterator<Item = (RawName, NodeId)> + '_ {
        self.bindings.iter().map(|(&name, &node)| (name, node))
    }

    /// Number of visible bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no bindings are visible
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
