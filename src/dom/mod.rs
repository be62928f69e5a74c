//! DOM Module - Arena-based document model
//!
//! Implements a read-only node tree using:
//! - Arena allocation for nodes, arena index = document-order position
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, values and namespace URIs
//! - Per-element namespace scope cache with defensive-copy reads
//!
//! Consumers (an expression evaluator, a serializer) work against the
//! capability traits: [`ExprResult`] for anything that renders to a string
//! value, [`Node`] for tree nodes, and [`Element`] for the strictly wider
//! element capability. Branch on capability via [`NodeRef::as_element`],
//! not on a kind tag.

pub mod builder;
pub mod document;
pub mod namespace;
pub mod node;
pub mod strings;

pub use builder::{BuildError, TreeBuilder};
pub use document::{Descendants, Document, ElemRef, NodeRef};
pub use node::{NodeId, NodeKind};

use std::collections::HashMap;

use crate::token::{QName, Token};

/// Anything an expression can produce renders to a string value
pub trait ExprResult {
    /// String value per the markup data model: the literal value for
    /// attributes, namespaces and text; concatenated descendant text for
    /// elements; XPath 1.0 rendering for primitive values.
    fn string_value(&self) -> String;
}

/// Capability of every tree node
pub trait Node<'d>: ExprResult {
    /// Document-order position. Positions are a bijection onto `0..n`:
    /// equal positions mean the same node, and position comparison is
    /// document-order comparison.
    fn position(&self) -> usize;

    /// The lexical token this node was built from
    fn token(&self) -> Token;

    /// The owning element, or `None` for the document root
    fn parent(&self) -> Option<ElemRef<'d>>;
}

/// Capability of element nodes (and the document root)
pub trait Element<'d>: Node<'d> {
    /// Child nodes in document order, as an independent snapshot
    fn children(&self) -> Vec<NodeRef<'d>>;

    /// Attribute nodes in token order, as an independent snapshot.
    /// Attributes are never part of the child sequence.
    fn attributes(&self) -> Vec<NodeRef<'d>>;

    /// Namespace bindings visible at this element, keyed by the declaring
    /// attribute's qualified name. Closer declarations shadow farther
    /// ones. The returned map is a fresh copy on every call.
    fn namespaces(&self) -> HashMap<QName, NodeRef<'d>>;

    /// Resolve a prefix (empty for the default namespace) to the bound
    /// URI visible at this element
    fn lookup_namespace(&self, prefix: &str) -> Option<&'d str>;
}

impl ExprResult for String {
    fn string_value(&self) -> String {
        self.clone()
    }
}

impl ExprResult for &str {
    fn string_value(&self) -> String {
        (*self).to_string()
    }
}

impl ExprResult for bool {
    fn string_value(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }
}

impl ExprResult for f64 {
    /// XPath 1.0 number rendering
    fn string_value(&self) -> String {
        let n = *self;
        if n.is_nan() {
            "NaN".to_string()
        } else if n.is_infinite() {
            if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        } else if n == n.trunc() && n.abs() < 1e15 {
            format!("{}", n as i64)
        } else {
            format!("{}", n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_string_value() {
        assert_eq!(true.string_value(), "true");
        assert_eq!(false.string_value(), "false");
    }

    #[test]
    fn test_number_string_value() {
        assert_eq!(42.0_f64.string_value(), "42");
        assert_eq!(3.25_f64.string_value(), "3.25");
        assert_eq!((-0.0_f64).string_value(), "0");
        assert_eq!(f64::NAN.string_value(), "NaN");
        assert_eq!(f64::INFINITY.string_value(), "Infinity");
        assert_eq!(f64::NEG_INFINITY.string_value(), "-Infinity");
    }

    #[test]
    fn test_string_string_value() {
        assert_eq!("abc".string_value(), "abc");
        assert_eq!(String::from("abc").string_value(), "abc");
    }
}
