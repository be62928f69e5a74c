//! xpath-dom - Read-only document model for XPath evaluation
//!
//! An in-memory tree of nodes (elements, attributes, namespace bindings,
//! text, comments, processing instructions) built once from a markup token
//! stream and then traversed freely:
//! - Every node has a stable document-order position
//! - Every node finds its owning element through a parent link
//! - Elements expose children and attributes as distinct snapshots
//! - Any element resolves the namespace bindings visible at its point in
//!   the tree, with lexical scope inheritance and shadowing
//!
//! Construction goes through [`TreeBuilder`] (or the
//! [`Document::from_tokens`] convenience); a malformed stream is rejected
//! with a [`BuildError`] and no partially built tree is ever published.
//! After construction the tree is immutable and safe to read from any
//! number of threads without locks.

pub mod dom;
pub mod token;

pub use dom::{
    BuildError, Descendants, Document, ElemRef, Element, ExprResult, Node, NodeId, NodeKind,
    NodeRef, TreeBuilder,
};
pub use token::{QName, Token};
