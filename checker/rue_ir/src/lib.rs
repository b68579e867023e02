//! Boundary data for the rue checker.
//!
//! This crate defines the data the checker shares with its external
//! collaborators: the parser (node identity, spans, concrete parameter
//! lists) and the signature database loader (qualified names). The checker
//! never re-parses or mutates nodes; it only records facts keyed on the
//! identities defined here.

mod name;
mod node;
mod params;
mod span;

pub use name::{GvarName, IvarName, TypeName};
pub use node::NodeId;
pub use params::{Param, ParamKind, ParamList};
pub use span::Span;
