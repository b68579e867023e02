//! Type inference support for the rue checker.
//!
//! The external walker drives these pieces while traversing the AST:
//!
//! - [`TypeEnv`] / [`ConstantEnv`]: what is declared for instance
//!   variables, globals, and constants, with gradual `untyped` fallbacks
//!   and advisory mismatch reporting
//! - [`MethodParams`]: one method definition's concrete parameters lined
//!   up against its declared signature
//! - [`Typing`]: the transactional per-node type store, whose child layers
//!   are speculative branches committed with [`Typing::save`] or simply
//!   abandoned
//!
//! Everything is synchronous and single-threaded; the store's layering is
//! the only concurrency-flavored concept, and its single-writer-per-node
//! rule is checked once, at commit.

mod const_env;
mod context;
mod error;
mod method_params;
mod type_env;
mod typing;

pub use const_env::ConstantEnv;
pub use context::Context;
pub use error::TypingError;
pub use method_params::{
    BlockParam, ForwardSignature, KeywordParam, KeywordRestParam, MethodParams, ParamSlot,
    PositionalParam, PositionalRestParam,
};
pub use type_env::{Annotations, AnnotationConflict, Assign, EnvKey, Lookup, TypeEnv};
pub use typing::{LayerId, Typing};
