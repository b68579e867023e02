//! Per-layer checking context.

use rue_types::{SelfContext, Type};

use crate::type_env::TypeEnv;

/// Everything a typing-store layer snapshots about its position in the
/// walk: the self/instance/class triple and the type environment. Both
/// are immutable values, so a snapshot is a pair of cheap clones.
#[derive(Clone, Debug)]
pub struct Context {
    pub self_context: SelfContext,
    pub type_env: TypeEnv,
}

impl Context {
    pub fn new(self_context: SelfContext, type_env: TypeEnv) -> Self {
        Context {
            self_context,
            type_env,
        }
    }

    pub fn self_type(&self) -> &Type {
        &self.self_context.self_type
    }
}
