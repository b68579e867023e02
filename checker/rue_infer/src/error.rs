//! Fatal usage errors of the typing store.
//!
//! These indicate a bug in the walker driving the checker, never a
//! property of the program being checked. They must be surfaced loudly:
//! the current speculative attempt is unusable once one occurs.

use rue_ir::NodeId;

use crate::typing::LayerId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypingError {
    /// The same node identity was written twice into one layer.
    #[error("node {node:?} already typed in this layer")]
    DuplicateTyping { node: NodeId },

    /// A queried node was never typed anywhere along the layer chain.
    #[error("no type recorded for node {node:?}")]
    UnknownNode { node: NodeId },

    /// The layer was already saved and can no longer be written.
    #[error("layer {layer:?} is retired")]
    RetiredLayer { layer: LayerId },

    /// `save` was called on the root layer.
    #[error("the root layer cannot be saved")]
    SaveOnRoot,

    /// A node in the child's write log was also written into the parent
    /// after the child was created.
    #[error("conflicting write to node {node:?} committed since the child layer was created")]
    SaveConflict { node: NodeId },
}
