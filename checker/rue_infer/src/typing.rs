//! The transactional per-node type store.
//!
//! An arena of layers addressed by index, each layer a node-to-type map
//! with a parent pointer, an ordered write log, and a context snapshot.
//! Child layers are speculative branches: a child either `save`s its
//! writes into the parent or is simply abandoned, leaving the parent
//! untouched. Writes only ever go to the current layer; no operation
//! rewrites another layer's entries in place.
//!
//! The single-writer-per-node rule is checked at commit instead of being
//! guarded continuously: `save` refuses when a node in the child's log was
//! also written into the parent (directly, or through a sibling that saved
//! first) after the child was created. Violations are [`TypingError`]s:
//! bugs in the driving walker, fatal to the speculative branch.

use std::fmt;

use rustc_hash::FxHashMap;
use rue_ir::NodeId;
use rue_types::Type;

use crate::context::Context;
use crate::error::TypingError;

/// Index of one layer within its [`Typing`] arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct LayerId(u32);

impl LayerId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

#[derive(Clone, Debug)]
struct Entry {
    ty: Type,
    /// Store-wide sequence number of the write.
    seq: u64,
}

#[derive(Debug)]
struct Layer {
    parent: Option<LayerId>,
    entries: FxHashMap<NodeId, Entry>,
    /// Node identities in write order.
    log: Vec<NodeId>,
    context: Context,
    /// The store's sequence counter when this layer was created.
    birth_seq: u64,
    retired: bool,
}

/// The rooted tree of typing layers for one checking session.
#[derive(Debug)]
pub struct Typing {
    layers: Vec<Layer>,
    seq: u64,
}

impl Typing {
    /// A store with a single empty root layer.
    pub fn new(root_context: Context) -> Self {
        Typing {
            layers: vec![Layer {
                parent: None,
                entries: FxHashMap::default(),
                log: Vec::new(),
                context: root_context,
                birth_seq: 0,
                retired: false,
            }],
            seq: 0,
        }
    }

    pub fn root(&self) -> LayerId {
        LayerId(0)
    }

    pub fn context(&self, layer: LayerId) -> &Context {
        &self.layers[layer.index()].context
    }

    pub fn is_retired(&self, layer: LayerId) -> bool {
        self.layers[layer.index()].retired
    }

    /// Record the type of a node in the given layer. Writing the same node
    /// twice into one layer, or writing to a retired layer, is a usage bug.
    pub fn add_typing(
        &mut self,
        layer: LayerId,
        node: NodeId,
        ty: Type,
    ) -> Result<(), TypingError> {
        if self.layers[layer.index()].retired {
            return Err(TypingError::RetiredLayer { layer });
        }
        if self.layers[layer.index()].entries.contains_key(&node) {
            return Err(TypingError::DuplicateTyping { node });
        }
        self.seq += 1;
        let seq = self.seq;
        let target = &mut self.layers[layer.index()];
        target.entries.insert(node, Entry { ty, seq });
        target.log.push(node);
        tracing::trace!(?layer, ?node, "recorded node type");
        Ok(())
    }

    /// The type recorded for a node, looking through the layer chain.
    pub fn type_of(&self, layer: LayerId, node: NodeId) -> Result<&Type, TypingError> {
        let mut current = layer;
        loop {
            let l = &self.layers[current.index()];
            if let Some(entry) = l.entries.get(&node) {
                return Ok(&entry.ty);
            }
            match l.parent {
                Some(parent) => current = parent,
                None => return Err(TypingError::UnknownNode { node }),
            }
        }
    }

    /// Open a speculative child of `layer`, inheriting its context.
    pub fn new_child(&mut self, layer: LayerId) -> LayerId {
        let context = self.layers[layer.index()].context.clone();
        self.new_child_with_context(layer, context)
    }

    /// Open a speculative child with its own context snapshot.
    pub fn new_child_with_context(&mut self, layer: LayerId, context: Context) -> LayerId {
        let id = LayerId(u32::try_from(self.layers.len()).unwrap_or(u32::MAX));
        self.layers.push(Layer {
            parent: Some(layer),
            entries: FxHashMap::default(),
            log: Vec::new(),
            context,
            birth_seq: self.seq,
            retired: false,
        });
        tracing::trace!(parent = ?layer, child = ?id, "opened speculative layer");
        id
    }

    /// Commit a child's writes into its parent.
    ///
    /// Fails without touching the parent if any node in the child's log
    /// was also written into the parent since the child was created; that
    /// covers both direct parent writes and siblings that saved first.
    /// After a successful save the child is retired.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn save(&mut self, child: LayerId) -> Result<(), TypingError> {
        let Some(parent) = self.layers[child.index()].parent else {
            return Err(TypingError::SaveOnRoot);
        };
        if self.layers[child.index()].retired {
            return Err(TypingError::RetiredLayer { layer: child });
        }
        if self.layers[parent.index()].retired {
            return Err(TypingError::RetiredLayer { layer: parent });
        }

        // Entries the parent held before the child opened are fair game:
        // the child deliberately shadowed them and the save replaces them.
        // Anything newer is an overlapping writer.
        let birth_seq = self.layers[child.index()].birth_seq;
        for node in &self.layers[child.index()].log {
            if let Some(entry) = self.layers[parent.index()].entries.get(node) {
                if entry.seq > birth_seq {
                    tracing::debug!(?child, ?node, "save conflict with overlapping write");
                    return Err(TypingError::SaveConflict { node: *node });
                }
            }
        }

        let child_layer = &mut self.layers[child.index()];
        let log = std::mem::take(&mut child_layer.log);
        let mut entries = std::mem::take(&mut child_layer.entries);
        child_layer.retired = true;

        for node in log {
            if let Some(entry) = entries.remove(&node) {
                self.seq += 1;
                let seq = self.seq;
                let parent_layer = &mut self.layers[parent.index()];
                parent_layer.entries.insert(node, Entry { ty: entry.ty, seq });
                parent_layer.log.push(node);
            }
        }
        tracing::trace!(?child, parent = ?parent, "saved speculative layer");
        Ok(())
    }
}
