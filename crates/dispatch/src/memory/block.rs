use serde::Serialize;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a block in a [`MemoryAllocator`](super::MemoryAllocator).
    pub struct BlockId;
}

#[derive(Debug, Clone)]
pub(super) struct Block {
    pub offset: usize,
    pub size: usize,
    pub allocated: bool,
    /// Pinned blocks are never freed (the real-time reservation).
    pub pinned: bool,
    pub prev: Option<BlockId>,
    pub next: Option<BlockId>,
}

/// Read-only view of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub offset: usize,
    pub size: usize,
    pub allocated: bool,
}

impl From<&Block> for BlockInfo {
    fn from(block: &Block) -> Self {
        Self {
            offset: block.offset,
            size: block.size,
            allocated: block.allocated,
        }
    }
}
