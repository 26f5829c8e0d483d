use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::error::MemoryError;

use super::block::{Block, BlockId, BlockInfo};

/// First-fit allocator over `[0, total)`.
///
/// Blocks live in a generational arena and link to their address-order
/// neighbours, so a stale [`BlockId`] (one whose block was merged away) is
/// detected instead of aliasing a newer block.
#[derive(Debug)]
pub struct MemoryAllocator {
    blocks: SlotMap<BlockId, Block>,
    head: BlockId,
    total: usize,
    free: usize,
}

impl MemoryAllocator {
    /// Create an allocator holding one free block covering all of memory.
    pub fn new(total: usize) -> Result<Self, MemoryError> {
        if total == 0 {
            return Err(MemoryError::ZeroCapacity);
        }
        let mut blocks = SlotMap::with_key();
        let head = blocks.insert(Block {
            offset: 0,
            size: total,
            allocated: false,
            pinned: false,
            prev: None,
            next: None,
        });
        Ok(Self {
            blocks,
            head,
            total,
            free: total,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Sum of all free block sizes.
    pub fn free_memory(&self) -> usize {
        self.free
    }

    /// True if `allocate(size)` would succeed right now.
    ///
    /// A corrupted block list is an error, never a plain "no fit".
    pub fn check(&self, size: usize) -> Result<bool, MemoryError> {
        if size == 0 || size > self.free {
            return Ok(false);
        }
        Ok(self.find_fit(size)?.is_some())
    }

    /// Lowest-addressed free block with at least `size` bytes.
    ///
    /// Walks the block list from the head and reports corruption (gaps,
    /// overlaps, blocks past the end, cycles) rather than looping or
    /// returning a bogus block.
    pub fn find_fit(&self, size: usize) -> Result<Option<BlockId>, MemoryError> {
        let mut cursor = Some(self.head);
        let mut expected = 0;
        let mut steps = 0;

        while let Some(id) = cursor {
            let block = self.blocks.get(id).ok_or_else(|| MemoryError::CorruptedPartition {
                offset: expected,
                reason: "dangling block link".into(),
            })?;
            steps += 1;
            if steps > self.blocks.len() {
                return Err(MemoryError::CorruptedPartition {
                    offset: block.offset,
                    reason: "cycle in block list".into(),
                });
            }
            if block.offset != expected {
                return Err(MemoryError::CorruptedPartition {
                    offset: block.offset,
                    reason: format!("expected a block at offset {expected}"),
                });
            }
            if block.offset + block.size > self.total {
                return Err(MemoryError::CorruptedPartition {
                    offset: block.offset,
                    reason: "block extends past end of memory".into(),
                });
            }
            if !block.allocated && block.size >= size {
                return Ok(Some(id));
            }
            expected = block.offset + block.size;
            cursor = block.next;
        }
        Ok(None)
    }

    /// Allocate `size` from the first free block that fits.
    pub fn allocate(&mut self, size: usize) -> Result<BlockId, MemoryError> {
        if size == 0 {
            return Err(MemoryError::InvalidSize);
        }
        if size > self.free {
            return Err(MemoryError::OutOfMemory {
                requested: size,
                free: self.free,
            });
        }
        let id = self.find_fit(size)?.ok_or(MemoryError::OutOfMemory {
            requested: size,
            free: self.free,
        })?;

        self.split(id, size);
        self.free -= size;
        trace!(size, offset = self.blocks[id].offset, "allocated block");
        Ok(id)
    }

    /// Allocate `size` and pin it so it can never be freed.
    pub fn reserve(&mut self, size: usize) -> Result<BlockId, MemoryError> {
        let id = self.allocate(size)?;
        self.blocks[id].pinned = true;
        debug!(size, offset = self.blocks[id].offset, "reserved pinned block");
        Ok(id)
    }

    /// Return a block to the free pool, merging it with free neighbours.
    ///
    /// After a merge with its predecessor the handle is dead; freeing it
    /// again yields [`MemoryError::UnknownBlock`].
    pub fn free(&mut self, id: BlockId) -> Result<(), MemoryError> {
        let block = self.blocks.get_mut(id).ok_or(MemoryError::UnknownBlock)?;
        if block.pinned {
            return Err(MemoryError::Pinned {
                offset: block.offset,
            });
        }
        if !block.allocated {
            return Err(MemoryError::DoubleFree {
                offset: block.offset,
            });
        }
        block.allocated = false;
        let (size, prev, next) = (block.size, block.prev, block.next);
        self.free += size;

        let mut survivor = id;
        if let Some(prev) = prev.filter(|p| self.is_free(*p)) {
            self.merge(prev, id);
            survivor = prev;
        }
        if let Some(next) = next.filter(|n| self.is_free(*n)) {
            self.merge(survivor, next);
        }
        trace!(size, "freed block");
        Ok(())
    }

    /// View of a live block.
    pub fn block(&self, id: BlockId) -> Option<BlockInfo> {
        self.blocks.get(id).map(BlockInfo::from)
    }

    /// All blocks in address order.
    pub fn blocks(&self) -> Vec<BlockInfo> {
        let mut out = Vec::with_capacity(self.blocks.len());
        let mut cursor = Some(self.head);
        while let Some(block) = cursor.and_then(|id| self.blocks.get(id)) {
            if out.len() == self.blocks.len() {
                break;
            }
            out.push(BlockInfo::from(block));
            cursor = block.next;
        }
        out
    }

    /// Check the partition invariant: blocks tile `[0, total)` exactly, in
    /// order, with consistent back links, no two adjacent free blocks, and a
    /// free total matching the running counter.
    pub fn validate(&self) -> Result<(), MemoryError> {
        let corrupted = |offset: usize, reason: &str| MemoryError::CorruptedPartition {
            offset,
            reason: reason.to_string(),
        };

        let mut cursor = Some(self.head);
        let mut prev: Option<BlockId> = None;
        let mut prev_free = false;
        let mut expected = 0;
        let mut free = 0;
        let mut seen = 0;

        while let Some(id) = cursor {
            let block = self
                .blocks
                .get(id)
                .ok_or_else(|| corrupted(expected, "dangling block link"))?;
            seen += 1;
            if seen > self.blocks.len() {
                return Err(corrupted(block.offset, "cycle in block list"));
            }
            if block.size == 0 {
                return Err(corrupted(block.offset, "zero-length block"));
            }
            if block.offset != expected {
                return Err(corrupted(block.offset, "blocks are not contiguous"));
            }
            if block.prev != prev {
                return Err(corrupted(block.offset, "back link mismatch"));
            }
            if !block.allocated {
                if prev_free {
                    return Err(corrupted(block.offset, "adjacent free blocks"));
                }
                free += block.size;
            }
            prev_free = !block.allocated;
            expected = block.offset + block.size;
            prev = Some(id);
            cursor = block.next;
        }

        if expected != self.total {
            return Err(corrupted(expected, "blocks do not cover all of memory"));
        }
        if seen != self.blocks.len() {
            return Err(corrupted(expected, "unreachable blocks in arena"));
        }
        if free != self.free {
            return Err(corrupted(0, "free counter out of sync"));
        }
        Ok(())
    }

    fn is_free(&self, id: BlockId) -> bool {
        self.blocks.get(id).is_some_and(|b| !b.allocated)
    }

    /// Shrink `id` to `size` and mark it allocated; any remainder becomes a
    /// new free block directly after it.
    fn split(&mut self, id: BlockId, size: usize) {
        let block = &mut self.blocks[id];
        block.allocated = true;
        let remainder = block.size - size;
        if remainder == 0 {
            return;
        }
        block.size = size;
        let (offset, next) = (block.offset, block.next);

        let tail = self.blocks.insert(Block {
            offset: offset + size,
            size: remainder,
            allocated: false,
            pinned: false,
            prev: Some(id),
            next,
        });
        self.blocks[id].next = Some(tail);
        if let Some(after) = next.and_then(|n| self.blocks.get_mut(n)) {
            after.prev = Some(tail);
        }
    }

    /// Absorb `right` into `left`. Both must be adjacent; `right` is removed.
    fn merge(&mut self, left: BlockId, right: BlockId) {
        let Some(removed) = self.blocks.remove(right) else {
            return;
        };
        if let Some(block) = self.blocks.get_mut(left) {
            block.size += removed.size;
            block.next = removed.next;
        }
        if let Some(after) = removed.next.and_then(|n| self.blocks.get_mut(n)) {
            after.prev = Some(left);
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupt_offset(&mut self, id: BlockId, offset: usize) {
        self.blocks[id].offset = offset;
    }
}
