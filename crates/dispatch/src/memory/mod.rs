//! First-fit partition allocator.
//!
//! Memory is a contiguous range `[0, total)` split into address-ordered
//! blocks. Allocation takes the first free block that is large enough and
//! splits off the remainder; freeing merges a block with free neighbours so
//! no two adjacent blocks are ever both free.

mod allocator;
mod block;
mod tests;

pub use allocator::MemoryAllocator;
pub use block::{BlockId, BlockInfo};
