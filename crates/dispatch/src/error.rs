//! Dispatcher error types.

use thiserror::Error;

use hostd_core::HostdError;

/// Allocator failures. Only `CorruptedPartition` is unrecoverable; the rest
/// describe a request the caller made wrongly or too early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory capacity must be non-zero")]
    ZeroCapacity,

    #[error("allocation size must be non-zero")]
    InvalidSize,

    #[error("out of memory: requested {requested}MB, {free}MB free")]
    OutOfMemory { requested: usize, free: usize },

    #[error("corrupted partition at offset {offset}: {reason}")]
    CorruptedPartition { offset: usize, reason: String },

    #[error("block handle does not refer to a live block")]
    UnknownBlock,

    #[error("block at offset {offset} is already free")]
    DoubleFree { offset: usize },

    #[error("block at offset {offset} is pinned and cannot be freed")]
    Pinned { offset: usize },
}

/// Fatal dispatcher errors. Anything returned here stops the run loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("memory: {0}")]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Config(#[from] HostdError),
}
