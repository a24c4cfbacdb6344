//! # freepool - a fixed-capacity, free-list memory pool
//!
//! A user-space memory pool that serves byte-aligned allocation requests from multiple
//! concurrent threads out of a single contiguous arena carved once at construction time,
//! without ever falling back to the host allocator. Free space is tracked as an
//! address-ordered, intrusive linked list of [`FreeBlockHeader`]s living inside the
//! arena itself; three interchangeable placement disciplines ([`Policy::FirstFit`],
//! [`Policy::BestFit`], [`Policy::WorstFit`]) choose which free region an allocation
//! draws from.
//!
//! The pool does not grow, does not compact, and tracks no per-allocation bookkeeping of
//! its own - callers must return the same `(address, size)` pair they were given. See
//! [`Pool`] for the owning type and [`alloc_adapter::PoolAllocator`] for the typed
//! façade meant to back a container library.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod block;
pub mod policy;

mod alloc_adapter;
pub mod error;
mod free_list;
mod pool;

pub use alloc_adapter::PoolAllocator;
pub use error::PoolError;
pub use policy::Policy;
pub use pool::{Pool, PoolBuilder};

pub mod prelude {
    pub use crate::{error::PoolError, policy::Policy, Pool, PoolAllocator, PoolBuilder};
}
