//! A small container library exercising the [`freepool`] allocator contract.
//!
//! These containers are deliberately out of scope for the pool itself: they exist to
//! prove the `PoolAllocator` adapter is usable by the kind of code that would normally
//! sit on top of a general-purpose allocator.

pub mod stack;
pub mod trie;
pub mod vector;

pub use stack::Stack;
pub use trie::Trie;
pub use vector::Vector;
