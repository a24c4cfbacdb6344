//! Allocator adapter (C5) - the stateless, typed façade the container library consumes.

use alloc::sync::Arc;
use core::marker::PhantomData;
use core::mem::size_of;
use core::ptr::{self, NonNull};

use crate::error::PoolError;
use crate::pool::Pool;

/// A typed, cloneable handle onto a shared [`Pool`].
///
/// Every clone refers to the same pool through the shared `Arc` - the design notes'
/// "owner-held handle" strategy, preferred here over a process-wide global. This is what
/// lets `PoolAllocator<T>` satisfy a container contract that expects a stateless,
/// freely-copyable allocator parameter.
pub struct PoolAllocator<T> {
    pool: Arc<Pool>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolAllocator<T> {
    pub fn new(pool: Arc<Pool>) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Allocates storage for `n` values of `T`, normalized to at least
    /// `size_of::<FreeBlockHeader>()` by the underlying pool.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, PoolError> {
        let bytes = n.checked_mul(size_of::<T>()).ok_or(PoolError::InvalidConfiguration {
            reason: "requested allocation size overflows usize",
        })?;
        let ptr = self.pool.allocate(bytes)?;
        Ok(ptr.cast())
    }

    /// Returns storage for `n` values of `T` to the pool.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior `allocate(n)` call on an equivalent
    /// `PoolAllocator` sharing the same underlying `Pool`.
    #[cfg(not(feature = "hardening"))]
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        self.pool.deallocate(ptr.cast(), n * size_of::<T>())
    }

    /// # Safety
    /// Same contract as the non-hardened `deallocate`.
    #[cfg(feature = "hardening")]
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) -> Result<(), PoolError> {
        self.pool.deallocate(ptr.cast(), n * size_of::<T>())
    }

    /// Places `value` at `*ptr`.
    ///
    /// # Safety
    /// `ptr` must point at uninitialized, allocator-owned storage for a `T`.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        ptr.as_ptr().write(value);
    }

    /// Runs `T`'s destructor at `*ptr` without freeing the storage.
    ///
    /// # Safety
    /// `ptr` must point at a live, initialized `T` owned by this allocator.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        ptr::drop_in_place(ptr.as_ptr());
    }

    /// Upper bound on the number of `T`s a single allocation could ever address.
    pub fn max_size(&self) -> usize {
        usize::MAX / size_of::<T>().max(1)
    }

    /// The shared pool backing this adapter, for callers that want to inspect
    /// diagnostics (`Pool::report`) alongside the typed container built on top.
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }
}

impl<T> Clone for PoolAllocator<T> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    fn pool(capacity: usize) -> Arc<Pool> {
        Arc::new(
            Pool::builder()
                .arena_size(capacity)
                .policy(Policy::FirstFit)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn construct_and_destroy_round_trip() {
        let allocator: PoolAllocator<u64> = PoolAllocator::new(pool(4096));
        let ptr = allocator.allocate(1).unwrap();
        unsafe {
            allocator.construct(ptr, 42);
            assert_eq!(*ptr.as_ptr(), 42);
            allocator.destroy(ptr);
            release(&allocator, ptr, 1);
        }
    }

    #[test]
    fn clones_share_the_same_pool() {
        let allocator: PoolAllocator<u64> = PoolAllocator::new(pool(4096));
        let clone = allocator.clone();
        assert!(Arc::ptr_eq(allocator.pool(), clone.pool()));
    }

    #[cfg(not(feature = "hardening"))]
    unsafe fn release<T>(a: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
        a.deallocate(ptr, n)
    }

    #[cfg(feature = "hardening")]
    unsafe fn release<T>(a: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
        a.deallocate(ptr, n).unwrap()
    }
}
