//! Pool (C4) - owns the arena, owns the FreeList, serializes access.

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use alloc::string::String;
use core::fmt::Write as _;
use core::ptr::NonNull;

use parking_lot::Mutex;

use crate::block::FreeBlockHeader;
use crate::error::PoolError;
use crate::free_list::FreeList;
use crate::policy::Policy;

/// Raw backing storage for a [`Pool`]. Owns a single `alloc_zeroed` allocation, aligned
/// to `FreeBlockHeader::align()` (the alignment-contract redesign flag from the design
/// notes), and frees it on drop.
struct RawArena {
    base: NonNull<u8>,
    layout: Layout,
}

// Safety: RawArena is just an owned raw allocation; nothing about it is thread-local.
unsafe impl Send for RawArena {}

impl RawArena {
    fn new(capacity: usize) -> Result<Self, PoolError> {
        let layout = Layout::from_size_align(capacity, FreeBlockHeader::align()).map_err(|_| {
            PoolError::InvalidConfiguration {
                reason: "arena size overflows when padded to the required alignment",
            }
        })?;
        // Safety: layout has non-zero size, checked by `build()` before this is called.
        let ptr = unsafe { alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or(PoolError::ArenaAcquisitionFailure {
            requested_bytes: capacity,
        })?;
        Ok(Self { base, layout })
    }
}

impl Drop for RawArena {
    fn drop(&mut self) {
        // Safety: `self.base`/`self.layout` are exactly what `alloc_zeroed` returned.
        unsafe { dealloc(self.base.as_ptr(), self.layout) }
    }
}

/// A fixed-capacity, user-space memory pool backed by a single contiguous arena and an
/// intrusive free-list under one mutex.
///
/// Construction and destruction are the owner's serial responsibility and are not
/// protected by the lock; every other public operation (`allocate`, `deallocate`,
/// `report`) is.
pub struct Pool {
    arena: RawArena,
    capacity: usize,
    policy: Policy,
    list: Mutex<FreeList>,
}

// Safety: all mutable access to the arena and free-list goes through `list`'s mutex.
unsafe impl Sync for Pool {}

impl Pool {
    /// Starts building a pool. See [`PoolBuilder`].
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    fn new(capacity: usize, policy: Policy) -> Result<Self, PoolError> {
        if capacity < FreeBlockHeader::min_size() {
            return Err(PoolError::InvalidConfiguration {
                reason: "arena_size must be at least size_of::<FreeBlockHeader>()",
            });
        }

        let arena = RawArena::new(capacity)?;
        // Safety: arena.base is valid for writes of `capacity` bytes and aligned to
        // FreeBlockHeader::align() by construction.
        let list = unsafe { FreeList::seed(arena.base, capacity, policy) };

        Ok(Self {
            arena,
            capacity,
            policy,
            list: Mutex::new(list),
        })
    }

    /// Total arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The placement policy this pool was built with.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    fn normalize(n: usize) -> usize {
        n.max(FreeBlockHeader::min_size())
    }

    /// Allocates `n` bytes under the pool's policy.
    ///
    /// The whole critical section - normalization, search, and split - runs under one
    /// lock acquisition, closing the hazard where another thread could consume the
    /// selected block between search and split.
    pub fn allocate(&self, n: usize) -> Result<NonNull<u8>, PoolError> {
        let normalized = Self::normalize(n);
        let mut list = self.list.lock();
        match list.allocate(normalized) {
            Some(ptr) => {
                log::trace!("pool: allocated {n} bytes (normalized {normalized}) at {:p}", ptr);
                Ok(ptr)
            }
            None => {
                log::warn!(
                    "pool: out of memory for {n} bytes (normalized {normalized}) under {} policy",
                    self.policy
                );
                Err(PoolError::OutOfMemory {
                    requested: n,
                    policy: self.policy,
                })
            }
        }
    }

    /// Returns a previously-allocated `[ptr, ptr+n)` region to the pool.
    ///
    /// # Safety
    /// `ptr` and `n` must be exactly what a prior successful `allocate` returned (`n`
    /// identical to the size passed to that call). Passing an alien pointer or a
    /// mismatched size is undefined behavior, per the pool's contract, unless the
    /// `hardening` feature is enabled.
    #[cfg(not(feature = "hardening"))]
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, n: usize) {
        let normalized = Self::normalize(n);
        debug_assert!(self.contains(ptr, normalized));
        let mut list = self.list.lock();
        list.deallocate(ptr.as_ptr() as usize, normalized);
        log::trace!("pool: released {n} bytes (normalized {normalized}) at {:p}", ptr);
    }

    /// Hardened variant: validates the released region against its free-list neighbors
    /// instead of trusting the caller.
    ///
    /// # Safety
    /// Same contract as the non-hardened `deallocate`; hardening only turns *detectable*
    /// violations (overlap with a neighboring free block) into an `Err` instead of
    /// silent corruption. It cannot detect every possible misuse.
    #[cfg(feature = "hardening")]
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, n: usize) -> Result<(), PoolError> {
        let normalized = Self::normalize(n);
        debug_assert!(self.contains(ptr, normalized));
        let mut list = self.list.lock();
        let result = list.deallocate(ptr.as_ptr() as usize, normalized);
        if let Err(ref e) = result {
            log::error!("pool: {e}");
        } else {
            log::trace!("pool: released {n} bytes (normalized {normalized}) at {:p}", ptr);
        }
        result
    }

    fn contains(&self, ptr: NonNull<u8>, n: usize) -> bool {
        let base = self.arena.base.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr + n <= base + self.capacity
    }

    /// Total free bytes and block count.
    pub fn free_stats(&self) -> (usize, usize) {
        self.list.lock().stats()
    }

    /// A stable textual dump: one line per free block (address, size) when `verbose`,
    /// followed by a summary line with total free bytes and block count.
    pub fn report(&self, verbose: bool) -> String {
        let list = self.list.lock();
        let mut out = String::new();
        let mut count = 0usize;
        let mut total = 0usize;
        list.for_each_block(|addr, size| {
            if verbose {
                let _ = writeln!(out, "block @ {addr:#x}: {size} bytes");
            }
            total += size;
            count += 1;
        });
        let _ = writeln!(out, "free: {total} bytes in {count} block(s)");
        out
    }

    /// Convenience wrapper that logs [`Pool::report`] at `info` level.
    pub fn print(&self, verbose: bool) {
        for line in self.report(verbose).lines() {
            log::info!("{line}");
        }
    }
}

/// Builder for [`Pool`], mirroring the constructor-configuration table: `arena_size`,
/// `policy`, and (behind the `hardening` feature) the hardening toggle.
#[derive(Debug, Default)]
pub struct PoolBuilder {
    arena_size: Option<usize>,
    policy: Policy,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the backing byte region; must be at least `size_of::<FreeBlockHeader>()`.
    pub fn arena_size(mut self, bytes: usize) -> Self {
        self.arena_size = Some(bytes);
        self
    }

    /// Placement policy; defaults to [`Policy::FirstFit`].
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Pool, PoolError> {
        let arena_size = self.arena_size.ok_or(PoolError::InvalidConfiguration {
            reason: "arena_size was not set",
        })?;
        Pool::new(arena_size, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_undersized_arena() {
        let result = Pool::builder()
            .arena_size(FreeBlockHeader::min_size() - 1)
            .policy(Policy::FirstFit)
            .build();
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));
    }

    #[test]
    fn scenario_allocate_then_deallocate_restores_single_block() {
        let pool = Pool::builder()
            .arena_size(4800)
            .policy(Policy::FirstFit)
            .build()
            .unwrap();

        let ptr = pool.allocate(100).unwrap();
        assert_eq!(pool.free_stats(), (4800 - 100, 1));

        release(&pool, ptr, 100);
        assert_eq!(pool.free_stats(), (4800, 1));
    }

    #[test]
    fn scenario_first_fit_reuses_earliest_suitable_hole() {
        let pool = Pool::builder()
            .arena_size(4800)
            .policy(Policy::FirstFit)
            .build()
            .unwrap();

        let a1 = pool.allocate(100).unwrap();
        let a2 = pool.allocate(200).unwrap();
        let _a3 = pool.allocate(300).unwrap();

        release(&pool, a2, 200);

        let reused = pool.allocate(150).unwrap();
        assert_eq!(reused, a2);
        let _ = a1;
    }

    #[test]
    fn scenario_request_exceeding_arena_is_out_of_memory() {
        let pool = Pool::builder()
            .arena_size(4800)
            .policy(Policy::FirstFit)
            .build()
            .unwrap();

        let before = pool.free_stats();
        let err = pool.allocate(5000).unwrap_err();
        assert!(matches!(err, PoolError::OutOfMemory { .. }));
        assert_eq!(pool.free_stats(), before);
    }

    #[test]
    fn report_lists_every_free_block() {
        let pool = Pool::builder()
            .arena_size(256)
            .policy(Policy::FirstFit)
            .build()
            .unwrap();
        let _ptr = pool.allocate(32).unwrap();
        let report = pool.report(true);
        assert!(report.contains("bytes"));
        assert!(report.contains("free: "));
    }

    #[test]
    fn concurrent_allocate_deallocate_preserves_capacity() {
        use std::sync::Arc;

        let pool = Arc::new(
            Pool::builder()
                .arena_size(1 << 16)
                .policy(Policy::BestFit)
                .build()
                .unwrap(),
        );

        std::thread::scope(|scope| {
            for _ in 0..16 {
                let pool = Arc::clone(&pool);
                scope.spawn(move || {
                    for _ in 0..200 {
                        if let Ok(ptr) = pool.allocate(48) {
                            release(&pool, ptr, 48);
                        }
                    }
                });
            }
        });

        let (free, _) = pool.free_stats();
        assert_eq!(free, pool.capacity());
    }

    #[cfg(not(feature = "hardening"))]
    fn release(pool: &Pool, ptr: NonNull<u8>, n: usize) {
        unsafe { pool.deallocate(ptr, n) }
    }

    #[cfg(feature = "hardening")]
    fn release(pool: &Pool, ptr: NonNull<u8>, n: usize) {
        unsafe { pool.deallocate(ptr, n).unwrap() }
    }
}
