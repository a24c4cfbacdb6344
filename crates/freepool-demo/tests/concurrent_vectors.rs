//! 100 threads, each pushing 1000 elements into a private vector backed by the same
//! pool, then dropping it. No data race, no leak: the free-list must collapse back to
//! a single block spanning the arena once every thread has joined.

use std::sync::Arc;
use std::thread;

use freepool::{Policy, Pool, PoolAllocator};
use freepool_demo::containers::Vector;

const THREADS: usize = 100;
const PER_THREAD: usize = 1000;

#[test]
fn hundred_threads_thousand_pushes_each_leave_no_leak() {
    let pool = Arc::new(
        Pool::builder()
            .arena_size(THREADS * PER_THREAD * std::mem::size_of::<i64>() * 2)
            .policy(Policy::FirstFit)
            .build()
            .unwrap(),
    );

    thread::scope(|scope| {
        for t in 0..THREADS {
            let allocator: PoolAllocator<i64> = PoolAllocator::new(Arc::clone(&pool));
            scope.spawn(move || {
                let mut v = Vector::new(allocator);
                for i in 0..PER_THREAD {
                    v.push_back((t * PER_THREAD + i) as i64);
                }
                assert_eq!(v.len(), PER_THREAD);
                for i in 0..PER_THREAD {
                    assert_eq!(v[i], (t * PER_THREAD + i) as i64);
                }
            });
        }
    });

    assert_eq!(pool.free_stats(), (pool.capacity(), 1));
}

#[test]
fn concurrent_allocate_deallocate_preserves_conservation_law() {
    // Sum of live + free bytes must equal arena_size at every quiescent point; this
    // drives enough concurrent churn across BestFit to make a conservation violation
    // show up as a failing assertion rather than relying on timing to expose it.
    let pool = Arc::new(
        Pool::builder()
            .arena_size(1 << 20)
            .policy(Policy::BestFit)
            .build()
            .unwrap(),
    );

    thread::scope(|scope| {
        for _ in 0..32 {
            let pool = Arc::clone(&pool);
            scope.spawn(move || {
                for _ in 0..200 {
                    let ptr = pool.allocate(64).unwrap();
                    let (free_bytes, _blocks) = pool.free_stats();
                    assert!(free_bytes <= pool.capacity());
                    unsafe { release(&pool, ptr, 64) };
                }
            });
        }
    });

    assert_eq!(pool.free_stats(), (pool.capacity(), 1));
}

#[cfg(not(feature = "hardening"))]
unsafe fn release(pool: &Pool, ptr: std::ptr::NonNull<u8>, n: usize) {
    pool.deallocate(ptr, n)
}

#[cfg(feature = "hardening")]
unsafe fn release(pool: &Pool, ptr: std::ptr::NonNull<u8>, n: usize) {
    pool.deallocate(ptr, n).expect("deallocate reported corruption")
}
