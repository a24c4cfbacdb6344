//! Drives the pool through the end-to-end scenarios it's expected to satisfy, and
//! prints a diagnostic report after each one.

use std::sync::Arc;
use std::thread;

use freepool::{Policy, Pool, PoolAllocator};
use freepool_demo::containers::{Trie, Vector};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(not(feature = "hardening"))]
unsafe fn release(pool: &Pool, ptr: std::ptr::NonNull<u8>, n: usize) {
    pool.deallocate(ptr, n)
}

#[cfg(feature = "hardening")]
unsafe fn release(pool: &Pool, ptr: std::ptr::NonNull<u8>, n: usize) {
    pool.deallocate(ptr, n).expect("deallocate reported corruption")
}

/// Scenario 1: allocate, deallocate, free-list collapses back to one block.
fn scenario_allocate_then_free_collapses() {
    let pool = Pool::builder().arena_size(4800).policy(Policy::FirstFit).build().unwrap();
    let ptr = pool.allocate(100).unwrap();
    log::info!("scenario 1: allocated 100 bytes at {:p}", ptr);
    unsafe { release(&pool, ptr, 100) };
    assert_eq!(pool.free_stats(), (4800, 1));
    pool.print(true);
}

/// Scenario 2: FirstFit reuses the earliest freed block that fits.
fn scenario_first_fit_reuses_earliest() {
    let pool = Pool::builder().arena_size(4800).policy(Policy::FirstFit).build().unwrap();
    let a1 = pool.allocate(100).unwrap();
    let a2 = pool.allocate(200).unwrap();
    let _a3 = pool.allocate(300).unwrap();
    unsafe { release(&pool, a2, 200) };
    let reused = pool.allocate(150).unwrap();
    assert_eq!(reused, a2, "FirstFit should reuse the earliest suitable block");
    log::info!("scenario 2: a1={:p} reused={:p}", a1, reused);
    pool.print(true);
}

/// Scenario 3/4: BestFit and WorstFit choose opposite ends of a fragmented list.
fn scenario_best_and_worst_fit_fragmentation() {
    for (policy, label) in [(Policy::BestFit, "BestFit"), (Policy::WorstFit, "WorstFit")] {
        let pool = Pool::builder().arena_size(4800).policy(policy).build().unwrap();
        let a = pool.allocate(60).unwrap();
        let b = pool.allocate(100).unwrap();
        let c = pool.allocate(200).unwrap();
        unsafe {
            release(&pool, a, 60);
            release(&pool, b, 100);
            release(&pool, c, 200);
        }
        let picked = pool.allocate(80).unwrap();
        log::info!("scenario 3/4: {label} picked {:p}", picked);
        pool.print(true);
    }
}

/// Scenario 5: 100 threads, each pushing 1000 elements into a private vector backed
/// by the same pool, then dropping it. Afterward the free-list must have collapsed
/// back to a single block spanning the whole arena.
fn scenario_concurrent_vectors_leave_no_leak() {
    const THREADS: usize = 100;
    const PER_THREAD: usize = 1000;

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
            });
        }
    });

    let stats = pool.free_stats();
    log::info!("scenario 5: free-list after all threads joined = {stats:?}");
    assert_eq!(stats, (pool.capacity(), 1), "every vector's storage must have been released");
    pool.print(true);
}

/// Scenario 6: a request larger than the arena fails cleanly and leaves the list
/// untouched.
fn scenario_oversized_request_is_rejected() {
    let pool = Pool::builder().arena_size(4800).policy(Policy::FirstFit).build().unwrap();
    let before = pool.free_stats();
    let err = pool.allocate(5000).unwrap_err();
    log::warn!("scenario 6: oversized request rejected: {err}");
    assert_eq!(pool.free_stats(), before);
}

/// Exercises the trie container end-to-end, standing in for the kind of workload the
/// allocator adapter is meant to support beyond vectors and stacks.
fn scenario_trie_over_pool() {
    let pool = Arc::new(Pool::builder().arena_size(1 << 16).policy(Policy::BestFit).build().unwrap());
    let mut trie: Trie<u32> = Trie::new(PoolAllocator::new(Arc::clone(&pool)), PoolAllocator::new(Arc::clone(&pool)));
    for (i, word) in ["pool", "policy", "placement", "pointer"].iter().enumerate() {
        trie.insert(word, i as u32);
    }
    assert_eq!(trie.get("placement"), Some(&2));
    trie.erase("placement");
    assert!(!trie.contains("placement"));
    log::info!("scenario trie: {} entries remain", trie.len());
    drop(trie);
    assert_eq!(pool.free_stats(), (pool.capacity(), 1));
}

fn main() {
    init_logging();

    scenario_allocate_then_free_collapses();
    scenario_first_fit_reuses_earliest();
    scenario_best_and_worst_fit_fragmentation();
    scenario_concurrent_vectors_leave_no_leak();
    scenario_oversized_request_is_rejected();
    scenario_trie_over_pool();

    log::info!("all scenarios completed");
}
