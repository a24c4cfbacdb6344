//! A dynamic array backed by [`PoolAllocator`], standing in for the container library
//! that sits on top of the pool (out of the pool's own scope, but exercised here to
//! prove C5's contract is usable).

use std::ptr::{self, NonNull};

use freepool::PoolAllocator;

#[cfg(feature = "hardening")]
fn release<T>(allocator: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
    unsafe { allocator.deallocate(ptr, n).expect("deallocate reported corruption") }
}

#[cfg(not(feature = "hardening"))]
fn release<T>(allocator: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
    unsafe { allocator.deallocate(ptr, n) }
}

/// A growable array allocated entirely out of a [`freepool::Pool`].
///
/// Mirrors the shape of a hand-rolled `std::vector` replacement: `push_back`/`pop_back`,
/// `insert`, `reserve`, index access. Two bugs present in the C++ original this was
/// ported from are fixed here rather than carried over:
/// - `insert` into an empty vector behaves like `push_back` and returns the index of the
///   inserted element (the original returned a null/invalid iterator).
/// - `reserve` move-constructs elements into the new storage and never skips their
///   destructors on the old storage (the original used a raw byte copy).
pub struct Vector<T> {
    allocator: PoolAllocator<T>,
    start: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<T> Vector<T> {
    pub fn new(allocator: PoolAllocator<T>) -> Self {
        Self {
            allocator,
            start: None,
            len: 0,
            cap: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn ptr_at(&self, index: usize) -> *mut T {
        // Safety: caller-side bounds checks happen before this is used.
        unsafe { self.start.unwrap().as_ptr().add(index) }
    }

    /// Grows backing storage to at least `n` elements, move-constructing existing
    /// elements into the new storage and releasing the old storage.
    pub fn reserve(&mut self, n: usize) {
        if n <= self.cap {
            return;
        }
        let new_start = self
            .allocator
            .allocate(n)
            .expect("freepool-demo: pool exhausted during reserve");

        if let Some(old_start) = self.start {
            for i in 0..self.len {
                // Safety: `i` is in-bounds for both the old and new storage; moving via
                // `ptr::read`/`ptr::write` transfers ownership without double-running T's
                // destructor, unlike a raw byte copy.
                unsafe {
                    let value = ptr::read(old_start.as_ptr().add(i));
                    new_start.as_ptr().add(i).write(value);
                }
            }
            release(&self.allocator, old_start, self.cap);
        }

        self.start = Some(new_start);
        self.cap = n;
    }

    pub fn push_back(&mut self, value: T) {
        if self.len == self.cap {
            self.reserve(if self.cap == 0 { 1 } else { self.cap * 2 });
        }
        unsafe { self.allocator.construct(NonNull::new_unchecked(self.ptr_at(self.len)), value) };
        self.len += 1;
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // Safety: index `self.len` was a live, initialized element the instant before
        // this decrement.
        Some(unsafe { ptr::read(self.ptr_at(self.len)) })
    }

    /// Inserts `value` at `index`, shifting later elements right.
    ///
    /// On an empty vector this behaves exactly like `push_back` and returns `0` - a
    /// valid index to the newly inserted element, never an invalid/null iterator.
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        assert!(index <= self.len, "insert index out of bounds");

        if self.start.is_none() {
            self.push_back(value);
            return 0;
        }
        if self.len == self.cap {
            self.reserve(self.cap * 2);
        }
        unsafe {
            let base = self.start.unwrap().as_ptr();
            let mut i = self.len;
            while i > index {
                let value = ptr::read(base.add(i - 1));
                ptr::write(base.add(i), value);
                i -= 1;
            }
            self.allocator.construct(NonNull::new_unchecked(base.add(index)), value);
        }
        self.len += 1;
        index
    }

    pub fn front(&self) -> Option<&T> {
        (self.len > 0).then(|| unsafe { &*self.ptr_at(0) })
    }

    pub fn back(&self) -> Option<&T> {
        (self.len > 0).then(|| unsafe { &*self.ptr_at(self.len - 1) })
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            None
        } else {
            Some(unsafe { &mut *self.ptr_at(self.len - 1) })
        }
    }

    pub fn clear(&mut self) {
        if let Some(start) = self.start {
            for i in 0..self.len {
                unsafe { self.allocator.destroy(NonNull::new_unchecked(start.as_ptr().add(i))) };
            }
            release(&self.allocator, start, self.cap);
        }
        self.start = None;
        self.len = 0;
        self.cap = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).map(move |i| unsafe { &*self.ptr_at(i) })
    }
}

impl<T> Drop for Vector<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> std::ops::Index<usize> for Vector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        assert!(index < self.len, "index out of bounds");
        unsafe { &*self.ptr_at(index) }
    }
}

impl<T> std::ops::IndexMut<usize> for Vector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(index < self.len, "index out of bounds");
        unsafe { &mut *self.ptr_at(index) }
    }
}
