//! A LIFO adapter over [`Vector`], matching the shape of the original `zyz::Stack`.

use crate::containers::vector::Vector;
use freepool::PoolAllocator;

pub struct Stack<T> {
    inner: Vector<T>,
}

impl<T> Stack<T> {
    pub fn new(allocator: PoolAllocator<T>) -> Self {
        Self {
            inner: Vector::new(allocator),
        }
    }

    pub fn push(&mut self, value: T) {
        self.inner.push_back(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_back()
    }

    pub fn top(&self) -> Option<&T> {
        self.inner.back()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freepool::Policy;
    use std::sync::Arc;

    fn allocator<T>() -> PoolAllocator<T> {
        let pool = Arc::new(
            freepool::Pool::builder()
                .arena_size(4096)
                .policy(Policy::FirstFit)
                .build()
                .unwrap(),
        );
        PoolAllocator::new(pool)
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut s: Stack<i32> = Stack::new(allocator());
        s.push(1);
        s.push(2);
        s.push(3);
        assert_eq!(s.pop(), Some(3));
        assert_eq!(s.top(), Some(&2));
        assert_eq!(s.len(), 2);
    }
}
