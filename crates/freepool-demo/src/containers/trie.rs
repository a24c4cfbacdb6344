//! A prefix-tree keyed by strings, built against [`PoolAllocator`].
//!
//! Ported from a trie whose node destructor skipped the stored value's destructor on
//! some removal paths before returning the node's storage to the allocator. Every
//! removal path here - `erase`, and the node's own recursive `Drop` - runs the value's
//! destructor before the node's backing memory is released.

use std::ptr::NonNull;

use freepool::PoolAllocator;

const FANOUT: usize = 63;

fn char_index(c: char) -> usize {
    if c.is_ascii_lowercase() {
        (c as usize) - ('a' as usize)
    } else if c.is_ascii_uppercase() {
        (c as usize) - ('A' as usize) + 26
    } else if c.is_ascii_digit() {
        (c as usize) - ('0' as usize) + 52
    } else {
        62
    }
}

struct TrieNode<T> {
    children: [Option<NonNull<TrieNode<T>>>; FANOUT],
    value: Option<NonNull<T>>,
    /// Count of values in the subtree rooted here, including this node.
    size: usize,
}

/// A string-keyed associative container allocated entirely out of a [`freepool::Pool`].
pub struct Trie<T> {
    node_alloc: PoolAllocator<TrieNode<T>>,
    value_alloc: PoolAllocator<T>,
    root: NonNull<TrieNode<T>>,
}

impl<T> Trie<T> {
    pub fn new(node_alloc: PoolAllocator<TrieNode<T>>, value_alloc: PoolAllocator<T>) -> Self {
        let root = Self::new_node(&node_alloc);
        Self {
            node_alloc,
            value_alloc,
            root,
        }
    }

    fn new_node(node_alloc: &PoolAllocator<TrieNode<T>>) -> NonNull<TrieNode<T>> {
        let ptr = node_alloc
            .allocate(1)
            .expect("freepool-demo: pool exhausted while allocating a trie node");
        unsafe {
            node_alloc.construct(
                ptr,
                TrieNode {
                    children: [None; FANOUT],
                    value: None,
                    size: 0,
                },
            );
        }
        ptr
    }

    fn release_node(&self, node: NonNull<TrieNode<T>>) {
        unsafe { self.node_alloc.destroy(node) };
        release(&self.node_alloc, node, 1);
    }

    /// Walks down the tree for `key`, creating missing nodes, and returns the path
    /// (root first, terminal node last).
    fn walk_creating(&mut self, key: &str) -> Vec<NonNull<TrieNode<T>>> {
        let mut path = Vec::with_capacity(key.len() + 1);
        path.push(self.root);
        let mut cur = self.root;
        for c in key.chars() {
            let idx = char_index(c);
            let next = unsafe { cur.as_ref().children[idx] };
            let next = match next {
                Some(n) => n,
                None => {
                    let created = Self::new_node(&self.node_alloc);
                    unsafe { cur.as_mut().children[idx] = Some(created) };
                    created
                }
            };
            path.push(next);
            cur = next;
        }
        path
    }

    fn walk(&self, key: &str) -> Option<NonNull<TrieNode<T>>> {
        let mut cur = self.root;
        for c in key.chars() {
            let idx = char_index(c);
            cur = unsafe { cur.as_ref().children[idx] }?;
        }
        Some(cur)
    }

    /// Inserts or overwrites the value at `key`.
    pub fn insert(&mut self, key: &str, value: T) {
        let path = self.walk_creating(key);
        let mut terminal = *path.last().unwrap();
        let had_value = unsafe { terminal.as_ref().value.is_some() };
        if had_value {
            let slot = unsafe { terminal.as_ref().value.unwrap() };
            unsafe { *slot.as_ptr() = value };
        } else {
            let slot = self
                .value_alloc
                .allocate(1)
                .expect("freepool-demo: pool exhausted while inserting a trie value");
            unsafe {
                self.value_alloc.construct(slot, value);
                terminal.as_mut().value = Some(slot);
            }
            for mut node in path {
                unsafe { node.as_mut().size += 1 };
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        let node = self.walk(key)?;
        unsafe { node.as_ref().value.map(|v| &*v.as_ptr()) }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let node = self.walk(key)?;
        unsafe { node.as_ref().value.map(|v| &mut *v.as_ptr()) }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value at `key`, if any, and prunes now-empty nodes back toward the
    /// root. The value's destructor always runs before its storage is released.
    pub fn erase(&mut self, key: &str) {
        let Some(mut terminal) = self.walk(key) else { return };
        let Some(value_ptr) = (unsafe { terminal.as_ref().value }) else {
            return;
        };

        unsafe {
            self.value_alloc.destroy(value_ptr);
        }
        release(&self.value_alloc, value_ptr, 1);
        unsafe { terminal.as_mut().value = None };

        // Decrement `size` along the path and prune the deepest now-empty child chain.
        let mut path = vec![self.root];
        let mut cur = self.root;
        for c in key.chars() {
            cur = unsafe { cur.as_ref().children[char_index(c)] }.unwrap();
            path.push(cur);
        }
        for mut node in &path {
            unsafe { node.as_mut().size -= 1 };
        }

        for i in (0..path.len() - 1).rev() {
            let parent_idx = char_index(key.chars().nth(i).unwrap());
            let child = path[i + 1];
            if unsafe { child.as_ref().size } == 0 {
                self.drop_subtree(child);
                unsafe { path[i].as_mut().children[parent_idx] = None };
            } else {
                break;
            }
        }
    }

    /// Recursively destroys `node`'s value and children, then releases `node` itself.
    fn drop_subtree(&self, node: NonNull<TrieNode<T>>) {
        let children = unsafe { node.as_ref().children };
        for child in children.into_iter().flatten() {
            self.drop_subtree(child);
        }
        if let Some(value) = unsafe { node.as_ref().value } {
            unsafe { self.value_alloc.destroy(value) };
            release(&self.value_alloc, value, 1);
        }
        self.release_node(node);
    }

    pub fn len(&self) -> usize {
        unsafe { self.root.as_ref().size }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Trie<T> {
    fn drop(&mut self) {
        self.drop_subtree(self.root);
    }
}

#[cfg(feature = "hardening")]
fn release<T>(allocator: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
    unsafe { allocator.deallocate(ptr, n).expect("deallocate reported corruption") }
}

#[cfg(not(feature = "hardening"))]
fn release<T>(allocator: &PoolAllocator<T>, ptr: NonNull<T>, n: usize) {
    unsafe { allocator.deallocate(ptr, n) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freepool::Policy;
    use std::sync::Arc;

    fn pool() -> Arc<freepool::Pool> {
        Arc::new(
            freepool::Pool::builder()
                .arena_size(1 << 16)
                .policy(Policy::FirstFit)
                .build()
                .unwrap(),
        )
    }

    fn trie<T>() -> Trie<T> {
        let pool = pool();
        Trie::new(PoolAllocator::new(Arc::clone(&pool)), PoolAllocator::new(pool))
    }

    #[test]
    fn insert_and_query() {
        let mut t: Trie<i32> = trie();
        t.insert("hello", 1);
        t.insert("help", 2);
        t.insert("world", 3);

        assert_eq!(t.get("hello"), Some(&1));
        assert_eq!(t.get("help"), Some(&2));
        assert_eq!(t.get("world"), Some(&3));
        assert_eq!(t.get("hel"), None);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn overwrite_existing_key() {
        let mut t: Trie<i32> = trie();
        t.insert("a", 1);
        t.insert("a", 2);
        assert_eq!(t.get("a"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn erase_removes_key_and_prunes() {
        let mut t: Trie<i32> = trie();
        t.insert("cat", 1);
        t.insert("car", 2);
        t.erase("cat");
        assert!(!t.contains("cat"));
        assert!(t.contains("car"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn drop_releases_all_backing_memory() {
        let pool = pool();
        {
            let mut t: Trie<String> = Trie::new(
                PoolAllocator::new(Arc::clone(&pool)),
                PoolAllocator::new(Arc::clone(&pool)),
            );
            t.insert("alpha", "one".to_string());
            t.insert("beta", "two".to_string());
            t.insert("alphabet", "three".to_string());
        }
        assert_eq!(pool.free_stats(), (pool.capacity(), 1));
    }
}
