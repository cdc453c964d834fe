//! LRU List Module
//!
//! Recency-ordered storage for cache entries.
//!
//! Entries live in a generational arena and are threaded into a doubly-linked
//! list through `prev`/`next` indices. A `HashMap` from key to arena index
//! gives O(1) lookup, and the links give O(1) move-to-front, tail pop and
//! interior removal.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use generational_arena::{Arena, Index};

use crate::cache::Entry;

#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    prev: Option<Index>,
    next: Option<Index>,
}

// == LRU List ==
/// Entries ordered by recency of use.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Indices handed out by this list stay valid until the entry they point at
/// is removed. Indexing with a stale index panics.
#[derive(Debug)]
pub struct LruList<K, V> {
    nodes: Arena<Node<K, V>>,
    lookup: HashMap<K, Index>,
    head: Option<Index>,
    tail: Option<Index>,
}

impl<K: Eq + Hash + Clone, V> LruList<K, V> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    // == Lookup ==
    /// Returns the index of `key`, if present.
    pub fn index_of<Q>(&self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.get(key).copied()
    }

    /// Returns the entry stored at `index`.
    pub fn entry(&self, index: Index) -> &Entry<K, V> {
        &self.nodes[index].entry
    }

    /// Returns the entry stored at `index` mutably.
    pub fn entry_mut(&mut self, index: Index) -> &mut Entry<K, V> {
        &mut self.nodes[index].entry
    }

    // == Push Front ==
    /// Inserts a new entry as the most recently used.
    ///
    /// The key must not already be present.
    pub fn push_front(&mut self, entry: Entry<K, V>) -> Index {
        debug_assert!(!self.lookup.contains_key(&entry.key));

        let key = entry.key.clone();
        let index = self.nodes.insert(Node {
            entry,
            prev: None,
            next: None,
        });
        self.lookup.insert(key, index);
        self.link_front(index);
        index
    }

    // == Move To Front ==
    /// Marks the entry at `index` as most recently used.
    pub fn move_to_front(&mut self, index: Index) {
        if self.head != Some(index) {
            self.unlink(index);
            self.link_front(index);
        }
    }

    // == Remove ==
    /// Removes the entry at `index` from both the list and the key map.
    pub fn remove(&mut self, index: Index) -> Option<Entry<K, V>> {
        if !self.nodes.contains(index) {
            return None;
        }
        self.unlink(index);
        let node = self.nodes.remove(index)?;
        self.lookup.remove(&node.entry.key);
        Some(node.entry)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    pub fn pop_back(&mut self) -> Option<Entry<K, V>> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Back ==
    /// Index of the least recently used entry.
    pub fn back(&self) -> Option<Index> {
        self.tail
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.head = None;
        self.tail = None;
    }

    // == Iteration ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    // Detaches a node from its neighbours without freeing it.
    fn unlink(&mut self, index: Index) {
        let (prev, next) = {
            let node = &self.nodes[index];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        let node = &mut self.nodes[index];
        node.prev = None;
        node.next = None;
    }

    // Links a detached node in as the new head.
    fn link_front(&mut self, index: Index) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[index];
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old_head) => self.nodes[old_head].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }
}

#[cfg(test)]
impl<K: Eq + Hash + Clone + std::fmt::Debug, V> LruList<K, V> {
    /// Panics unless the key map and the linked list describe the same entries
    /// and every link is mirrored by its neighbour.
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.nodes.len(), self.lookup.len(), "arena and map sizes differ");

        let mut seen = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            assert_eq!(node.prev, prev, "broken prev link");
            assert_eq!(
                self.lookup.get(&node.entry.key),
                Some(&index),
                "map does not point at node for {:?}",
                node.entry.key
            );
            seen += 1;
            prev = Some(index);
            cursor = node.next;
        }

        assert_eq!(self.tail, prev, "tail is not the last node");
        assert_eq!(seen, self.lookup.len(), "list length differs from map");
    }
}

// == Iterator ==
/// Front-to-back iterator over an [`LruList`].
pub struct Iter<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    cursor: Option<Index>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
