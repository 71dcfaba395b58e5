// Copyright 2026 the Glyphtess Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A cyclic doubly linked list backed by an arena of nodes.
//!
//! Nodes are addressed by stable [`NodeId`] indices and `next`/`prev` are
//! stored as indices into the arena, so inserting a node while splitting an
//! edge relinks two indices and never invalidates a neighbor. There is no
//! terminal sentinel: traversal from any node eventually revisits it.

/// Stable handle to a node in an [`EdgeRing`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    prev: NodeId,
    next: NodeId,
}

/// A cyclic doubly linked list.
///
/// The arena only grows; the ring supports insertion but not removal, which
/// is all contour splitting needs and keeps every issued [`NodeId`] valid
/// for the life of the ring.
#[derive(Clone, Debug, Default)]
pub struct EdgeRing<T> {
    arena: Vec<Node<T>>,
    head: Option<NodeId>,
}

impl<T> EdgeRing<T> {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            head: None,
        }
    }

    /// Number of nodes in the ring.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// The entry node, if any. Which node is the entry is arbitrary; the
    /// ring has no start or end.
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// The node after `id`.
    pub fn next(&self, id: NodeId) -> NodeId {
        self.arena[id.index()].next
    }

    /// The node before `id`.
    pub fn prev(&self, id: NodeId) -> NodeId {
        self.arena[id.index()].prev
    }

    /// The value stored at `id`.
    pub fn value(&self, id: NodeId) -> &T {
        &self.arena[id.index()].value
    }

    /// Mutable access to the value stored at `id`.
    pub fn value_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.arena[id.index()].value
    }

    /// Appends a node before the head (i.e. at the "end" of the cycle).
    pub fn push(&mut self, value: T) -> NodeId {
        match self.head {
            Some(head) => {
                let tail = self.prev(head);
                self.insert_after(tail, value)
            }
            None => {
                let id = NodeId(0);
                self.arena.push(Node {
                    value,
                    prev: id,
                    next: id,
                });
                self.head = Some(id);
                id
            }
        }
    }

    /// Inserts a node directly after `at`, relinking only the two
    /// neighboring indices.
    pub fn insert_after(&mut self, at: NodeId, value: T) -> NodeId {
        let id = NodeId(self.arena.len() as u32);
        let next = self.arena[at.index()].next;
        self.arena.push(Node {
            value,
            prev: at,
            next,
        });
        self.arena[at.index()].next = id;
        self.arena[next.index()].prev = id;
        id
    }

    /// Visits each node exactly once in cycle order starting at the head.
    pub fn iter(&self) -> RingIter<'_, T> {
        RingIter {
            ring: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    /// Finds the first node (in cycle order) whose value matches.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<NodeId> {
        self.iter().find(|&(_, v)| pred(v)).map(|(id, _)| id)
    }
}

impl<T: Clone> EdgeRing<T> {
    /// The values in cycle order, for inspection and tests.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }
}

impl<T> FromIterator<T> for EdgeRing<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ring = Self::new();
        for value in iter {
            ring.push(value);
        }
        ring
    }
}

/// Iterator over `(id, value)` pairs of a ring, one full cycle.
#[derive(Debug)]
pub struct RingIter<'a, T> {
    ring: &'a EdgeRing<T>,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for RingIter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        self.remaining -= 1;
        self.cursor = Some(self.ring.next(id));
        Some((id, self.ring.value(id)))
    }
}
