//! Core list and node types.
//!
//! The operations themselves live in sibling modules grouped the way
//! `spec.md` groups them: [`insert`] (push/attach), [`remove`] (mark,
//! delete, pop), [`iter`] (traversal and query), [`sweep`] (reclamation).
//! This module owns the shared data: [`Node`], [`List`], and the
//! [`NodeGuard`] refcount handle.

use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

pub mod insert;
pub mod iter;
pub mod remove;
pub mod sweep;

pub use iter::Iter;

/// A single entry in a [`List`].
///
/// Nodes are heap-allocated and linked via atomic `next`/`prev` pointers.
/// `prev` is advisory: under contention it may briefly disagree with the
/// authoritative forward chain reachable via `next` (see the insertion and
/// deletion algorithms), so this crate exposes only forward iteration
/// publicly.
pub struct Node<T> {
    pub(crate) next: AtomicPtr<Node<T>>,
    pub(crate) prev: AtomicPtr<Node<T>>,
    removed: AtomicBool,
    refcount: AtomicUsize,
    data: T,
}

impl<T> Node<T> {
    pub(crate) fn new(data: T) -> Box<Node<T>> {
        Box::new(Node {
            next: AtomicPtr::new(std::ptr::null_mut()),
            prev: AtomicPtr::new(std::ptr::null_mut()),
            removed: AtomicBool::new(false),
            refcount: AtomicUsize::new(0),
            data,
        })
    }

    /// The payload stored in this node.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Whether [`mark_removed`](Node::mark_removed) has been called on this
    /// node. Monotonic: once `true`, never observed `false` again.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Marks this node as logically removed.
    ///
    /// A single release store; does not touch any link field and never
    /// retries. The node stays chained (traversal skips it from this point
    /// on, but its physical unlinking is left to [`List::delete`] or
    /// [`List::sweep`]). Idempotent: calling this twice is observationally
    /// equivalent to calling it once.
    pub fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    /// The current value of this node's reference count.
    ///
    /// The list core never increments or decrements this counter; it only
    /// reads it during [`List::sweep`]. Maintaining it accurately is the
    /// caller's responsibility, typically via [`Node::acquire`].
    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    /// Increments the refcount and returns a guard that decrements it again
    /// on drop.
    ///
    /// This is the RAII counterpart to manually pairing `fetch_add` and
    /// `fetch_sub` calls around a section of code that holds a transient
    /// reference to the node (e.g. a worker thread processing it). While
    /// any guard is alive, [`List::sweep`] will not reap this node even if
    /// it has been logically removed.
    pub fn acquire(&self) -> NodeGuard<'_, T> {
        self.refcount.fetch_add(1, Ordering::AcqRel);
        NodeGuard { node: self }
    }
}

/// An RAII handle that pins a node against [`List::sweep`] for as long as
/// it is alive.
///
/// Obtained via [`Node::acquire`]. Dropping the guard decrements the
/// node's refcount; it does not otherwise affect the node or the list.
pub struct NodeGuard<'a, T> {
    node: &'a Node<T>,
}

impl<'a, T> NodeGuard<'a, T> {
    /// The guarded node.
    pub fn node(&self) -> &'a Node<T> {
        self.node
    }
}

impl<'a, T> std::ops::Deref for NodeGuard<'a, T> {
    type Target = Node<T>;

    fn deref(&self) -> &Node<T> {
        self.node
    }
}

impl<'a, T> Drop for NodeGuard<'a, T> {
    fn drop(&mut self) {
        self.node.refcount.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A lock-free doubly linked list.
///
/// See the crate-level docs for the concurrency model. `List` is not
/// `Clone`; it is mutated in place through `&self` (every operation that
/// changes structure uses interior atomics) and may be embedded inside a
/// larger owning structure or shared behind an `Arc`.
pub struct List<T> {
    pub(crate) head: AtomicPtr<Node<T>>,
    pub(crate) tail: AtomicPtr<Node<T>>,
}

// SAFETY: all mutation goes through atomics on `head`/`tail`/node link
// fields; the list never reads `T` without exclusive access to the node
// (post-unlink) or a shared reference bounded by `&self`'s lifetime, so
// sharing a `List<T>` across threads is sound whenever `T: Send`.
unsafe impl<T: Send> Send for List<T> {}
unsafe impl<T: Send> Sync for List<T> {}

impl<T> List<T> {
    /// Creates a new, empty list.
    ///
    /// Equivalent to `spec.md`'s `init`: stores null into both endpoints.
    /// Not thread-safe to race against other operations on the same list,
    /// but trivially safe before the list has been published to other
    /// threads (which is the only case that can occur, since `List::new`
    /// takes no `&self`).
    pub fn new() -> Self {
        List {
            head: AtomicPtr::new(std::ptr::null_mut()),
            tail: AtomicPtr::new(std::ptr::null_mut()),
        }
    }

    /// Returns `true` if the list currently has no nodes linked into it.
    ///
    /// Like every other observation of a concurrently-mutated list, this is
    /// a snapshot: the answer may be stale by the time the caller acts on
    /// it.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }

    /// Single-threaded teardown: walks the chain from `head`, releasing
    /// every node's storage, then stores null into both endpoints.
    ///
    /// # Safety contract
    ///
    /// Must not be called while any other thread holds a reference into
    /// the list (a live [`Iter`], a `Node` reference from [`List::find_by`],
    /// or a [`NodeGuard`]). This is the same quiescence requirement
    /// `spec.md` places on `clear`; violating it is a logic error, not
    /// undefined behavior, because every node this walk frees it owns
    /// outright (no concurrent structural mutation is assumed to be
    /// racing).
    pub fn clear(&self) {
        let mut curr = self.head.swap(std::ptr::null_mut(), Ordering::AcqRel);
        self.tail.store(std::ptr::null_mut(), Ordering::Release);
        while !curr.is_null() {
            // SAFETY: `clear` requires quiescence, so `curr` is a valid,
            // uniquely-owned node that nothing else will touch again.
            let node = unsafe { Box::from_raw(curr) };
            curr = node.next.load(Ordering::Relaxed);
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_is_empty() {
        let list: List<i32> = List::new();
        assert!(list.is_empty());
        assert_eq!(list.count_live(), 0);
    }

    #[test]
    fn clear_resets_endpoints() {
        let list: List<i32> = List::new();
        list.push_back(1);
        list.push_back(2);
        list.push_back(3);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.head.load(Ordering::Acquire), std::ptr::null_mut());
        assert_eq!(list.tail.load(Ordering::Acquire), std::ptr::null_mut());
    }

    #[test]
    fn node_guard_pins_refcount() {
        let list: List<i32> = List::new();
        list.push_back(10);
        let node = list.find_by(|v| *v == 10).unwrap();
        assert_eq!(node.refcount(), 0);
        {
            let guard = node.acquire();
            assert_eq!(node.refcount(), 1);
            assert_eq!(*guard.data(), 10);
        }
        assert_eq!(node.refcount(), 0);
    }

    #[test]
    fn mark_removed_is_idempotent() {
        let list: List<i32> = List::new();
        list.push_back(1);
        let node = list.find_by(|v| *v == 1).unwrap();
        node.mark_removed();
        node.mark_removed();
        assert!(node.is_removed());
        assert_eq!(list.count_live(), 0);
    }

    #[test]
    fn drop_frees_remaining_nodes() {
        struct DropCount(std::sync::Arc<AtomicUsize>);
        impl Drop for DropCount {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let counter = std::sync::Arc::new(AtomicUsize::new(0));
        {
            let list: List<DropCount> = List::new();
            list.push_back(DropCount(counter.clone()));
            list.push_back(DropCount(counter.clone()));
            list.push_back(DropCount(counter.clone()));
        }
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }
}
