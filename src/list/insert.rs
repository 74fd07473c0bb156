//! Insertion: `push_back`/`push_front` (allocating) and
//! `attach_back`/`attach_front` (externally allocated), per `spec.md` §4.2.

use std::ptr::{self, NonNull};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::{List, Node};

impl<T> List<T> {
    /// Appends `data` to the tail of the list, allocating a new node.
    ///
    /// Returns a handle to the inserted node so the caller can later mark
    /// it removed, acquire a [`super::NodeGuard`] on it, or pass it to
    /// [`List::delete`]. The handle stays valid for as long as the node
    /// remains reachable; dereferencing it after the node has been unlinked
    /// and freed (via `delete` or `sweep`) is undefined behavior, exactly
    /// as `spec.md` requires of callers that hold node pointers.
    pub fn push_back(&self, data: T) -> NonNull<Node<T>> {
        let node = Box::into_raw(Node::new(data));
        // SAFETY: `node` was just allocated by us and is not yet linked
        // into the list, so attaching it is the sole owner transfer.
        unsafe { self.attach_back(NonNull::new_unchecked(node)) };
        // SAFETY: `node` is non-null (came from `Box::into_raw`).
        unsafe { NonNull::new_unchecked(node) }
    }

    /// Prepends `data` to the head of the list, allocating a new node.
    ///
    /// See [`List::push_back`] for the lifetime contract on the returned
    /// handle.
    pub fn push_front(&self, data: T) -> NonNull<Node<T>> {
        let node = Box::into_raw(Node::new(data));
        unsafe { self.attach_front(NonNull::new_unchecked(node)) };
        unsafe { NonNull::new_unchecked(node) }
    }

    /// Links an externally allocated, uniquely owned node in at the tail.
    ///
    /// # Safety
    ///
    /// `node` must point to a live, heap-allocated `Node<T>` (e.g. from
    /// `Box::into_raw(Node::new(data))`) that is not already linked into
    /// this or any other list, and that nothing else holds a conflicting
    /// owning reference to. After this call the list owns the node; it
    /// will be reachable by traversal and eventually freed by `delete` or
    /// `sweep`.
    pub unsafe fn attach_back(&self, node: NonNull<Node<T>>) {
        let candidate = node.as_ptr();
        unsafe {
            (*candidate).next.store(ptr::null_mut(), Relaxed);
            (*candidate).removed.store(false, Relaxed);
        }

        loop {
            let tail = self.tail.load(Acquire);
            if tail.is_null() {
                if self
                    .head
                    .compare_exchange(ptr::null_mut(), candidate, Release, Relaxed)
                    .is_ok()
                {
                    self.tail.store(candidate, Release);
                    unsafe { (*candidate).prev.store(ptr::null_mut(), Relaxed) };
                    return;
                }
            } else {
                // SAFETY: `tail` was just loaded non-null from a node this
                // list owns; it remains valid for the duration of this CAS
                // attempt under the list's single-writer-per-slot discipline.
                let tail_next = unsafe { &(*tail).next };
                if tail_next
                    .compare_exchange(ptr::null_mut(), candidate, Release, Relaxed)
                    .is_ok()
                {
                    unsafe { (*candidate).prev.store(tail, Relaxed) };
                    // Advisory: if this loses the race, a concurrent
                    // appender will eventually advance `tail` itself.
                    let _ = self
                        .tail
                        .compare_exchange(tail, candidate, Release, Relaxed);
                    return;
                }
            }
        }
    }

    /// Links an externally allocated, uniquely owned node in at the head.
    ///
    /// # Safety
    ///
    /// Same contract as [`List::attach_back`].
    pub unsafe fn attach_front(&self, node: NonNull<Node<T>>) {
        let candidate = node.as_ptr();
        unsafe { (*candidate).removed.store(false, Relaxed) };

        let mut head = self.head.load(Acquire);
        loop {
            unsafe {
                (*candidate).next.store(head, Relaxed);
                (*candidate).prev.store(ptr::null_mut(), Relaxed);
            }
            match self
                .head
                .compare_exchange_weak(head, candidate, Release, Acquire)
            {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }

        if !head.is_null() {
            // SAFETY: `head` was the previous head node, still valid and
            // owned by this list.
            unsafe { (*head).prev.store(candidate, Release) };
        } else {
            self.tail.store(candidate, Release);
        }
    }
}
