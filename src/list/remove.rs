//! Removal: physical unlink-and-free ([`List::delete`]) and pop operations
//! ([`List::pop_front`], [`List::pop_back`]), per `spec.md` §4.4–§4.5.
//! Logical removal ([`Node::mark_removed`]) lives in [`super`] next to the
//! rest of the node's data.

use std::ptr::{self, NonNull};
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};

use super::{List, Node};

impl<T> List<T> {
    /// Unlinks `node` from the list and frees its storage in one step.
    ///
    /// Each of the four link-repair compare-and-swaps is best-effort: if
    /// the expected pointer no longer holds, the corresponding CAS silently
    /// fails on the theory that a concurrent operation has already moved
    /// past this node. `delete` never retries a failed CAS and cannot fail
    /// externally: it always frees `node`'s storage.
    ///
    /// # Safety
    ///
    /// `node` must point to a node currently linked into this list, and the
    /// caller must guarantee that no other thread will dereference `node`
    /// (via a held [`super::NodeGuard`], a live [`super::Iter`] paused on
    /// it, or any other raw handle) after this call returns. The usual
    /// pattern is to call `delete` on the current element of an iteration
    /// and then immediately stop iterating past it.
    ///
    /// Concurrent `delete` of adjacent nodes can race: if a neighbor's link
    /// changes between the initial loads and the repair CAS, the repair is
    /// silently skipped rather than retried, which can leave a node
    /// reachable from only one side of the chain (it is never leaked from
    /// both, since the side whose CAS lost has a neighbor that itself
    /// advanced past `node`). A production deployment that needs airtight
    /// behavior here should serialize deletes of adjacent nodes, or upgrade
    /// to hazard-pointer/epoch-based reclamation.
    pub unsafe fn delete(&self, node: NonNull<Node<T>>) {
        let target = node.as_ptr();
        // SAFETY: caller guarantees `target` is currently linked and valid.
        let (prev, next) = unsafe {
            (
                (*target).prev.load(Acquire),
                (*target).next.load(Acquire),
            )
        };

        if !prev.is_null() {
            let prev_next = unsafe { &(*prev).next };
            let _ = prev_next.compare_exchange(target, next, AcqRel, Acquire);
        } else {
            let _ = self.head.compare_exchange(target, next, AcqRel, Acquire);
        }

        if !next.is_null() {
            let next_prev = unsafe { &(*next).prev };
            let _ = next_prev.compare_exchange(target, prev, AcqRel, Acquire);
        } else {
            let _ = self.tail.compare_exchange(target, prev, AcqRel, Acquire);
        }

        // SAFETY: caller guarantees exclusive access to `target` from this
        // point on, matching the contract under which `Box::from_raw` is
        // sound.
        drop(unsafe { Box::from_raw(target) });
    }

    /// Unlinks and returns the node at the head of the list, without
    /// freeing it, so the caller can inspect its payload before disposal.
    ///
    /// Returns `None` if the list is observed empty. The returned node's
    /// `next`/`prev` links are cleared; it is otherwise a normal owned
    /// [`Node`].
    pub fn pop_front(&self) -> Option<Box<Node<T>>> {
        loop {
            let head = self.head.load(Acquire);
            if head.is_null() {
                return None;
            }
            // SAFETY: `head` was just loaded non-null; nodes are only
            // freed after being unlinked, and this CAS is the unlink.
            let next = unsafe { (*head).next.load(Acquire) };
            if self
                .head
                .compare_exchange(head, next, AcqRel, Acquire)
                .is_ok()
            {
                if next.is_null() {
                    self.tail.store(ptr::null_mut(), Release);
                } else {
                    unsafe { (*next).prev.store(ptr::null_mut(), Release) };
                }
                unsafe {
                    (*head).next.store(ptr::null_mut(), Release);
                    (*head).prev.store(ptr::null_mut(), Release);
                    return Some(Box::from_raw(head));
                }
            }
        }
    }

    /// Unlinks and returns the node at the tail of the list, without
    /// freeing it.
    ///
    /// Since `prev` is only advisory under contention, locating the tail's
    /// predecessor is done by walking forward from `head` rather than by
    /// trusting `tail.prev` directly. Returns `None` if the list is
    /// observed empty, or if the snapshotted tail vanishes (is unlinked by
    /// a concurrent operation) during the walk.
    pub fn pop_back(&self) -> Option<Box<Node<T>>> {
        loop {
            let tail = self.tail.load(Acquire);
            if tail.is_null() {
                return None;
            }

            let mut prev = ptr::null_mut();
            let mut curr = self.head.load(Acquire);
            while !curr.is_null() && curr != tail {
                prev = curr;
                curr = unsafe { (*curr).next.load(Acquire) };
            }
            if curr.is_null() {
                // The snapshotted tail is no longer reachable; restart.
                continue;
            }

            if !prev.is_null() {
                if self
                    .tail
                    .compare_exchange(tail, prev, AcqRel, Acquire)
                    .is_ok()
                {
                    unsafe { (*prev).next.store(ptr::null_mut(), Release) };
                    unsafe {
                        (*tail).next.store(ptr::null_mut(), Release);
                        (*tail).prev.store(ptr::null_mut(), Release);
                        return Some(Box::from_raw(tail));
                    }
                }
            } else if self
                .head
                .compare_exchange(tail, ptr::null_mut(), AcqRel, Acquire)
                .is_ok()
            {
                self.tail.store(ptr::null_mut(), Release);
                unsafe {
                    (*tail).next.store(ptr::null_mut(), Release);
                    (*tail).prev.store(ptr::null_mut(), Release);
                    return Some(Box::from_raw(tail));
                }
            }
            // Lost the CAS race; restart from scratch.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_front_and_back_on_empty_list_return_none() {
        let list: List<i32> = List::new();
        assert!(list.pop_front().is_none());
        assert!(list.pop_back().is_none());
    }

    #[test]
    fn pop_ordering_matches_scenario_s6() {
        let list: List<i32> = List::new();
        list.push_back(10);
        list.push_back(20);
        list.push_back(30);

        assert_eq!(*list.pop_front().unwrap().data(), 10);
        assert_eq!(*list.pop_back().unwrap().data(), 30);
        assert_eq!(*list.pop_front().unwrap().data(), 20);
        assert!(list.pop_front().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn push_then_pop_back_on_singleton_list_empties_it() {
        let list: List<i32> = List::new();
        list.push_back(7);
        let popped = list.pop_back().unwrap();
        assert_eq!(*popped.data(), 7);
        assert!(list.is_empty());
    }

    #[test]
    fn delete_sole_element_empties_endpoints() {
        let list: List<i32> = List::new();
        let node = list.push_back(1);
        unsafe { list.delete(node) };
        assert!(list.is_empty());
        assert_eq!(list.count_live(), 0);
    }

    #[test]
    fn delete_during_iterate_matches_scenario_s4() {
        let list: List<i32> = List::new();
        list.push_back(1);
        list.push_back(2);
        list.push_back(3);

        let target = list.find_by(|v| *v == 2).unwrap() as *const Node<i32>;
        for node in list.iter() {
            if *node.data() == 2 {
                let ptr = node as *const Node<i32> as *mut Node<i32>;
                assert_eq!(ptr as *const _, target);
                unsafe { list.delete(NonNull::new_unchecked(ptr)) };
                break;
            }
        }

        let live: Vec<i32> = list.iter().map(|n| *n.data()).collect();
        assert_eq!(live, vec![1, 3]);
        assert_eq!(list.count_live(), 2);
    }
}
