//! A lock-free doubly linked list.
//!
//! This crate provides [`List`], a non-blocking doubly linked list meant as
//! a reusable concurrency primitive for multi-producer / multi-consumer
//! workloads: work queues, active-connection tables, sweepable caches.
//!
//! The design separates three concerns that a lock-based list would fold
//! into a single critical section:
//!
//! - **Structural mutation** ([`List::push_back`], [`List::push_front`],
//!   [`List::delete`], [`List::pop_front`], [`List::pop_back`]) proceeds via
//!   compare-and-swap on the endpoint and link fields. No operation blocks,
//!   sleeps, or takes a lock.
//! - **Logical removal** ([`Node::mark_removed`]) is a single release store
//!   that hides a node from traversal without touching any link. A reader
//!   that is mid-traversal over a node being removed always makes progress.
//! - **Physical reclamation** ([`List::sweep`]) unlinks and frees nodes that
//!   are both logically removed *and* unreferenced, where "referenced" is
//!   tracked by a caller-maintained [`Node::refcount`] (see [`NodeGuard`]).
//!
//! This is lock-free, not wait-free, and it is not linearizable: concurrent
//! `iter()` calls are not a consistent snapshot, and nothing here defends
//! against the ABA problem beyond what the refcount/sweep split buys you.
//! Pairing this list with hazard pointers or epoch-based reclamation is a
//! reasonable next step for a deployment that needs that guarantee; see the
//! module docs on [`List::delete`] for the sharp edges of concurrent
//! deletion in the same neighborhood.
//!
//! # Example
//!
//! ```
//! use lockfree_list::List;
//!
//! let list: List<i32> = List::new();
//! list.push_back(1);
//! list.push_back(2);
//! list.push_back(3);
//!
//! let middle = list.find_by(|v| *v == 2).expect("2 was pushed");
//! middle.mark_removed();
//!
//! let live: Vec<i32> = list.iter().map(|n| *n.data()).collect();
//! assert_eq!(live, vec![1, 3]);
//! assert_eq!(list.count_live(), 2);
//! ```

pub mod list;

pub use list::{List, Node, NodeGuard};
