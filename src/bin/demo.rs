//! Producer / monitor / cleaner demonstration driver.
//!
//! This binary is not part of the lock-free list's core scope (it is the
//! "external collaborator" `spec.md` explicitly calls out in §1): it only
//! uses the library's public operations. It mirrors the reference
//! producer/monitor/cleaner scenario (one thread injecting work, one
//! reporting queue depth, one reaping aged-out entries) with `log` in
//! place of bare `println!` for operational messages.
//!
//! Run with `RUST_LOG=info cargo run --bin lfl-demo` to see status lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lockfree_list::List;

struct WorkItem {
    id: u64,
    created: Instant,
}

const RUN_FOR: Duration = Duration::from_secs(3);
const MAX_AGE: Duration = Duration::from_millis(750);

fn producer(list: Arc<List<WorkItem>>, keep_running: Arc<AtomicBool>) {
    let mut counter = 0u64;
    while keep_running.load(Ordering::Relaxed) {
        counter += 1;
        list.push_front(WorkItem {
            id: counter,
            created: Instant::now(),
        });
        log::debug!("producer: queued item {counter}");
        thread::sleep(Duration::from_millis(1 + counter % 10));
    }
    log::info!("producer: stopping after queuing {counter} items");
}

fn monitor(list: Arc<List<WorkItem>>, keep_running: Arc<AtomicBool>) {
    while keep_running.load(Ordering::Relaxed) {
        log::info!(
            "monitor: {} live items ({} pending cleanup)",
            list.count_live(),
            list.count_pending()
        );
        thread::sleep(Duration::from_millis(250));
    }
}

fn cleaner(list: Arc<List<WorkItem>>, keep_running: Arc<AtomicBool>) {
    loop {
        let now = Instant::now();
        let mut active = 0usize;

        // `Iter` stashes `next` before yielding the current node, so it is
        // safe to delete the node this step just yielded and keep going.
        // Deleting a *different*, already-visited node here instead would
        // risk two adjacent deletes racing each other's neighbor pointers
        // (see `List::delete`'s contract), so each aged-out node is reaped
        // on the spot rather than batched.
        for node in list.iter() {
            if now.duration_since(node.data().created) >= MAX_AGE {
                log::debug!("cleaner: reaping item {}", node.data().id);
                let ptr = node as *const _ as *mut lockfree_list::Node<WorkItem>;
                unsafe { list.delete(std::ptr::NonNull::new_unchecked(ptr)) };
            } else {
                active += 1;
            }
        }

        if !keep_running.load(Ordering::Relaxed) && active == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(500));
    }
    log::info!("cleaner: done, list is now empty: {}", list.is_empty());
}

fn main() {
    env_logger::init();

    let list = Arc::new(List::new());
    let keep_running = Arc::new(AtomicBool::new(true));

    let producer_handle = {
        let list = Arc::clone(&list);
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || producer(list, keep_running))
    };
    let monitor_handle = {
        let list = Arc::clone(&list);
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || monitor(list, keep_running))
    };
    let cleaner_handle = {
        let list = Arc::clone(&list);
        let keep_running = Arc::clone(&keep_running);
        thread::spawn(move || cleaner(list, keep_running))
    };

    thread::sleep(RUN_FOR);
    keep_running.store(false, Ordering::Relaxed);
    log::info!("main: stopping injection and waiting for cleanup");

    producer_handle.join().expect("producer thread panicked");
    monitor_handle.join().expect("monitor thread panicked");
    cleaner_handle.join().expect("cleaner thread panicked");

    log::info!("main: all threads terminated, exiting");
}
