//! Runs in its own process: after `shutdown` nothing else may touch the lock.

use std::thread;

#[test]
fn shutdown_after_all_threads_finish() {
    global_lock::ensure_initialized();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                for _ in 0..1000 {
                    global_lock::lock();
                    unsafe { global_lock::unlock() };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Safety: every thread that used the lock has been joined.
    unsafe { global_lock::shutdown() };
}
