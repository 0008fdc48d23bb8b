use std::cell::UnsafeCell;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// State touched only inside the global lock.
struct Shared<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Shared<T> {
    const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// # Safety
    ///
    /// The caller must hold the global lock.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get(&self) -> &mut T {
        unsafe { &mut *self.0.get() }
    }
}

#[test]
fn no_lost_updates() {
    const THREADS: usize = 8;
    const ROUNDS: u64 = 100_000;

    static COUNTER: Shared<u64> = Shared::new(0);

    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ROUNDS {
                    global_lock::lock();
                    // Split read and write to widen any race.
                    let value = unsafe { *COUNTER.get() };
                    unsafe { *COUNTER.get() = value + 1 };
                    unsafe { global_lock::unlock() };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    global_lock::lock();
    let total = unsafe { *COUNTER.get() };
    unsafe { global_lock::unlock() };

    assert_eq!(total, THREADS as u64 * ROUNDS);
}

#[test]
fn many_short_holders_finish_in_bounded_time() {
    const THREADS: usize = 16;
    const ROUNDS: usize = 10_000;

    let start = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            thread::spawn(|| {
                for _ in 0..ROUNDS {
                    global_lock::lock();
                    unsafe { global_lock::unlock() };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

struct Journal {
    entries: Vec<usize>,
    inside: bool,
}

#[test]
fn check_then_append_is_never_split() {
    const THREADS: usize = 4;
    const ROUNDS: usize = 1000;

    static JOURNAL: Shared<Journal> = Shared::new(Journal {
        entries: Vec::new(),
        inside: false,
    });

    let handles: Vec<_> = (0..THREADS)
        .map(|id| {
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    global_lock::lock();

                    let journal = unsafe { JOURNAL.get() };
                    assert!(!journal.inside, "two threads inside the critical section");
                    journal.inside = true;

                    let before = journal.entries.len();
                    thread::yield_now();
                    journal.entries.push(id);
                    assert_eq!(journal.entries.len(), before + 1);

                    journal.inside = false;

                    unsafe { global_lock::unlock() };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let _guard = global_lock::guard();
    let journal = unsafe { JOURNAL.get() };

    assert_eq!(journal.entries.len(), THREADS * ROUNDS);
    for id in 0..THREADS {
        let count = journal.entries.iter().filter(|&&e| e == id).count();
        assert_eq!(count, ROUNDS);
    }
}

#[test]
fn guard_releases_on_drop() {
    static HITS: Shared<u32> = Shared::new(0);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                for _ in 0..1000 {
                    let _guard = global_lock::guard();
                    unsafe { *HITS.get() += 1 };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let _guard = global_lock::guard();
    assert_eq!(unsafe { *HITS.get() }, 4000);
}

#[test]
fn waiter_resumes_after_release() {
    global_lock::ensure_initialized();
    global_lock::lock();

    let waiter = thread::spawn(|| {
        global_lock::lock();
        unsafe { global_lock::unlock() };
    });

    thread::sleep(Duration::from_millis(50));
    assert!(!waiter.is_finished());

    unsafe { global_lock::unlock() };
    waiter.join().unwrap();
}

#[test]
fn default_build_uses_the_native_mutex() {
    if option_env!("GLOBAL_LOCK_PRIMITIVE").is_some() {
        return;
    }

    assert_eq!(global_lock::ACTIVE, global_lock::LockPrimitiveKind::NativeMutex);
    assert!(global_lock::ACTIVE.owns_os_resource());
}
