//! The global mutator lock
//!
//! Interpreted code runs under a shared hold; whole-heap operations
//! (collection, suspend-all) take the lock exclusively, which forces
//! every mutator to reach a safepoint and drop its hold first.
//!
//! This is a purpose-built reader/writer lock rather than an RwLock
//! guard: a shared hold spans arbitrary stretches of interpretation and
//! is released and re-acquired inside the safepoint protocol, a handoff
//! borrow-scoped guards cannot express. Writers have preference so a
//! suspend request cannot be starved by a stream of new readers.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writer: bool,
    writers_waiting: usize,
}

/// Reader/writer lock with explicit lock/unlock operations.
#[derive(Debug, Default)]
pub struct MutatorLock {
    state: Mutex<LockState>,
    // Readers wait here for the writer to leave
    writer_gone: Condvar,
    // Writers wait here for readers to drain
    readers_gone: Condvar,
}

impl MutatorLock {
    /// New unheld lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a shared (mutator) hold.
    pub fn lock_shared(&self) {
        let mut st = self.state.lock();
        while st.writer || st.writers_waiting > 0 {
            self.writer_gone.wait(&mut st);
        }
        st.readers += 1;
    }

    /// Release a shared hold.
    pub fn unlock_shared(&self) {
        let mut st = self.state.lock();
        debug_assert!(st.readers > 0);
        st.readers -= 1;
        if st.readers == 0 {
            self.readers_gone.notify_all();
        }
    }

    /// Acquire the lock exclusively, blocking until every shared hold
    /// is released.
    pub fn lock_exclusive(&self) {
        let mut st = self.state.lock();
        st.writers_waiting += 1;
        while st.writer || st.readers > 0 {
            self.readers_gone.wait(&mut st);
        }
        st.writers_waiting -= 1;
        st.writer = true;
    }

    /// Release the exclusive hold.
    pub fn unlock_exclusive(&self) {
        let mut st = self.state.lock();
        debug_assert!(st.writer);
        st.writer = false;
        // Wake queued writers first, then blocked readers
        self.readers_gone.notify_all();
        self.writer_gone.notify_all();
    }

    /// Current shared-hold count (diagnostics only).
    pub fn reader_count(&self) -> usize {
        self.state.lock().readers
    }
}
