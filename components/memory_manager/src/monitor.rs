//! Reentrant per-object monitors
//!
//! A monitor records its owning thread and a recursion count. The
//! blocking entry path is deliberately bare: callers that may block
//! must first drop their shared mutator hold (the interpreter does this
//! around `monitor-enter`), so the monitor itself never participates in
//! the suspension protocol.

use core_types::ThreadId;
use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct MonitorState {
    owner: Option<ThreadId>,
    count: u32,
}

/// A reentrant object monitor.
#[derive(Debug)]
pub struct Monitor {
    state: Mutex<MonitorState>,
    cond: Condvar,
}

impl Monitor {
    /// New unowned monitor.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState {
                owner: None,
                count: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Acquire without blocking. Returns false if another thread owns
    /// the monitor.
    pub fn try_enter(&self, tid: ThreadId) -> bool {
        let mut st = self.state.lock();
        match st.owner {
            None => {
                st.owner = Some(tid);
                st.count = 1;
                true
            }
            Some(owner) if owner == tid => {
                st.count += 1;
                true
            }
            Some(_) => false,
        }
    }

    /// Acquire, blocking until the current owner releases.
    pub fn enter(&self, tid: ThreadId) {
        let mut st = self.state.lock();
        loop {
            match st.owner {
                None => {
                    st.owner = Some(tid);
                    st.count = 1;
                    return;
                }
                Some(owner) if owner == tid => {
                    st.count += 1;
                    return;
                }
                Some(_) => self.cond.wait(&mut st),
            }
        }
    }

    /// Release one recursion level. Returns false if `tid` does not own
    /// the monitor (the caller raises IllegalMonitorState).
    pub fn exit(&self, tid: ThreadId) -> bool {
        let mut st = self.state.lock();
        if st.owner != Some(tid) {
            return false;
        }
        st.count -= 1;
        if st.count == 0 {
            st.owner = None;
            self.cond.notify_one();
        }
        true
    }

    /// Whether `tid` currently owns the monitor.
    pub fn is_owned_by(&self, tid: ThreadId) -> bool {
        self.state.lock().owner == Some(tid)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
