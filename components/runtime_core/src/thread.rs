//! VM threads and the suspension protocol
//!
//! One OS thread per interpreter thread. Each has a shared control
//! block (id, status, suspend count, resume condvar, published frame
//! snapshot) and a thread-confined `VmThread` the interpreter mutates
//! freely (pending exception, tracked allocations, local references).
//!
//! Suspension is count-based: a requester bumps target counts under the
//! global suspend-count mutex, then (for suspend-all) acquires the
//! mutator lock exclusively, which blocks until every mutator has
//! parked. A mutator polls its count at safepoints; on a nonzero count
//! it drops its shared hold, publishes a frame snapshot, and waits on
//! its resume condvar under the suspend-count mutex until the count
//! returns to zero: then re-acquires the shared hold and re-polls,
//! because another request may have landed in the interim. Waiting
//! under the same mutex the resumer signals under closes the
//! lost-wakeup window.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use core_types::{MethodId, ObjRef, ThreadId};
use memory_manager::{ReferenceTable, TrackedAllocs};
use parking_lot::{Condvar, Mutex};

use crate::mutator::MutatorLock;

/// Scheduling state of a thread, as the debugger observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ThreadStatus {
    /// Executing bytecode under a shared mutator hold.
    Running = 1,
    /// Executing native code (no mutator hold).
    Native = 2,
    /// Parked at a safepoint with a nonzero suspend count.
    Suspended = 3,
    /// Blocked entering a contended monitor.
    Monitor = 4,
}

/// One interpreted frame as published for inspection.
#[derive(Debug, Clone)]
pub struct FrameView {
    /// Executing method.
    pub method: MethodId,
    /// Current pc, in code units.
    pub pc: u32,
    /// Copy of the frame's register window.
    pub registers: Vec<u32>,
}

/// The frames of a suspended thread, innermost first.
#[derive(Debug, Clone, Default)]
pub struct ThreadSnapshot {
    /// Frames, index 0 = current.
    pub frames: Vec<FrameView>,
}

/// Shared per-thread control block.
#[derive(Debug)]
pub struct ThreadControl {
    /// Thread id, stable for the process lifetime.
    pub id: ThreadId,
    /// Thread name, surfaced to the debugger.
    pub name: Mutex<String>,
    status: AtomicU32,
    suspend_count: AtomicU32,
    resume_cond: Condvar,
    snapshot: Mutex<Option<ThreadSnapshot>>,
}

impl ThreadControl {
    /// Current status.
    pub fn status(&self) -> ThreadStatus {
        match self.status.load(Ordering::Acquire) {
            1 => ThreadStatus::Running,
            2 => ThreadStatus::Native,
            3 => ThreadStatus::Suspended,
            _ => ThreadStatus::Monitor,
        }
    }

    /// Store a new status.
    pub fn set_status(&self, status: ThreadStatus) {
        self.status.store(status as u32, Ordering::Release);
    }

    /// Current suspend count (racy snapshot; authoritative reads happen
    /// under the registry's suspend-count mutex).
    pub fn suspend_count(&self) -> u32 {
        self.suspend_count.load(Ordering::Acquire)
    }

    /// Whether a suspend request is pending: the interpreter's fast
    /// safepoint poll.
    #[inline]
    pub fn suspend_pending(&self) -> bool {
        self.suspend_count.load(Ordering::Acquire) != 0
    }

    /// Read the published snapshot. Meaningful only while the thread is
    /// confirmed suspended.
    pub fn snapshot(&self) -> Option<ThreadSnapshot> {
        self.snapshot.lock().clone()
    }
}

/// Thread-confined interpreter state.
#[derive(Debug)]
pub struct VmThread {
    /// Shared control block.
    pub control: Arc<ThreadControl>,
    /// The pending exception object, if any.
    pub pending_exception: Option<ObjRef>,
    /// Pins for allocations not yet reachable from a register.
    pub tracked: TrackedAllocs,
    /// Local references pinned for the duration of a native call.
    pub local_refs: ReferenceTable,
    /// Whether this thread currently holds its shared mutator hold.
    /// Nested interpreter activations share the single hold.
    pub holds_mutator: bool,
}

impl VmThread {
    /// The thread's id.
    pub fn id(&self) -> ThreadId {
        self.control.id
    }

    /// Record `obj` as the pending exception.
    pub fn set_pending(&mut self, obj: ObjRef) {
        debug_assert!(!obj.is_null());
        self.pending_exception = Some(obj);
    }

    /// Take the pending exception, clearing the slot.
    pub fn take_pending(&mut self) -> Option<ObjRef> {
        self.pending_exception.take()
    }
}

const LOCAL_REFS_INITIAL: usize = 16;
const LOCAL_REFS_MAX: usize = 512;

/// Registry of all attached threads plus the global locks.
#[derive(Debug)]
pub struct ThreadRegistry {
    threads: Mutex<Vec<Arc<ThreadControl>>>,
    /// Guards every thread's suspend count; resume signals under it.
    suspend_lock: Mutex<()>,
    /// The global mutator lock.
    pub mutator: MutatorLock,
    next_id: AtomicU32,
}

impl ThreadRegistry {
    /// New empty registry.
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(Vec::new()),
            suspend_lock: Mutex::new(()),
            mutator: MutatorLock::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Attach the calling OS thread, starting in `Native` status (it
    /// takes its shared hold when it enters the interpreter).
    pub fn attach(&self, name: &str) -> VmThread {
        let id = ThreadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let control = Arc::new(ThreadControl {
            id,
            name: Mutex::new(name.to_string()),
            status: AtomicU32::new(ThreadStatus::Native as u32),
            suspend_count: AtomicU32::new(0),
            resume_cond: Condvar::new(),
            snapshot: Mutex::new(None),
        });
        self.threads.lock().push(control.clone());
        log::debug!("thread {:?} ({}) attached", id, name);
        VmThread {
            control,
            pending_exception: None,
            tracked: TrackedAllocs::new(),
            local_refs: ReferenceTable::new(LOCAL_REFS_INITIAL, LOCAL_REFS_MAX),
            holds_mutator: false,
        }
    }

    /// Detach a thread, removing it from suspension targeting.
    pub fn detach(&self, thread: &VmThread) {
        let id = thread.id();
        self.threads.lock().retain(|c| c.id != id);
        log::debug!("thread {:?} detached", id);
    }

    /// Snapshot of all control blocks.
    pub fn controls(&self) -> Vec<Arc<ThreadControl>> {
        self.threads.lock().clone()
    }

    /// Find a control block by id.
    pub fn by_id(&self, id: ThreadId) -> Option<Arc<ThreadControl>> {
        self.threads.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Suspend every thread except `requester`: bump counts under the
    /// suspend-count mutex, release it, then take the mutator lock
    /// exclusively, which returns only once every mutator has parked.
    ///
    /// The requester must not hold a shared mutator hold.
    pub fn suspend_all(&self, requester: Option<ThreadId>) {
        let targets: Vec<_> = self
            .controls()
            .into_iter()
            .filter(|c| Some(c.id) != requester)
            .collect();
        {
            let _guard = self.suspend_lock.lock();
            for t in &targets {
                t.suspend_count.fetch_add(1, Ordering::AcqRel);
            }
        }
        self.mutator.lock_exclusive();
        log::debug!("suspend-all complete ({} targets)", targets.len());
    }

    /// Undo [`ThreadRegistry::suspend_all`]: release the exclusive
    /// hold, then decrement counts and signal each resume condvar under
    /// the suspend-count mutex.
    pub fn resume_all(&self, requester: Option<ThreadId>) {
        self.mutator.unlock_exclusive();
        let targets: Vec<_> = self
            .controls()
            .into_iter()
            .filter(|c| Some(c.id) != requester)
            .collect();
        let _guard = self.suspend_lock.lock();
        for t in &targets {
            Self::decrement_locked(t);
        }
    }

    /// Suspend one thread (debugger). It parks at its next safepoint.
    pub fn suspend_thread(&self, id: ThreadId) -> bool {
        let Some(control) = self.by_id(id) else {
            return false;
        };
        let _guard = self.suspend_lock.lock();
        control.suspend_count.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Resume one thread.
    pub fn resume_thread(&self, id: ThreadId) -> bool {
        let Some(control) = self.by_id(id) else {
            return false;
        };
        let _guard = self.suspend_lock.lock();
        Self::decrement_locked(&control)
    }

    fn decrement_locked(control: &ThreadControl) -> bool {
        let prev = control.suspend_count.load(Ordering::Acquire);
        if prev == 0 {
            log::warn!("resume of thread {:?} with zero suspend count", control.id);
            return false;
        }
        control
            .suspend_count
            .store(prev - 1, Ordering::Release);
        if prev == 1 {
            control.resume_cond.notify_all();
        }
        true
    }

    /// The safepoint slow path. Called by the owning thread while it
    /// holds a shared mutator hold and its suspend count is nonzero.
    ///
    /// `publish` captures the thread's frames for debugger inspection;
    /// it runs (again) each time the thread is about to park.
    pub fn park_at_safepoint(
        &self,
        control: &ThreadControl,
        mut publish: impl FnMut() -> ThreadSnapshot,
    ) {
        let mut parked = false;
        loop {
            if !control.suspend_pending() {
                break;
            }
            // Drop the shared hold so an exclusive acquirer can proceed
            self.mutator.unlock_shared();
            *control.snapshot.lock() = Some(publish());
            control.set_status(ThreadStatus::Suspended);
            parked = true;

            {
                let mut guard = self.suspend_lock.lock();
                while control.suspend_count.load(Ordering::Acquire) != 0 {
                    control.resume_cond.wait(&mut guard);
                }
            }

            // Re-acquire and re-poll before reporting Running: a new
            // request may land while the shared hold comes back, and
            // the thread must stay observably suspended through it
            self.mutator.lock_shared();
        }
        if parked {
            control.set_status(ThreadStatus::Running);
            *control.snapshot.lock() = None;
        }
    }

    /// Debugger-side wait until the target is observably parked.
    pub fn wait_for_suspended(&self, id: ThreadId, timeout: Duration) -> bool {
        let Some(control) = self.by_id(id) else {
            return false;
        };
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if control.status() == ThreadStatus::Suspended {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        control.status() == ThreadStatus::Suspended
    }
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
