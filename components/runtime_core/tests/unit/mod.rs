//! Unit tests for the thread model and suspension protocol

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use runtime_core::{ThreadRegistry, ThreadSnapshot, ThreadStatus};

/// Stress the suspend-all/resume-all protocol: mutators continuously
/// cross safepoints while a requester repeatedly stops the world. The
/// requester must never observe a running mutator inside an exclusive
/// section, and the whole dance must not deadlock.
#[test]
fn test_suspend_resume_stress() {
    const MUTATORS: usize = 4;
    const ROUNDS: usize = 25;

    let reg = Arc::new(ThreadRegistry::new());
    let stop = Arc::new(AtomicBool::new(false));
    let safepoints = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    let mut ids = Vec::new();
    for i in 0..MUTATORS {
        let vm_thread = reg.attach(&format!("mutator-{i}"));
        ids.push(vm_thread.id());
        let control = vm_thread.control.clone();
        let reg2 = reg.clone();
        let stop2 = stop.clone();
        let counter = safepoints.clone();
        handles.push(thread::spawn(move || {
            reg2.mutator.lock_shared();
            control.set_status(ThreadStatus::Running);
            while !stop2.load(Ordering::Relaxed) {
                // Simulated interpreter work between safepoints
                for _ in 0..50 {
                    std::hint::spin_loop();
                }
                counter.fetch_add(1, Ordering::Relaxed);
                if control.suspend_pending() {
                    reg2.park_at_safepoint(&control, ThreadSnapshot::default);
                }
            }
            reg2.mutator.unlock_shared();
            control.set_status(ThreadStatus::Native);
        }));
    }

    // Let the mutators spin up
    while safepoints.load(Ordering::Relaxed) < MUTATORS {
        thread::sleep(Duration::from_millis(1));
    }

    for round in 0..ROUNDS {
        reg.suspend_all(None);
        // Exclusive section: every mutator must be observably parked
        for id in &ids {
            let status = reg.by_id(*id).unwrap().status();
            assert_eq!(
                status,
                ThreadStatus::Suspended,
                "round {round}: thread {id:?} not suspended"
            );
        }
        let before = safepoints.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        let after = safepoints.load(Ordering::SeqCst);
        assert_eq!(before, after, "round {round}: mutator progressed while suspended");
        reg.resume_all(None);
        // Give the world a moment to run again
        thread::sleep(Duration::from_millis(1));
    }

    stop.store(true, Ordering::Relaxed);
    for h in handles {
        h.join().unwrap();
    }
}

/// A thread suspended between safepoints must still be observed parked
/// before the requester's exclusive work begins.
#[test]
fn test_suspend_one_then_inspect_snapshot() {
    let reg = Arc::new(ThreadRegistry::new());
    let vm_thread = reg.attach("target");
    let id = vm_thread.id();
    let control = vm_thread.control.clone();
    let stop = Arc::new(AtomicBool::new(false));

    let reg2 = reg.clone();
    let stop2 = stop.clone();
    let worker = thread::spawn(move || {
        reg2.mutator.lock_shared();
        control.set_status(ThreadStatus::Running);
        while !stop2.load(Ordering::Relaxed) {
            if control.suspend_pending() {
                reg2.park_at_safepoint(&control, || ThreadSnapshot { frames: vec![] });
            }
        }
        reg2.mutator.unlock_shared();
    });

    assert!(reg.suspend_thread(id));
    assert!(reg.wait_for_suspended(id, Duration::from_secs(5)));
    // Snapshot is published while parked
    assert!(reg.by_id(id).unwrap().snapshot().is_some());

    assert!(reg.resume_thread(id));
    stop.store(true, Ordering::Relaxed);
    worker.join().unwrap();

    // Snapshot is withdrawn once running again
    assert!(reg.by_id(id).unwrap().snapshot().is_none());
}
