//! A registry slot is locked with the mutex the application picks, so a
//! long fan-out under the slot does not hold off interrupt-context
//! producers that only take short critical sections.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::RawMutex;
use topic::RegistrySlot;

/// Host stand-in for a thread-mode mutex: exclusive between threads, but
/// independent of the global critical section.
struct HostRawMutex(Mutex<()>);

// SAFETY: `lock` holds the std mutex for the whole closure, so at most one
// closure runs at a time.
unsafe impl RawMutex for HostRawMutex {
    const INIT: Self = Self(Mutex::new(()));

    fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

static SLOT: RegistrySlot<HostRawMutex, u32> = RegistrySlot::new();

#[test]
fn slow_slot_access_does_not_block_critical_sections() {
    SLOT.init(0).unwrap();

    let (entered_tx, entered_rx) = mpsc::channel();
    let holder = thread::spawn(move || {
        SLOT.with(|value| {
            entered_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(300));
            *value += 1;
        })
        .unwrap();
    });

    entered_rx.recv().unwrap();
    // What an RX interrupt does to queue a byte.
    let start = Instant::now();
    critical_section::with(|_| {});
    let waited = start.elapsed();

    holder.join().unwrap();
    assert!(
        waited < Duration::from_millis(100),
        "critical section waited {waited:?} behind the slot"
    );
    assert_eq!(SLOT.with(|value| *value), Ok(1));
}
