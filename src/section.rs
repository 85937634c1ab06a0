//! `critical-section` provider for ESP-IDF builds.
//!
//! The embassy CS mutexes in `app` and `control` are entered from the
//! Bluedroid task and the roast loop.  On device a critical section is one
//! global FreeRTOS-backed mutex, re-entrant per thread, so interrupts stay
//! enabled and the queue may allocate while inside.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

/// Enter a section guarded by `lock`.  Only the outermost entry on a
/// thread takes the lock.  Returns the new nesting depth.
pub(crate) fn enter(lock: &'static Mutex<()>) -> u8 {
    let depth = DEPTH.get();
    if depth == 0 {
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        HELD.with_borrow_mut(|held| *held = Some(guard));
    }
    let depth = depth.saturating_add(1);
    DEPTH.set(depth);
    depth
}

/// Leave the innermost section; the lock is released at depth zero.
pub(crate) fn leave() {
    let depth = DEPTH.get();
    if depth == 0 {
        return;
    }
    DEPTH.set(depth - 1);
    if depth == 1 {
        HELD.with_borrow_mut(Option::take);
    }
}

#[cfg(feature = "espidf")]
mod provider {
    use std::sync::Mutex;

    use critical_section::RawRestoreState;

    static SECTION: Mutex<()> = Mutex::new(());

    struct MutexSection;
    critical_section::set_impl!(MutexSection);

    // SAFETY: `enter`/`leave` pair up per thread and the guard is released
    // only by the outermost `release`, so sections are mutually exclusive.
    unsafe impl critical_section::Impl for MutexSection {
        unsafe fn acquire() -> RawRestoreState {
            super::enter(&SECTION);
            RawRestoreState::default()
        }

        unsafe fn release(_: RawRestoreState) {
            super::leave();
        }
    }
}
