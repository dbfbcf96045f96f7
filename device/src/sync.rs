//! Timeline synchronization primitives for the lane pipeline.
//!
//! A timeline signal is a monotonically increasing counter. Each lane pipeline
//! couples its inbound stage and its compute/outbound stage with two of them:
//!
//! ```text
//! producer: wait(drained >= t + 1 - slots) ─► fill slot t % slots ─► filled.set(t + 1)
//! consumer: wait(filled >= t + 1)          ─► compute, drain      ─► drained.set(t + 1)
//! ```
//!
//! Every wait is bounded. A stage that fails calls [`TimelineSignal::poison`] so
//! that its peer stops waiting and returns [`Error::Poisoned`] instead of
//! timing out.
//!
//! [`Error::Poisoned`]: crate::error::Error::Poisoned

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{PoisonedSnafu, Result, SignalTimeoutSnafu};

/// Monotonic timeline signal.
///
/// The signal value only increases, and waiters block until the signal reaches
/// or exceeds the target value, the signal is poisoned, or the timeout expires.
pub trait TimelineSignal: Send + Sync + std::fmt::Debug {
    /// Get the current signal value.
    fn value(&self) -> u64;

    /// Advance the signal. Values below the current one are ignored.
    fn set(&self, value: u64);

    /// Wait for the signal to reach or exceed `target`, for at most `timeout`.
    fn wait(&self, target: u64, timeout: Duration) -> Result<()>;

    /// Wake every waiter with [`Error::Poisoned`](crate::error::Error::Poisoned).
    fn poison(&self);

    fn is_poisoned(&self) -> bool;

    /// Check if the signal has reached `value` without blocking.
    fn is_reached(&self, value: u64) -> bool {
        self.value() >= value
    }
}

/// CPU timeline signal using atomics and a condvar.
#[derive(Debug)]
pub struct CpuTimelineSignal {
    value: AtomicU64,
    poisoned: AtomicBool,
    /// Guards nothing; pairs with `condvar` so a wakeup cannot slip between check and park.
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl Default for CpuTimelineSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTimelineSignal {
    /// Create a new CPU timeline signal starting at 0.
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    /// Create a new CPU timeline signal with an initial value.
    pub fn with_initial(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
            poisoned: AtomicBool::new(false),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    fn notify(&self) {
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}

impl TimelineSignal for CpuTimelineSignal {
    fn value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    fn set(&self, value: u64) {
        self.value.fetch_max(value, Ordering::AcqRel);
        self.notify();
    }

    fn wait(&self, target: u64, timeout: Duration) -> Result<()> {
        // Fast path: already reached
        if self.value() >= target {
            return Ok(());
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.mutex.lock();
        loop {
            if self.value() >= target {
                return Ok(());
            }
            if self.is_poisoned() {
                return PoisonedSnafu { target }.fail();
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.condvar.wait_for(&mut guard, remaining).timed_out() {
                let current = self.value();
                if current >= target {
                    return Ok(());
                }
                if self.is_poisoned() {
                    return PoisonedSnafu { target }.fail();
                }
                return SignalTimeoutSnafu { target, current, waited_ms: timeout.as_millis() as u64 }.fail();
            }
        }
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
        self.notify();
    }

    fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }
}
