//! Cooperative cancellation.
//!
//! A host installs a shared flag for the current thread; long loops in the
//! containers poll it and bail out with [`ArrayError::Interrupted`].

use std::cell::RefCell;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::config::engine_config;
use crate::error::{ArrayError, Result};

thread_local! {
    static INTERRUPT_HANDLE: RefCell<Option<Arc<AtomicBool>>> = const { RefCell::new(None) };
}

pub struct InterruptGuard {
    previous: Option<Arc<AtomicBool>>,
}

impl InterruptGuard {
    pub fn install(handle: Option<Arc<AtomicBool>>) -> Self {
        let previous = INTERRUPT_HANDLE.with(|slot| slot.replace(handle));
        Self { previous }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        INTERRUPT_HANDLE.with(|slot| {
            slot.replace(self.previous.take());
        });
    }
}

pub fn replace_interrupt(handle: Option<Arc<AtomicBool>>) -> InterruptGuard {
    InterruptGuard::install(handle)
}

pub fn is_cancelled() -> bool {
    INTERRUPT_HANDLE.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    })
}

pub fn check_interrupt() -> Result<()> {
    if is_cancelled() {
        return Err(ArrayError::Interrupted);
    }
    Ok(())
}

/// Strided poll for hot loops: checks the flag on the first call and then
/// once every `stride` elements.
#[derive(Debug, Clone)]
pub struct InterruptPoller {
    stride: usize,
    countdown: usize,
}

impl InterruptPoller {
    pub fn new() -> Self {
        Self::with_stride(engine_config().interrupt_poll_interval)
    }

    pub fn with_stride(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            countdown: 0,
        }
    }

    #[inline]
    pub fn tick(&mut self) -> Result<()> {
        self.advance(1)
    }

    /// Account for `work` elements processed since the last call.
    #[inline]
    pub fn advance(&mut self, work: usize) -> Result<()> {
        if self.countdown <= work {
            self.countdown = self.stride;
            return check_interrupt();
        }
        self.countdown -= work;
        Ok(())
    }
}

impl Default for InterruptPoller {
    fn default() -> Self {
        Self::new()
    }
}
