use std::cell::RefCell;
use std::rc::Rc;

use super::{FrameClock, LossFlagStore, RestartOutcome, SessionRestarter};
use crate::errors::{AtriumError, Result};
use crate::utils::time::{Duration, Instant};

/// Deterministic clock: each frame advances time by a fixed step.
#[derive(Debug, Clone)]
pub struct SteppedFrameClock {
    now: Instant,
    step: Duration,
    frames: u64,
}

impl SteppedFrameClock {
    #[must_use]
    pub fn new(start: Instant, step: Duration) -> Self {
        Self {
            now: start,
            step,
            frames: 0,
        }
    }

    /// Starts now with a 60 Hz step.
    #[must_use]
    pub fn at_60hz() -> Self {
        Self::new(Instant::now(), Duration::from_micros(16_667))
    }

    /// Moves time forward without producing a frame.
    pub fn advance(&mut self, by: Duration) -> Instant {
        self.now += by;
        self.now
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameClock for SteppedFrameClock {
    fn now(&self) -> Instant {
        self.now
    }

    async fn next_frame(&mut self) -> Instant {
        self.frames += 1;
        self.now += self.step;
        self.now
    }
}

/// In-memory flag. Clones share the same value, so a test can keep a handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryLossFlagStore {
    value: Rc<RefCell<bool>>,
    writes: Rc<RefCell<Vec<bool>>>,
    fail_writes: bool,
}

impl MemoryLossFlagStore {
    #[must_use]
    pub fn new(initial: bool) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial)),
            ..Default::default()
        }
    }

    /// Every write is rejected with a storage error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn value(&self) -> bool {
        *self.value.borrow()
    }

    /// All successful writes, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<bool> {
        self.writes.borrow().clone()
    }
}

impl LossFlagStore for MemoryLossFlagStore {
    fn read(&self) -> Result<bool> {
        Ok(*self.value.borrow())
    }

    fn write(&mut self, lost: bool) -> Result<()> {
        if self.fail_writes {
            return Err(AtriumError::Storage("storage is read-only".to_string()));
        }
        *self.value.borrow_mut() = lost;
        self.writes.borrow_mut().push(lost);
        Ok(())
    }
}

/// Restarter that returns a fixed outcome and counts calls.
#[derive(Debug, Clone)]
pub struct RecordingRestarter {
    outcome: RestartOutcome,
    calls: Rc<RefCell<u32>>,
}

impl RecordingRestarter {
    #[must_use]
    pub fn new(outcome: RestartOutcome) -> Self {
        Self {
            outcome,
            calls: Rc::new(RefCell::new(0)),
        }
    }

    #[must_use]
    pub fn calls(&self) -> u32 {
        *self.calls.borrow()
    }
}

impl SessionRestarter for RecordingRestarter {
    fn restart(&mut self) -> Result<RestartOutcome> {
        *self.calls.borrow_mut() += 1;
        Ok(self.outcome)
    }
}
