//! Typed platform events and user-facing lifecycle notices.

use std::fmt;

/// Identifies one created GPU context. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

type SuppressDefault = Box<dyn FnOnce() + Send>;

/// The platform reports that a context is gone.
///
/// Carries the hook that suppresses the platform's own recovery (the browser's
/// `preventDefault()`, for instance). The hook runs at most once.
pub struct ContextLostEvent {
    pub context: ContextId,
    pub reason: String,
    suppress_default: Option<SuppressDefault>,
    default_prevented: bool,
}

impl ContextLostEvent {
    #[must_use]
    pub fn new(context: ContextId, reason: impl Into<String>) -> Self {
        Self {
            context,
            reason: reason.into(),
            suppress_default: None,
            default_prevented: false,
        }
    }

    /// Installs the hook run by [`prevent_default`](Self::prevent_default).
    #[must_use]
    pub fn with_suppress_default(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.suppress_default = Some(Box::new(hook));
        self
    }

    /// For sources that must suppress synchronously inside their own callback.
    #[must_use]
    pub fn already_prevented(mut self) -> Self {
        self.default_prevented = true;
        self
    }

    pub fn prevent_default(&mut self) {
        if let Some(hook) = self.suppress_default.take() {
            hook();
        }
        self.default_prevented = true;
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl fmt::Debug for ContextLostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextLostEvent")
            .field("context", &self.context)
            .field("reason", &self.reason)
            .field("default_prevented", &self.default_prevented)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRestoredEvent {
    pub context: ContextId,
}

/// Asynchronous notifications from the GPU platform.
#[derive(Debug)]
pub enum PlatformEvent {
    ContextLost(ContextLostEvent),
    ContextRestored(ContextRestoredEvent),
}

impl PlatformEvent {
    #[must_use]
    pub fn context(&self) -> ContextId {
        match self {
            Self::ContextLost(ev) => ev.context,
            Self::ContextRestored(ev) => ev.context,
        }
    }
}

/// Messages for the notification banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleNotice {
    /// Rendering stopped. `reload_available` tells the banner to offer a reload button.
    ContextLost {
        reason: String,
        reload_available: bool,
    },
    /// The platform gave the GPU back and a restart is under way.
    ContextRestored,
    /// The session could not be brought back.
    RecoveryFailed { reason: String },
}

/// Typed fan-out of [`LifecycleNotice`]s.
///
/// Each subscriber owns a receiver; dropped receivers are pruned on the next publish.
#[derive(Debug, Default)]
pub struct NoticeBus {
    subscribers: Vec<flume::Sender<LifecycleNotice>>,
}

impl NoticeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> flume::Receiver<LifecycleNotice> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, notice: &LifecycleNotice) {
        self.subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn suppress_hook_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut event = ContextLostEvent::new(ContextId::new(1), "test")
            .with_suppress_default(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert!(!event.default_prevented());
        event.prevent_default();
        event.prevent_default();

        assert!(event.default_prevented());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bus_prunes_dropped_subscribers() {
        let mut bus = NoticeBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(&LifecycleNotice::ContextRestored);

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(LifecycleNotice::ContextRestored));
    }
}
