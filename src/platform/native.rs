use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{FrameClock, LossFlagStore, RestartOutcome, SessionRestarter};
use crate::errors::Result;
use crate::utils::time::{Duration, Instant};

/// Resolves at the next multiple of a fixed frame interval.
///
/// The wait happens on a dedicated timer thread; `next_frame` only awaits its tick, so
/// the polling executor is never blocked.
#[derive(Debug)]
pub struct IntervalFrameClock {
    interval: Duration,
    next_deadline: Instant,
    wake_at: flume::Sender<Instant>,
    woken: flume::Receiver<()>,
}

impl IntervalFrameClock {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let (wake_at, deadlines) = flume::unbounded::<Instant>();
        let (ticks, woken) = flume::bounded(1);
        std::thread::spawn(move || {
            // Ends once the clock drops its sender.
            for deadline in deadlines.iter() {
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
                if ticks.send(()).is_err() {
                    break;
                }
            }
        });

        Self {
            interval,
            next_deadline: Instant::now() + interval,
            wake_at,
            woken,
        }
    }

    #[must_use]
    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / f64::from(hz.max(1))))
    }
}

impl FrameClock for IntervalFrameClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn next_frame(&mut self) -> Instant {
        let scheduled =
            self.next_deadline > Instant::now() && self.wake_at.send(self.next_deadline).is_ok();
        if scheduled && self.woken.recv_async().await.is_err() {
            log::warn!("Frame timer thread stopped; frames are no longer paced");
        }
        let now = Instant::now();
        // Skip missed slots instead of bursting to catch up
        while self.next_deadline <= now {
            self.next_deadline += self.interval;
        }
        now
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LossFlagFile {
    context_lost: bool,
}

/// Stores the flag as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileLossFlagStore {
    path: PathBuf,
}

impl FileLossFlagStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/<key>.json`
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>, key: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{key}.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LossFlagStore for FileLossFlagStore {
    fn read(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let text = fs::read_to_string(&self.path)?;
        let file: LossFlagFile = serde_json::from_str(&text)?;
        Ok(file.context_lost)
    }

    fn write(&mut self, lost: bool) -> Result<()> {
        if !lost && !self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&LossFlagFile { context_lost: lost })?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Native hosts restart by tearing the renderer down and initializing again.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessRestarter;

impl SessionRestarter for InProcessRestarter {
    fn restart(&mut self) -> Result<RestartOutcome> {
        log::info!("Restarting renderer in process");
        Ok(RestartOutcome::InProcess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::task::{Context, Waker};

    #[test]
    fn interval_clock_waits_for_the_deadline() {
        let mut clock = IntervalFrameClock::new(Duration::from_millis(20));
        let start = Instant::now();

        let first = pollster::block_on(clock.next_frame());
        let second = pollster::block_on(clock.next_frame());

        assert!(first.duration_since(start) >= Duration::from_millis(15));
        assert!(second > first);
    }

    #[test]
    fn waiting_for_a_frame_does_not_block_the_caller() {
        let mut clock = IntervalFrameClock::new(Duration::from_secs(5));
        let mut frame = std::pin::pin!(clock.next_frame());
        let mut cx = Context::from_waker(Waker::noop());

        let start = Instant::now();
        assert!(frame.as_mut().poll(&mut cx).is_pending());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn file_flag_round_trip() {
        let dir = std::env::temp_dir().join(format!("atrium-flag-{}", uuid::Uuid::new_v4()));
        let mut store = FileLossFlagStore::in_dir(&dir, "atrium.context-lost");

        assert!(!store.read().unwrap());
        store.write(true).unwrap();
        assert!(store.read().unwrap());
        store.write(false).unwrap();
        assert!(!store.read().unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clearing_a_missing_flag_creates_nothing() {
        let dir = std::env::temp_dir().join(format!("atrium-flag-{}", uuid::Uuid::new_v4()));
        let mut store = FileLossFlagStore::in_dir(&dir, "flag");
        store.write(false).unwrap();
        assert!(!store.path().exists());
    }
}
