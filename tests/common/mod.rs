//! Headless GPU platform double shared by the lifecycle and engine tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use atrium::errors::{AtriumError, Result};
use atrium::platform::LossFlagStore;
use atrium::quality::TierConfig;
use atrium::renderer::{
    BackendKind, ContextId, GpuContext, GpuPlatform, PlatformEvent, SmokeTestStatus,
};

/// Ordered record of side effects, shareable with `Send` callbacks.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// How a backend behaves when the manager tries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Smoke test completes after this many polls.
    PassAfter(u32),
    /// Smoke test reports a failure on the first poll.
    Fail,
    /// Smoke test never completes.
    Hang,
    /// Context creation itself fails.
    CreateFails,
}

#[derive(Debug, Clone)]
pub struct MockPlatform {
    pub preferred_advertised: bool,
    pub preferred: Behavior,
    pub fallback: Behavior,
    pub journal: Journal,
    pub created: Arc<Mutex<Vec<(BackendKind, ContextId)>>>,
    pub disposed: Arc<Mutex<Vec<ContextId>>>,
    pub presented: Arc<Mutex<u32>>,
}

impl MockPlatform {
    pub fn new(preferred: Behavior, fallback: Behavior) -> Self {
        Self {
            preferred_advertised: true,
            preferred,
            fallback,
            journal: Journal::default(),
            created: Arc::default(),
            disposed: Arc::default(),
            presented: Arc::default(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(Behavior::PassAfter(2), Behavior::PassAfter(1))
    }

    pub fn created_kinds(&self) -> Vec<BackendKind> {
        self.created.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    pub fn disposed_ids(&self) -> Vec<ContextId> {
        self.disposed.lock().unwrap().clone()
    }
}

impl GpuPlatform for MockPlatform {
    type Context = MockContext;

    fn advertises(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Preferred => self.preferred_advertised,
            BackendKind::Fallback => true,
        }
    }

    async fn create_context(
        &mut self,
        kind: BackendKind,
        id: ContextId,
        _config: &TierConfig,
        _events: flume::Sender<PlatformEvent>,
    ) -> Result<MockContext> {
        let behavior = match kind {
            BackendKind::Preferred => self.preferred,
            BackendKind::Fallback => self.fallback,
        };
        self.journal.push(format!("create:{kind}"));
        if behavior == Behavior::CreateFails {
            return Err(AtriumError::AdapterRequestFailed(format!("no {kind} adapter")));
        }
        self.created.lock().unwrap().push((kind, id));
        Ok(MockContext {
            id,
            behavior,
            polls: 0,
            disposed: Arc::clone(&self.disposed),
            presented: Arc::clone(&self.presented),
        })
    }
}

#[derive(Debug)]
pub struct MockContext {
    id: ContextId,
    behavior: Behavior,
    polls: u32,
    disposed: Arc<Mutex<Vec<ContextId>>>,
    presented: Arc<Mutex<u32>>,
}

impl GpuContext for MockContext {
    fn submit_smoke_test(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_smoke_test(&mut self) -> SmokeTestStatus {
        self.polls += 1;
        match self.behavior {
            Behavior::PassAfter(n) if self.polls >= n => SmokeTestStatus::Passed,
            Behavior::Fail => SmokeTestStatus::Failed("triangle did not render".to_string()),
            _ => SmokeTestStatus::Pending,
        }
    }

    fn present_frame(&mut self) -> Result<()> {
        *self.presented.lock().unwrap() += 1;
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed.lock().unwrap().push(self.id);
    }
}

/// Flag store that writes into a journal, to check ordering against other effects.
#[derive(Debug, Clone, Default)]
pub struct JournalFlagStore {
    pub journal: Journal,
    pub value: Arc<Mutex<bool>>,
}

impl JournalFlagStore {
    pub fn new(journal: Journal, initial: bool) -> Self {
        Self {
            journal,
            value: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn value(&self) -> bool {
        *self.value.lock().unwrap()
    }
}

impl LossFlagStore for JournalFlagStore {
    fn read(&self) -> Result<bool> {
        Ok(*self.value.lock().unwrap())
    }

    fn write(&mut self, lost: bool) -> Result<()> {
        self.journal.push(format!("flag:{lost}"));
        *self.value.lock().unwrap() = lost;
        Ok(())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Flat grid on the XZ plane with `cols * rows` vertices and upward-facing triangles.
pub fn grid_mesh(name: &str, cols: u32, rows: u32) -> atrium::MeshAsset {
    let mut positions = Vec::with_capacity((cols * rows) as usize);
    for z in 0..rows {
        for x in 0..cols {
            positions.push(glam::Vec3::new(x as f32, 0.0, z as f32));
        }
    }

    let mut indices = Vec::new();
    for z in 0..rows - 1 {
        for x in 0..cols - 1 {
            let a = z * cols + x;
            let b = a + 1;
            let c = a + cols;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    atrium::MeshAsset::new(name, positions, indices).unwrap()
}
