//! Renderer Lifecycle Tests
//!
//! Tests for:
//! - Backend selection, smoke test pass / failure / timeout and fallback
//! - Context loss: suppression order, durable flag, notice, stale frames
//! - Context restore: flag cleared, full restart, restore timeout
//! - Stale and out-of-order platform events

mod common;

use std::time::{Duration, Instant};

use atrium::errors::AtriumError;
use atrium::platform::{FrameClock, MemoryLossFlagStore, RecordingRestarter, RestartOutcome, SteppedFrameClock};
use atrium::renderer::{
    BackendKind, ContextId, ContextLostEvent, ContextRestoredEvent, LifecycleNotice, PlatformEvent,
};
use atrium::{AdaptiveSettings, LifecycleState, QualityTier, RendererLifecycleManager, TierConfig};

use common::{Behavior, Journal, JournalFlagStore, MockPlatform, init_logger};

fn test_clock() -> SteppedFrameClock {
    SteppedFrameClock::new(Instant::now(), Duration::from_millis(16))
}

fn manager(
    platform: MockPlatform,
) -> (
    RendererLifecycleManager<MockPlatform>,
    MemoryLossFlagStore,
    RecordingRestarter,
) {
    init_logger();
    let store = MemoryLossFlagStore::new(false);
    let restarter = RecordingRestarter::new(RestartOutcome::InProcess);
    let manager = RendererLifecycleManager::new(
        platform,
        store.clone(),
        restarter.clone(),
        &AdaptiveSettings::default(),
    );
    (manager, store, restarter)
}

fn high() -> TierConfig {
    TierConfig::for_tier(QualityTier::High)
}

fn ready_manager() -> (
    RendererLifecycleManager<MockPlatform>,
    MemoryLossFlagStore,
    RecordingRestarter,
    SteppedFrameClock,
) {
    let (mut m, store, restarter) = manager(MockPlatform::healthy());
    let mut clock = test_clock();
    pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();
    (m, store, restarter, clock)
}

fn lose(m: &mut RendererLifecycleManager<MockPlatform>, now: Instant) {
    let id = m.context_id().unwrap();
    m.event_sender()
        .send(PlatformEvent::ContextLost(ContextLostEvent::new(id, "gpu reset")))
        .unwrap();
    m.tick(now);
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn starts_uninitialized() {
    let (m, _, _) = manager(MockPlatform::healthy());
    assert_eq!(m.state(), LifecycleState::Uninitialized);
    assert!(m.backend().is_none());
    assert!(m.begin_frame().is_err());
}

#[test]
fn preferred_backend_used_when_smoke_test_passes() {
    let (mut m, _, _) = manager(MockPlatform::healthy());
    let mut clock = test_clock();

    let backend = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    assert_eq!(backend, BackendKind::Preferred);
    assert_eq!(m.state(), LifecycleState::Ready);
    assert_eq!(m.platform().created_kinds(), vec![BackendKind::Preferred]);
    assert!(!m.preferred_disabled());
}

#[test]
fn smoke_test_failure_falls_back_and_disposes_attempt() {
    let (mut m, _, _) = manager(MockPlatform::new(Behavior::Fail, Behavior::PassAfter(1)));
    let mut clock = test_clock();

    let backend = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    assert_eq!(backend, BackendKind::Fallback);
    assert_eq!(m.state(), LifecycleState::Ready);
    assert!(m.preferred_disabled());
    assert_eq!(
        m.platform().created_kinds(),
        vec![BackendKind::Preferred, BackendKind::Fallback]
    );
    // The failed preferred context (first id) was released.
    assert_eq!(m.platform().disposed_ids(), vec![ContextId::new(1)]);
}

#[test]
fn preferred_creation_failure_falls_back() {
    let (mut m, _, _) = manager(MockPlatform::new(Behavior::CreateFails, Behavior::PassAfter(1)));
    let mut clock = test_clock();

    let backend = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();
    assert_eq!(backend, BackendKind::Fallback);
    assert!(m.preferred_disabled());
}

#[test]
fn hanging_smoke_test_times_out_then_falls_back() {
    let (mut m, _, _) = manager(MockPlatform::new(Behavior::Hang, Behavior::PassAfter(1)));
    let mut clock = test_clock();
    let start = clock.now();

    let backend = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    assert_eq!(backend, BackendKind::Fallback);
    let waited = clock.now() - start;
    assert!(waited >= AdaptiveSettings::default().smoke_test_timeout());
    assert!(waited < AdaptiveSettings::default().smoke_test_timeout() + Duration::from_millis(100));
}

#[test]
fn constrained_tier_never_attempts_preferred() {
    let (mut m, _, _) = manager(MockPlatform::healthy());
    let mut clock = test_clock();

    let backend =
        pollster::block_on(m.initialize(&TierConfig::for_tier(QualityTier::Low), &mut clock)).unwrap();

    assert_eq!(backend, BackendKind::Fallback);
    assert_eq!(m.platform().created_kinds(), vec![BackendKind::Fallback]);
}

#[test]
fn unadvertised_preferred_is_skipped() {
    let mut platform = MockPlatform::healthy();
    platform.preferred_advertised = false;
    let (mut m, _, _) = manager(platform);
    let mut clock = test_clock();

    let backend = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();
    assert_eq!(backend, BackendKind::Fallback);
    assert_eq!(m.platform().created_kinds(), vec![BackendKind::Fallback]);
}

#[test]
fn no_working_backend_fails_with_notice() {
    let (mut m, _, _) = manager(MockPlatform::new(Behavior::Fail, Behavior::Hang));
    let notices = m.subscribe();
    let mut clock = test_clock();

    let err = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap_err();

    assert!(matches!(err, AtriumError::BackendUnavailable { .. }));
    assert_eq!(m.state(), LifecycleState::Failed);
    assert!(matches!(
        notices.try_recv(),
        Ok(LifecycleNotice::RecoveryFailed { .. })
    ));
}

#[test]
fn initialize_twice_is_rejected() {
    let (mut m, _, _, mut clock) = ready_manager();
    let err = pollster::block_on(m.initialize(&high(), &mut clock)).unwrap_err();
    assert!(matches!(
        err,
        AtriumError::InvalidTransition {
            from: LifecycleState::Ready,
            ..
        }
    ));
}

#[test]
fn frames_are_accepted_when_ready() {
    let (mut m, _, _, _) = ready_manager();
    let token = m.begin_frame().unwrap();
    m.submit_frame(token).unwrap();
    assert_eq!(*m.platform().presented.lock().unwrap(), 1);
}

// ============================================================================
// Context loss
// ============================================================================

#[test]
fn loss_suppresses_default_before_anything_else() {
    init_logger();
    let journal = Journal::default();
    let store = JournalFlagStore::new(journal.clone(), false);
    let mut platform = MockPlatform::healthy();
    platform.journal = journal.clone();
    let mut m = RendererLifecycleManager::new(
        platform,
        store.clone(),
        RecordingRestarter::new(RestartOutcome::InProcess),
        &AdaptiveSettings::default(),
    );
    let notices = m.subscribe();
    let mut clock = test_clock();
    pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    let id = m.context_id().unwrap();
    let hook_journal = journal.clone();
    let event = ContextLostEvent::new(id, "driver reset")
        .with_suppress_default(move || hook_journal.push("prevent_default"));
    m.event_sender().send(PlatformEvent::ContextLost(event)).unwrap();
    m.tick(clock.now());

    let suppressed = journal.position("prevent_default").unwrap();
    let flagged = journal.position("flag:true").unwrap();
    assert!(suppressed < flagged);
    assert!(store.value());
    assert_eq!(m.state(), LifecycleState::Lost);
    assert_eq!(
        notices.try_recv().unwrap(),
        LifecycleNotice::ContextLost {
            reason: "driver reset".to_string(),
            reload_available: true,
        }
    );
}

#[test]
fn loss_voids_in_flight_frames() {
    let (mut m, _, _, clock) = ready_manager();
    let token = m.begin_frame().unwrap();

    lose(&mut m, clock.now());

    assert!(matches!(m.submit_frame(token), Err(AtriumError::StaleFrame)));
    assert!(matches!(
        m.begin_frame(),
        Err(AtriumError::ContextNotReady(LifecycleState::Lost))
    ));
    assert!(m.context().unwrap().is_lost());
}

#[test]
fn loss_of_unknown_context_is_ignored_but_suppressed() {
    let (mut m, store, _, clock) = ready_manager();
    let journal = Journal::default();
    let hook_journal = journal.clone();
    let event = ContextLostEvent::new(ContextId::new(999), "old")
        .with_suppress_default(move || hook_journal.push("prevent_default"));

    m.event_sender().send(PlatformEvent::ContextLost(event)).unwrap();
    m.tick(clock.now());

    assert_eq!(journal.entries(), vec!["prevent_default".to_string()]);
    assert_eq!(m.state(), LifecycleState::Ready);
    assert!(!store.value());
    assert!(store.writes().is_empty());
}

#[test]
fn flag_write_failure_still_publishes_notice() {
    init_logger();
    let mut m = RendererLifecycleManager::new(
        MockPlatform::healthy(),
        MemoryLossFlagStore::failing(),
        RecordingRestarter::new(RestartOutcome::InProcess),
        &AdaptiveSettings::default(),
    );
    let notices = m.subscribe();
    let mut clock = test_clock();
    pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    lose(&mut m, clock.now());

    assert_eq!(m.state(), LifecycleState::Lost);
    assert!(matches!(
        notices.try_recv(),
        Ok(LifecycleNotice::ContextLost { .. })
    ));
}

#[test]
fn previous_session_loss_is_reported() {
    let m = RendererLifecycleManager::new(
        MockPlatform::healthy(),
        MemoryLossFlagStore::new(true),
        RecordingRestarter::new(RestartOutcome::InProcess),
        &AdaptiveSettings::default(),
    );
    assert!(m.previous_session_lost());
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn restore_clears_flag_and_restarts() {
    let (mut m, store, restarter, mut clock) = ready_manager();
    let notices = m.subscribe();
    lose(&mut m, clock.now());
    assert!(store.value());

    let id = m.context_id().unwrap();
    m.event_sender()
        .send(PlatformEvent::ContextRestored(ContextRestoredEvent { context: id }))
        .unwrap();
    m.tick(clock.now());

    assert_eq!(m.state(), LifecycleState::Restoring);
    assert!(!store.value());
    assert_eq!(store.writes(), vec![true, false]);
    assert_eq!(restarter.calls(), 1);
    assert!(m.needs_restart());

    let _lost = notices.try_recv().unwrap();
    assert_eq!(notices.try_recv().unwrap(), LifecycleNotice::ContextRestored);

    let backend = pollster::block_on(m.restart(&mut clock)).unwrap();
    assert_eq!(backend, BackendKind::Preferred);
    assert_eq!(m.state(), LifecycleState::Ready);
    assert_ne!(m.context_id(), Some(id));
    assert!(m.platform().disposed_ids().contains(&id));
}

#[test]
fn page_reload_that_never_happens_times_out_to_failed() {
    init_logger();
    let store = MemoryLossFlagStore::new(false);
    let mut m = RendererLifecycleManager::new(
        MockPlatform::healthy(),
        store,
        RecordingRestarter::new(RestartOutcome::Reloading),
        &AdaptiveSettings::default(),
    );
    let notices = m.subscribe();
    let mut clock = test_clock();
    pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();

    let start = clock.now();
    lose(&mut m, start);
    let id = m.context_id().unwrap();
    m.handle_context_restored(ContextRestoredEvent { context: id }, start);
    assert_eq!(m.state(), LifecycleState::Restoring);
    assert!(!m.needs_restart());

    m.tick(start + Duration::from_millis(4_999));
    assert_eq!(m.state(), LifecycleState::Restoring);

    m.tick(start + AdaptiveSettings::default().restore_timeout());
    assert_eq!(m.state(), LifecycleState::Failed);

    let received: Vec<_> = notices.try_iter().collect();
    assert!(matches!(
        received.last(),
        Some(LifecycleNotice::RecoveryFailed { .. })
    ));
}

#[test]
fn restore_without_loss_is_ignored() {
    let (mut m, store, restarter, clock) = ready_manager();
    let id = m.context_id().unwrap();
    m.handle_context_restored(ContextRestoredEvent { context: id }, clock.now());

    assert_eq!(m.state(), LifecycleState::Ready);
    assert_eq!(restarter.calls(), 0);
    assert!(store.writes().is_empty());
}

#[test]
fn restart_outside_restoring_is_rejected() {
    let (mut m, _, _, mut clock) = ready_manager();
    let err = pollster::block_on(m.restart(&mut clock)).unwrap_err();
    assert!(matches!(err, AtriumError::InvalidTransition { action: "restart", .. }));
}

#[test]
fn manual_reload_from_lost_restarts() {
    let (mut m, store, restarter, mut clock) = ready_manager();
    lose(&mut m, clock.now());

    m.request_reload(clock.now()).unwrap();
    assert_eq!(restarter.calls(), 1);
    assert!(!store.value());

    pollster::block_on(m.restart(&mut clock)).unwrap();
    assert_eq!(m.state(), LifecycleState::Ready);
}

#[test]
fn manual_reload_while_ready_is_rejected() {
    let (mut m, _, _, clock) = ready_manager();
    assert!(m.request_reload(clock.now()).is_err());
}

#[test]
fn restart_is_a_fresh_session_for_backend_selection() {
    let (mut m, _, _) = manager(MockPlatform::new(Behavior::Fail, Behavior::PassAfter(1)));
    let mut clock = test_clock();
    pollster::block_on(m.initialize(&high(), &mut clock)).unwrap();
    assert!(m.preferred_disabled());

    // The preferred backend works after the restart.
    m.platform_mut().preferred = Behavior::PassAfter(1);
    lose(&mut m, clock.now());
    m.request_reload(clock.now()).unwrap();
    let backend = pollster::block_on(m.restart(&mut clock)).unwrap();

    assert_eq!(backend, BackendKind::Preferred);
}

#[test]
fn initialization_and_restore_always_terminate() {
    // Every combination of backend behaviour resolves to Ready or Failed.
    let behaviors = [
        Behavior::PassAfter(3),
        Behavior::Fail,
        Behavior::Hang,
        Behavior::CreateFails,
    ];
    for preferred in behaviors {
        for fallback in behaviors {
            let (mut m, _, _) = manager(MockPlatform::new(preferred, fallback));
            let mut clock = test_clock();
            let _ = pollster::block_on(m.initialize(&high(), &mut clock));
            assert!(
                matches!(m.state(), LifecycleState::Ready | LifecycleState::Failed),
                "{preferred:?}/{fallback:?} left state {:?}",
                m.state()
            );
        }
    }
}
