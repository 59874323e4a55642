//! Session integration tests
//!
//! Bounded runs with a zero or short duration, early stop from another
//! thread, and the outcome reported for each failure class.

use std::time::{Duration, Instant};

use patchplay::core::Error as CoreError;
use patchplay::prelude::*;
use patchplay::Error;

use crate::helpers::*;

fn timed_session(engine: FakeEngine, host: FakeHost, run: Duration) -> Session<FakeEngine, FakeHost> {
    let player = PatchPlayerBuilder::new()
        .run_duration(run)
        .build(engine, host)
        .unwrap();
    Session::new(player)
}

#[test]
fn test_zero_duration_run_completes_full_lifecycle() {
    let (engine, host, tap) = fixture();
    let (_stop, signal) = stop_channel();

    let outcome = timed_session(engine, host, Duration::ZERO).run(&signal);

    assert!(matches!(outcome, SessionOutcome::Completed));
    assert_eq!(
        tap.calls(),
        vec![
            "engine.init 0 2 48000",
            "engine.search_path pd",
            "engine.open test.pd",
            "host.init_driver fake",
            "host.open",
            "engine.compute on",
            "device.unpause",
            "device.pause",
            "device.close",
            "engine.compute off",
            "engine.close test.pd",
        ]
    );
}

#[test]
fn test_run_waits_for_duration() {
    let (engine, host, _tap) = fixture();
    let (_stop, signal) = stop_channel();

    let start = Instant::now();
    let outcome = timed_session(engine, host, Duration::from_millis(50)).run(&signal);

    assert!(matches!(outcome, SessionOutcome::Completed));
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_stop_before_run_ends_immediately() {
    let (engine, host, tap) = fixture();
    let (stop, signal) = stop_channel();
    stop.stop();

    let start = Instant::now();
    let outcome = timed_session(engine, host, Duration::from_secs(60)).run(&signal);

    assert!(matches!(outcome, SessionOutcome::Stopped));
    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(tap.calls().last().map(String::as_str), Some("engine.close test.pd"));
}

#[test]
fn test_stop_from_audio_side_thread() {
    let (engine, host, tap) = fixture();
    let (stop, signal) = stop_channel();

    // Plays the platform: waits for the device to unpause, renders one
    // cycle, then asks the session to stop.
    let remote = tap.clone();
    let driver = std::thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        while remote.position("device.unpause").is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        let rendered = remote.fire(TEST_CALLBACK_BYTES).is_some();
        stop.stop();
        rendered
    });

    let outcome = timed_session(engine, host, Duration::from_secs(60)).run(&signal);

    assert!(driver.join().unwrap());
    assert!(matches!(outcome, SessionOutcome::Stopped));
    assert_eq!(tap.callbacks_fired(), 1);
    assert_eq!(tap.calls_matching("engine.process"), vec!["engine.process 8"]);
}

#[test]
fn test_setup_failure_skips_start_and_shutdown() {
    let (engine, host, tap) = fixture();
    let (_stop, signal) = stop_channel();

    let outcome = timed_session(engine, host.failing_open(), Duration::ZERO).run(&signal);

    assert!(matches!(
        outcome,
        SessionOutcome::SetupFailed(Error::Core(CoreError::DeviceOpen(_)))
    ));
    assert!(!outcome.is_success());
    assert!(tap.calls_matching("engine.compute").is_empty());
    assert!(tap.calls_matching("device.").is_empty());
}

#[test]
fn test_start_failure_still_releases_resources() {
    let (engine, host, tap) = fixture();
    let (_stop, signal) = stop_channel();

    let mut session = timed_session(engine, host.failing_unpause(), Duration::ZERO);
    let outcome = session.run(&signal);

    assert!(matches!(outcome, SessionOutcome::StartFailed(_)));
    assert_eq!(session.player().phase(), PlayerPhase::ShutDown);

    let calls = tap.calls();
    let tail: Vec<&str> = calls[calls.len() - 4..].iter().map(String::as_str).collect();
    assert_eq!(
        tail,
        ["device.pause", "device.close", "engine.compute off", "engine.close test.pd"]
    );
}

#[test]
fn test_session_exposes_player_state() {
    let (engine, host, _tap) = fixture();
    let (_stop, signal) = stop_channel();

    let mut session = timed_session(engine, host, Duration::ZERO);
    assert_eq!(session.player().phase(), PlayerPhase::Created);

    session.run(&signal);
    let player = session.into_player();
    assert_eq!(player.phase(), PlayerPhase::ShutDown);
    assert_eq!(player.block_size(), TEST_BLOCK_SIZE);
}
