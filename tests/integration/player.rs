//! Player lifecycle integration tests
//!
//! Ordering of engine and device calls, and which steps are skipped when an
//! earlier one fails.

use patchplay::core::Error as CoreError;
use patchplay::prelude::*;
use patchplay::Error;

use crate::helpers::*;

const SHUTDOWN_SEQUENCE: [&str; 4] = [
    "device.pause",
    "device.close",
    "engine.compute off",
    "engine.close test.pd",
];

fn tail(calls: &[String], n: usize) -> Vec<&str> {
    calls[calls.len() - n..].iter().map(String::as_str).collect()
}

#[test]
fn test_setup_runs_engine_before_device() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();

    assert_eq!(
        tap.calls(),
        vec![
            "engine.init 0 2 48000",
            "engine.search_path pd",
            "engine.open test.pd",
            "host.init_driver fake",
            "host.open",
        ]
    );
    assert_eq!(player.phase(), PlayerPhase::Ready);
    assert_eq!(player.block_size(), TEST_BLOCK_SIZE);
    assert!(player.device_id().is_some());
}

#[test]
fn test_device_stays_paused_until_start() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    assert!(tap.fire(TEST_CALLBACK_BYTES).is_none());

    player.start().unwrap();
    assert!(player.is_playing());
    assert!(tap.fire(TEST_CALLBACK_BYTES).is_some());
}

#[test]
fn test_start_enables_compute_before_unpausing() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    player.start().unwrap();

    let compute = tap.position("engine.compute on").unwrap();
    let unpause = tap.position("device.unpause").unwrap();
    assert!(compute < unpause);
}

#[test]
fn test_start_requires_setup() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    let err = player.start().unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle {
            operation: "start",
            ..
        }
    ));
    assert!(tap.calls().is_empty());
}

#[test]
fn test_engine_init_failure_skips_everything_else() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine.failing_init(), host);

    let err = player.setup().unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::EngineInit(_))));
    assert_eq!(player.phase(), PlayerPhase::Failed);

    assert!(player.start().is_err());
    assert!(player.shutdown().is_err());
    assert_eq!(tap.calls(), vec!["engine.init 0 2 48000"]);
}

#[test]
fn test_patch_open_failure_never_reaches_device() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine.failing_open(), host);

    let err = player.setup().unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::PatchOpen { .. })));

    assert!(player.start().is_err());
    assert!(tap.calls_matching("host.").is_empty());
    assert!(tap.calls_matching("engine.compute").is_empty());
}

#[test]
fn test_device_open_failure_skips_start_render_and_shutdown() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host.failing_open());

    let err = player.setup().unwrap_err();
    match err {
        Error::Core(CoreError::DeviceOpen(reason)) => assert_eq!(reason, "device busy"),
        other => panic!("unexpected error: {other}"),
    }

    assert!(player.start().is_err());
    assert!(player.shutdown().is_err());

    assert!(tap.fire(TEST_CALLBACK_BYTES).is_none());
    assert_eq!(tap.callbacks_fired(), 0);
    assert!(tap.calls_matching("device.").is_empty());
    assert!(tap.calls_matching("engine.process").is_empty());
    assert!(tap.calls_matching("engine.compute").is_empty());
}

#[test]
fn test_first_working_driver_is_used() {
    let (engine, host, tap) = fixture();
    let host = host
        .with_drivers(&["pulse", "alsa", "jack"])
        .broken_driver("pulse");
    let mut player = test_player(engine, host);

    player.setup().unwrap();

    assert_eq!(
        tap.calls_matching("host.init_driver"),
        vec!["host.init_driver pulse", "host.init_driver alsa"]
    );
}

#[test]
fn test_no_working_driver_reports_platform_error() {
    let (engine, host, tap) = fixture();
    let host = host.with_drivers(&["alsa"]).broken_driver("alsa");
    let mut player = test_player(engine, host);

    match player.setup().unwrap_err() {
        Error::Core(CoreError::DriverInit(reason)) => assert_eq!(reason, "alsa unavailable"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(tap.position("host.open").is_none());
}

#[test]
fn test_shutdown_order_after_playback() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    player.start().unwrap();
    tap.fire(TEST_CALLBACK_BYTES).unwrap();
    player.shutdown().unwrap();

    let calls = tap.calls();
    assert_eq!(tail(&calls, 4), SHUTDOWN_SEQUENCE);
    assert_eq!(player.phase(), PlayerPhase::ShutDown);
}

#[test]
fn test_shutdown_order_without_start() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    player.shutdown().unwrap();

    let calls = tap.calls();
    assert_eq!(tail(&calls, 4), SHUTDOWN_SEQUENCE);
    assert!(tap.position("device.unpause").is_none());
}

#[test]
fn test_shutdown_is_idempotent() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    player.start().unwrap();
    player.shutdown().unwrap();
    let after_first = tap.calls().len();

    player.shutdown().unwrap();
    assert_eq!(tap.calls().len(), after_first);
    // The fake's patch handle is a `String`, so only the bridge keeps it
    // from being closed twice.
    assert_eq!(tap.calls_matching("engine.close"), vec!["engine.close test.pd"]);
}

#[test]
fn test_block_size_query_never_silences_playback() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);
    player.setup().unwrap();
    player.start().unwrap();

    let remote = tap.clone();
    let driver = std::thread::spawn(move || {
        let mut silent = 0;
        for _ in 0..2000 {
            let buffer = remote.fire(TEST_CALLBACK_BYTES).unwrap();
            if buffer[0] == 0.0 {
                silent += 1;
            }
        }
        silent
    });

    while !driver.is_finished() {
        assert_eq!(player.block_size(), TEST_BLOCK_SIZE);
    }

    assert_eq!(driver.join().unwrap(), 0);
    assert_eq!(tap.callbacks_fired(), 2000);
}

#[test]
fn test_no_callback_after_shutdown() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    player.start().unwrap();
    player.shutdown().unwrap();

    assert!(!tap.device_is_open());
    assert!(tap.fire(TEST_CALLBACK_BYTES).is_none());
    assert!(player.device_spec().is_none());
}

#[test]
fn test_setup_twice_is_refused() {
    let (engine, host, tap) = fixture();
    let mut player = test_player(engine, host);

    player.setup().unwrap();
    let calls = tap.calls().len();

    assert!(player.setup().is_err());
    assert_eq!(tap.calls().len(), calls);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let (engine, host, _tap) = fixture();
    let result = PatchPlayerBuilder::new().outputs(0).build(engine, host);
    assert!(matches!(
        result,
        Err(Error::Core(CoreError::InvalidConfig(_)))
    ));
}
