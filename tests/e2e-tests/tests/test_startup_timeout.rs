//! Test Scenario: Initialization timeout
//!
//! Tests that an application whose init outlasts the configured bound is
//! shut down in an orderly way, the start fails with a startup error, and
//! the scratch environment does not leak.

use e2e_tests::item_controller;
use embench_common::HarnessError;
use embench_instance::InstanceConfig;
use embench_state::InstanceState;
use embench_testapp::TestAppOptions;
use std::time::Duration;

#[tokio::test]
async fn test_slow_init_times_out() {
    let options = TestAppOptions {
        init_delay: Duration::from_secs(10),
        ..Default::default()
    };
    let config = InstanceConfig {
        init_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut controller = item_controller(options, config);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, HarnessError::Startup { .. }));
    assert_eq!(controller.state(), InstanceState::Failed);
    assert!(controller.handle().is_none());
}

#[tokio::test]
async fn test_timed_out_start_reclaims_scratch() {
    let base = tempfile::tempdir().unwrap();
    let scratch = base.path().join("slow-home");

    let options = TestAppOptions {
        init_delay: Duration::from_secs(10),
        ..Default::default()
    };
    let config = InstanceConfig {
        scratch_path: Some(scratch.clone()),
        init_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut controller = item_controller(options, config);

    controller.start().await.unwrap_err();
    assert!(!scratch.exists(), "scratch leaked after timed-out start");
}

#[tokio::test]
async fn test_timed_out_start_releases_port() {
    // Find a free port, then hand it to the controller explicitly so we
    // can prove the listener is gone after the failed start.
    let reserved = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = reserved.local_addr().unwrap().port();
    drop(reserved);

    let options = TestAppOptions {
        init_delay: Duration::from_secs(10),
        ..Default::default()
    };
    let config = InstanceConfig {
        port: Some(port),
        init_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut controller = item_controller(options, config);

    controller.start().await.unwrap_err();
    tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("port still bound after timed-out start");
}

#[tokio::test]
async fn test_no_ready_signal_proceeds_optimistically() {
    // An application without a readiness signal must not hit the timeout
    // even when its internal init is still running.
    let options = TestAppOptions {
        init_delay: Duration::from_secs(10),
        expose_ready_signal: false,
        ..Default::default()
    };
    let config = InstanceConfig {
        init_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut controller = item_controller(options, config);

    let handle = controller.start().await.unwrap();
    assert_eq!(controller.state(), InstanceState::Ready);
    drop(handle);
    controller.stop().await.unwrap();
}
