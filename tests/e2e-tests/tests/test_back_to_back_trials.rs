//! Test Scenario: Back-to-back trials
//!
//! Tests that consecutive trials on one controller are fully isolated:
//! state created by one trial is invisible to the next, and the listener
//! serves real HTTP in every cycle.

use e2e_tests::{item_controller, CREATE_ITEM_SYMBOL, ITEM};
use embench_app_api::ApplicationInstance;
use embench_common::ItemName;
use embench_instance::InstanceConfig;
use embench_testapp::TestAppOptions;
use embench_trial::{TrialDescriptor, TrialHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn http_ok(port: u16) -> bool {
    let Ok(mut stream) = TcpStream::connect(("127.0.0.1", port)).await else {
        return false;
    };
    if stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.is_err() {
        return false;
    }
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    response.starts_with(b"HTTP/1.1 200")
}

#[tokio::test]
async fn test_trials_are_isolated_across_cycles() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    // No invocation teardown: the created item is left behind on purpose.
    let descriptor = TrialDescriptor::new(CREATE_ITEM_SYMBOL);

    // First trial creates the item and leaves it in place.
    let handle = controller.start().await.unwrap();
    let trial = TrialHandle::load(&descriptor, &handle).unwrap();
    assert!(trial.run_sample().await.is_success());
    assert!(handle
        .app()
        .lookup_item(&ItemName::from(ITEM))
        .await
        .unwrap()
        .is_some());
    drop(trial);
    drop(handle);
    controller.stop().await.unwrap();

    // Second trial starts from a blank instance.
    let handle = controller.start().await.unwrap();
    assert!(handle
        .app()
        .lookup_item(&ItemName::from(ITEM))
        .await
        .unwrap()
        .is_none());
    let trial = TrialHandle::load(&descriptor, &handle).unwrap();
    assert!(trial.run_sample().await.is_success());
    drop(trial);
    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_listener_serves_each_cycle_and_releases_port() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());

    let handle = controller.start().await.unwrap();
    let port = handle.port();
    assert!(http_ok(port).await, "listener not serving in first cycle");
    drop(handle);
    controller.stop().await.unwrap();

    // Port is released once the cycle ends.
    let rebound = tokio::net::TcpListener::bind(("127.0.0.1", port)).await;
    assert!(rebound.is_ok(), "port {} still held after stop", port);
    drop(rebound);

    let handle = controller.start().await.unwrap();
    assert!(http_ok(handle.port()).await, "listener not serving in second cycle");
    drop(handle);
    controller.stop().await.unwrap();
}
