//! Test Scenario: Named item lifecycle
//!
//! Tests item create/lookup/delete through a live instance, including
//! the idempotent-delete guarantee workload teardowns rely on.

use e2e_tests::{item_controller, CREATE_ITEM_SYMBOL, DELETE_ITEM_SYMBOL, ITEM};
use embench_app_api::ApplicationInstance;
use embench_common::ItemName;
use embench_instance::InstanceConfig;
use embench_testapp::TestAppOptions;
use embench_trial::{wait_until_quiet, TrialDescriptor, TrialHandle};
use std::time::Duration;

#[tokio::test]
async fn test_item_create_lookup_delete() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();
    let app = handle.app();
    let name = ItemName::from(ITEM);

    assert!(app.lookup_item(&name).await.unwrap().is_none());

    app.create_item(&name).await.unwrap();
    assert!(app.lookup_item(&name).await.unwrap().is_some());

    // Creating a duplicate is an application error, not a panic.
    assert!(app.create_item(&name).await.is_err());

    app.delete_item(&name).await.unwrap();
    assert!(app.lookup_item(&name).await.unwrap().is_none());

    // Idempotent: deleting the absent item succeeds.
    app.delete_item(&name).await.unwrap();

    drop(app);
    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_item_samples_wait_for_background_work() {
    let options = TestAppOptions {
        work_duration: Duration::from_millis(200),
        ..Default::default()
    };
    let mut controller = item_controller(options, InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    let descriptor =
        TrialDescriptor::new(CREATE_ITEM_SYMBOL).with_invocation_teardown(DELETE_ITEM_SYMBOL);
    let trial = TrialHandle::load(&descriptor, &handle).unwrap();

    let outcome = trial.run_sample().await;
    assert!(outcome.is_success());

    // The created item queued background work; drain it before teardown.
    let app = handle.app();
    assert!(app.has_pending_work());
    wait_until_quiet(&app, Duration::from_millis(10)).await;
    assert!(!app.has_pending_work());

    drop(app);
    drop(trial);
    drop(handle);
    controller.stop().await.unwrap();
}
