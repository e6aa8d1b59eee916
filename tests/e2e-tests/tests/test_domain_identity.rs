//! Test Scenario: Trial-domain identity
//!
//! Tests that workload symbols resolve to definitions in the trial
//! domain itself, and that every start cycle rebuilds the domain graph
//! from scratch.

use e2e_tests::{item_controller, CREATE_ITEM_SYMBOL};
use embench_common::SymbolName;
use embench_instance::InstanceConfig;
use embench_testapp::TestAppOptions;
use embench_trial::{TrialDescriptor, TrialHandle};

#[tokio::test]
async fn test_workload_defined_in_trial_domain() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    let trial_domain = handle.trial_domain();
    let resolved = trial_domain
        .resolve(&SymbolName::from(CREATE_ITEM_SYMBOL))
        .unwrap();
    // The ambient definition was re-bound into the trial domain.
    assert!(resolved.defined_in.same_domain(trial_domain));

    // Loading therefore succeeds.
    TrialHandle::load(&TrialDescriptor::new(CREATE_ITEM_SYMBOL), &handle).unwrap();

    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_each_cycle_gets_fresh_domains() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());

    let first = controller.start().await.unwrap();
    let first_trial = first.trial_domain().id();
    let first_broadened = first.broadened_domain().id();
    drop(first);
    controller.stop().await.unwrap();

    let second = controller.start().await.unwrap();
    assert_ne!(second.trial_domain().id(), first_trial);
    assert_ne!(second.broadened_domain().id(), first_broadened);
    drop(second);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_unregistered_workload_is_not_found() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    let err =
        TrialHandle::load(&TrialDescriptor::new("embench.measure.unknown"), &handle).unwrap_err();
    assert!(err.to_string().contains("embench.measure.unknown"));

    drop(handle);
    controller.stop().await.unwrap();
}
