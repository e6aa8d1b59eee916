//! Test Scenario: Repeated start/stop cycles
//!
//! Tests that a controller can run many full lifecycle cycles without
//! leaking scratch directories or ports, and that each cycle serves
//! samples against a fresh instance.

use e2e_tests::{item_controller, CREATE_ITEM_SYMBOL, DELETE_ITEM_SYMBOL};
use embench_instance::InstanceConfig;
use embench_state::InstanceState;
use embench_testapp::TestAppOptions;
use embench_trial::{TrialDescriptor, TrialHandle};
use std::path::PathBuf;

#[tokio::test]
async fn test_start_stop_cycles() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let descriptor =
        TrialDescriptor::new(CREATE_ITEM_SYMBOL).with_invocation_teardown(DELETE_ITEM_SYMBOL);

    let mut scratch_paths: Vec<PathBuf> = Vec::new();

    for cycle in 1..=3 {
        println!("Cycle {}: starting instance...", cycle);
        let handle = controller.start().await.unwrap();
        assert_eq!(controller.state(), InstanceState::Ready);
        assert!(handle.port() > 0);

        let trial = TrialHandle::load(&descriptor, &handle).unwrap();
        trial.setup_trial().await.unwrap();
        for _ in 0..5 {
            let outcome = trial.run_sample().await;
            assert!(outcome.is_success(), "sample failed in cycle {}", cycle);
        }
        trial.teardown_trial().await.unwrap();

        scratch_paths.push(handle.scratch_path().to_path_buf());
        drop(trial);
        drop(handle);

        println!("Cycle {}: stopping instance...", cycle);
        controller.stop().await.unwrap();
        assert_eq!(controller.state(), InstanceState::Terminated);
    }

    // Every cycle got its own scratch home and all were reclaimed.
    assert_eq!(scratch_paths.len(), 3);
    for (i, a) in scratch_paths.iter().enumerate() {
        assert!(!a.exists(), "scratch from cycle {} leaked", i + 1);
        for b in &scratch_paths[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());

    // Stop before any start is a no-op.
    controller.stop().await.unwrap();

    controller.start().await.unwrap();
    controller.stop().await.unwrap();
    controller.stop().await.unwrap();
    assert_eq!(controller.state(), InstanceState::Terminated);
}

#[tokio::test]
async fn test_second_start_fails_fast() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    let err = controller.start().await.unwrap_err();
    assert!(err.to_string().contains("start"));
    // The live instance is untouched.
    assert_eq!(controller.state(), InstanceState::Ready);
    assert!(handle.scratch_path().exists());

    controller.stop().await.unwrap();
}
