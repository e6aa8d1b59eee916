//! Test Scenario: Home directory equals scratch
//!
//! Tests that the application's home directory is the provisioned scratch
//! directory, that the instance manifest is written there at READY, and
//! that a retained scratch survives the stop for post-mortem inspection.

use e2e_tests::item_controller;
use embench_common::SymbolName;
use embench_instance::InstanceConfig;
use embench_scratch::InstanceManifest;
use embench_testapp::{TestAppOptions, HOME_SYMBOL};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::test]
async fn test_home_is_scratch() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    // The application published its home dir into the web-container
    // domain; it must be the scratch path the controller provisioned.
    let resolved = handle
        .broadened_domain()
        .resolve(&SymbolName::from(HOME_SYMBOL))
        .unwrap();
    let home: Arc<PathBuf> = resolved.value.downcast::<PathBuf>().unwrap();
    assert_eq!(home.as_path(), handle.scratch_path());

    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_manifest_written_at_ready() {
    let mut controller = item_controller(TestAppOptions::default(), InstanceConfig::default());
    let handle = controller.start().await.unwrap();

    let manifest = InstanceManifest::load(handle.scratch_path().join("instance.json"))
        .await
        .unwrap();
    assert_eq!(manifest.port, handle.port());
    assert_eq!(manifest.scratch_path, handle.scratch_path().display().to_string());
    assert!(manifest.extensions.is_empty());

    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_retained_scratch_survives_stop() {
    let base = tempfile::tempdir().unwrap();
    let scratch = base.path().join("retained-home");
    let config = InstanceConfig {
        scratch_path: Some(scratch.clone()),
        retain_scratch: true,
        ..Default::default()
    };
    let mut controller = item_controller(TestAppOptions::default(), config);

    let handle = controller.start().await.unwrap();
    assert_eq!(handle.scratch_path(), scratch.as_path());
    drop(handle);
    controller.stop().await.unwrap();

    // Retained for inspection, manifest included.
    assert!(scratch.join("instance.json").is_file());
    assert!(scratch.join("extensions").is_dir());
}
