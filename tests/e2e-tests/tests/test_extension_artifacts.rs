//! Test Scenario: Extension artifact materialization
//!
//! Tests that packaged extensions on the search path are installed into
//! the scratch home, surface through the broadened domain, and appear in
//! the instance manifest; and that a missing required extension fails the
//! start before any listener is bound.

use e2e_tests::item_controller;
use embench_common::{HarnessError, SymbolName};
use embench_instance::InstanceConfig;
use embench_scratch::InstanceManifest;
use embench_state::InstanceState;
use embench_testapp::TestAppOptions;
use std::sync::Arc;

#[tokio::test]
async fn test_extensions_materialized_and_resolvable() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("flow-runner.epk"), "flow-runner-descriptor").unwrap();
    std::fs::write(source.path().join("views.epk"), "views-descriptor").unwrap();

    let config = InstanceConfig {
        extension_search_path: vec![source.path().to_path_buf()],
        required_extensions: vec!["flow-runner".to_string(), "views".to_string()],
        ..Default::default()
    };
    let mut controller = item_controller(TestAppOptions::default(), config);
    let handle = controller.start().await.unwrap();

    // Installed under the deterministic name.
    let installed = handle.scratch_path().join("extensions/flow-runner.ext");
    assert!(installed.is_file());
    assert_eq!(
        std::fs::read_to_string(&installed).unwrap(),
        "flow-runner-descriptor"
    );

    // The application reported the extension; its symbol resolves through
    // the broadened domain with the artifact content as its value.
    let resolved = handle
        .broadened_domain()
        .resolve(&SymbolName::from("flow-runner.descriptor"))
        .unwrap();
    assert!(resolved.defined_in.same_domain(handle.broadened_domain()));
    let content: Arc<String> = resolved.value.downcast::<String>().unwrap();
    assert_eq!(content.as_str(), "flow-runner-descriptor");

    let manifest = InstanceManifest::load(handle.scratch_path().join("instance.json"))
        .await
        .unwrap();
    let mut names = manifest.extensions.clone();
    names.sort();
    assert_eq!(names, vec!["flow-runner".to_string(), "views".to_string()]);

    drop(handle);
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_missing_required_extension_fails_start() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("present.epk"), "x").unwrap();

    let config = InstanceConfig {
        extension_search_path: vec![source.path().to_path_buf()],
        required_extensions: vec!["absent".to_string()],
        ..Default::default()
    };
    let mut controller = item_controller(TestAppOptions::default(), config);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, HarnessError::Provisioning { .. }));
    assert!(err.to_string().contains("absent"));
    assert_eq!(controller.state(), InstanceState::Failed);
}

#[tokio::test]
async fn test_resolver_required_for_ready() {
    let options = TestAppOptions {
        expose_extension_resolver: false,
        ..Default::default()
    };
    let mut controller = item_controller(options, InstanceConfig::default());

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, HarnessError::Startup { .. }));
    assert_eq!(controller.state(), InstanceState::Failed);
    assert!(controller.handle().is_none());
}
