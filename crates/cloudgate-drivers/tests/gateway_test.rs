//! End-to-end runs of the dispatcher against replayed backend profiles

use cloudgate_core::{
    ActionDispatcher, ActionRequest, BackendError, CanonicalState, ConvergenceConfig,
    CreateRequest, ErrorCategory, ResourceKind, SideEffect,
};
use cloudgate_drivers::{MockBackend, profile};
use std::sync::Arc;
use std::time::Duration;

fn gateway(backends: &[Arc<MockBackend>]) -> ActionDispatcher {
    let mut builder = ActionDispatcher::builder();
    let mut router = cloudgate_drivers::LookupRouter::new();
    for backend in backends {
        builder = builder.backend(backend.clone()).unwrap();
        router = router.route(backend.profile().id(), backend.clone());
    }
    builder
        .lookup(Arc::new(router))
        .convergence(ConvergenceConfig::new(5, Duration::from_secs(2)))
        .backend_timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_mock_instance_lifecycle() {
    let mock = Arc::new(MockBackend::new(profile("mock").unwrap()));
    let dispatcher = gateway(&[mock.clone()]);

    let provisioning = dispatcher
        .create(CreateRequest::new("mock", ResourceKind::Instance))
        .await;
    assert!(provisioning.result.success);
    let id = provisioning.result.resource_id.clone().unwrap();
    let outcome = provisioning.convergence.unwrap().await.unwrap();
    assert!(outcome.is_converged());

    let start = dispatcher
        .dispatch(ActionRequest::new("mock", ResourceKind::Instance, &id, "start"))
        .await;
    assert_eq!(start.new_state, Some(CanonicalState::Running));

    let stop = dispatcher
        .dispatch(ActionRequest::new("mock", ResourceKind::Instance, &id, "stop"))
        .await;
    assert_eq!(stop.new_state, Some(CanonicalState::Stopping));

    // the lookup that observes "stopping" moves the backend on
    let state = dispatcher
        .current_state("mock", ResourceKind::Instance, &id)
        .await
        .unwrap();
    assert_eq!(state, Some(CanonicalState::Stopping));
    let state = dispatcher
        .current_state("mock", ResourceKind::Instance, &id)
        .await
        .unwrap();
    assert_eq!(state, Some(CanonicalState::Stopped));

    let destroy = dispatcher
        .dispatch(ActionRequest::new("mock", ResourceKind::Instance, &id, "destroy"))
        .await;
    assert_eq!(destroy.new_state, Some(CanonicalState::Finish));
}

#[tokio::test]
async fn test_paci_has_no_reboot() {
    let paci = Arc::new(MockBackend::new(profile("paci").unwrap()));
    paci.insert(ResourceKind::Instance, "ve-1", "STARTED");
    let dispatcher = gateway(&[paci.clone()]);

    let result = dispatcher
        .dispatch(ActionRequest::new("paci", ResourceKind::Instance, "ve-1", "reboot"))
        .await;

    assert_eq!(result.category(), Some(ErrorCategory::NotSupported));
    assert_eq!(result.status_hint, 501);
}

#[tokio::test]
async fn test_vcloud_destroy_finishes_once() {
    let vcloud = Arc::new(MockBackend::new(profile("vcloud").unwrap()));
    vcloud.insert(ResourceKind::Instance, "vm-1", "8");
    let dispatcher = gateway(&[vcloud.clone()]);

    let first = dispatcher
        .dispatch(ActionRequest::new("vcloud", ResourceKind::Instance, "vm-1", "destroy"))
        .await;
    assert!(first.success);
    assert_eq!(first.new_state, Some(CanonicalState::Finish));

    let second = dispatcher
        .dispatch(ActionRequest::new("vcloud", ResourceKind::Instance, "vm-1", "destroy"))
        .await;
    assert!(!second.success);
    assert_eq!(second.category(), Some(ErrorCategory::IllegalTransition));
}

#[tokio::test]
async fn test_paci_stop_reports_in_progress() {
    let paci = Arc::new(MockBackend::new(profile("paci").unwrap()));
    paci.insert(ResourceKind::Instance, "ve-1", "STARTED");
    let dispatcher = gateway(&[paci.clone()]);

    let result = dispatcher
        .dispatch(ActionRequest::new("paci", ResourceKind::Instance, "ve-1", "stop"))
        .await;

    assert!(result.success);
    assert_eq!(result.new_state, Some(CanonicalState::Stopping));
    assert_eq!(
        paci.raw_status(ResourceKind::Instance, "ve-1").as_deref(),
        Some("STOP_IN_PROGRESS")
    );
}

#[tokio::test]
async fn test_same_id_on_two_backends() {
    let mock = Arc::new(MockBackend::new(profile("mock").unwrap()));
    let vcloud = Arc::new(MockBackend::new(profile("vcloud").unwrap()));
    mock.insert(ResourceKind::Instance, "vm-1", "running");
    vcloud.insert(ResourceKind::Instance, "vm-1", "POWERED_OFF");
    let dispatcher = gateway(&[mock.clone(), vcloud.clone()]);

    let on_mock = dispatcher
        .dispatch(ActionRequest::new("mock", ResourceKind::Instance, "vm-1", "start"))
        .await;
    assert_eq!(on_mock.category(), Some(ErrorCategory::IllegalTransition));

    let on_vcloud = dispatcher
        .dispatch(ActionRequest::new("vcloud", ResourceKind::Instance, "vm-1", "start"))
        .await;
    assert!(on_vcloud.success);
    assert_eq!(on_vcloud.new_state, Some(CanonicalState::Running));
}

#[tokio::test]
async fn test_unparseable_response_counts_as_applied() {
    let vcloud = Arc::new(MockBackend::new(profile("vcloud").unwrap()));
    vcloud.insert(ResourceKind::Instance, "vm-1", "4");
    vcloud.fail_next(
        "reboot_instance",
        BackendError::ResponseParse("unexpected end of XML".to_string()),
    );
    let dispatcher = gateway(&[vcloud.clone()]);

    let result = dispatcher
        .dispatch(ActionRequest::new("vcloud", ResourceKind::Instance, "vm-1", "reboot"))
        .await;

    assert_eq!(result.category(), Some(ErrorCategory::BackendFailure));
    assert_eq!(result.side_effect(), Some(SideEffect::Applied));
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out() {
    let slow = Arc::new(
        MockBackend::new(profile("mock").unwrap()).with_latency(Duration::from_secs(30)),
    );
    slow.insert(ResourceKind::Network, "net-1", "stopped");
    let dispatcher = gateway(&[slow.clone()]);

    let result = dispatcher
        .dispatch(ActionRequest::new("mock", ResourceKind::Network, "net-1", "start"))
        .await;

    assert_eq!(result.category(), Some(ErrorCategory::Timeout));
    assert_eq!(result.status_hint, 504);
}

#[tokio::test(start_paused = true)]
async fn test_load_balancer_converges_to_running() {
    let mock = Arc::new(MockBackend::new(profile("mock").unwrap()));
    let dispatcher = gateway(&[mock.clone()]);

    let provisioning = dispatcher
        .create(CreateRequest::new("mock", ResourceKind::LoadBalancer))
        .await;
    let id = provisioning.result.resource_id.clone().unwrap();
    provisioning.convergence.unwrap().await.unwrap();

    let actions = dispatcher
        .available_actions("mock", ResourceKind::LoadBalancer, &id)
        .await
        .unwrap();
    assert_eq!(actions, vec!["destroy", "register", "unregister"]);
}
