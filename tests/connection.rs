mod common;

use bmsview::{
    AdapterAction, AdapterEvent, ConnectionController, ConnectionOutcome, LinkParams, Notification, Peripheral,
    PowerPrompt, PromptResponse,
};
use common::{MockBackend, RecordingNotifier};

fn accepting(ids: &[&'static str]) -> MockBackend {
    MockBackend { accepting: ids.to_vec(), ..MockBackend::default() }
}

fn is_connected(n: &Notification) -> bool {
    matches!(n, Notification::Connected { .. })
}

fn is_failed(n: &Notification) -> bool {
    matches!(n, Notification::ConnectionFailed)
}

#[tokio::test]
async fn test_successful_connect_notifies_once_and_keeps_handle() {
    let backend = accepting(&["B"]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);
    let b = Peripheral::new("B").with_name("BT_HC6172");

    let outcome = connection.connect(&b).await;

    assert!(matches!(outcome, ConnectionOutcome::Connected(ref h) if h == "handle-B"));
    assert_eq!(notifier.count(is_connected), 1);
    assert_eq!(notifier.count(is_failed), 0);
    assert_eq!(
        notifier.notifications.borrow().last(),
        Some(&Notification::Connected { name: "BT_HC6172".to_string() })
    );
    assert_eq!(connection.connected(), Some(&b));
    assert_eq!(connection.handle().map(String::as_str), Some("handle-B"));
}

#[tokio::test]
async fn test_rejected_connect_notifies_generic_failure_and_retains_nothing() {
    let backend = accepting(&[]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    let outcome = connection.connect(&Peripheral::new("B")).await;

    match outcome {
        ConnectionOutcome::Failed(err) => assert_eq!(err.id.as_str(), "B"),
        ConnectionOutcome::Connected(_) => panic!("expected failure"),
    }
    assert_eq!(notifier.count(is_failed), 1);
    assert_eq!(notifier.count(is_connected), 0);
    assert!(connection.connected().is_none());
    assert!(connection.handle().is_none());
}

#[tokio::test]
async fn test_each_attempt_is_made_once_with_fixed_params() {
    let backend = accepting(&[]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.connect(&Peripheral::new("A")).await;
    connection.connect(&Peripheral::new("A")).await;

    let connects = backend.connects.borrow();
    assert_eq!(connects.len(), 2);
    assert!(connects.iter().all(|(_, p)| *p == LinkParams { auto_connect: false, requested_mtu: 512 }));
    assert_eq!(notifier.count(is_failed), 2);
}

#[tokio::test]
async fn test_failed_attempt_leaves_existing_connection() {
    let backend = accepting(&["A"]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);
    let a = Peripheral::new("A");

    connection.connect(&a).await;
    let outcome = connection.connect(&Peripheral::new("B")).await;

    assert!(!outcome.is_connected());
    assert_eq!(connection.connected(), Some(&a));
    assert!(backend.disconnects.borrow().is_empty());
}

#[tokio::test]
async fn test_connecting_elsewhere_releases_previous_link() {
    let backend = accepting(&["A", "B"]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.connect(&Peripheral::new("A")).await;
    connection.connect(&Peripheral::new("B")).await;

    assert_eq!(*backend.disconnects.borrow(), ["handle-A"]);
    assert_eq!(connection.handle().map(String::as_str), Some("handle-B"));

    connection.disconnect().await.unwrap();
    assert_eq!(*backend.disconnects.borrow(), ["handle-A", "handle-B"]);
}

#[tokio::test]
async fn test_reconnecting_same_peripheral_keeps_link() {
    let backend = accepting(&["A"]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.connect(&Peripheral::new("A")).await;
    connection.connect(&Peripheral::new("A")).await;

    assert!(backend.disconnects.borrow().is_empty());
    assert_eq!(notifier.count(is_connected), 2);
}

#[tokio::test]
async fn test_disconnect_releases_handle() {
    let backend = accepting(&["A"]);
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.connect(&Peripheral::new("A")).await;
    connection.disconnect().await.unwrap();
    connection.disconnect().await.unwrap();

    assert!(connection.connected().is_none());
    assert_eq!(*backend.disconnects.borrow(), ["handle-A"]);
    assert_eq!(notifier.count(|n| matches!(n, Notification::Disconnected { .. })), 1);
}

#[tokio::test]
async fn test_power_off_prompts_only_once() {
    let backend = MockBackend::default();
    let notifier = RecordingNotifier::new(PromptResponse::Enable);
    let mut connection = ConnectionController::new(&backend, &notifier);

    assert_eq!(connection.on_adapter_event(AdapterEvent::PoweredOff).await, AdapterAction::Nothing);
    assert_eq!(connection.on_adapter_event(AdapterEvent::PoweredOff).await, AdapterAction::Nothing);

    assert_eq!(notifier.prompts.get(), 1);
    assert_eq!(backend.enables.get(), 1);
    assert_eq!(connection.prompt_state(), PowerPrompt::Prompted);
}

#[tokio::test]
async fn test_power_on_rearms_prompt_and_requests_scan() {
    let backend = MockBackend::default();
    let notifier = RecordingNotifier::new(PromptResponse::Enable);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.on_adapter_event(AdapterEvent::PoweredOff).await;
    assert_eq!(connection.on_adapter_event(AdapterEvent::PoweredOn).await, AdapterAction::StartScan);
    assert_eq!(connection.prompt_state(), PowerPrompt::NotPrompted);
    connection.on_adapter_event(AdapterEvent::PoweredOff).await;

    assert_eq!(notifier.prompts.get(), 2);
}

#[tokio::test]
async fn test_dismissed_prompt_does_not_enable() {
    let backend = MockBackend::default();
    let notifier = RecordingNotifier::new(PromptResponse::Dismiss);
    let mut connection = ConnectionController::new(&backend, &notifier);

    connection.on_adapter_event(AdapterEvent::PoweredOff).await;

    assert_eq!(notifier.prompts.get(), 1);
    assert_eq!(backend.enables.get(), 0);
}

#[tokio::test]
async fn test_other_adapter_states_are_ignored() {
    let backend = MockBackend::default();
    let notifier = RecordingNotifier::new(PromptResponse::Enable);
    let mut connection = ConnectionController::new(&backend, &notifier);

    assert_eq!(connection.on_adapter_event(AdapterEvent::Other).await, AdapterAction::Nothing);
    assert_eq!(notifier.prompts.get(), 0);
    assert_eq!(connection.prompt_state(), PowerPrompt::NotPrompted);
}
