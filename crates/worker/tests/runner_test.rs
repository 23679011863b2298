mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{controller, is_failed, text, wait_for, FakeBackend, FakeFactory, Plan, Probe, Step};
use portal_core::{StopOutcome, WorkerStatus};
use portal_worker::FALLBACK_REPLY;

#[tokio::test(start_paused = true)]
async fn test_messages_are_relayed_in_order() {
    let factory = FakeFactory::new(Plan {
        steps: vec![Step::Messages(vec![
            text(1, 10, "first"),
            text(2, 11, "second"),
        ])],
        ..Plan::default()
    });
    let controller = controller(factory.clone(), Some(FakeBackend::answering()));

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), |s| {
        s.messages_handled == 2
    })
    .await;
    assert_eq!(snapshot.messages_handled, 2);

    assert_eq!(
        factory.probe.sent(),
        vec![
            (10, "reply to first".to_string()),
            (11, "reply to second".to_string())
        ]
    );
    controller.stop(Duration::from_secs(15)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_command_is_answered_without_backend() {
    let factory = FakeFactory::new(Plan {
        steps: vec![Step::Messages(vec![text(1, 3, "/start"), text(2, 3, "hi")])],
        ..Plan::default()
    });
    let controller = controller(factory.clone(), None);

    controller.start().await.unwrap();
    wait_for(&controller, Duration::from_secs(5), |s| s.messages_handled == 2).await;

    let sent = factory.probe.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Hello Tester!"));
}

#[tokio::test(start_paused = true)]
async fn test_fatal_receive_error_fails_without_stop() {
    let factory = FakeFactory::new(Plan {
        steps: vec![
            Step::Messages(vec![text(1, 10, "hello")]),
            Step::Fatal("getUpdates returned HTTP 401 Unauthorized".into()),
        ],
        ..Plan::default()
    });
    let controller = controller(factory.clone(), Some(FakeBackend::answering()));

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), is_failed).await;

    assert!(is_failed(&snapshot));
    let last_error = snapshot.last_error.unwrap();
    assert!(!last_error.is_empty());
    assert!(last_error.contains("HTTP 401"));
    assert_eq!(snapshot.messages_handled, 1);
    assert!(!controller.shutdown_requested());
    assert_eq!(factory.probe.sent(), vec![(10, "reply to hello".to_string())]);
    assert_eq!(Probe::count(&factory.probe.stop_receiving), 1);

    let outcome = controller.stop(Duration::from_secs(15)).await.unwrap();
    assert_eq!(outcome, StopOutcome::NotRunning);
    assert!(!controller.is_alive().await);

    factory.set_plan(Plan::default());
    controller.start().await.unwrap();
    let snapshot = controller.status();
    assert_eq!(snapshot.status, WorkerStatus::Running);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried() {
    let factory = FakeFactory::new(Plan {
        steps: vec![
            Step::Retryable("connection reset".into()),
            Step::Retryable("HTTP 502".into()),
            Step::Messages(vec![text(1, 20, "again")]),
        ],
        ..Plan::default()
    });
    let controller = controller(factory.clone(), Some(FakeBackend::answering()));

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), |s| {
        s.messages_handled == 1
    })
    .await;

    assert_eq!(snapshot.status, WorkerStatus::Running);
    assert_eq!(factory.probe.sent(), vec![(20, "reply to again".to_string())]);
    assert!(Probe::count(&factory.probe.receives) >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_transient_errors_fail_the_worker() {
    let factory = FakeFactory::new(Plan {
        steps: vec![
            Step::Retryable("timeout".into()),
            Step::Retryable("timeout".into()),
            Step::Retryable("timeout".into()),
        ],
        ..Plan::default()
    });
    let controller = controller(factory.clone(), None);

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), is_failed).await;

    assert!(is_failed(&snapshot));
    assert!(snapshot.last_error.unwrap().contains("timeout"));
    assert_eq!(Probe::count(&factory.probe.receives), 3);
}

#[tokio::test(start_paused = true)]
async fn test_backend_failure_replies_with_fallback_and_keeps_serving() {
    let factory = FakeFactory::new(Plan {
        steps: vec![
            Step::Messages(vec![text(1, 5, "q1")]),
            Step::Messages(vec![text(2, 5, "q2")]),
        ],
        ..Plan::default()
    });
    let backend = FakeBackend::failing();
    let controller = controller(factory.clone(), Some(backend.clone()));

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), |s| {
        s.messages_handled == 2
    })
    .await;

    assert_eq!(snapshot.status, WorkerStatus::Running);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        factory.probe.sent(),
        vec![
            (5, FALLBACK_REPLY.to_string()),
            (5, FALLBACK_REPLY.to_string())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_send_failures_do_not_end_the_loop() {
    let factory = FakeFactory::new(Plan {
        steps: vec![Step::Messages(vec![text(1, 9, "a"), text(2, 9, "b")])],
        send_fails: true,
        ..Plan::default()
    });
    let controller = controller(factory.clone(), Some(FakeBackend::answering()));

    controller.start().await.unwrap();
    let snapshot = wait_for(&controller, Duration::from_secs(5), |s| {
        s.messages_handled == 2
    })
    .await;

    assert_eq!(snapshot.messages_handled, 2);
    assert_eq!(snapshot.status, WorkerStatus::Running);
    assert!(factory.probe.sent().is_empty());

    let outcome = controller.stop(Duration::from_secs(15)).await.unwrap();
    assert_eq!(outcome, StopOutcome::Stopped { teardown_failures: 0 });
}
