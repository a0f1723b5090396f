mod common;

use common::{historical, resolve_after, run_config, run_result, session, MockApi};
use std::sync::Arc;
use std::time::Duration;

use loadaudit_console::charts::ChartChannel;
use loadaudit_console::error::ConsoleError;
use loadaudit_console::lifecycle::{self, LifecycleState};
use loadaudit_console::notifications::NotificationKind;
use loadaudit_console::state::ConsoleEvent;
use loadaudit_console::telemetry::SyntheticTelemetry;

#[tokio::test(start_paused = true)]
async fn test_five_second_run_emits_five_ticks() {
    let api = Arc::new(MockApi::default());
    let tx = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(10, 5)).await.unwrap();
    resolve_after(tx, Duration::from_secs(10), Ok(run_result(0.4, 0.01, 25.0, 90)));

    assert_eq!(handle.generator.await.unwrap(), 5);
    assert_eq!(session.charts.read().await.lengths(), vec![5; 5]);

    let users = session.charts.read().await.values(ChartChannel::ActiveUsers, 0);
    assert!(users.iter().all(|u| (8.0..=10.0).contains(u)));

    let errors = session.charts.read().await.values(ChartChannel::ErrorRate, 0);
    assert!(errors.iter().all(|e| (0.0..3.0).contains(e)));

    {
        let display = session.display.read().await;
        let last = display.last_frame.as_ref().unwrap();
        assert_eq!(last.tick, 5);
        assert_eq!(last.progress_pct, 100.0);
    }

    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);
    assert_eq!(api.start_calls.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_while_running_is_rejected_without_side_effects() {
    let api = Arc::new(MockApi::default());
    // Nothing queued: the remote call never resolves.
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(10, 3)).await.unwrap();
    assert_eq!(handle.generator.await.unwrap(), 3);

    let before = session.lifecycle.read().await.snapshot();
    assert_eq!(before.state, LifecycleState::Running);
    assert!(!before.generator_running);

    let err = lifecycle::submit(&session, run_config(50, 10)).await.err().unwrap();
    assert!(matches!(err, ConsoleError::AlreadyRunning));

    let after = session.lifecycle.read().await.snapshot();
    assert_eq!(after.run_seq, before.run_seq);
    assert_eq!(after.ticks_emitted, 3);
    assert_eq!(session.charts.read().await.lengths(), vec![3; 5]);
    assert_eq!(api.start_calls.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_sets_summary_and_refreshes_catalog() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![historical("abc123", 0.4, 0.01, 25.0, 90)]));
    let tx = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(5, 2)).await.unwrap();
    resolve_after(tx, Duration::from_secs(3), Ok(run_result(0.4, 0.012, 25.0, 90)));

    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);
    {
        let display = session.display.read().await;
        let summary = display.summary.as_ref().unwrap();
        assert_eq!(summary.avg_latency, "0.400");
        assert_eq!(summary.error_rate, "1.2%");
        assert_eq!(summary.health_score, 90);
        assert!(!display.monitoring_visible);
    }

    let history = session.notifications.history().await;
    assert!(history
        .iter()
        .any(|n| n.kind == NotificationKind::Success && n.message == "Test completed successfully"));

    // The refresh waits for the backend to persist the run.
    assert!(!session.catalog.read().await.is_loaded());
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let catalog = session.catalog.read().await;
    assert!(catalog.is_loaded());
    assert!(catalog.find_by_id("abc123").is_ok());
    assert_eq!(*api.list_calls.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_previous_summary() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let first = api.expect_start();
    let second = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(5, 1)).await.unwrap();
    resolve_after(first, Duration::from_secs(2), Ok(run_result(0.25, 0.0, 40.0, 95)));
    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);

    let handle = lifecycle::submit(&session, run_config(5, 5)).await.unwrap();
    resolve_after(
        second,
        Duration::from_millis(500),
        Err(ConsoleError::ServerError {
            status: 500,
            body: "boom".to_string(),
        }),
    );
    assert_eq!(handle.request.await.unwrap(), LifecycleState::Failed);

    let lc = session.lifecycle.read().await.snapshot();
    assert_eq!(lc.state, LifecycleState::Failed);
    assert!(lc.can_submit);
    assert_eq!(
        lc.last_error.as_deref(),
        Some("HTTP error! status: 500 - boom")
    );

    let display = session.display.read().await;
    assert_eq!(display.summary.as_ref().unwrap().avg_latency, "0.250");

    let history = session.notifications.history().await;
    assert_eq!(
        history.last().map(|n| (n.kind, n.message.as_str())),
        Some((NotificationKind::Error, "Test failed: HTTP error! status: 500 - boom"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_early_result_stops_the_generator() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let tx = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(10, 30)).await.unwrap();
    resolve_after(tx, Duration::from_millis(2500), Ok(run_result(0.3, 0.0, 30.0, 88)));

    assert_eq!(handle.generator.await.unwrap(), 2);
    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.charts.read().await.lengths(), vec![2; 5]);
    assert!(!session.lifecycle.read().await.generator_running);
}

#[tokio::test(start_paused = true)]
async fn test_resubmit_clears_series_before_first_tick() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let first = api.expect_start();
    let second = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(10, 4)).await.unwrap();
    resolve_after(first, Duration::from_secs(6), Ok(run_result(0.3, 0.0, 30.0, 88)));
    assert_eq!(handle.generator.await.unwrap(), 4);
    handle.request.await.unwrap();

    let handle = lifecycle::submit_with(
        &session,
        run_config(20, 3),
        SyntheticTelemetry::seeded(7, 20, 3),
    )
    .await
    .unwrap();
    assert_eq!(handle.run_seq, 2);
    assert_eq!(session.charts.read().await.lengths(), vec![0; 5]);

    resolve_after(second, Duration::from_secs(10), Ok(run_result(0.3, 0.0, 30.0, 88)));
    assert_eq!(handle.generator.await.unwrap(), 3);
    assert_eq!(session.charts.read().await.lengths(), vec![3; 5]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_monitoring_halts_ticks_but_result_still_applies() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let tx = api.expect_start();
    let session = session(api.clone());

    let handle = lifecycle::submit(&session, run_config(10, 10)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(lifecycle::stop_monitoring(&session).await);
    assert_eq!(handle.generator.await.unwrap(), 1);
    assert!(!lifecycle::stop_monitoring(&session).await);

    let _ = tx.send(Ok(run_result(0.3, 0.0, 30.0, 88)));
    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_stop_at_tick_deadline_emits_no_extra_frame() {
    let api = Arc::new(MockApi::default());
    let session = session(api);

    let handle = lifecycle::submit(&session, run_config(10, 10)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(session.lifecycle.read().await.ticks_emitted, 1);

    // Stop, then move the clock past the next tick before the generator
    // gets to run: both branches are ready when it wakes.
    assert!(lifecycle::stop_monitoring(&session).await);
    tokio::time::advance(Duration::from_millis(1000)).await;

    assert_eq!(handle.generator.await.unwrap(), 1);
    assert_eq!(session.lifecycle.read().await.ticks_emitted, 1);
    assert_eq!(session.charts.read().await.lengths(), vec![1; 5]);
}

#[tokio::test(start_paused = true)]
async fn test_tick_events_are_published_per_frame() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let tx = api.expect_start();
    let session = session(api);
    let mut events = session.events_tx.subscribe();

    let handle = lifecycle::submit(&session, run_config(10, 4)).await.unwrap();
    resolve_after(tx, Duration::from_secs(6), Ok(run_result(0.3, 0.0, 30.0, 88)));
    assert_eq!(handle.generator.await.unwrap(), 4);
    assert_eq!(handle.request.await.unwrap(), LifecycleState::Complete);

    let mut frames = Vec::new();
    let mut lifecycle_states = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            ConsoleEvent::Tick(frame) => frames.push(frame),
            ConsoleEvent::Lifecycle(snapshot) => lifecycle_states.push(snapshot.state),
        }
    }

    assert_eq!(frames.iter().map(|f| f.tick).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(
        frames.iter().map(|f| f.progress_pct).collect::<Vec<_>>(),
        vec![25.0, 50.0, 75.0, 100.0]
    );
    for frame in &frames {
        assert!(frame.latency_ms >= 0.0);
        assert!((0.0..3.0).contains(&frame.error_rate_pct));
        assert!((8..=10).contains(&frame.active_users));
        assert_eq!(frame.duration, 4);
    }
    assert_eq!(
        frames.last().unwrap().status_text,
        "Testing in progress... (4/4s)"
    );

    assert_eq!(
        lifecycle_states,
        vec![LifecycleState::Running, LifecycleState::Complete]
    );
}

#[tokio::test]
async fn test_empty_catalog_lookup_is_not_found() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![]));
    let session = session(api);

    let table = lifecycle::refresh_catalog(&session).await.unwrap();
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        serde_json::json!({"state": "empty", "message": "No past runs found"})
    );

    let catalog = session.catalog.read().await;
    assert!(catalog.is_loaded());
    assert!(matches!(
        catalog.find_by_id("abc123"),
        Err(ConsoleError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_refresh_keeps_old_rows() {
    let api = Arc::new(MockApi::default());
    api.set_runs(Some(vec![historical("abc123", 0.4, 0.01, 25.0, 90)]));
    let session = session(api.clone());
    lifecycle::refresh_catalog(&session).await.unwrap();

    api.set_runs(None);
    assert!(lifecycle::refresh_catalog(&session).await.is_err());
    assert!(session.catalog.read().await.find_by_id("abc123").is_ok());

    let history = session.notifications.history().await;
    assert_eq!(history.last().unwrap().kind, NotificationKind::Warning);
}
