use super::*;
use crate::test_support::{reading, ScriptedGateway};

const INTERVAL: Duration = Duration::from_millis(5000);

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn fetches_immediately_then_once_per_interval() {
    let gateway = Arc::new(ScriptedGateway::default());
    let poller = SensorPoller::start(gateway.clone(), INTERVAL);

    sleep_ms(1).await;
    assert_eq!(gateway.fetch_calls(), 1);

    sleep_ms(4998).await;
    assert_eq!(gateway.fetch_calls(), 1);

    sleep_ms(2).await;
    assert_eq!(gateway.fetch_calls(), 2);

    sleep_ms(10_000).await;
    assert_eq!(gateway.fetch_calls(), 4);

    drop(poller);
    sleep_ms(30_000).await;
    assert_eq!(gateway.fetch_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn first_success_clears_loading_and_replaces_snapshot() {
    let gateway = Arc::new(ScriptedGateway::with_snapshots([
        (Duration::from_millis(200), Ok(reading(37.5))),
        (Duration::ZERO, Ok(reading(38.0))),
    ]));
    let poller = SensorPoller::start(gateway, INTERVAL);

    assert!(poller.state().is_loading);
    sleep_ms(100).await;
    assert!(poller.state().is_loading);

    sleep_ms(200).await;
    let state = poller.state();
    assert!(!state.is_loading);
    assert_eq!(state.snapshot, reading(37.5));

    sleep_ms(5000).await;
    assert_eq!(poller.state().snapshot, reading(38.0));
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_stale_snapshot() {
    let gateway = Arc::new(ScriptedGateway::with_snapshots([
        (Duration::ZERO, Err(503)),
        (Duration::ZERO, Ok(reading(36.6))),
        (Duration::ZERO, Err(500)),
    ]));
    let poller = SensorPoller::start(gateway, INTERVAL);

    sleep_ms(1).await;
    let state = poller.state();
    assert!(!state.is_loading, "first attempt ends loading even on failure");
    assert_eq!(state.snapshot, SensorSnapshot::default());

    sleep_ms(5000).await;
    assert_eq!(poller.state().snapshot, reading(36.6));

    sleep_ms(5000).await;
    let state = poller.state();
    assert_eq!(state.snapshot, reading(36.6));
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn late_response_overwrites_newer_snapshot() {
    // First fetch is slow, second is fast: results land in arrival order.
    let gateway = Arc::new(ScriptedGateway::with_snapshots([
        (Duration::from_millis(8000), Ok(reading(20.0))),
        (Duration::ZERO, Ok(reading(30.0))),
    ]));
    let poller = SensorPoller::start(gateway, INTERVAL);

    sleep_ms(5001).await;
    assert_eq!(poller.state().snapshot, reading(30.0));

    sleep_ms(3000).await;
    assert_eq!(poller.state().snapshot, reading(20.0));
}

#[tokio::test(start_paused = true)]
async fn in_flight_result_is_discarded_after_teardown() {
    let gateway = Arc::new(ScriptedGateway::with_snapshots([(
        Duration::from_millis(3000),
        Ok(reading(39.0)),
    )]));
    let poller = SensorPoller::start(gateway.clone(), INTERVAL);
    let mut updates = poller.subscribe();

    sleep_ms(1000).await;
    assert_eq!(gateway.fetch_calls(), 1);
    poller.stop();

    sleep_ms(10_000).await;
    assert_eq!(gateway.fetch_calls(), 1);
    assert_eq!(
        gateway
            .fetch_completions
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
    assert!(updates.borrow_and_update().is_loading);
    assert!(updates.changed().await.is_err(), "publisher is gone");
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_each_refresh() {
    let gateway = Arc::new(ScriptedGateway::with_snapshots([(
        Duration::ZERO,
        Ok(reading(37.0)),
    )]));
    let poller = SensorPoller::start(gateway, INTERVAL);
    let mut updates = poller.subscribe();

    updates.changed().await.expect("first refresh");
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.snapshot, reading(37.0));
    assert_eq!(state.readout().temperature_text, "37 °C");
}

#[tokio::test(start_paused = true)]
async fn zero_interval_still_polls() {
    let gateway = Arc::new(ScriptedGateway::with_snapshots([(
        Duration::ZERO,
        Ok(reading(36.6)),
    )]));
    let poller = SensorPoller::start(gateway.clone(), Duration::ZERO);

    sleep_ms(10).await;
    assert!(gateway.fetch_calls() >= 2);
    assert!(!poller.state().is_loading);
    assert!(!poller.task.is_finished(), "poll task survived start");
}
