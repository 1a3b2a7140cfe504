use crate::helpers::{
    accept_monitor, app_state, identify, is_silent, next_json, set_name, start_inspector,
    wait_for_phase,
};

use monitor_core::{
    AnySerializable, ConnectionPhase, MonitorConfig, MonitorMiddleware, MonitorMock,
    MonitorProvider, Monitored, ReduxMonitor,
};

use std::sync::Arc;
use std::time::Duration;

/// An action holding something that cannot go on the wire.
struct Subscribe {
    _callback: Box<dyn Fn() + Send + Sync>,
}

impl Monitored for Subscribe {
    fn snapshot(&self) -> Option<AnySerializable> {
        None
    }
}

/// **VALUE**: Verifies the middleware connects the monitor and streams what it observes.
#[tokio::test]
async fn given_middleware_over_live_monitor_when_observing_then_frames_reach_inspector() {
    // GIVEN: A live monitor installed as middleware
    let (listener, url) = start_inspector().await;
    let monitor = ReduxMonitor::new(MonitorConfig::with_url(&url)).expect("monitor");
    let middleware = MonitorMiddleware::new(Arc::new(monitor.clone()));
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    // WHEN: A transition is observed
    middleware.observe(&set_name("Andy"), &app_state("Andy"));

    // THEN: The inspector receives it
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["data"]["payload"]["name"], "Andy");
    assert_eq!(frame["data"]["action"]["action"]["type"], "SetName");
}

/// **VALUE**: Verifies that an unserializable action produces no outbound frame.
#[tokio::test]
async fn given_unserializable_action_when_observed_then_nothing_sent() {
    let (listener, url) = start_inspector().await;
    let monitor = ReduxMonitor::new(MonitorConfig::with_url(&url)).expect("monitor");
    let middleware = MonitorMiddleware::new(Arc::new(monitor.clone()));
    let mut ws = accept_monitor(&listener).await;
    identify(&mut ws).await;
    wait_for_phase(&monitor, ConnectionPhase::Streaming).await;

    middleware.observe(
        &Subscribe {
            _callback: Box::new(|| {}),
        },
        &app_state("Andy"),
    );

    assert!(is_silent(&mut ws, Duration::from_millis(200)).await);
}

#[test]
fn given_mock_monitor_when_used_as_middleware_then_everything_is_a_no_op() {
    let mock = Arc::new(MonitorMock::new());
    let middleware = MonitorMiddleware::new(Arc::clone(&mock) as Arc<dyn MonitorProvider>);

    middleware.observe(&set_name("Andy"), &app_state("Andy"));
    middleware.observe(
        &Subscribe {
            _callback: Box::new(|| {}),
        },
        &app_state("Andy"),
    );

    assert!(middleware.monitor().url().is_none());
}
