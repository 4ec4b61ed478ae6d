//! Integration tests for the Connection Manager against the simulator.
//!
//! These tests run the real `TcpConnector` over loopback TCP:
//! - Simulator → manager (auth, tracking-started, location updates)
//! - Server-initiated disconnect (no reconnect)
//! - Refused connections (backoff, failure, recovery)
//!
//! Run with: `cargo test --test tracking_integration`

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use couriertrack::geo::Position;
use couriertrack::simulator::{
    SimulatedServer, SimulatorConfig, SimulatorError, STATUS_DELIVERED,
};
use couriertrack::tracking::{
    ConnectionManager, ConnectionState, ReconnectPolicy, TcpConnector, TrackingConfig,
    TrackingEvent, TrackingStatus, RECONNECT_EXHAUSTED_MESSAGE,
};

// ============================================================================
// Test Helpers
// ============================================================================

const STORE: Position = Position::new(21.1458, 79.0882);
const CUSTOMER: Position = Position::new(21.1219, 79.0510);

/// Generous upper bound for anything that should happen "soon".
const WAIT: Duration = Duration::from_secs(5);

struct RunningSimulator {
    addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), SimulatorError>>,
}

impl RunningSimulator {
    async fn start(bind: &str, steps: u32, token: Option<&str>) -> Self {
        let config = SimulatorConfig {
            bind: bind.to_string(),
            store: STORE,
            customer: CUSTOMER,
            steps,
            interval: Duration::from_millis(20),
            token: token.map(String::from),
            ..Default::default()
        };
        let server = SimulatedServer::bind(config).await.unwrap();
        let addr = server.local_addr();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(server.serve(cancel.clone()));
        Self { addr, cancel, task }
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.task.await.unwrap().unwrap();
    }
}

fn tracking_config(addr: SocketAddr, credential: Option<&str>) -> TrackingConfig {
    TrackingConfig {
        endpoint: addr.to_string(),
        credential: credential.map(String::from),
        connect_timeout: Duration::from_secs(2),
        reconnect: ReconnectPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(40),
        },
        ..Default::default()
    }
}

async fn wait_for_status(
    manager: &ConnectionManager,
    predicate: impl FnMut(&TrackingStatus) -> bool,
) -> TrackingStatus {
    let mut rx = manager.watch_status();
    let status = tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for status")
        .expect("manager stopped")
        .clone();
    status
}

async fn next_event(events: &mut broadcast::Receiver<TrackingEvent>) -> TrackingEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

/// A local address nothing is listening on.
async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_tracks_delivery_to_completion() {
    let sim = RunningSimulator::start("127.0.0.1:0", 4, None).await;
    let manager = ConnectionManager::spawn(TcpConnector::new(), tracking_config(sim.addr, None));
    let mut events = manager.subscribe();

    manager.start("ORD-1").unwrap();

    assert_eq!(next_event(&mut events).await, TrackingEvent::Connected);

    let mut positions = Vec::new();
    loop {
        match next_event(&mut events).await {
            TrackingEvent::LocationUpdate(update) => {
                assert_eq!(update.order_id, "ORD-1");
                positions.push(update.position);
                if update.status == STATUS_DELIVERED {
                    break;
                }
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(positions.len(), 5);
    assert_eq!(positions.first(), Some(&STORE));
    assert_eq!(positions.last(), Some(&CUSTOMER));

    let status = manager.status();
    assert_eq!(status.connection_state, ConnectionState::Connected);
    assert_eq!(status.delivery_position, Some(CUSTOMER));
    assert_eq!(status.delivery_status.as_deref(), Some(STATUS_DELIVERED));
    assert_eq!(status.distance_remaining, Some(0.0));
    assert!(status.last_update_at.is_some());

    manager.shutdown().await;
    sim.stop().await;
}

#[tokio::test]
async fn test_server_disconnect_does_not_reconnect() {
    let sim = RunningSimulator::start("127.0.0.1:0", 1000, None).await;
    let manager = ConnectionManager::spawn(TcpConnector::new(), tracking_config(sim.addr, None));
    let mut events = manager.subscribe();

    manager.start("ORD-2").unwrap();
    wait_for_status(&manager, TrackingStatus::is_connected).await;

    sim.stop().await;

    loop {
        if let TrackingEvent::Disconnected { reason } = next_event(&mut events).await {
            assert_eq!(reason, "io server disconnect");
            break;
        }
    }
    let status = wait_for_status(&manager, |s| s.connection_state == ConnectionState::Idle).await;
    assert_eq!(status.reconnect_attempt, 0);
    assert_eq!(status.order_id.as_deref(), Some("ORD-2"));

    // Nothing is scheduled: the session stays idle.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(manager.status().connection_state, ConnectionState::Idle);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_stop_keeps_order_and_goes_idle() {
    let sim = RunningSimulator::start("127.0.0.1:0", 1000, None).await;
    let manager = ConnectionManager::spawn(TcpConnector::new(), tracking_config(sim.addr, None));

    manager.start("ORD-3").unwrap();
    wait_for_status(&manager, |s| s.delivery_position.is_some()).await;

    manager.stop().unwrap();
    let status = wait_for_status(&manager, |s| s.connection_state == ConnectionState::Idle).await;
    assert_eq!(status.order_id.as_deref(), Some("ORD-3"));

    // Resuming the same order reconnects.
    manager.start("ORD-3").unwrap();
    wait_for_status(&manager, TrackingStatus::is_connected).await;

    manager.shutdown().await;
    sim.stop().await;
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let sim = RunningSimulator::start("127.0.0.1:0", 2, Some("s3cret")).await;
    let manager = ConnectionManager::spawn(
        TcpConnector::new(),
        tracking_config(sim.addr, Some("s3cret")),
    );

    manager.start("ORD-4").unwrap();
    let status = wait_for_status(&manager, |s| {
        s.delivery_status.as_deref() == Some(STATUS_DELIVERED)
    })
    .await;
    assert!(status.last_error.is_none());

    manager.shutdown().await;
    sim.stop().await;
}

#[tokio::test]
async fn test_rejected_token_exhausts_reconnects() {
    let sim = RunningSimulator::start("127.0.0.1:0", 2, Some("s3cret")).await;
    let manager = ConnectionManager::spawn(
        TcpConnector::new(),
        tracking_config(sim.addr, Some("wrong")),
    );

    manager.start("ORD-5").unwrap();
    let status = wait_for_status(&manager, TrackingStatus::is_failed).await;

    assert_eq!(status.reconnect_attempt, 2);
    assert_eq!(status.last_error.as_deref(), Some(RECONNECT_EXHAUSTED_MESSAGE));

    manager.shutdown().await;
    sim.stop().await;
}

#[tokio::test]
async fn test_refused_then_manual_reconnect_recovers() {
    let addr = unused_addr().await;
    let manager = ConnectionManager::spawn(TcpConnector::new(), tracking_config(addr, None));

    manager.start("ORD-6").unwrap();
    wait_for_status(&manager, TrackingStatus::is_failed).await;

    let sim = RunningSimulator::start(&addr.to_string(), 3, None).await;
    manager.manual_reconnect().unwrap();

    let status = wait_for_status(&manager, TrackingStatus::is_connected).await;
    assert_eq!(status.reconnect_attempt, 0);
    assert!(status.last_error.is_none());

    manager.shutdown().await;
    sim.stop().await;
}

#[tokio::test]
async fn test_server_returning_within_backoff_is_picked_up() {
    let addr = unused_addr().await;
    let mut config = tracking_config(addr, None);
    config.reconnect = ReconnectPolicy {
        max_attempts: 5,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(200),
    };
    let manager = ConnectionManager::spawn(TcpConnector::new(), config);

    manager.start("ORD-7").unwrap();
    wait_for_status(&manager, |s| {
        s.connection_state == ConnectionState::Disconnected
    })
    .await;

    let sim = RunningSimulator::start(&addr.to_string(), 3, None).await;

    wait_for_status(&manager, TrackingStatus::is_connected).await;

    manager.shutdown().await;
    sim.stop().await;
}
