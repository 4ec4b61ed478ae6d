//! Demo tracking server.
//!
//! Speaks the tracking channel protocol over newline-delimited JSON so the
//! CLI and the integration tests have something real to connect to. Each
//! `track-order` starts a [`DeliveryWalk`] that moves the courier from the
//! store to the customer, one `location-update` per tick.
//!
//! # Example
//!
//! ```ignore
//! let server = SimulatedServer::bind(SimulatorConfig::default()).await?;
//! println!("listening on {}", server.local_addr());
//! server.serve(CancellationToken::new()).await?;
//! ```

mod connection;
mod walk;

pub use walk::{DeliveryWalk, STATUS_DELIVERED, STATUS_OUT_FOR_DELIVERY};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::geo::{GeoError, Position};
use crate::map::DEFAULT_COURIER_SPEED_KMH;
use crate::tracking::DEFAULT_ENDPOINT;

/// Default number of steps between store and customer.
pub const DEFAULT_STEPS: u32 = 20;

/// Default interval between location updates.
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;

/// Message sent with `connect_error` when the credential is missing or wrong.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Address to listen on (`host:port`, port 0 picks a free one).
    pub bind: String,
    pub store: Position,
    pub customer: Position,
    /// Number of legs in the walk; `steps + 1` updates are sent.
    pub steps: u32,
    /// Delay between updates.
    pub interval: Duration,
    /// Bearer token clients must present. `None` accepts everyone.
    pub token: Option<String>,
    /// Courier speed used for the ETA.
    pub speed_kmh: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_ENDPOINT.to_string(),
            store: Position::new(21.1458, 79.0882),
            customer: Position::new(21.1219, 79.0510),
            steps: DEFAULT_STEPS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            token: None,
            speed_kmh: DEFAULT_COURIER_SPEED_KMH,
        }
    }
}

impl SimulatorConfig {
    fn validate(&self) -> Result<(), SimulatorError> {
        self.store.validate().map_err(SimulatorError::InvalidPosition)?;
        self.customer
            .validate()
            .map_err(SimulatorError::InvalidPosition)?;
        if self.interval.is_zero() {
            return Err(SimulatorError::InvalidConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn walk(&self, order_id: &str) -> DeliveryWalk {
        DeliveryWalk::new(
            order_id,
            self.store,
            self.customer,
            self.steps,
            self.speed_kmh,
        )
    }
}

/// Errors starting the simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid simulator position: {0}")]
    InvalidPosition(GeoError),

    #[error("Invalid simulator configuration: {0}")]
    InvalidConfig(String),
}

/// A bound simulator, ready to [`serve`](Self::serve).
pub struct SimulatedServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<SimulatorConfig>,
}

impl SimulatedServer {
    /// Validate the configuration and bind the listener.
    pub async fn bind(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        let bind_err = |source| SimulatorError::Bind {
            addr: config.bind.clone(),
            source,
        };
        let listener = TcpListener::bind(&config.bind).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `cancellation` fires.
    ///
    /// On cancellation every open connection is sent `io server disconnect`
    /// and closed before this returns.
    pub async fn serve(self, cancellation: CancellationToken) -> Result<(), SimulatorError> {
        info!(
            addr = %self.local_addr,
            steps = self.config.steps,
            interval_ms = self.config.interval.as_millis() as u64,
            auth = self.config.token.is_some(),
            "Tracking simulator listening"
        );

        let tracker = TaskTracker::new();
        let mut connections: u64 = 0;

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections += 1;
                        debug!(%peer, connection = connections, "Client connected");
                        tracker.spawn(connection::handle(
                            stream,
                            peer,
                            Arc::clone(&self.config),
                            cancellation.child_token(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        tracker.close();
        tracker.wait().await;
        info!(connections, "Tracking simulator stopped");
        Ok(())
    }
}
