//! Broadcast discovery of controllers

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use doorctl_core::{Frame, Function};
use doorctl_transport::Scanner;
use doorctl_types::DiscoveredController;

use crate::error::Result;

/// Default discovery broadcast address
pub const DEFAULT_BROADCAST: Ipv4Addr = Ipv4Addr::BROADCAST;

/// A timed broadcast scan for controllers
///
/// # Examples
///
/// ```no_run
/// use doorctl::Discovery;
///
/// #[tokio::main]
/// async fn main() -> doorctl::Result<()> {
///     let controllers = Discovery::new().run().await?;
///     for controller in &controllers {
///         println!("{}", controller);
///     }
///     Ok(())
/// }
/// ```
pub struct Discovery {
    scanner: Scanner,
    broadcast: IpAddr,
}

impl Discovery {
    /// Create a discovery scan with default broadcast, port and window
    pub fn new() -> Self {
        Self {
            scanner: Scanner::new(),
            broadcast: IpAddr::V4(DEFAULT_BROADCAST),
        }
    }

    /// Use a directed broadcast address (e.g. 192.168.1.255)
    pub fn with_broadcast(mut self, broadcast: IpAddr) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Set the destination port of the broadcast
    pub fn with_port(mut self, port: u16) -> Self {
        self.scanner = self.scanner.with_port(port);
        self
    }

    /// Set the listen window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.scanner = self.scanner.with_window(window);
        self
    }

    /// Scan and return every controller that replied within the window
    pub async fn run(&self) -> Result<Vec<DiscoveredController>> {
        self.run_with(None).await
    }

    /// Like [`run`](Self::run), additionally pushing each controller
    /// into `live` the moment its reply arrives
    pub async fn run_with(
        &self,
        live: Option<mpsc::Sender<DiscoveredController>>,
    ) -> Result<Vec<DiscoveredController>> {
        let frame = Frame::new(Function::Search, 0);

        let (tx, mut rx) = mpsc::channel(64);
        let scan = self.scanner.scan_with(self.broadcast, &frame, Some(tx));

        // Map raw replies as they arrive; the scanner drops its sender
        // when the window elapses, ending this loop
        let collect = async {
            let mut found = Vec::new();
            while let Some(reply) = rx.recv().await {
                let controller = match DiscoveredController::from_payload(
                    reply.frame.device_serial,
                    &reply.frame.payload_bytes(),
                    reply.source.ip(),
                ) {
                    Ok(controller) => controller,
                    Err(e) => {
                        debug!(source = %reply.source, error = %e, "dropping undecodable reply");
                        continue;
                    }
                };

                info!(%controller, "discovered");
                if let Some(tx) = &live {
                    let _ = tx.send(controller.clone()).await;
                }
                found.push(controller);
            }
            found
        };

        let (scan_result, found) = tokio::join!(scan, collect);
        scan_result?;

        Ok(found)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
