//! Minecraft Java edition status probe
//!
//! Connects over TCP, sends the handshake + status request and reads the
//! status document. The whole exchange (service lookup and connect
//! included) is bounded by a single timeout.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{instrument, trace};

use super::lookup::ServiceLocator;
use super::protocol::{self, FrameError};
use super::{EndpointAddress, EndpointProbe, ProbeFailure, ProbeResult};

/// Default bound for one status exchange
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe speaking the Java edition "Server List Ping"
#[derive(Clone)]
pub struct JavaStatusProbe {
    timeout: Duration,
    locator: Option<Arc<dyn ServiceLocator>>,
}

impl JavaStatusProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locator: None,
        }
    }

    /// Consult `locator` for addresses given without a port
    pub fn with_service_lookup(mut self, locator: Arc<dyn ServiceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Where to connect for `address`
    async fn resolve(&self, address: &EndpointAddress) -> EndpointAddress {
        if let Some(locator) = &self.locator {
            if address.wants_service_lookup() {
                if let Some(target) = locator.locate(&address.host).await {
                    return target;
                }
            }
        }

        address.clone()
    }

    async fn exchange(&self, address: &EndpointAddress) -> Result<ProbeResult, FrameError> {
        let target = self.resolve(address).await;
        let mut stream = TcpStream::connect((target.host.as_str(), target.port)).await?;

        let mut request = protocol::handshake_packet(&target.host, target.port);
        request.extend(protocol::status_request_packet());
        stream.write_all(&request).await?;

        let body = protocol::read_packet(&mut stream).await?;
        let status = protocol::decode_status_response(&body)?;

        if let Some(version) = &status.version {
            trace!("{address} runs {} ({})", version.name, version.protocol);
        }

        Ok(ProbeResult::alive(status.players.online, status.players.max))
    }
}

impl Default for JavaStatusProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl EndpointProbe for JavaStatusProbe {
    #[instrument(skip(self), fields(address = %address))]
    async fn probe(&self, address: &EndpointAddress) -> ProbeResult {
        let result = match tokio::time::timeout(self.timeout, self.exchange(address)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ProbeResult::failed(classify(&e)),
            Err(_) => ProbeResult::failed(ProbeFailure::TimedOut),
        };

        trace!("probe finished: {result:?}");
        result
    }
}

/// Map a framing/I/O error onto the failure taxonomy
fn classify(error: &FrameError) -> ProbeFailure {
    match error {
        FrameError::Io(e) => match e.kind() {
            io::ErrorKind::TimedOut => ProbeFailure::TimedOut,
            // the peer started answering and then hung up
            io::ErrorKind::UnexpectedEof => ProbeFailure::MalformedResponse,
            _ => ProbeFailure::Unreachable,
        },
        FrameError::VarIntTooLong
        | FrameError::BadLength(_)
        | FrameError::UnexpectedPacket(_)
        | FrameError::InvalidUtf8
        | FrameError::InvalidJson(_) => ProbeFailure::MalformedResponse,
    }
}
