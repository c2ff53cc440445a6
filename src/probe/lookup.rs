//! `_minecraft._tcp` service record lookup
//!
//! Hosted servers often publish only an SRV record pointing at the real
//! host and port. A probe for an address without an explicit port asks the
//! [`ServiceLocator`] first and falls back to the host on the default port.

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use tracing::{debug, trace, warn};

use super::EndpointAddress;

/// Service label of the Java edition
pub const SERVICE_PREFIX: &str = "_minecraft._tcp.";

/// Resolves where a host's game service actually lives
#[async_trait]
pub trait ServiceLocator: Send + Sync {
    /// `None` when the host publishes no usable record
    async fn locate(&self, host: &str) -> Option<EndpointAddress>;
}

/// One SRV answer, reduced to what target selection needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub priority: u16,
    pub weight: u16,
    pub target: String,
    pub port: u16,
}

/// Pick the record to connect to: lowest priority, then highest weight.
///
/// A target of `.` means the service is explicitly unavailable.
pub fn select_target(records: impl IntoIterator<Item = ServiceRecord>) -> Option<EndpointAddress> {
    let record = records
        .into_iter()
        .min_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)))?;

    let host = record.target.trim_end_matches('.');
    if host.is_empty() {
        return None;
    }

    Some(EndpointAddress::new(host, record.port))
}

/// [`ServiceLocator`] backed by the system's DNS resolver
pub struct SrvLocator {
    resolver: TokioAsyncResolver,
}

impl SrvLocator {
    /// Use `/etc/resolv.conf` (or the platform equivalent), falling back to
    /// public resolvers when it cannot be read
    pub fn from_system_conf() -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!("failed to read system resolver config, using defaults: {e}");
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };

        Self { resolver }
    }
}

#[async_trait]
impl ServiceLocator for SrvLocator {
    async fn locate(&self, host: &str) -> Option<EndpointAddress> {
        let name = format!("{SERVICE_PREFIX}{}.", host.trim_end_matches('.'));

        let lookup = match self.resolver.srv_lookup(name.as_str()).await {
            Ok(lookup) => lookup,
            Err(e) => {
                trace!("no service record for {host}: {e}");
                return None;
            }
        };

        let target = select_target(lookup.iter().map(|srv| ServiceRecord {
            priority: srv.priority(),
            weight: srv.weight(),
            target: srv.target().to_utf8(),
            port: srv.port(),
        }));

        if let Some(target) = &target {
            debug!("{host} is served by {target}");
        }
        target
    }
}
