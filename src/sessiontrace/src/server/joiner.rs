use tracing::{debug, info, trace};

use crate::address::AddressResolver;
use crate::types::{Address, JoinedRecord, RoutingRecord, SessionRecord};

/// Pairs each session with the proxy connection it arrived through.
#[derive(Debug, Default)]
pub struct CorrelationJoiner {
    resolver: AddressResolver,
}

impl CorrelationJoiner {
    pub fn new(resolver: AddressResolver) -> Self {
        Self { resolver }
    }

    /// Sessions without a matching routing record are dropped. Output keeps
    /// session order.
    pub async fn join(
        &self,
        sessions: Vec<SessionRecord>,
        routing: &[RoutingRecord],
    ) -> Vec<JoinedRecord> {
        let total = sessions.len();
        let mut joined = Vec::with_capacity(total);
        for session in sessions {
            match self.find_routing_record(&session.peer, routing).await {
                Some(record) => {
                    trace!("Session {} arrived through {}", session.id, record);
                    joined.push(JoinedRecord::new(session, record.clone()))
                }
                None => trace!("No routing record for session {} ({})", session.id, session.peer),
            }
        }
        info!("Joined {} of {} sessions", joined.len(), total);
        joined
    }

    /// First record in fetch order wins. Both sides are canonicalized, and a
    /// record whose host does not resolve never matches.
    async fn find_routing_record<'a>(
        &self,
        peer: &Address,
        routing: &'a [RoutingRecord],
    ) -> Option<&'a RoutingRecord> {
        let ip = match self.resolver.canonicalize(&peer.host).await {
            Ok(ip) => ip,
            Err(e) => {
                debug!("{}", e);
                return None;
            }
        };

        for record in routing {
            // ports are cheap to compare, hosts may need a lookup
            if record.proxy_facing.port != peer.port {
                continue;
            }
            match self.resolver.canonicalize(&record.proxy_facing.host).await {
                Ok(record_ip) if record_ip == ip => return Some(record),
                Ok(_) => {}
                Err(e) => debug!("Skipping routing record {}: {}", record, e),
            }
        }
        None
    }
}
