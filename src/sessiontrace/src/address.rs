use dashmap::DashMap;
use std::net::IpAddr;
use tracing::trace;

use crate::error::CorrelationError;

/// Formats an IP so that equal addresses compare equal as strings.
/// IPv4-mapped IPv6 addresses collapse to their IPv4 form.
pub fn canonical_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

/// Turns hostnames into IP strings for address comparison.
///
/// Lookups, failed ones included, are cached for the lifetime of the
/// resolver, which is owned by a single correlation request.
#[derive(Debug, Default)]
pub struct AddressResolver {
    /// `None` marks a host that did not resolve.
    cache: DashMap<String, Option<String>>,
}

impl AddressResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn canonicalize(&self, host: &str) -> Result<String, CorrelationError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(canonical_ip(ip));
        }
        if let Some(cached) = self.cache.get(host) {
            return cached
                .clone()
                .ok_or_else(|| CorrelationError::resolution(host, None));
        }

        let resolved = match tokio::net::lookup_host((host, 0)).await {
            Ok(mut addrs) => addrs
                .next()
                .map(|addr| canonical_ip(addr.ip()))
                .ok_or_else(|| CorrelationError::resolution(host, None)),
            Err(e) => Err(CorrelationError::resolution(host, Some(e))),
        };

        match &resolved {
            Ok(ip) => trace!("Resolved {} to {}", host, ip),
            Err(e) => trace!("{}", e),
        }
        self.cache
            .insert(host.to_string(), resolved.as_ref().ok().cloned());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10.0.0.5", "10.0.0.5")]
    #[case("::1", "::1")]
    #[case("::ffff:10.0.0.5", "10.0.0.5")]
    #[case("2001:0db8:0000:0000:0000:0000:0000:0001", "2001:db8::1")]
    #[tokio::test]
    async fn test_canonicalize_ip_literals(#[case] host: &str, #[case] expected: &str) {
        let resolver = AddressResolver::new();
        assert_eq!(resolver.canonicalize(host).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_canonicalize_unresolvable_host_is_resolution_error() {
        let resolver = AddressResolver::new();
        let err = resolver
            .canonicalize("no-such-host.invalid")
            .await
            .unwrap_err();

        assert!(matches!(err, CorrelationError::Resolution { .. }));
        assert!(matches!(
            resolver.cache.get("no-such-host.invalid").as_deref(),
            Some(None)
        ));
    }

    #[tokio::test]
    async fn test_canonicalize_serves_failures_from_cache() {
        let resolver = AddressResolver::new();
        resolver
            .cache
            .insert("db-proxy.internal".to_string(), None);
        resolver
            .cache
            .insert("web-1.internal".to_string(), Some("10.0.0.9".to_string()));

        let err = resolver.canonicalize("db-proxy.internal").await.unwrap_err();
        assert!(matches!(err, CorrelationError::Resolution { source: None, .. }));
        assert_eq!(resolver.canonicalize("web-1.internal").await.unwrap(), "10.0.0.9");
    }

    #[tokio::test]
    async fn test_canonicalize_does_not_cache_literals() {
        let resolver = AddressResolver::new();
        resolver.canonicalize("127.0.0.1").await.unwrap();
        assert!(resolver.cache.is_empty());
    }
}
