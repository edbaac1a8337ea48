use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use super::ProxySource;
use crate::context::RequestContext;
use crate::types::{Address, RoutingRecord};

const CONNS_COMMAND: &[u8] = b"conns\n";

/// Reads the relayed-connection list from the proxy's management port.
///
/// The proxy answers `conns` with one line per connection:
/// `<client-out> <proxy-in> <proxy-out> <server-in>`.
pub struct TcpProxySource {
    mgmt_address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl TcpProxySource {
    pub fn new(mgmt_address: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            mgmt_address: mgmt_address.into(),
            connect_timeout,
            read_timeout,
        }
    }

    async fn connect(&self) -> Result<TcpStream> {
        timeout(self.connect_timeout, TcpStream::connect(&self.mgmt_address))
            .await
            .with_context(|| format!("timed out connecting to proxy at {}", self.mgmt_address))?
            .with_context(|| format!("failed to connect to proxy at {}", self.mgmt_address))
    }
}

fn parse_endpoint(token: &str) -> Option<Address> {
    token.parse::<SocketAddr>().ok().map(Address::from)
}

pub(crate) fn parse_record(line: &str) -> Option<RoutingRecord> {
    let mut fields = line.split_whitespace();
    let client_out = parse_endpoint(fields.next()?)?;
    let _proxy_in = parse_endpoint(fields.next()?)?;
    let proxy_out = parse_endpoint(fields.next()?)?;
    let _server_in = parse_endpoint(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(RoutingRecord {
        origin: client_out,
        proxy_facing: proxy_out,
    })
}

#[async_trait]
impl ProxySource for TcpProxySource {
    #[tracing::instrument(skip_all, fields(mgmt_address = %self.mgmt_address))]
    async fn fetch_records(&self, ctx: &RequestContext) -> Result<Vec<RoutingRecord>> {
        info!("Requesting connections from proxy");
        let mut stream = tokio::select! {
            stream = self.connect() => stream?,
            _ = ctx.done() => bail!("proxy fetch interrupted: {}", ctx.error()),
        };
        stream
            .write_all(CONNS_COMMAND)
            .await
            .context("failed to send conns command")?;

        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        let mut records = Vec::new();
        loop {
            line.clear();
            let read = tokio::select! {
                read = timeout(self.read_timeout, reader.read_until(b'\n', &mut line)) => read
                    .context("timed out reading from proxy")?
                    .context("failed to read from proxy")?,
                _ = ctx.done() => bail!("proxy fetch interrupted: {}", ctx.error()),
            };
            // EOF, the proxy has listed every connection
            if read == 0 {
                break;
            }

            let Ok(text) = std::str::from_utf8(&line) else {
                debug!("Skipping non UTF-8 proxy line {:?}", String::from_utf8_lossy(&line));
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            match parse_record(text) {
                Some(record) => records.push(record),
                None => debug!("Skipping malformed proxy line {:?}", text),
            }
        }

        info!("Got {} records from proxy", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_record() {
        let record =
            parse_record("10.0.4.219:36149 10.0.0.68:3306 10.0.0.68:35423 10.0.0.241:3306").unwrap();

        assert_eq!(record.origin, Address::new("10.0.4.219", 36149));
        assert_eq!(record.proxy_facing, Address::new("10.0.0.68", 35423));
    }

    #[rstest]
    #[case("")]
    #[case("10.0.4.219:36149 10.0.0.68:3306 10.0.0.68:35423")]
    #[case("10.0.4.219:36149 10.0.0.68:3306 10.0.0.68:35423 10.0.0.241:3306 extra")]
    #[case("client:1 10.0.0.68:3306 10.0.0.68:35423 10.0.0.241:3306")]
    #[case("10.0.4.219 10.0.0.68:3306 10.0.0.68:35423 10.0.0.241:3306")]
    fn test_parse_record_rejects_malformed(#[case] line: &str) {
        assert_eq!(parse_record(line), None);
    }

    #[test]
    fn test_parse_record_ipv6() {
        let record = parse_record("[::1]:40000 [::1]:3307 [::ffff:10.0.0.68]:35423 [::1]:3306").unwrap();
        assert_eq!(record.origin, Address::new("::1", 40000));
        assert_eq!(record.proxy_facing, Address::new("10.0.0.68", 35423));
    }

    async fn fake_proxy(reply: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut command = [0u8; CONNS_COMMAND.len()];
            socket.read_exact(&mut command).await.unwrap();
            assert_eq!(&command, CONNS_COMMAND);
            socket.write_all(reply).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_fetch_records_from_proxy() {
        let addr = fake_proxy(
            b"10.0.0.9:22001 10.0.0.5:3307 10.0.0.5:5000 10.0.0.2:3306\n\
              garbage line\n\
              10.0.0.10:22002 10.0.0.5:3307 10.0.0.5:5001 10.0.0.2:3306\n",
        )
        .await;
        let source = TcpProxySource::new(addr.to_string(), Duration::from_secs(1), Duration::from_secs(1));

        let records = source.fetch_records(&RequestContext::new()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].origin, Address::new("10.0.0.9", 22001));
        assert_eq!(records[1].proxy_facing, Address::new("10.0.0.5", 5001));
    }

    #[tokio::test]
    async fn test_fetch_records_skips_undecodable_lines() {
        let addr = fake_proxy(
            b"10.0.0.9:22001 10.0.0.5:3307 10.0.0.5:5000 10.0.0.2:3306\n\xff\xfe junk\n\
              10.0.0.10:22002 10.0.0.5:3307 10.0.0.5:5001 10.0.0.2:3306",
        )
        .await;
        let source = TcpProxySource::new(addr.to_string(), Duration::from_secs(1), Duration::from_secs(1));

        let records = source.fetch_records(&RequestContext::new()).await.unwrap();

        // the last line has no trailing newline and still counts
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].proxy_facing, Address::new("10.0.0.5", 5000));
        assert_eq!(records[1].origin, Address::new("10.0.0.10", 22002));
    }

    #[tokio::test]
    async fn test_fetch_records_stops_when_cancelled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accepts but never answers
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let source = TcpProxySource::new(addr.to_string(), Duration::from_secs(1), Duration::from_secs(30));
        let ctx = RequestContext::new();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), source.fetch_records(&ctx))
            .await
            .expect("fetch should observe cancellation");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_records_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = TcpProxySource::new(addr.to_string(), Duration::from_secs(1), Duration::from_secs(1));
        assert!(source.fetch_records(&RequestContext::new()).await.is_err());
    }
}
