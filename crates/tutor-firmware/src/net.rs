//! HTTP(S) client on top of embassy-net
//!
//! Every request opens a fresh TCP connection (the core HTTP layer sends
//! `Connection: close`), wrapped in TLS for `https://` URLs. Socket and TLS
//! record buffers are allocated once and reused. Redirects are followed by
//! wrapping the client in [`tutor_core::http::Redirecting`].

use alloc::vec;
use alloc::vec::Vec;

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use embedded_tls::{Aes128GcmSha256, TlsConfig, TlsConnection, TlsContext, UnsecureProvider};
use log::{debug, warn};
use tutor_core::http::{
    self, DEFAULT_MAX_BODY, HEADER_BUF_SIZE, HttpError, Response, Scheme, Transport, Url,
};

use crate::rng::DeviceRng;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);
const SOCKET_BUFFER_SIZE: usize = 4096;

/// Largest TLS record plus header, as required by embedded-tls
const TLS_RECORD_SIZE: usize = 16_640;

pub struct NetClient {
    stack: Stack<'static>,
    rng: DeviceRng,
    rx: Vec<u8>,
    tx: Vec<u8>,
    tls_read: Vec<u8>,
    tls_write: Vec<u8>,
    head: Vec<u8>,
}

impl NetClient {
    pub fn new(stack: Stack<'static>, rng: DeviceRng) -> Self {
        Self {
            stack,
            rng,
            rx: vec![0; SOCKET_BUFFER_SIZE],
            tx: vec![0; SOCKET_BUFFER_SIZE],
            tls_read: vec![0; TLS_RECORD_SIZE],
            tls_write: vec![0; SOCKET_BUFFER_SIZE],
            head: vec![0; HEADER_BUF_SIZE],
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, HttpError> {
        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS lookup for {} failed: {:?}", host, e);
                HttpError::Dns
            })?;
        addresses.first().copied().ok_or(HttpError::Dns)
    }
}

impl Transport for NetClient {
    async fn exchange(&mut self, url: &Url<'_>) -> Result<Response, HttpError> {
        let address = self.resolve(url.host).await?;
        debug!("{} resolved to {}", url.host, address);

        let mut socket = TcpSocket::new(self.stack, &mut self.rx, &mut self.tx);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket.connect((address, url.port)).await.map_err(|e| {
            warn!("Connect to {}:{} failed: {:?}", url.host, url.port, e);
            HttpError::Connect
        })?;

        let body = match url.scheme {
            Scheme::Http => http::get(&mut socket, url, &mut self.head, DEFAULT_MAX_BODY).await,
            Scheme::Https => {
                let mut tls = TlsConnection::new(socket, &mut self.tls_read, &mut self.tls_write);
                let config = TlsConfig::new().with_server_name(url.host);
                tls.open(TlsContext::new(
                    &config,
                    UnsecureProvider::new::<Aes128GcmSha256>(&mut self.rng),
                ))
                .await
                .map_err(|e| {
                    warn!("TLS handshake with {} failed: {:?}", url.host, e);
                    HttpError::Tls
                })?;
                let body = http::get(&mut tls, url, &mut self.head, DEFAULT_MAX_BODY).await;
                if let Err((mut socket, _)) = tls.close().await {
                    socket.abort();
                }
                return body;
            }
        };

        socket.close();
        body
    }
}
