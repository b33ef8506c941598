//! Plain HTTP/1.0 `GET` over an embassy-net TCP socket.

use core::net::Ipv4Addr;

use embassy_net::{
    IpAddress, IpEndpoint, Stack,
    dns::{self, DnsQueryType},
    tcp::{self, ConnectError, TcpSocket},
};
use embassy_time::Duration;
use log::{info, warn};
use medbox_core::sync::{
    Transport,
    protocol::{Endpoint, encode_query, split_response},
};

const SOCKET_BUFFER_BYTES: usize = 1024;
const RAW_RESPONSE_BYTES: usize = 2048;
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum HttpError {
    BadEndpoint,
    NoAddress,
    Dns(dns::Error),
    Connect(ConnectError),
    Io(tcp::Error),
    BadResponse,
}

pub struct HttpTransport<'d> {
    stack: Stack<'d>,
}

impl<'d> HttpTransport<'d> {
    pub fn new(stack: Stack<'d>) -> Self {
        Self { stack }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, HttpError> {
        if let Ok(address) = host.parse::<Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(address));
        }
        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(HttpError::Dns)?;
        addresses.first().copied().ok_or(HttpError::NoAddress)
    }
}

impl Transport for HttpTransport<'_> {
    type Error = HttpError;

    async fn get(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
        body: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let target = Endpoint::parse(endpoint).ok_or(HttpError::BadEndpoint)?;
        let request = target.get_request(&encode_query(params));
        let address = self.resolve(target.host).await?;

        let mut rx_buf = [0u8; SOCKET_BUFFER_BYTES];
        let mut tx_buf = [0u8; SOCKET_BUFFER_BYTES];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)));

        socket
            .connect(IpEndpoint::new(address, target.port))
            .await
            .map_err(HttpError::Connect)?;

        let mut written = 0usize;
        let request = request.as_bytes();
        while written < request.len() {
            written += socket
                .write(&request[written..])
                .await
                .map_err(HttpError::Io)?;
        }

        let mut raw = [0u8; RAW_RESPONSE_BYTES];
        let mut total = 0usize;
        loop {
            let n = socket.read(&mut raw[total..]).await.map_err(HttpError::Io)?;
            if n == 0 {
                break;
            }
            total += n;
            if total >= RAW_RESPONSE_BYTES {
                warn!("http: response truncated at {RAW_RESPONSE_BYTES} bytes");
                break;
            }
        }
        socket.close();

        let (status, payload) = split_response(&raw[..total]).ok_or(HttpError::BadResponse)?;
        info!("http: status={status} body_len={}", payload.len());

        let len = payload.len().min(body.len());
        body[..len].copy_from_slice(&payload[..len]);
        Ok(len)
    }
}
