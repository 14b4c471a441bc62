use crate::{info, log, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use strum_macros::Display;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

#[derive(Debug, Display)]
pub enum TransportError {
    InvalidEndpoint(String),
    ConnectTimeout,
    Io(std::io::Error),
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self { TransportError::Io(value) }
}

/// Client side of the persistent CoT link to the TAK server.
///
/// One instance is shared by every tracking session. The socket lives behind
/// a mutex, so concurrent senders can never interleave partial writes; at
/// most one socket is live at any time.
pub struct TakClient {
    host: String,
    port: u16,
    stream: Mutex<Option<TcpStream>>,
    connected: AtomicBool,
    reconnecting: AtomicBool,
}

impl TakClient {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const SEND_RETRY_INTERVAL: Duration = Duration::from_secs(30);
    const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
    const PROBE_TIMEOUT: Duration = Duration::from_millis(10);

    /// Parses a `tcp://host:port` endpoint. Rejecting a bad endpoint here
    /// keeps every later connect attempt infallible in its addressing.
    pub fn new(cot_url: &str) -> Result<TakClient, TransportError> {
        let invalid = || TransportError::InvalidEndpoint(cot_url.to_string());
        let rest = cot_url.strip_prefix("tcp://").ok_or_else(invalid)?;
        let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(TakClient {
            host: host.to_string(),
            port,
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
            reconnecting: AtomicBool::new(false),
        })
    }

    pub fn is_connected(&self) -> bool { self.connected.load(Ordering::SeqCst) }

    /// Opens a fresh connection, tearing down any prior socket first.
    pub async fn connect(&self) -> Result<(), TransportError> {
        let mut slot = self.stream.lock().await;
        self.connect_locked(&mut slot).await
    }

    async fn connect_locked(&self, slot: &mut Option<TcpStream>) -> Result<(), TransportError> {
        if slot.take().is_some() {
            self.connected.store(false, Ordering::SeqCst);
        }
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match tokio::time::timeout(Self::CONNECT_TIMEOUT, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(_) => return Err(TransportError::ConnectTimeout),
        };
        // Flush every CoT message immediately instead of coalescing.
        stream.set_nodelay(true)?;
        info!("Connected to TAK server at {}:{}", self.host, self.port);
        *slot = Some(stream);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Delivers one message, retrying until it has been written in full.
    /// Delivery is never abandoned, only delayed: a failed connect attempt
    /// pauses for `SEND_RETRY_INTERVAL`, a failed write drops the socket and
    /// goes straight back to connecting.
    pub async fn send(&self, message: &[u8]) {
        loop {
            let mut slot = self.stream.lock().await;
            if slot.is_none() {
                if let Err(e) = self.connect_locked(&mut slot).await {
                    drop(slot);
                    warn!(
                        "Connection to TAK server failed: {e:?}. Retrying in {}s",
                        Self::SEND_RETRY_INTERVAL.as_secs()
                    );
                    tokio::time::sleep(Self::SEND_RETRY_INTERVAL).await;
                    continue;
                }
            }
            let Some(stream) = slot.as_mut() else { continue };
            match stream.write_all(message).await {
                Ok(()) => return,
                Err(e) => {
                    warn!("Failed to send CoT message: {e}");
                    *slot = None;
                    self.connected.store(false, Ordering::SeqCst);
                }
            }
        }
    }

    /// Non-blocking liveness probe: peeks for a zero-length read to spot a
    /// half-closed peer without consuming data, reconnecting once if so.
    pub async fn ensure_connected(&self) {
        let mut slot = self.stream.lock().await;
        let Some(stream) = slot.as_mut() else {
            let _ = self.connect_locked(&mut slot).await;
            return;
        };
        let mut probe = [0_u8; 1];
        match tokio::time::timeout(Self::PROBE_TIMEOUT, stream.peek(&mut probe)).await {
            // Nothing readable within the probe window: the link looks healthy.
            Err(_) => {}
            Ok(Ok(n)) if n > 0 => {}
            Ok(_) => {
                warn!("TAK server closed the connection");
                *slot = None;
                self.connected.store(false, Ordering::SeqCst);
                let _ = self.connect_locked(&mut slot).await;
            }
        }
    }

    /// Launches at most one background reconnect loop; it exits as soon as a
    /// connection succeeds.
    pub fn start_background_reconnect(self: &Arc<Self>) {
        if self.reconnecting.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Self::RECONNECT_INTERVAL).await;
                match client.connect().await {
                    Ok(()) => break,
                    Err(e) => log!("Reconnect attempt to TAK server failed: {e:?}"),
                }
            }
            client.reconnecting.store(false, Ordering::SeqCst);
        });
    }
}
