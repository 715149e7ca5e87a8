use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::receiver::FragmentReceiver;
use crate::sender::FragmentSender;

/// Pause after a socket error, multiplied by the number of errors in a row
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(10);

type QueueItem = Result<ReceivedMessage, SplitError>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceivedMessage {
    pub from: SocketAddr,
    pub payload: Vec<u8>,
}

/// EndPoint is where sending and receiving come together on a single UDP socket: messages sent
///  through it are fragmented, and a background task reads and reassembles incoming fragments,
///  queueing complete messages for the application.
///
/// The same end point can talk to any number of peers, acting as client or server.
pub struct EndPoint {
    self_addr: SocketAddr,
    sender: Arc<FragmentSender>,
    incoming: mpsc::Receiver<QueueItem>,
    cancel: CancellationToken,
    recv_handle: JoinHandle<()>,
}

impl Drop for EndPoint {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.recv_handle.abort();
    }
}

impl EndPoint {
    pub async fn bind(config: &SplitConfig) -> Result<EndPoint, SplitError> {
        config.validate()?;

        let socket = UdpSocket::bind(config.self_addr).await
            .map_err(|e| SplitError::transport(e.into()))?;
        let self_addr = socket.local_addr()
            .map_err(|e| SplitError::transport(e.into()))?;
        info!("bound UDP socket to {:?}", self_addr);

        let socket = Arc::new(socket);
        let sender = Arc::new(FragmentSender::new(config.send_packet_size, socket.clone())?);
        let receiver = FragmentReceiver::new(
            config.recv_packet_size,
            config.max_fragments_per_message,
            socket,
            config.read_timeout,
        )?;

        let (queue, incoming) = mpsc::channel(config.recv_queue_size);
        let cancel = CancellationToken::new();
        let recv_handle = tokio::spawn(Self::recv_loop(receiver, queue, cancel.clone(), config.max_consecutive_read_errors));

        Ok(EndPoint {
            self_addr,
            sender,
            incoming,
            cancel,
            recv_handle,
        })
    }

    pub fn self_addr(&self) -> SocketAddr {
        self.self_addr
    }

    /// Fragments and sends a message, returning the number of bytes written to the socket
    pub async fn send(&self, message: &[u8], to: SocketAddr) -> Result<usize, SplitError> {
        self.sender.send(message, to).await
    }

    /// A handle for sending from other tasks, e.g. to broadcast to many peers concurrently
    pub fn sender(&self) -> Arc<FragmentSender> {
        self.sender.clone()
    }

    /// Waits for the next complete message, or the next socket error. Returns `None` once the
    ///  end point is shut down (or gave up after repeated socket errors) and everything queued
    ///  was consumed.
    pub async fn recv(&mut self) -> Option<Result<ReceivedMessage, SplitError>> {
        self.incoming.recv().await
    }

    /// Stops the receive loop. It notices this between reads, i.e. with a delay of up to the
    ///  configured read timeout.
    pub fn shutdown(&self) {
        debug!("shutting down end point {:?}", self.self_addr);
        self.cancel.cancel();
    }

    async fn recv_loop(mut receiver: FragmentReceiver, queue: mpsc::Sender<QueueItem>, cancel: CancellationToken, max_consecutive_errors: u32) {
        info!("starting receive loop");

        let mut consecutive_errors = 0;
        loop {
            let item = match receiver.recv(&cancel).await {
                Ok((payload, from)) => {
                    trace!("received message of {} bytes from {:?}", payload.len(), from);
                    consecutive_errors = 0;
                    Ok(ReceivedMessage { from, payload })
                }
                Err(SplitError::Cancelled) => break,
                Err(SplitError::ReadTimeout(_)) => continue,
                Err(e) => {
                    consecutive_errors += 1;
                    warn!("socket error #{} in a row: {}", consecutive_errors, e);
                    Err(e)
                }
            };

            select! {
                result = queue.send(item) => {
                    if result.is_err() {
                        debug!("receive queue was closed");
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }

            if consecutive_errors >= max_consecutive_errors {
                error!("{} socket errors in a row - giving up", consecutive_errors);
                break;
            }
            if consecutive_errors > 0 {
                select! {
                    _ = sleep(READ_ERROR_BACKOFF * consecutive_errors) => {}
                    _ = cancel.cancelled() => break,
                }
            }
        }

        info!("receive loop stopped");
    }
}
