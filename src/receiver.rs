use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use crate::error::SplitError;
use crate::header::FragmentHeader;
use crate::reassembly::ReassemblyTable;
use crate::socket::PacketReader;

/// Reads fragments from a packet transport and reassembles them into messages.
///
/// `recv` takes `&mut self`, so there is exactly one read in flight per receiver. Corrupt,
///  truncated and stale fragments are dropped silently; only transport failures and
///  cancellation end a call to `recv`.
pub struct FragmentReceiver {
    reader: Arc<dyn PacketReader>,
    read_timeout: Option<Duration>,
    read_buf: Vec<u8>,
    reassembly: ReassemblyTable,
}

impl FragmentReceiver {
    /// `read_timeout` bounds each individual read. Cancellation is checked between reads,
    ///  so without a timeout a cancellation is only noticed when the next packet arrives.
    pub fn new(
        max_packet_size: usize,
        max_fragments_per_message: u32,
        reader: Arc<dyn PacketReader>,
        read_timeout: Option<Duration>,
    ) -> Result<FragmentReceiver, SplitError> {
        if max_packet_size <= FragmentHeader::SERIALIZED_LEN {
            return Err(SplitError::Configuration(format!(
                "receive packet size {} leaves no room for payload after the {} byte fragment header",
                max_packet_size, FragmentHeader::SERIALIZED_LEN,
            )));
        }

        Ok(FragmentReceiver {
            reader,
            read_timeout,
            read_buf: vec![0; max_packet_size],
            reassembly: ReassemblyTable::new(max_fragments_per_message),
        })
    }

    /// Reads packets until a message is complete, returning it together with its sender.
    ///
    /// The cancellation token is checked before each read, and a read that runs into its
    ///  timeout after cancellation was requested returns `Cancelled` as well. A timeout without
    ///  cancellation returns `ReadTimeout`; partially assembled messages are kept across calls.
    pub async fn recv(&mut self, cancel: &CancellationToken) -> Result<(Vec<u8>, SocketAddr), SplitError> {
        loop {
            if cancel.is_cancelled() {
                return Err(SplitError::Cancelled);
            }

            let read = self.reader.read_from(&mut self.read_buf);
            let read_result = match self.read_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, read).await {
                    Ok(result) => result,
                    Err(_) if cancel.is_cancelled() => return Err(SplitError::Cancelled),
                    Err(_) => return Err(SplitError::ReadTimeout(timeout)),
                },
                None => read.await,
            };
            let (num_read, from) = read_result.map_err(SplitError::transport)?;

            let parse_buf = &mut &self.read_buf[..num_read];
            let header = match FragmentHeader::deser(parse_buf) {
                Ok(header) => header,
                Err(_) => {
                    trace!("received {} byte packet from {:?}, too short for a fragment header - dropping", num_read, from);
                    continue;
                }
            };
            trace!("received fragment {:?} from {:?} with {} bytes of payload", header, from, parse_buf.len());

            if let Some(message) = self.reassembly.ingest(from, &header, parse_buf) {
                return Ok((message, from));
            }
        }
    }
}
