use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use bytes::{BufMut, BytesMut};
use tracing::{debug, trace, warn};
use crate::error::SplitError;
use crate::header::FragmentHeader;
use crate::socket::PacketWriter;
use crate::util::snapshot_map::SnapshotMap;

/// Splits messages into fragments that each fit into a single physical packet, and writes them
///  to the destination one after the other.
///
/// Each destination has its own serial number counter, so the receiver can tell fragments of
///  different messages apart. The counters are shared by all concurrent callers: sending to
///  different destinations does not contend on anything, and concurrent sends to the same
///  destination each get a distinct serial number.
///
/// There is no acknowledgement and no retransmission. If a write fails, fragments that were
///  already written stay written, and the receiver discards the incomplete message once it
///  sees the next serial number.
pub struct FragmentSender {
    payload_size: usize,
    serials: SnapshotMap<SocketAddr, Arc<AtomicU64>>,
    writer: Arc<dyn PacketWriter>,
}

impl FragmentSender {
    pub fn new(max_packet_size: usize, writer: Arc<dyn PacketWriter>) -> Result<FragmentSender, SplitError> {
        if max_packet_size <= FragmentHeader::SERIALIZED_LEN {
            return Err(SplitError::Configuration(format!(
                "send packet size {} leaves no room for payload after the {} byte fragment header",
                max_packet_size, FragmentHeader::SERIALIZED_LEN,
            )));
        }

        Ok(FragmentSender {
            payload_size: max_packet_size - FragmentHeader::SERIALIZED_LEN,
            serials: Default::default(),
            writer,
        })
    }

    /// The maximum number of message bytes carried by a single fragment
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn num_fragments(&self, message_len: usize) -> usize {
        message_len.div_ceil(self.payload_size)
    }

    fn fragment_total(&self, message_len: usize) -> Result<u32, SplitError> {
        self.num_fragments(message_len).try_into()
            .map_err(|_| SplitError::MessageTooLarge { len: message_len, payload_size: self.payload_size })
    }

    fn next_serial(&self, to: SocketAddr) -> u64 {
        self.serials.get_or_insert_with(&to, Default::default)
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1)
    }

    /// Returns the number of bytes written, including fragment headers. An empty message
    ///  uses up a serial number but sends nothing.
    pub async fn send(&self, message: &[u8], to: SocketAddr) -> Result<usize, SplitError> {
        let total = self.fragment_total(message.len())?;

        let serial = self.next_serial(to);
        if total == 0 {
            debug!("empty message #{} to {:?} - not sending anything", serial, to);
            return Ok(0);
        }

        trace!("sending message #{} to {:?}: {} bytes in {} fragments", serial, to, message.len(), total);

        let mut bytes_written = 0;
        let mut packet_buf = BytesMut::with_capacity(FragmentHeader::SERIALIZED_LEN + self.payload_size);
        for (index, chunk) in (0..total).zip(message.chunks(self.payload_size)) {
            packet_buf.clear();
            FragmentHeader::new(serial, index, total).ser(&mut packet_buf);
            packet_buf.put_slice(chunk);

            match self.writer.write_to(&packet_buf, to).await {
                Ok(n) => bytes_written += n,
                Err(e) => {
                    warn!("error sending fragment {} of {} of message #{} to {:?}: {}", index, total, serial, to, e);
                    return Err(SplitError::Transport { bytes_written, source: e });
                }
            }
        }
        Ok(bytes_written)
    }
}
