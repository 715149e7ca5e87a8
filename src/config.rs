use std::net::SocketAddr;
use std::time::Duration;
use crate::error::SplitError;
use crate::header::FragmentHeader;

pub struct SplitConfig {
    pub self_addr: SocketAddr,

    /// This is the maximum size of UDP payload that is sent in a single packet, i.e. fragment
    ///  header plus fragment payload. Fragmenting is done by this library precisely so that
    ///  packets are not fragmented at the IP level, so this must be supported by all network
    ///  connections between peers.
    ///
    /// With full Ethernet frames and no optional IP headers, this is `1500 - 20 - 8 = 1472`
    ///  for IPV4 and `1500 - 40 - 8 = 1452` for IPV6.
    pub send_packet_size: usize,

    /// The size of the receive buffer for a single packet. Packets longer than this are
    ///  truncated by the socket and corrupt the message they belong to, so this should not be
    ///  smaller than the peers' `send_packet_size`.
    pub recv_packet_size: usize,

    /// Upper bound for a single blocking read. This is the latency with which shutdown is
    ///  noticed by the receive loop. `None` means that the receive loop is only checked for
    ///  shutdown when packets arrive.
    pub read_timeout: Option<Duration>,

    /// Fragments announcing more fragments per message are dropped. This bounds the memory
    ///  a single peer can make the receiver allocate.
    pub max_fragments_per_message: u32,

    /// The number of complete messages buffered for the application. The receive loop stops
    ///  reading from the socket while this queue is full.
    pub recv_queue_size: usize,

    /// Socket errors are passed on to the application through the receive queue. After this many
    ///  errors without a complete message in between, the receive loop gives up and the queue is
    ///  closed.
    pub max_consecutive_read_errors: u32,
}

impl SplitConfig {
    pub fn new(self_addr: SocketAddr) -> SplitConfig {
        SplitConfig {
            self_addr,
            send_packet_size: 1472,
            recv_packet_size: 1472,
            read_timeout: Some(Duration::from_millis(100)),
            max_fragments_per_message: 65536,
            recv_queue_size: 1,
            max_consecutive_read_errors: 10,
        }
    }

    pub fn validate(&self) -> Result<(), SplitError> {
        if self.send_packet_size <= FragmentHeader::SERIALIZED_LEN {
            return Err(SplitError::Configuration(format!("send packet size {} must be greater than the fragment header size {}", self.send_packet_size, FragmentHeader::SERIALIZED_LEN)));
        }
        if self.recv_packet_size <= FragmentHeader::SERIALIZED_LEN {
            return Err(SplitError::Configuration(format!("receive packet size {} must be greater than the fragment header size {}", self.recv_packet_size, FragmentHeader::SERIALIZED_LEN)));
        }
        if self.max_fragments_per_message == 0 {
            return Err(SplitError::Configuration("maximum number of fragments per message must not be 0".to_string()));
        }
        if self.recv_queue_size == 0 {
            return Err(SplitError::Configuration("receive queue size must not be 0".to_string()));
        }
        if self.max_consecutive_read_errors == 0 {
            return Err(SplitError::Configuration("maximum number of consecutive read errors must not be 0".to_string()));
        }
        Ok(())
    }
}
