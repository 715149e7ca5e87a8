use std::collections::hash_map::Entry;
use std::net::SocketAddr;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use crate::header::FragmentHeader;

/// In-progress reassembly of one message from one peer. Slots are addressed by fragment index,
///  so the order in which fragments arrive does not matter.
struct ReassemblyBuffer {
    serial: u64,
    slots: Vec<Option<Vec<u8>>>,
    /// number of *distinct* slots that are filled
    num_filled: usize,
}
impl ReassemblyBuffer {
    fn new(serial: u64, total: u32) -> ReassemblyBuffer {
        ReassemblyBuffer {
            serial,
            slots: vec![None; total as usize],
            num_filled: 0,
        }
    }

    fn total(&self) -> usize {
        self.slots.len()
    }

    fn is_complete(&self) -> bool {
        self.num_filled == self.total()
    }

    fn store(&mut self, index: u32, payload: &[u8]) {
        let slot = &mut self.slots[index as usize];
        if slot.is_none() {
            self.num_filled += 1;
        }
        else {
            trace!("duplicate fragment {} of message #{} - overwriting", index, self.serial);
        }
        *slot = Some(payload.to_vec());
    }

    fn assemble(self) -> Vec<u8> {
        let len = self.slots.iter()
            .map(|s| s.as_ref().map(Vec::len).unwrap_or(0))
            .sum();

        let mut result = Vec::with_capacity(len);
        for slot in self.slots.into_iter().flatten() {
            result.extend_from_slice(&slot);
        }
        result
    }
}

/// Per-peer reassembly state of a receiver. There is at most one message in flight per peer:
///  a fragment with a higher serial number than the message currently being assembled discards
///  that message, and fragments with lower serial numbers are stragglers that are dropped.
///
/// This bounds memory per peer to the fragments of a single message, at the price of losing
///  messages whose fragments are interleaved with the next message's fragments on the wire.
///
/// NB: Completion is tracked by the number of distinct fragment indices received, so duplicated
///      packets can not complete a message prematurely
pub struct ReassemblyTable {
    max_fragments_per_message: u32,
    buffers: FxHashMap<SocketAddr, ReassemblyBuffer>,
}

impl ReassemblyTable {
    pub fn new(max_fragments_per_message: u32) -> ReassemblyTable {
        ReassemblyTable {
            max_fragments_per_message,
            buffers: Default::default(),
        }
    }

    /// Returns the complete message if this fragment was the last one missing
    pub fn ingest(&mut self, from: SocketAddr, header: &FragmentHeader, payload: &[u8]) -> Option<Vec<u8>> {
        if !header.is_consistent() {
            debug!("received inconsistent fragment header {:?} from {:?} - dropping", header, from);
            return None;
        }
        if header.total > self.max_fragments_per_message {
            debug!("received fragment {:?} from {:?} exceeding the maximum of {} fragments per message - dropping", header, from, self.max_fragments_per_message);
            return None;
        }

        let buffer = match self.buffers.entry(from) {
            Entry::Vacant(e) => {
                trace!("starting reassembly of message #{} from {:?}", header.serial, from);
                e.insert(ReassemblyBuffer::new(header.serial, header.total))
            }
            Entry::Occupied(e) => {
                let buffer = e.into_mut();
                if header.serial > buffer.serial {
                    debug!("message #{} from {:?} superseded by #{} with {} of {} fragments received - discarding", buffer.serial, from, header.serial, buffer.num_filled, buffer.total());
                    *buffer = ReassemblyBuffer::new(header.serial, header.total);
                }
                else if header.serial < buffer.serial {
                    debug!("received fragment {:?} from {:?} while assembling #{} - dropping", header, from, buffer.serial);
                    return None;
                }
                else if header.total as usize != buffer.total() {
                    debug!("received fragment {:?} from {:?} for a message of {} fragments - dropping", header, from, buffer.total());
                    return None;
                }
                buffer
            }
        };

        buffer.store(header.index, payload);
        if !buffer.is_complete() {
            return None;
        }

        let buffer = self.buffers.remove(&from)?;
        trace!("message #{} from {:?} is complete", buffer.serial, from);
        Some(buffer.assemble())
    }

    /// The serial number of the message currently being assembled from a peer, if any
    pub fn in_flight_serial(&self, from: &SocketAddr) -> Option<u64> {
        self.buffers.get(from)
            .map(|b| b.serial)
    }

    pub fn num_in_flight(&self) -> usize {
        self.buffers.len()
    }
}
