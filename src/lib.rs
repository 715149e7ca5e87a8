//! Sending messages that are bigger than a single UDP packet, without acknowledgement or
//!  retransmission.
//!
//! Each message is split into fragments that fit into a packet together with a 16 byte header
//!  (all numbers big endian):
//!
//! ```ascii
//! 0:  serial (u64): per-destination message number, starting at 1
//! 8:  index (u32):  position of the fragment in the message
//! 12: total (u32):  number of fragments in the message
//! 16: payload
//! ```
//!
//! The receiver collects fragments per sending peer and delivers a message once all of its
//!  fragments arrived. A fragment with a newer serial number discards an incomplete older
//!  message, so a lost fragment costs the message it belongs to and nothing else.

pub mod config;
pub mod end_point;
pub mod error;
pub mod header;
pub mod reassembly;
pub mod receiver;
pub mod sender;
pub mod socket;
pub mod util;

#[cfg(test)]
mod testing;
