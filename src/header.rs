use std::fmt::{Debug, Formatter};
use bytes::{Buf, BufMut};
use crate::error::SplitError;

/// Header in front of every fragment's payload - all numbers in network byte order (BE):
///
/// ```ascii
///  0: serial number (u64) - per destination, incremented for each message
///  8: fragment index (u32) - zero-based position of this fragment in its message
/// 12: fragment total (u32) - number of fragments making up the message
/// ```
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct FragmentHeader {
    pub serial: u64,
    pub index: u32,
    pub total: u32,
}

impl Debug for FragmentHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FRAG{{#{}:{}/{}}}", self.serial, self.index, self.total)
    }
}

impl FragmentHeader {
    pub const SERIALIZED_LEN: usize = size_of::<u64>() + size_of::<u32>() + size_of::<u32>();

    pub fn new(serial: u64, index: u32, total: u32) -> FragmentHeader {
        FragmentHeader { serial, index, total }
    }

    /// A header can be decoded without being meaningful - this checks the invariants that the
    ///  sender guarantees for every fragment it produces
    pub fn is_consistent(&self) -> bool {
        self.total > 0 && self.index < self.total
    }

    pub fn ser(&self, buf: &mut impl BufMut) {
        buf.put_u64(self.serial);
        buf.put_u32(self.index);
        buf.put_u32(self.total);
    }

    /// Reads the header, leaving `buf` positioned at the start of the payload
    pub fn deser(buf: &mut impl Buf) -> Result<FragmentHeader, SplitError> {
        if buf.remaining() < Self::SERIALIZED_LEN {
            return Err(SplitError::MalformedHeader { len: buf.remaining() });
        }

        Ok(FragmentHeader {
            serial: buf.get_u64(),
            index: buf.get_u32(),
            total: buf.get_u32(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use rstest::rstest;

    #[rstest]
    #[case::zero(FragmentHeader::new(0, 0, 1), vec![0,0,0,0,0,0,0,0, 0,0,0,0, 0,0,0,1])]
    #[case::first_serial(FragmentHeader::new(1, 2, 3), vec![0,0,0,0,0,0,0,1, 0,0,0,2, 0,0,0,3])]
    #[case::byte_order(FragmentHeader::new(0x0102_0304_0506_0708, 0x090a_0b0c, 0x0d0e_0f10), vec![1,2,3,4,5,6,7,8, 9,10,11,12, 13,14,15,16])]
    #[case::max(FragmentHeader::new(u64::MAX, u32::MAX - 1, u32::MAX), vec![255,255,255,255,255,255,255,255, 255,255,255,254, 255,255,255,255])]
    fn test_ser(#[case] header: FragmentHeader, #[case] expected: Vec<u8>) {
        let mut buf = BytesMut::new();
        header.ser(&mut buf);
        assert_eq!(buf.as_ref(), expected.as_slice());
        assert_eq!(buf.len(), FragmentHeader::SERIALIZED_LEN);

        let mut b: &[u8] = &expected;
        assert_eq!(FragmentHeader::deser(&mut b).unwrap(), header);
        assert!(b.is_empty());
    }

    #[test]
    fn test_deser_leaves_payload() {
        let mut buf = BytesMut::new();
        FragmentHeader::new(7, 1, 2).ser(&mut buf);
        buf.put_slice(b"payload");

        let mut b: &[u8] = &buf;
        let header = FragmentHeader::deser(&mut b).unwrap();
        assert_eq!(header, FragmentHeader::new(7, 1, 2));
        assert_eq!(b, b"payload");
    }

    #[rstest]
    #[case::empty(0)]
    #[case::one(1)]
    #[case::serial_only(8)]
    #[case::one_short(15)]
    fn test_deser_too_short(#[case] len: usize) {
        let raw = vec![0u8; len];
        let mut b: &[u8] = &raw;
        match FragmentHeader::deser(&mut b) {
            Err(SplitError::MalformedHeader { len: actual }) => assert_eq!(actual, len),
            other => panic!("expected MalformedHeader, got {:?}", other),
        }
    }

    #[rstest]
    #[case::single(FragmentHeader::new(1, 0, 1), true)]
    #[case::last(FragmentHeader::new(1, 4, 5), true)]
    #[case::zero_total(FragmentHeader::new(1, 0, 0), false)]
    #[case::index_is_total(FragmentHeader::new(1, 5, 5), false)]
    #[case::index_beyond_total(FragmentHeader::new(1, 9, 5), false)]
    fn test_is_consistent(#[case] header: FragmentHeader, #[case] expected: bool) {
        assert_eq!(header.is_consistent(), expected);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", FragmentHeader::new(12, 3, 4)), "FRAG{#12:3/4}");
    }
}
