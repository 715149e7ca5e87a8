//! Test doubles for the packet transport, shared by the unit tests of several modules

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Mutex;
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use tokio::sync::mpsc;
use crate::header::FragmentHeader;
use crate::socket::{PacketReader, PacketWriter};

/// convenience for unit test code: the same number always gives the same address
pub fn test_addr(number: u16) -> SocketAddr {
    SocketAddr::from(([1,2,3,4], number))
}

pub fn run_paused<F: Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(f)
}

pub fn encode_fragment(header: FragmentHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    header.ser(&mut buf);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Records all written packets, always succeeding
#[derive(Default)]
pub struct RecordingWriter {
    packets: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
}
impl RecordingWriter {
    pub fn packets(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.packets.lock().unwrap().clone()
    }

    pub fn headers(&self) -> Vec<FragmentHeader> {
        self.packets().iter()
            .map(|(_, packet)| FragmentHeader::deser(&mut packet.as_slice()).unwrap())
            .collect()
    }
}

#[async_trait]
impl PacketWriter for RecordingWriter {
    async fn write_to(&self, packet_buf: &[u8], to: SocketAddr) -> anyhow::Result<usize> {
        self.packets.lock().unwrap().push((to, packet_buf.to_vec()));
        Ok(packet_buf.len())
    }
}

pub type ReadResult = anyhow::Result<(SocketAddr, Vec<u8>)>;

/// Hands out whatever the test pushes into the channel, blocking while the channel is empty
///  like a socket without traffic
pub struct ChannelReader {
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ReadResult>>,
}

pub fn channel_reader() -> (mpsc::UnboundedSender<ReadResult>, ChannelReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelReader { rx: tokio::sync::Mutex::new(rx) })
}

#[async_trait]
impl PacketReader for ChannelReader {
    async fn read_from(&self, buf: &mut [u8]) -> anyhow::Result<(usize, SocketAddr)> {
        match self.rx.lock().await.recv().await {
            Some(Ok((from, packet))) => {
                // truncate like a datagram socket does
                let n = packet.len().min(buf.len());
                buf[..n].copy_from_slice(&packet[..n]);
                Ok((n, from))
            }
            Some(Err(e)) => Err(e),
            None => Err(anyhow::anyhow!("socket closed")),
        }
    }
}
