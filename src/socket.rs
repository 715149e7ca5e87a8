use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::trace;

/// Write side of a packet transport, introduced to facilitate mocking the I/O part away for
///  testing. Each call writes exactly one physical packet.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PacketWriter: Send + Sync + 'static {
    async fn write_to(&self, packet_buf: &[u8], to: SocketAddr) -> anyhow::Result<usize>;
}

/// Read side of a packet transport: reads one physical packet into `buf`, returning its length
///  and the sender's address. This may suspend indefinitely - bounding it is the caller's job.
#[async_trait]
pub trait PacketReader: Send + Sync + 'static {
    async fn read_from(&self, buf: &mut [u8]) -> anyhow::Result<(usize, SocketAddr)>;
}

#[async_trait]
impl PacketWriter for UdpSocket {
    async fn write_to(&self, packet_buf: &[u8], to: SocketAddr) -> anyhow::Result<usize> {
        trace!("UDP socket: sending packet of {} bytes to {:?}", packet_buf.len(), to);
        Ok(self.send_to(packet_buf, to).await?)
    }
}

#[async_trait]
impl PacketReader for UdpSocket {
    async fn read_from(&self, buf: &mut [u8]) -> anyhow::Result<(usize, SocketAddr)> {
        Ok(self.recv_from(buf).await?)
    }
}
