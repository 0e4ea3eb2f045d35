//! UDP transport for real deployments.

use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::warn;

use super::Transport;
use crate::membership::types::PeerId;

/// Non-blocking transport over a bound UDP socket.
///
/// Sends use `try_send_to`, drains use `try_recv_from` until the socket has
/// nothing more to give. Neither blocks, so the per-tick atomicity of the
/// protocol loop is preserved inside a single task. Send failures are logged
/// and swallowed; UDP is best-effort and so is the protocol.
pub struct UdpTransport {
    socket: UdpSocket,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            recv_buf: vec![0u8; 64 * 1024],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, _from: PeerId, to: PeerId, payload: Bytes) {
        if let Err(e) = self.socket.try_send_to(&payload, to.socket_addr()) {
            warn!("failed to send {} bytes to {}: {}", payload.len(), to, e);
        }
    }

    fn drain_inbound(&mut self, _node: PeerId) -> Vec<Bytes> {
        let mut inbound = Vec::new();
        loop {
            match self.socket.try_recv_from(&mut self.recv_buf) {
                Ok((len, _src)) => inbound.push(Bytes::copy_from_slice(&self.recv_buf[..len])),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("failed to receive UDP packet: {}", e);
                    break;
                }
            }
        }
        inbound
    }
}
