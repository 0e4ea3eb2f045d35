//! Runtime service: drives one [`Node`] over UDP at a fixed cadence.
//!
//! The service owns the socket, the node, and the tick clock, and runs the
//! whole protocol inside a single task: advance the clock, then let the node
//! drain its inbound queue and gossip. There is no blocking wait inside a
//! tick — all socket I/O is non-blocking and best-effort.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time;
use tracing::info;

use crate::clock::TickClock;
use crate::config::ProtocolConfig;
use crate::transport::UdpTransport;

use super::node::{MembershipError, Node};
use super::types::{LogObserver, PeerId};

pub struct MembershipService {
    node: Node,
    transport: UdpTransport,
    clock: TickClock,
    tick_interval: Duration,
    observer: LogObserver,
}

impl MembershipService {
    /// Binds the gossip socket and builds the node, but does not start it.
    pub async fn new(
        bind_addr: SocketAddr,
        config: ProtocolConfig,
        tick_interval: Duration,
    ) -> Result<Self> {
        let transport = UdpTransport::bind(bind_addr).await?;
        let local_addr = transport.local_addr()?;
        let id = PeerId::from_socket_addr(local_addr)
            .context("gossip endpoints must be IPv4 addresses")?;
        let node = Node::new(id, config)?;
        info!("membership service listening on {}", local_addr);

        Ok(Self {
            node,
            transport,
            clock: TickClock::new(),
            tick_interval,
            observer: LogObserver,
        })
    }

    pub fn local_id(&self) -> PeerId {
        self.node.id()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Bootstraps the node (seed the group, or send the first join request).
    pub fn start(&mut self) {
        self.node
            .start(&mut self.transport, &self.clock, &self.observer);
    }

    /// Advances the clock by one tick and runs the node's duty cycle.
    pub fn step(&mut self) -> Result<(), MembershipError> {
        self.clock.advance(1);
        self.node
            .tick(&mut self.transport, &self.clock, &self.observer)
    }

    /// Runs the protocol until a tick reports a fatal error (initialization
    /// or join timeout).
    pub async fn run(mut self) -> Result<()> {
        self.start();

        let mut interval = time::interval(self.tick_interval);
        loop {
            interval.tick().await;
            self.step()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn service_binds_and_identifies_itself() {
        let rendezvous = PeerId::new(u32::from(Ipv4Addr::LOCALHOST), 9);
        let service = MembershipService::new(
            "127.0.0.1:0".parse().unwrap(),
            ProtocolConfig::new(rendezvous),
            Duration::from_millis(50),
        )
        .await
        .expect("failed to create service");

        let id = service.local_id();
        assert_eq!(Ipv4Addr::from(id.host), Ipv4Addr::LOCALHOST);
        assert_ne!(id.port, 0);
        assert!(!service.node().in_group());
    }

    #[tokio::test]
    async fn joiner_joins_introducer_over_udp() {
        // The introducer's rendezvous identity is only known after binding an
        // ephemeral port, so bootstrap in two stages.
        let placeholder = PeerId::new(u32::from(Ipv4Addr::LOCALHOST), 1);
        let mut introducer = MembershipService::new(
            "127.0.0.1:0".parse().unwrap(),
            ProtocolConfig::new(placeholder),
            Duration::from_millis(20),
        )
        .await
        .unwrap();
        let rendezvous = introducer.local_id();
        introducer.node = Node::new(rendezvous, ProtocolConfig::new(rendezvous)).unwrap();

        let mut joiner = MembershipService::new(
            "127.0.0.1:0".parse().unwrap(),
            ProtocolConfig::new(rendezvous),
            Duration::from_millis(20),
        )
        .await
        .unwrap();

        introducer.start();
        joiner.start();

        // Join request → reply → joiner admitted, with pauses for delivery.
        for _ in 0..10 {
            time::sleep(Duration::from_millis(20)).await;
            introducer.step().unwrap();
            joiner.step().unwrap();
            if joiner.node().in_group() {
                break;
            }
        }

        assert!(joiner.node().in_group());
        assert!(joiner.node().table().contains(&rendezvous));
        assert!(introducer.node().table().contains(&joiner.local_id()));
    }
}
