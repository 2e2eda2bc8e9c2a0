use std::io;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Owns the UDP socket and the peer's currently-believed address. The
/// socket itself never authenticates anything — that's the crypto
/// envelope's job (§4.2) — so callers must verify a datagram before
/// reporting its source here (§4.7).
pub struct RoamingSocket {
    socket: UdpSocket,
    peer_addr: Option<SocketAddr>,
}

impl RoamingSocket {
    pub async fn bind(local_addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(local_addr).await?;
        Ok(RoamingSocket { socket, peer_addr: None })
    }

    /// Binds `port` on `[::]`, with `IPV6_V6ONLY` disabled so a single
    /// socket accepts both IPv4 and IPv6 peers (§4.7). Falls back to
    /// IPv4-only `0.0.0.0:port` on platforms where dual-stack binding
    /// isn't available.
    pub async fn bind_dual_stack(port: u16) -> io::Result<Self> {
        match Self::bind_v6_dual_stack(port) {
            Ok(std_socket) => {
                std_socket.set_nonblocking(true)?;
                let socket = UdpSocket::from_std(std_socket)?;
                Ok(RoamingSocket { socket, peer_addr: None })
            }
            Err(_) => Self::bind(SocketAddr::new(std::net::Ipv4Addr::UNSPECIFIED.into(), port)).await,
        }
    }

    fn bind_v6_dual_stack(port: u16) -> io::Result<std::net::UdpSocket> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_only_v6(false)?;
        let addr: SocketAddr = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0).into();
        socket.bind(&addr.into())?;
        Ok(socket.into())
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Accepts a datagram from any source. The caller must authenticate
    /// the contents before calling `note_authentic_peer`.
    pub async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    /// A client that already knows the server's address (from the
    /// `MOSH_CONNECT` handshake line, §6) seeds it here before the first
    /// authenticated datagram arrives.
    pub fn set_initial_peer(&mut self, addr: SocketAddr) {
        self.peer_addr = Some(addr);
    }

    /// Called once a datagram from `addr` has authenticated. If `addr`
    /// differs from the currently-remembered peer, this is address
    /// roaming: the remembered address is updated so subsequent sends
    /// follow the peer to its new source.
    pub fn note_authentic_peer(&mut self, addr: SocketAddr) {
        if self.peer_addr != Some(addr) {
            log::info!("peer address updated to {addr}");
            self.peer_addr = Some(addr);
        }
    }

    /// Sends to the currently-remembered peer address. Fails with
    /// `NotConnected` if no peer has authenticated (or been seeded) yet.
    pub async fn send_to_peer(&self, bytes: &[u8]) -> io::Result<usize> {
        let addr = self
            .peer_addr
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no authenticated peer address yet"))?;
        self.socket.send_to(bytes, addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_before_any_peer_is_known_fails() {
        let socket = RoamingSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert!(socket.send_to_peer(b"hi").await.is_err());
    }

    #[tokio::test]
    async fn roams_to_a_new_source_address_on_authentication() {
        let mut a = RoamingSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b = RoamingSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b_addr = b.local_addr().unwrap();

        a.set_initial_peer(b_addr);
        a.send_to_peer(b"hello").await.unwrap();

        let mut buf = [0u8; 16];
        let (n, observed_from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        let mut c = RoamingSocket::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_eq!(c.peer_addr(), None);
        c.note_authentic_peer(observed_from);
        assert_eq!(c.peer_addr(), Some(observed_from));

        // a second datagram from a different address updates the peer again
        let other_addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        c.note_authentic_peer(other_addr);
        assert_eq!(c.peer_addr(), Some(other_addr));
    }
}
