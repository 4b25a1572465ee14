use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::protocol::{Datagram, MAX_DATAGRAM_SIZE};

/// How long a blocking receive waits before returning, so the owning loop
/// can poll its shutdown flag between polls.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct ChannelStats {
    datagrams_sent: AtomicU64,
    datagrams_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    discarded: AtomicU64,
}

impl ChannelStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub discarded: u64,
}

/// Unreliable-channel socket. Send and receive both take `&self`, so one
/// endpoint can be shared between a transmit path and a receive loop.
pub struct UdpEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    stats: ChannelStats,
}

impl UdpEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(RECV_POLL_INTERVAL))?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            stats: ChannelStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn send_to(&self, datagram: &Datagram, addr: SocketAddr) -> io::Result<usize> {
        let data = datagram.encode().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("serialization error: {}", e),
            )
        })?;

        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "datagram exceeds size limit",
            ));
        }

        let bytes = self.socket.send_to(&data, addr)?;

        self.stats.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);

        Ok(bytes)
    }

    /// One receive poll. `Ok(None)` covers the poll timeout as well as
    /// malformed or foreign datagrams, which are counted and dropped.
    pub fn recv(&self) -> io::Result<Option<(Datagram, SocketAddr)>> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        match self.socket.recv_from(&mut buf) {
            Ok((size, addr)) => {
                self.stats
                    .bytes_received
                    .fetch_add(size as u64, Ordering::Relaxed);

                match Datagram::decode(&buf[..size]) {
                    Ok(datagram) if datagram.is_valid() => {
                        self.stats
                            .datagrams_received
                            .fetch_add(1, Ordering::Relaxed);
                        Ok(Some((datagram, addr)))
                    }
                    _ => {
                        self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                        log::debug!("discarded unrecognized datagram from {}", addr);
                        Ok(None)
                    }
                }
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let stats = ChannelStats::default();
        stats.datagrams_sent.fetch_add(3, Ordering::Relaxed);
        stats.bytes_sent.fetch_add(120, Ordering::Relaxed);
        stats.discarded.fetch_add(1, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.datagrams_sent, 3);
        assert_eq!(snapshot.bytes_sent, 120);
        assert_eq!(snapshot.discarded, 1);
        assert_eq!(snapshot.datagrams_received, 0);
    }
}
