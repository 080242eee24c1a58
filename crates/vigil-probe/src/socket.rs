use crate::error::{Error, IcmpFamily, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, ErrorKind, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

/// A socket able to send and receive `ICMP` echo messages.
pub trait EchoSocket: Send + Sync {
    /// Send an `ICMP` message to `addr`.
    fn send_to(&self, buf: &[u8], addr: IpAddr) -> io::Result<()>;

    /// Receive a single datagram.
    ///
    /// Returns `Ok(None)` if nothing arrived before the read timeout.
    fn recv(&self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// A raw `ICMP` socket.
///
/// Opening a raw socket usually requires elevated privileges.
#[derive(Debug)]
pub struct RawSocket {
    inner: Socket,
}

impl RawSocket {
    /// Open and bind a raw socket for `family` on the unspecified address.
    pub fn bind(family: IcmpFamily, read_timeout: Duration) -> Result<Self> {
        let (domain, protocol, addr) = match family {
            IcmpFamily::V4 => (
                Domain::IPV4,
                Protocol::ICMPV4,
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ),
            IcmpFamily::V6 => (
                Domain::IPV6,
                Protocol::ICMPV6,
                IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            ),
        };
        let bind_err = |source| Error::Bind { family, source };
        let inner = Socket::new(domain, Type::RAW, Some(protocol)).map_err(bind_err)?;
        inner
            .bind(&SockAddr::from(SocketAddr::new(addr, 0)))
            .map_err(bind_err)?;
        inner.set_read_timeout(Some(read_timeout)).map_err(bind_err)?;
        Ok(Self { inner })
    }
}

impl EchoSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: IpAddr) -> io::Result<()> {
        self.inner
            .send_to(buf, &SockAddr::from(SocketAddr::new(addr, 0)))?;
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match (&self.inner).read(buf) {
            Ok(bytes_read) => Ok(Some(bytes_read)),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
