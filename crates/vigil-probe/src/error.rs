use std::io;
use std::net::IpAddr;
use thiserror::Error;

/// A probing engine error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A probing engine error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to bind {family} ICMP socket: {source} (running as root?)")]
    Bind {
        family: IcmpFamily,
        #[source]
        source: io::Error,
    },
    #[error("no ICMP socket available for target {0}")]
    FamilyUnavailable(IpAddr),
    #[error("invalid payload size: {0}")]
    InvalidPayloadSize(usize),
    #[error("invalid IPv4 header length: {0}")]
    InvalidIpv4Header(u8),
    #[error("packet error: {0}")]
    Packet(#[from] trippy_packet::error::Error),
    #[error("probing engine already started")]
    AlreadyStarted,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Is this a failure to acquire the engine's sockets?
    #[must_use]
    pub const fn is_bind(&self) -> bool {
        matches!(self, Self::Bind { .. })
    }
}

/// The ICMP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IcmpFamily {
    V4,
    V6,
}

impl IcmpFamily {
    #[must_use]
    pub const fn of(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }
}

impl std::fmt::Display for IcmpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}
