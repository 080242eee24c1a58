//! `ICMP` echo probing for Vigil.
//!
//! The [`IcmpEngine`] periodically sends echo requests to a set of targets
//! and accumulates per-target sent and lost counts which are drained through
//! the [`vigil_core::Prober`] trait.
//!
//! Probing requires raw sockets, which usually means running as root or
//! holding the `CAP_NET_RAW` capability.
#![deny(unsafe_code)]

mod config;
mod engine;
mod error;
mod packet;
mod socket;

pub use config::{defaults, ProbeConfig};
pub use engine::IcmpEngine;
pub use error::{Error, IcmpFamily, Result};
pub use packet::{echo_request, parse_echo_reply, Echo, MAX_PAYLOAD_SIZE};
pub use socket::{EchoSocket, RawSocket};
