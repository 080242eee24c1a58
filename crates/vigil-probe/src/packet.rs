//! `ICMP` echo request construction and echo reply parsing.
//!
//! Requests are built without an IP header; raw `ICMPv4` sockets deliver the
//! full IPv4 datagram to the reader whereas `ICMPv6` sockets deliver the
//! `ICMPv6` message alone.
use crate::error::{Error, IcmpFamily, Result};
use trippy_packet::checksum::icmp_ipv4_checksum;
use trippy_packet::ipv4::Ipv4Packet;
use trippy_packet::{icmpv4, icmpv6};

/// The size of an `ICMP` echo header.
pub const ICMP_HEADER_SIZE: usize = icmpv4::IcmpPacket::minimum_packet_size();

/// The largest echo payload which fits in an IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = 65_507;

/// The identity of an echo message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Echo {
    pub identifier: u16,
    pub sequence: u16,
}

/// Build an echo request with a zeroed payload of `payload_size` bytes.
///
/// The `ICMPv6` checksum depends on the addresses chosen by the kernel and
/// is left for the kernel to fill in.
pub fn echo_request(family: IcmpFamily, echo: Echo, payload_size: usize) -> Result<Vec<u8>> {
    if payload_size > MAX_PAYLOAD_SIZE {
        return Err(Error::InvalidPayloadSize(payload_size));
    }
    let mut buf = vec![0_u8; ICMP_HEADER_SIZE + payload_size];
    match family {
        IcmpFamily::V4 => {
            let mut icmp = icmpv4::echo_request::EchoRequestPacket::new(&mut buf)?;
            icmp.set_icmp_type(icmpv4::IcmpType::EchoRequest);
            icmp.set_icmp_code(icmpv4::IcmpCode(0));
            icmp.set_identifier(echo.identifier);
            icmp.set_sequence(echo.sequence);
            icmp.set_checksum(icmp_ipv4_checksum(icmp.packet()));
        }
        IcmpFamily::V6 => {
            let mut icmp = icmpv6::echo_request::EchoRequestPacket::new(&mut buf)?;
            icmp.set_icmp_type(icmpv6::IcmpType::EchoRequest);
            icmp.set_icmp_code(icmpv6::IcmpCode(0));
            icmp.set_identifier(echo.identifier);
            icmp.set_sequence(echo.sequence);
        }
    }
    Ok(buf)
}

/// Parse a datagram read from a raw socket of `family`.
///
/// Returns `Ok(None)` for well formed `ICMP` messages which are not echo
/// replies.
pub fn parse_echo_reply(family: IcmpFamily, buf: &[u8]) -> Result<Option<Echo>> {
    match family {
        IcmpFamily::V4 => {
            let ipv4 = Ipv4Packet::new_view(buf)?;
            let header_len = usize::from(ipv4.get_header_length()) * 4;
            if header_len < Ipv4Packet::minimum_packet_size() || header_len > buf.len() {
                return Err(Error::InvalidIpv4Header(ipv4.get_header_length()));
            }
            let icmp = icmpv4::IcmpPacket::new_view(ipv4.payload())?;
            if icmp.get_icmp_type() != icmpv4::IcmpType::EchoReply {
                return Ok(None);
            }
            let reply = icmpv4::echo_reply::EchoReplyPacket::new_view(icmp.packet())?;
            Ok(Some(Echo {
                identifier: reply.get_identifier(),
                sequence: reply.get_sequence(),
            }))
        }
        IcmpFamily::V6 => {
            let icmp = icmpv6::IcmpPacket::new_view(buf)?;
            if icmp.get_icmp_type() != icmpv6::IcmpType::EchoReply {
                return Ok(None);
            }
            let reply = icmpv6::echo_reply::EchoReplyPacket::new_view(icmp.packet())?;
            Ok(Some(Echo {
                identifier: reply.get_identifier(),
                sequence: reply.get_sequence(),
            }))
        }
    }
}
