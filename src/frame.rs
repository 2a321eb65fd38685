// Frame classifier: header parsing and bounds checking for raw
// Ethernet/IPv4/transport frames.
//
// Parsing is pure and allocation-free. Anything the classifier cannot
// understand (truncated headers, non-IPv4 ethertypes, protocols other
// than TCP/UDP) yields `None`, and the caller passes the frame through
// unfiltered (fail-open).

// Network protocol constants
const ETHERTYPE_IPV4: u16 = 0x0800;
const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;
const TCP_FLAG_SYN: u8 = 0x02;
const TCP_FLAG_ACK: u8 = 0x10;

/// Ethernet header length (no VLAN tags).
const ETH_HDR_LEN: usize = 14;
/// IPv4 header length without options; options are not parsed.
const IPV4_HDR_LEN: usize = 20;
/// Minimum TCP header length.
const TCP_HDR_LEN: usize = 20;
/// UDP header length.
const UDP_HDR_LEN: usize = 8;

// Field offsets from the start of the frame
const ETHERTYPE_OFFSET: usize = 12;
const IP_PROTOCOL_OFFSET: usize = ETH_HDR_LEN + 9;
const IP_SADDR_OFFSET: usize = ETH_HDR_LEN + 12;
const TRANSPORT_OFFSET: usize = ETH_HDR_LEN + IPV4_HDR_LEN;
const DEST_PORT_OFFSET: usize = TRANSPORT_OFFSET + 2;
const TCP_FLAGS_OFFSET: usize = TRANSPORT_OFFSET + 13;

/// Transport-layer classification of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// TCP segment with its SYN/ACK flag pair.
    Tcp { syn: bool, ack: bool },
    /// UDP datagram.
    Udp,
}

impl Transport {
    /// Returns `true` for a connection-initiation segment (SYN set, ACK clear).
    pub fn is_syn_only(&self) -> bool {
        matches!(self, Transport::Tcp { syn: true, ack: false })
    }
}

/// Classifier output for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedFrame {
    /// IPv4 source address in host byte order.
    pub src_addr: u32,
    /// Transport destination port in host byte order.
    pub dst_port: u16,
    pub transport: Transport,
}

/// Parse and bounds-check a raw frame.
///
/// Validates, in order, the Ethernet header, the IPv4 header, and the
/// transport header, each only after the previous stage confirmed the
/// frame is in scope. Returns `None` for anything malformed or outside
/// IPv4 TCP/UDP; the caller must treat `None` as an unconditional pass.
pub fn classify(frame: &[u8]) -> Option<ClassifiedFrame> {
    if frame.len() < ETH_HDR_LEN {
        return None;
    }

    let ethertype = u16::from_be_bytes([frame[ETHERTYPE_OFFSET], frame[ETHERTYPE_OFFSET + 1]]);
    if ethertype != ETHERTYPE_IPV4 {
        return None;
    }

    if frame.len() < ETH_HDR_LEN + IPV4_HDR_LEN {
        return None;
    }

    let src_addr = u32::from_be_bytes([
        frame[IP_SADDR_OFFSET],
        frame[IP_SADDR_OFFSET + 1],
        frame[IP_SADDR_OFFSET + 2],
        frame[IP_SADDR_OFFSET + 3],
    ]);

    match frame[IP_PROTOCOL_OFFSET] {
        IPPROTO_TCP => {
            if frame.len() < TRANSPORT_OFFSET + TCP_HDR_LEN {
                return None;
            }

            let dst_port =
                u16::from_be_bytes([frame[DEST_PORT_OFFSET], frame[DEST_PORT_OFFSET + 1]]);
            let flags = frame[TCP_FLAGS_OFFSET];

            Some(ClassifiedFrame {
                src_addr,
                dst_port,
                transport: Transport::Tcp {
                    syn: flags & TCP_FLAG_SYN != 0,
                    ack: flags & TCP_FLAG_ACK != 0,
                },
            })
        }
        IPPROTO_UDP => {
            if frame.len() < TRANSPORT_OFFSET + UDP_HDR_LEN {
                return None;
            }

            let dst_port =
                u16::from_be_bytes([frame[DEST_PORT_OFFSET], frame[DEST_PORT_OFFSET + 1]]);

            Some(ClassifiedFrame {
                src_addr,
                dst_port,
                transport: Transport::Udp,
            })
        }
        _ => None,
    }
}
