//! Inbound events delivered to the controller

use crate::error::{ProtocolError, Result};
use crate::types::{BufferId, DatapathId, MacAddr, PortNo, MAC_ADDR_SIZE};
use crate::ETHERNET_HEADER_LEN;
use serde::{Deserialize, Serialize};

/// A bidirectional link between two switches as reported by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub src: DatapathId,
    pub src_port: PortNo,
    pub dst: DatapathId,
    pub dst_port: PortNo,
}

impl Link {
    pub fn new(src: DatapathId, src_port: PortNo, dst: DatapathId, dst_port: PortNo) -> Self {
        Link {
            src,
            src_port,
            dst,
            dst_port,
        }
    }
}

/// A validated "frame arrived at switch" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketIn {
    pub dpid: DatapathId,
    pub in_port: PortNo,
    pub src: MacAddr,
    pub dst: MacAddr,
    #[serde(default)]
    pub buffer_id: BufferId,
}

impl PacketIn {
    pub fn new(dpid: DatapathId, in_port: PortNo, src: MacAddr, dst: MacAddr) -> Self {
        PacketIn {
            dpid,
            in_port,
            src,
            dst,
            buffer_id: BufferId::NO_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer_id: BufferId) -> Self {
        self.buffer_id = buffer_id;
        self
    }

    /// Build a packet-in from raw frame data by reading the Ethernet header
    ///
    /// Only the destination and source addresses are consumed; the payload is
    /// left to the transport.
    pub fn from_ethernet(
        dpid: DatapathId,
        in_port: PortNo,
        buffer_id: BufferId,
        data: &[u8],
    ) -> Result<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(ProtocolError::FrameTooShort {
                len: data.len(),
                min: ETHERNET_HEADER_LEN,
            });
        }

        let mut dst = [0u8; MAC_ADDR_SIZE];
        let mut src = [0u8; MAC_ADDR_SIZE];
        dst.copy_from_slice(&data[..MAC_ADDR_SIZE]);
        src.copy_from_slice(&data[MAC_ADDR_SIZE..2 * MAC_ADDR_SIZE]);

        Ok(PacketIn {
            dpid,
            in_port,
            src: MacAddr::from_bytes(src),
            dst: MacAddr::from_bytes(dst),
            buffer_id,
        })
    }
}

/// Packet-in as handed over by a transport that may not have decoded every field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPacketIn {
    pub dpid: Option<DatapathId>,
    pub in_port: Option<PortNo>,
    pub src: Option<MacAddr>,
    pub dst: Option<MacAddr>,
    pub buffer_id: Option<BufferId>,
}

impl TryFrom<RawPacketIn> for PacketIn {
    type Error = ProtocolError;

    fn try_from(raw: RawPacketIn) -> Result<Self> {
        Ok(PacketIn {
            dpid: raw
                .dpid
                .ok_or_else(|| ProtocolError::MissingField("dpid".to_string()))?,
            in_port: raw
                .in_port
                .ok_or_else(|| ProtocolError::MissingField("in_port".to_string()))?,
            src: raw
                .src
                .ok_or_else(|| ProtocolError::MissingField("src".to_string()))?,
            dst: raw
                .dst
                .ok_or_else(|| ProtocolError::MissingField("dst".to_string()))?,
            buffer_id: raw.buffer_id.unwrap_or_default(),
        })
    }
}

/// A switch refused a flow rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRejection {
    pub dpid: DatapathId,
    pub dst: MacAddr,
    pub reason: String,
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// A switch connected to the controller
    SwitchJoined { dpid: DatapathId },
    /// A switch disconnected
    SwitchLeft { dpid: DatapathId },
    /// Full list of currently known switches
    SwitchesListed { dpids: Vec<DatapathId> },
    /// Discovery found an inter-switch link
    LinkUp { link: Link },
    /// Discovery lost an inter-switch link
    LinkDown { link: Link },
    /// A frame missed the switch's flow table
    PacketIn { packet: PacketIn },
    /// A previously dispatched flow rule was rejected by the switch
    RuleRejected { rejection: RuleRejection },
}

impl ControllerEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerEvent::SwitchJoined { .. } => "switch_joined",
            ControllerEvent::SwitchLeft { .. } => "switch_left",
            ControllerEvent::SwitchesListed { .. } => "switches_listed",
            ControllerEvent::LinkUp { .. } => "link_up",
            ControllerEvent::LinkDown { .. } => "link_down",
            ControllerEvent::PacketIn { .. } => "packet_in",
            ControllerEvent::RuleRejected { .. } => "rule_rejected",
        }
    }
}

impl From<PacketIn> for ControllerEvent {
    fn from(packet: PacketIn) -> Self {
        ControllerEvent::PacketIn { packet }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(dst: [u8; 6], src: [u8; 6]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&dst);
        data.extend_from_slice(&src);
        data.extend_from_slice(&[0x08, 0x00]);
        data.extend_from_slice(b"payload");
        data
    }

    #[test]
    fn test_from_ethernet_reads_addresses() {
        let data = frame([0xff; 6], [0, 0, 0, 0, 0, 1]);
        let packet =
            PacketIn::from_ethernet(DatapathId::new(1), 3, BufferId(17), &data).unwrap();

        assert_eq!(packet.dst, MacAddr::BROADCAST);
        assert_eq!(packet.src, MacAddr::from_u64(1));
        assert_eq!(packet.in_port, 3);
        assert_eq!(packet.buffer_id, BufferId(17));
    }

    #[test]
    fn test_from_ethernet_rejects_short_frame() {
        let err = PacketIn::from_ethernet(DatapathId::new(1), 1, BufferId::NO_BUFFER, &[0u8; 13])
            .unwrap_err();
        assert_eq!(err, ProtocolError::FrameTooShort { len: 13, min: 14 });
    }

    #[test]
    fn test_raw_packet_in_validation() {
        let complete = RawPacketIn {
            dpid: Some(DatapathId::new(2)),
            in_port: Some(4),
            src: Some(MacAddr::from_u64(1)),
            dst: Some(MacAddr::from_u64(2)),
            buffer_id: None,
        };
        let packet = PacketIn::try_from(complete.clone()).unwrap();
        assert_eq!(packet.buffer_id, BufferId::NO_BUFFER);

        let missing_dst = RawPacketIn {
            dst: None,
            ..complete
        };
        assert_eq!(
            PacketIn::try_from(missing_dst).unwrap_err(),
            ProtocolError::MissingField("dst".to_string())
        );
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = ControllerEvent::SwitchJoined {
            dpid: DatapathId::new(5),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"switch_joined","dpid":5}"#);
        assert_eq!(event.kind(), "switch_joined");
    }
}
