//! Hopwire Protocol Module
//!
//! Identifiers, inbound events and outbound actions shared between the
//! topology store, the forwarding controller and whatever control-channel
//! transport drives them. Nothing here knows about wire encodings; frames
//! arrive already decoded, apart from the Ethernet header helper used to
//! validate raw packet-in payloads at the boundary.

pub mod action;
pub mod error;
pub mod event;
pub mod types;

pub use action::{FlowMatch, FlowRule, OutboundMessage, OutputAction, PacketOut};
pub use error::{ProtocolError, Result};
pub use event::{ControllerEvent, Link, PacketIn, RawPacketIn, RuleRejection};
pub use types::{BufferId, DatapathId, MacAddr, Node, PortNo, MAC_ADDR_SIZE};

/// Default flow priority used by OpenFlow 1.0 switches
pub const DEFAULT_FLOW_PRIORITY: u16 = 0x8000;

/// Length of an Ethernet II header (dst, src, ethertype)
pub const ETHERNET_HEADER_LEN: usize = 14;
