//! Core protocol types

use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Size of a hardware address in bytes
pub const MAC_ADDR_SIZE: usize = 6;

/// Switch-local port number
pub type PortNo = u32;

/// Stable identifier of a switch (OpenFlow datapath id)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatapathId(u64);

impl DatapathId {
    pub fn new(id: u64) -> Self {
        DatapathId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DatapathId {
    fn from(id: u64) -> Self {
        DatapathId(id)
    }
}

impl fmt::Debug for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatapathId({:016x})", self.0)
    }
}

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for DatapathId {
    type Err = ProtocolError;

    /// Accepts decimal (`"3"`) or `0x`-prefixed hex (`"0x0000000000000003"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(DatapathId)
            .map_err(|_| ProtocolError::InvalidDatapathId(s.to_string()))
    }
}

/// A 48-bit hardware address identifying a host
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; MAC_ADDR_SIZE]);

impl MacAddr {
    /// The all-ones broadcast address
    pub const BROADCAST: MacAddr = MacAddr([0xff; MAC_ADDR_SIZE]);

    pub fn from_bytes(bytes: [u8; MAC_ADDR_SIZE]) -> Self {
        MacAddr(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MAC_ADDR_SIZE] {
        &self.0
    }

    /// Build an address from the low 48 bits of an integer, e.g. `from_u64(1)`
    /// is `00:00:00:00:00:01` as assigned by emulators with automatic MACs
    pub fn from_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; MAC_ADDR_SIZE];
        bytes.copy_from_slice(&be[2..]);
        MacAddr(bytes)
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Group bit set (includes broadcast)
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; MAC_ADDR_SIZE];
        let mut parts = s.split(|c: char| c == ':' || c == '-');

        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ProtocolError::InvalidMacAddress(s.to_string()))?;
            if part.len() != 2 {
                return Err(ProtocolError::InvalidMacAddress(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| ProtocolError::InvalidMacAddress(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(ProtocolError::InvalidMacAddress(s.to_string()));
        }

        Ok(MacAddr(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque handle of a frame buffered on the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(pub u32);

impl BufferId {
    /// The frame was not buffered; the packet-out must carry the data itself
    pub const NO_BUFFER: BufferId = BufferId(0xffff_ffff);

    pub fn is_buffered(&self) -> bool {
        *self != Self::NO_BUFFER
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::NO_BUFFER
    }
}

/// A vertex of the topology graph
///
/// The derived ordering places every switch before every host, then orders
/// by datapath id or address. Graph neighbor iteration follows this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Switch(DatapathId),
    Host(MacAddr),
}

impl Node {
    pub fn switch(id: u64) -> Self {
        Node::Switch(DatapathId::new(id))
    }

    pub fn host(mac: MacAddr) -> Self {
        Node::Host(mac)
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Node::Switch(_))
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Node::Host(_))
    }

    pub fn as_switch(&self) -> Option<DatapathId> {
        match self {
            Node::Switch(dpid) => Some(*dpid),
            Node::Host(_) => None,
        }
    }
}

impl From<DatapathId> for Node {
    fn from(dpid: DatapathId) -> Self {
        Node::Switch(dpid)
    }
}

impl From<MacAddr> for Node {
    fn from(mac: MacAddr) -> Self {
        Node::Host(mac)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Switch(dpid) => write!(f, "switch {}", dpid),
            Node::Host(mac) => write!(f, "host {}", mac),
        }
    }
}
