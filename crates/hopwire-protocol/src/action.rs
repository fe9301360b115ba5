//! Outbound actions sent to switches

use crate::types::{BufferId, DatapathId, MacAddr, PortNo};
use crate::DEFAULT_FLOW_PRIORITY;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAction {
    /// Send out a single port
    Port(PortNo),
    /// Send out every port except the ingress port
    Flood,
}

impl OutputAction {
    pub fn port(&self) -> Option<PortNo> {
        match self {
            OutputAction::Port(port) => Some(*port),
            OutputAction::Flood => None,
        }
    }

    pub fn is_flood(&self) -> bool {
        matches!(self, OutputAction::Flood)
    }
}

impl fmt::Display for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputAction::Port(port) => write!(f, "output:{}", port),
            OutputAction::Flood => write!(f, "flood"),
        }
    }
}

/// Release a frame from the switch (or resend the controller's copy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOut {
    pub dpid: DatapathId,
    pub buffer_id: BufferId,
    pub in_port: PortNo,
    pub action: OutputAction,
}

/// Match fields of a destination-based forwarding rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowMatch {
    pub in_port: PortNo,
    pub dl_dst: MacAddr,
}

/// A flow-table entry to add on a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRule {
    pub dpid: DatapathId,
    #[serde(rename = "match")]
    pub match_fields: FlowMatch,
    pub out_port: PortNo,
    pub priority: u16,
    /// Seconds of inactivity before removal, 0 = never
    pub idle_timeout: u16,
    /// Absolute lifetime in seconds, 0 = never
    pub hard_timeout: u16,
    pub cookie: u64,
    /// Ask the switch to report when the entry is removed
    pub send_flow_removed: bool,
}

impl FlowRule {
    /// Permanent rule with default priority
    pub fn new(dpid: DatapathId, in_port: PortNo, dl_dst: MacAddr, out_port: PortNo) -> Self {
        FlowRule {
            dpid,
            match_fields: FlowMatch { in_port, dl_dst },
            out_port,
            priority: DEFAULT_FLOW_PRIORITY,
            idle_timeout: 0,
            hard_timeout: 0,
            cookie: 0,
            send_flow_removed: true,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.idle_timeout == 0 && self.hard_timeout == 0
    }
}

/// Messages queued for the control-channel transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    PacketOut(PacketOut),
    FlowMod(FlowRule),
}

impl OutboundMessage {
    pub fn dpid(&self) -> DatapathId {
        match self {
            OutboundMessage::PacketOut(out) => out.dpid,
            OutboundMessage::FlowMod(rule) => rule.dpid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_rule_defaults() {
        let rule = FlowRule::new(DatapathId::new(1), 1, MacAddr::from_u64(2), 3);
        assert_eq!(rule.priority, DEFAULT_FLOW_PRIORITY);
        assert!(rule.is_permanent());
        assert!(rule.send_flow_removed);
        assert_eq!(rule.match_fields.dl_dst, MacAddr::from_u64(2));
    }

    #[test]
    fn test_output_action() {
        assert_eq!(OutputAction::Port(4).port(), Some(4));
        assert_eq!(OutputAction::Flood.port(), None);
        assert!(OutputAction::Flood.is_flood());
        assert_eq!(OutputAction::Port(4).to_string(), "output:4");
    }
}
