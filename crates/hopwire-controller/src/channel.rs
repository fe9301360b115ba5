//! Outbound control channel seam

use crate::error::{ControllerError, Result};
use hopwire_protocol::{FlowRule, OutboundMessage, PacketOut};
use tokio::sync::mpsc;

/// Control channel towards the managed switches
///
/// Implementations must only hand the message off (queue, buffer, write to
/// a non-blocking socket). Decisions never wait for a switch to answer.
pub trait ControlChannel: Send + Sync {
    /// Release or resend the frame that triggered a decision
    fn send_packet_out(&self, packet_out: PacketOut) -> Result<()>;

    /// Add a flow-table entry on a switch
    fn install_flow(&self, rule: FlowRule) -> Result<()>;
}

/// Control channel that queues outbound messages for a transport task
#[derive(Debug, Clone)]
pub struct QueuedControlChannel {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl QueuedControlChannel {
    /// Create the channel and the receiver the transport drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueuedControlChannel { tx }, rx)
    }

    fn push(&self, message: OutboundMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| ControllerError::ChannelClosed)
    }
}

impl ControlChannel for QueuedControlChannel {
    fn send_packet_out(&self, packet_out: PacketOut) -> Result<()> {
        self.push(OutboundMessage::PacketOut(packet_out))
    }

    fn install_flow(&self, rule: FlowRule) -> Result<()> {
        self.push(OutboundMessage::FlowMod(rule))
    }
}
