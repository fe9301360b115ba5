//! Flow rule installation

use crate::channel::ControlChannel;
use crate::error::Result;
use hopwire_protocol::{DatapathId, FlowRule, MacAddr, PortNo, RuleRejection, DEFAULT_FLOW_PRIORITY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Parameters applied to every installed rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefaults {
    pub priority: u16,
    /// 0 keeps the rule until it is explicitly removed
    pub idle_timeout: u16,
    /// 0 keeps the rule until it is explicitly removed
    pub hard_timeout: u16,
    pub cookie: u64,
    pub send_flow_removed: bool,
}

impl Default for RuleDefaults {
    fn default() -> Self {
        Self {
            priority: DEFAULT_FLOW_PRIORITY,
            idle_timeout: 0,
            hard_timeout: 0,
            cookie: 0,
            send_flow_removed: true,
        }
    }
}

/// Turns forwarding decisions into destination-match rules on a switch
pub struct RuleInstaller {
    channel: Arc<dyn ControlChannel>,
    defaults: RuleDefaults,
}

impl RuleInstaller {
    pub fn new(channel: Arc<dyn ControlChannel>, defaults: RuleDefaults) -> Self {
        RuleInstaller { channel, defaults }
    }

    pub fn defaults(&self) -> &RuleDefaults {
        &self.defaults
    }

    /// Rule matching `(in_port, dst)` at `dpid` and outputting on `out_port`
    pub fn build_rule(
        &self,
        dpid: DatapathId,
        in_port: PortNo,
        dst: MacAddr,
        out_port: PortNo,
    ) -> FlowRule {
        let mut rule = FlowRule::new(dpid, in_port, dst, out_port);
        rule.priority = self.defaults.priority;
        rule.idle_timeout = self.defaults.idle_timeout;
        rule.hard_timeout = self.defaults.hard_timeout;
        rule.cookie = self.defaults.cookie;
        rule.send_flow_removed = self.defaults.send_flow_removed;
        rule
    }

    /// Dispatch a rule without waiting for the switch to acknowledge it
    pub fn install_rule(
        &self,
        dpid: DatapathId,
        in_port: PortNo,
        dst: MacAddr,
        out_port: PortNo,
    ) -> Result<FlowRule> {
        let rule = self.build_rule(dpid, in_port, dst, out_port);
        self.channel.install_flow(rule)?;

        debug!(
            dpid = %dpid,
            in_port,
            dst = %dst,
            out_port,
            "Flow rule dispatched"
        );

        Ok(rule)
    }

    /// Log a rejection reported by the switch. Rejected rules are not retried.
    pub fn report_rejection(&self, rejection: &RuleRejection) {
        warn!(
            dpid = %rejection.dpid,
            dst = %rejection.dst,
            reason = %rejection.reason,
            "Switch rejected flow rule"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::QueuedControlChannel;
    use hopwire_protocol::OutboundMessage;

    #[test]
    fn test_install_rule_uses_defaults() {
        let (channel, mut rx) = QueuedControlChannel::new();
        let defaults = RuleDefaults {
            priority: 100,
            idle_timeout: 30,
            hard_timeout: 0,
            cookie: 0xfeed,
            send_flow_removed: false,
        };
        let installer = RuleInstaller::new(Arc::new(channel), defaults);

        let rule = installer
            .install_rule(DatapathId::new(1), 1, MacAddr::from_u64(0xb), 2)
            .unwrap();

        assert_eq!(rule.priority, 100);
        assert_eq!(rule.idle_timeout, 30);
        assert_eq!(rule.cookie, 0xfeed);
        assert!(!rule.send_flow_removed);
        assert_eq!(rx.try_recv().unwrap(), OutboundMessage::FlowMod(rule));
    }

    #[test]
    fn test_default_rules_are_permanent() {
        let (channel, _rx) = QueuedControlChannel::new();
        let installer = RuleInstaller::new(Arc::new(channel), RuleDefaults::default());

        let rule = installer.build_rule(DatapathId::new(3), 4, MacAddr::from_u64(1), 5);
        assert!(rule.is_permanent());
        assert_eq!(rule.priority, DEFAULT_FLOW_PRIORITY);
        assert_eq!(rule.match_fields.in_port, 4);
    }

    #[test]
    fn test_install_rule_closed_channel() {
        let (channel, rx) = QueuedControlChannel::new();
        drop(rx);
        let installer = RuleInstaller::new(Arc::new(channel), RuleDefaults::default());

        assert!(installer
            .install_rule(DatapathId::new(1), 1, MacAddr::from_u64(2), 3)
            .is_err());
    }
}
