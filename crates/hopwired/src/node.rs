use anyhow::Result;
use hopwire_controller::{Controller, ControllerStats, QueuedControlChannel};
use hopwire_protocol::OutboundMessage;
use hopwire_topology::TopologySnapshot;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::scenario::{Scenario, ScenarioSource};

/// What a finished run leaves behind
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub events: usize,
    pub messages: usize,
    pub stats: ControllerStats,
    pub topology: TopologySnapshot,
}

/// Controller daemon wiring: event replay in, switch messages out
pub struct Node {
    config: Config,
    scenario: Scenario,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Node {
    pub fn new(config: Config, scenario: Scenario) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Node {
            config,
            scenario,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) -> Result<RunReport> {
        info!("Starting hopwired...");

        let (channel, outbound_rx) = QueuedControlChannel::new();
        let controller = Controller::new(Arc::new(channel), self.config.flow.rule_defaults());
        let handle = controller.spawn_with_aging(
            self.config.controller.event_queue_capacity,
            self.config.controller.mac_aging,
        );
        info!(
            queue = self.config.controller.event_queue_capacity,
            mac_aging = self.config.controller.mac_aging.is_some(),
            "✓ Controller running"
        );

        let sink = tokio::spawn(log_outbound(outbound_rx));
        info!("✓ Outbound sink running");

        let scenario = std::mem::take(&mut self.scenario);
        let name = scenario.name.clone();
        info!(scenario = %name, steps = scenario.len(), "Replaying scenario");

        let events = handle.feed(ScenarioSource::new(scenario)).await?;
        info!(events, "Scenario replay complete");

        if self.config.scenario.linger {
            info!("Lingering until shutdown signal");
            self.wait_for_shutdown().await;
        }

        info!("Shutting down hopwired...");
        let topology = handle.snapshot().await?;
        let controller = handle.shutdown().await?;
        let stats = controller.stats().clone();

        // Last sender goes with the controller; the sink finishes its backlog
        drop(controller);
        let messages = sink.await?;

        info!(
            switches = topology.switches.len(),
            hosts = topology.hosts.len(),
            rules = stats.rules_installed,
            floods = stats.floods,
            "Shutdown complete"
        );

        Ok(RunReport {
            scenario: name,
            events,
            messages,
            stats,
            topology,
        })
    }

    async fn wait_for_shutdown(&mut self) {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C signal");
            }
            _ = self.shutdown_rx.recv() => {
                info!("Received shutdown signal");
            }
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }
}

/// Log every message the controller hands to the switches
async fn log_outbound(mut rx: mpsc::UnboundedReceiver<OutboundMessage>) -> usize {
    let mut count = 0;

    while let Some(message) = rx.recv().await {
        count += 1;
        match message {
            OutboundMessage::FlowMod(rule) => {
                info!(
                    dpid = %rule.dpid,
                    in_port = rule.match_fields.in_port,
                    dst = %rule.match_fields.dl_dst,
                    out_port = rule.out_port,
                    priority = rule.priority,
                    "flow-mod"
                );
            }
            OutboundMessage::PacketOut(out) => {
                debug!(
                    dpid = %out.dpid,
                    in_port = out.in_port,
                    action = %out.action,
                    "packet-out"
                );
            }
        }
    }

    count
}
