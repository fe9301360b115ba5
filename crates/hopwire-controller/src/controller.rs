//! Shortest-path forwarding controller
//!
//! The controller owns the topology graph and the MAC cache. Every event is
//! handled to completion before the next one starts, so learning (which
//! writes the graph) and path search (which reads it) never interleave.
//! When events come from several connections, `spawn` puts the controller
//! behind a single-consumer queue.

use crate::channel::ControlChannel;
use crate::decision::{Decision, ForwardingEngine};
use crate::discovery::{self, EventSource};
use crate::error::{ControllerError, Result};
use crate::installer::{RuleDefaults, RuleInstaller};
use hopwire_protocol::{ControllerEvent, PacketIn, PacketOut, RuleRejection};
use chrono::{DateTime, Utc};
use hopwire_topology::{MacTable, Topology, TopologySnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Controller statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    pub packets_in: u64,
    pub floods: u64,
    pub unicasts: u64,
    pub hosts_learned: u64,
    pub rules_installed: u64,
    pub rule_rejections: u64,
    pub dispatch_failures: u64,
    pub switches_joined: u64,
    pub switches_left: u64,
    pub links_up: u64,
    pub links_down: u64,
    pub mac_entries_expired: u64,
}

/// Periodic expiry of MAC cache entries on a spawned controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAging {
    /// How often the cache is swept
    pub interval_secs: u64,
    /// Entries not refreshed for this long are dropped
    pub max_age_secs: u64,
}

impl Default for MacAging {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_age_secs: 300,
        }
    }
}

/// Reactive forwarding controller
pub struct Controller {
    topology: Topology,
    mac_table: MacTable,
    engine: ForwardingEngine,
    installer: RuleInstaller,
    channel: Arc<dyn ControlChannel>,
    stats: ControllerStats,
}

impl Controller {
    /// Create a controller with an empty topology
    ///
    /// # Arguments
    /// * `channel` - Outbound channel towards the switches
    /// * `rule_defaults` - Priority/timeouts applied to installed rules
    pub fn new(channel: Arc<dyn ControlChannel>, rule_defaults: RuleDefaults) -> Self {
        Controller {
            topology: Topology::new(),
            mac_table: MacTable::new(),
            engine: ForwardingEngine::new(),
            installer: RuleInstaller::new(Arc::clone(&channel), rule_defaults),
            channel,
            stats: ControllerStats::default(),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn mac_table(&self) -> &MacTable {
        &self.mac_table
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Handle one inbound event
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::SwitchJoined { dpid } => {
                if discovery::switch_joined(&mut self.topology, dpid) {
                    self.stats.switches_joined += 1;
                }
            }
            ControllerEvent::SwitchesListed { dpids } => {
                let added = discovery::switches_listed(&mut self.topology, &dpids);
                self.stats.switches_joined += added as u64;
            }
            ControllerEvent::SwitchLeft { dpid } => {
                if discovery::switch_left(&mut self.topology, &mut self.mac_table, dpid) {
                    self.stats.switches_left += 1;
                }
            }
            ControllerEvent::LinkUp { link } => {
                if discovery::link_up(&mut self.topology, &link) {
                    self.stats.links_up += 1;
                }
            }
            ControllerEvent::LinkDown { link } => {
                if discovery::link_down(&mut self.topology, &link) {
                    self.stats.links_down += 1;
                }
            }
            ControllerEvent::PacketIn { packet } => {
                self.handle_packet_in(&packet);
            }
            ControllerEvent::RuleRejected { rejection } => {
                self.handle_rule_rejected(&rejection);
            }
        }
    }

    /// Decide, release the frame, and persist unicast decisions as rules
    pub fn handle_packet_in(&mut self, packet: &PacketIn) -> Decision {
        self.stats.packets_in += 1;

        let decision = self
            .engine
            .decide(&mut self.topology, &mut self.mac_table, packet);

        if decision.learned_host {
            self.stats.hosts_learned += 1;
            info!(
                host = %packet.src,
                dpid = %packet.dpid,
                port = packet.in_port,
                "Host learned"
            );
        }

        match decision.flood_reason {
            Some(reason) => {
                self.stats.floods += 1;
                debug!(
                    dpid = %packet.dpid,
                    src = %packet.src,
                    dst = %packet.dst,
                    reason = %reason,
                    "Flooding"
                );
            }
            None => {
                self.stats.unicasts += 1;
            }
        }

        if let Some(out_port) = decision.action.port() {
            match self
                .installer
                .install_rule(packet.dpid, packet.in_port, packet.dst, out_port)
            {
                Ok(_) => self.stats.rules_installed += 1,
                Err(e) => self.record_dispatch_failure(packet, e),
            }
        }

        let packet_out = PacketOut {
            dpid: packet.dpid,
            buffer_id: packet.buffer_id,
            in_port: packet.in_port,
            action: decision.action,
        };
        if let Err(e) = self.channel.send_packet_out(packet_out) {
            self.record_dispatch_failure(packet, e);
        }

        decision
    }

    fn handle_rule_rejected(&mut self, rejection: &RuleRejection) {
        self.stats.rule_rejections += 1;
        self.installer.report_rejection(rejection);
    }

    fn record_dispatch_failure(&mut self, packet: &PacketIn, err: ControllerError) {
        self.stats.dispatch_failures += 1;
        warn!(dpid = %packet.dpid, dst = %packet.dst, "Dispatch failed: {}", err);
    }

    /// Drop MAC cache entries last seen more than `max_age` before `now`
    ///
    /// Only the advisory cache is aged; host attachments in the graph stay.
    pub fn expire_mac_entries(&mut self, now: DateTime<Utc>, max_age: chrono::Duration) -> usize {
        let expired = self.mac_table.prune_older_than(now - max_age);
        if expired > 0 {
            self.stats.mac_entries_expired += expired as u64;
            debug!(expired, remaining = self.mac_table.len(), "MAC entries expired");
        }
        expired
    }

    /// Process events from `source` until it is exhausted
    pub async fn run<S: EventSource>(mut self, mut source: S) -> Result<Self> {
        info!("Controller event loop started");

        while let Some(event) = source.next_event().await? {
            debug!(kind = event.kind(), "Handling event");
            self.handle_event(event);
        }

        info!(
            switches = self.topology.switches().len(),
            hosts = self.topology.hosts().len(),
            "Controller event loop finished"
        );
        Ok(self)
    }

    /// Move the controller onto a worker task fed by a bounded queue
    pub fn spawn(self, capacity: usize) -> ControllerHandle {
        self.spawn_with_aging(capacity, None)
    }

    /// Like `spawn`, additionally sweeping the MAC cache between commands
    pub fn spawn_with_aging(self, capacity: usize, aging: Option<MacAging>) -> ControllerHandle {
        let (tx, mut rx) = mpsc::channel::<Command>(capacity);

        let task = tokio::spawn(async move {
            let mut controller = self;
            let mut sweep = aging.map(|aging| {
                let period = Duration::from_secs(aging.interval_secs.max(1));
                let max_age = chrono::Duration::seconds(aging.max_age_secs.min(i32::MAX as u64) as i64);
                (tokio::time::interval(period), max_age)
            });
            info!(aging = ?aging, "Controller worker started");

            loop {
                let command = match sweep.as_mut() {
                    Some((ticker, max_age)) => tokio::select! {
                        command = rx.recv() => command,
                        _ = ticker.tick() => {
                            controller.expire_mac_entries(Utc::now(), *max_age);
                            continue;
                        }
                    },
                    None => rx.recv().await,
                };

                let command = match command {
                    Some(command) => command,
                    None => break,
                };

                match command {
                    Command::Event(event) => {
                        debug!(kind = event.kind(), "Handling event");
                        controller.handle_event(event);
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(controller.topology.snapshot());
                    }
                    Command::Stats(reply) => {
                        let _ = reply.send(controller.stats.clone());
                    }
                }
            }

            info!("Controller worker stopped");
            controller
        });

        ControllerHandle { tx, task }
    }
}

enum Command {
    Event(ControllerEvent),
    Snapshot(oneshot::Sender<TopologySnapshot>),
    Stats(oneshot::Sender<ControllerStats>),
}

/// Handle to a controller running on its own task
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
    task: JoinHandle<Controller>,
}

impl ControllerHandle {
    /// Queue an event; waits only if the queue is full
    pub async fn send(&self, event: ControllerEvent) -> Result<()> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| ControllerError::Stopped)
    }

    /// Forward every event from `source` into the controller
    pub async fn feed<S: EventSource>(&self, mut source: S) -> Result<usize> {
        let mut forwarded = 0;
        while let Some(event) = source.next_event().await? {
            self.send(event).await?;
            forwarded += 1;
        }
        Ok(forwarded)
    }

    pub async fn snapshot(&self) -> Result<TopologySnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .await
            .map_err(|_| ControllerError::Stopped)?;
        rx.await.map_err(|_| ControllerError::Stopped)
    }

    pub async fn stats(&self) -> Result<ControllerStats> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Stats(reply))
            .await
            .map_err(|_| ControllerError::Stopped)?;
        rx.await.map_err(|_| ControllerError::Stopped)
    }

    /// Stop accepting events, drain the queue and hand back the controller
    pub async fn shutdown(self) -> Result<Controller> {
        drop(self.tx);
        self.task.await.map_err(|e| {
            error!("Controller worker panicked: {}", e);
            ControllerError::Worker(e.to_string())
        })
    }
}
