//! Scenario replay
//!
//! A scenario is a YAML list of controller events replayed in order, standing
//! in for live switch connections:
//!
//! ```yaml
//! name: chain
//! steps:
//!   - kind: switch_joined
//!     dpid: 1
//!   - kind: link_up
//!     link: { src: 1, src_port: 2, dst: 2, dst_port: 1 }
//!   - kind: packet_in
//!     packet: { dpid: 1, in_port: 1, src: "00:00:00:00:00:0a", dst: "00:00:00:00:00:0b" }
//! ```

use anyhow::{Context, Result};
use hopwire_controller::EventSource;
use hopwire_protocol::{ControllerEvent, DatapathId, Link, MacAddr, PacketIn, PortNo};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tracing::debug;

/// An ordered list of events to feed the controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<ControllerEvent>,
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let mut scenario: Scenario = serde_yaml::from_str(contents)?;
        if scenario.name.is_empty() {
            scenario.name = "unnamed".to_string();
        }
        Ok(scenario)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Built-in three-tier tree network with eight hosts
    ///
    /// Core switch 1, aggregation switches 2 and 3, edge switches 4 to 7.
    /// Port 1 of every switch is its uplink and downlinks start at port 2.
    /// Host `n` (MAC `00:00:00:00:00:0n`) sits on edge switch `4 + (n-1)/2`.
    /// Every host announces itself with a broadcast, then each ordered pair
    /// of hosts exchanges one frame, as an all-pairs ping would.
    pub fn tree() -> Self {
        let mut steps: Vec<ControllerEvent> = (1..=7)
            .map(|id| ControllerEvent::SwitchJoined {
                dpid: DatapathId::new(id),
            })
            .collect();

        for parent in 1..=3u64 {
            for (i, child) in [parent * 2, parent * 2 + 1].into_iter().enumerate() {
                steps.push(ControllerEvent::LinkUp {
                    link: Link::new(
                        DatapathId::new(parent),
                        2 + i as PortNo,
                        DatapathId::new(child),
                        1,
                    ),
                });
            }
        }

        for h in 1..=8 {
            steps.push(tree_frame(h, MacAddr::BROADCAST));
        }
        for src in 1..=8 {
            for dst in (1..=8).filter(|dst| *dst != src) {
                steps.push(tree_frame(src, MacAddr::from_u64(dst)));
            }
        }

        Scenario {
            name: "tree".to_string(),
            steps,
        }
    }
}

/// Frame from tree host `h` as seen by its edge switch
fn tree_frame(h: u64, dst: MacAddr) -> ControllerEvent {
    let edge = DatapathId::new(4 + (h - 1) / 2);
    let port = 2 + ((h - 1) % 2) as PortNo;
    PacketIn::new(edge, port, MacAddr::from_u64(h), dst).into()
}

/// Event source replaying a scenario front to back
pub struct ScenarioSource {
    steps: VecDeque<ControllerEvent>,
    replayed: usize,
}

impl ScenarioSource {
    pub fn new(scenario: Scenario) -> Self {
        ScenarioSource {
            steps: scenario.steps.into(),
            replayed: 0,
        }
    }

    pub fn replayed(&self) -> usize {
        self.replayed
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait::async_trait]
impl EventSource for ScenarioSource {
    async fn next_event(&mut self) -> hopwire_controller::Result<Option<ControllerEvent>> {
        let event = self.steps.pop_front();
        if let Some(event) = &event {
            self.replayed += 1;
            debug!(step = self.replayed, kind = event.kind(), "Replaying step");
        }
        Ok(event)
    }
}
