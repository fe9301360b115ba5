//! Per-switch MAC learning cache
//!
//! Records the ingress port on which each source address was last seen at
//! each switch. Advisory only: forwarding decisions come from the topology
//! graph, this table backs diagnostics and lets callers cross-check what a
//! switch has observed.

use chrono::{DateTime, Utc};
use hopwire_protocol::{DatapathId, MacAddr, PortNo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Last sighting of an address on a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    pub port: PortNo,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Switch -> (address -> last ingress port)
#[derive(Debug, Clone, Default)]
pub struct MacTable {
    switches: HashMap<DatapathId, HashMap<MacAddr, MacEntry>>,
}

impl MacTable {
    pub fn new() -> Self {
        MacTable {
            switches: HashMap::new(),
        }
    }

    /// Record that `mac` arrived on `port` at `dpid`
    ///
    /// Returns the previous port if the address moved.
    pub fn learn(&mut self, dpid: DatapathId, mac: MacAddr, port: PortNo) -> Option<PortNo> {
        self.learn_at(dpid, mac, port, Utc::now())
    }

    pub fn learn_at(
        &mut self,
        dpid: DatapathId,
        mac: MacAddr,
        port: PortNo,
        now: DateTime<Utc>,
    ) -> Option<PortNo> {
        let table = self.switches.entry(dpid).or_default();

        match table.get_mut(&mac) {
            Some(entry) => {
                let previous = entry.port;
                entry.port = port;
                entry.last_seen = now;
                (previous != port).then_some(previous)
            }
            None => {
                table.insert(
                    mac,
                    MacEntry {
                        port,
                        first_seen: now,
                        last_seen: now,
                    },
                );
                None
            }
        }
    }

    pub fn lookup(&self, dpid: DatapathId, mac: &MacAddr) -> Option<PortNo> {
        self.entry(dpid, mac).map(|e| e.port)
    }

    pub fn entry(&self, dpid: DatapathId, mac: &MacAddr) -> Option<&MacEntry> {
        self.switches.get(&dpid)?.get(mac)
    }

    /// Drop everything learned at a switch, returning how many entries went
    pub fn forget_switch(&mut self, dpid: DatapathId) -> usize {
        self.switches.remove(&dpid).map(|t| t.len()).unwrap_or(0)
    }

    /// Drop entries not refreshed since `cutoff`
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut pruned = 0;
        for table in self.switches.values_mut() {
            let before = table.len();
            table.retain(|_, entry| entry.last_seen >= cutoff);
            pruned += before - table.len();
        }
        self.switches.retain(|_, table| !table.is_empty());
        pruned
    }

    /// Entries for one switch
    pub fn entries(&self, dpid: DatapathId) -> Vec<(MacAddr, MacEntry)> {
        let mut entries: Vec<(MacAddr, MacEntry)> = self
            .switches
            .get(&dpid)
            .map(|t| t.iter().map(|(mac, e)| (*mac, *e)).collect())
            .unwrap_or_default();
        entries.sort_by_key(|(mac, _)| *mac);
        entries
    }

    /// Total entries across all switches
    pub fn len(&self) -> usize {
        self.switches.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_learn_and_lookup() {
        let mut table = MacTable::new();
        let dpid = DatapathId::new(1);
        let mac = MacAddr::from_u64(0xa);

        assert_eq!(table.learn(dpid, mac, 3), None);
        assert_eq!(table.lookup(dpid, &mac), Some(3));
        assert_eq!(table.lookup(DatapathId::new(2), &mac), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_learn_reports_move() {
        let mut table = MacTable::new();
        let dpid = DatapathId::new(1);
        let mac = MacAddr::from_u64(0xa);

        table.learn(dpid, mac, 3);
        assert_eq!(table.learn(dpid, mac, 3), None);
        assert_eq!(table.learn(dpid, mac, 5), Some(3));
        assert_eq!(table.lookup(dpid, &mac), Some(5));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_first_seen_is_kept() {
        let mut table = MacTable::new();
        let dpid = DatapathId::new(1);
        let mac = MacAddr::from_u64(0xa);
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(30);

        table.learn_at(dpid, mac, 1, t0);
        table.learn_at(dpid, mac, 1, t1);

        let entry = table.entry(dpid, &mac).unwrap();
        assert_eq!(entry.first_seen, t0);
        assert_eq!(entry.last_seen, t1);
    }

    #[test]
    fn test_forget_switch() {
        let mut table = MacTable::new();
        table.learn(DatapathId::new(1), MacAddr::from_u64(1), 1);
        table.learn(DatapathId::new(1), MacAddr::from_u64(2), 2);
        table.learn(DatapathId::new(2), MacAddr::from_u64(1), 4);

        assert_eq!(table.forget_switch(DatapathId::new(1)), 2);
        assert_eq!(table.forget_switch(DatapathId::new(1)), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_prune_older_than() {
        let mut table = MacTable::new();
        let t0 = Utc::now();
        table.learn_at(DatapathId::new(1), MacAddr::from_u64(1), 1, t0);
        table.learn_at(
            DatapathId::new(1),
            MacAddr::from_u64(2),
            2,
            t0 + Duration::seconds(120),
        );

        let pruned = table.prune_older_than(t0 + Duration::seconds(60));
        assert_eq!(pruned, 1);
        assert_eq!(table.lookup(DatapathId::new(1), &MacAddr::from_u64(2)), Some(2));
        assert_eq!(table.lookup(DatapathId::new(1), &MacAddr::from_u64(1)), None);
    }

    #[test]
    fn test_entries_sorted() {
        let mut table = MacTable::new();
        let dpid = DatapathId::new(1);
        table.learn(dpid, MacAddr::from_u64(9), 1);
        table.learn(dpid, MacAddr::from_u64(3), 2);

        let macs: Vec<MacAddr> = table.entries(dpid).into_iter().map(|(m, _)| m).collect();
        assert_eq!(macs, vec![MacAddr::from_u64(3), MacAddr::from_u64(9)]);
        assert!(table.entries(DatapathId::new(7)).is_empty());
    }
}
