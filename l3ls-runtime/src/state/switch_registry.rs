use crate::openflow::{DatapathId, PortNo};
use crate::state::LearningTable;
use l3ls_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Owns the LearningTable of every switch the controller knows about.
///
/// Only `connect` creates a table, so a packet-in handled after a disconnect cannot bring the
/// switch back. Tables are independent of one another. The registry lock only guards membership,
/// lookups and writes against a table go through the table's own lock.
#[derive(Default)]
pub struct SwitchRegistry {
    switches: RwLock<HashMap<DatapathId, Arc<LearningTable>>>,
}

impl SwitchRegistry {
    pub fn new() -> Self {
        SwitchRegistry::default()
    }

    /// Creates an empty table for a newly connected switch. A switch that is already present
    /// keeps what it has learned.
    pub fn connect(&self, datapath: DatapathId) -> Arc<LearningTable> {
        let mut switches = self.switches.write().unwrap_or_else(PoisonError::into_inner);
        switches
            .entry(datapath)
            .or_insert_with(|| {
                debug!(datapath, "created learning table");
                Arc::new(LearningTable::new())
            })
            .clone()
    }

    /// Forgets a switch and everything learned on it.
    pub fn disconnect(&self, datapath: DatapathId) -> Option<Arc<LearningTable>> {
        self.switches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&datapath)
    }

    pub fn get(&self, datapath: DatapathId) -> Option<Arc<LearningTable>> {
        self.switches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&datapath)
            .cloned()
    }

    pub fn contains(&self, datapath: DatapathId) -> bool {
        self.get(datapath).is_some()
    }

    pub fn len(&self) -> usize {
        self.switches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a binding on a connected switch. Returns false, recording nothing, if `datapath`
    /// has no table.
    pub fn record_binding(
        &self,
        datapath: DatapathId,
        ip: Ipv4Addr,
        mac: MacAddr,
        port: PortNo,
    ) -> bool {
        match self.get(datapath) {
            Some(table) => {
                table.record_binding(ip, mac, port);
                true
            }
            None => false,
        }
    }

    pub fn lookup_mac(&self, datapath: DatapathId, ip: &Ipv4Addr) -> Option<MacAddr> {
        self.get(datapath)?.lookup_mac(ip)
    }

    pub fn lookup_port(&self, datapath: DatapathId, ip: &Ipv4Addr) -> Option<PortNo> {
        self.get(datapath)?.lookup_port(ip)
    }

    pub fn lookup_binding(&self, datapath: DatapathId, ip: &Ipv4Addr) -> Option<(MacAddr, PortNo)> {
        self.get(datapath)?.lookup_binding(ip)
    }
}
