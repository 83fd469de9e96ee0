use crate::openflow::PortNo;
use l3ls_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    arp: HashMap<Ipv4Addr, MacAddr>,
    port: HashMap<Ipv4Addr, PortNo>,
}

/// What one switch has learned about the hosts behind it: which MAC answers for an IPv4 address,
/// and on which port it was last seen.
///
/// Both maps sit behind a single lock, so a binding is always read and written as a pair. Entries
/// never expire and the table has no size bound.
#[derive(Default)]
pub struct LearningTable {
    tables: RwLock<Tables>,
}

impl LearningTable {
    /// Creates a new empty LearningTable
    pub fn new() -> Self {
        LearningTable::default()
    }

    /// Records that `ip` lives at `mac` behind `port`, overwriting whatever was known before.
    pub fn record_binding(&self, ip: Ipv4Addr, mac: MacAddr, port: PortNo) {
        let mut tables = self.write();
        tables.arp.insert(ip, mac);
        tables.port.insert(ip, port);
    }

    pub fn lookup_mac(&self, ip: &Ipv4Addr) -> Option<MacAddr> {
        self.read().arp.get(ip).copied()
    }

    pub fn lookup_port(&self, ip: &Ipv4Addr) -> Option<PortNo> {
        self.read().port.get(ip).copied()
    }

    /// Returns the MAC and port of `ip` from a single consistent read.
    pub fn lookup_binding(&self, ip: &Ipv4Addr) -> Option<(MacAddr, PortNo)> {
        let tables = self.read();
        match (tables.arp.get(ip), tables.port.get(ip)) {
            (Some(mac), Some(port)) => Some((*mac, *port)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.read().arp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Poisoning is ignored. The only writer is record_binding, which has nothing between its inserts.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}
