use crate::{Error, Result};
use l3ls_packets::MacAddr;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// The router identity the controller answers ARP for. Fixed at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayIdentity {
    mac: MacAddr,
    ips: BTreeSet<Ipv4Addr>,
}

impl GatewayIdentity {
    pub fn new<I: IntoIterator<Item = Ipv4Addr>>(mac: MacAddr, ips: I) -> Result<Self> {
        let ips: BTreeSet<Ipv4Addr> = ips.into_iter().collect();
        if ips.is_empty() {
            return Err(Error::NoGatewayAddress);
        }
        Ok(GatewayIdentity { mac, ips })
    }

    /// Builds the identity from a MAC in `aa:bb:cc:dd:ee:ff` form.
    pub fn parse<I: IntoIterator<Item = Ipv4Addr>>(mac: &str, ips: I) -> Result<Self> {
        let mac = MacAddr::from_str(mac).map_err(|_| Error::InvalidMacAddr(mac.to_string()))?;
        GatewayIdentity::new(mac, ips)
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ips(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.ips.iter()
    }

    pub fn is_gateway_ip(&self, addr: &Ipv4Addr) -> bool {
        self.ips.contains(addr)
    }
}

/// Whether a resolved IPv4 flow is pushed to the switch or only logged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowInstallPolicy {
    Install,
    LogOnly,
}

impl Default for FlowInstallPolicy {
    fn default() -> Self {
        FlowInstallPolicy::Install
    }
}

impl FromStr for FlowInstallPolicy {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "install" => Ok(FlowInstallPolicy::Install),
            "log" | "log-only" => Ok(FlowInstallPolicy::LogOnly),
            _ => Err("flow policy must be one of: install, log"),
        }
    }
}

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub gateway: GatewayIdentity,
    pub flow_policy: FlowInstallPolicy,
    pub workers: usize,
}

impl ControllerConfig {
    pub fn new(gateway: GatewayIdentity) -> Self {
        ControllerConfig {
            gateway,
            flow_policy: FlowInstallPolicy::default(),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn flow_policy(self, flow_policy: FlowInstallPolicy) -> Self {
        ControllerConfig {
            flow_policy,
            ..self
        }
    }

    /// Number of tasks draining the event channel. Zero is treated as one.
    pub fn workers(self, workers: usize) -> Self {
        ControllerConfig {
            workers: workers.max(1),
            ..self
        }
    }
}
