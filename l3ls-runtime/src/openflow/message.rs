use crate::openflow::{DatapathId, PortNo};
use l3ls_packets::{MacAddr, IPV4_ETHER_TYPE};
use std::net::Ipv4Addr;

/// Where a packet-out leaves the switch
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PseudoPort {
    Physical(PortNo),
    /// Every port except the one the packet came in on
    Flood,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetDlSrc(MacAddr),
    SetDlDst(MacAddr),
    Output(PseudoPort),
}

/// Flow match fields. `None` is a wildcard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Match {
    pub dl_type: Option<u16>,
    pub nw_src: Option<Ipv4Addr>,
    pub nw_dst: Option<Ipv4Addr>,
}

impl Match {
    pub fn match_all() -> Match {
        Match::default()
    }

    /// Matches IPv4 traffic from `src` to `dst`
    pub fn ipv4_pair(src: Ipv4Addr, dst: Ipv4Addr) -> Match {
        Match {
            dl_type: Some(IPV4_ETHER_TYPE),
            nw_src: Some(src),
            nw_dst: Some(dst),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowModCommand {
    Add,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowMod {
    pub command: FlowModCommand,
    pub pattern: Match,
    pub actions: Vec<Action>,
}

impl FlowMod {
    pub fn add_flow(pattern: Match, actions: Vec<Action>) -> FlowMod {
        FlowMod {
            command: FlowModCommand::Add,
            pattern,
            actions,
        }
    }

    /// The port the flow forwards to, if it has an output action
    pub fn output(&self) -> Option<PseudoPort> {
        self.actions.iter().find_map(|action| match action {
            Action::Output(port) => Some(*port),
            _ => None,
        })
    }
}

/// A frame the switch should transmit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketOut {
    pub data: Vec<u8>,
    pub output: PseudoPort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    PacketOut(PacketOut),
    FlowMod(FlowMod),
}

/// A message addressed to one switch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: DatapathId,
    pub message: Message,
}

impl OutboundMessage {
    pub fn packet_out(destination: DatapathId, data: Vec<u8>, output: PseudoPort) -> Self {
        OutboundMessage {
            destination,
            message: Message::PacketOut(PacketOut { data, output }),
        }
    }

    pub fn flow_mod(destination: DatapathId, flow_mod: FlowMod) -> Self {
        OutboundMessage {
            destination,
            message: Message::FlowMod(flow_mod),
        }
    }
}
