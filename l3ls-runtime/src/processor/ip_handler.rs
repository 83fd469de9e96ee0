use crate::openflow::{Action, FlowMod, Match, OutboundMessage, PortNo, PseudoPort};
use crate::processor::{Processor, SwitchAnnotated};
use crate::state::SwitchRegistry;
use crate::{FlowInstallPolicy, GatewayIdentity};
use l3ls_packets::{ArpFrame, ArpOp, Ipv4Packet, MacAddr};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::info;

/// Decides what happens to IPv4 traffic the switch could not match: a flow towards a known
/// destination, or an ARP broadcast to find an unknown one.
#[derive(Clone)]
pub struct IpHandler {
    registry: Arc<SwitchRegistry>,
    gateway: Arc<GatewayIdentity>,
    flow_policy: FlowInstallPolicy,
}

impl IpHandler {
    pub fn new(
        registry: Arc<SwitchRegistry>,
        gateway: Arc<GatewayIdentity>,
        flow_policy: FlowInstallPolicy,
    ) -> Self {
        IpHandler {
            registry,
            gateway,
            flow_policy,
        }
    }

    /// ARP request from the gateway for `target`, broadcast so that whoever owns the address
    /// answers. The sender protocol address and target hardware address are left zeroed.
    fn discovery_request(&self, target: Ipv4Addr) -> ArpFrame {
        let mut request = ArpFrame::new();
        request.set_opcode(ArpOp::Request);
        request.set_sender_mac_addr(self.gateway.mac());
        request.set_target_ipv4_addr(target);

        let ethernet = request.ethernet_mut();
        ethernet.set_src_mac(self.gateway.mac());
        ethernet.set_dest_mac(MacAddr::BROADCAST);
        request
    }

    /// Flow for `src` -> `dst` traffic, rewritten as if routed by the gateway and sent out of the
    /// port `dst` was learned on.
    fn forwarding_flow(&self, src: Ipv4Addr, dst: Ipv4Addr, mac: MacAddr, port: PortNo) -> FlowMod {
        FlowMod::add_flow(
            Match::ipv4_pair(src, dst),
            vec![
                Action::SetDlSrc(self.gateway.mac()),
                Action::SetDlDst(mac),
                Action::Output(PseudoPort::Physical(port)),
            ],
        )
    }
}

impl Processor for IpHandler {
    type Input = SwitchAnnotated<Ipv4Packet>;
    type Output = OutboundMessage;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        let src = packet.packet.src_addr();
        let dst = packet.packet.dest_addr();
        info!(datapath = packet.datapath, src = %src, dst = %dst, "IPv4 packet received");

        match self.registry.lookup_binding(packet.datapath, &dst) {
            Some((mac, port)) => {
                let flow_mod = self.forwarding_flow(src, dst, mac, port);
                match self.flow_policy {
                    FlowInstallPolicy::Install => {
                        info!(
                            datapath = packet.datapath,
                            src = %src,
                            dst = %dst,
                            mac = %mac,
                            port,
                            "installing flow, subsequent packets bypass the controller"
                        );
                        Some(OutboundMessage::flow_mod(packet.datapath, flow_mod))
                    }
                    FlowInstallPolicy::LogOnly => {
                        info!(
                            datapath = packet.datapath,
                            src = %src,
                            dst = %dst,
                            mac = %mac,
                            port,
                            "flow resolved, not installed"
                        );
                        None
                    }
                }
            }
            None => {
                let request = self.discovery_request(dst);
                info!(datapath = packet.datapath, target = %dst, "flooding ARP request");
                Some(OutboundMessage::packet_out(
                    packet.datapath,
                    request.frame().as_bytes().to_vec(),
                    PseudoPort::Flood,
                ))
            }
        }
    }
}
