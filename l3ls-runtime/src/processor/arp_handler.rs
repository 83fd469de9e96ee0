use crate::openflow::{OutboundMessage, PseudoPort};
use crate::processor::{Processor, SwitchAnnotated};
use crate::state::SwitchRegistry;
use crate::GatewayIdentity;
use l3ls_packets::{ArpFrame, ArpOp};
use std::sync::Arc;
use tracing::{debug, info};

/// Learns from every ARP packet a switch reports, and answers requests for the gateway.
#[derive(Clone)]
pub struct ArpHandler {
    registry: Arc<SwitchRegistry>,
    gateway: Arc<GatewayIdentity>,
}

impl ArpHandler {
    pub fn new(registry: Arc<SwitchRegistry>, gateway: Arc<GatewayIdentity>) -> Self {
        ArpHandler { registry, gateway }
    }

    /// Builds the reply to `request` as sent by the gateway: the requested address is claimed by
    /// the gateway MAC, and the frame goes straight back to whoever asked.
    fn gateway_reply(&self, request: &ArpFrame) -> ArpFrame {
        let mut reply = ArpFrame::new();
        reply.set_opcode(ArpOp::Reply);
        reply.set_sender_mac_addr(self.gateway.mac());
        reply.set_sender_ipv4_addr(request.target_ipv4_addr());
        reply.set_target_mac_addr(request.sender_mac_addr());
        reply.set_target_ipv4_addr(request.sender_ipv4_addr());

        let ethernet = reply.ethernet_mut();
        ethernet.set_src_mac(self.gateway.mac());
        ethernet.set_dest_mac(request.ethernet().src_mac());
        reply
    }
}

impl Processor for ArpHandler {
    type Input = SwitchAnnotated<ArpFrame>;
    type Output = OutboundMessage;

    ///
    /// The sender of any ARP packet, request or reply, is recorded as living behind the port the
    /// packet came in on. Learning does not depend on who the packet was meant for, only on the
    /// switch being connected.
    ///
    /// If the packet is a request for one of the gateway addresses, a reply is sent back out of
    /// that same port. Anything else produces no message.
    ///
    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        let arp = &packet.packet;
        let sender_ip = arp.sender_ipv4_addr();
        let sender_mac = arp.sender_mac_addr();

        if self
            .registry
            .record_binding(packet.datapath, sender_ip, sender_mac, packet.in_port)
        {
            info!(
                datapath = packet.datapath,
                ip = %sender_ip,
                mac = %sender_mac,
                port = packet.in_port,
                "learned binding"
            );
        } else {
            debug!(
                datapath = packet.datapath,
                ip = %sender_ip,
                "switch not connected, binding not learned"
            );
        }

        if !arp.is_request() || !self.gateway.is_gateway_ip(&arp.target_ipv4_addr()) {
            return None;
        }

        let reply = self.gateway_reply(arp);
        info!(
            datapath = packet.datapath,
            requester = %sender_ip,
            gateway_ip = %arp.target_ipv4_addr(),
            port = packet.in_port,
            "replying to ARP request for gateway"
        );

        Some(OutboundMessage::packet_out(
            packet.datapath,
            reply.frame().as_bytes().to_vec(),
            PseudoPort::Physical(packet.in_port),
        ))
    }
}
