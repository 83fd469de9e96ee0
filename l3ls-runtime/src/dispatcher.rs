use crate::classifier::{ClassifyByEtherType, DecodedFrame};
use crate::openflow::{OutboundMessage, PacketIn};
use crate::processor::{ArpHandler, IpHandler, Processor, SwitchAnnotated};
use crate::state::SwitchRegistry;
use crate::{Error, FlowInstallPolicy, GatewayIdentity, Result};
use l3ls_packets::EthernetFrame;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for packet-ins. Decodes the frame and hands it to the ARP or IPv4 handler.
///
/// The dispatcher keeps no state of its own. Cloning it shares the registry and gateway, so each
/// worker can hold its own copy.
#[derive(Clone)]
pub struct Dispatcher {
    classifier: ClassifyByEtherType,
    arp_handler: ArpHandler,
    ip_handler: IpHandler,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SwitchRegistry>,
        gateway: Arc<GatewayIdentity>,
        flow_policy: FlowInstallPolicy,
    ) -> Self {
        Dispatcher {
            classifier: ClassifyByEtherType::new(),
            arp_handler: ArpHandler::new(registry.clone(), gateway.clone()),
            ip_handler: IpHandler::new(registry, gateway, flow_policy),
        }
    }

    /// Handles one packet-in. Malformed frames are logged and dropped, they never surface as
    /// errors to the caller.
    pub fn dispatch(&mut self, packet_in: PacketIn) -> Option<OutboundMessage> {
        let datapath = packet_in.datapath;
        let in_port = packet_in.in_port;
        match self.try_dispatch(packet_in) {
            Ok(message) => message,
            Err(err) => {
                warn!(datapath, in_port, error = %err, "dropping packet");
                None
            }
        }
    }

    fn try_dispatch(&mut self, packet_in: PacketIn) -> Result<Option<OutboundMessage>> {
        let frame = EthernetFrame::from_buffer(packet_in.data, 0).map_err(Error::MalformedPacket)?;

        let message = match self.classifier.decode(frame)? {
            DecodedFrame::Arp(arp) => self.arp_handler.process(SwitchAnnotated {
                packet: arp,
                datapath: packet_in.datapath,
                in_port: packet_in.in_port,
            }),
            DecodedFrame::Ipv4(ipv4) => self.ip_handler.process(SwitchAnnotated {
                packet: ipv4,
                datapath: packet_in.datapath,
                in_port: packet_in.in_port,
            }),
            DecodedFrame::Other(ether_type) => {
                debug!(
                    datapath = packet_in.datapath,
                    ether_type = %format!("{:#06x}", ether_type),
                    "ignoring frame"
                );
                None
            }
        };
        Ok(message)
    }
}
