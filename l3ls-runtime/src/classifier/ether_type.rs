use crate::classifier::Classifier;
use crate::{Error, Result};
use l3ls_packets::{ArpFrame, EthernetFrame, Ipv4Packet, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use std::convert::TryFrom;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EtherClass {
    Arp,
    Ipv4,
    Other(u16),
}

#[derive(Clone, Default)]
pub struct ClassifyByEtherType {}

impl ClassifyByEtherType {
    pub fn new() -> Self {
        ClassifyByEtherType {}
    }

    /// Classifies `frame` and wraps it in the view its handler works on. Frames that are too short
    /// for their protocol's header come back as `MalformedPacket`.
    pub fn decode(&self, frame: EthernetFrame) -> Result<DecodedFrame> {
        match self.classify(&frame) {
            EtherClass::Arp => ArpFrame::try_from(frame)
                .map(DecodedFrame::Arp)
                .map_err(Error::MalformedPacket),
            EtherClass::Ipv4 => Ipv4Packet::try_from(frame)
                .map(DecodedFrame::Ipv4)
                .map_err(Error::MalformedPacket),
            EtherClass::Other(ether_type) => Ok(DecodedFrame::Other(ether_type)),
        }
    }
}

impl Classifier for ClassifyByEtherType {
    type Packet = EthernetFrame;
    type Class = EtherClass;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        match packet.ether_type() {
            ARP_ETHER_TYPE => EtherClass::Arp,
            IPV4_ETHER_TYPE => EtherClass::Ipv4,
            ether_type => EtherClass::Other(ether_type),
        }
    }
}

/// A frame decoded as far as the controller cares about
#[derive(Clone, Debug)]
pub enum DecodedFrame {
    Arp(ArpFrame),
    Ipv4(Ipv4Packet),
    /// Not handled. Carries the ether type for logging.
    Other(u16),
}
