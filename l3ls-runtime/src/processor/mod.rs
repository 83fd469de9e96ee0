use crate::openflow::{DatapathId, PortNo};

mod arp_handler;
pub use self::arp_handler::*;

mod ip_handler;
pub use self::ip_handler::*;

pub trait Processor {
    type Input: Send + Clone;
    type Output: Send + Clone;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output>;
}

/// SwitchAnnotated:
///
/// A type to wrap a packet, and annotate which switch reported it and which port of that switch
/// it arrived on.
#[derive(Clone, Debug)]
pub struct SwitchAnnotated<P> {
    pub packet: P,
    pub datapath: DatapathId,
    pub in_port: PortNo,
}
