use crate::openflow::{DatapathId, PortNo};

/// A packet the switch could not match, handed to the controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketIn {
    pub datapath: DatapathId,
    pub in_port: PortNo,
    pub data: Vec<u8>,
}

/// Everything the hosting transport reports to the controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    SwitchConnected(DatapathId),
    SwitchDisconnected(DatapathId),
    PacketIn(PacketIn),
}
