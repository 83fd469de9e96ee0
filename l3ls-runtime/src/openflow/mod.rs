//! Switches talk to the controller in OpenFlow terms: they report unmatched packets as packet-ins,
//! and the controller answers with packet-outs and flow-mods. Encoding these on the wire is left to
//! whatever transport hosts the controller, this module only models their contents.
mod message;
pub use self::message::*;

mod event;
pub use self::event::*;

/// Identifies a switch
pub type DatapathId = u64;

/// A switch port number
pub type PortNo = u32;
