extern crate crossbeam;
extern crate tokio;

/// Classifiers look at a frame by reference and decide which handler it belongs to. The ether-type
/// classifier also decodes the frame into the ARP or IPv4 view that handler expects.
pub mod classifier;

/// Processors are the handlers of the controller. Each takes one decoded packet, annotated with the
/// switch and port it arrived on, and produces at most one message to send back toward a switch.
pub mod processor;

/// Per-switch learned state. A `LearningTable` holds the IP -> MAC and IP -> port bindings of one
/// switch, and the `SwitchRegistry` owns one table per connected switch.
pub mod state;

/// The subset of OpenFlow messages the controller exchanges with switches.
pub mod openflow;

mod config;
pub use self::config::*;

mod error;
pub use self::error::*;

mod dispatcher;
pub use self::dispatcher::*;

mod controller;
pub use self::controller::*;
