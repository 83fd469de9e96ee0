use crate::openflow::{ControllerEvent, OutboundMessage};
use crate::state::SwitchRegistry;
use crate::{ControllerConfig, Dispatcher, Error, Result};
use crossbeam::crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reacts to the events of every switch. Switch lifecycle events maintain the registry, packet-ins
/// go through the Dispatcher.
#[derive(Clone)]
pub struct Controller {
    registry: Arc<SwitchRegistry>,
    dispatcher: Dispatcher,
}

impl Controller {
    pub fn new(config: &ControllerConfig) -> Self {
        let registry = Arc::new(SwitchRegistry::new());
        let dispatcher = Dispatcher::new(
            registry.clone(),
            Arc::new(config.gateway.clone()),
            config.flow_policy,
        );
        Controller {
            registry,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<SwitchRegistry> {
        &self.registry
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> Option<OutboundMessage> {
        match event {
            ControllerEvent::SwitchConnected(datapath) => {
                self.registry.connect(datapath);
                info!(datapath, "switch connected");
                None
            }
            ControllerEvent::SwitchDisconnected(datapath) => {
                if self.registry.disconnect(datapath).is_none() {
                    debug!(datapath, "disconnect from unknown switch");
                }
                info!(datapath, "switch disconnected");
                None
            }
            ControllerEvent::PacketIn(packet_in) => self.dispatcher.dispatch(packet_in),
        }
    }

    /// Handles events until `events` is disconnected and drained, pushing every message produced
    /// into `messages`.
    pub fn serve(&mut self, events: &Receiver<ControllerEvent>, messages: &Sender<OutboundMessage>) {
        for event in events.iter() {
            if let Some(message) = self.handle_event(event) {
                if messages.send(message).is_err() {
                    warn!("outbound channel closed, stopping");
                    return;
                }
            }
        }
    }
}

/// Runs the controller on a threaded tokio runtime.
///
/// `config.workers` tasks share the event channel, so events, including packet-ins from the same
/// switch, may be handled in parallel and in any order. Returns once every sender of `events` has
/// been dropped and the channel has been drained.
pub fn run_controller(
    config: ControllerConfig,
    events: Receiver<ControllerEvent>,
    messages: Sender<OutboundMessage>,
) -> Result<()> {
    let mut runtime = runtime::Builder::new()
        .threaded_scheduler()
        .enable_all()
        .build()?;

    let controller = Controller::new(&config);
    info!(
        gateway_mac = %config.gateway.mac(),
        workers = config.workers,
        flow_policy = ?config.flow_policy,
        "controller starting"
    );

    runtime.block_on(async {
        let handles: Vec<JoinHandle<()>> = (0..config.workers.max(1))
            .map(|_| {
                let mut controller = controller.clone();
                let events = events.clone();
                let messages = messages.clone();
                // crossbeam receivers block, so workers live on the blocking pool
                tokio::task::spawn_blocking(move || controller.serve(&events, &messages))
            })
            .collect();

        // 🏃💨💨
        for result in futures::future::join_all(handles).await {
            if result.is_err() {
                return Err(Error::WorkerPanicked);
            }
        }
        Ok(())
    })?;

    info!("controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflow::{Message, PacketIn, PseudoPort};
    use crate::utils::test::packet_builders::{arp_reply, arp_request, ipv4_frame};
    use crate::GatewayIdentity;
    use l3ls_packets::MacAddr;
    use maplit::hashset;
    use std::net::Ipv4Addr;

    const GATEWAY_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const GATEWAY_MAC: MacAddr = MacAddr {
        bytes: [0x02, 0, 0, 0, 0, 0x01],
    };

    fn config() -> ControllerConfig {
        ControllerConfig::new(GatewayIdentity::new(GATEWAY_MAC, hashset! {GATEWAY_IP}).unwrap())
    }

    fn packet_in(datapath: u64, in_port: u32, frame: l3ls_packets::EthernetFrame) -> ControllerEvent {
        ControllerEvent::PacketIn(PacketIn {
            datapath,
            in_port,
            data: frame.as_bytes().to_vec(),
        })
    }

    #[test]
    fn lifecycle_events_maintain_registry() {
        let mut controller = Controller::new(&config());

        assert_eq!(controller.handle_event(ControllerEvent::SwitchConnected(1)), None);
        assert!(controller.registry().contains(1));

        assert_eq!(
            controller.handle_event(ControllerEvent::SwitchDisconnected(1)),
            None
        );
        assert!(!controller.registry().contains(1));
    }

    #[test]
    fn discovery_then_flow() {
        let mut controller = Controller::new(&config());
        controller.handle_event(ControllerEvent::SwitchConnected(1));

        let a = Ipv4Addr::new(10, 0, 0, 2);
        let b = Ipv4Addr::new(10, 0, 0, 5);
        let a_mac = MacAddr::new([0xaa; 6]);
        let b_mac = MacAddr::new([0xbb; 6]);

        let flood = controller
            .handle_event(packet_in(1, 3, ipv4_frame(a_mac, a, b)))
            .unwrap();
        match flood.message {
            Message::PacketOut(packet_out) => assert_eq!(packet_out.output, PseudoPort::Flood),
            other => panic!("expected packet out, got {:?}", other),
        }

        assert_eq!(
            controller.handle_event(packet_in(1, 7, arp_reply(b_mac, b, GATEWAY_MAC, GATEWAY_IP))),
            None
        );

        let flow = controller
            .handle_event(packet_in(1, 3, ipv4_frame(a_mac, a, b)))
            .unwrap();
        match flow.message {
            Message::FlowMod(flow_mod) => {
                assert_eq!(flow_mod.output(), Some(PseudoPort::Physical(7)))
            }
            other => panic!("expected flow mod, got {:?}", other),
        }
    }

    #[test]
    fn disconnect_forgets_bindings() {
        let mut controller = Controller::new(&config());
        let a = Ipv4Addr::new(10, 0, 0, 2);
        controller.handle_event(ControllerEvent::SwitchConnected(1));
        controller.handle_event(packet_in(
            1,
            3,
            arp_request(MacAddr::new([0xaa; 6]), a, GATEWAY_IP),
        ));
        assert!(controller.registry().lookup_mac(1, &a).is_some());

        controller.handle_event(ControllerEvent::SwitchDisconnected(1));
        controller.handle_event(ControllerEvent::SwitchConnected(1));
        assert_eq!(controller.registry().lookup_mac(1, &a), None);
    }

    #[test]
    fn serve_drains_channel() {
        let mut controller = Controller::new(&config());
        let (event_sender, event_receiver) = crossbeam::crossbeam_channel::unbounded();
        let (message_sender, message_receiver) = crossbeam::crossbeam_channel::unbounded();

        event_sender.send(ControllerEvent::SwitchConnected(1)).unwrap();
        event_sender
            .send(packet_in(
                1,
                3,
                arp_request(MacAddr::new([0xaa; 6]), Ipv4Addr::new(10, 0, 0, 2), GATEWAY_IP),
            ))
            .unwrap();
        drop(event_sender);

        controller.serve(&event_receiver, &message_sender);
        drop(message_sender);

        let messages: Vec<OutboundMessage> = message_receiver.iter().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].destination, 1);
    }

    #[test]
    fn packet_in_after_disconnect_leaves_no_table() {
        let mut controller = Controller::new(&config());
        let host = Ipv4Addr::new(10, 0, 0, 2);
        let request = || arp_request(MacAddr::new([0xaa; 6]), host, GATEWAY_IP);

        controller.handle_event(ControllerEvent::SwitchConnected(1));
        controller.handle_event(ControllerEvent::SwitchDisconnected(1));
        controller.handle_event(packet_in(1, 3, request()));
        controller.handle_event(packet_in(77, 3, request()));

        assert!(!controller.registry().contains(1));
        assert!(!controller.registry().contains(77));
        assert!(controller.registry().is_empty());
    }
}
