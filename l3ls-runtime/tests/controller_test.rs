use crossbeam::crossbeam_channel::unbounded;
use l3ls_packets::{ArpFrame, ArpOp, EthernetFrame, MacAddr};
use l3ls_runtime::openflow::{Action, ControllerEvent, Message, OutboundMessage, PacketIn, PseudoPort};
use l3ls_runtime::utils::test::packet_builders::{arp_reply, arp_request, ipv4_frame};
use l3ls_runtime::{run_controller, ControllerConfig, FlowInstallPolicy, GatewayIdentity};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

const SWITCH: u64 = 0x1;
const GATEWAY_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const GATEWAY_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0x01],
};
const HOST_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
const HOST_A_MAC: MacAddr = MacAddr { bytes: [0xaa; 6] };
const HOST_B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
const HOST_B_MAC: MacAddr = MacAddr { bytes: [0xbb; 6] };

fn packet_in(datapath: u64, in_port: u32, frame: EthernetFrame) -> ControllerEvent {
    ControllerEvent::PacketIn(PacketIn {
        datapath,
        in_port,
        data: frame.as_bytes().to_vec(),
    })
}

fn config(workers: usize, flow_policy: FlowInstallPolicy) -> ControllerConfig {
    let gateway = GatewayIdentity::new(GATEWAY_MAC, vec![GATEWAY_IP]).unwrap();
    ControllerConfig::new(gateway)
        .workers(workers)
        .flow_policy(flow_policy)
}

/// Feeds `events` through a controller and returns everything it sent, in order.
fn run(config: ControllerConfig, events: Vec<ControllerEvent>) -> Vec<OutboundMessage> {
    let (event_sender, event_receiver) = unbounded();
    let (message_sender, message_receiver) = unbounded();

    for event in events {
        event_sender.send(event).unwrap();
    }
    drop(event_sender);

    run_controller(config, event_receiver, message_sender).unwrap();
    message_receiver.iter().collect()
}

fn packet_out_arp(message: &OutboundMessage) -> (ArpFrame, PseudoPort) {
    match &message.message {
        Message::PacketOut(packet_out) => {
            let frame = EthernetFrame::from_buffer(packet_out.data.clone(), 0).unwrap();
            (ArpFrame::try_from(frame).unwrap(), packet_out.output)
        }
        other => panic!("expected packet out, got {:?}", other),
    }
}

#[test]
fn gateway_reply_discovery_and_flow() {
    let messages = run(
        config(1, FlowInstallPolicy::Install),
        vec![
            ControllerEvent::SwitchConnected(SWITCH),
            packet_in(SWITCH, 3, arp_request(HOST_A_MAC, HOST_A, GATEWAY_IP)),
            packet_in(SWITCH, 3, ipv4_frame(HOST_A_MAC, HOST_A, HOST_B)),
            packet_in(SWITCH, 7, arp_reply(HOST_B_MAC, HOST_B, GATEWAY_MAC, GATEWAY_IP)),
            packet_in(SWITCH, 3, ipv4_frame(HOST_A_MAC, HOST_A, HOST_B)),
        ],
    );
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.destination == SWITCH));

    // Host A asks for the gateway and gets an answer on its own port
    let (reply, output) = packet_out_arp(&messages[0]);
    assert_eq!(output, PseudoPort::Physical(3));
    assert_eq!(reply.opcode(), ArpOp::Reply as u16);
    assert_eq!(reply.sender_mac_addr(), GATEWAY_MAC);
    assert_eq!(reply.sender_ipv4_addr(), GATEWAY_IP);
    assert_eq!(reply.target_mac_addr(), HOST_A_MAC);
    assert_eq!(reply.target_ipv4_addr(), HOST_A);

    // B is not known yet, so the controller goes looking for it
    let (request, output) = packet_out_arp(&messages[1]);
    assert_eq!(output, PseudoPort::Flood);
    assert!(request.is_request());
    assert_eq!(request.sender_mac_addr(), GATEWAY_MAC);
    assert_eq!(request.target_ipv4_addr(), HOST_B);

    match &messages[2].message {
        Message::FlowMod(flow_mod) => {
            assert_eq!(flow_mod.pattern.nw_src, Some(HOST_A));
            assert_eq!(flow_mod.pattern.nw_dst, Some(HOST_B));
            assert_eq!(
                flow_mod.actions,
                vec![
                    Action::SetDlSrc(GATEWAY_MAC),
                    Action::SetDlDst(HOST_B_MAC),
                    Action::Output(PseudoPort::Physical(7)),
                ]
            );
        }
        other => panic!("expected flow mod, got {:?}", other),
    }
}

#[test]
fn log_only_policy_sends_no_flow() {
    let messages = run(
        config(1, FlowInstallPolicy::LogOnly),
        vec![
            ControllerEvent::SwitchConnected(SWITCH),
            packet_in(SWITCH, 7, arp_reply(HOST_B_MAC, HOST_B, GATEWAY_MAC, GATEWAY_IP)),
            packet_in(SWITCH, 3, ipv4_frame(HOST_A_MAC, HOST_A, HOST_B)),
        ],
    );
    assert!(messages.is_empty());
}

#[test]
fn disconnect_resets_switch() {
    let messages = run(
        config(1, FlowInstallPolicy::Install),
        vec![
            ControllerEvent::SwitchConnected(SWITCH),
            packet_in(SWITCH, 7, arp_reply(HOST_B_MAC, HOST_B, GATEWAY_MAC, GATEWAY_IP)),
            ControllerEvent::SwitchDisconnected(SWITCH),
            ControllerEvent::SwitchConnected(SWITCH),
            packet_in(SWITCH, 3, ipv4_frame(HOST_A_MAC, HOST_A, HOST_B)),
        ],
    );
    assert_eq!(messages.len(), 1);
    let (_, output) = packet_out_arp(&messages[0]);
    assert_eq!(output, PseudoPort::Flood);
}

#[test]
fn malformed_frames_do_not_stop_the_controller() {
    let messages = run(
        config(1, FlowInstallPolicy::Install),
        vec![
            ControllerEvent::SwitchConnected(SWITCH),
            ControllerEvent::PacketIn(PacketIn {
                datapath: SWITCH,
                in_port: 3,
                data: vec![0xde, 0xad, 0xbe, 0xef],
            }),
            packet_in(SWITCH, 3, arp_request(HOST_A_MAC, HOST_A, GATEWAY_IP)),
        ],
    );
    assert_eq!(messages.len(), 1);
}

#[test]
fn many_workers_answer_every_switch() {
    let switches: Vec<u64> = (1..=32).collect();
    let mut events: Vec<ControllerEvent> = switches
        .iter()
        .map(|&dpid| ControllerEvent::SwitchConnected(dpid))
        .collect();
    events.extend(
        switches
            .iter()
            .map(|&dpid| packet_in(dpid, 1, arp_request(HOST_A_MAC, HOST_A, GATEWAY_IP))),
    );

    let messages = run(config(4, FlowInstallPolicy::Install), events);
    assert_eq!(messages.len(), switches.len());

    let mut destinations: Vec<u64> = messages.iter().map(|m| m.destination).collect();
    destinations.sort();
    assert_eq!(destinations, switches);
}
