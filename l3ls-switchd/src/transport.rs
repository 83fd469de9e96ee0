use anyhow::{anyhow, bail, Context, Result};
use l3ls_runtime::openflow::{
    Action, ControllerEvent, DatapathId, FlowModCommand, Match, Message, OutboundMessage, PacketIn,
    PortNo, PseudoPort,
};

/// Parses one input line into an event. Blank lines and `#` comments yield `None`.
///
/// ```text
/// connect <dpid>
/// disconnect <dpid>
/// packet-in <dpid> <port> <hex-frame>
/// ```
pub fn parse_event(line: &str) -> Result<Option<ControllerEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let command = fields.next().unwrap_or_default();
    let event = match command {
        "connect" => ControllerEvent::SwitchConnected(parse_datapath(fields.next())?),
        "disconnect" => ControllerEvent::SwitchDisconnected(parse_datapath(fields.next())?),
        "packet-in" => {
            let datapath = parse_datapath(fields.next())?;
            let in_port = required(fields.next(), "port")?
                .parse::<PortNo>()
                .context("invalid port")?;
            let data = hex::decode(required(fields.next(), "frame")?)
                .context("frame is not valid hex")?;
            ControllerEvent::PacketIn(PacketIn {
                datapath,
                in_port,
                data,
            })
        }
        other => bail!("unknown command {:?}", other),
    };

    if let Some(extra) = fields.next() {
        bail!("unexpected trailing field {:?}", extra);
    }
    Ok(Some(event))
}

fn required<'a>(field: Option<&'a str>, name: &str) -> Result<&'a str> {
    field.ok_or_else(|| anyhow!("missing {}", name))
}

/// Datapath ids are decimal, or hex with a `0x` prefix.
fn parse_datapath(field: Option<&str>) -> Result<DatapathId> {
    let field = required(field, "datapath id")?;
    let parsed = match field.strip_prefix("0x") {
        Some(hex) => DatapathId::from_str_radix(hex, 16),
        None => field.parse::<DatapathId>(),
    };
    parsed.with_context(|| format!("invalid datapath id {:?}", field))
}

/// Renders a message as one output line.
///
/// ```text
/// packet-out <dpid> <port|flood> <hex-frame>
/// flow-mod <dpid> add <match> <actions>
/// ```
pub fn format_message(message: &OutboundMessage) -> String {
    match &message.message {
        Message::PacketOut(packet_out) => format!(
            "packet-out {} {} {}",
            message.destination,
            format_port(packet_out.output),
            hex::encode(&packet_out.data)
        ),
        Message::FlowMod(flow_mod) => {
            let command = match flow_mod.command {
                FlowModCommand::Add => "add",
            };
            format!(
                "flow-mod {} {} {} {}",
                message.destination,
                command,
                format_match(&flow_mod.pattern),
                format_actions(&flow_mod.actions)
            )
        }
    }
}

fn format_port(port: PseudoPort) -> String {
    match port {
        PseudoPort::Physical(port) => port.to_string(),
        PseudoPort::Flood => "flood".to_string(),
    }
}

fn format_match(pattern: &Match) -> String {
    let mut fields = Vec::new();
    if let Some(dl_type) = pattern.dl_type {
        fields.push(format!("dl_type={:#06x}", dl_type));
    }
    if let Some(nw_src) = pattern.nw_src {
        fields.push(format!("nw_src={}", nw_src));
    }
    if let Some(nw_dst) = pattern.nw_dst {
        fields.push(format!("nw_dst={}", nw_dst));
    }

    if fields.is_empty() {
        "*".to_string()
    } else {
        fields.join(",")
    }
}

fn format_actions(actions: &[Action]) -> String {
    if actions.is_empty() {
        return "drop".to_string();
    }
    actions
        .iter()
        .map(|action| match action {
            Action::SetDlSrc(mac) => format!("set_dl_src={}", mac),
            Action::SetDlDst(mac) => format!("set_dl_dst={}", mac),
            Action::Output(port) => format!("output={}", format_port(*port)),
        })
        .collect::<Vec<String>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use l3ls_packets::MacAddr;
    use l3ls_runtime::openflow::FlowMod;
    use std::net::Ipv4Addr;

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_event("").unwrap(), None);
        assert_eq!(parse_event("   \t").unwrap(), None);
        assert_eq!(parse_event("# connect 1").unwrap(), None);
    }

    #[test]
    fn parses_lifecycle_events() {
        assert_eq!(
            parse_event("connect 7").unwrap(),
            Some(ControllerEvent::SwitchConnected(7))
        );
        assert_eq!(
            parse_event("  disconnect 0x1f  ").unwrap(),
            Some(ControllerEvent::SwitchDisconnected(0x1f))
        );
    }

    #[test]
    fn parses_packet_in() {
        assert_eq!(
            parse_event("packet-in 1 3 ffffffffffff0806").unwrap(),
            Some(ControllerEvent::PacketIn(PacketIn {
                datapath: 1,
                in_port: 3,
                data: vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x08, 0x06],
            }))
        );
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(parse_event("hello 1").is_err());
        assert!(parse_event("connect").is_err());
        assert!(parse_event("connect one").is_err());
        assert!(parse_event("connect 1 2").is_err());
        assert!(parse_event("packet-in 1 3").is_err());
        assert!(parse_event("packet-in 1 port 0806").is_err());
        assert!(parse_event("packet-in 1 3 xyz").is_err());
    }

    #[test]
    fn formats_packet_out() {
        let flood = OutboundMessage::packet_out(2, vec![0x08, 0x06], PseudoPort::Flood);
        assert_eq!(format_message(&flood), "packet-out 2 flood 0806");

        let unicast = OutboundMessage::packet_out(2, vec![0xab], PseudoPort::Physical(4));
        assert_eq!(format_message(&unicast), "packet-out 2 4 ab");
    }

    #[test]
    fn formats_flow_mod() {
        let flow_mod = FlowMod::add_flow(
            Match::ipv4_pair(Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 5)),
            vec![
                Action::SetDlSrc(MacAddr::new([2, 0, 0, 0, 0, 1])),
                Action::SetDlDst(MacAddr::new([0xbb; 6])),
                Action::Output(PseudoPort::Physical(7)),
            ],
        );
        assert_eq!(
            format_message(&OutboundMessage::flow_mod(1, flow_mod)),
            "flow-mod 1 add dl_type=0x0800,nw_src=10.0.0.2,nw_dst=10.0.0.5 \
             set_dl_src=02:00:00:00:00:01,set_dl_dst=bb:bb:bb:bb:bb:bb,output=7"
        );
    }

    #[test]
    fn formats_wildcard_match() {
        let flow_mod = FlowMod::add_flow(Match::match_all(), vec![]);
        assert_eq!(
            format_message(&OutboundMessage::flow_mod(1, flow_mod)),
            "flow-mod 1 add * drop"
        );
    }
}
