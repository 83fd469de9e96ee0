mod transport;

use anyhow::{anyhow, Context, Result};
use clap::{value_t, values_t, App, Arg};
use crossbeam::crossbeam_channel::{unbounded, Receiver, Sender};
use l3ls_runtime::openflow::{ControllerEvent, OutboundMessage};
use l3ls_runtime::{run_controller, ControllerConfig, FlowInstallPolicy, GatewayIdentity};
use std::io::{self, BufRead, Write};
use std::net::Ipv4Addr;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // Collect arguments from user
    let matches = App::new("l3ls switchd")
        .version("0.1")
        .about("Layer 3 learning switch controller. Reads switch events on stdin, writes switch messages on stdout")
        .arg(Arg::with_name("gateway_mac")
             .short("m")
             .long("gateway-mac")
             .value_name("MAC")
             .help("MAC address the gateway answers ARP with")
             .required(true)
             .takes_value(true))
        .arg(Arg::with_name("gateway_ip")
             .short("i")
             .long("gateway-ip")
             .value_name("IPV4")
             .help("Gateway IPv4 address, may be given more than once")
             .required(true)
             .takes_value(true)
             .multiple(true)
             .number_of_values(1))
        .arg(Arg::with_name("flow_policy")
             .short("p")
             .long("flow-policy")
             .value_name("POLICY")
             .help("Whether resolved flows are installed on the switch or only logged")
             .possible_values(&["install", "log"])
             .default_value("install")
             .takes_value(true))
        .arg(Arg::with_name("workers")
             .short("w")
             .long("workers")
             .value_name("N")
             .help("Number of workers handling switch events")
             .default_value("4")
             .takes_value(true))
        .get_matches();

    let gateway_mac = matches.value_of("gateway_mac").unwrap();
    let gateway_ips = values_t!(matches, "gateway_ip", Ipv4Addr).unwrap_or_else(|e| e.exit());
    let flow_policy =
        value_t!(matches, "flow_policy", FlowInstallPolicy).unwrap_or_else(|e| e.exit());
    let workers = value_t!(matches, "workers", usize).unwrap_or_else(|e| e.exit());

    let gateway = GatewayIdentity::parse(gateway_mac, gateway_ips)
        .context("invalid gateway identity")?;
    let config = ControllerConfig::new(gateway)
        .flow_policy(flow_policy)
        .workers(workers);

    let (event_sender, event_receiver) = unbounded();
    let (message_sender, message_receiver) = unbounded();

    let reader = thread::spawn(move || read_events(event_sender));
    let writer = thread::spawn(move || write_messages(message_receiver));

    run_controller(config, event_receiver, message_sender)?;

    reader
        .join()
        .map_err(|_| anyhow!("stdin reader panicked"))??;
    writer
        .join()
        .map_err(|_| anyhow!("stdout writer panicked"))??;

    info!("all switch events handled");
    Ok(())
}

/// Feeds stdin into the controller until EOF. Dropping `events` on return lets the controller
/// drain and stop.
fn read_events(events: Sender<ControllerEvent>) -> Result<()> {
    let stdin = io::stdin();
    for (number, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        match transport::parse_event(&line) {
            Ok(Some(event)) => {
                if events.send(event).is_err() {
                    warn!("controller stopped, discarding remaining input");
                    break;
                }
            }
            Ok(None) => (),
            Err(err) => warn!(line = number + 1, error = %err, "skipping input line"),
        }
    }
    Ok(())
}

fn write_messages(messages: Receiver<OutboundMessage>) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for message in messages.iter() {
        writeln!(stdout, "{}", transport::format_message(&message))
            .context("failed to write stdout")?;
        stdout.flush().context("failed to flush stdout")?;
    }
    Ok(())
}
