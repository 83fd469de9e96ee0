use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The frame could not be decoded. The packet is dropped.
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    #[error("gateway needs at least one IPv4 address")]
    NoGatewayAddress,

    #[error("invalid MAC address {0:?}")]
    InvalidMacAddr(String),

    #[error("controller runtime failed to start")]
    Runtime(#[from] std::io::Error),

    #[error("controller worker panicked")]
    WorkerPanicked,
}
