// Core types used across all sockio components
use std::fmt;

/// Lifecycle state of a transport instance.
///
/// `Open` is the only state in which the transport owns a connected socket
/// eligible for send and receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoState {
    Closed,
    Opening,
    Open,
    Closing,
    Error,
}

impl fmt::Display for IoState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IoState::Closed => write!(f, "CLOSED"),
            IoState::Opening => write!(f, "OPENING"),
            IoState::Open => write!(f, "OPEN"),
            IoState::Closing => write!(f, "CLOSING"),
            IoState::Error => write!(f, "ERROR"),
        }
    }
}

// Address family used when connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressKind {
    #[default]
    Ip,
    DomainSocket,
}

impl AddressKind {
    pub const IP: &'static str = "ip";
    pub const DOMAIN_SOCKET: &'static str = "domain_socket";

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            Self::IP => Some(AddressKind::Ip),
            Self::DOMAIN_SOCKET => Some(AddressKind::DomainSocket),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Ip => Self::IP,
            AddressKind::DomainSocket => Self::DOMAIN_SOCKET,
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection target for client mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Self {
        Endpoint {
            host: host.to_string(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// Completion code handed to the open-complete callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOpenResult {
    Ok,
    Error,
}

/// Completion code handed to a send-complete callback.
///
/// The plain TCP transport only completes writes that were fully flushed, so
/// it reports `Ok`; a write it cannot deliver is dropped without a completion.
/// `Error` is for layered transports (e.g. TLS) that share the callback type
/// and can fail a write after accepting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoSendResult {
    Ok,
    Error,
}
