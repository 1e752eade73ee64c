// Error type shared by every transport operation
use crate::types::{AddressKind, Endpoint, IoState};
use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Synchronous call failure reported by a transport operation.
///
/// Asynchronous outcomes travel through the completion and error callbacks
/// instead; this type never describes a connection-fatal condition detected
/// while driving.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("transport is {actual}, operation requires {expected}")]
    InvalidState { expected: IoState, actual: IoState },

    #[error("transport has no endpoint to connect to")]
    NoEndpoint,

    #[error("socket creation failed: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("address resolution failed for {endpoint}: {source}")]
    Resolve {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("no IPv4 address found for {0}")]
    NoAddress(Endpoint),

    #[error("unsupported address kind: {0}")]
    UnsupportedAddressKind(AddressKind),

    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("cannot allocate {len} bytes for a pending write: {source}")]
    Allocation {
        len: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("option not supported: {0}")]
    UnknownOption(String),

    #[error("invalid value for option {0}")]
    InvalidOptionValue(&'static str),

    #[error("setting option {name} failed: {source}")]
    SetOption {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = IoError> = std::result::Result<T, E>;
