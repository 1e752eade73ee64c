// Transport module: single-connection non-blocking socket transport
pub mod traits;
pub mod tcp;
pub mod pending;
pub mod socketio;

#[cfg(test)]
mod testing;

pub use traits::*;
pub use pending::*;
pub use socketio::*;
