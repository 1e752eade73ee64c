// Core module: transport types, options and errors (NO I/O dependencies)
pub mod types;
pub mod error;
pub mod options;
pub mod settings;

pub use types::*;
pub use error::*;
pub use options::*;
pub use settings::*;
