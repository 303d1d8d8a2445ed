pub mod cli;
pub mod error;
pub mod lnrpc;
pub mod metrics;
pub mod server;

pub use error::{ExporterError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
