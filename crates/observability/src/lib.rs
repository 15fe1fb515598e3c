pub mod telemetry_setup;

pub use telemetry_setup::{init_logging, LogFormat, LoggingConfig};
