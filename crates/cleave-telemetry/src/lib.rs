pub mod error;
mod telemetry;

pub use telemetry::init_telemetry;
