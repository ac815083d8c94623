use std::io::Write;
use std::sync::Mutex;

use log::debug;

use crate::error::{TelemetryError, TelemetryResult};

enum TelemetryStatus {
    Uninitialized,
    Initialized,
    Failed,
}

static TELEMETRY_STATUS: Mutex<TelemetryStatus> = Mutex::new(TelemetryStatus::Uninitialized);

/// Installs the process-wide logger.
///
/// The log level defaults to `info` and can be changed with the `RUST_LOG`
/// environment variable. Telemetry can only be initialized once per process.
pub fn init_telemetry() -> TelemetryResult<()> {
    let mut status = TELEMETRY_STATUS
        .lock()
        .map_err(|e| TelemetryError::internal(e.to_string()))?;

    match *status {
        TelemetryStatus::Uninitialized => match init_logs() {
            Ok(()) => {
                debug!("telemetry initialized");
                *status = TelemetryStatus::Initialized;
                Ok(())
            }
            Err(e) => {
                *status = TelemetryStatus::Failed;
                Err(e)
            }
        },
        TelemetryStatus::Initialized => {
            Err(TelemetryError::internal("telemetry already initialized"))
        }
        TelemetryStatus::Failed => Err(TelemetryError::internal(
            "telemetry failed to initialize previously",
        )),
    }
}

fn init_logs() -> TelemetryResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            let level = record.level();
            let target = record.target();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp();
            let args = record.args();
            writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
        })
        .try_init()
        .map_err(|e| TelemetryError::internal(e.to_string()))
}
