use std::env;
use std::sync::OnceLock;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

/// Environment variable read for the exporter port.
pub const METRICS_PORT_ENV: &str = "MM_METRICS_PORT";
pub const DEFAULT_METRICS_PORT: u16 = 9464;

static EXPORTER_PORT: OnceLock<u16> = OnceLock::new();

/// Resolves the exporter port: explicit value first, then `MM_METRICS_PORT`,
/// then the default.
pub fn resolve_port(explicit: Option<u16>) -> u16 {
    explicit
        .or_else(|| {
            env::var(METRICS_PORT_ENV)
                .ok()
                .and_then(|raw| raw.trim().parse::<u16>().ok())
        })
        .unwrap_or(DEFAULT_METRICS_PORT)
}

/// Installs the global Prometheus recorder and spawns its HTTP listener on
/// `0.0.0.0:<port>`. Must be called from within a Tokio runtime.
///
/// Returns whether an exporter is serving. Later calls report the exporter
/// started by the first; a port of `0` skips it entirely.
pub fn init_metrics(port: u16) -> bool {
    if port == 0 {
        info!("prometheus exporter disabled");
        return false;
    }

    if let Some(existing) = EXPORTER_PORT.get() {
        if *existing != port {
            warn!(metrics_port = port, running_port = *existing, "prometheus exporter already running");
        }
        return true;
    }

    match PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
    {
        Ok(()) => {
            let _ = EXPORTER_PORT.set(port);
            info!(metrics_port = port, "started prometheus exporter");
            true
        }
        Err(err) => {
            warn!(error = %err, metrics_port = port, "failed to start prometheus exporter");
            false
        }
    }
}
