//! Port-related constants.

/// Name of the port that serves the collected object metrics.
pub const METRICS_PORT_NAME: &str = "http-metrics";

/// Container port that serves the collected object metrics.
pub const METRICS_PORT: i32 = 8080;

/// Name of the port that serves the exporter's own telemetry.
pub const TELEMETRY_PORT_NAME: &str = "telemetry";

/// Container port that serves the exporter's own telemetry.
pub const TELEMETRY_PORT: i32 = 8081;

/// Path probed by the liveness check (served on `METRICS_PORT`).
pub const LIVENESS_PATH: &str = "/healthz";

/// Path probed by the readiness check (served on `TELEMETRY_PORT`).
pub const READINESS_PATH: &str = "/";

/// Seconds before the first probe runs.
pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 5;

/// Seconds before a probe attempt times out.
pub const PROBE_TIMEOUT_SECONDS: i32 = 5;

/// Largest valid TCP/UDP/SCTP port number.
pub const MAX_PORT: i32 = 65535;
